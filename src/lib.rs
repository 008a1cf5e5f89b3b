//! Compiler front-end and multi-target code generator for HIDL-style
//! interface packages.
//!
//! Parses `.hal` packages into a type graph (binding cross-file references
//! through a [`Coordinator`]), then drives target-specific emitters over
//! that graph: a native (C-family) header/source pair, a managed
//! (JVM-style) source file, and a text verification descriptor.
//!
//! # Example
//!
//! ```rust,ignore
//! use hidlc::coordinator::Coordinator;
//! use hidlc::fqname::FQName;
//!
//! let mut coordinator = Coordinator::new();
//! coordinator.add_prefix("android.hardware", "hardware/interfaces");
//! let fq = FQName::parse("android.hardware.nfc@1.0::INfc").unwrap();
//! let handle = coordinator.parse(&fq).unwrap();
//! let ast = coordinator.ast(handle);
//! ```

pub mod ast;
pub mod binder;
pub mod codegen;
pub mod config;
pub mod constant;
pub mod coordinator;
pub mod error;
pub mod fqname;
pub mod parser;
pub mod scope;
pub mod sink;
pub mod targets;
pub mod types;

pub use config::Config;
pub use coordinator::Coordinator;
pub use error::{HidlError, Result};
pub use fqname::FQName;
