//! Compiler configuration.
//!
//! Grounded on the teacher's `CompilerConfig`/`ExternalBuiltin` builder
//! pattern (`config.rs`): a plain `Default`-derived struct with chained
//! `with_*` methods that each return `Self`, plus a private validation
//! helper for inputs that could otherwise corrupt generated output.

use std::path::PathBuf;

/// One `-r package.prefix:directory` mapping (spec §6), telling the
/// Coordinator where to look for `.hal` files under a given package
/// prefix.
#[derive(Debug, Clone)]
pub struct RootMapping {
    pub prefix: String,
    pub directory: PathBuf,
}

impl RootMapping {
    /// `prefix` must be a dotted package path; an empty or malformed
    /// prefix would make every lookup silently fall through to the next
    /// mapping instead of failing loudly at configuration time.
    fn validate_prefix(prefix: &str) -> Result<(), String> {
        if prefix.is_empty() {
            return Err("root mapping prefix cannot be empty".to_string());
        }
        if prefix.split('.').any(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')) {
            return Err(format!("invalid root mapping prefix '{prefix}'"));
        }
        Ok(())
    }

    pub fn new(prefix: impl Into<String>, directory: impl Into<PathBuf>) -> Result<Self, String> {
        let prefix = prefix.into();
        Self::validate_prefix(&prefix)?;
        Ok(RootMapping {
            prefix,
            directory: directory.into(),
        })
    }
}

/// Which target driver(s) a `generate` invocation should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    NativeHeader,
    NativeSource,
    Managed,
    Descriptor,
}

/// Builder-pattern configuration for one compiler invocation.
///
/// # Example
///
/// ```rust,ignore
/// use hidlc::config::Config;
///
/// let config = Config::new()
///     .with_mapping("android.hardware", "hardware/interfaces")
///     .expect("valid prefix")
///     .with_output_root("out/gen")
///     .with_dep_file("out/gen/IFoo.d");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub roots: Vec<RootMapping>,
    pub output_root: PathBuf,
    pub dep_file: Option<PathBuf>,
    pub targets: Vec<TargetKind>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Add a `-r` root mapping (builder pattern). Returns `Err` if
    /// `prefix` is empty or not a dotted package path.
    pub fn with_mapping(mut self, prefix: impl Into<String>, directory: impl Into<PathBuf>) -> Result<Self, String> {
        self.roots.push(RootMapping::new(prefix, directory)?);
        Ok(self)
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_dep_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dep_file = Some(path.into());
        self
    }

    pub fn with_target(mut self, target: TargetKind) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = TargetKind>) -> Self {
        self.targets.extend(targets);
        self
    }
}
