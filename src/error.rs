//! Error taxonomy for the compiler front-end and code generator.
//!
//! One enum covering every failure mode in spec §7. Modeled on the
//! teacher's `codegen::CodeGenError`: a plain enum with a hand-written
//! `Display` (no `thiserror`/`anyhow` anywhere in this codebase's lineage).

use std::fmt;
use std::path::PathBuf;

/// A single compiler diagnostic.
///
/// Every fallible core operation returns `Result<T, HidlError>`. The CLI
/// layer is the only place that turns this into process exit status.
#[derive(Debug)]
pub enum HidlError {
    /// Lexer/grammar failure. Terminal for the file being parsed.
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    /// An AST's declared package/version disagrees with what the
    /// Coordinator expected for the FQN it was asked to parse.
    PackageMismatch {
        file: PathBuf,
        expected: String,
        found: String,
    },
    /// `types.hal` declares an interface, or `I<X>.hal` declares the wrong
    /// interface name (or a non-interface).
    InterfaceFileMismatch { file: PathBuf, message: String },
    /// Two types or constants share a name in one scope.
    DuplicateName {
        name: String,
        first: Option<String>,
        second: Option<String>,
    },
    /// A name used at a use-site was not found in any scope or import.
    UnresolvedReference { name: String, context: String },
    /// Union/struct/enum/array shape invariant violated (spec §3/§7).
    TypeConstraint(String),
    /// The managed target was asked to emit a type it cannot represent.
    TargetCompatibility { type_name: String, reason: String },
    /// Propagated I/O failure, tagged with the offending path.
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for HidlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HidlError::Parse {
                file,
                line,
                column,
                message,
            } => write!(
                f,
                "{}:{}:{}: parse error: {}",
                file.display(),
                line + 1,
                column + 1,
                message
            ),
            HidlError::PackageMismatch {
                file,
                expected,
                found,
            } => write!(
                f,
                "{}: declares package/version '{}', expected '{}'",
                file.display(),
                found,
                expected
            ),
            HidlError::InterfaceFileMismatch { file, message } => {
                write!(f, "{}: {}", file.display(), message)
            }
            HidlError::DuplicateName { name, first, second } => {
                write!(f, "'{}' is defined multiple times", name)?;
                if let Some(first) = first {
                    write!(f, "\n  - {}", first)?;
                }
                if let Some(second) = second {
                    write!(f, "\n  - {}", second)?;
                }
                Ok(())
            }
            HidlError::UnresolvedReference { name, context } => {
                write!(f, "unresolved reference '{}' in {}", name, context)
            }
            HidlError::TypeConstraint(message) => write!(f, "type constraint violation: {}", message),
            HidlError::TargetCompatibility { type_name, reason } => write!(
                f,
                "target cannot emit '{}': {}",
                type_name, reason
            ),
            HidlError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for HidlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HidlError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl HidlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HidlError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HidlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error_is_one_indexed() {
        let e = HidlError::Parse {
            file: PathBuf::from("x.hal"),
            line: 0,
            column: 4,
            message: "unexpected token".to_string(),
        };
        assert_eq!(e.to_string(), "x.hal:1:5: parse error: unexpected token");
    }

    #[test]
    fn display_duplicate_name_lists_both_locations() {
        let e = HidlError::DuplicateName {
            name: "Foo".to_string(),
            first: Some("a.hal:1".to_string()),
            second: Some("b.hal:5".to_string()),
        };
        let msg = e.to_string();
        assert!(msg.contains("Foo"));
        assert!(msg.contains("a.hal:1"));
        assert!(msg.contains("b.hal:5"));
    }
}
