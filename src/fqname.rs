//! Fully-qualified names: `package@major.minor::tail`.
//!
//! Grammar accepts any suffix of that form — package alone, version alone,
//! `::tail` alone, or any adjacent combination — matching the original
//! HIDL grammar (`FQName.cpp`'s four regex alternatives). Parsing here is
//! hand-rolled rather than regex-based, in the recursive-descent style the
//! teacher's `parser.rs` uses for its own tokenizer.

use std::cmp::Ordering;
use std::fmt;

/// A (possibly partial) fully-qualified name.
///
/// Fully qualified iff `package`, `version`, and `tail` are all non-empty.
/// An `FQName` always round-trips through [`FQName::parse`] via its
/// canonical [`FQName::string`] form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FQName {
    package: String,
    version: Option<(u32, u32)>,
    tail: String,
}

impl FQName {
    /// Construct directly from components (used by the Coordinator when it
    /// already knows all three parts are valid).
    pub fn new(package: impl Into<String>, version: Option<(u32, u32)>, tail: impl Into<String>) -> Self {
        FQName {
            package: package.into(),
            version,
            tail: tail.into(),
        }
    }

    /// Parse `(package)?(@major.minor)?(::tail)?`.
    ///
    /// Returns `None` if the string matches none of the accepted forms.
    pub fn parse(s: &str) -> Option<FQName> {
        let (before_tail, tail) = match s.find("::") {
            Some(idx) => (&s[..idx], s[idx + 2..].to_string()),
            None => (s, String::new()),
        };

        let (package, version) = match before_tail.find('@') {
            Some(idx) => {
                let package = &before_tail[..idx];
                let version = &before_tail[idx + 1..];
                (package.to_string(), Some(parse_version(version)?))
            }
            None => (before_tail.to_string(), None),
        };

        if !package.is_empty() && !is_dotted_path(&package) {
            return None;
        }
        if !tail.is_empty() && !is_dotted_path(&tail) {
            return None;
        }
        // Reject a name that is entirely empty (no package, version, or tail).
        if package.is_empty() && version.is_none() && tail.is_empty() {
            return None;
        }

        Some(FQName {
            package,
            version,
            tail,
        })
    }

    pub fn is_valid(s: &str) -> bool {
        FQName::parse(s).is_some()
    }

    pub fn is_fully_qualified(&self) -> bool {
        !self.package.is_empty() && self.version.is_some() && !self.tail.is_empty()
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> Option<(u32, u32)> {
        self.version
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Fill in missing package/version from `context`, preferring the
    /// existing (non-empty) value. Idempotent: re-applying the same
    /// context to the result is a no-op (property 2, spec §8).
    pub fn default_apply(&self, default_package: &str, default_version: (u32, u32)) -> FQName {
        FQName {
            package: if self.package.is_empty() {
                default_package.to_string()
            } else {
                self.package.clone()
            },
            version: Some(self.version.unwrap_or(default_version)),
            tail: self.tail.clone(),
        }
    }

    pub fn package_components(&self) -> Vec<&str> {
        if self.package.is_empty() {
            Vec::new()
        } else {
            self.package.split('.').collect()
        }
    }

    pub fn tail_components(&self) -> Vec<&str> {
        if self.tail.is_empty() {
            Vec::new()
        } else {
            self.tail.split('.').collect()
        }
    }

    /// `Vmajor_minor`, for use as a path/identifier component.
    pub fn version_identifier(&self) -> Option<String> {
        self.version.map(|(major, minor)| format!("V{major}_{minor}"))
    }

    /// `major.minor`, for use in non-identifier contexts (e.g. Java package
    /// strings don't use this form, but diagnostics do).
    pub fn version_string(&self) -> Option<String> {
        self.version.map(|(major, minor)| format!("{major}.{minor}"))
    }

    /// `package.components.joined.Vmajor_minor`, the form both the native
    /// and managed target drivers need for namespace/package rendering.
    /// Grounded on `FQName::cppNamespace`/`javaPackage` in the original
    /// implementation, which both reduce to "package components then the
    /// identifier-form version" joined by the target's own separator.
    pub fn package_and_version_components(&self) -> Vec<String> {
        let mut out: Vec<String> = self.package_components().iter().map(|s| s.to_string()).collect();
        if let Some(v) = self.version_identifier() {
            out.push(v);
        }
        out
    }

    /// `::`-joined C++-style namespace, e.g. `::foo::bar::V1_0`.
    pub fn cpp_namespace(&self) -> String {
        let mut out = String::from("::");
        out.push_str(&self.package_and_version_components().join("::"));
        out
    }

    /// Dotted Java-style package, e.g. `foo.bar.V1_0`.
    pub fn java_package(&self) -> String {
        self.package_and_version_components().join(".")
    }

    /// Canonical string form; round-trips through [`FQName::parse`].
    pub fn string(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.package);
        if let Some((major, minor)) = self.version {
            out.push('@');
            out.push_str(&major.to_string());
            out.push('.');
            out.push_str(&minor.to_string());
        }
        if !self.tail.is_empty() {
            if !self.package.is_empty() || self.version.is_some() {
                out.push_str("::");
            }
            out.push_str(&self.tail);
        }
        out
    }
}

impl fmt::Display for FQName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

impl PartialOrd for FQName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FQName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.string().cmp(&other.string())
    }
}

fn is_dotted_path(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.split('.').all(is_identifier)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_version(s: &str) -> Option<(u32, u32)> {
    let (major, minor) = s.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_form() {
        let fq = FQName::parse("foo.bar@1.0::INfc").unwrap();
        assert_eq!(fq.package(), "foo.bar");
        assert_eq!(fq.version(), Some((1, 0)));
        assert_eq!(fq.tail(), "INfc");
        assert!(fq.is_fully_qualified());
    }

    #[test]
    fn parses_version_and_tail_only() {
        let fq = FQName::parse("@1.0::types").unwrap();
        assert_eq!(fq.package(), "");
        assert_eq!(fq.version(), Some((1, 0)));
        assert_eq!(fq.tail(), "types");
        assert!(!fq.is_fully_qualified());
    }

    #[test]
    fn parses_package_and_version_only() {
        let fq = FQName::parse("foo.bar@1.0").unwrap();
        assert_eq!(fq.tail(), "");
        assert!(!fq.is_fully_qualified());
    }

    #[test]
    fn parses_bare_tail() {
        let fq = FQName::parse("Baz").unwrap();
        assert_eq!(fq.package(), "");
        assert_eq!(fq.version(), None);
        assert_eq!(fq.tail(), "Baz");
    }

    #[test]
    fn rejects_empty_string() {
        assert!(FQName::parse("").is_none());
    }

    #[test]
    fn rejects_malformed_version() {
        assert!(FQName::parse("foo@1::Bar").is_none());
        assert!(FQName::parse("foo@a.b::Bar").is_none());
    }

    #[test]
    fn round_trips_through_canonical_string() {
        for s in ["foo.bar@1.0::INfc", "foo.bar@1.0", "Baz", "foo.bar::Baz"] {
            let fq = FQName::parse(s).unwrap();
            let reparsed = FQName::parse(&fq.string()).unwrap();
            assert_eq!(fq, reparsed);
        }
    }

    #[test]
    fn default_apply_is_idempotent() {
        let fq = FQName::parse("Baz").unwrap();
        let once = fq.default_apply("foo.bar", (1, 0));
        let twice = once.default_apply("foo.bar", (1, 0));
        assert_eq!(once, twice);
    }

    #[test]
    fn default_apply_preserves_existing_package() {
        let fq = FQName::parse("other.pkg@2.1::Baz").unwrap();
        let applied = fq.default_apply("foo.bar", (1, 0));
        assert_eq!(applied.package(), "other.pkg");
        assert_eq!(applied.version(), Some((2, 1)));
    }

    #[test]
    fn version_identifier_form() {
        let fq = FQName::parse("foo@1.0::Bar").unwrap();
        assert_eq!(fq.version_identifier(), Some("V1_0".to_string()));
        assert_eq!(fq.version_string(), Some("1.0".to_string()));
    }

    #[test]
    fn namespace_derivations() {
        let fq = FQName::parse("foo.bar@1.0::INfc").unwrap();
        assert_eq!(fq.cpp_namespace(), "::foo::bar::V1_0");
        assert_eq!(fq.java_package(), "foo.bar.V1_0");
    }

    #[test]
    fn ordering_is_by_canonical_string() {
        let a = FQName::parse("a.b@1.0::X").unwrap();
        let b = FQName::parse("a.c@1.0::X").unwrap();
        assert!(a < b);
    }
}
