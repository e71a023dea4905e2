//! Namespaced attribute keys: `ns.path/name`.

use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Dot-separated namespace of a [`Key`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    parts: Vec<String>,
}

impl Namespace {
    /// Build a namespace from its segments.
    pub fn new<I, S>(parts: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(malformed(&parts.join("."), "empty namespace"));
        }
        for part in &parts {
            if part.is_empty() {
                return Err(malformed(&parts.join("."), "empty namespace segment"));
            }
            if part.contains(['.', '/']) {
                return Err(malformed(part, "namespace segment contains a separator"));
            }
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

/// A two-part attribute key.
///
/// The canonical rendering is `<seg>[.<seg>...]/<name>`. Parsing requires
/// exactly one `/`, at least one namespace segment, and no empty segments,
/// so every parsed key renders back to the input string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    ns: Namespace,
    name: String,
}

impl Key {
    pub fn new(ns: Namespace, name: impl Into<String>) -> ModelResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(malformed(&format!("{ns}/"), "empty name"));
        }
        if name.contains('/') {
            return Err(malformed(&format!("{ns}/{name}"), "name contains '/'"));
        }
        Ok(Self { ns, name })
    }

    /// Parse the canonical `ns.path/name` rendering.
    pub fn parse(s: &str) -> ModelResult<Self> {
        let mut split = s.split('/');
        let (Some(ns), Some(name), None) = (split.next(), split.next(), split.next()) else {
            return Err(malformed(s, "expected exactly one '/'"));
        };
        let ns = Namespace::new(ns.split('.')).map_err(|_| malformed(s, "bad namespace"))?;
        Self::new(ns, name).map_err(|_| malformed(s, "empty name"))
    }

    /// Trusted constructor for keys known to be well formed.
    pub(crate) fn builtin(ns: &[&str], name: &str) -> Self {
        Self {
            ns: Namespace {
                parts: ns.iter().map(|s| s.to_string()).collect(),
            },
            name: name.to_string(),
        }
    }

    pub fn ns(&self) -> &Namespace {
        &self.ns
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn malformed(key: &str, reason: &'static str) -> ModelError {
    ModelError::MalformedKey {
        key: key.to_string(),
        reason,
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ns, self.name)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}

impl std::str::FromStr for Key {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_splits_namespace_and_name() {
        let key = Key::parse("factdag.attr/name").unwrap();
        assert_eq!(key.ns().parts(), ["factdag", "attr"]);
        assert_eq!(key.name(), "name");
        assert_eq!(key.to_string(), "factdag.attr/name");
    }

    #[test]
    fn name_may_contain_dots() {
        let key = Key::parse("user/v1.email").unwrap();
        assert_eq!(key.name(), "v1.email");
    }

    #[test]
    fn slash_count_must_be_one() {
        for bad in ["noslash", "a/b/c", "a//b", ""] {
            assert!(
                matches!(Key::parse(bad), Err(ModelError::MalformedKey { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_segments_rejected() {
        for bad in ["/name", "ns/", "a..b/name", ".a/name", "a./name"] {
            assert!(Key::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn builtin_matches_parsed() {
        assert_eq!(Key::builtin(&["a", "b"], "c"), Key::parse("a.b/c").unwrap());
    }

    #[test]
    fn namespace_rejects_separators() {
        assert!(Namespace::new(["a.b"]).is_err());
        assert!(Namespace::new(Vec::<String>::new()).is_err());
        assert!(Key::new(Namespace::new(["a"]).unwrap(), "x/y").is_err());
    }

    proptest! {
        #[test]
        fn render_parse_roundtrip(
            ns in proptest::collection::vec("[a-z][a-z0-9-]{0,8}", 1..4),
            name in "[a-z][a-z0-9.-]{0,10}",
        ) {
            let key = Key::new(Namespace::new(ns.clone()).unwrap(), name.clone()).unwrap();
            let parsed = Key::parse(&key.to_string()).unwrap();
            prop_assert_eq!(parsed.ns().parts(), ns.as_slice());
            prop_assert_eq!(parsed.name(), name.as_str());
            prop_assert_eq!(parsed, key);
        }

        #[test]
        fn strings_without_one_slash_fail(s in "[a-z./]{0,12}") {
            prop_assume!(s.matches('/').count() != 1);
            prop_assert!(Key::parse(&s).is_err());
        }
    }
}
