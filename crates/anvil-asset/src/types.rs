//! Model reference types

use anvil_core::{AnvilError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A reference to a model, either `namespace:path` or a bare `path`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelRef {
    pub namespace: Option<String>,
    pub path: String,
}

impl ModelRef {
    pub fn new(namespace: Option<&str>, path: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            path: path.to_string(),
        }
    }

    /// Parse `namespace:path` or `path`. Backslashes are normalized to `/`.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (namespace, path) = match reference.split_once(':') {
            Some((ns, path)) => (Some(ns), path),
            None => (None, reference),
        };

        let path = path.replace('\\', "/");
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(AnvilError::Resolution(format!(
                "Empty model path in reference '{}'",
                reference
            )));
        }
        // Resolved paths must stay under the asset root
        if path.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(AnvilError::Resolution(format!(
                "Relative segment in model path '{}'",
                reference
            )));
        }
        if let Some(ns) = namespace {
            if ns.is_empty() || ns.contains(['/', '\\']) || ns == "." || ns == ".." {
                return Err(AnvilError::Resolution(format!(
                    "Invalid namespace in reference '{}'",
                    reference
                )));
            }
        }

        Ok(Self::new(namespace, path))
    }

    /// Path segments of the model path
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}", ns, self.path),
            None => f.write_str(&self.path),
        }
    }
}

impl FromStr for ModelRef {
    type Err = AnvilError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModelRef {
    type Error = AnvilError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ModelRef> for String {
    fn from(value: ModelRef) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaced() {
        let r = ModelRef::parse("custom_stuff:item/sword").unwrap();
        assert_eq!(r.namespace.as_deref(), Some("custom_stuff"));
        assert_eq!(r.path, "item/sword");
        assert_eq!(r.to_string(), "custom_stuff:item/sword");
    }

    #[test]
    fn test_parse_bare() {
        let r = ModelRef::parse("item/sword").unwrap();
        assert!(r.namespace.is_none());
        assert_eq!(r.to_string(), "item/sword");
    }

    #[test]
    fn test_parse_normalizes_separators() {
        let r = ModelRef::parse("pack:item\\tools\\axe").unwrap();
        assert_eq!(r.path, "item/tools/axe");
        assert_eq!(r.segments().collect::<Vec<_>>(), vec!["item", "tools", "axe"]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(ModelRef::parse("").is_err());
        assert!(ModelRef::parse("pack:").is_err());
        assert!(ModelRef::parse(":item/sword").is_err());
    }

    #[test]
    fn test_parse_rejects_relative_segments() {
        for reference in ["pack:../../etc/passwd", "pack:item/./sword", "..\\outside", "..:item/x"] {
            let err = ModelRef::parse(reference).unwrap_err();
            assert!(matches!(err, AnvilError::Resolution(_)), "{}", reference);
        }
        // Dots inside a segment are ordinary
        assert!(ModelRef::parse("pack:item/sword..v2").is_ok());
    }

    #[test]
    fn test_serde_as_string() {
        let r: ModelRef = serde_json::from_str("\"pack:item/bow\"").unwrap();
        assert_eq!(r, ModelRef::new(Some("pack"), "item/bow"));
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"pack:item/bow\"");
    }
}
