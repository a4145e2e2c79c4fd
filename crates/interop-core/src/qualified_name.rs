use std::fmt;

use serde::{Deserialize, Serialize};

/// Dotted namespace path of a managed declaration.
///
/// Managed namespaces are written `Game.Core`. The empty namespace is the global one.
///
/// # Examples
///
/// ```
/// use interop_core::Namespace;
///
/// let ns = Namespace::parse("Game.Core");
/// assert_eq!(ns.segments(), ["Game", "Core"]);
/// assert_eq!(ns.to_string(), "Game.Core");
/// assert_eq!(ns.qualify("Player"), "Game.Core.Player");
///
/// assert!(Namespace::global().is_global());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// The global namespace.
    pub fn global() -> Self {
        Self::default()
    }

    /// Parse a dotted namespace. Empty segments are dropped, so `".Game..Core"` == `"Game.Core"`.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s
                .split('.')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Check if this is the global namespace.
    pub fn is_global(&self) -> bool {
        self.segments.is_empty()
    }

    /// Namespace segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Full managed name of `name` declared in this namespace.
    pub fn qualify(&self, name: &str) -> String {
        if self.is_global() {
            name.to_string()
        } else {
            format!("{}.{}", self, name)
        }
    }

    /// Create a child namespace.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_namespace() {
        let ns = Namespace::global();
        assert!(ns.is_global());
        assert_eq!(ns.to_string(), "");
        assert_eq!(ns.qualify("Player"), "Player");
    }

    #[test]
    fn parse_normalizes_empty_segments() {
        assert_eq!(Namespace::parse(".Game..Core"), Namespace::parse("Game.Core"));
        assert!(Namespace::parse("").is_global());
        assert!(Namespace::parse("...").is_global());
    }

    #[test]
    fn child_namespace() {
        let ns = Namespace::parse("Game").child("Core");
        assert_eq!(ns.to_string(), "Game.Core");
    }

    #[test]
    fn serde_as_string() {
        let ns: Namespace = serde_json::from_str("\"Game.Core\"").unwrap();
        assert_eq!(ns.segments(), ["Game", "Core"]);
        assert_eq!(serde_json::to_string(&ns).unwrap(), "\"Game.Core\"");
    }
}
