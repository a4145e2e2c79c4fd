use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

impl TypeKind {
    /// Value kinds may be transferred by value and wrapped in a pointer type.
    pub const fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum)
    }

    pub const fn is_reference_type(self) -> bool {
        !self.is_value_type()
    }

    /// Keyword for a managed declaration of this kind.
    pub const fn managed_keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.managed_keyword())
    }
}

/// Which runtime provides the implementation of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeImplementation {
    /// Implemented natively, wrapped on the managed side.
    #[default]
    Native,
    /// Implemented in managed code, with a generated native counterpart.
    Managed,
}

impl fmt::Display for TypeImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeImplementation::Native => write!(f, "Native"),
            TypeImplementation::Managed => write!(f, "Managed"),
        }
    }
}

/// Declared visibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
    Internal,
}

impl Visibility {
    /// Managed keyword, `internal` included.
    pub const fn managed(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }

    /// Native access specifier. Native code has no `internal`, it maps to `public`.
    pub const fn native(self) -> &'static str {
        match self {
            Visibility::Public | Visibility::Internal => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kinds() {
        assert!(TypeKind::Struct.is_value_type());
        assert!(TypeKind::Enum.is_value_type());
        assert!(TypeKind::Class.is_reference_type());
        assert!(TypeKind::Interface.is_reference_type());
    }

    #[test]
    fn visibility_mapping() {
        assert_eq!(Visibility::Internal.native(), "public");
        assert_eq!(Visibility::Internal.managed(), "internal");
        assert_eq!(Visibility::Protected.native(), "protected");
    }
}
