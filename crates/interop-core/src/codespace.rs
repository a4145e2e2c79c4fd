//! The two runtimes bindings are generated for.

use std::fmt;

use bitflags::bitflags;

/// One of the two runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codespace {
    Native,
    Managed,
}

impl Codespace {
    pub const fn is_managed(self) -> bool {
        matches!(self, Codespace::Managed)
    }

    pub const fn is_native(self) -> bool {
        matches!(self, Codespace::Native)
    }

    /// Keyword used for an inferred local in this codespace.
    pub const fn var_keyword(self) -> &'static str {
        match self {
            Codespace::Native => "auto",
            Codespace::Managed => "var",
        }
    }

    /// Member access through an instance.
    pub const fn instance_access(self) -> &'static str {
        match self {
            Codespace::Native => "->",
            Codespace::Managed => ".",
        }
    }

    /// Member access through a type.
    pub const fn static_access(self) -> &'static str {
        match self {
            Codespace::Native => "::",
            Codespace::Managed => ".",
        }
    }
}

impl fmt::Display for Codespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codespace::Native => write!(f, "native"),
            Codespace::Managed => write!(f, "managed"),
        }
    }
}

bitflags! {
    /// A set of codespaces, used to record where a marshaller is active.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CodespaceFlags: u8 {
        const NATIVE = 1 << 0;
        const MANAGED = 1 << 1;
        const ALL = Self::NATIVE.bits() | Self::MANAGED.bits();
    }
}

impl CodespaceFlags {
    /// Check whether `space` is part of the set.
    pub fn has_space(self, space: Codespace) -> bool {
        self.contains(CodespaceFlags::from(space))
    }
}

impl From<Codespace> for CodespaceFlags {
    fn from(space: Codespace) -> Self {
        match space {
            Codespace::Native => CodespaceFlags::NATIVE,
            Codespace::Managed => CodespaceFlags::MANAGED,
        }
    }
}
