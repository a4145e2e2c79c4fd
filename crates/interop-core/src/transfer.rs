//! How values cross the boundary.
//!
//! [`TransferMode`] is a property of the type itself (a struct travels by value, an
//! object by pointer). [`TransferDirection`] is a property of a parameter slot and
//! says which way data flows through it.
//!
//! # Example
//!
//! ```
//! use interop_core::{TransferDirection, TransferMode};
//!
//! assert_eq!(TransferMode::ByPointer.format("UObject"), "UObject*");
//! assert_eq!(TransferMode::ByReference.format_const("FVector"), "const FVector&");
//!
//! assert_eq!(TransferDirection::Out.to_string(), "out");
//! assert_eq!(TransferDirection::In.mangle_modifier(), 'I');
//! ```

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// How a type is handed over natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    #[default]
    #[serde(alias = "value")]
    ByValue,
    #[serde(alias = "reference")]
    ByReference,
    #[serde(alias = "pointer")]
    ByPointer,
}

impl TransferMode {
    /// Native spelling of `name` under this transfer mode.
    pub fn format(self, name: &str) -> String {
        match self {
            TransferMode::ByValue => name.to_string(),
            TransferMode::ByReference => format!("{name}&"),
            TransferMode::ByPointer => format!("{name}*"),
        }
    }

    /// Like [`format`](Self::format), with a leading `const`.
    pub fn format_const(self, name: &str) -> String {
        format!("const {}", self.format(name))
    }
}

/// Direction of a parameter slot.
///
/// In/Out/Ref are passed by reference on both sides. `ByValue` slots are plain copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// Plain copy.
    #[default]
    ByValue,
    /// Read-only reference.
    In,
    /// Write-only reference, uninitialized on entry.
    Out,
    /// Read-write reference.
    Ref,
}

impl TransferDirection {
    /// Whether data flows back to the caller through this slot.
    pub const fn is_out(self) -> bool {
        matches!(self, TransferDirection::Out | TransferDirection::Ref)
    }

    pub const fn is_by_value(self) -> bool {
        matches!(self, TransferDirection::ByValue)
    }

    /// Single-letter code used in mangled symbol names.
    pub const fn mangle_modifier(self) -> char {
        match self {
            TransferDirection::ByValue => 'V',
            TransferDirection::In => 'I',
            TransferDirection::Out => 'O',
            TransferDirection::Ref => 'R',
        }
    }

    /// Keyword placed at a managed call site, if any.
    ///
    /// `in` arguments need no keyword when invoking.
    pub const fn call_keyword(self) -> Option<&'static str> {
        match self {
            TransferDirection::Out => Some("out"),
            TransferDirection::Ref => Some("ref"),
            _ => None,
        }
    }
}

impl Display for TransferDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::ByValue => Ok(()),
            TransferDirection::In => write!(f, "in"),
            TransferDirection::Out => write!(f, "out"),
            TransferDirection::Ref => write!(f, "ref"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_formatting() {
        assert_eq!(TransferMode::ByValue.format("int"), "int");
        assert_eq!(TransferMode::ByReference.format("FVector"), "FVector&");
        assert_eq!(TransferMode::ByPointer.format("UObject"), "UObject*");
        assert_eq!(TransferMode::ByValue.format_const("int"), "const int");
    }

    #[test]
    fn direction_out_flow() {
        assert!(TransferDirection::Out.is_out());
        assert!(TransferDirection::Ref.is_out());
        assert!(!TransferDirection::In.is_out());
        assert!(!TransferDirection::ByValue.is_out());
    }

    #[test]
    fn direction_call_keyword() {
        assert_eq!(TransferDirection::Out.call_keyword(), Some("out"));
        assert_eq!(TransferDirection::Ref.call_keyword(), Some("ref"));
        assert_eq!(TransferDirection::In.call_keyword(), None);
        assert_eq!(TransferDirection::ByValue.call_keyword(), None);
    }

    #[test]
    fn direction_display() {
        assert_eq!(TransferDirection::ByValue.to_string(), "");
        assert_eq!(TransferDirection::Ref.to_string(), "ref");
    }

    #[test]
    fn serde_names() {
        let dir: TransferDirection = serde_json::from_str("\"by_value\"").unwrap();
        assert_eq!(dir, TransferDirection::ByValue);
        let mode: TransferMode = serde_json::from_str("\"by_pointer\"").unwrap();
        assert_eq!(mode, TransferMode::ByPointer);
    }
}
