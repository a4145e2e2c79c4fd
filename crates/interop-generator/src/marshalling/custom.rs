use interop_core::{Codespace, ConfigurationError, FormatsDescriptor};

use super::{FormatRules, Order};
use crate::types::{QualifiedTypeReference, TypeRef};

/// Rules from a mapping's four `{0}` format strings.
#[derive(Debug, Clone)]
pub struct CustomFormats {
    intermediate: TypeRef,
    formats: FormatsDescriptor,
}

impl CustomFormats {
    pub fn new(intermediate: TypeRef, formats: FormatsDescriptor) -> Self {
        Self {
            intermediate,
            formats,
        }
    }

    pub fn formats(&self) -> &FormatsDescriptor {
        &self.formats
    }
}

impl FormatRules for CustomFormats {
    fn intermediate_of(&self, _ty: &TypeRef) -> TypeRef {
        self.intermediate.clone()
    }

    fn format(&self, _ty: &QualifiedTypeReference, space: Codespace, order: Order, field: &str) -> String {
        let format = match (space, order) {
            (Codespace::Managed, Order::Before) => &self.formats.managed_to_intermediate,
            (Codespace::Managed, Order::After) => &self.formats.intermediate_to_managed,
            (Codespace::Native, Order::Before) => &self.formats.native_to_intermediate,
            (Codespace::Native, Order::After) => &self.formats.intermediate_to_native,
        };
        format.replace("{0}", field)
    }

    fn header(&self) -> Option<&str> {
        self.formats.required_header.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        self.formats.required_namespace.as_deref()
    }
}

/// Reject format strings with placeholders other than `{0}`.
pub fn validate_formats(owner: &str, formats: &FormatsDescriptor) -> Result<(), ConfigurationError> {
    for (label, format) in formats.formats() {
        let mut rest = format;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(ConfigurationError::MalformedMapping {
                    name: owner.to_string(),
                    reason: format!("unclosed placeholder in {label} format '{format}'"),
                });
            };
            let placeholder = &after[..close];
            if placeholder != "0" {
                return Err(ConfigurationError::MalformedMapping {
                    name: owner.to_string(),
                    reason: format!(
                        "{label} format '{format}' references placeholder '{{{placeholder}}}', only '{{0}}' is allowed"
                    ),
                });
            }
            rest = &after[close + 1..];
        }
    }
    Ok(())
}
