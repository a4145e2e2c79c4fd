use interop_core::{Codespace, TypeImplementation};

use super::{FormatRules, Order};
use crate::types::{QualifiedTypeReference, TypeRef, opaque_pointer_to};

/// Object handles. Native code sees the raw pointer; managed code converts between
/// the wrapper instance and its native handle.
#[derive(Debug, Clone, Copy)]
pub struct ObjectFormats {
    pub origin: TypeImplementation,
}

impl ObjectFormats {
    pub fn new(origin: TypeImplementation) -> Self {
        Self { origin }
    }
}

impl FormatRules for ObjectFormats {
    fn intermediate_of(&self, ty: &TypeRef) -> TypeRef {
        opaque_pointer_to(ty)
    }

    fn format(&self, ty: &QualifiedTypeReference, space: Codespace, order: Order, field: &str) -> String {
        if space == Codespace::Native {
            return field.to_string();
        }
        let name = &ty.ty.managed_name;
        match (order, self.origin) {
            (Order::Before, _) => format!("UObjectUtil.GetNativeInstance({field})"),
            (Order::After, TypeImplementation::Managed) => format!("GetManaged<{name}>({field})"),
            (Order::After, TypeImplementation::Native) => format!("GetOrCreateNative<{name}>({field})"),
        }
    }

    fn namespace(&self) -> Option<&str> {
        Some("Unreal.Core")
    }
}
