//! Pointer wrappers used as intermediate types.
//!
//! Wrappers are cached on their pointee, so asking twice for the pointer to a type
//! returns the same [`TypeRef`]. The wrapper refers back to the pointee weakly.

use std::rc::Rc;

use interop_core::{GenerationError, Namespace, TransferMode, TypeKind};

use super::{TypeInfo, TypeOrigin, TypeRef};

/// `T*` on both sides. Only value kinds can be pointed to.
pub fn pointer_to(element: &TypeRef) -> Result<TypeRef, GenerationError> {
    if !element.kind.is_value_type() {
        return Err(GenerationError::metadata(
            element.full_managed_name(),
            "pointer types cannot be constructed from reference types",
        ));
    }

    let pointer = element.pointer.get_or_init(|| {
        let mut info = TypeInfo::new(
            format!("{}*", element.managed_name),
            format!("{}*", element.native_name),
            TypeKind::Struct,
            TypeOrigin::Pointer,
        )
        .with_namespace(element.namespace.clone())
        .with_header(element.header.clone());
        info.module = element.module.clone();
        info.native_module = element.native_module.clone();
        info.element = Some(Rc::downgrade(element));
        info.into_ref()
    });
    Ok(Rc::clone(pointer))
}

/// A native pointer that managed code only sees as `IntPtr`.
pub fn opaque_pointer_to(element: &TypeRef) -> TypeRef {
    let pointer = element.opaque_pointer.get_or_init(|| {
        let mut info = TypeInfo::new(
            "IntPtr",
            format!("{}*", element.native_name),
            TypeKind::Struct,
            TypeOrigin::OpaquePointer,
        )
        .with_namespace(Namespace::parse("System"))
        .with_transfer(TransferMode::ByValue)
        .with_header(element.header.clone());
        info.module = element.module.clone();
        info.native_module = element.native_module.clone();
        info.element = Some(Rc::downgrade(element));
        info.into_ref()
    });
    Rc::clone(pointer)
}
