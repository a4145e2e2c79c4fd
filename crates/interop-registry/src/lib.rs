//! Runtime registry of native objects and their managed wrappers.
//!
//! Generated code consults the registry whenever a native handle crosses into
//! managed code: the object table answers "is there a wrapper for this object",
//! the type index answers "which managed type wraps this native class", falling
//! back to the nearest registered ancestor for classes bindings were never
//! generated for.
//!
//! ## Modules
//!
//! - [`handle`]: native addresses
//! - [`object_registry`]: instance handle to wrapper
//! - [`type_index`]: class handle to type registration, with best-fit
//! - [`error`]: registry errors, all fatal
//!
//! Every table is a `DashMap`, safe to share between threads behind an `Arc`.

pub mod error;
pub mod handle;
pub mod object_registry;
pub mod type_index;

use std::sync::Arc;

pub use error::RegistryError;
pub use handle::NativeHandle;
pub use object_registry::ObjectRegistry;
pub use type_index::{TypeIndex, TypeRegistration};

use interop_core::TypeImplementation;

/// The object table and type index of one runtime.
#[derive(Debug)]
pub struct InteropRegistry<W> {
    objects: ObjectRegistry<W>,
    types: TypeIndex,
}

impl<W> InteropRegistry<W> {
    pub fn new() -> Self {
        Self {
            objects: ObjectRegistry::new(),
            types: TypeIndex::new(),
        }
    }

    pub fn objects(&self) -> &ObjectRegistry<W> {
        &self.objects
    }

    pub fn types(&self) -> &TypeIndex {
        &self.types
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn register_type(
        &self,
        native_class: NativeHandle,
        managed_type: impl Into<String>,
        implementation: TypeImplementation,
    ) -> Result<Arc<TypeRegistration>, RegistryError> {
        self.types.register(native_class, managed_type, implementation)
    }

    /// The managed type to wrap the native object `handle` with.
    ///
    /// `native_type_of` gives the object's class; `super_type_of` walks classes.
    pub fn best_fit(
        &self,
        handle: NativeHandle,
        native_type_of: impl FnOnce(NativeHandle) -> NativeHandle,
        super_type_of: impl Fn(NativeHandle) -> Option<NativeHandle>,
    ) -> Result<Arc<TypeRegistration>, RegistryError> {
        self.types.best_fit(native_type_of(handle), super_type_of)
    }

    // ========================================================================
    // Objects
    // ========================================================================

    pub fn register(&self, handle: NativeHandle, wrapper: Arc<W>) -> Result<(), RegistryError> {
        self.objects.register(handle, wrapper)
    }

    pub fn unregister(&self, handle: NativeHandle) -> Result<Arc<W>, RegistryError> {
        self.objects.unregister(handle)
    }

    pub fn lookup(&self, handle: NativeHandle) -> Option<Arc<W>> {
        self.objects.lookup(handle)
    }

    /// The live wrapper of a native object, or a new wrapper of its best-fit type.
    pub fn get_or_create(
        &self,
        handle: NativeHandle,
        native_type_of: impl FnOnce(NativeHandle) -> NativeHandle,
        super_type_of: impl Fn(NativeHandle) -> Option<NativeHandle>,
        create: impl FnOnce(&TypeRegistration) -> W,
    ) -> Result<Arc<W>, RegistryError> {
        if let Some(wrapper) = self.objects.lookup(handle) {
            return Ok(wrapper);
        }
        let registration = self.best_fit(handle, native_type_of, super_type_of)?;
        self.objects
            .lookup_or_insert_with(handle, || create(&registration))
    }

    pub fn clear(&self) {
        self.objects.clear();
        self.types.clear();
    }
}

impl<W> Default for InteropRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Wrapper {
        managed_type: String,
    }

    #[test]
    fn get_or_create_uses_best_fit_then_reuses() {
        let registry = InteropRegistry::new();
        let base = NativeHandle::new(0x100);
        let sub = NativeHandle::new(0x200);
        registry.register_type(base, "Game.Base", TypeImplementation::Native).unwrap();

        let object = NativeHandle::new(0xa0);
        let make = |r: &TypeRegistration| Wrapper {
            managed_type: r.managed_type.clone(),
        };
        let parent = |c: NativeHandle| (c == sub).then_some(base);

        let wrapper = registry.get_or_create(object, |_| sub, parent, make).unwrap();
        assert_eq!(wrapper.managed_type, "Game.Base");

        let again = registry
            .get_or_create(object, |_| unreachable!("object already wrapped"), parent, make)
            .unwrap();
        assert!(Arc::ptr_eq(&wrapper, &again));

        assert!(registry.unregister(object).is_ok());
        assert!(registry.lookup(object).is_none());
    }
}
