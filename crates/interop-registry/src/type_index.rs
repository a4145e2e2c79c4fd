//! Native class handle to managed type table with best-fit lookup.
//!
//! Exact registrations come from the module bootstrap code: one per generated
//! type. Native classes the bindings were never generated for still need a
//! wrapper type, so [`TypeIndex::best_fit`] walks up the native supertype chain
//! until it finds a registered class. The answer is cached under the queried
//! class in a table of its own, so exact entries are never shadowed.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::{FxBuildHasher, FxHashSet};

use interop_core::TypeImplementation;

use crate::{NativeHandle, RegistryError};

/// What the runtime knows about one native class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistration {
    pub native_class: NativeHandle,
    /// Qualified managed type name.
    pub managed_type: String,
    pub implementation: TypeImplementation,
    /// Derived from the nearest registered ancestor rather than registered.
    pub is_best_fit: bool,
}

pub struct TypeIndex {
    exact: DashMap<NativeHandle, Arc<TypeRegistration>, FxBuildHasher>,
    by_managed: DashMap<String, Arc<TypeRegistration>, FxBuildHasher>,
    best_fit: DashMap<NativeHandle, Arc<TypeRegistration>, FxBuildHasher>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self {
            exact: DashMap::with_hasher(FxBuildHasher),
            by_managed: DashMap::with_hasher(FxBuildHasher),
            best_fit: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Register the managed type of a native class.
    pub fn register(
        &self,
        native_class: NativeHandle,
        managed_type: impl Into<String>,
        implementation: TypeImplementation,
    ) -> Result<Arc<TypeRegistration>, RegistryError> {
        if native_class.is_null() {
            return Err(RegistryError::NullHandle.logged());
        }
        let managed_type = managed_type.into();

        let slot = match self.exact.entry(native_class) {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateRegistration {
                    handle: native_class,
                }
                .logged());
            }
            Entry::Vacant(slot) => slot,
        };
        let registration = match self.by_managed.entry(managed_type.clone()) {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateManagedType { managed_type }.logged());
            }
            Entry::Vacant(by_name) => {
                let registration = Arc::new(TypeRegistration {
                    native_class,
                    managed_type,
                    implementation,
                    is_best_fit: false,
                });
                by_name.insert(Arc::clone(&registration));
                registration
            }
        };
        slot.insert(Arc::clone(&registration));
        tracing::debug!(%native_class, managed_type = %registration.managed_type, "type registered");
        Ok(registration)
    }

    /// The exact registration of a native class.
    pub fn lookup(&self, native_class: NativeHandle) -> Option<Arc<TypeRegistration>> {
        self.exact.get(&native_class).map(|entry| Arc::clone(entry.value()))
    }

    pub fn lookup_managed(&self, managed_type: &str) -> Option<Arc<TypeRegistration>> {
        self.by_managed.get(managed_type).map(|entry| Arc::clone(entry.value()))
    }

    /// The registration of `native_class` or of its nearest registered ancestor.
    ///
    /// `super_type_of` returns the native parent class, `None` or the null handle at
    /// the root. An ancestor match is cached under `native_class`; later queries for
    /// it return the cached registration without walking.
    pub fn best_fit(
        &self,
        native_class: NativeHandle,
        super_type_of: impl Fn(NativeHandle) -> Option<NativeHandle>,
    ) -> Result<Arc<TypeRegistration>, RegistryError> {
        if let Some(hit) = self.best_fit.get(&native_class) {
            return Ok(Arc::clone(hit.value()));
        }

        let mut visited = FxHashSet::default();
        let mut current = native_class;
        let found = loop {
            if let Some(found) = self.lookup(current) {
                break found;
            }
            match super_type_of(current) {
                Some(parent) if !parent.is_null() && visited.insert(parent) => current = parent,
                _ => {
                    return Err(RegistryError::NoKnownAncestor {
                        handle: native_class,
                    }
                    .logged());
                }
            }
        };

        if current == native_class {
            return Ok(found);
        }

        let fitted = Arc::new(TypeRegistration {
            native_class,
            managed_type: found.managed_type.clone(),
            implementation: found.implementation,
            is_best_fit: true,
        });
        tracing::debug!(
            %native_class,
            ancestor = %current,
            managed_type = %fitted.managed_type,
            "best fit cached"
        );
        // a concurrent query may have cached first; either answer is the same
        let cached = self.best_fit.entry(native_class).or_insert(fitted);
        Ok(Arc::clone(cached.value()))
    }

    /// Exact registrations.
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    pub fn best_fit_len(&self) -> usize {
        self.best_fit.len()
    }

    pub fn clear(&self) {
        self.exact.clear();
        self.by_managed.clear();
        self.best_fit.clear();
    }
}

impl Default for TypeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeIndex")
            .field("exact", &self.exact.len())
            .field("best_fit", &self.best_fit.len())
            .finish()
    }
}
