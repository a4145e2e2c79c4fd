//! Native instance handle to wrapper table.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxBuildHasher;

use crate::{NativeHandle, RegistryError};

/// Thread-safe map from native object handles to their managed wrappers.
///
/// There is at most one live wrapper per handle. Registering over a live entry
/// fails instead of replacing it.
pub struct ObjectRegistry<W> {
    entries: DashMap<NativeHandle, Arc<W>, FxBuildHasher>,
}

impl<W> ObjectRegistry<W> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Register the wrapper of a newly seen native object.
    pub fn register(&self, handle: NativeHandle, wrapper: Arc<W>) -> Result<(), RegistryError> {
        if handle.is_null() {
            return Err(RegistryError::NullHandle.logged());
        }
        match self.entries.entry(handle) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateRegistration { handle }.logged()),
            Entry::Vacant(slot) => {
                slot.insert(wrapper);
                tracing::trace!(%handle, "object registered");
                Ok(())
            }
        }
    }

    /// Remove the entry of a native object that is being destroyed.
    pub fn unregister(&self, handle: NativeHandle) -> Result<Arc<W>, RegistryError> {
        match self.entries.remove(&handle) {
            Some((_, wrapper)) => {
                tracing::trace!(%handle, "object unregistered");
                Ok(wrapper)
            }
            None => Err(RegistryError::UnknownHandle { handle }.logged()),
        }
    }

    pub fn lookup(&self, handle: NativeHandle) -> Option<Arc<W>> {
        self.entries.get(&handle).map(|entry| Arc::clone(entry.value()))
    }

    /// The live wrapper of `handle`, or a new one built by `create`.
    ///
    /// When two callers race for the same handle, one wrapper wins and both get it.
    pub fn lookup_or_insert_with(
        &self,
        handle: NativeHandle,
        create: impl FnOnce() -> W,
    ) -> Result<Arc<W>, RegistryError> {
        if handle.is_null() {
            return Err(RegistryError::NullHandle.logged());
        }
        let entry = self.entries.entry(handle).or_insert_with(|| Arc::new(create()));
        Ok(Arc::clone(entry.value()))
    }

    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, for shutdown.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<W> Default for ObjectRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> std::fmt::Debug for ObjectRegistry<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}
