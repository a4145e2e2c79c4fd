//! Registry errors.
//!
//! Every registry error means native and managed bookkeeping disagree, so all of
//! them are fatal. They are logged at error level where they are raised.

use thiserror::Error;

use crate::NativeHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A live entry already exists for the handle.
    #[error("native handle {handle} is already registered")]
    DuplicateRegistration { handle: NativeHandle },

    /// A managed type was registered for a second native class.
    #[error("managed type '{managed_type}' is already registered")]
    DuplicateManagedType { managed_type: String },

    /// Teardown of a handle that was never registered, or already removed.
    #[error("native handle {handle} is not registered")]
    UnknownHandle { handle: NativeHandle },

    /// The supertype walk reached the root without a registered type.
    #[error("no type in the hierarchy of native class {handle} is registered")]
    NoKnownAncestor { handle: NativeHandle },

    #[error("the null handle cannot be registered")]
    NullHandle,
}

impl RegistryError {
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Log the error and hand it back.
    pub(crate) fn logged(self) -> Self {
        tracing::error!(error = %self, "registry invariant violated");
        self
    }
}
