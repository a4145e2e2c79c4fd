//! Core types shared by the interop binding generator and its runtime registry.
//!
//! ## Modules
//!
//! - [`codespace`]: the native and managed runtimes
//! - [`descriptor`]: the metadata feed
//! - [`error`]: generation errors and the error collector
//! - [`qualified_name`]: managed namespaces
//! - [`raw_type`]: unresolved type references
//! - [`transfer`]: transfer modes and parameter directions
//! - [`type_hash`]: deterministic type identity
//! - [`type_kind`]: type categories and visibility

pub mod codespace;
pub mod descriptor;
pub mod error;
pub mod qualified_name;
pub mod raw_type;
pub mod transfer;
pub mod type_hash;
pub mod type_kind;

pub use codespace::{Codespace, CodespaceFlags};
pub use descriptor::{
    EnumValueDescriptor, FeedDescriptor, FormatsDescriptor, FunctionDescriptor,
    MappingDescriptor, MarshallerDescriptor, ModuleDescriptor, ParameterDescriptor,
    PropertyDescriptor, SourceLocation, TypeDescriptor,
};
pub use error::{ConfigurationError, ErrorCollector, GenerationError, UnresolvedTypeError};
pub use qualified_name::Namespace;
pub use raw_type::{RawTypeReference, TypeRefParseError};
pub use transfer::{TransferDirection, TransferMode};
pub use type_hash::{TypeHash, module_ticket};
pub use type_kind::{TypeImplementation, TypeKind, Visibility};
