//! Read-only metadata feed consumed by the generator.
//!
//! The feed describes modules, explicit type mappings and declared types with their
//! members. It is deserialized with serde; every optional field has a default so a
//! minimal feed only needs names.
//!
//! ```
//! use interop_core::{FeedDescriptor, TypeKind};
//!
//! let feed: FeedDescriptor = serde_json::from_str(r#"{
//!     "types": [{ "managed_name": "Base", "native_name": "NBase", "kind": "class" }]
//! }"#).unwrap();
//! assert_eq!(feed.types[0].kind, TypeKind::Class);
//! assert!(feed.types[0].functions.is_empty());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Namespace, RawTypeReference, TransferDirection, TransferMode, TypeImplementation, TypeKind,
    Visibility,
};

fn default_format() -> String {
    "{0}".to_string()
}

fn void_type() -> RawTypeReference {
    RawTypeReference::named("void")
}

/// Where a declaration came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The whole feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    #[serde(default)]
    pub mappings: Vec<MappingDescriptor>,
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

/// A managed module, the unit output is grouped by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default)]
    pub namespace: Namespace,
}

/// Conversion expressions of a custom mapping. Each holds a single `{0}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatsDescriptor {
    #[serde(default = "default_format")]
    pub managed_to_intermediate: String,
    #[serde(default = "default_format")]
    pub intermediate_to_managed: String,
    #[serde(default = "default_format")]
    pub native_to_intermediate: String,
    #[serde(default = "default_format")]
    pub intermediate_to_native: String,
    #[serde(default)]
    pub required_header: Option<String>,
    #[serde(default)]
    pub required_namespace: Option<String>,
}

impl Default for FormatsDescriptor {
    fn default() -> Self {
        Self {
            managed_to_intermediate: default_format(),
            intermediate_to_managed: default_format(),
            native_to_intermediate: default_format(),
            intermediate_to_native: default_format(),
            required_header: None,
            required_namespace: None,
        }
    }
}

impl FormatsDescriptor {
    /// The four conversion formats in a fixed order, labelled.
    pub fn formats(&self) -> [(&'static str, &str); 4] {
        [
            ("managed_to_intermediate", &self.managed_to_intermediate),
            ("intermediate_to_managed", &self.intermediate_to_managed),
            ("native_to_intermediate", &self.native_to_intermediate),
            ("intermediate_to_native", &self.intermediate_to_native),
        ]
    }
}

/// Static list of marshaller kinds a feed may name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarshallerDescriptor {
    PassByReference,
    ManagedObject,
    NativeObject,
    Custom {
        intermediate: RawTypeReference,
        #[serde(default)]
        formats: FormatsDescriptor,
    },
}

/// Explicit correspondence between a native and a managed type.
///
/// A mapping with `generic_parameters` is an unbound generic: `TArray` with `["T"]`
/// maps every `TArray<X>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDescriptor {
    pub managed_name: String,
    pub native_name: String,
    #[serde(default)]
    pub namespace: Namespace,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub header: String,
    #[serde(default = "default_mapping_kind")]
    pub kind: TypeKind,
    #[serde(default)]
    pub memory: TransferMode,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    /// Intermediate type for a custom marshaller. No marshaller when absent.
    #[serde(default)]
    pub intermediate: Option<RawTypeReference>,
    #[serde(default)]
    pub formats: Option<FormatsDescriptor>,
}

fn default_mapping_kind() -> TypeKind {
    TypeKind::Struct
}

/// A declared type and its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub managed_name: String,
    pub native_name: String,
    #[serde(default)]
    pub namespace: Namespace,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub native_module: String,
    #[serde(default)]
    pub header: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub implementation: TypeImplementation,
    #[serde(default)]
    pub parent: Option<RawTypeReference>,
    #[serde(default)]
    pub interfaces: Vec<RawTypeReference>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub marshaller: Option<MarshallerDescriptor>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    pub functions: Vec<FunctionDescriptor>,
    #[serde(default)]
    pub enum_values: Vec<EnumValueDescriptor>,
    /// Enum is a bit set.
    #[serde(default)]
    pub flags: bool,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl TypeDescriptor {
    /// Fully qualified managed name.
    pub fn full_managed_name(&self) -> String {
        self.namespace.qualify(&self.managed_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawTypeReference,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default = "void_type", rename = "return")]
    pub return_type: RawTypeReference,
    #[serde(default)]
    pub return_marshaller: Option<MarshallerDescriptor>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawTypeReference,
    #[serde(default)]
    pub transfer: TransferDirection,
    #[serde(default)]
    pub marshaller: Option<MarshallerDescriptor>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub value: i64,
}
