//! Type model shared by resolution, marshalling and emission.
//!
//! Every logical type of a run is one [`TypeInfo`] behind a [`TypeRef`]. Identity is
//! by pointer: the resolver hands out the same `Rc` each time a type is requested,
//! so `Rc::ptr_eq` is a valid equality check.
//!
//! ## Kinds of types
//!
//! - primitives, from a fixed table ([`primitives`])
//! - mapped types, declared by an explicit mapping in the feed
//! - declared types, the classes, structs, interfaces and enums bindings are generated for
//! - generic instances of a mapped generic, with their arguments
//! - opaque native types, known natively but with no managed representation
//! - pointer wrappers ([`pointer`]) built on demand by marshallers

pub mod pointer;
pub mod primitives;

use std::cell::OnceCell;
use std::fmt;
use std::rc::{Rc, Weak};

use interop_core::{
    Codespace, Namespace, TransferDirection, TransferMode, TypeHash, TypeImplementation, TypeKind,
};

use crate::marshalling::MarshallerRef;

pub use pointer::{opaque_pointer_to, pointer_to};

/// Shared handle to a type of the current run.
pub type TypeRef = Rc<TypeInfo>;

/// Where a type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOrigin {
    Primitive,
    Mapped,
    Declared(TypeImplementation),
    Opaque,
    Pointer,
    OpaquePointer,
}

pub struct TypeInfo {
    pub id: TypeHash,
    pub managed_name: String,
    pub native_name: String,
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub kind: TypeKind,
    pub namespace: Namespace,
    /// Declaring managed module.
    pub module: String,
    pub native_module: String,
    pub header: String,
    pub transfer: TransferMode,
    pub default_marshaller: Option<MarshallerRef>,
    pub generic_arguments: Vec<TypeRef>,
    pub origin: TypeOrigin,
    /// Pointee of a pointer wrapper.
    pub(crate) element: Option<Weak<TypeInfo>>,
    pub(crate) pointer: OnceCell<TypeRef>,
    pub(crate) opaque_pointer: OnceCell<TypeRef>,
}

impl TypeInfo {
    /// A type with no parent, members or marshaller. Identity is derived from the
    /// qualified managed name.
    pub fn new(
        managed_name: impl Into<String>,
        native_name: impl Into<String>,
        kind: TypeKind,
        origin: TypeOrigin,
    ) -> Self {
        let managed_name = managed_name.into();
        Self {
            id: TypeHash::from_name(&managed_name),
            managed_name,
            native_name: native_name.into(),
            parent: None,
            interfaces: Vec::new(),
            kind,
            namespace: Namespace::global(),
            module: String::new(),
            native_module: String::new(),
            header: String::new(),
            transfer: TransferMode::ByValue,
            default_marshaller: None,
            generic_arguments: Vec::new(),
            origin,
            element: None,
            pointer: OnceCell::new(),
            opaque_pointer: OnceCell::new(),
        }
    }

    /// Set the namespace and recompute identity from the qualified name.
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self.id = TypeHash::from_name(&self.full_managed_name());
        self
    }

    pub fn with_transfer(mut self, transfer: TransferMode) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_marshaller(mut self, marshaller: Option<MarshallerRef>) -> Self {
        self.default_marshaller = marshaller;
        self
    }

    pub fn into_ref(self) -> TypeRef {
        Rc::new(self)
    }

    /// Managed name qualified by its namespace.
    pub fn full_managed_name(&self) -> String {
        self.namespace.qualify(&self.managed_name)
    }

    /// Spelling of the type in `space` as used in declarations.
    pub fn format_name(&self, space: Codespace) -> String {
        match space {
            Codespace::Native => self.transfer.format(&self.native_name),
            Codespace::Managed => {
                if self.origin == TypeOrigin::Opaque {
                    "IntPtr".to_string()
                } else {
                    self.managed_name.clone()
                }
            }
        }
    }

    pub fn format_native(&self) -> String {
        self.format_name(Codespace::Native)
    }

    pub fn format_managed(&self) -> String {
        self.format_name(Codespace::Managed)
    }

    pub fn is_void(&self) -> bool {
        self.origin == TypeOrigin::Primitive && self.native_name == "void"
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_arguments.is_empty()
    }

    pub fn is_value_type(&self) -> bool {
        self.kind.is_value_type()
    }

    pub fn implementation(&self) -> Option<TypeImplementation> {
        match self.origin {
            TypeOrigin::Declared(implementation) => Some(implementation),
            _ => None,
        }
    }

    /// The pointee, for pointer wrappers.
    pub fn element(&self) -> Option<TypeRef> {
        self.element.as_ref().and_then(Weak::upgrade)
    }

    /// The ancestors of this type, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &TypeRef> {
        std::iter::successors(self.parent.as_ref(), |t| t.parent.as_ref())
    }

    /// This type plus everything its spelling depends on: generic arguments
    /// (recursively) and pointees.
    pub fn type_dependencies(self: &Rc<Self>) -> Vec<TypeRef> {
        let mut deps = Vec::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(self: &Rc<Self>, deps: &mut Vec<TypeRef>) {
        match self.element() {
            Some(element) => element.collect_dependencies(deps),
            None => deps.push(Rc::clone(self)),
        }
        for arg in &self.generic_arguments {
            arg.collect_dependencies(deps);
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("managed_name", &self.managed_name)
            .field("native_name", &self.native_name)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("parent", &self.parent.as_ref().map(|p| &p.managed_name))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_managed_name())
    }
}

/// A type together with the direction of the slot it occupies.
#[derive(Debug, Clone)]
pub struct QualifiedTypeReference {
    pub ty: TypeRef,
    pub direction: TransferDirection,
}

impl QualifiedTypeReference {
    pub fn new(ty: TypeRef, direction: TransferDirection) -> Self {
        Self { ty, direction }
    }

    pub fn by_value(ty: TypeRef) -> Self {
        Self::new(ty, TransferDirection::ByValue)
    }

    pub fn is_by_value(&self) -> bool {
        self.direction.is_by_value()
    }

    /// Spelling of the slot in `space`.
    ///
    /// Natively `in` becomes a const reference and `out`/`ref` a plain reference.
    /// Managed slots take the direction keyword as a prefix.
    pub fn format(&self, space: Codespace) -> String {
        let base = self.ty.format_name(space);
        match (space, self.direction) {
            (_, TransferDirection::ByValue) => base,
            (Codespace::Native, TransferDirection::In) => format!("const {base}&"),
            (Codespace::Native, _) => format!("{base}&"),
            (Codespace::Managed, direction) => format!("{direction} {base}"),
        }
    }

    pub fn format_native(&self) -> String {
        self.format(Codespace::Native)
    }

    pub fn format_managed(&self) -> String {
        self.format(Codespace::Managed)
    }
}
