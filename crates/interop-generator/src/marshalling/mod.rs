//! Conversion of values between a declared type and its boundary type.
//!
//! A [`Marshaller`] is a stateless strategy. Given a variable of the declared type it
//! writes the statements that define a variable of the intermediate type (order
//! [`Order::Before`]), or the reverse ([`Order::After`]). Function binders call it
//! for every actively marshalled parameter.
//!
//! ## Built-in marshallers
//!
//! - [`PassByReferenceMarshaller`]: takes the address of a value; used for inverted
//!   returns and for non by-value slots of formatted marshallers.
//! - [`FormattedMarshaller`] with [`CustomFormats`]: user-supplied `{0}` expressions.
//! - [`FormattedMarshaller`] with [`ObjectFormats`]: object handles passed as opaque pointers.

pub mod custom;
pub mod formatted;
pub mod object;
pub mod pass_by_reference;
pub mod registry;

use std::fmt::Debug;
use std::rc::Rc;

use interop_core::{Codespace, CodespaceFlags, GenerationError};

use crate::types::{QualifiedTypeReference, TypeRef};
use crate::writer::CodeWriter;

pub use custom::CustomFormats;
pub use formatted::{FormatRules, FormattedMarshaller};
pub use object::ObjectFormats;
pub use pass_by_reference::PassByReferenceMarshaller;
pub use registry::build_marshaller;

pub type MarshallerRef = Rc<dyn Marshaller>;

/// Which way a conversion goes, relative to the call.
///
/// In the managed codespace `Before` converts managed to intermediate. In the
/// native codespace `Before` converts native to intermediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Before,
    After,
}

impl Order {
    pub const fn opposite(self) -> Order {
        match self {
            Order::Before => Order::After,
            Order::After => Order::Before,
        }
    }
}

/// One conversion to write.
#[derive(Debug, Clone, Copy)]
pub struct MarshalRequest<'a> {
    pub ty: &'a QualifiedTypeReference,
    pub source: &'a str,
    pub dest: &'a str,
    pub codespace: Codespace,
    pub order: Order,
    /// The call has happened and `dest` is already declared.
    pub after_call: bool,
}

pub trait Marshaller: Debug {
    /// Codespaces in which this marshaller writes conversions.
    fn active_in(&self) -> CodespaceFlags;

    /// Whether a return of this type must become an implicit out parameter.
    fn requires_return_inversion(&self) -> bool;

    /// Native header the conversions need.
    fn additional_header(&self) -> Option<&str> {
        None
    }

    /// Managed namespace the conversions need.
    fn additional_namespace(&self) -> Option<&str> {
        None
    }

    /// The type actually passed across the boundary for `ty`.
    fn intermediate_type(&self, ty: &QualifiedTypeReference) -> Result<TypeRef, GenerationError>;

    /// Write statements defining `request.dest` from `request.source`.
    fn marshal_variable(
        &self,
        writer: &mut CodeWriter,
        request: &MarshalRequest<'_>,
    ) -> Result<(), GenerationError>;

    fn is_active_in(&self, space: Codespace) -> bool {
        self.active_in().has_space(space)
    }
}

#[cfg(test)]
pub(crate) mod interpreter;
