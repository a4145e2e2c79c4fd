//! The fixed list of marshaller kinds a feed may name.

use std::rc::Rc;

use interop_core::{GenerationError, MarshallerDescriptor, RawTypeReference, TypeImplementation};

use super::custom::validate_formats;
use super::{CustomFormats, FormattedMarshaller, MarshallerRef, ObjectFormats, PassByReferenceMarshaller};
use crate::types::TypeRef;

/// Object marshaller for a type implemented on `origin`'s side.
pub fn object_marshaller(origin: TypeImplementation) -> MarshallerRef {
    Rc::new(FormattedMarshaller::new(ObjectFormats::new(origin)))
}

/// Build the marshaller a descriptor names.
///
/// `owner` names the declaration for error messages. `resolve` resolves the
/// intermediate type of custom marshallers.
pub fn build_marshaller(
    owner: &str,
    descriptor: &MarshallerDescriptor,
    resolve: impl FnOnce(&RawTypeReference) -> Result<TypeRef, GenerationError>,
) -> Result<MarshallerRef, GenerationError> {
    match descriptor {
        MarshallerDescriptor::PassByReference => Ok(Rc::new(PassByReferenceMarshaller)),
        MarshallerDescriptor::ManagedObject => Ok(object_marshaller(TypeImplementation::Managed)),
        MarshallerDescriptor::NativeObject => Ok(object_marshaller(TypeImplementation::Native)),
        MarshallerDescriptor::Custom {
            intermediate,
            formats,
        } => {
            validate_formats(owner, formats)?;
            let intermediate = resolve(intermediate)?;
            Ok(Rc::new(FormattedMarshaller::new(CustomFormats::new(
                intermediate,
                formats.clone(),
            ))))
        }
    }
}
