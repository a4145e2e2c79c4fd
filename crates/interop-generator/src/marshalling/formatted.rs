//! Marshallers driven by per-direction expression formats.
//!
//! [`FormattedMarshaller`] implements the statement layout shared by every
//! format-driven marshaller. The rule set decides the intermediate type and how a
//! single expression is converted; the marshaller decides which variables exist.
//!
//! Slots that are not by-value go through an extra `{name}__partial` variable that
//! holds the converted value, and the pointer to it is what crosses the boundary.
//! `out` slots get a declaration without an initializer.

use std::fmt::Debug;

use interop_core::{Codespace, CodespaceFlags, GenerationError, TransferDirection};

use super::{MarshalRequest, Marshaller, Order, PassByReferenceMarshaller};
use crate::types::{QualifiedTypeReference, TypeRef, pointer_to};
use crate::writer::CodeWriter;

/// Intermediate choice and expression formatting for a [`FormattedMarshaller`].
pub trait FormatRules: Debug {
    /// Boundary type for a by-value slot of `ty`.
    fn intermediate_of(&self, ty: &TypeRef) -> TypeRef;

    /// Convert the expression `field` in `space`, in direction `order`.
    fn format(&self, ty: &QualifiedTypeReference, space: Codespace, order: Order, field: &str) -> String;

    fn header(&self) -> Option<&str> {
        None
    }

    fn namespace(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct FormattedMarshaller<R> {
    rules: R,
}

impl<R: FormatRules> FormattedMarshaller<R> {
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Pass a partial variable by reference when the slot is not by value.
    fn marshal_reference(
        &self,
        writer: &mut CodeWriter,
        request: &MarshalRequest<'_>,
        intermediate: &QualifiedTypeReference,
        source: &str,
        dest: &str,
    ) -> Result<(), GenerationError> {
        if request.ty.is_by_value() {
            return Ok(());
        }
        PassByReferenceMarshaller.marshal_variable(
            writer,
            &MarshalRequest {
                ty: intermediate,
                source,
                dest,
                ..*request
            },
        )
    }
}

impl<R: FormatRules> Marshaller for FormattedMarshaller<R> {
    fn active_in(&self) -> CodespaceFlags {
        CodespaceFlags::ALL
    }

    fn requires_return_inversion(&self) -> bool {
        false
    }

    fn additional_header(&self) -> Option<&str> {
        self.rules.header()
    }

    fn additional_namespace(&self) -> Option<&str> {
        self.rules.namespace()
    }

    fn intermediate_type(&self, ty: &QualifiedTypeReference) -> Result<TypeRef, GenerationError> {
        let intermediate = self.rules.intermediate_of(&ty.ty);
        if ty.is_by_value() {
            Ok(intermediate)
        } else {
            pointer_to(&intermediate)
        }
    }

    fn marshal_variable(
        &self,
        writer: &mut CodeWriter,
        request: &MarshalRequest<'_>,
    ) -> Result<(), GenerationError> {
        let MarshalRequest {
            ty,
            source,
            dest,
            codespace,
            order,
            after_call,
        } = *request;

        let intermediate = self.rules.intermediate_of(&ty.ty);
        // the partial is a local, so its address is taken without pinning
        let to_marshal = QualifiedTypeReference::by_value(intermediate.clone());
        let by_value = ty.is_by_value();
        let is_out = ty.direction == TransferDirection::Out;
        let convert = |field: &str| self.rules.format(ty, codespace, order, field);

        if after_call {
            let partial = match (by_value, order) {
                (true, _) => source.to_string(),
                (false, Order::Before) => format!("{dest}__partial"),
                (false, Order::After) => format!("{source}__partial"),
            };
            match order {
                Order::Before => writer.write_line(&format!("{partial} = {};", convert(source))),
                Order::After => writer.write_line(&format!("{dest} = {};", convert(&partial))),
            }
            return Ok(());
        }

        match order {
            Order::Before => {
                let partial = if by_value {
                    dest.to_string()
                } else {
                    format!("{dest}__partial")
                };
                let intermediate_name = intermediate.format_name(codespace);
                if is_out {
                    writer.write_line(&format!("{intermediate_name} {partial};"));
                } else {
                    writer.write_line(&format!(
                        "{intermediate_name} {partial} = {};",
                        convert(source)
                    ));
                }
                self.marshal_reference(writer, request, &to_marshal, &partial, dest)
            }
            Order::After => {
                let partial = if by_value {
                    source.to_string()
                } else {
                    format!("{source}__partial")
                };
                self.marshal_reference(writer, request, &to_marshal, source, &partial)?;

                let declared_name = ty.ty.format_name(codespace);
                if is_out {
                    writer.write_line(&format!("{declared_name} {dest};"));
                } else {
                    writer.write_line(&format!("{declared_name} {dest} = {};", convert(&partial)));
                }
                Ok(())
            }
        }
    }
}
