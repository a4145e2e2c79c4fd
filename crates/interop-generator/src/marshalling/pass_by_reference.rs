use interop_core::{Codespace, CodespaceFlags, GenerationError};

use super::{MarshalRequest, Marshaller, Order};
use crate::types::{QualifiedTypeReference, TypeRef, pointer_to};
use crate::writer::CodeWriter;

/// Passes a value by its address.
///
/// Managed code pins references with a `fixed` block. The block stays open until
/// the enclosing writer scope closes, so the pointer outlives the call.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassByReferenceMarshaller;

impl Marshaller for PassByReferenceMarshaller {
    fn active_in(&self) -> CodespaceFlags {
        CodespaceFlags::ALL
    }

    fn requires_return_inversion(&self) -> bool {
        true
    }

    fn intermediate_type(&self, ty: &QualifiedTypeReference) -> Result<TypeRef, GenerationError> {
        pointer_to(&ty.ty)
    }

    fn marshal_variable(
        &self,
        writer: &mut CodeWriter,
        request: &MarshalRequest<'_>,
    ) -> Result<(), GenerationError> {
        if request.after_call {
            return Ok(());
        }

        let MarshalRequest { ty, source, dest, .. } = *request;
        match (request.codespace, request.order) {
            (Codespace::Managed, Order::Before) => {
                let name = &ty.ty.managed_name;
                if ty.is_by_value() {
                    writer.write_line(&format!("{name}* {dest} = &{source};"));
                } else {
                    writer.write_line(&format!("fixed({name}* {dest} = &{source})"));
                    writer.open_block_detached("");
                }
            }
            (Codespace::Managed, Order::After) => {
                writer.write_line(&format!("var ref {dest} = ref *{source};"));
            }
            (Codespace::Native, Order::Before) => {
                writer.write_line(&format!("{}* {dest} = &{source};", ty.ty.native_name));
            }
            (Codespace::Native, Order::After) => {
                writer.write_line(&format!("{}& {dest} = *{source};", ty.ty.native_name));
            }
        }
        Ok(())
    }
}
