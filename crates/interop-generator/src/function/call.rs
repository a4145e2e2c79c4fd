//! Call sites of a marshalled function.
//!
//! [`FunctionBinding::write_binding_call`] writes the body of either end of a
//! boundary crossing:
//!
//! - order [`Order::Before`]: the calling side. Declared values are converted to
//!   intermediates and the entry point is called.
//! - order [`Order::After`]: the receiving side. Intermediates are converted back
//!   and the real method is called on `__self` or the type.
//!
//! Marshal-in runs in declaration order, the call follows, then marshal-out for
//! `out`/`ref` slots and the implicit return, again in declaration order.

use interop_core::{Codespace, GenerationError};

use super::plan::{FunctionMarshallingPlan, MarshalOrder, ParameterPlan};
use super::FunctionDefinition;
use crate::emit::write_comments;
use crate::marshalling::{MarshalRequest, Order};
use crate::writer::{CodeWriter, Scope};

/// A function with its plan.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    pub function: FunctionDefinition,
    pub plan: FunctionMarshallingPlan,
}

impl FunctionBinding {
    pub fn new(function: FunctionDefinition) -> Result<Self, GenerationError> {
        let plan = FunctionMarshallingPlan::new(&function)?;
        Ok(Self { function, plan })
    }

    // ========================================================================
    // Argument lists
    // ========================================================================

    /// Declared parameter list. Managed declarations keep default values.
    pub fn format_argument_list(&self, space: Codespace) -> String {
        self.function
            .parameters
            .iter()
            .map(|p| {
                let mut arg = format!("{} {}", p.ty.format(space), p.name);
                if let (Codespace::Managed, Some(default)) = (space, &p.default_value) {
                    arg.push_str(" = ");
                    arg.push_str(default);
                }
                arg
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Slots of the call at `order`. Outside the marshalled order the implicit
    /// `__self` and `__return` are not part of the list.
    pub fn format_marshalled_argument_list(
        &self,
        invocation: bool,
        space: Codespace,
        order: MarshalOrder,
    ) -> String {
        let plan = &self.plan;
        let call_unmarshalled = plan.has_modified_parameters && order != MarshalOrder::Marshalled;
        let start = usize::from(call_unmarshalled && plan.has_this);
        let end = if call_unmarshalled && plan.has_modified_return {
            plan.parameters.len() - 1
        } else {
            plan.parameters.len()
        };

        plan.parameters[start..end]
            .iter()
            .map(|p| {
                let ty = p.slot_type(order);
                let name = p.name_for(space, order);
                if !invocation {
                    return format!("{} {name}", ty.format(space));
                }
                match (space, ty.direction.call_keyword()) {
                    (Codespace::Managed, Some(keyword)) => format!("{keyword} {name}"),
                    _ => name.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ========================================================================
    // Signatures
    // ========================================================================

    /// `[static ][virtual ]ret Name(params)`, one line.
    pub fn write_native_signature(&self, writer: &mut CodeWriter) {
        write_comments(writer, &self.function.comments);
        let f = &self.function;
        if f.is_static {
            writer.write("static ");
        }
        if f.is_virtual {
            writer.write("virtual ");
        }
        writer.write(&format!("{} {}", f.return_type.format_native(), f.name));
        {
            let mut params = writer.parenthesis("");
            params.write(&self.format_argument_list(Codespace::Native));
        }
        writer.new_line();
    }

    /// `visibility [static ]unsafe [virtual ]ret Name(params)`, one line.
    pub fn write_managed_signature(&self, writer: &mut CodeWriter) {
        write_comments(writer, &self.function.comments);
        let f = &self.function;
        writer.write(&format!("{} ", f.visibility.managed()));
        if f.is_static {
            writer.write("static ");
        }
        writer.write("unsafe ");
        if f.is_virtual {
            writer.write("virtual ");
        }
        writer.write(&format!("{} {}", f.return_type.format_managed(), f.name));
        let mut params = writer.parenthesis("\n");
        params.write(&self.format_argument_list(Codespace::Managed));
    }

    // ========================================================================
    // Call
    // ========================================================================

    fn marshal(
        writer: &mut CodeWriter,
        p: &ParameterPlan,
        source: &str,
        dest: &str,
        codespace: Codespace,
        order: Order,
        after_call: bool,
    ) -> Result<(), GenerationError> {
        let Some(marshaller) = &p.marshaller else {
            return Ok(());
        };
        marshaller.marshal_variable(
            writer,
            &MarshalRequest {
                ty: &p.declared,
                source,
                dest,
                codespace,
                order,
                after_call,
            },
        )
    }

    /// Write the marshal-in, call and marshal-out statements of one side.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write_binding_call(
        &self,
        writer: &mut CodeWriter,
        space: Codespace,
        order: Order,
    ) -> Result<(), GenerationError> {
        let plan = &self.plan;
        let f = &self.function;
        let marshal_order = match order {
            Order::Before => MarshalOrder::Before,
            Order::After => MarshalOrder::Marshalled,
        };
        let next_order = marshal_order.next();
        let has_out_arguments = plan.has_any(space) && plan.has_out_arguments;

        if order == Order::Before {
            if plan.has_this {
                writer.write_line(&format!(
                    "{} {} = this;",
                    f.enclosing.format_name(space),
                    plan.parameters[0].name
                ));
            }
            if let Some(ret) = plan.return_parameter() {
                writer.write_line(&format!("{} {};", ret.declared.ty.format_name(space), ret.name));
            }
        }

        if plan.has_any(space) {
            for p in plan.parameters.iter().filter(|p| p.is_marshalled(space)) {
                let from = p.name_for(space, marshal_order);
                let to = p.name_for(space, next_order);
                Self::marshal(writer, p, from, to, space, order, false)?;
            }
        }

        let keyword = space.var_keyword();
        let mut marshalled_return = None;
        let mut return_later = false;
        match &plan.ret {
            Some(ret) if ret.is_marshalled(space) => {
                writer.write(&format!("{keyword} {} = ", ret.marshalled_name));
                marshalled_return = Some(ret);
                return_later = true;
            }
            Some(ret) if has_out_arguments => {
                writer.write(&format!("{keyword} {} = ", ret.name));
                return_later = true;
            }
            Some(_) => writer.write("return "),
            None => {
                if let (Some(ret), Order::After) = (plan.return_parameter(), order) {
                    writer.write(&format!("{} = ", ret.name));
                }
            }
        }

        match order {
            Order::Before => writer.write(&f.entry_point),
            Order::After => {
                if f.is_static {
                    let owner = match space {
                        Codespace::Native => &f.enclosing.native_name,
                        Codespace::Managed => &f.enclosing.managed_name,
                    };
                    writer.write(&format!("{owner}{}", space.static_access()));
                } else {
                    writer.write(&format!("{}{}", plan.parameters[0].name, space.instance_access()));
                }
                writer.write(&f.name);
            }
        }
        {
            let mut args = writer.parenthesis(";\n");
            args.write(&self.format_marshalled_argument_list(true, space, next_order));
        }

        if has_out_arguments {
            for p in plan
                .parameters
                .iter()
                .filter(|p| p.is_marshalled(space) && p.marshal_out)
            {
                let from = p.name_for(space, next_order);
                let to = p.name_for(space, marshal_order);
                Self::marshal(writer, p, from, to, space, order.opposite(), true)?;
            }
        }

        if return_later {
            if let Some(ret) = marshalled_return {
                Self::marshal(
                    writer,
                    ret,
                    &ret.marshalled_name,
                    &ret.name,
                    space,
                    order.opposite(),
                    false,
                )?;
            }
            if let Some(ret) = &plan.ret {
                writer.write_line(&format!("return {};", ret.name));
            }
        } else if let (Some(ret), Order::Before) = (plan.return_parameter(), order) {
            writer.write_line(&format!("return {};", ret.name));
        }
        Ok(())
    }
}

/// Wrap managed code in `try` with a `catch` that logs and rethrows.
///
/// The returned guard closes the `catch` when dropped. Blocks left open by the
/// body (`fixed` pins) are closed before the `try` block.
pub fn guard_exceptions(writer: &mut CodeWriter) -> Scope<'_> {
    writer.write_line("try");
    let try_block = writer.open_block_detached("");
    writer.trailing_with(move |w| {
        w.unwind_to(try_block);
        w.write_line("catch (Exception __ex)");
        let mut catch = w.block("");
        catch.write_line("Unreal.Core.UeLog.Log(Unreal.Core.LogVerbosity.Error, __ex.ToString());");
        catch.write_line("throw;");
    })
}
