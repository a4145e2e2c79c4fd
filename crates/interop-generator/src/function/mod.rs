//! Functions that cross the boundary.
//!
//! A [`FunctionDefinition`] is a resolved method of a declared type. Its
//! [`FunctionMarshallingPlan`] lists every slot that actually crosses the boundary,
//! including the implicit `__self` and `__return` slots. [`FunctionBinding`] writes
//! the call sites from the plan and the binders turn a binding into member emitters.

pub mod binder;
pub mod call;
pub mod plan;

use std::rc::Rc;

use interop_core::{
    FunctionDescriptor, GenerationError, ParameterDescriptor, TransferDirection, Visibility,
};

use crate::context::GenerationContext;
use crate::marshalling::{MarshallerRef, build_marshaller};
use crate::types::{QualifiedTypeReference, TypeRef};

pub use binder::{ManagedFunctionBinder, NativeFunctionBinder, function_binder};
pub use call::FunctionBinding;
pub use plan::{FunctionMarshallingPlan, MarshalOrder, ParameterPlan, ReturnPlan};

#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: String,
    pub ty: QualifiedTypeReference,
    pub marshaller: Option<MarshallerRef>,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub enclosing: TypeRef,
    pub is_static: bool,
    pub is_virtual: bool,
    pub return_type: QualifiedTypeReference,
    pub return_marshaller: Option<MarshallerRef>,
    pub parameters: Vec<ParameterDefinition>,
    pub visibility: Visibility,
    pub comments: String,
    /// Mangled C ABI symbol.
    pub entry_point: String,
}

impl FunctionDefinition {
    /// Qualified name used in diagnostics, `Game.Derived.Compute`.
    pub fn symbol(&self) -> String {
        format!("{}.{}", self.enclosing.full_managed_name(), self.name)
    }

    /// Resolve a function of `enclosing` and mangle its entry point.
    ///
    /// Any unresolved parameter or return type fails the whole function.
    pub fn from_descriptor(
        ctx: &mut GenerationContext,
        enclosing: &TypeRef,
        descriptor: &FunctionDescriptor,
    ) -> Result<Self, GenerationError> {
        let symbol = format!("{}.{}", enclosing.full_managed_name(), descriptor.name);
        let location = descriptor.location.as_ref();

        let return_type = ctx
            .resolver()
            .resolve_at(&descriptor.return_type, &symbol, location)?;
        let return_marshaller = match &descriptor.return_marshaller {
            Some(m) => Some(build_marshaller(&symbol, m, |r| {
                ctx.resolver().resolve_at(r, &symbol, location)
            })?),
            None => return_type.default_marshaller.clone(),
        };

        let mut parameters = Vec::with_capacity(descriptor.parameters.len());
        for param in &descriptor.parameters {
            parameters.push(resolve_parameter(ctx, &symbol, descriptor, param)?);
        }

        let slots: Vec<QualifiedTypeReference> = parameters.iter().map(|p| p.ty.clone()).collect();
        let entry_point = ctx
            .mangler()
            .entry_point(enclosing, &descriptor.name, &slots)?;

        Ok(Self {
            name: descriptor.name.clone(),
            enclosing: Rc::clone(enclosing),
            is_static: descriptor.is_static,
            is_virtual: descriptor.is_virtual,
            return_type: QualifiedTypeReference::by_value(return_type),
            return_marshaller,
            parameters,
            visibility: descriptor.visibility,
            comments: descriptor.comments.clone(),
            entry_point,
        })
    }

    /// Every type this function's signature names.
    pub fn type_dependencies(&self) -> Vec<TypeRef> {
        let mut deps: Vec<TypeRef> = self
            .parameters
            .iter()
            .flat_map(|p| p.ty.ty.type_dependencies())
            .collect();
        deps.extend(self.return_type.ty.type_dependencies());
        deps
    }
}

fn resolve_parameter(
    ctx: &mut GenerationContext,
    symbol: &str,
    function: &FunctionDescriptor,
    param: &ParameterDescriptor,
) -> Result<ParameterDefinition, GenerationError> {
    let location = function.location.as_ref();
    let ty = ctx.resolver().resolve_at(&param.ty, symbol, location)?;
    if ty.is_void() {
        return Err(GenerationError::metadata(
            symbol,
            format!("parameter '{}' cannot be void", param.name),
        ));
    }
    if param.transfer == TransferDirection::Out && param.default.is_some() {
        return Err(GenerationError::metadata(
            symbol,
            format!("out parameter '{}' cannot have a default value", param.name),
        ));
    }

    let marshaller = match &param.marshaller {
        Some(m) => Some(build_marshaller(symbol, m, |r| {
            ctx.resolver().resolve_at(r, symbol, location)
        })?),
        None => ty.default_marshaller.clone(),
    };

    Ok(ParameterDefinition {
        name: param.name.clone(),
        ty: QualifiedTypeReference::new(ty, param.transfer),
        marshaller,
        default_value: param.default.clone(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Types and functions shared by the function tests.

    use super::*;
    use crate::marshalling::PassByReferenceMarshaller;
    use crate::marshalling::registry::object_marshaller;
    use crate::types::{TypeInfo, TypeOrigin, primitives};
    use interop_core::{Namespace, TransferMode, TypeImplementation, TypeKind};

    pub fn int() -> TypeRef {
        primitives::make("int", "int32").into_ref()
    }

    pub fn void() -> TypeRef {
        primitives::make("void", "void").into_ref()
    }

    pub fn vector() -> TypeRef {
        TypeInfo::new("Vector", "FVector", TypeKind::Struct, TypeOrigin::Mapped)
            .with_namespace(Namespace::parse("Unreal.Core"))
            .with_marshaller(Some(Rc::new(PassByReferenceMarshaller)))
            .into_ref()
    }

    pub fn class(managed: &str, native: &str, implementation: TypeImplementation) -> TypeRef {
        TypeInfo::new(managed, native, TypeKind::Class, TypeOrigin::Declared(implementation))
            .with_namespace(Namespace::parse("Game"))
            .with_transfer(TransferMode::ByPointer)
            .with_marshaller(Some(object_marshaller(implementation)))
            .into_ref()
    }

    pub fn param(name: &str, ty: TypeRef, direction: TransferDirection) -> ParameterDefinition {
        let marshaller = ty.default_marshaller.clone();
        ParameterDefinition {
            name: name.into(),
            ty: QualifiedTypeReference::new(ty, direction),
            marshaller,
            default_value: None,
        }
    }

    pub fn function(
        enclosing: &TypeRef,
        name: &str,
        ret: TypeRef,
        parameters: Vec<ParameterDefinition>,
    ) -> FunctionDefinition {
        let slots: Vec<QualifiedTypeReference> = parameters.iter().map(|p| p.ty.clone()).collect();
        let return_marshaller = ret.default_marshaller.clone();
        FunctionDefinition {
            name: name.into(),
            enclosing: Rc::clone(enclosing),
            is_static: false,
            is_virtual: false,
            return_type: QualifiedTypeReference::by_value(ret),
            return_marshaller,
            parameters,
            visibility: Visibility::Public,
            comments: String::new(),
            entry_point: crate::mangle::mangle_method(enclosing, name, &slots),
        }
    }
}
