use interop_core::{Codespace, CodespaceFlags, GenerationError};

use super::FunctionDefinition;
use crate::marshalling::MarshallerRef;
use crate::types::{QualifiedTypeReference, TypeRef};

/// Which variable of a slot a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalOrder {
    /// The declared value on the calling side.
    Before,
    /// The intermediate value passed across.
    Marshalled,
    /// The declared value on the receiving side.
    After,
}

impl MarshalOrder {
    pub const fn next(self) -> MarshalOrder {
        match self {
            MarshalOrder::Before => MarshalOrder::Marshalled,
            MarshalOrder::Marshalled | MarshalOrder::After => MarshalOrder::After,
        }
    }
}

/// One slot of a marshalled call.
#[derive(Debug, Clone)]
pub struct ParameterPlan {
    pub name: String,
    pub marshalled_name: String,
    pub declared: QualifiedTypeReference,
    pub intermediate: TypeRef,
    pub marshaller: Option<MarshallerRef>,
    pub default_value: Option<String>,
    /// Converted back after the call.
    pub marshal_out: bool,
    pub is_implicit_this: bool,
    pub is_implicit_return_out: bool,
}

impl ParameterPlan {
    fn new(
        name: &str,
        declared: QualifiedTypeReference,
        marshaller: Option<MarshallerRef>,
        default_value: Option<String>,
    ) -> Result<Self, GenerationError> {
        let intermediate = match &marshaller {
            Some(m) => m.intermediate_type(&declared)?,
            None => declared.ty.clone(),
        };
        Ok(Self {
            name: name.to_string(),
            marshalled_name: format!("{name}__marshalled"),
            marshal_out: declared.direction.is_out(),
            declared,
            intermediate,
            marshaller,
            default_value,
            is_implicit_this: false,
            is_implicit_return_out: false,
        })
    }

    /// Whether the slot is converted by code written in `space`.
    pub fn is_marshalled(&self, space: Codespace) -> bool {
        self.marshaller
            .as_ref()
            .is_some_and(|m| m.is_active_in(space))
    }

    /// Variable name of the slot at `order` in `space`.
    pub fn name_for(&self, space: Codespace, order: MarshalOrder) -> &str {
        if order == MarshalOrder::Marshalled && self.is_marshalled(space) {
            &self.marshalled_name
        } else {
            &self.name
        }
    }

    /// Slot type at `order`. The intermediate crosses by value.
    pub fn slot_type(&self, order: MarshalOrder) -> QualifiedTypeReference {
        if order == MarshalOrder::Marshalled && self.marshaller.is_some() {
            QualifiedTypeReference::by_value(self.intermediate.clone())
        } else {
            self.declared.clone()
        }
    }
}

/// The ABI return of a plan. `None` is void.
pub type ReturnPlan = Option<ParameterPlan>;

/// Every slot of a call across the boundary, in ABI order.
#[derive(Debug, Clone)]
pub struct FunctionMarshallingPlan {
    pub parameters: Vec<ParameterPlan>,
    pub ret: ReturnPlan,
    pub has_this: bool,
    pub has_modified_return: bool,
    /// The ABI list differs from the declared list.
    pub has_modified_parameters: bool,
    /// Some marshalled slot is converted back after the call.
    pub has_out_arguments: bool,
    marshalled_spaces: CodespaceFlags,
}

impl FunctionMarshallingPlan {
    /// Expand `function` into its ABI slots.
    ///
    /// Instance methods get a leading `__self`. A return whose marshaller needs
    /// inversion becomes a trailing `__return` slot and the ABI return is void.
    pub fn new(function: &FunctionDefinition) -> Result<Self, GenerationError> {
        let has_this = !function.is_static;
        let returns_value = !function.return_type.ty.is_void();
        let has_modified_return = returns_value
            && function
                .return_marshaller
                .as_ref()
                .is_some_and(|m| m.requires_return_inversion());

        let mut parameters = Vec::with_capacity(function.parameters.len() + 2);
        if has_this {
            let mut this = ParameterPlan::new(
                "__self",
                QualifiedTypeReference::by_value(function.enclosing.clone()),
                function.enclosing.default_marshaller.clone(),
                None,
            )?;
            this.is_implicit_this = true;
            parameters.push(this);
        }

        for param in &function.parameters {
            parameters.push(ParameterPlan::new(
                &param.name,
                param.ty.clone(),
                param.marshaller.clone(),
                param.default_value.clone(),
            )?);
        }

        let ret = if !returns_value {
            None
        } else {
            let slot = ParameterPlan::new(
                "__return",
                function.return_type.clone(),
                function.return_marshaller.clone(),
                None,
            )?;
            if has_modified_return {
                let mut out = slot;
                out.marshal_out = true;
                out.is_implicit_return_out = true;
                parameters.push(out);
                None
            } else {
                Some(slot)
            }
        };

        let mut marshalled_spaces = CodespaceFlags::empty();
        let mut has_out_arguments = false;
        for p in &parameters {
            if let Some(m) = &p.marshaller {
                marshalled_spaces |= m.active_in();
                has_out_arguments |= p.marshal_out;
            }
        }

        Ok(Self {
            has_modified_parameters: parameters.len() != function.parameters.len(),
            parameters,
            ret,
            has_this,
            has_modified_return,
            has_out_arguments,
            marshalled_spaces,
        })
    }

    /// Whether any slot is converted by code written in `space`.
    pub fn has_any(&self, space: Codespace) -> bool {
        self.marshalled_spaces.has_space(space)
    }

    /// The `__return` slot of an inverted return.
    pub fn return_parameter(&self) -> Option<&ParameterPlan> {
        if self.has_modified_return {
            self.parameters.last()
        } else {
            None
        }
    }

    fn format_return_intermediate(&self, space: Codespace) -> String {
        match &self.ret {
            Some(ret) => ret.intermediate.format_name(space),
            None => "void".to_string(),
        }
    }

    /// Native ABI return spelling.
    pub fn native_return(&self) -> String {
        self.format_return_intermediate(Codespace::Native)
    }

    /// Managed ABI return spelling.
    pub fn managed_return(&self) -> String {
        self.format_return_intermediate(Codespace::Managed)
    }

    /// `ret (*name) (params)` over the intermediate types.
    pub fn native_function_pointer(&self, name: &str) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| p.intermediate.format_name(Codespace::Native))
            .collect();
        format!("{} (*{name}) ({})", self.native_return(), params.join(", "))
    }

    /// `delegate * unmanaged<params, ret>` over the intermediate types.
    pub fn managed_function_pointer(&self) -> String {
        let mut types: Vec<String> = self
            .parameters
            .iter()
            .map(|p| p.intermediate.format_name(Codespace::Managed))
            .collect();
        types.push(self.managed_return());
        format!("delegate * unmanaged<{}>", types.join(", "))
    }
}
