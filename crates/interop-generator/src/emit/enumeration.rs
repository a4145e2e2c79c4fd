//! Enumerators.

use interop_core::{Codespace, EnumValueDescriptor, GenerationError, Visibility};

use super::{ComponentFlags, MemberComponent, MemberEmitter, unsupported};
use crate::module::Module;
use crate::types::TypeRef;
use crate::writer::CodeWriter;

/// `Name = value,` in every component the enum is declared in.
#[derive(Debug, Clone)]
pub struct EnumValueEmitter {
    name: String,
    value: i64,
    components: ComponentFlags,
}

impl EnumValueEmitter {
    pub fn new(descriptor: &EnumValueDescriptor, components: ComponentFlags) -> Self {
        Self {
            name: descriptor.name.clone(),
            value: descriptor.value,
            components,
        }
    }
}

impl MemberEmitter for EnumValueEmitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn components(&self) -> ComponentFlags {
        self.components
    }

    fn visibility(&self) -> Visibility {
        Visibility::Public
    }

    fn write(
        &self,
        writer: &mut CodeWriter,
        component: MemberComponent,
        _module: &Module,
    ) -> Result<(), GenerationError> {
        if !self.components.has(component) {
            return Err(unsupported(&self.name, component));
        }
        writer.write_line(&format!("{} = {},", self.name, self.value));
        Ok(())
    }

    fn type_dependencies(&self, _space: Codespace) -> Vec<TypeRef> {
        Vec::new()
    }
}
