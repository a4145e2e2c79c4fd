//! Data members of declared types.
//!
//! A property is declared on the side that does not implement the type: managed
//! wrappers of native types get a managed field, native counterparts of managed
//! types get a native one.

use interop_core::{Codespace, GenerationError, PropertyDescriptor, Visibility};

use super::{ComponentFlags, MemberComponent, MemberEmitter, unsupported, write_comments};
use crate::context::GenerationContext;
use crate::module::Module;
use crate::types::TypeRef;
use crate::writer::CodeWriter;

#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
    pub comments: String,
}

impl PropertyDefinition {
    pub fn from_descriptor(
        ctx: &mut GenerationContext,
        enclosing: &TypeRef,
        descriptor: &PropertyDescriptor,
    ) -> Result<Self, GenerationError> {
        let symbol = format!("{}.{}", enclosing.full_managed_name(), descriptor.name);
        let ty = ctx.resolver().resolve(&descriptor.ty, &symbol)?;
        if ty.is_void() {
            return Err(GenerationError::metadata(symbol, "property cannot be void"));
        }
        Ok(Self {
            name: descriptor.name.clone(),
            ty,
            visibility: descriptor.visibility,
            comments: descriptor.comments.clone(),
        })
    }
}

#[derive(Debug)]
pub struct PropertyEmitter {
    property: PropertyDefinition,
    destination: Codespace,
}

impl PropertyEmitter {
    /// A property declared in `destination`.
    pub fn new(property: PropertyDefinition, destination: Codespace) -> Self {
        Self {
            property,
            destination,
        }
    }
}

impl MemberEmitter for PropertyEmitter {
    fn name(&self) -> &str {
        &self.property.name
    }

    fn components(&self) -> ComponentFlags {
        match self.destination {
            Codespace::Managed => ComponentFlags::MANAGED_PART,
            Codespace::Native => ComponentFlags::NATIVE_CLASS_DECLARATION,
        }
    }

    fn visibility(&self) -> Visibility {
        self.property.visibility
    }

    fn write(
        &self,
        writer: &mut CodeWriter,
        component: MemberComponent,
        _module: &Module,
    ) -> Result<(), GenerationError> {
        if !self.components().has(component) {
            return Err(unsupported(&self.property.name, component));
        }
        let p = &self.property;
        write_comments(writer, &p.comments);
        match component.space() {
            Codespace::Managed => writer.write_line(&format!(
                "{} {} {};",
                p.visibility.managed(),
                p.ty.format_managed(),
                p.name
            )),
            // Native access is expressed with labels by the enclosing class.
            Codespace::Native => writer.write_line(&format!("{} {};", p.ty.format_native(), p.name)),
        }
        Ok(())
    }

    fn type_dependencies(&self, _space: Codespace) -> Vec<TypeRef> {
        self.property.ty.type_dependencies()
    }
}
