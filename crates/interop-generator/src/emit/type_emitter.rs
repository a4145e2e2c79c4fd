//! Emission of one declared type.
//!
//! What a type writes depends on who implements it. A natively implemented type
//! only needs a managed wrapper (`ManagedPart`); its native declaration already
//! exists. A type implemented in managed code needs a generated native class
//! (`NativeClassDeclaration`). Members add the components they contribute to, so
//! a natively implemented class with methods also writes native thunks.

use std::collections::BTreeSet;
use std::rc::Rc;

use interop_core::{Codespace, GenerationError, TypeImplementation, TypeKind, Visibility};

use super::{ComponentFlags, FILE_HEADER, MemberComponent, MemberEmitter, unsupported, write_comments};
use crate::module::Module;
use crate::types::TypeRef;
use crate::writer::CodeWriter;

/// A built declared type with the parts of its declaration the type model does not keep.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub ty: TypeRef,
    pub visibility: Visibility,
    pub comments: String,
    /// Enum is a bit set.
    pub is_flags: bool,
}

impl TypeDefinition {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            visibility: Visibility::Public,
            comments: String::new(),
            is_flags: false,
        }
    }

    pub fn implementation(&self) -> TypeImplementation {
        self.ty.implementation().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct TypeEmitter {
    definition: TypeDefinition,
    members: Vec<Box<dyn MemberEmitter>>,
    components: ComponentFlags,
}

impl TypeEmitter {
    pub fn new(definition: TypeDefinition) -> Self {
        let implementation = definition.implementation();
        let components = match (definition.ty.kind, implementation) {
            (TypeKind::Enum, TypeImplementation::Native) => {
                ComponentFlags::MANAGED_PART | ComponentFlags::NATIVE_CLASS_DECLARATION
            }
            (TypeKind::Enum, TypeImplementation::Managed) => ComponentFlags::MANAGED_PART,
            (_, TypeImplementation::Native) => ComponentFlags::MANAGED_PART,
            (_, TypeImplementation::Managed) => ComponentFlags::NATIVE_CLASS_DECLARATION,
        };
        Self {
            definition,
            members: Vec::new(),
            components,
        }
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    pub fn ty(&self) -> &TypeRef {
        &self.definition.ty
    }

    pub fn members(&self) -> &[Box<dyn MemberEmitter>] {
        &self.members
    }

    /// Own components plus every component a member contributes to.
    pub fn components(&self) -> ComponentFlags {
        self.components
    }

    pub fn add_member(&mut self, member: Box<dyn MemberEmitter>) {
        self.components |= member.components();
        self.members.push(member);
    }

    fn members_in(&self, component: MemberComponent) -> Vec<&dyn MemberEmitter> {
        self.members
            .iter()
            .filter(|m| m.components().has(component))
            .map(|m| m.as_ref())
            .collect()
    }

    /// File the component is written to, relative to its source directory.
    pub fn file_name(&self, component: MemberComponent) -> Option<String> {
        let ty = self.ty();
        match component {
            MemberComponent::NativeFunctionDeclaration => Some(format!("{}.functions.h", ty.native_name)),
            MemberComponent::NativeClassDeclaration => Some(self.header()),
            MemberComponent::NativeImplementation => Some(format!("{}.cpp", ty.native_name)),
            MemberComponent::ManagedPart => Some(format!("{}.cs", ty.managed_name)),
            MemberComponent::Custom => None,
        }
    }

    fn header(&self) -> String {
        let ty = self.ty();
        if ty.header.is_empty() {
            format!("{}.h", ty.native_name)
        } else {
            ty.header.clone()
        }
    }

    // ========================================================================
    // Dependencies
    // ========================================================================

    /// Types the code of this type names in `space`: member signatures, the parent
    /// and interfaces, and generic arguments.
    pub fn dependencies(&self, space: Codespace) -> Vec<TypeRef> {
        let ty = self.ty();
        let mut deps: Vec<TypeRef> = self
            .members
            .iter()
            .flat_map(|m| m.type_dependencies(space))
            .collect();
        for supertype in ty.parent.iter().chain(ty.interfaces.iter()) {
            deps.extend(supertype.type_dependencies());
        }
        for arg in &ty.generic_arguments {
            deps.extend(arg.type_dependencies());
        }
        deps
    }

    fn includes(&self, members: &[&dyn MemberEmitter]) -> BTreeSet<String> {
        let ty = self.ty();
        let own = self.header();
        let mut includes: BTreeSet<String> = self
            .dependencies(Codespace::Native)
            .iter()
            .filter(|dep| !Rc::ptr_eq(dep, ty) && !dep.header.is_empty())
            .map(|dep| dep.header.clone())
            .collect();
        includes.extend(members.iter().flat_map(|m| m.additional_headers()));
        includes.remove(&own);
        includes
    }

    fn usings(&self, members: &[&dyn MemberEmitter]) -> BTreeSet<String> {
        let own = &self.ty().namespace;
        let mut usings: BTreeSet<String> = self
            .dependencies(Codespace::Managed)
            .iter()
            .filter(|dep| !dep.namespace.is_global() && dep.namespace != *own)
            .map(|dep| dep.namespace.to_string())
            .collect();
        usings.extend(members.iter().flat_map(|m| m.additional_namespaces()));
        if self.definition.is_flags {
            usings.insert("System".to_string());
        }
        usings
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write a whole file for `component`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write(
        &self,
        writer: &mut CodeWriter,
        component: MemberComponent,
        module: &Module,
    ) -> Result<(), GenerationError> {
        if !self.components.has(component) {
            return Err(unsupported(&self.ty().full_managed_name(), component));
        }
        writer.write(FILE_HEADER);
        let members = self.members_in(component);
        let mut scope = writer.scope();
        match component {
            MemberComponent::NativeFunctionDeclaration => {
                self.write_native_function_declaration(&mut scope, &members, module)
            }
            MemberComponent::NativeClassDeclaration => {
                self.write_native_class_declaration(&mut scope, &members, module)
            }
            MemberComponent::NativeImplementation => {
                self.write_native_implementation(&mut scope, &members, module)
            }
            MemberComponent::ManagedPart => self.write_managed_part(&mut scope, &members, module),
            MemberComponent::Custom => Err(unsupported(&self.ty().full_managed_name(), component)),
        }
    }

    fn write_members(
        writer: &mut CodeWriter,
        members: &[&dyn MemberEmitter],
        component: MemberComponent,
        module: &Module,
    ) -> Result<(), GenerationError> {
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                writer.new_line();
            }
            member.write(writer, component, module)?;
        }
        Ok(())
    }

    fn write_supertypes(&self, writer: &mut CodeWriter, space: Codespace) {
        let ty = self.ty();
        let names: Vec<String> = ty
            .parent
            .iter()
            .chain(ty.interfaces.iter())
            .map(|t| match space {
                Codespace::Native => format!("public {}", t.native_name),
                Codespace::Managed => t.managed_name.clone(),
            })
            .collect();
        if !names.is_empty() {
            writer.write(&format!(" : {}", names.join(", ")));
        }
        writer.new_line();
    }

    fn write_native_function_declaration(
        &self,
        writer: &mut CodeWriter,
        members: &[&dyn MemberEmitter],
        module: &Module,
    ) -> Result<(), GenerationError> {
        let ty = self.ty();
        writer.write_line("#pragma once\n");
        let keyword = match ty.kind {
            TypeKind::Struct => "struct",
            _ => "class",
        };
        writer.write_line(&format!("{keyword} {};\n", ty.native_name));
        Self::write_members(writer, members, MemberComponent::NativeFunctionDeclaration, module)
    }

    fn write_native_class_declaration(
        &self,
        writer: &mut CodeWriter,
        members: &[&dyn MemberEmitter],
        module: &Module,
    ) -> Result<(), GenerationError> {
        let ty = self.ty();
        writer.write_line("#pragma once\n");

        let mut includes = self.includes(members);
        includes.insert("CoreMinimal.h".to_string());
        for include in &includes {
            writer.write_line(&format!("#include \"{include}\""));
        }
        if self.components.has(MemberComponent::NativeFunctionDeclaration) {
            writer.write_line(&format!("#include \"{}.functions.h\"", ty.native_name));
        }
        if ty.kind != TypeKind::Enum {
            writer.write_line(&format!("#include \"{}.generated.h\"", ty.native_name));
        }
        writer.new_line();

        write_comments(writer, &self.definition.comments);
        if ty.kind == TypeKind::Enum {
            writer.write_line(&format!("enum class {}", ty.native_name));
            let mut body = writer.block(";");
            for member in members {
                member.write(&mut body, MemberComponent::NativeClassDeclaration, module)?;
            }
            return Ok(());
        }

        let (keyword, mut current) = match ty.kind {
            TypeKind::Struct => ("struct", "public"),
            _ => ("class", "private"),
        };
        writer.write(&format!("{keyword} {} {}", module.api_macro, ty.native_name));
        self.write_supertypes(writer, Codespace::Native);

        let mut body = writer.block(";");
        body.write_line("GENERATED_BODY()");
        for member in members {
            body.new_line();
            let visibility = member.visibility().native();
            if visibility != current {
                current = visibility;
                let mut label = body.unindent();
                label.write_line(&format!("{visibility}:"));
            }
            member.write(&mut body, MemberComponent::NativeClassDeclaration, module)?;
        }
        Ok(())
    }

    fn write_native_implementation(
        &self,
        writer: &mut CodeWriter,
        members: &[&dyn MemberEmitter],
        module: &Module,
    ) -> Result<(), GenerationError> {
        writer.write_line(&format!("#include \"{}\"", self.header()));
        for include in self.includes(members) {
            writer.write_line(&format!("#include \"{include}\""));
        }
        writer.new_line();
        Self::write_members(writer, members, MemberComponent::NativeImplementation, module)
    }

    fn write_managed_part(
        &self,
        writer: &mut CodeWriter,
        members: &[&dyn MemberEmitter],
        module: &Module,
    ) -> Result<(), GenerationError> {
        let ty = self.ty();
        let definition = &self.definition;

        if ty.kind == TypeKind::Class {
            writer.write_line("#nullable disable\n");
        }
        let usings = self.usings(members);
        for using in &usings {
            writer.write_line(&format!("using {using};"));
        }
        if !usings.is_empty() {
            writer.new_line();
        }

        let mut scope = writer.scope();
        if !ty.namespace.is_global() {
            scope.write_line(&format!("namespace {}", ty.namespace));
            scope.open_block_detached("");
        }

        write_comments(&mut scope, &definition.comments);
        let visibility = definition.visibility.managed();
        match ty.kind {
            TypeKind::Enum => {
                if definition.is_flags {
                    scope.write_line("[Flags]");
                }
                scope.write_line(&format!("{visibility} enum {}", ty.managed_name));
                let mut body = scope.block("");
                for member in members {
                    member.write(&mut body, MemberComponent::ManagedPart, module)?;
                }
                return Ok(());
            }
            TypeKind::Struct => scope.write_line(&format!("{visibility} struct {}", ty.managed_name)),
            TypeKind::Class | TypeKind::Interface => {
                scope.write(&format!(
                    "{visibility} partial {} {}",
                    ty.kind.managed_keyword(),
                    ty.managed_name
                ));
                self.write_supertypes(&mut scope, Codespace::Managed);
            }
        }

        let mut body = scope.block("");
        Self::write_members(&mut body, members, MemberComponent::ManagedPart, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{EnumValueEmitter, PropertyDefinition, PropertyEmitter};
    use crate::function::test_support::*;
    use crate::function::{FunctionBinding, function_binder};
    use crate::types::{TypeInfo, TypeOrigin};
    use interop_core::{EnumValueDescriptor, Namespace, TransferDirection, TransferMode};
    use pretty_assertions::assert_eq;

    fn module() -> Module {
        Module::new("Game", Namespace::parse("Game"))
    }

    fn render(emitter: &TypeEmitter, component: MemberComponent) -> String {
        let mut writer = match component.space() {
            Codespace::Native => CodeWriter::native(),
            Codespace::Managed => CodeWriter::managed(),
        };
        emitter.write(&mut writer, component, &module()).unwrap();
        let text = writer.into_string();
        text.strip_prefix(FILE_HEADER).unwrap().to_string()
    }

    fn health(visibility: Visibility, destination: Codespace) -> Box<dyn MemberEmitter> {
        Box::new(PropertyEmitter::new(
            PropertyDefinition {
                name: "Health".into(),
                ty: int(),
                visibility,
                comments: String::new(),
            },
            destination,
        ))
    }

    fn mode(implementation: TypeImplementation) -> TypeEmitter {
        let ty = TypeInfo::new("Mode", "EMode", TypeKind::Enum, TypeOrigin::Declared(implementation))
            .with_namespace(Namespace::parse("Game"))
            .into_ref();
        let mut definition = TypeDefinition::new(ty);
        definition.is_flags = true;
        let mut emitter = TypeEmitter::new(definition);
        let components = emitter.components();
        for (name, value) in [("A", 1), ("B", 2)] {
            emitter.add_member(Box::new(EnumValueEmitter::new(
                &EnumValueDescriptor {
                    name: name.into(),
                    value,
                },
                components,
            )));
        }
        emitter
    }

    /// `Derived : Base`, natively implemented, with a method and a property.
    fn derived() -> TypeEmitter {
        let base = TypeInfo::new("Base", "NBase", TypeKind::Class, TypeOrigin::Declared(TypeImplementation::Native))
            .with_namespace(Namespace::parse("Game"))
            .with_transfer(TransferMode::ByPointer)
            .with_header("Base.h")
            .into_ref();
        let mut ty = TypeInfo::new(
            "Derived",
            "NDerived",
            TypeKind::Class,
            TypeOrigin::Declared(TypeImplementation::Native),
        )
        .with_namespace(Namespace::parse("Game"))
        .with_transfer(TransferMode::ByPointer)
        .with_header("Derived.h")
        .with_marshaller(Some(crate::marshalling::registry::object_marshaller(
            TypeImplementation::Native,
        )));
        ty.parent = Some(base);
        let ty = ty.into_ref();

        let mut emitter = TypeEmitter::new(TypeDefinition::new(Rc::clone(&ty)));
        let compute = function(&ty, "Compute", int(), vec![param("x", int(), TransferDirection::ByValue)]);
        emitter.add_member(function_binder(FunctionBinding::new(compute).unwrap()));
        emitter.add_member(health(Visibility::Public, Codespace::Managed));
        emitter
    }

    // ========================================================================
    // Components
    // ========================================================================

    #[test]
    fn components_follow_implementation() {
        assert_eq!(
            derived().components(),
            ComponentFlags::MANAGED_PART | ComponentFlags::NATIVE_IMPLEMENTATION
        );
        assert_eq!(
            mode(TypeImplementation::Native).components(),
            ComponentFlags::MANAGED_PART | ComponentFlags::NATIVE_CLASS_DECLARATION
        );
        assert_eq!(mode(TypeImplementation::Managed).components(), ComponentFlags::MANAGED_PART);

        let actor = TypeEmitter::new(TypeDefinition::new(class("Actor", "AActor", TypeImplementation::Managed)));
        assert_eq!(actor.components(), ComponentFlags::NATIVE_CLASS_DECLARATION);
    }

    #[test]
    fn file_names() {
        let emitter = derived();
        assert_eq!(emitter.file_name(MemberComponent::ManagedPart).unwrap(), "Derived.cs");
        assert_eq!(emitter.file_name(MemberComponent::NativeImplementation).unwrap(), "NDerived.cpp");
        assert_eq!(emitter.file_name(MemberComponent::NativeClassDeclaration).unwrap(), "Derived.h");
        assert_eq!(
            emitter.file_name(MemberComponent::NativeFunctionDeclaration).unwrap(),
            "NDerived.functions.h"
        );
        assert!(emitter.file_name(MemberComponent::Custom).is_none());
    }

    #[test]
    fn unsupported_component_is_an_error() {
        let emitter = derived();
        let mut writer = CodeWriter::native();
        let err = emitter
            .write(&mut writer, MemberComponent::NativeClassDeclaration, &module())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Metadata { .. }));
    }

    // ========================================================================
    // Enums
    // ========================================================================

    #[test]
    fn managed_enum() {
        let expected = "\
using System;

namespace Game
{
    [Flags]
    public enum Mode
    {
        A = 1,
        B = 2,
    }
}
";
        assert_eq!(render(&mode(TypeImplementation::Native), MemberComponent::ManagedPart), expected);
    }

    #[test]
    fn native_enum() {
        let expected = "\
#pragma once

#include \"CoreMinimal.h\"

enum class EMode
{
\tA = 1,
\tB = 2,
};
";
        assert_eq!(
            render(&mode(TypeImplementation::Native), MemberComponent::NativeClassDeclaration),
            expected
        );
    }

    // ========================================================================
    // Classes
    // ========================================================================

    #[test]
    fn managed_wrapper_of_native_class() {
        let code = render(&derived(), MemberComponent::ManagedPart);
        assert!(code.starts_with("#nullable disable\n\nusing System;\nusing Unreal.Core;\n\nnamespace Game\n{\n"));
        assert!(code.contains("    public partial class Derived : Base\n    {\n"));
        assert!(code.contains("        public unsafe int Compute(int x)\n"));
        assert!(code.contains("        }\n\n        public int Health;\n    }\n}\n"));
    }

    #[test]
    fn native_thunks_of_native_class() {
        let code = render(&derived(), MemberComponent::NativeImplementation);
        assert!(code.starts_with("#include \"Derived.h\"\n#include \"Base.h\"\n#include \"DotNet.h\"\n\n"));
        assert!(code.contains("extern \"C\" GAME_API int32 Game__NDerived__Compute_1_Vint("));
    }

    #[test]
    fn native_class_for_managed_type() {
        let actor = class("Actor", "AActor", TypeImplementation::Managed);
        let mut emitter = TypeEmitter::new(TypeDefinition::new(Rc::clone(&actor)));
        let tick = function(&actor, "Tick", void(), vec![]);
        emitter.add_member(function_binder(FunctionBinding::new(tick).unwrap()));
        emitter.add_member(health(Visibility::Protected, Codespace::Native));

        let expected = "\
#pragma once

#include \"CoreMinimal.h\"
#include \"DotNet.h\"
#include \"AActor.functions.h\"
#include \"AActor.generated.h\"

class GAME_API AActor
{
\tGENERATED_BODY()

public:
\tvoid Tick()
\t{
\t\tAActor* __self = this;
\t\tAActor* __self__marshalled = __self;
\t\tGame__AActor__Tick_0_(__self__marshalled);
\t}

protected:
\tint32 Health;
};
";
        assert_eq!(render(&emitter, MemberComponent::NativeClassDeclaration), expected);

        let declarations = render(&emitter, MemberComponent::NativeFunctionDeclaration);
        assert!(declarations.starts_with("#pragma once\n\nclass AActor;\n\nextern \"C\" GAME_MANAGED_EXPORT void Game__AActor__Tick_0_("));
    }

    #[test]
    fn dependencies_include_parent_and_signatures() {
        let emitter = derived();
        let deps = emitter.dependencies(Codespace::Native);
        assert!(deps.iter().any(|d| d.native_name == "NBase"));
        assert!(deps.iter().any(|d| d.native_name == "int32"));
    }
}
