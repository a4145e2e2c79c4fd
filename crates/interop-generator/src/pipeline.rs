//! The generation driver.
//!
//! A [`Generator`] owns the [`GenerationContext`] of one run and turns a
//! [`FeedDescriptor`] into generated files in these phases:
//!
//! 1. register modules and mappings
//! 2. announce every declared type, then order them so supertypes come first
//! 3. build and declare each type
//! 4. resolve members into member emitters
//! 5. collect module registrations and tickets
//! 6. write every component of every type, then the module files
//!
//! Declarations that fail to resolve are skipped and their errors collected.
//! Configuration errors and aborted cycles end the run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use interop_core::{
    Codespace, ConfigurationError, ErrorCollector, FeedDescriptor, GenerationError,
    TransferMode, TypeDescriptor, TypeImplementation, TypeKind,
};

use crate::context::{GenerationContext, GeneratorOptions};
use crate::emit::{
    EnumValueEmitter, ModuleEmitter, PropertyDefinition, PropertyEmitter,
    Registration, TypeDefinition, TypeEmitter,
};
use crate::function::{FunctionBinding, FunctionDefinition, function_binder};
use crate::marshalling::{build_marshaller, registry::object_marshaller};
use crate::sort::{CyclePolicy, SortError, topological_sort};
use crate::types::{TypeInfo, TypeOrigin, TypeRef};
use crate::writer::CodeWriter;

/// A generated file, relative to the output root of its codespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub space: Codespace,
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub types: usize,
    pub functions: usize,
    pub properties: usize,
    pub files: usize,
    /// Declarations skipped because of an error.
    pub skipped: usize,
}

/// Everything a successful run produced, including its non-fatal errors.
#[derive(Debug)]
pub struct GenerationOutput {
    pub files: Vec<GeneratedFile>,
    pub errors: Vec<GenerationError>,
    /// Registrations of every module, each module in registration order.
    pub registrations: Vec<Registration>,
    pub stats: GenerationStats,
}

impl GenerationOutput {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == PathBuf::from(path))
    }
}

pub struct Generator {
    ctx: GenerationContext,
    errors: ErrorCollector,
    stats: GenerationStats,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            ctx: GenerationContext::new(options),
            errors: ErrorCollector::new(),
            stats: GenerationStats::default(),
        }
    }

    pub fn context(&self) -> &GenerationContext {
        &self.ctx
    }

    /// Run every phase over `feed`.
    ///
    /// Returns `Err` only for fatal errors. The error then aggregates everything
    /// collected up to that point.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, feed: &FeedDescriptor) -> Result<GenerationOutput, GenerationError> {
        info!(
            modules = feed.modules.len(),
            mappings = feed.mappings.len(),
            types = feed.types.len(),
            "starting generation"
        );

        self.register_modules(feed)?;
        self.register_mappings(feed)?;

        for desc in &feed.types {
            self.ctx
                .announce(&desc.managed_name, &desc.full_managed_name(), &desc.native_name);
        }
        let ordered = self.order_types(feed)?;
        debug!(count = ordered.len(), "declared types ordered");

        let mut emitters = Vec::with_capacity(ordered.len());
        for desc in &ordered {
            let built = self.build_type(desc);
            if let Some(ty) = self.errors.check(built)? {
                self.ctx.declare(&ty);
                emitters.push((*desc, ty));
            } else {
                self.stats.skipped += 1;
            }
        }
        self.stats.types = emitters.len();

        let mut type_emitters = Vec::with_capacity(emitters.len());
        for (desc, ty) in emitters {
            type_emitters.push(self.build_members(desc, ty)?);
        }
        debug!(types = type_emitters.len(), functions = self.stats.functions, "members resolved");

        let modules = self.collect_modules(feed, &type_emitters);

        let mut files = Vec::new();
        for emitter in &type_emitters {
            self.write_type(emitter, &modules, &mut files)?;
        }
        let mut registrations = Vec::new();
        for module in modules.values() {
            write_module(module, self.ctx.options(), &mut files);
            registrations.extend_from_slice(module.registrations());
        }

        self.stats.files = files.len();
        let errors = self.errors.into_errors();
        info!(
            types = self.stats.types,
            functions = self.stats.functions,
            properties = self.stats.properties,
            files = self.stats.files,
            skipped = self.stats.skipped,
            errors = errors.len(),
            "generation finished"
        );

        Ok(GenerationOutput {
            files,
            errors,
            registrations,
            stats: self.stats,
        })
    }

    // ========================================================================
    // Registration
    // ========================================================================

    fn register_modules(&mut self, feed: &FeedDescriptor) -> Result<(), GenerationError> {
        for module in &feed.modules {
            if module.name.trim().is_empty() {
                self.errors.add(
                    ConfigurationError::Invalid {
                        message: "module without a name".into(),
                    }
                    .into(),
                )?;
                continue;
            }
            self.ctx.module_entry(&module.name, &module.namespace);
        }
        Ok(())
    }

    fn register_mappings(&mut self, feed: &FeedDescriptor) -> Result<(), GenerationError> {
        for mapping in &feed.mappings {
            if let Err(err) = self.ctx.register_mapping(mapping.clone()) {
                self.errors.add(err.into())?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Order declared types so that every type follows its parent and interfaces.
    fn order_types<'f>(&mut self, feed: &'f FeedDescriptor) -> Result<Vec<&'f TypeDescriptor>, GenerationError> {
        // supertypes may be named by qualified, native or unambiguous short name
        let mut aliases: FxHashMap<&str, String> = FxHashMap::default();
        let full_names: Vec<String> = feed.types.iter().map(TypeDescriptor::full_managed_name).collect();
        for (desc, full) in feed.types.iter().zip(&full_names) {
            if self.ctx.ambiguous(&desc.managed_name).is_none() {
                aliases.entry(desc.managed_name.as_str()).or_insert_with(|| full.clone());
            }
        }
        for (desc, full) in feed.types.iter().zip(&full_names) {
            aliases.insert(desc.native_name.as_str(), full.clone());
            aliases.insert(full.as_str(), full.clone());
        }

        let policy = self.ctx.options().on_cycle;
        let sorted = topological_sort(
            feed.types.iter().collect(),
            |desc: &&TypeDescriptor| desc.full_managed_name(),
            |desc| usize::from(desc.parent.is_some()) + desc.interfaces.len(),
            |desc, i| {
                let link = match (&desc.parent, i) {
                    (Some(parent), 0) => parent,
                    (Some(_), i) => desc.interfaces.get(i - 1)?,
                    (None, i) => desc.interfaces.get(i)?,
                };
                aliases.get(link.name.as_str()).cloned()
            },
            |participants| {
                if policy == CyclePolicy::Continue {
                    warn!(?participants, "inheritance cycle ignored");
                }
                policy
            },
        );

        match sorted {
            Ok(sorted) => Ok(sorted),
            Err(SortError::Cycle { participants }) => {
                self.errors.add(GenerationError::Cycle { participants })?;
                Ok(Vec::new())
            }
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn build_type(&mut self, desc: &TypeDescriptor) -> Result<TypeRef, GenerationError> {
        let symbol = desc.full_managed_name();
        let location = desc.location.as_ref();
        if desc.module.is_empty() {
            return Err(GenerationError::metadata(symbol, "type does not name a module"));
        }

        let parent = match &desc.parent {
            Some(raw) => Some(self.ctx.resolver().resolve_at(raw, &symbol, location)?),
            None => None,
        };
        if let Some(parent) = &parent {
            if parent.kind.is_value_type() != desc.kind.is_value_type() {
                return Err(GenerationError::metadata(
                    &symbol,
                    format!("cannot derive a {:?} from {}", desc.kind, parent.full_managed_name()),
                ));
            }
        }

        let mut interfaces = Vec::with_capacity(desc.interfaces.len());
        for raw in &desc.interfaces {
            let interface = self.ctx.resolver().resolve_at(raw, &symbol, location)?;
            if interface.kind != TypeKind::Interface {
                return Err(GenerationError::metadata(
                    &symbol,
                    format!("'{}' is not an interface", interface.full_managed_name()),
                ));
            }
            interfaces.push(interface);
        }

        let is_reference = matches!(desc.kind, TypeKind::Class | TypeKind::Interface);
        let marshaller = match &desc.marshaller {
            Some(m) => Some(build_marshaller(&symbol, m, |r| {
                self.ctx.resolver().resolve_at(r, &symbol, location)
            })?),
            None if is_reference => Some(object_marshaller(desc.implementation)),
            None => None,
        };
        let header = if desc.header.is_empty() {
            format!("{}.h", desc.native_name)
        } else {
            desc.header.clone()
        };

        let mut ty = TypeInfo::new(
            &desc.managed_name,
            &desc.native_name,
            desc.kind,
            TypeOrigin::Declared(desc.implementation),
        )
        .with_namespace(desc.namespace.clone())
        .with_transfer(if is_reference { TransferMode::ByPointer } else { TransferMode::ByValue })
        .with_header(header)
        .with_marshaller(marshaller);
        ty.module = desc.module.clone();
        ty.native_module = desc.native_module.clone();
        ty.parent = parent;
        ty.interfaces = interfaces;

        self.ctx.module_entry(&desc.module, &desc.namespace);
        debug!(ty = %symbol, "declared");
        Ok(ty.into_ref())
    }

    /// Resolve the members of a built type. A member that fails is skipped.
    fn build_members(&mut self, desc: &TypeDescriptor, ty: TypeRef) -> Result<TypeEmitter, GenerationError> {
        let definition = TypeDefinition {
            visibility: desc.visibility,
            comments: desc.comments.clone(),
            is_flags: desc.flags,
            ..TypeDefinition::new(ty.clone())
        };
        let mut emitter = TypeEmitter::new(definition);

        if desc.kind == TypeKind::Enum {
            let components = emitter.components();
            for value in &desc.enum_values {
                emitter.add_member(Box::new(EnumValueEmitter::new(value, components)));
            }
            return Ok(emitter);
        }

        let destination = match desc.implementation {
            TypeImplementation::Native => Codespace::Managed,
            TypeImplementation::Managed => Codespace::Native,
        };
        for property in &desc.properties {
            let built = PropertyDefinition::from_descriptor(&mut self.ctx, &ty, property);
            match self.errors.check(built)? {
                Some(property) => {
                    emitter.add_member(Box::new(PropertyEmitter::new(property, destination)));
                    self.stats.properties += 1;
                }
                None => self.stats.skipped += 1,
            }
        }

        for function in &desc.functions {
            let built = FunctionDefinition::from_descriptor(&mut self.ctx, &ty, function)
                .and_then(FunctionBinding::new)
                .map(function_binder);
            match self.errors.check(built)? {
                Some(binder) => {
                    emitter.add_member(binder);
                    self.stats.functions += 1;
                }
                None => self.stats.skipped += 1,
            }
        }
        Ok(emitter)
    }

    // ========================================================================
    // Modules
    // ========================================================================

    fn collect_modules(
        &self,
        feed: &FeedDescriptor,
        emitters: &[TypeEmitter],
    ) -> BTreeMap<String, ModuleEmitter> {
        let mut modules: BTreeMap<String, ModuleEmitter> = self
            .ctx
            .modules()
            .map(|m| (m.name.clone(), ModuleEmitter::new(m.clone())))
            .collect();

        for emitter in emitters {
            if let Some(module) = modules.get_mut(&emitter.ty().module) {
                module.add_type(emitter);
            }
        }
        for mapping in &feed.mappings {
            if let Some(module) = modules.get_mut(&mapping.module) {
                module.add_mapping(mapping.namespace.qualify(&mapping.managed_name));
            }
        }
        for module in modules.values_mut() {
            let ticket = module.finish();
            debug!(module = %module.module().name, ticket, "module ticket");
        }
        modules
    }

    // ========================================================================
    // Files
    // ========================================================================

    fn write_type(
        &mut self,
        emitter: &TypeEmitter,
        modules: &BTreeMap<String, ModuleEmitter>,
        files: &mut Vec<GeneratedFile>,
    ) -> Result<(), GenerationError> {
        let Some(module) = modules.get(&emitter.ty().module).map(ModuleEmitter::module) else {
            return Ok(());
        };

        for component in emitter.components().components() {
            let Some(file_name) = emitter.file_name(component) else {
                continue;
            };
            let mut writer = writer_for(component.space(), self.ctx.options());
            let written = emitter.write(&mut writer, component, module);
            if self.errors.check(written)?.is_none() {
                continue;
            }

            let dir = PathBuf::from(&module.id);
            let path = match component.space() {
                Codespace::Managed => dir.join(file_name),
                Codespace::Native if component.is_public() => dir.join("Public").join(file_name),
                Codespace::Native => dir.join("Private").join(file_name),
            };
            files.push(GeneratedFile {
                space: component.space(),
                path,
                contents: writer.into_string(),
            });
        }
        Ok(())
    }
}

fn writer_for(space: Codespace, options: &GeneratorOptions) -> CodeWriter {
    match space {
        Codespace::Native => CodeWriter::new(options.native_indent.as_str()),
        Codespace::Managed => CodeWriter::new(options.managed_indent.as_str()),
    }
}

fn write_module(module: &ModuleEmitter, options: &GeneratorOptions, files: &mut Vec<GeneratedFile>) {
    let id = &module.module().id;
    let dir = PathBuf::from(id);

    let mut writer = writer_for(Codespace::Native, options);
    module.write_native_header(&mut writer);
    files.push(GeneratedFile {
        space: Codespace::Native,
        path: dir.join("Public").join(format!("{id}.h")),
        contents: writer.into_string(),
    });

    let mut writer = writer_for(Codespace::Native, options);
    module.write_native_source(&mut writer);
    files.push(GeneratedFile {
        space: Codespace::Native,
        path: dir.join("Private").join(format!("{id}.cpp")),
        contents: writer.into_string(),
    });

    let mut writer = writer_for(Codespace::Native, options);
    module.write_build_rules(&mut writer);
    files.push(GeneratedFile {
        space: Codespace::Native,
        path: dir.join(format!("{id}.Build.cs")),
        contents: writer.into_string(),
    });

    let mut writer = writer_for(Codespace::Managed, options);
    module.write_managed_helper(&mut writer);
    files.push(GeneratedFile {
        space: Codespace::Managed,
        path: dir.join(format!("{id}.Module.cs")),
        contents: writer.into_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(json: &str) -> FeedDescriptor {
        serde_json::from_str(json).unwrap()
    }

    const BASE_DERIVED: &str = r#"{
        "modules": [{ "name": "Game", "namespace": "Game" }],
        "types": [
            { "managed_name": "Derived", "native_name": "NDerived", "namespace": "Game",
              "module": "Game", "native_module": "Game", "kind": "class", "parent": "Base",
              "properties": [{ "name": "Health", "type": "int" }],
              "functions": [{ "name": "Compute", "return": "int",
                              "parameters": [{ "name": "x", "type": "int" }] }] },
            { "managed_name": "Base", "native_name": "NBase", "namespace": "Game",
              "module": "Game", "native_module": "Game", "kind": "class" }
        ]
    }"#;

    fn paths(output: &GenerationOutput) -> Vec<String> {
        output
            .files
            .iter()
            .map(|f| f.path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    // ========================================================================
    // Whole runs
    // ========================================================================

    #[test]
    fn base_and_derived() {
        let output = Generator::new(GeneratorOptions::default())
            .run(&feed(BASE_DERIVED))
            .unwrap();

        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(
            paths(&output),
            [
                "Game/Base.cs",
                "Game/Derived.cs",
                "Game/Private/NDerived.cpp",
                "Game/Public/Game.h",
                "Game/Private/Game.cpp",
                "Game/Game.Build.cs",
                "Game/Game.Module.cs",
            ]
        );
        assert_eq!(
            output.stats,
            GenerationStats {
                types: 2,
                functions: 1,
                properties: 1,
                files: 7,
                skipped: 0,
            }
        );

        let names: Vec<_> = output.registrations.iter().map(|r| r.native_name.as_str()).collect();
        assert_eq!(names, ["NBase", "NDerived"]);

        let wrapper = &output.file("Game/Derived.cs").unwrap().contents;
        assert!(wrapper.contains("public partial class Derived : Base"));
        assert!(wrapper.contains("public int Health;"));
        assert!(wrapper.contains("Game__NDerived__Compute_1_Vint"));

        let thunk = &output.file("Game/Private/NDerived.cpp").unwrap().contents;
        assert!(thunk.contains("Game__NDerived__Compute_1_Vint"));
    }

    #[test]
    fn output_is_deterministic() {
        let a = Generator::new(GeneratorOptions::default()).run(&feed(BASE_DERIVED)).unwrap();
        let b = Generator::new(GeneratorOptions::default()).run(&feed(BASE_DERIVED)).unwrap();
        assert_eq!(a.files, b.files);
    }

    #[test]
    fn managed_class_gets_native_declaration() {
        let output = Generator::new(GeneratorOptions::default())
            .run(&feed(
                r#"{
                "modules": [{ "name": "Game", "namespace": "Game" }],
                "types": [{ "managed_name": "Pawn", "native_name": "APawn", "namespace": "Game",
                            "module": "Game", "kind": "class", "implementation": "managed",
                            "functions": [{ "name": "Tick" }] }]
            }"#,
            ))
            .unwrap();

        assert_eq!(
            paths(&output)[..4],
            [
                "Game/Pawn.cs",
                "Game/Public/APawn.functions.h",
                "Game/Public/APawn.h",
                "Game/Private/APawn.cpp",
            ]
        );
        assert_eq!(output.registrations[0].implementation, TypeImplementation::Managed);
    }

    // ========================================================================
    // Errors
    // ========================================================================

    #[test]
    fn unresolved_member_skips_only_the_member() {
        let options = GeneratorOptions {
            opaque_fallback: false,
            ..GeneratorOptions::default()
        };
        let output = Generator::new(options)
            .run(&feed(
                r#"{
                "modules": [{ "name": "Game", "namespace": "Game" }],
                "types": [{ "managed_name": "Base", "native_name": "NBase", "namespace": "Game",
                            "module": "Game", "kind": "class",
                            "functions": [{ "name": "Take",
                                            "parameters": [{ "name": "t", "type": "FMissing" }] },
                                          { "name": "Keep" }] }]
            }"#,
            ))
            .unwrap();

        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].code(), "IB0102");
        assert_eq!(output.stats.functions, 1);
        assert_eq!(output.stats.skipped, 1);
        assert!(output.file("Game/Base.cs").is_some());
    }

    #[test]
    fn unresolved_parent_skips_the_type() {
        let output = Generator::new(GeneratorOptions::default())
            .run(&feed(
                r#"{
                "types": [
                    { "managed_name": "A", "native_name": "NA", "module": "Game", "kind": "class",
                      "parent": "B" },
                    { "managed_name": "B", "native_name": "NB", "module": "Game", "kind": "class",
                      "interfaces": ["NotAnInterface"] }
                ]
            }"#,
            ))
            .unwrap();

        // B fails its interface check, which leaves A's parent pending
        assert_eq!(output.errors.len(), 2);
        assert_eq!(output.stats.types, 0);
        assert_eq!(output.stats.skipped, 2);
    }

    #[test]
    fn same_short_name_in_two_namespaces() {
        let output = Generator::new(GeneratorOptions::default())
            .run(&feed(
                r#"{
                "types": [
                    { "managed_name": "Holder", "native_name": "NHolder", "namespace": "Game",
                      "module": "Game", "kind": "class", "parent": "Other.Vector" },
                    { "managed_name": "Stray", "native_name": "NStray", "namespace": "Game",
                      "module": "Game", "kind": "class", "parent": "Vector" },
                    { "managed_name": "Vector", "native_name": "NGameVector", "namespace": "Game",
                      "module": "Game", "kind": "class" },
                    { "managed_name": "Vector", "native_name": "NOtherVector", "namespace": "Other",
                      "module": "Other", "kind": "class" }
                ]
            }"#,
            ))
            .unwrap();

        let paths = paths(&output);
        let other = paths.iter().position(|p| p == "Other/Vector.cs").unwrap();
        let holder = paths.iter().position(|p| p == "Game/Holder.cs").unwrap();
        assert!(other < holder);
        assert!(paths.iter().any(|p| p == "Game/Vector.cs"));
        assert!(output.file("Game/Stray.cs").is_none());

        assert_eq!(output.errors.len(), 1);
        assert!(matches!(
            &output.errors[0],
            GenerationError::Metadata { symbol, message }
                if symbol == "Game.Stray" && message.contains("Game.Vector, Other.Vector")
        ));
        assert_eq!(output.stats.types, 3);
    }

    #[test]
    fn cycle_aborts_by_default() {
        let json = r#"{
            "types": [
                { "managed_name": "A", "native_name": "NA", "module": "Game", "kind": "class", "parent": "B" },
                { "managed_name": "B", "native_name": "NB", "module": "Game", "kind": "class", "parent": "A" }
            ]
        }"#;
        let err = Generator::new(GeneratorOptions::default()).run(&feed(json)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(&err.into_leaves()[..], [GenerationError::Cycle { .. }]));

        let options = GeneratorOptions {
            on_cycle: CyclePolicy::Continue,
            ..GeneratorOptions::default()
        };
        let output = Generator::new(options).run(&feed(json)).unwrap();
        assert_eq!(output.stats.types, 0);
        assert!(output.errors.iter().all(|e| e.code() == "IB0102"));
    }

    #[test]
    fn conflicting_mapping_is_fatal() {
        let err = Generator::new(GeneratorOptions::default())
            .run(&feed(
                r#"{
                "mappings": [
                    { "managed_name": "Vector", "native_name": "FVector" },
                    { "managed_name": "Vector3", "native_name": "FVector" }
                ]
            }"#,
            ))
            .unwrap_err();
        assert_eq!(err.code(), "IB0106");
        assert!(err.is_fatal());
    }
}
