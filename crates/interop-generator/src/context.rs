//! Per-run generation state.
//!
//! [`GenerationContext`] owns every cache of a run: the resolver memo, declared
//! and mapped types, generic instances, the name mangler and the module table. It
//! is created by the pipeline and dropped with it, so nothing survives between runs.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use interop_core::{ConfigurationError, MappingDescriptor, Namespace, TypeHash, TypeKind, TransferMode};

use crate::mangle::NameMangler;
use crate::marshalling::custom::validate_formats;
use crate::module::Module;
use crate::resolver::TypeResolver;
use crate::sort::CyclePolicy;
use crate::types::{TypeRef, primitives};
use crate::writer::{MANAGED_INDENT, NATIVE_INDENT};

/// Options that shape a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Resolve unknown names to opaque native types instead of failing.
    pub opaque_fallback: bool,
    pub on_cycle: CyclePolicy,
    pub native_indent: String,
    pub managed_indent: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            opaque_fallback: true,
            on_cycle: CyclePolicy::Abort,
            native_indent: NATIVE_INDENT.to_string(),
            managed_indent: MANAGED_INDENT.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct GenerationContext {
    options: GeneratorOptions,
    /// Raw reference text to resolved type.
    pub(crate) memo: FxHashMap<String, TypeRef>,
    /// Declared types by qualified managed name, native name and unambiguous
    /// managed name.
    pub(crate) declared: FxHashMap<String, TypeRef>,
    /// Declared names whose type has not been built yet.
    pub(crate) pending: FxHashSet<String>,
    /// Qualified names of the declared types announced under each short name.
    short_names: FxHashMap<String, BTreeSet<String>>,
    /// Mappings by native name and by managed name.
    pub(crate) mappings: FxHashMap<String, Rc<MappingDescriptor>>,
    /// Concrete mapped types, generic or not, by identity.
    pub(crate) instances: FxHashMap<TypeHash, TypeRef>,
    pub(crate) primitives: FxHashMap<&'static str, TypeRef>,
    native_index: FxHashMap<String, TypeRef>,
    managed_index: FxHashMap<String, TypeRef>,
    mangler: NameMangler,
    modules: BTreeMap<String, Module>,
}

impl GenerationContext {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            memo: FxHashMap::default(),
            declared: FxHashMap::default(),
            pending: FxHashSet::default(),
            short_names: FxHashMap::default(),
            mappings: FxHashMap::default(),
            instances: FxHashMap::default(),
            primitives: FxHashMap::default(),
            native_index: FxHashMap::default(),
            managed_index: FxHashMap::default(),
            mangler: NameMangler::new(),
            modules: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn resolver(&mut self) -> TypeResolver<'_> {
        TypeResolver::new(self)
    }

    // ========================================================================
    // Mappings
    // ========================================================================

    /// Add an explicit mapping.
    ///
    /// Registering an identical mapping twice is allowed. A different mapping for a
    /// native or managed name that is already taken is a conflict.
    pub fn register_mapping(&mut self, mapping: MappingDescriptor) -> Result<(), ConfigurationError> {
        validate_mapping(&mapping)?;

        for key in [&mapping.native_name, &mapping.managed_name] {
            if let Some(existing) = self.mappings.get(key) {
                if **existing == mapping {
                    return Ok(());
                }
                return Err(ConfigurationError::ConflictingMapping {
                    native_name: mapping.native_name.clone(),
                    existing: existing.managed_name.clone(),
                    new: mapping.managed_name.clone(),
                });
            }
        }

        let mapping = Rc::new(mapping);
        self.mappings
            .insert(mapping.native_name.clone(), Rc::clone(&mapping));
        self.mappings.insert(mapping.managed_name.clone(), mapping);
        Ok(())
    }

    pub fn mapping(&self, name: &str) -> Option<&MappingDescriptor> {
        self.mappings.get(name).map(|m| m.as_ref())
    }

    // ========================================================================
    // Declared types
    // ========================================================================

    /// Reserve the names of a declared type that will be built later.
    pub fn announce(&mut self, managed_name: &str, full_name: &str, native_name: &str) {
        self.short_names
            .entry(managed_name.to_string())
            .or_default()
            .insert(full_name.to_string());
        for name in [managed_name, full_name, native_name] {
            self.pending.insert(name.to_string());
        }
    }

    /// The qualified names sharing the short name `name`, when it names more than
    /// one declared type and none of them is qualified as just `name`.
    pub fn ambiguous(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.short_names
            .get(name)
            .filter(|owners| owners.len() > 1 && !owners.contains(name))
    }

    /// Make a built declared type resolvable.
    ///
    /// A short name shared with another declared type is neither declared nor
    /// cleared here; only the qualified and native names are.
    pub fn declare(&mut self, ty: &TypeRef) {
        let full_name = ty.full_managed_name();
        let unique = self
            .short_names
            .get(&ty.managed_name)
            .is_none_or(|owners| owners.len() == 1);
        let short = (unique && ty.managed_name != full_name).then(|| ty.managed_name.clone());
        for name in [Some(full_name), Some(ty.native_name.clone()), short].into_iter().flatten() {
            self.pending.remove(&name);
            self.declared.insert(name, Rc::clone(ty));
        }
    }

    pub fn declared(&self, name: &str) -> Option<&TypeRef> {
        self.declared.get(name)
    }

    // ========================================================================
    // Indices
    // ========================================================================

    pub(crate) fn index_mapped(&mut self, ty: &TypeRef) {
        self.native_index
            .insert(ty.native_name.clone(), Rc::clone(ty));
        self.managed_index
            .insert(ty.full_managed_name(), Rc::clone(ty));
    }

    /// A mapped type already resolved in this run, by native name.
    pub fn find_native(&self, native_name: &str) -> Option<&TypeRef> {
        self.native_index.get(native_name)
    }

    /// A mapped type already resolved in this run, by qualified managed name.
    pub fn find_managed(&self, full_name: &str) -> Option<&TypeRef> {
        self.managed_index.get(full_name)
    }

    pub(crate) fn primitive(&mut self, managed: &'static str, native: &'static str) -> TypeRef {
        Rc::clone(
            self.primitives
                .entry(managed)
                .or_insert_with(|| primitives::make(managed, native).into_ref()),
        )
    }

    // ========================================================================
    // Mangling and modules
    // ========================================================================

    pub fn mangler(&mut self) -> &mut NameMangler {
        &mut self.mangler
    }

    /// The module called `name`, created on first use.
    pub fn module_entry(&mut self, name: &str, namespace: &Namespace) -> &mut Module {
        self.modules
            .entry(name.to_string())
            .or_insert_with(|| Module::new(name, namespace.clone()))
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Modules by name, in name order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

fn validate_mapping(mapping: &MappingDescriptor) -> Result<(), ConfigurationError> {
    let malformed = |reason: &str| ConfigurationError::MalformedMapping {
        name: if mapping.managed_name.is_empty() {
            mapping.native_name.clone()
        } else {
            mapping.managed_name.clone()
        },
        reason: reason.to_string(),
    };

    if mapping.managed_name.trim().is_empty() || mapping.native_name.trim().is_empty() {
        return Err(malformed("managed and native names are required"));
    }
    if matches!(mapping.kind, TypeKind::Class | TypeKind::Interface)
        && mapping.memory == TransferMode::ByValue
    {
        return Err(malformed("reference kinds cannot be transferred by value"));
    }
    if let Some(formats) = &mapping.formats {
        if mapping.intermediate.is_none() {
            return Err(malformed("formats require an intermediate type"));
        }
        validate_formats(&mapping.managed_name, formats)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interop_core::{FormatsDescriptor, RawTypeReference};

    fn mapping(managed: &str, native: &str) -> MappingDescriptor {
        MappingDescriptor {
            managed_name: managed.into(),
            native_name: native.into(),
            namespace: Namespace::parse("Unreal.Core"),
            module: "Core".into(),
            header: String::new(),
            kind: TypeKind::Struct,
            memory: TransferMode::ByValue,
            generic_parameters: Vec::new(),
            intermediate: None,
            formats: None,
        }
    }

    #[test]
    fn mapping_is_keyed_by_both_names() {
        let mut ctx = GenerationContext::new(GeneratorOptions::default());
        ctx.register_mapping(mapping("Vector", "FVector")).unwrap();
        assert_eq!(ctx.mapping("FVector").unwrap().managed_name, "Vector");
        assert_eq!(ctx.mapping("Vector").unwrap().native_name, "FVector");
    }

    #[test]
    fn identical_mapping_is_idempotent() {
        let mut ctx = GenerationContext::new(GeneratorOptions::default());
        ctx.register_mapping(mapping("Vector", "FVector")).unwrap();
        ctx.register_mapping(mapping("Vector", "FVector")).unwrap();
    }

    #[test]
    fn conflicting_native_name() {
        let mut ctx = GenerationContext::new(GeneratorOptions::default());
        ctx.register_mapping(mapping("Vector", "FVector")).unwrap();
        let err = ctx.register_mapping(mapping("Vector3", "FVector")).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ConflictingMapping {
                native_name: "FVector".into(),
                existing: "Vector".into(),
                new: "Vector3".into(),
            }
        );
    }

    #[test]
    fn malformed_mappings() {
        let mut ctx = GenerationContext::new(GeneratorOptions::default());

        let err = ctx.register_mapping(mapping("", "FVector")).unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedMapping { .. }));

        let mut bad_format = mapping("Text", "FText");
        bad_format.intermediate = Some(RawTypeReference::named("IntPtr"));
        bad_format.formats = Some(FormatsDescriptor {
            intermediate_to_native: "FText({1})".into(),
            ..FormatsDescriptor::default()
        });
        let err = ctx.register_mapping(bad_format).unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedMapping { ref name, .. } if name == "Text"));

        let mut by_value_class = mapping("Actor", "AActor");
        by_value_class.kind = TypeKind::Class;
        assert!(ctx.register_mapping(by_value_class).is_err());
    }

    #[test]
    fn declare_clears_pending_names() {
        let mut ctx = GenerationContext::new(GeneratorOptions::default());
        ctx.announce("Base", "Game.Base", "NBase");
        assert!(ctx.pending.contains("NBase"));

        let ty = crate::types::TypeInfo::new(
            "Base",
            "NBase",
            TypeKind::Class,
            crate::types::TypeOrigin::Declared(interop_core::TypeImplementation::Native),
        )
        .with_namespace(Namespace::parse("Game"))
        .into_ref();
        ctx.declare(&ty);
        assert!(ctx.pending.is_empty());
        assert!(Rc::ptr_eq(ctx.declared("Game.Base").unwrap(), &ty));
        assert!(Rc::ptr_eq(ctx.declared("NBase").unwrap(), &ty));
    }

    #[test]
    fn modules_are_created_once() {
        let mut ctx = GenerationContext::new(GeneratorOptions::default());
        ctx.module_entry("Game", &Namespace::parse("Game")).ticket = 7;
        assert_eq!(ctx.module_entry("Game", &Namespace::global()).ticket, 7);
        assert_eq!(ctx.modules().count(), 1);
    }
}
