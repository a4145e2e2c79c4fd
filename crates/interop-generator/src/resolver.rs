//! Raw type references to [`TypeRef`]s.
//!
//! [`TypeResolver`] borrows the [`GenerationContext`] and tries, in order:
//!
//! 1. the run memo, keyed by the reference as written
//! 2. declared types of this run, where a short name shared by two declared
//!    types is a metadata error
//! 3. explicit mappings, by native or managed name
//! 4. primitives
//! 5. an opaque native type, when the fallback is enabled
//!
//! Generic references resolve their arguments first and instantiate the unbound
//! mapping of their name. Mapped types are cached by identity, so a type reached
//! through its native spelling, its managed spelling or the memo is the same `Rc`.

use std::rc::Rc;

use interop_core::{
    GenerationError, MappingDescriptor, MarshallerDescriptor, RawTypeReference, SourceLocation,
    TypeHash, TypeKind, UnresolvedTypeError,
};

use crate::context::GenerationContext;
use crate::marshalling::build_marshaller;
use crate::types::{TypeInfo, TypeOrigin, TypeRef, primitives};

pub struct TypeResolver<'a> {
    ctx: &'a mut GenerationContext,
}

impl<'a> TypeResolver<'a> {
    pub fn new(ctx: &'a mut GenerationContext) -> Self {
        Self { ctx }
    }

    pub fn resolve(
        &mut self,
        raw: &RawTypeReference,
        requested_by: &str,
    ) -> Result<TypeRef, GenerationError> {
        self.resolve_at(raw, requested_by, None)
    }

    /// Resolve `raw` for the declaration `requested_by` found at `location`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_at(
        &mut self,
        raw: &RawTypeReference,
        requested_by: &str,
        location: Option<&SourceLocation>,
    ) -> Result<TypeRef, GenerationError> {
        let key = raw.to_string();
        if let Some(ty) = self.ctx.memo.get(&key) {
            return Ok(Rc::clone(ty));
        }

        let ty = if raw.is_generic() {
            self.resolve_generic(raw, requested_by, location)?
        } else {
            self.resolve_named(&raw.name, requested_by, location)?
        };
        self.ctx.memo.insert(key, Rc::clone(&ty));
        Ok(ty)
    }

    fn resolve_named(
        &mut self,
        name: &str,
        requested_by: &str,
        location: Option<&SourceLocation>,
    ) -> Result<TypeRef, GenerationError> {
        if let Some(ty) = self.ctx.declared.get(name) {
            return Ok(Rc::clone(ty));
        }
        if let Some(owners) = self.ctx.ambiguous(name) {
            let owners: Vec<&str> = owners.iter().map(String::as_str).collect();
            return Err(GenerationError::metadata(
                requested_by,
                format!("'{name}' is ambiguous between {}, qualify it", owners.join(", ")),
            ));
        }
        // declared later in the run, or skipped: never fall back to an opaque type
        if self.ctx.pending.contains(name) {
            return Err(unresolved(name, requested_by, location));
        }

        if let Some(mapping) = self.ctx.mappings.get(name).cloned() {
            if !mapping.generic_parameters.is_empty() {
                return Err(GenerationError::metadata(
                    requested_by,
                    format!(
                        "generic type '{name}' needs {} type argument(s)",
                        mapping.generic_parameters.len()
                    ),
                ));
            }
            return self.instantiate(&mapping, Vec::new(), requested_by);
        }

        if let Some((managed, native)) = primitives::find(name) {
            return Ok(self.ctx.primitive(managed, native));
        }

        if self.ctx.options().opaque_fallback {
            tracing::debug!(name, requested_by, "resolved as opaque native type");
            return Ok(TypeInfo::new(name, name, TypeKind::Struct, TypeOrigin::Opaque).into_ref());
        }

        Err(unresolved(name, requested_by, location))
    }

    fn resolve_generic(
        &mut self,
        raw: &RawTypeReference,
        requested_by: &str,
        location: Option<&SourceLocation>,
    ) -> Result<TypeRef, GenerationError> {
        let Some(mapping) = self.ctx.mappings.get(&raw.name).cloned() else {
            return Err(unresolved(&raw.to_string(), requested_by, location));
        };
        if mapping.generic_parameters.len() != raw.generic_arguments.len() {
            return Err(GenerationError::metadata(
                requested_by,
                format!(
                    "'{raw}' has {} type argument(s), '{}' takes {}",
                    raw.generic_arguments.len(),
                    mapping.managed_name,
                    mapping.generic_parameters.len()
                ),
            ));
        }

        let mut args = Vec::with_capacity(raw.generic_arguments.len());
        for arg in &raw.generic_arguments {
            args.push(self.resolve_at(arg, requested_by, location)?);
        }
        self.instantiate(&mapping, args, requested_by)
    }

    /// The concrete type of `mapping` applied to `args`, built once per run.
    fn instantiate(
        &mut self,
        mapping: &MappingDescriptor,
        args: Vec<TypeRef>,
        requested_by: &str,
    ) -> Result<TypeRef, GenerationError> {
        let definition = TypeHash::from_name(&mapping.namespace.qualify(&mapping.managed_name));
        let id = if args.is_empty() {
            definition
        } else {
            let arg_ids: Vec<TypeHash> = args.iter().map(|a| a.id).collect();
            TypeHash::from_generic_instance(definition, &arg_ids)
        };
        if let Some(ty) = self.ctx.instances.get(&id) {
            return Ok(Rc::clone(ty));
        }

        let (managed_name, native_name) = if args.is_empty() {
            (mapping.managed_name.clone(), mapping.native_name.clone())
        } else {
            let managed: Vec<String> = args.iter().map(|a| a.format_managed()).collect();
            let native: Vec<String> = args.iter().map(|a| a.format_native()).collect();
            (
                format!("{}<{}>", mapping.managed_name, managed.join(", ")),
                format!("{}<{}>", mapping.native_name, native.join(", ")),
            )
        };

        let marshaller = match &mapping.intermediate {
            Some(intermediate) => {
                let descriptor = MarshallerDescriptor::Custom {
                    intermediate: intermediate.clone(),
                    formats: mapping.formats.clone().unwrap_or_default(),
                };
                Some(build_marshaller(&mapping.managed_name, &descriptor, |r| {
                    self.resolve(r, requested_by)
                })?)
            }
            None => None,
        };

        let mut info = TypeInfo::new(managed_name, native_name, mapping.kind, TypeOrigin::Mapped)
            .with_namespace(mapping.namespace.clone())
            .with_transfer(mapping.memory)
            .with_header(mapping.header.clone())
            .with_marshaller(marshaller);
        info.id = id;
        info.module = mapping.module.clone();
        info.native_module = mapping.module.clone();
        info.generic_arguments = args;
        let ty = info.into_ref();

        tracing::trace!(ty = %ty, "instantiated mapped type");
        self.ctx.instances.insert(id, Rc::clone(&ty));
        self.ctx.index_mapped(&ty);
        Ok(ty)
    }
}

fn unresolved(name: &str, requested_by: &str, location: Option<&SourceLocation>) -> GenerationError {
    UnresolvedTypeError {
        name: name.to_string(),
        requested_by: requested_by.to_string(),
        location: location.cloned(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GeneratorOptions;
    use interop_core::{FormatsDescriptor, Namespace, TransferMode, TypeImplementation};

    fn raw(s: &str) -> RawTypeReference {
        s.parse().unwrap()
    }

    fn context(opaque_fallback: bool) -> GenerationContext {
        let mut ctx = GenerationContext::new(GeneratorOptions {
            opaque_fallback,
            ..GeneratorOptions::default()
        });
        ctx.register_mapping(MappingDescriptor {
            managed_name: "FString".into(),
            native_name: "FString".into(),
            namespace: Namespace::parse("Unreal.Core"),
            module: "Core".into(),
            header: "Containers/UnrealString.h".into(),
            kind: TypeKind::Struct,
            memory: TransferMode::ByValue,
            generic_parameters: Vec::new(),
            intermediate: Some(raw("IntPtr")),
            formats: Some(FormatsDescriptor {
                managed_to_intermediate: "StringMarshaller.ToNative({0})".into(),
                ..FormatsDescriptor::default()
            }),
        })
        .unwrap();
        ctx.register_mapping(MappingDescriptor {
            managed_name: "Vector".into(),
            native_name: "FVector".into(),
            namespace: Namespace::parse("Unreal.Core"),
            module: "Core".into(),
            header: "Math/Vector.h".into(),
            kind: TypeKind::Struct,
            memory: TransferMode::ByValue,
            generic_parameters: Vec::new(),
            intermediate: None,
            formats: None,
        })
        .unwrap();
        ctx.register_mapping(MappingDescriptor {
            managed_name: "TArray".into(),
            native_name: "TArray".into(),
            namespace: Namespace::parse("Unreal.Core"),
            module: "Core".into(),
            header: "Containers/Array.h".into(),
            kind: TypeKind::Struct,
            memory: TransferMode::ByValue,
            generic_parameters: vec!["T".into()],
            intermediate: None,
            formats: None,
        })
        .unwrap();
        ctx
    }

    // ========================================================================
    // Memoization
    // ========================================================================

    #[test]
    fn primitive_is_memoized_across_spellings() {
        let mut ctx = context(false);
        let mut resolver = ctx.resolver();
        let a = resolver.resolve(&raw("int"), "test").unwrap();
        let b = resolver.resolve(&raw("int"), "test").unwrap();
        let c = resolver.resolve(&raw("int32"), "test").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(Rc::ptr_eq(&a, &c));
        assert_eq!(a.origin, TypeOrigin::Primitive);
    }

    #[test]
    fn mapped_type_is_memoized_across_spellings() {
        let mut ctx = context(false);
        let mut resolver = ctx.resolver();
        let by_native = resolver.resolve(&raw("FVector"), "test").unwrap();
        let by_managed = resolver.resolve(&raw("Vector"), "test").unwrap();
        assert!(Rc::ptr_eq(&by_native, &by_managed));
        assert_eq!(by_native.header, "Math/Vector.h");
        assert!(by_native.default_marshaller.is_none());
        assert!(Rc::ptr_eq(ctx.find_native("FVector").unwrap(), &by_native));
        assert!(ctx.find_managed("Unreal.Core.Vector").is_some());
    }

    #[test]
    fn generic_instance_is_memoized() {
        let mut ctx = context(false);
        let mut resolver = ctx.resolver();
        let a = resolver.resolve(&raw("TArray<int>"), "test").unwrap();
        let b = resolver.resolve(&raw("TArray<int32>"), "test").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(a.is_generic());
        assert_eq!(a.managed_name, "TArray<int>");
        assert_eq!(a.native_name, "TArray<int32>");
        assert_ne!(a.id, TypeHash::from_name("Unreal.Core.TArray"));
    }

    #[test]
    fn nested_generic_arguments() {
        let mut ctx = context(false);
        let ty = ctx
            .resolver()
            .resolve(&raw("TArray<TArray<FVector>>"), "test")
            .unwrap();
        assert_eq!(ty.managed_name, "TArray<TArray<Vector>>");
        assert_eq!(ty.native_name, "TArray<TArray<FVector>>");
        let deps: Vec<String> = ty.type_dependencies().iter().map(|t| t.managed_name.clone()).collect();
        assert_eq!(deps, ["TArray<TArray<Vector>>", "TArray<Vector>", "Vector"]);
    }

    // ========================================================================
    // Resolution order
    // ========================================================================

    #[test]
    fn declared_types_win_over_mappings() {
        let mut ctx = context(false);
        let declared = TypeInfo::new(
            "Vector",
            "NVector",
            TypeKind::Struct,
            TypeOrigin::Declared(TypeImplementation::Managed),
        )
        .into_ref();
        ctx.declare(&declared);
        let ty = ctx.resolver().resolve(&raw("Vector"), "test").unwrap();
        assert!(Rc::ptr_eq(&ty, &declared));
    }

    #[test]
    fn mapping_with_intermediate_gets_custom_marshaller() {
        let mut ctx = context(false);
        let ty = ctx.resolver().resolve(&raw("FString"), "test").unwrap();
        let marshaller = ty.default_marshaller.as_ref().unwrap();
        let slot = crate::types::QualifiedTypeReference::by_value(Rc::clone(&ty));
        assert_eq!(marshaller.intermediate_type(&slot).unwrap().managed_name, "IntPtr");
    }

    #[test]
    fn opaque_fallback() {
        let mut ctx = context(true);
        let ty = ctx.resolver().resolve(&raw("FUnknownThing"), "test").unwrap();
        assert_eq!(ty.origin, TypeOrigin::Opaque);
        assert_eq!(ty.format_managed(), "IntPtr");
        assert_eq!(ty.format_native(), "FUnknownThing");
    }

    // ========================================================================
    // Errors
    // ========================================================================

    #[test]
    fn unresolved_carries_requester_and_location() {
        let mut ctx = context(false);
        let location = SourceLocation {
            file: "Derived.h".into(),
            line: 12,
        };
        let err = ctx
            .resolver()
            .resolve_at(&raw("FUnknownThing"), "Game.Derived.Compute", Some(&location))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unresolved type 'FUnknownThing' referenced by 'Game.Derived.Compute' at Derived.h:12"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn pending_declaration_is_not_opaque() {
        let mut ctx = context(true);
        ctx.announce("Base", "Game.Base", "NBase");
        let err = ctx.resolver().resolve(&raw("Base"), "Game.Derived").unwrap_err();
        assert!(matches!(err, GenerationError::Unresolved(_)));
    }

    #[test]
    fn shared_short_name_needs_qualification() {
        let mut ctx = context(true);
        let vector = |ns: &str, native: &str| {
            TypeInfo::new(
                "Vector",
                native,
                TypeKind::Struct,
                TypeOrigin::Declared(TypeImplementation::Managed),
            )
            .with_namespace(Namespace::parse(ns))
            .into_ref()
        };
        let (game, other) = (vector("Game", "FGameVector"), vector("Other", "FOtherVector"));
        ctx.announce("Vector", "Game.Vector", "FGameVector");
        ctx.announce("Vector", "Other.Vector", "FOtherVector");
        ctx.declare(&game);

        // the other type is still unbuilt
        let err = ctx.resolver().resolve(&raw("Other.Vector"), "test").unwrap_err();
        assert!(matches!(err, GenerationError::Unresolved(_)));

        ctx.declare(&other);
        let ty = ctx.resolver().resolve(&raw("Game.Vector"), "test").unwrap();
        assert!(Rc::ptr_eq(&ty, &game));
        let ty = ctx.resolver().resolve(&raw("FOtherVector"), "test").unwrap();
        assert!(Rc::ptr_eq(&ty, &other));

        let err = ctx.resolver().resolve(&raw("Vector"), "Game.Holder").unwrap_err();
        assert_eq!(
            err,
            GenerationError::metadata(
                "Game.Holder",
                "'Vector' is ambiguous between Game.Vector, Other.Vector, qualify it"
            )
        );
    }

    #[test]
    fn generic_arity_mismatch() {
        let mut ctx = context(false);
        let err = ctx.resolver().resolve(&raw("TArray<int, int>"), "test").unwrap_err();
        assert!(matches!(err, GenerationError::Metadata { .. }));
        let err = ctx.resolver().resolve(&raw("TArray"), "test").unwrap_err();
        assert!(matches!(err, GenerationError::Metadata { .. }));
    }

    #[test]
    fn unknown_generic_is_unresolved() {
        let mut ctx = context(true);
        let err = ctx.resolver().resolve(&raw("TMap<int, int>"), "test").unwrap_err();
        assert!(matches!(err, GenerationError::Unresolved(_)));
    }
}
