//! Per-module bootstrap files.
//!
//! Both halves of a module must agree on the order of its registered types and on
//! the generation ticket, so the registration list is sorted before anything is
//! written and the ticket is computed from the sorted list.

use std::collections::BTreeSet;

use interop_core::{Codespace, TypeImplementation, TypeKind, module_ticket};

use super::{FILE_HEADER, TypeEmitter};
use crate::module::Module;
use crate::types::TypeInfo;
use crate::writer::{CodeWriter, TemplateModel};

/// A declared type the module registers with the runtime at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub module: String,
    pub full_managed_name: String,
    pub managed_name: String,
    pub native_name: String,
    pub native_module: String,
    pub native_parent: Option<String>,
    pub header: String,
    pub implementation: TypeImplementation,
    /// The native class is reachable through its own API, `StaticClass()`.
    pub has_api: bool,
}

impl Registration {
    pub fn new(ty: &TypeInfo, module: &Module) -> Self {
        let implementation = ty.implementation().unwrap_or_default();
        let has_api = implementation == TypeImplementation::Managed
            || ty.native_module.is_empty()
            || ty.native_module == module.id;
        Self {
            module: module.name.clone(),
            full_managed_name: ty.full_managed_name(),
            managed_name: ty.managed_name.clone(),
            native_name: ty.native_name.clone(),
            native_module: ty.native_module.clone(),
            native_parent: ty.parent.as_ref().map(|p| p.native_name.clone()),
            header: ty.header.clone(),
            implementation,
            has_api,
        }
    }
}

#[derive(Debug)]
pub struct ModuleEmitter {
    module: Module,
    registrations: Vec<Registration>,
    type_mappings: Vec<String>,
    native_modules: BTreeSet<String>,
    dependencies: BTreeSet<String>,
}

impl ModuleEmitter {
    pub fn new(module: Module) -> Self {
        let native_modules = BTreeSet::from([module.id.clone()]);
        Self {
            module,
            registrations: Vec::new(),
            type_mappings: Vec::new(),
            native_modules,
            dependencies: BTreeSet::new(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Native modules the module's code depends on, itself excluded.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Record a type defined in this module.
    pub fn add_type(&mut self, emitter: &TypeEmitter) {
        let ty = emitter.ty();
        if matches!(ty.kind, TypeKind::Class | TypeKind::Interface) {
            self.registrations.push(Registration::new(ty, &self.module));
        }
        if !ty.native_module.is_empty() {
            self.native_modules.insert(ty.native_module.clone());
            self.dependencies.insert(ty.native_module.clone());
        }
        self.dependencies.extend(
            emitter
                .dependencies(Codespace::Native)
                .iter()
                .filter(|dep| !dep.native_module.is_empty())
                .map(|dep| dep.native_module.clone()),
        );
    }

    /// Record a mapping declared by this module.
    pub fn add_mapping(&mut self, full_managed_name: String) {
        self.type_mappings.push(full_managed_name);
    }

    /// Sort the registrations and compute the module ticket.
    pub fn finish(&mut self) -> u64 {
        self.registrations.sort_by(|a, b| {
            a.native_module
                .cmp(&b.native_module)
                .then_with(|| a.native_name.cmp(&b.native_name))
        });
        self.dependencies.remove(&self.module.id);

        let mut names: Vec<&str> = self
            .registrations
            .iter()
            .map(|r| r.full_managed_name.as_str())
            .collect();
        names.sort_unstable();
        self.module.ticket = module_ticket(&self.module.id, &names);
        self.module.ticket
    }

    fn model(&self) -> TemplateModel {
        let m = &self.module;
        TemplateModel::new()
            .with("Name", &m.name)
            .with("ModuleId", &m.id)
            .with("ModuleHeader", &m.header)
            .with("ModuleUpperSnake", &m.upper_snake)
            .with("ModuleExport", &m.export_macro)
            .with("ModuleApi", &m.api_macro)
            .with("Ticket", m.ticket)
            .with("ClassCount", self.registrations.len())
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// `Public/{ModuleId}.h`
    pub fn write_native_header(&self, writer: &mut CodeWriter) {
        writer.write(FILE_HEADER);
        writer.write(&self.model().render(NATIVE_HEADER_TEMPLATE));
    }

    /// `Private/{ModuleId}.cpp`
    pub fn write_native_source(&self, writer: &mut CodeWriter) {
        writer.write(FILE_HEADER);
        writer.write_line(&format!("#include \"{}\"\n", self.module.header));

        let mut includes = BTreeSet::from(["DotNet.h".to_string()]);
        includes.extend(
            self.registrations
                .iter()
                .filter(|r| r.has_api && !r.header.is_empty())
                .map(|r| r.header.clone()),
        );
        for include in &includes {
            writer.write_line(&format!("#include \"{include}\""));
        }
        writer.write_line("#include <CoreUObject.h>");

        let registrations: Vec<String> = self
            .registrations
            .iter()
            .map(|r| {
                if r.has_api {
                    format!("{}::StaticClass()", r.native_name)
                } else {
                    format!(
                        "GetUClass(TEXT(\"/Script/{}\"), TEXT(\"{}\"))",
                        r.native_module, r.managed_name
                    )
                }
            })
            .collect();
        let model = self
            .model()
            .with("Registration", registrations.join(",\n        "));
        writer.write(&model.render(NATIVE_SOURCE_TEMPLATE));
    }

    /// `{ModuleId}.Module.cs`
    pub fn write_managed_helper(&self, writer: &mut CodeWriter) {
        writer.write(FILE_HEADER);
        let registrations: Vec<String> = self
            .registrations
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "RegisterClass(handles[{i}], typeof({}), TypeImplementation.{});",
                    r.full_managed_name, r.implementation
                )
            })
            .collect();
        let native_modules: Vec<String> = self.native_modules.iter().map(|m| format!("\"{m}\"")).collect();
        let mappings: Vec<String> = self.type_mappings.iter().map(|m| format!("typeof({m})")).collect();

        let model = self
            .model()
            .with("NativeModules", native_modules.join(","))
            .with("TypeMappings", mappings.join(", "))
            .with("Registration", registrations.join("\n        "));
        writer.write(&model.render(MANAGED_HELPER_TEMPLATE));
    }

    /// `{ModuleId}.Build.cs`
    pub fn write_build_rules(&self, writer: &mut CodeWriter) {
        writer.write(FILE_HEADER);
        let dependencies: Vec<String> = self.dependencies.iter().map(|d| format!("\"{d}\"")).collect();
        let model = self
            .model()
            .with("Dependencies", dependencies.join(",\n\t\t    "));
        writer.write(&model.render(BUILD_RULES_TEMPLATE));
    }
}

const NATIVE_HEADER_TEMPLATE: &str = r#"#pragma once

#include "CoreMinimal.h"

#define {ModuleUpperSnake}_GENERATION_TICKET {Ticket}

// Entry points are only exported when managed code is jitted.
#if defined(BUILD_JIT)
    #if defined(_MSC_VER)
        #define {ModuleExport} __declspec(dllexport)
    #elif defined(__GNUC__)
        #define {ModuleExport} __attribute__((visibility("default")))
    #else
        #define {ModuleExport}
    #endif
#else
    #define {ModuleExport}
#endif

class {ModuleApi} F{ModuleId}Module : public IModuleInterface
{
public:
	virtual void StartupModule() override;
	virtual void ShutdownModule() override;
};
"#;

const NATIVE_SOURCE_TEMPLATE: &str = r#"
#define INIT_PARAMETERS uint64 ticket, QueryEntryPointCallback EntryPointGetter, UField* Classes[]

typedef void* (*QueryEntryPointCallback)(const UCS2CHAR* EntryPoint);
typedef void (*RuntimeInit)(INIT_PARAMETERS);

static void* ModuleHandle;

extern "C" void {ModuleUpperSnake}__Init(INIT_PARAMETERS);

static UField* GetUClass(const TCHAR* PackageName, const TCHAR* ClassName)
{
    const auto Package = FindObject<UPackage>(ANY_PACKAGE, PackageName);

    if (!Package)
        return nullptr;

    return FindObject<UField>(Package, ClassName, false);
}

static void* GetEntryPoint(const UCS2CHAR* EntryPoint)
{
    if (ModuleHandle == nullptr)
        return nullptr;
    return FPlatformProcess::GetDllExport(ModuleHandle, StringCast<TCHAR>(EntryPoint).Get());
}

void F{ModuleId}Module::StartupModule()
{
    RuntimeInit Initializer;

#if BUILD_JIT
    Initializer = (RuntimeInit)FDotNetModule::Get()->GetManagedEntryPoint("{Name}", "ModuleHelper", "Init");
#else
    Initializer = {ModuleUpperSnake}__Init;
#endif

    auto moduleDllPath = FModuleManager::Get().GetModuleFilename("{ModuleId}");

    ModuleHandle = FPlatformProcess::GetDllHandle(*moduleDllPath);

    static UField* Classes[] = {
        {Registration}
    };

    Initializer({ModuleUpperSnake}_GENERATION_TICKET, GetEntryPoint, Classes);
}

void F{ModuleId}Module::ShutdownModule()
{
}

IMPLEMENT_GAME_MODULE(F{ModuleId}Module, {ModuleId})
"#;

const MANAGED_HELPER_TEMPLATE: &str = r#"using System;
using System.Runtime.CompilerServices;
using System.Runtime.InteropServices;
using System.ComponentModel;

using Unreal;
using Unreal.Core;
using Unreal.CoreUObject;

[module:NativeModules({NativeModules})]
[module:NativeTypeMappings({TypeMappings})]

internal static class ModuleHelper
{
    private static unsafe delegate* unmanaged<char*, void*> m_entryGetter;

    private static readonly UField[] m_classes = new UField[{ClassCount}];

    private static unsafe IntPtr* m_handles;

    internal static ulong Ticket = {Ticket};

    [UnmanagedCallersOnly(EntryPoint = "{ModuleUpperSnake}__Init")]
    private static unsafe void Init(ulong ticket, delegate * unmanaged<char*, void*> entryPointGetter, IntPtr* classHandles)
    {
        m_entryGetter = entryPointGetter;

        try
        {
            if (ticket != Ticket)
                throw new Exception($"Native module ticket {ticket} does not match managed ticket {Ticket}.");

            m_handles = classHandles;

            var classes = new Span<IntPtr>(classHandles, {ClassCount});
            RegisterTypes(classes);
        }
        catch (Exception ex)
        {
            UeLog.Log(LogVerbosity.Fatal, $"Could not register object types: {ex}");
        }
    }

    private static void RegisterTypes(Span<IntPtr> handles)
    {
        {Registration}
    }

    private static void RegisterClass(IntPtr nativeHandle, Type type, TypeImplementation implementation)
    {
        if (nativeHandle == IntPtr.Zero)
            throw new TypeLoadException($"Could not locate reflection info for type {type}");

        UObjectReflection.Instance.RegisterType(nativeHandle, type, implementation);
    }

    internal static unsafe UField GetMetaInstance(int index)
    {
        if (m_classes[index] is not {} uClass)
            m_classes[index] = uClass = UObjectBase.GetOrCreateNative<UField>(m_handles[index])!;
        return uClass;
    }

    internal static unsafe IntPtr GetNativeMetaInstance(int index)
    {
        return m_handles[index];
    }

    [EditorBrowsable(EditorBrowsableState.Never)]
    public static unsafe void* GetFunction(string functionName)
    {
        fixed (char* pinnedName = functionName)
        {
            var entry = m_entryGetter(pinnedName);
            if (entry == null)
                throw new MissingMethodException($"Could not locate entry point for function named '{functionName}'");
            return entry;
        }
    }
}
"#;

const BUILD_RULES_TEMPLATE: &str = r#"using UnrealBuildTool;

public class {ModuleId} : DotnetModuleRules
{
	public {ModuleId}(ReadOnlyTargetRules Target)
		: base(Target)
	{
		PublicDependencyModuleNames.AddRange(new[] {
		    {Dependencies}
		});
	}
}
"#;
