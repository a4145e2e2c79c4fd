//! Member emitters for functions.
//!
//! The side that implements a type is the side being called:
//!
//! - [`NativeFunctionBinder`] binds a natively implemented method. Managed code
//!   gets a method that marshals its arguments and calls an `extern "C"` thunk,
//!   and the thunk converts them back and calls the real method.
//! - [`ManagedFunctionBinder`] binds a method implemented in managed code. Native
//!   code gets a method that calls an `[UnmanagedCallersOnly]` managed entry
//!   point, plus a stub that looks the entry point up when running under a JIT.

use interop_core::{Codespace, GenerationError, TypeImplementation, Visibility};

use super::call::{FunctionBinding, guard_exceptions};
use super::plan::MarshalOrder;
use crate::emit::{ComponentFlags, MemberComponent, MemberEmitter, unsupported};
use crate::marshalling::{Marshaller, Order};
use crate::module::Module;
use crate::types::TypeRef;
use crate::writer::{CodeWriter, TemplateModel};

/// The binder for `binding`, chosen by who implements the enclosing type.
pub fn function_binder(binding: FunctionBinding) -> Box<dyn MemberEmitter> {
    match binding.function.enclosing.implementation() {
        Some(TypeImplementation::Managed) => Box::new(ManagedFunctionBinder::new(binding)),
        _ => Box::new(NativeFunctionBinder::new(binding)),
    }
}

/// Headers or namespaces requested by the marshallers of every slot.
fn marshaller_extras(
    binding: &FunctionBinding,
    extra: impl Fn(&dyn Marshaller) -> Option<&str>,
) -> Vec<String> {
    let plan = &binding.plan;
    plan.parameters
        .iter()
        .chain(plan.ret.iter())
        .filter_map(|p| p.marshaller.as_deref())
        .filter_map(|m| extra(m).map(str::to_string))
        .collect()
}

// ============================================================================
// Managed to native
// ============================================================================

#[derive(Debug)]
pub struct NativeFunctionBinder {
    binding: FunctionBinding,
}

impl NativeFunctionBinder {
    pub fn new(binding: FunctionBinding) -> Self {
        Self { binding }
    }

    fn write_managed_method(&self, writer: &mut CodeWriter) -> Result<(), GenerationError> {
        let entry_point = &self.binding.function.entry_point;
        let pointer = self.binding.plan.managed_function_pointer();
        writer.write_line(&format!(
            "private static unsafe {pointer} {entry_point} =\n    ({pointer})ModuleHelper.GetFunction(\"{entry_point}\");"
        ));

        self.binding.write_managed_signature(writer);
        let mut body = writer.block("");
        let mut guard = guard_exceptions(&mut body);
        self.binding
            .write_binding_call(&mut guard, Codespace::Managed, Order::Before)
    }

    fn write_native_thunk(&self, writer: &mut CodeWriter, module: &Module) -> Result<(), GenerationError> {
        let binding = &self.binding;
        writer.write(&format!(
            "extern \"C\" {} {} {}",
            module.api_macro,
            binding.plan.native_return(),
            binding.function.entry_point
        ));
        {
            let mut params = writer.parenthesis("\n");
            params.write(&binding.format_marshalled_argument_list(
                false,
                Codespace::Native,
                MarshalOrder::Marshalled,
            ));
        }
        let mut body = writer.block("");
        binding.write_binding_call(&mut body, Codespace::Native, Order::After)
    }
}

impl MemberEmitter for NativeFunctionBinder {
    fn name(&self) -> &str {
        &self.binding.function.name
    }

    fn components(&self) -> ComponentFlags {
        ComponentFlags::MANAGED_PART | ComponentFlags::NATIVE_IMPLEMENTATION
    }

    fn visibility(&self) -> Visibility {
        self.binding.function.visibility
    }

    fn write(
        &self,
        writer: &mut CodeWriter,
        component: MemberComponent,
        module: &Module,
    ) -> Result<(), GenerationError> {
        match component {
            MemberComponent::ManagedPart => self.write_managed_method(writer),
            MemberComponent::NativeImplementation => self.write_native_thunk(writer, module),
            other => Err(unsupported(&self.binding.function.symbol(), other)),
        }
    }

    fn type_dependencies(&self, _space: Codespace) -> Vec<TypeRef> {
        self.binding.function.type_dependencies()
    }

    fn additional_headers(&self) -> Vec<String> {
        let mut headers = vec!["DotNet.h".to_string()];
        headers.extend(marshaller_extras(&self.binding, |m| m.additional_header()));
        headers
    }

    fn additional_namespaces(&self) -> Vec<String> {
        let mut namespaces = vec!["System".to_string()];
        namespaces.extend(marshaller_extras(&self.binding, |m| m.additional_namespace()));
        namespaces
    }
}

// ============================================================================
// Native to managed
// ============================================================================

const ENTRY_POINT_TEMPLATE: &str = r#"#if defined(BUILD_JIT)
typedef {FuncTypeDeclaration};

static {Return} {FirstCall} ({Arguments});

static {FuncType} {FuncStorage} = {FirstCall};

static {Return} {FirstCall} ({Arguments})
{
    auto __function__ = ({FuncType}) FDotNetModule::Get()->GetManagedEntryPoint(
                            "{ModuleName}", "{EnclosingTypeFullName}",
                            "{EntryPointName}");
    if (!__function__)
        abort();

    {FuncStorage} = __function__;
    {ReturnIfNeeded}__function__({ArgumentsTransfer});
}

extern "C" {Return} {EntryPointName} ({Arguments})
{
    {ReturnIfNeeded}{FuncStorage}({ArgumentsTransfer});
}
#endif
"#;

#[derive(Debug)]
pub struct ManagedFunctionBinder {
    binding: FunctionBinding,
}

impl ManagedFunctionBinder {
    pub fn new(binding: FunctionBinding) -> Self {
        Self { binding }
    }

    fn native_arguments(&self, invocation: bool) -> String {
        self.binding
            .format_marshalled_argument_list(invocation, Codespace::Native, MarshalOrder::Marshalled)
    }

    /// `extern "C"` declaration of the managed entry point.
    fn write_entry_point_declaration(&self, writer: &mut CodeWriter, module: &Module) {
        writer.write_line(&format!(
            "extern \"C\" {} {} {}({});",
            module.export_macro,
            self.binding.plan.native_return(),
            self.binding.function.entry_point,
            self.native_arguments(false)
        ));
    }

    fn write_native_method(&self, writer: &mut CodeWriter) -> Result<(), GenerationError> {
        self.binding.write_native_signature(writer);
        let mut body = writer.block("");
        self.binding
            .write_binding_call(&mut body, Codespace::Native, Order::Before)
    }

    /// Lazy lookup of the entry point, for builds where managed code is jitted.
    fn write_entry_point_implementation(&self, writer: &mut CodeWriter, module: &Module) {
        let id = writer.next_counter("GeneratedStubId");
        let func_type = format!("func_type_{id}");
        let plan = &self.binding.plan;
        let function = &self.binding.function;

        let model = TemplateModel::new()
            .with("FuncTypeDeclaration", plan.native_function_pointer(&func_type))
            .with("Return", plan.native_return())
            .with("FirstCall", format!("FirstCall{id}"))
            .with("Arguments", self.native_arguments(false))
            .with("FuncType", &func_type)
            .with("FuncStorage", format!("func_storage_{id}"))
            .with("ReturnIfNeeded", if plan.ret.is_some() { "return " } else { "" })
            .with("ArgumentsTransfer", self.native_arguments(true))
            .with("ModuleName", &module.name)
            .with("EnclosingTypeFullName", function.enclosing.full_managed_name())
            .with("EntryPointName", &function.entry_point);
        writer.write(&model.render(ENTRY_POINT_TEMPLATE));
    }

    fn write_managed_entry_point(&self, writer: &mut CodeWriter) -> Result<(), GenerationError> {
        let binding = &self.binding;
        let entry_point = &binding.function.entry_point;
        writer.write_line("[EditorBrowsable(EditorBrowsableState.Never)]");
        writer.write_line(&format!("[UnmanagedCallersOnly(EntryPoint = \"{entry_point}\")]"));
        writer.write(&format!(
            "private static unsafe {} {entry_point}",
            binding.plan.managed_return()
        ));
        {
            let mut params = writer.parenthesis("\n");
            params.write(&binding.format_marshalled_argument_list(
                false,
                Codespace::Managed,
                MarshalOrder::Marshalled,
            ));
        }
        let mut body = writer.block("");
        let mut guard = guard_exceptions(&mut body);
        binding.write_binding_call(&mut guard, Codespace::Managed, Order::After)
    }
}

impl MemberEmitter for ManagedFunctionBinder {
    fn name(&self) -> &str {
        &self.binding.function.name
    }

    fn components(&self) -> ComponentFlags {
        ComponentFlags::ALL
    }

    fn visibility(&self) -> Visibility {
        self.binding.function.visibility
    }

    fn write(
        &self,
        writer: &mut CodeWriter,
        component: MemberComponent,
        module: &Module,
    ) -> Result<(), GenerationError> {
        match component {
            MemberComponent::NativeFunctionDeclaration => {
                self.write_entry_point_declaration(writer, module);
                Ok(())
            }
            MemberComponent::NativeClassDeclaration => self.write_native_method(writer),
            MemberComponent::NativeImplementation => {
                self.write_entry_point_implementation(writer, module);
                Ok(())
            }
            MemberComponent::ManagedPart => self.write_managed_entry_point(writer),
            MemberComponent::Custom => Err(unsupported(&self.binding.function.symbol(), component)),
        }
    }

    fn type_dependencies(&self, _space: Codespace) -> Vec<TypeRef> {
        self.binding.function.type_dependencies()
    }

    fn additional_headers(&self) -> Vec<String> {
        let mut headers = vec!["DotNet.h".to_string()];
        headers.extend(marshaller_extras(&self.binding, |m| m.additional_header()));
        headers
    }

    fn additional_namespaces(&self) -> Vec<String> {
        let mut namespaces = vec![
            "System".to_string(),
            "System.ComponentModel".to_string(),
            "System.Runtime.InteropServices".to_string(),
        ];
        namespaces.extend(marshaller_extras(&self.binding, |m| m.additional_namespace()));
        namespaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::test_support::*;
    use interop_core::{Namespace, TransferDirection};
    use pretty_assertions::assert_eq;

    fn module() -> Module {
        Module::new("Game", Namespace::parse("Game"))
    }

    fn compute() -> FunctionBinding {
        let derived = class("Derived", "NDerived", TypeImplementation::Native);
        FunctionBinding::new(function(
            &derived,
            "Compute",
            int(),
            vec![param("x", int(), TransferDirection::ByValue)],
        ))
        .unwrap()
    }

    fn tick() -> FunctionBinding {
        let actor = class("Actor", "AActor", TypeImplementation::Managed);
        FunctionBinding::new(function(
            &actor,
            "Tick",
            void(),
            vec![param("ticks", int(), TransferDirection::ByValue)],
        ))
        .unwrap()
    }

    fn render(emitter: &dyn MemberEmitter, component: MemberComponent) -> String {
        let mut writer = match component.space() {
            Codespace::Native => CodeWriter::native(),
            Codespace::Managed => CodeWriter::managed(),
        };
        emitter.write(&mut writer, component, &module()).unwrap();
        writer.into_string()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    #[test]
    fn binder_follows_implementation() {
        assert_eq!(
            function_binder(compute()).components(),
            ComponentFlags::MANAGED_PART | ComponentFlags::NATIVE_IMPLEMENTATION
        );
        assert_eq!(function_binder(tick()).components(), ComponentFlags::ALL);
    }

    // ========================================================================
    // Native binder
    // ========================================================================

    #[test]
    fn managed_caller_of_native_method() {
        let binder = NativeFunctionBinder::new(compute());
        let expected = "\
private static unsafe delegate * unmanaged<IntPtr, int, int> Game__NDerived__Compute_1_Vint =
    (delegate * unmanaged<IntPtr, int, int>)ModuleHelper.GetFunction(\"Game__NDerived__Compute_1_Vint\");
public unsafe int Compute(int x)
{
    try
    {
        Derived __self = this;
        IntPtr __self__marshalled = UObjectUtil.GetNativeInstance(__self);
        return Game__NDerived__Compute_1_Vint(__self__marshalled, x);
    }
    catch (Exception __ex)
    {
        Unreal.Core.UeLog.Log(Unreal.Core.LogVerbosity.Error, __ex.ToString());
        throw;
    }
}
";
        assert_eq!(render(&binder, MemberComponent::ManagedPart), expected);
    }

    #[test]
    fn native_thunk() {
        let binder = NativeFunctionBinder::new(compute());
        let expected = "\
extern \"C\" GAME_API int32 Game__NDerived__Compute_1_Vint(NDerived* __self__marshalled, int32 x)
{
\tNDerived* __self = __self__marshalled;
\treturn __self->Compute(x);
}
";
        assert_eq!(render(&binder, MemberComponent::NativeImplementation), expected);
    }

    #[test]
    fn native_binder_extras() {
        let binder = NativeFunctionBinder::new(compute());
        assert_eq!(binder.additional_headers(), ["DotNet.h"]);
        assert!(binder.additional_namespaces().contains(&"Unreal.Core".to_string()));
        let mut writer = CodeWriter::native();
        assert!(
            binder
                .write(&mut writer, MemberComponent::NativeClassDeclaration, &module())
                .is_err()
        );
    }

    // ========================================================================
    // Managed binder
    // ========================================================================

    #[test]
    fn entry_point_declaration() {
        let binder = ManagedFunctionBinder::new(tick());
        assert_eq!(
            render(&binder, MemberComponent::NativeFunctionDeclaration),
            "extern \"C\" GAME_MANAGED_EXPORT void Game__AActor__Tick_1_Vint(AActor* __self__marshalled, int32 ticks);\n"
        );
    }

    #[test]
    fn native_caller_of_managed_method() {
        let binder = ManagedFunctionBinder::new(tick());
        let expected = "\
void Tick(int32 ticks)
{
\tAActor* __self = this;
\tAActor* __self__marshalled = __self;
\tGame__AActor__Tick_1_Vint(__self__marshalled, ticks);
}
";
        assert_eq!(render(&binder, MemberComponent::NativeClassDeclaration), expected);
    }

    #[test]
    fn managed_entry_point() {
        let binder = ManagedFunctionBinder::new(tick());
        let expected = "\
[EditorBrowsable(EditorBrowsableState.Never)]
[UnmanagedCallersOnly(EntryPoint = \"Game__AActor__Tick_1_Vint\")]
private static unsafe void Game__AActor__Tick_1_Vint(IntPtr __self__marshalled, int ticks)
{
    try
    {
        Actor __self = GetManaged<Actor>(__self__marshalled);
        __self.Tick(ticks);
    }
    catch (Exception __ex)
    {
        Unreal.Core.UeLog.Log(Unreal.Core.LogVerbosity.Error, __ex.ToString());
        throw;
    }
}
";
        assert_eq!(render(&binder, MemberComponent::ManagedPart), expected);
    }

    #[test]
    fn jit_stubs_are_numbered_per_file() {
        let binder = ManagedFunctionBinder::new(tick());
        let mut writer = CodeWriter::native();
        binder
            .write(&mut writer, MemberComponent::NativeImplementation, &module())
            .unwrap();
        binder
            .write(&mut writer, MemberComponent::NativeImplementation, &module())
            .unwrap();
        let code = writer.into_string();

        assert!(code.starts_with("#if defined(BUILD_JIT)\ntypedef void (*func_type_1) (AActor*, int32);\n"));
        assert!(code.contains("static func_type_1 func_storage_1 = FirstCall1;"));
        assert!(code.contains("\"Game\", \"Game.Actor\",\n"));
        assert!(code.contains("    func_storage_1(__self__marshalled, ticks);\n"));
        assert!(code.contains("extern \"C\" void Game__AActor__Tick_1_Vint (AActor* __self__marshalled, int32 ticks)"));
        assert!(code.contains("static func_type_2 func_storage_2 = FirstCall2;"));
        assert!(!code.contains("{Return}"));
    }
}
