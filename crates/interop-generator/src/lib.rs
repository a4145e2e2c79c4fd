//! Interop Binding Generator
//!
//! Turns a descriptor feed into the source code that lets native and managed code
//! call each other.
//!
//! ## Architecture
//!
//! - **Resolution**: every type reference resolves to one shared [`TypeInfo`]
//! - **Planning**: every function becomes a [`FunctionMarshallingPlan`] listing what
//!   crosses the boundary
//! - **Emission**: member emitters write each component of each type with a
//!   [`CodeWriter`]
//!
//! ## Modules
//!
//! - [`context`]: per-run caches and options
//! - [`emit`]: type, member and module emitters
//! - [`function`]: function definitions, marshalling plans and binders
//! - [`mangle`]: entry point symbol names
//! - [`marshalling`]: the marshaller strategies
//! - [`module`]: per-module identifiers
//! - [`pipeline`]: the generation driver
//! - [`resolver`]: raw reference to type resolution
//! - [`sort`]: topological ordering with cycle detection
//! - [`types`]: the type model
//! - [`writer`]: scoped code writer and templates

pub mod context;
pub mod emit;
pub mod function;
pub mod mangle;
pub mod marshalling;
pub mod module;
pub mod pipeline;
pub mod resolver;
pub mod sort;
pub mod types;
pub mod writer;

pub use context::{GenerationContext, GeneratorOptions};
pub use emit::{MemberComponent, ModuleEmitter, Registration, TypeEmitter};
pub use function::{FunctionBinding, FunctionDefinition, FunctionMarshallingPlan, ParameterPlan};
pub use mangle::NameMangler;
pub use marshalling::{Marshaller, MarshallerRef};
pub use module::Module;
pub use pipeline::{GeneratedFile, GenerationOutput, GenerationStats, Generator};
pub use resolver::TypeResolver;
pub use sort::{CyclePolicy, SortError, topological_sort};
pub use types::{QualifiedTypeReference, TypeInfo, TypeOrigin, TypeRef};
pub use writer::{CodeWriter, Scope, TemplateModel};
