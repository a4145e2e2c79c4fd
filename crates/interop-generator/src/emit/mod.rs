//! Per-type and per-module source emission.
//!
//! Every member of a declared type (function binder, property, enum value) is a
//! [`MemberEmitter`]. A [`TypeEmitter`] owns the members of one type and writes each
//! [`MemberComponent`] the type contributes to by filtering that list. The
//! [`ModuleEmitter`] collects the registrations of a module and writes the files
//! that bootstrap it.

pub mod component;
pub mod enumeration;
pub mod module_emitter;
pub mod property;
pub mod type_emitter;

use std::fmt::Debug;

use interop_core::{Codespace, GenerationError, Visibility};

use crate::module::Module;
use crate::types::TypeRef;
use crate::writer::CodeWriter;

pub use component::{ComponentFlags, MemberComponent};
pub use enumeration::EnumValueEmitter;
pub use module_emitter::{ModuleEmitter, Registration};
pub use property::{PropertyDefinition, PropertyEmitter};
pub use type_emitter::{TypeDefinition, TypeEmitter};

/// Banner written at the top of every generated file.
pub const FILE_HEADER: &str = "// This file is generated. Changes will be overwritten.\n\n";

/// A member of a declared type that writes itself into one or more components.
pub trait MemberEmitter: Debug {
    fn name(&self) -> &str;

    fn components(&self) -> ComponentFlags;

    fn visibility(&self) -> Visibility;

    /// Write the member's part of `component`. Only called for components the
    /// member reports.
    fn write(
        &self,
        writer: &mut CodeWriter,
        component: MemberComponent,
        module: &Module,
    ) -> Result<(), GenerationError>;

    /// Types the member's code in `space` names.
    fn type_dependencies(&self, space: Codespace) -> Vec<TypeRef>;

    /// Native headers the member's code needs.
    fn additional_headers(&self) -> Vec<String> {
        Vec::new()
    }

    /// Managed namespaces the member's code needs.
    fn additional_namespaces(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Write a `// ` comment block when `comments` is not empty.
pub(crate) fn write_comments(writer: &mut CodeWriter, comments: &str) {
    if comments.is_empty() {
        return;
    }
    let mut comment = writer.indent(Some("// "));
    comment.write_line(comments);
}

/// The unsupported-component error shared by the emitters.
pub(crate) fn unsupported(name: &str, component: MemberComponent) -> GenerationError {
    GenerationError::metadata(name, format!("{component:?} is not written by this declaration"))
}
