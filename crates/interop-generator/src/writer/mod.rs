//! Stateful text writer for generated sources.
//!
//! [`CodeWriter`] tracks indentation and a stack of deferred closing actions
//! ("trails"). Scoped helpers such as [`CodeWriter::block`] push a trail and return
//! a [`Scope`] guard; dropping the guard unwinds every trail pushed since it was
//! created. Guards dereference to the writer, so nesting reads naturally:
//!
//! ```
//! use interop_generator::writer::CodeWriter;
//!
//! let mut writer = CodeWriter::native();
//! writer.write("class A");
//! writer.write_line("");
//! {
//!     let mut body = writer.block(";");
//!     body.write_line("GENERATED_BODY()");
//! }
//! assert_eq!(writer.as_str(), "class A\n{\n\tGENERATED_BODY()\n};\n");
//! ```
//!
//! Some constructs open a scope that the current statement cannot close (a `fixed`
//! block around the rest of a call). Those push a trail without a guard using
//! [`CodeWriter::open_block_detached`]; the next enclosing guard closes them.

pub mod template;

use std::ops::{Deref, DerefMut};

use rustc_hash::FxHashMap;

pub use template::TemplateModel;

/// Default indent for native sources.
pub const NATIVE_INDENT: &str = "\t";
/// Default indent for managed sources.
pub const MANAGED_INDENT: &str = "    ";

/// A deferred action run when its scope unwinds.
enum Trail {
    Text(String),
    PopIndent,
    PushIndent(String),
    Action(Box<dyn FnOnce(&mut CodeWriter)>),
}

pub struct CodeWriter {
    buffer: String,
    indent: String,
    indent_lengths: Vec<usize>,
    default_indent: String,
    at_line_start: bool,
    trails: Vec<Trail>,
    counters: FxHashMap<String, usize>,
}

impl std::fmt::Debug for CodeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeWriter")
            .field("len", &self.buffer.len())
            .field("indent", &self.indent)
            .field("trails", &self.trails.len())
            .finish()
    }
}

impl CodeWriter {
    pub fn new(default_indent: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            indent: String::new(),
            indent_lengths: Vec::new(),
            default_indent: default_indent.into(),
            at_line_start: true,
            trails: Vec::new(),
            counters: FxHashMap::default(),
        }
    }

    /// Writer indenting with tabs.
    pub fn native() -> Self {
        Self::new(NATIVE_INDENT)
    }

    /// Writer indenting with four spaces.
    pub fn managed() -> Self {
        Self::new(MANAGED_INDENT)
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Write text, indenting every line that starts inside it. Blank lines stay bare.
    pub fn write(&mut self, text: &str) {
        for segment in text.split_inclusive('\n') {
            if self.at_line_start && segment != "\n" {
                self.buffer.push_str(&self.indent);
            }
            self.buffer.push_str(segment);
            self.at_line_start = segment.ends_with('\n');
        }
    }

    pub fn write_line(&mut self, text: &str) {
        self.write(text);
        self.new_line();
    }

    pub fn new_line(&mut self) {
        self.buffer.push('\n');
        self.at_line_start = true;
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    // ========================================================================
    // Indentation
    // ========================================================================

    /// Push an indent level. `None` uses the writer's default indent.
    pub fn push_indent(&mut self, indent: Option<&str>) {
        let indent = indent.unwrap_or(&self.default_indent).to_string();
        self.indent_lengths.push(indent.len());
        self.indent.push_str(&indent);
    }

    /// Pop the last indent level and return it. Popping with no level is a no-op.
    pub fn pop_indent(&mut self) -> String {
        match self.indent_lengths.pop() {
            Some(len) => self.indent.split_off(self.indent.len() - len),
            None => String::new(),
        }
    }

    pub fn indent_depth(&self) -> usize {
        self.indent_lengths.len()
    }

    // ========================================================================
    // Per-file counters
    // ========================================================================

    /// Increment a named counter and return its new value, starting at 1.
    pub fn next_counter(&mut self, name: &str) -> usize {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    // ========================================================================
    // Trails
    // ========================================================================

    /// Number of pending trails.
    pub fn trail_depth(&self) -> usize {
        self.trails.len()
    }

    fn push_trail(&mut self, trail: Trail) -> usize {
        self.trails.push(trail);
        self.trails.len() - 1
    }

    /// Run pending trails, newest first, until `depth` remain.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.trails.len() > depth {
            let Some(trail) = self.trails.pop() else {
                break;
            };
            match trail {
                Trail::Text(text) => self.write(&text),
                Trail::PopIndent => {
                    self.pop_indent();
                }
                Trail::PushIndent(indent) => self.push_indent(Some(&indent)),
                Trail::Action(action) => action(self),
            }
        }
    }

    /// A guard over the current trail depth. Trails pushed through it or left
    /// detached inside it are closed when it drops.
    pub fn scope(&mut self) -> Scope<'_> {
        let depth = self.trail_depth();
        Scope::new(self, depth)
    }

    /// Open a `{` block that is closed by whichever guard unwinds past it.
    /// Returns the trail depth that closes it.
    pub fn open_block_detached(&mut self, trailing: &str) -> usize {
        self.write_line("{");
        let depth = self.push_trail(Trail::Text(format!("}}{trailing}\n")));
        self.push_indent(None);
        self.push_trail(Trail::PopIndent);
        depth
    }

    /// Open a `{` block. Closes with `}` followed by `trailing` and a newline.
    pub fn block(&mut self, trailing: &str) -> Scope<'_> {
        let depth = self.open_block_detached(trailing);
        Scope::new(self, depth)
    }

    /// Open `(`. Closes with `)` followed by `trailing`.
    pub fn parenthesis(&mut self, trailing: &str) -> Scope<'_> {
        self.write("(");
        let depth = self.push_trail(Trail::Text(format!("){trailing}")));
        Scope::new(self, depth)
    }

    /// Indent until the guard drops.
    pub fn indent(&mut self, indent: Option<&str>) -> Scope<'_> {
        self.push_indent(indent);
        let depth = self.push_trail(Trail::PopIndent);
        Scope::new(self, depth)
    }

    /// Remove one indent level until the guard drops.
    pub fn unindent(&mut self) -> Scope<'_> {
        let removed = self.pop_indent();
        let depth = self.push_trail(Trail::PushIndent(removed));
        Scope::new(self, depth)
    }

    /// Write `text` when the guard drops.
    pub fn trailing(&mut self, text: impl Into<String>) -> Scope<'_> {
        let depth = self.push_trail(Trail::Text(text.into()));
        Scope::new(self, depth)
    }

    /// Run `action` on the writer when the guard drops.
    pub fn trailing_with(&mut self, action: impl FnOnce(&mut CodeWriter) + 'static) -> Scope<'_> {
        let depth = self.push_trail(Trail::Action(Box::new(action)));
        Scope::new(self, depth)
    }
}

/// RAII guard returned by the scoped helpers of [`CodeWriter`].
pub struct Scope<'w> {
    writer: &'w mut CodeWriter,
    depth: usize,
}

impl<'w> Scope<'w> {
    fn new(writer: &'w mut CodeWriter, depth: usize) -> Self {
        Self { writer, depth }
    }
}

impl Deref for Scope<'_> {
    type Target = CodeWriter;

    fn deref(&self) -> &CodeWriter {
        self.writer
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut CodeWriter {
        self.writer
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.writer.unwind_to(self.depth);
    }
}
