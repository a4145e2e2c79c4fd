//! Names derived from a managed module.

use interop_core::Namespace;

/// A managed module and the identifiers generated code uses for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// Name with spaces and dots removed.
    pub id: String,
    pub namespace: Namespace,
    /// `{id}.h`
    pub header: String,
    /// `GAME_CORE` for `Game.Core`.
    pub upper_snake: String,
    /// Native export macro of generated managed entry points.
    pub export_macro: String,
    /// Native API macro of the module.
    pub api_macro: String,
    pub ticket: u64,
}

impl Module {
    pub fn new(name: &str, namespace: Namespace) -> Self {
        let id: String = name.chars().filter(|c| *c != ' ' && *c != '.').collect();
        let upper_snake = upper_snake_case(name);
        Self {
            name: name.to_string(),
            header: format!("{id}.h"),
            export_macro: format!("{upper_snake}_MANAGED_EXPORT"),
            api_macro: format!("{}_API", id.to_uppercase()),
            upper_snake,
            id,
            namespace,
            ticket: 0,
        }
    }
}

/// `GameCore` and `Game.Core` both become `GAME_CORE`.
fn upper_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut after_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            after_lower = true;
            continue;
        }
        if c.is_uppercase() {
            if after_lower && !out.is_empty() {
                out.push('_');
            }
            after_lower = false;
        } else {
            after_lower = true;
        }
        out.extend(c.to_uppercase());
    }
    out
}
