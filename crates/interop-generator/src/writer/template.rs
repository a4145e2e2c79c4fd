//! `{Key}` substitution for the larger fixed file layouts.
//!
//! Only keys present in the model are replaced. Anything else in braces, including
//! the braces of the generated code itself, is copied through untouched.

use rustc_hash::FxHashMap;

#[derive(Debug, Default, Clone)]
pub struct TemplateModel {
    values: FxHashMap<String, String>,
}

impl TemplateModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Substitute every known `{Key}` in `template`.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let key_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());

            let key = &after[..key_len];
            let closed = after[key_len..].starts_with('}');
            match self.values.get(key) {
                Some(value) if closed && !key.is_empty() => {
                    out.push_str(value);
                    rest = &after[key_len + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
