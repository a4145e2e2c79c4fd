//! C ABI symbol names for generated entry points.
//!
//! - type: `{namespace}__{native name}`
//! - method: `{type}__{method}_0_` without parameters, otherwise
//!   `{type}__{method}_{count}_{param}__{param}...` where each parameter is its
//!   direction code (`V`, `I`, `O`, `R`) followed by its qualified managed type name
//!
//! Every component is passed through [`sanitize`], which leaves only ASCII
//! alphanumerics and `_{len}{hex}` escapes. An escaped `_` is always followed by a
//! digit, so `__` only ever separates components and distinct signatures get
//! distinct symbols. The pure functions are exposed for tests; generation goes
//! through [`NameMangler`], which memoizes symbols.

use std::fmt::Write;

use rustc_hash::FxHashMap;

use interop_core::GenerationError;

use crate::types::{QualifiedTypeReference, TypeInfo};

/// Keep `[0-9A-Za-z]`, escape every other code point as `_`, the digit count
/// and the lowercase hex digits: `.` is `_22e`, `_` is `_15f`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            let hex = format!("{:x}", c as u32);
            let _ = write!(out, "_{}{hex}", hex.len());
        }
    }
    out
}

pub fn mangle_type(ty: &TypeInfo) -> String {
    format!(
        "{}__{}",
        sanitize(&ty.namespace.to_string()),
        sanitize(&ty.native_name)
    )
}

pub fn mangle_parameter(param: &QualifiedTypeReference) -> String {
    format!(
        "{}{}",
        param.direction.mangle_modifier(),
        sanitize(&param.ty.full_managed_name())
    )
}

pub fn mangle_method(ty: &TypeInfo, method: &str, params: &[QualifiedTypeReference]) -> String {
    let type_name = mangle_type(ty);
    let method = sanitize(method);
    if params.is_empty() {
        format!("{type_name}__{method}_0_")
    } else {
        let args: Vec<String> = params.iter().map(mangle_parameter).collect();
        format!("{type_name}__{method}_{}_{}", params.len(), args.join("__"))
    }
}

/// Unambiguous description of a method, the memo key.
fn signature_key(ty: &TypeInfo, method: &str, params: &[QualifiedTypeReference]) -> String {
    let params: Vec<String> = params
        .iter()
        .map(|p| format!("{:?} {}", p.direction, p.ty.full_managed_name()))
        .collect();
    format!("{}::{}({})", ty.full_managed_name(), method, params.join(", "))
}

/// Per-run memo of entry point symbols.
#[derive(Debug, Default)]
pub struct NameMangler {
    by_signature: FxHashMap<String, String>,
    by_symbol: FxHashMap<String, String>,
}

impl NameMangler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol for a method, the same string each time it is asked for.
    ///
    /// Symbols are keyed by the enclosing native name, so two managed types over
    /// one native type in one namespace clash; the second is a metadata error.
    pub fn entry_point(
        &mut self,
        ty: &TypeInfo,
        method: &str,
        params: &[QualifiedTypeReference],
    ) -> Result<String, GenerationError> {
        let key = signature_key(ty, method, params);
        if let Some(symbol) = self.by_signature.get(&key) {
            return Ok(symbol.clone());
        }

        let symbol = mangle_method(ty, method, params);
        if let Some(existing) = self.by_symbol.get(&symbol) {
            return Err(GenerationError::metadata(
                key,
                format!("entry point '{symbol}' is already used by '{existing}'"),
            ));
        }

        self.by_symbol.insert(symbol.clone(), key.clone());
        self.by_signature.insert(key, symbol.clone());
        Ok(symbol)
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}
