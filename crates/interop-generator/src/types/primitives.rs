//! Blittable scalars known to both runtimes.

use interop_core::TypeKind;

use super::{TypeInfo, TypeOrigin};

/// Managed spelling, native spelling and the native alias accepted in the feed.
pub const PRIMITIVES: &[(&str, &str, &str)] = &[
    ("void", "void", "void"),
    ("bool", "bool", "bool"),
    ("sbyte", "int8", "int8_t"),
    ("byte", "uint8", "uint8_t"),
    ("short", "int16", "int16_t"),
    ("ushort", "uint16", "uint16_t"),
    ("int", "int32", "int32_t"),
    ("uint", "uint32", "uint32_t"),
    ("long", "int64", "int64_t"),
    ("ulong", "uint64", "uint64_t"),
    ("float", "float", "float"),
    ("double", "double", "double"),
    ("IntPtr", "void*", "intptr_t"),
];

/// Look a primitive up by any of its spellings.
pub fn find(name: &str) -> Option<(&'static str, &'static str)> {
    PRIMITIVES
        .iter()
        .find(|(managed, native, alias)| *managed == name || *native == name || *alias == name)
        .map(|(managed, native, _)| (*managed, *native))
}

/// Build the type for a primitive. Callers memoize the result.
pub fn make(managed: &str, native: &str) -> TypeInfo {
    TypeInfo::new(managed, native, TypeKind::Struct, TypeOrigin::Primitive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_any_spelling() {
        assert_eq!(find("int"), Some(("int", "int32")));
        assert_eq!(find("int32"), Some(("int", "int32")));
        assert_eq!(find("int32_t"), Some(("int", "int32")));
        assert_eq!(find("IntPtr"), Some(("IntPtr", "void*")));
        assert_eq!(find("FString"), None);
    }

    #[test]
    fn void_is_void() {
        let (m, n) = find("void").unwrap();
        assert!(make(m, n).is_void());
        assert!(!make("int", "int32").is_void());
    }
}
