//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a type's qualified name. It is used
//! as the key of the generator's memo tables, as the node key of the topological
//! sort, and to derive module tickets that stay byte-identical between runs.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that a type name, a
//! generic instance and a module ticket can never collide with each other even
//! when built from the same text.
//!
//! # Examples
//!
//! ```
//! use interop_core::TypeHash;
//!
//! let int_hash = TypeHash::from_name("int");
//! assert_eq!(int_hash, TypeHash::from_name("int"));
//!
//! let list = TypeHash::from_name("TArray");
//! let list_int = TypeHash::from_generic_instance(list, &[int_hash]);
//! assert_ne!(list, list_int);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for chained components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for module tickets.
    pub const MODULE: u64 = 0x5ea77ffbcdf5f302;

    /// Argument position mixing constants.
    /// Each position gets a unique constant so argument order matters.
    pub const ARG_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

#[inline]
fn arg_marker(index: usize) -> u64 {
    hash_constants::ARG_MARKERS
        .get(index)
        .copied()
        .unwrap_or_else(|| hash_constants::ARG_MARKERS[0].wrapping_add(index as u64))
}

/// A deterministic 64-bit hash identifying a type.
///
/// The same qualified name always produces the same hash, so identities computed
/// before a type is declared match the identity it gets once declared.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create the hash of a generic instance from its definition and argument hashes.
    ///
    /// Argument order matters: `TMap<int, FString>` differs from `TMap<FString, int>`.
    #[inline]
    pub fn from_generic_instance(definition: TypeHash, args: &[TypeHash]) -> Self {
        let mut hash = definition.0;
        for (i, arg) in args.iter().enumerate() {
            // wrapping_mul keeps the mix order dependent, unlike a plain XOR
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(arg_marker(i) ^ arg.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Compute the generation ticket of a module.
///
/// The native and managed halves of a module embed this value and compare it at
/// load time. It depends only on the module id and the names of the types it
/// registers, so unchanged input always yields the same ticket.
pub fn module_ticket<S: AsRef<str>>(module_id: &str, type_names: &[S]) -> u64 {
    let mut hash = hash_constants::MODULE ^ xxh64(module_id.as_bytes(), 0);
    for (i, name) in type_names.iter().enumerate() {
        let name_hash = xxh64(name.as_ref().as_bytes(), 0);
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(arg_marker(i) ^ name_hash);
    }
    hash
}
