//! Deterministic type identity.
//!
//! Every object instance carries a pointer to a metadata record whose first
//! word is the [`TypeHash`] of its class. Hashes are computed from the
//! rendered type name, so `Box<Int>` hashes the same in every unit.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain marker mixed into type hashes so they never equal a raw xxh64 of
/// the same bytes used elsewhere.
const TYPE_DOMAIN: u64 = 0x2fac_10b6_3a6c_c57c;

/// A 64-bit hash of a rendered type name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(TYPE_DOMAIN ^ xxh64(name.as_bytes(), 0))
    }

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
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_hash() {
        assert_eq!(TypeHash::from_name("Box<Int>"), TypeHash::from_name("Box<Int>"));
        assert_ne!(TypeHash::from_name("Box<Int>"), TypeHash::from_name("Box<Long>"));
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(TypeHash(0xff).to_string(), "00000000000000ff");
    }
}
