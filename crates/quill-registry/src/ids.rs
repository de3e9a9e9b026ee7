//! Dense identifiers for registry entries.
//!
//! Each id indexes a `Vec` owned by the [`Registry`](crate::Registry); ids
//! are never reused within one compilation.

use std::fmt;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

dense_id!(
    /// An interned type.
    TypeId,
    "type#"
);

dense_id!(
    /// A function overload.
    FuncId,
    "fn#"
);

dense_id!(
    /// A function scope (overload table).
    ScopeId,
    "scope#"
);
