//! Built-in scalar types and the numeric rank ladder.
//!
//! The ladder totally orders the numeric primitives:
//!
//! ```text
//! Bool < Char < Short < Int < Long < Float < Double
//! ```
//!
//! Binary operators and implicit conversions always move up the ladder to
//! the wider of two operands; narrowing only happens through an explicit
//! `as` cast. `Null` is the type of the `null` literal and sits outside the
//! ladder.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// A primitive type. The discriminant is the rank on the numeric ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 0,
    Char = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    Null = 7,
}

impl PrimitiveKind {
    /// Every primitive that participates in arithmetic, lowest rank first.
    pub const NUMERIC: [PrimitiveKind; 7] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// The source-level type name.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "Bool",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Int",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Null => "Null",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NUMERIC
            .into_iter()
            .chain(std::iter::once(PrimitiveKind::Null))
            .find(|kind| kind.name() == name)
    }

    /// Position on the numeric ladder, `None` for `Null`.
    #[inline]
    pub fn rank(self) -> Option<u8> {
        match self {
            PrimitiveKind::Null => None,
            other => Some(other.into()),
        }
    }

    /// Storage width in bytes.
    pub fn byte_width(self) -> u32 {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Char => 1,
            PrimitiveKind::Short => 2,
            PrimitiveKind::Int | PrimitiveKind::Float => 4,
            PrimitiveKind::Long | PrimitiveKind::Double | PrimitiveKind::Null => 8,
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        self.rank().is_some()
    }

    /// The wider of two ladder types, `None` if either is off the ladder.
    pub fn wider(self, other: PrimitiveKind) -> Option<PrimitiveKind> {
        let (a, b) = (self.rank()?, other.rank()?);
        PrimitiveKind::try_from(a.max(b)).ok()
    }

    /// Implicit conversion distance from `self` to `target`.
    ///
    /// Widening costs the number of ladder steps; narrowing is never implicit.
    pub fn widening_distance(self, target: PrimitiveKind) -> Option<u32> {
        if self == target {
            return Some(0);
        }
        let (from, to) = (self.rank()?, target.rank()?);
        (from < to).then(|| u32::from(to - from))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_totally_ordered() {
        for pair in PrimitiveKind::NUMERIC.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn wider_picks_higher_rank() {
        assert_eq!(
            PrimitiveKind::Int.wider(PrimitiveKind::Double),
            Some(PrimitiveKind::Double)
        );
        assert_eq!(
            PrimitiveKind::Long.wider(PrimitiveKind::Short),
            Some(PrimitiveKind::Long)
        );
        assert_eq!(PrimitiveKind::Null.wider(PrimitiveKind::Int), None);
    }

    #[test]
    fn widening_distance_counts_steps() {
        assert_eq!(PrimitiveKind::Int.widening_distance(PrimitiveKind::Int), Some(0));
        assert_eq!(PrimitiveKind::Int.widening_distance(PrimitiveKind::Double), Some(3));
        assert_eq!(PrimitiveKind::Double.widening_distance(PrimitiveKind::Int), None);
        assert_eq!(PrimitiveKind::Null.widening_distance(PrimitiveKind::Long), None);
    }

    #[test]
    fn names_round_trip() {
        for kind in PrimitiveKind::NUMERIC {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("String"), None);
    }
}
