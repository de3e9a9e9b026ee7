//! Operators and their binding powers.
//!
//! Binding powers are `(left, right)` pairs derived from the precedence
//! levels below; a higher number binds tighter.
//!
//! | Level | Operators            | Associativity |
//! |-------|----------------------|---------------|
//! | 13    | `as`                 | left          |
//! | 12    | `*` `/` `%`          | left          |
//! | 11    | `+` `-`              | left          |
//! | 9     | `<` `<=` `>` `>=`    | left          |
//! | 8     | `==` `!=`            | left          |
//! | 4     | `and`                | left          |
//! | 3     | `or`                 | left          |
//! | 1     | `=`                  | right         |

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators. Each resolves to a native operator function on the
/// wider operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Precedence level from the table in the module docs.
    pub fn precedence(&self) -> u8 {
        use BinaryOp::*;
        match self {
            Mul | Div | Mod => 12,
            Add | Sub => 11,
            Less | LessEqual | Greater | GreaterEqual => 9,
            Equal | NotEqual => 8,
            And => 4,
            Or => 3,
        }
    }

    /// `(left, right)` binding power, left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        let level = self.precedence() * 2;
        (level, level + 1)
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            Less => BinaryOp::Less,
            LessEqual => BinaryOp::LessEqual,
            Greater => BinaryOp::Greater,
            GreaterEqual => BinaryOp::GreaterEqual,
            EqualEqual => BinaryOp::Equal,
            BangEqual => BinaryOp::NotEqual,
            TokenKind::And => BinaryOp::And,
            TokenKind::Or => BinaryOp::Or,
            _ => return None,
        })
    }

    /// Name of the native operator function, e.g. `+` for `Int.+(Int,Int)`.
    pub fn symbol(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            And => "and",
            Or => "or",
        }
    }

    #[inline]
    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Less | LessEqual | Greater | GreaterEqual | Equal | NotEqual)
    }

    #[inline]
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators. Negation is the only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
}

impl UnaryOp {
    /// Right binding power of a prefix operator: tighter than `as`.
    pub fn binding_power() -> u8 {
        28
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
        }
    }
}

/// Left binding power of `expr as Type`.
pub const CAST_BP: u8 = 26;

/// Binding power of `.`, `()` and `[]`.
pub const POSTFIX_BP: u8 = 30;

/// `(left, right)` binding power of `=`, right-associative.
pub const ASSIGN_BP: (u8, u8) = (2, 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(BinaryOp::Mul.binding_power().0 > BinaryOp::Add.binding_power().0);
        assert!(BinaryOp::Add.binding_power().0 > BinaryOp::Less.binding_power().0);
        assert!(BinaryOp::Less.binding_power().0 > BinaryOp::Equal.binding_power().0);
        assert!(BinaryOp::And.binding_power().0 > BinaryOp::Or.binding_power().0);
    }

    #[test]
    fn cast_binds_tighter_than_multiplicative() {
        assert!(CAST_BP > BinaryOp::Mul.binding_power().1);
        assert!(UnaryOp::binding_power() > CAST_BP);
        assert!(POSTFIX_BP > UnaryOp::binding_power());
    }

    #[test]
    fn token_mapping() {
        assert_eq!(BinaryOp::from_token(TokenKind::Percent), Some(BinaryOp::Mod));
        assert_eq!(BinaryOp::from_token(TokenKind::Or), Some(BinaryOp::Or));
        assert_eq!(BinaryOp::from_token(TokenKind::Equal), None);
    }
}
