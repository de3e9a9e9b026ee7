//! Function table entries.

use bitflags::bitflags;
use quill_core::{PrimitiveKind, Span};
use quill_parser::ast::{FunctionDecl, Stmt};
use rustc_hash::FxHashMap;

use crate::types::Substitution;
use crate::TypeId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u8 {
        /// Class function: no receiver.
        const STATIC = 1 << 0;
        /// An `init` overload.
        const CONSTRUCTOR = 1 << 1;
        /// Lowered inline at the call site.
        const NATIVE = 1 << 2;
        /// Provided by the host under its plain symbol name.
        const EXTERN = 1 << 3;
        /// The synthesized `main` of the entry file.
        const ENTRY = 1 << 4;
    }
}

/// Arithmetic on two operands of the owning primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
}

/// Built-in behaviour emitted inline by the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeOp {
    Arith(ArithOp),
    Compare(CompareOp),
    Logic(LogicOp),
    Negate,
    /// `value as Target` from the owning primitive.
    Convert(PrimitiveKind),
    ToString,
    /// Identity comparison of two references; `true` for `!=`.
    RefCompare { negate: bool },
    /// `String + value`, formatted with the two-pass protocol.
    StringConcat,
    StringEquals { negate: bool },
    StringLength,
    ArrayAdd,
    ArrayLength,
    ArrayCapacity,
    ArrayGet,
    ArraySet,
    PointerInit,
    PointerGet,
    PointerSet,
    Print,
}

/// Where a function's code comes from.
#[derive(Debug, Clone, Copy)]
pub enum FunctionBody<'ast> {
    /// A `def` in source; generic instantiations share the declaration.
    Script(&'ast FunctionDecl<'ast>),
    /// The top-level statements of the entry file.
    Entry(&'ast [Stmt<'ast>]),
    Native(NativeOp),
    /// Linked against the host symbol of the same name.
    Extern,
}

/// A named parameter as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// Written type name, used for override detection.
    pub declared: String,
    pub span: Span,
}

/// Resolved parameter and return types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<TypeId>,
    /// `None` for void.
    pub ret: Option<TypeId>,
}

/// One overload in the function table.
#[derive(Debug, Clone)]
pub struct Function<'ast> {
    pub name: String,
    /// Class, primitive, array or pointer type the function belongs to.
    pub owner: Option<TypeId>,
    /// Parameters excluding the receiver.
    pub params: Vec<Param>,
    pub declared_return: Option<String>,
    pub body: FunctionBody<'ast>,
    /// Generic parameter bindings in effect for the body.
    pub substitution: Substitution,
    pub flags: FunctionFlags,
    /// Subclass -> the function in that subclass overriding this one.
    pub overriders: FxHashMap<TypeId, crate::FuncId>,
    /// Set once the prototype has been resolved.
    pub signature: Option<Signature>,
    pub span: Span,
}

impl<'ast> Function<'ast> {
    /// A prototype-resolved native function.
    pub fn native(name: &str, owner: Option<TypeId>, op: NativeOp, params: Vec<TypeId>, ret: Option<TypeId>) -> Self {
        let named = params
            .iter()
            .enumerate()
            .map(|(i, _)| Param {
                name: format!("arg{i}"),
                declared: String::new(),
                span: Span::default(),
            })
            .collect();
        Function {
            name: name.to_string(),
            owner,
            params: named,
            declared_return: None,
            body: FunctionBody::Native(op),
            substitution: Substitution::default(),
            flags: FunctionFlags::NATIVE,
            overriders: FxHashMap::default(),
            signature: Some(Signature { params, ret }),
            span: Span::default(),
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FunctionFlags::STATIC)
    }

    /// Instance methods take the receiver as an implicit first argument.
    #[inline]
    pub fn has_receiver(&self) -> bool {
        self.owner.is_some() && !self.flags.intersects(FunctionFlags::STATIC)
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        !self.overriders.is_empty()
    }

    pub fn native_op(&self) -> Option<NativeOp> {
        match self.body {
            FunctionBody::Native(op) => Some(op),
            _ => None,
        }
    }

    /// Whether `other` has the same written signature, which makes one an
    /// override of the other.
    pub fn same_declared_signature(&self, other: &Function<'_>) -> bool {
        self.name == other.name
            && self.declared_return == other.declared_return
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.declared == b.declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_like(name: &str, params: &[&str], ret: Option<&str>) -> Function<'static> {
        let mut f = Function::native(name, None, NativeOp::Print, vec![], None);
        f.params = params
            .iter()
            .map(|p| Param {
                name: "x".into(),
                declared: (*p).into(),
                span: Span::default(),
            })
            .collect();
        f.declared_return = ret.map(str::to_string);
        f
    }

    #[test]
    fn declared_signature_equality() {
        let a = script_like("speak", &["Int"], Some("Int"));
        assert!(a.same_declared_signature(&script_like("speak", &["Int"], Some("Int"))));
        assert!(!a.same_declared_signature(&script_like("speak", &["Long"], Some("Int"))));
        assert!(!a.same_declared_signature(&script_like("speak", &["Int"], None)));
        assert!(!a.same_declared_signature(&script_like("talk", &["Int"], Some("Int"))));
    }

    #[test]
    fn receiver_rules() {
        let mut f = Function::native("length", Some(TypeId::new(0)), NativeOp::StringLength, vec![], None);
        assert!(f.has_receiver());
        f.flags |= FunctionFlags::STATIC;
        assert!(!f.has_receiver());
        assert!(!f.is_virtual());
    }
}
