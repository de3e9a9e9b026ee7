//! Expression AST nodes.
//!
//! Every node carries a [`NodeId`] (unique within its source file) and a
//! [`Span`]. The analyzer records the resolved type of a node in a side
//! table keyed by the id, never on the node itself, so a generic class body
//! can be typed once per instantiation.

use ordered_float::OrderedFloat;
use quill_core::Span;

use super::ops::{BinaryOp, UnaryOp};
use super::{NodeId, TypeRef};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    Literal(&'ast LiteralExpr<'ast>),
    /// Lowercase name: a variable.
    Identifier(&'ast NameExpr<'ast>),
    /// Capitalized name: a type used as a value (static call receiver).
    Constant(&'ast NameExpr<'ast>),
    /// `@name`: a field of the enclosing method's receiver.
    InstanceVariableRef(&'ast NameExpr<'ast>),
    Call(&'ast CallExpr<'ast>),
    MemberAccess(&'ast MemberExpr<'ast>),
    Assign(&'ast AssignExpr<'ast>),
    New(&'ast NewExpr<'ast>),
    NewArray(&'ast NewArrayExpr<'ast>),
    ArrayAccess(&'ast IndexExpr<'ast>),
    ArrayLiteral(&'ast ArrayLiteralExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Cast(&'ast CastExpr<'ast>),
    SizeOf(&'ast SizeOfExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Identifier(e) | Self::Constant(e) | Self::InstanceVariableRef(e) => e.span,
            Self::Call(e) => e.span,
            Self::MemberAccess(e) => e.span,
            Self::Assign(e) => e.span,
            Self::New(e) => e.span,
            Self::NewArray(e) => e.span,
            Self::ArrayAccess(e) => e.span,
            Self::ArrayLiteral(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Cast(e) => e.span,
            Self::SizeOf(e) => e.span,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Self::Literal(e) => e.id,
            Self::Identifier(e) | Self::Constant(e) | Self::InstanceVariableRef(e) => e.id,
            Self::Call(e) => e.id,
            Self::MemberAccess(e) => e.id,
            Self::Assign(e) => e.id,
            Self::New(e) => e.id,
            Self::NewArray(e) => e.id,
            Self::ArrayAccess(e) => e.id,
            Self::ArrayLiteral(e) => e.id,
            Self::Binary(e) => e.id,
            Self::Unary(e) => e.id,
            Self::Cast(e) => e.id,
            Self::SizeOf(e) => e.id,
        }
    }

    /// Whether this expression may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_) | Self::InstanceVariableRef(_) | Self::MemberAccess(_) | Self::ArrayAccess(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind<'ast> {
    Int(i64),
    Double(OrderedFloat<f64>),
    Bool(bool),
    /// Unescaped contents.
    Str(&'ast str),
    Null,
}

/// A bare name: identifier, type constant or `@field`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameExpr<'ast> {
    pub name: &'ast str,
    pub id: NodeId,
    pub span: Span,
}

/// `name(args)` or `receiver.name(args)`.
///
/// A [`Expr::Constant`] receiver makes this a static (class function) call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub receiver: Option<&'ast Expr<'ast>>,
    pub name: &'ast str,
    pub args: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
}

/// `object.field`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub field: &'ast str,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: &'ast Expr<'ast>,
    pub value: &'ast Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `new T(args)`, or `new T` which passes no arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewExpr<'ast> {
    pub ty: TypeRef<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
}

/// `new T[length]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewArrayExpr<'ast> {
    pub element: TypeRef<'ast>,
    pub length: &'ast Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `array[index]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub array: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `[a, b]` or `T[a, b]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayLiteralExpr<'ast> {
    pub element: Option<TypeRef<'ast>>,
    pub elements: &'ast [Expr<'ast>],
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `expr as Type`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub ty: TypeRef<'ast>,
    pub id: NodeId,
    pub span: Span,
}

/// `sizeof(Type)`: the storage width of a value of that type in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeOfExpr<'ast> {
    pub ty: TypeRef<'ast>,
    pub id: NodeId,
    pub span: Span,
}
