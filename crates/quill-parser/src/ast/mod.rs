//! Abstract Syntax Tree for Quill.
//!
//! This module provides:
//! - AST node definitions ([`Expr`], [`Stmt`] and the declarations)
//! - Operators and binding powers ([`BinaryOp`], [`UnaryOp`])
//! - The [`Parser`] transforming tokens into a [`Script`]

pub mod expr;
pub mod ops;
pub mod stmt;

mod expr_parser;
mod parser;
mod stmt_parser;
mod type_parser;

pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;

use quill_core::Span;
use std::fmt;

/// Parser-assigned identity of a node, unique within one source file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A written type such as `Int`, `Box<T>` or `Map<K, List<V>>[]`.
///
/// The parser stores the canonical rendered name (arguments separated by
/// `", "`); the registry parses it again when resolving, which lets generic
/// templates substitute parameters by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

/// A parsed Quill source file.
///
/// All nodes borrow from the arena passed to [`Parser::parse`].
#[derive(Debug)]
pub struct Script<'ast> {
    stmts: &'ast [Stmt<'ast>],
    node_count: u32,
}

impl<'ast> Script<'ast> {
    pub(crate) fn new(stmts: &'ast [Stmt<'ast>], node_count: u32) -> Self {
        Self { stmts, node_count }
    }

    /// Top-level statements and declarations in source order.
    pub fn stmts(&self) -> &'ast [Stmt<'ast>] {
        self.stmts
    }

    /// Number of node ids handed out; every id is below this.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }
}
