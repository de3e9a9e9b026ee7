//! Definite-return analysis.
//!
//! A statement definitely returns when every path through it ends in a
//! `return`:
//!
//! - a `return` statement
//! - a block containing a definitely-returning statement
//! - an `if` with an `else` where both branches definitely return
//!
//! Loops never count, even when their body returns: the condition may be
//! false on entry.

use quill_parser::ast::Stmt;

pub fn stmt_returns(stmt: &Stmt<'_>) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Body(body) => block_returns(body.stmts),
        Stmt::If(s) => match s.else_branch {
            Some(else_branch) => stmt_returns(s.then_branch) && stmt_returns(else_branch),
            None => false,
        },
        _ => false,
    }
}

pub fn block_returns(stmts: &[Stmt<'_>]) -> bool {
    stmts.iter().any(stmt_returns)
}
