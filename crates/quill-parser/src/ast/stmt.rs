//! Statement and declaration AST nodes.

use quill_core::Span;

use super::expr::Expr;
use super::{NodeId, TypeRef};

/// A statement. Declarations are statements too; the parser only accepts
/// them at the top level of a file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    Expr(&'ast Expr<'ast>),
    Var(&'ast VarStmt<'ast>),
    If(&'ast IfStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    Return(&'ast ReturnStmt<'ast>),
    Body(&'ast Body<'ast>),
    Function(&'ast FunctionDecl<'ast>),
    Class(&'ast ClassDecl<'ast>),
    Import(&'ast ImportDecl<'ast>),
    ExternFunction(&'ast ExternFunctionDecl<'ast>),
    ExternType(&'ast ExternTypeDecl<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span(),
            Stmt::Var(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Body(s) => s.span,
            Stmt::Function(s) => s.span,
            Stmt::Class(s) => s.span,
            Stmt::Import(s) => s.span,
            Stmt::ExternFunction(s) => s.span,
            Stmt::ExternType(s) => s.span,
        }
    }

    /// Declarations are hoisted out of the statement order.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Stmt::Function(_) | Stmt::Class(_) | Stmt::Import(_) | Stmt::ExternFunction(_) | Stmt::ExternType(_)
        )
    }
}

/// `var name [: Type] [= init]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarStmt<'ast> {
    pub name: &'ast str,
    pub ty: Option<TypeRef<'ast>>,
    pub init: Option<&'ast Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// `if (cond) then [else otherwise]`. `elseif` chains nest in `otherwise`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_branch: &'ast Stmt<'ast>,
    pub else_branch: Option<&'ast Stmt<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// `for (cond) body` or `for (init; cond; step) body`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub init: Option<&'ast Stmt<'ast>>,
    pub condition: &'ast Expr<'ast>,
    pub step: Option<&'ast Expr<'ast>>,
    pub body: &'ast Stmt<'ast>,
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// A braced block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// A parameter of a function or extern function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub name: &'ast str,
    pub ty: TypeRef<'ast>,
    pub span: Span,
}

/// `[static] def name(params) [-> Ret] { body }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub name: &'ast str,
    pub params: &'ast [Param<'ast>],
    pub return_type: Option<TypeRef<'ast>>,
    pub body: &'ast Body<'ast>,
    pub is_static: bool,
    pub id: NodeId,
    pub span: Span,
}

/// `var name: Type` inside a class body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDecl<'ast> {
    pub name: &'ast str,
    pub ty: TypeRef<'ast>,
    pub span: Span,
}

/// `class Name<T, U> < Super { fields and methods }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub name: &'ast str,
    pub generic_params: &'ast [&'ast str],
    pub superclass: Option<TypeRef<'ast>>,
    pub fields: &'ast [FieldDecl<'ast>],
    /// Instance methods, constructors and static functions in declaration order.
    pub methods: &'ast [FunctionDecl<'ast>],
    pub id: NodeId,
    pub span: Span,
}

/// `import "path"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportDecl<'ast> {
    pub path: &'ast str,
    pub span: Span,
}

/// `extern def name(params) [-> Ret]`: a function provided by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternFunctionDecl<'ast> {
    pub name: &'ast str,
    pub params: &'ast [Param<'ast>],
    pub return_type: Option<TypeRef<'ast>>,
    pub span: Span,
}

/// `extern type Name`: an opaque host type, only usable behind pointers
/// and extern signatures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternTypeDecl<'ast> {
    pub name: &'ast str,
    pub span: Span,
}
