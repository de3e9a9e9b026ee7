//! Statement analysis.

use quill_core::{PrimitiveKind, QuillResult, SemanticError, Span};
use quill_parser::ast::{Expr, ForStmt, FunctionDecl, IfStmt, ReturnStmt, Stmt, VarStmt};
use quill_registry::{Signature, TypeId};

use super::returns::stmt_returns;
use super::{BodyAnalyzer, BranchFacts};

impl<'a, 'c, 'ast> BodyAnalyzer<'a, 'c, 'ast> {
    pub(super) fn analyze_function(
        &mut self,
        decl: &'ast FunctionDecl<'ast>,
        signature: &Signature,
    ) -> QuillResult<()> {
        if let (true, Some(owner)) = (self.has_receiver, self.owner) {
            self.receiver = Some(self.scope.declare_hidden("self", owner, decl.span));
        }
        for (param, &ty) in decl.params.iter().zip(&signature.params) {
            let local = self.scope.declare(param.name, ty, param.span)?;
            self.body.params.push(local);
        }

        let returns = self.analyze_block(decl.body.stmts)?;
        if self.ret.is_some() && !returns {
            return Err(SemanticError::MissingReturn {
                function: self.name.clone(),
                span: decl.span,
            }
            .into());
        }
        self.body.definitely_returns = returns;
        Ok(())
    }

    /// The entry's executable statements, skipping declarations. The value
    /// of a trailing expression statement becomes the result of `main`.
    pub(super) fn analyze_entry(&mut self, stmts: &'ast [Stmt<'ast>]) -> QuillResult<()> {
        self.in_entry = true;
        let mut last = None;
        for stmt in stmts.iter().filter(|stmt| !stmt.is_declaration()) {
            self.analyze_stmt(stmt)?;
            last = Some(stmt);
        }

        if let Some(Stmt::Expr(expr)) = last {
            if let Some(ty) = self.body.type_of(expr.id()) {
                self.body.result = Some(expr.id());
                self.ret = Some(ty);
            }
        }
        Ok(())
    }

    /// Analyze `stmts` in order. Returns whether the block definitely
    /// returns.
    fn analyze_block(&mut self, stmts: &'ast [Stmt<'ast>]) -> QuillResult<bool> {
        let mut returned = false;
        for stmt in stmts {
            if returned {
                return Err(SemanticError::UnreachableCode { span: stmt.span() }.into());
            }
            returned = self.analyze_stmt(stmt)?;
        }
        Ok(returned)
    }

    /// Analyze `stmt` in a frame of its own.
    fn analyze_scoped(&mut self, stmt: &'ast Stmt<'ast>) -> QuillResult<bool> {
        self.scope.push_frame();
        let returned = self.analyze_stmt(stmt);
        self.scope.pop_frame();
        returned
    }

    fn analyze_stmt(&mut self, stmt: &'ast Stmt<'ast>) -> QuillResult<bool> {
        match stmt {
            Stmt::Expr(expr) => {
                self.analyze_expr(expr)?;
            }
            Stmt::Var(var) => self.analyze_var(var)?,
            Stmt::If(s) => return self.analyze_if(s),
            Stmt::For(s) => self.analyze_for(s)?,
            Stmt::Return(s) => self.analyze_return(s)?,
            Stmt::Body(body) => {
                self.scope.push_frame();
                let returned = self.analyze_block(body.stmts);
                self.scope.pop_frame();
                return returned;
            }
            Stmt::Function(_) | Stmt::Class(_) | Stmt::Import(_) | Stmt::ExternFunction(_) | Stmt::ExternType(_) => {
                return Err(
                    SemanticError::mismatch("declarations are only allowed at the top level", stmt.span()).into(),
                );
            }
        }
        Ok(stmt_returns(stmt))
    }

    fn analyze_var(&mut self, var: &'ast VarStmt<'ast>) -> QuillResult<()> {
        let declared = match var.ty {
            Some(ty) => Some(self.resolve_type(ty.name, ty.span)?),
            None => None,
        };
        let init = match var.init {
            Some(init) => Some(self.analyze_value(init)?),
            None => None,
        };

        let ty = match (declared, init) {
            (Some(declared), Some(init)) => {
                self.expect_castable(init, declared, var.init.map_or(var.span, Expr::span))?;
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init)) if self.registry().is_null(init) => {
                return Err(SemanticError::mismatch(
                    format!("cannot infer the type of '{}' from null", var.name),
                    var.span,
                )
                .into());
            }
            (None, Some(init)) => init,
            (None, None) => {
                return Err(SemanticError::mismatch(
                    format!("variable '{}' needs a type or an initializer", var.name),
                    var.span,
                )
                .into());
            }
        };
        let local = self.scope.declare(var.name, ty, var.span)?;
        self.body.bind(var.id, local);
        self.body.record_type(var.id, ty)?;
        Ok(())
    }

    fn analyze_if(&mut self, s: &'ast IfStmt<'ast>) -> QuillResult<bool> {
        self.expect_bool(s.condition)?;
        let then_returns = self.analyze_scoped(s.then_branch)?;
        let else_returns = match s.else_branch {
            Some(else_branch) => self.analyze_scoped(else_branch)?,
            None => false,
        };
        self.body.record_branches(
            s.id,
            BranchFacts {
                then_returns,
                else_returns,
            },
        );
        Ok(then_returns && else_returns)
    }

    fn analyze_for(&mut self, s: &'ast ForStmt<'ast>) -> QuillResult<()> {
        self.scope.push_frame();
        let analyzed = self.analyze_for_parts(s);
        self.scope.pop_frame();
        analyzed
    }

    fn analyze_for_parts(&mut self, s: &'ast ForStmt<'ast>) -> QuillResult<()> {
        if let Some(init) = s.init {
            self.analyze_stmt(init)?;
        }
        self.expect_bool(s.condition)?;
        if let Some(step) = s.step {
            self.analyze_expr(step)?;
        }
        self.analyze_scoped(s.body)?;
        Ok(())
    }

    fn analyze_return(&mut self, s: &'ast ReturnStmt<'ast>) -> QuillResult<()> {
        if self.in_entry {
            return Err(SemanticError::mismatch("'return' outside of a function", s.span).into());
        }
        match (s.value, self.ret) {
            (Some(value), Some(ret)) => {
                let ty = self.analyze_value(value)?;
                self.expect_castable(ty, ret, value.span())?;
                self.body.record_type(s.id, ret)?;
            }
            (None, None) => {}
            (Some(value), None) => {
                return Err(SemanticError::mismatch(
                    format!("'{}' returns no value", self.name),
                    value.span(),
                )
                .into());
            }
            (None, Some(ret)) => {
                return Err(SemanticError::expected(self.registry().name(ret), "void", s.span).into());
            }
        }
        Ok(())
    }

    pub(super) fn expect_bool(&mut self, expr: &'ast Expr<'ast>) -> QuillResult<()> {
        let ty = self.analyze_value(expr)?;
        let bool_ty = self.primitive(PrimitiveKind::Bool);
        if ty != bool_ty {
            return Err(SemanticError::expected("Bool", self.registry().name(ty), expr.span()).into());
        }
        Ok(())
    }

    pub(super) fn expect_castable(&self, from: TypeId, to: TypeId, span: Span) -> QuillResult<()> {
        if self.registry().castable(from, to).is_none() {
            return Err(SemanticError::expected(self.registry().name(to), self.registry().name(from), span).into());
        }
        Ok(())
    }
}
