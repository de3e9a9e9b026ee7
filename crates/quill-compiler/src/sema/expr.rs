//! Expression analysis.
//!
//! Every value-producing expression records its type in the
//! [`TypedBody`](super::TypedBody); calls and operators record the
//! overload they resolved to, and variable and field references record
//! their binding.

use quill_core::{PrimitiveKind, QuillResult, SemanticError, Span};
use quill_parser::ast::{
    ArrayLiteralExpr, AssignExpr, CallExpr, Expr, IndexExpr, LiteralExpr, LiteralKind, MemberExpr, NameExpr,
    NewArrayExpr, NewExpr,
};
use quill_registry::{FuncId, Type, TypeId};
use tracing::trace;

use super::{BodyAnalyzer, Construction, FieldRef};
use crate::overload::{has_arity, resolve_overload, try_match_candidate};

/// Where a call looks for its candidates.
#[derive(Debug, Clone, Copy)]
enum CallSite {
    /// `f(..)`: own methods and class functions first, then free functions.
    Bare,
    /// `Type.f(..)`
    Static(TypeId),
    /// `value.f(..)`
    Method(TypeId),
}

impl<'a, 'c, 'ast> BodyAnalyzer<'a, 'c, 'ast> {
    /// Analyze an expression that must produce a value.
    pub(super) fn analyze_value(&mut self, expr: &'ast Expr<'ast>) -> QuillResult<TypeId> {
        self.analyze_expr(expr)?
            .ok_or_else(|| SemanticError::mismatch("expression produces no value", expr.span()).into())
    }

    /// Analyze an expression. Returns `None` for a call to a void function.
    pub(super) fn analyze_expr(&mut self, expr: &'ast Expr<'ast>) -> QuillResult<Option<TypeId>> {
        let ty = match expr {
            Expr::Literal(lit) => Some(self.analyze_literal(lit)),
            Expr::Identifier(name) => Some(self.analyze_identifier(name)?),
            Expr::Constant(name) => {
                return Err(SemanticError::mismatch(
                    format!("type '{}' cannot be used as a value", name.name),
                    name.span,
                )
                .into());
            }
            Expr::InstanceVariableRef(name) => Some(self.analyze_instance_variable(name)?),
            Expr::Call(call) => self.analyze_call(call)?,
            Expr::MemberAccess(member) => Some(self.analyze_member(member)?),
            Expr::Assign(assign) => Some(self.analyze_assign(assign)?),
            Expr::New(new) => Some(self.analyze_new(new)?),
            Expr::NewArray(new) => Some(self.analyze_new_array(new)?),
            Expr::ArrayAccess(index) => Some(self.analyze_index(index)?),
            Expr::ArrayLiteral(lit) => Some(self.analyze_array_literal(lit)?),
            Expr::Binary(binary) => self.analyze_binary(binary)?,
            Expr::Unary(unary) => self.analyze_unary(unary)?,
            Expr::Cast(cast) => Some(self.analyze_cast(cast)?),
            Expr::SizeOf(size) => {
                let ty = self.resolve_type(size.ty.name, size.ty.span)?;
                let size_in_bytes = self.registry().size_of(ty);
                self.body.record_size(size.id, size_in_bytes);
                Some(self.primitive(PrimitiveKind::Int))
            }
        };
        if let Some(ty) = ty {
            self.body.record_type(expr.id(), ty)?;
        }
        Ok(ty)
    }

    fn analyze_literal(&mut self, lit: &LiteralExpr<'ast>) -> TypeId {
        let kind = match lit.kind {
            LiteralKind::Int(value) if i32::try_from(value).is_ok() => PrimitiveKind::Int,
            LiteralKind::Int(_) => PrimitiveKind::Long,
            LiteralKind::Double(_) => PrimitiveKind::Double,
            LiteralKind::Bool(_) => PrimitiveKind::Bool,
            LiteralKind::Null => PrimitiveKind::Null,
            LiteralKind::Str(_) => return self.registry().builtins().string,
        };
        self.primitive(kind)
    }

    fn analyze_identifier(&mut self, name: &NameExpr<'ast>) -> QuillResult<TypeId> {
        let (local, ty) = self
            .scope
            .lookup(name.name)
            .ok_or_else(|| SemanticError::undefined("variable", name.name, name.span))?;
        self.body.bind(name.id, local);
        Ok(ty)
    }

    fn analyze_instance_variable(&mut self, name: &NameExpr<'ast>) -> QuillResult<TypeId> {
        let owner = match (self.receiver, self.owner) {
            (Some(_), Some(owner)) => owner,
            _ => {
                return Err(SemanticError::mismatch(
                    format!("'@{}' used outside of an instance method", name.name),
                    name.span,
                )
                .into());
            }
        };
        let (slot, ty) = self
            .registry()
            .field_slot(owner, name.name)
            .ok_or_else(|| SemanticError::undefined("instance variable", format!("@{}", name.name), name.span))?;
        self.body.record_field(name.id, FieldRef { slot, ty });
        Ok(ty)
    }

    fn analyze_member(&mut self, member: &'ast MemberExpr<'ast>) -> QuillResult<TypeId> {
        let object = self.analyze_value(member.object)?;
        if self.registry().object(object).is_none() {
            return Err(SemanticError::mismatch(
                format!("'{}' has no fields", self.type_name(object)),
                member.span,
            )
            .into());
        }
        let (slot, ty) = self
            .registry()
            .field_slot(object, member.field)
            .ok_or_else(|| SemanticError::undefined("field", member.field, member.span))?;
        self.body.record_field(member.id, FieldRef { slot, ty });
        Ok(ty)
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    fn analyze_call(&mut self, call: &'ast CallExpr<'ast>) -> QuillResult<Option<TypeId>> {
        let site = match call.receiver {
            None => CallSite::Bare,
            Some(Expr::Constant(name)) => CallSite::Static(self.resolve_type(name.name, name.span)?),
            Some(receiver) => {
                let ty = self.analyze_value(receiver)?;
                if self.registry().is_null(ty) {
                    return Err(SemanticError::mismatch(
                        format!("cannot call '{}' on null", call.name),
                        receiver.span(),
                    )
                    .into());
                }
                CallSite::Method(ty)
            }
        };
        let arg_types = self.analyze_args(call.args)?;

        let candidates = self.call_candidates(site, call.name);
        if candidates.is_empty() {
            let what = match site {
                CallSite::Method(_) => "method",
                _ => "function",
            };
            return Err(SemanticError::undefined(what, call.name, call.span).into());
        }
        let target = self.select(&candidates, &arg_types, call.name, call.span)?;
        self.body.record_call(call.id, target);
        trace!(call = call.name, target = %self.registry().canonical_name(target), "resolved call");
        Ok(self.call_result(target))
    }

    fn call_candidates(&self, site: CallSite, name: &str) -> Vec<FuncId> {
        let registry = self.registry();
        match site {
            CallSite::Static(owner) => registry.static_candidates(owner, name),
            CallSite::Method(receiver) => registry.method_candidates(receiver, name),
            CallSite::Bare => {
                let mut candidates = Vec::new();
                if let Some(owner) = self.owner {
                    if self.receiver.is_some() {
                        candidates.extend(registry.method_candidates(owner, name));
                    }
                    candidates.extend(registry.static_candidates(owner, name));
                }
                if candidates.is_empty() {
                    candidates = registry.global_candidates(name);
                }
                candidates
            }
        }
    }

    pub(super) fn analyze_args(&mut self, args: &'ast [Expr<'ast>]) -> QuillResult<Vec<TypeId>> {
        args.iter().map(|arg| self.analyze_value(arg)).collect()
    }

    /// Pick the overload of `name` for `arg_types` and demand its body.
    pub(super) fn select(
        &mut self,
        candidates: &[FuncId],
        arg_types: &[TypeId],
        name: &str,
        span: Span,
    ) -> QuillResult<FuncId> {
        let mut sized = Vec::with_capacity(candidates.len());
        for &candidate in candidates {
            if has_arity(self.registry(), candidate, arg_types.len()) {
                self.analyzer.resolve_prototype(candidate)?;
                sized.push(candidate);
            }
        }
        let best = resolve_overload(&sized, arg_types, self.registry(), name, span)?;
        self.analyzer.demand(best.func);
        Ok(best.func)
    }

    /// Return type of a resolved call.
    pub(super) fn call_result(&self, target: FuncId) -> Option<TypeId> {
        self.registry()
            .function(target)
            .signature
            .as_ref()
            .and_then(|signature| signature.ret)
    }

    // ==========================================================================
    // Assignment
    // ==========================================================================

    fn analyze_assign(&mut self, assign: &'ast AssignExpr<'ast>) -> QuillResult<TypeId> {
        if let Expr::Identifier(name) = assign.target {
            return self.assign_variable(name, assign.value);
        }
        if !assign.target.is_assignable() {
            return Err(SemanticError::mismatch("invalid assignment target", assign.target.span()).into());
        }
        let target = self.analyze_value(assign.target)?;
        let value = self.analyze_value(assign.value)?;
        self.expect_castable(value, target, assign.value.span())?;
        Ok(target)
    }

    /// `name = value`; an unbound name is declared with the value's type.
    fn assign_variable(&mut self, name: &NameExpr<'ast>, value: &'ast Expr<'ast>) -> QuillResult<TypeId> {
        let value_ty = self.analyze_value(value)?;
        let (local, ty) = match self.scope.lookup(name.name) {
            Some((local, ty)) => {
                self.expect_castable(value_ty, ty, value.span())?;
                (local, ty)
            }
            None if self.registry().is_null(value_ty) => {
                return Err(SemanticError::mismatch(
                    format!("cannot infer the type of '{}' from null", name.name),
                    name.span,
                )
                .into());
            }
            None => (self.scope.declare(name.name, value_ty, name.span)?, value_ty),
        };
        self.body.bind(name.id, local);
        self.body.record_type(name.id, ty)?;
        Ok(ty)
    }

    // ==========================================================================
    // Allocation
    // ==========================================================================

    fn analyze_new(&mut self, new: &'ast NewExpr<'ast>) -> QuillResult<TypeId> {
        let ty = self.resolve_type(new.ty.name, new.ty.span)?;
        let arg_types = self.analyze_args(new.args)?;
        let constructors = self.registry().constructors(ty);

        let init = match self.registry().ty(ty) {
            Type::Pointer(_) => Some(self.select(&constructors, &arg_types, "init", new.span)?),
            Type::Object(_) => {
                let init = self.select_constructor(&constructors, &arg_types, ty, new.span)?;
                self.analyzer.construct(ty);
                init
            }
            _ => {
                return Err(SemanticError::mismatch(
                    format!("cannot instantiate '{}'", self.type_name(ty)),
                    new.span,
                )
                .into());
            }
        };
        self.body.record_construction(new.id, Construction { class: ty, init });
        Ok(ty)
    }

    /// `None` when no `init` overload accepts the arguments; the object is
    /// then left zero-initialized. A tie between viable overloads is still
    /// ambiguous.
    fn select_constructor(
        &mut self,
        constructors: &[FuncId],
        arg_types: &[TypeId],
        class: TypeId,
        span: Span,
    ) -> QuillResult<Option<FuncId>> {
        let mut sized = Vec::with_capacity(constructors.len());
        for &candidate in constructors {
            if has_arity(self.registry(), candidate, arg_types.len()) {
                self.analyzer.resolve_prototype(candidate)?;
                sized.push(candidate);
            }
        }
        let viable = sized
            .iter()
            .any(|&candidate| try_match_candidate(candidate, arg_types, self.registry()).is_some());
        if !viable {
            trace!(class = %self.type_name(class), "no matching init, zero-initialized");
            return Ok(None);
        }
        let name = format!("{}.init", self.type_name(class));
        let best = resolve_overload(&sized, arg_types, self.registry(), &name, span)?;
        self.analyzer.demand(best.func);
        Ok(Some(best.func))
    }

    fn analyze_new_array(&mut self, new: &'ast NewArrayExpr<'ast>) -> QuillResult<TypeId> {
        let element = self.resolve_type(new.element.name, new.element.span)?;
        self.expect_index(new.length)?;
        Ok(self.registry_mut().array_of(element))
    }

    fn analyze_index(&mut self, index: &'ast IndexExpr<'ast>) -> QuillResult<TypeId> {
        let array = self.analyze_value(index.array)?;
        let Type::Array(element) = *self.registry().ty(array) else {
            return Err(SemanticError::mismatch(
                format!("cannot index into '{}'", self.type_name(array)),
                index.array.span(),
            )
            .into());
        };
        self.expect_index(index.index)?;
        Ok(element)
    }

    fn expect_index(&mut self, expr: &'ast Expr<'ast>) -> QuillResult<()> {
        let ty = self.analyze_value(expr)?;
        let int = self.primitive(PrimitiveKind::Int);
        self.expect_castable(ty, int, expr.span())
    }

    fn analyze_array_literal(&mut self, lit: &'ast ArrayLiteralExpr<'ast>) -> QuillResult<TypeId> {
        let types = self.analyze_args(lit.elements)?;
        let element = match lit.element {
            Some(written) => {
                let element = self.resolve_type(written.name, written.span)?;
                for (&ty, expr) in types.iter().zip(lit.elements) {
                    self.expect_castable(ty, element, expr.span())?;
                }
                element
            }
            None => self.infer_element(&types, lit.span)?,
        };
        Ok(self.registry_mut().array_of(element))
    }

    pub(super) fn render_types(&self, types: &[TypeId]) -> String {
        types
            .iter()
            .map(|&ty| self.registry().name(ty))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_core::{PrimitiveKind, QuillError, SemanticError};
    use quill_parser::Parser;
    use quill_parser::ast::{Expr, Stmt};

    use crate::context::CompilationContext;
    use crate::sema::{Analyzer, SourceFile};

    fn with_analysis(source: &str, check: impl FnOnce(&CompilationContext<'_>, &[Stmt<'_>])) {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let mut ctx = CompilationContext::new();
        Analyzer::new(&mut ctx)
            .analyze(
                &[],
                SourceFile {
                    path: "main.ql",
                    stmts: script.stmts(),
                },
            )
            .unwrap();
        check(&ctx, script.stmts());
    }

    fn semantic(source: &str) -> SemanticError {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let mut ctx = CompilationContext::new();
        let result = Analyzer::new(&mut ctx).analyze(
            &[],
            SourceFile {
                path: "main.ql",
                stmts: script.stmts(),
            },
        );
        match result {
            Err(QuillError::Semantic(err)) => err,
            other => panic!("expected a semantic error, got {other:?}"),
        }
    }

    fn last_expr<'a>(stmts: &[Stmt<'a>]) -> Expr<'a> {
        match stmts.last() {
            Some(Stmt::Expr(expr)) => **expr,
            other => panic!("expected a trailing expression, got {other:?}"),
        }
    }

    #[test]
    fn mixed_arithmetic_widens() {
        with_analysis("3 + 2.5", |ctx, stmts| {
            let registry = ctx.registry();
            let main = ctx.entry().unwrap();
            let body = ctx.typed_body(main).unwrap();
            let expr = last_expr(stmts);
            assert_eq!(body.type_of(expr.id()), Some(registry.primitive(PrimitiveKind::Double)));
            let op = body.call(expr.id()).unwrap();
            assert_eq!(registry.canonical_name(op), "Double.+(Double,Double)");
        });
    }

    #[test]
    fn large_literals_are_long() {
        with_analysis("4000000000", |ctx, stmts| {
            let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
            let long = ctx.registry().primitive(PrimitiveKind::Long);
            assert_eq!(body.type_of(last_expr(stmts).id()), Some(long));
        });
    }

    #[test]
    fn assignment_declares_and_updates() {
        with_analysis("var x = 10 x = x + 5 x", |ctx, stmts| {
            let main = ctx.entry().unwrap();
            let body = ctx.typed_body(main).unwrap();
            let int = ctx.registry().primitive(PrimitiveKind::Int);
            assert_eq!(body.result(), Some(last_expr(stmts).id()));
            assert_eq!(ctx.registry().function(main).signature.as_ref().unwrap().ret, Some(int));
            assert_eq!(body.locals().len(), 1);
        });
    }

    #[test]
    fn implicit_declaration_by_assignment() {
        with_analysis("total = 2\ntotal = total * 3\ntotal", |ctx, _| {
            let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
            assert_eq!(body.locals().len(), 1);
            assert_eq!(body.locals()[0].name, "total");
        });
    }

    #[test]
    fn field_access_resolves_slots() {
        with_analysis(
            "class Base { var a: Int }  class Foo < Base { var b: Int }\nvar f = new Foo\nf.b = 7\nf.b",
            |ctx, stmts| {
                let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
                let field = body.field(last_expr(stmts).id()).unwrap();
                assert_eq!(field.slot, 1);
                let foo = ctx.registry().lookup("Foo").unwrap();
                assert!(ctx.constructed().any(|class| class == foo));
            },
        );
    }

    #[test]
    fn array_literal_infers_common_ancestor() {
        with_analysis(
            "class Animal {}  class Dog < Animal {}  class Cat < Animal {}\n[new Dog, new Cat]",
            |ctx, stmts| {
                let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
                let ty = body.type_of(last_expr(stmts).id()).unwrap();
                assert_eq!(ctx.registry().name(ty), "Animal[]");
            },
        );
        with_analysis("[1, 2.5]", |ctx, stmts| {
            let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
            let ty = body.type_of(last_expr(stmts).id()).unwrap();
            assert_eq!(ctx.registry().name(ty), "Double[]");
        });
    }

    #[test]
    fn string_concatenation_uses_string_methods() {
        with_analysis("\"n = \" + 4", |ctx, stmts| {
            let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
            let op = body.call(last_expr(stmts).id()).unwrap();
            assert_eq!(ctx.registry().canonical_name(op), "String.+(Int)");
        });
    }

    #[test]
    fn undefined_variable() {
        let err = semantic("print(y)");
        assert!(matches!(err, SemanticError::UndefinedSymbol { what: "variable", ref name, .. } if name == "y"));
    }

    #[test]
    fn no_matching_overload_names_arguments() {
        let err = semantic("def f(x: Int) {}\nf(\"s\")");
        assert!(matches!(err, SemanticError::UndefinedSymbol { ref name, .. } if name == "f(String)"));
    }

    #[test]
    fn ambiguous_call_is_reported() {
        let err = semantic("def f(a: Long, b: Int) {}\ndef f(a: Int, b: Long) {}\nf(1, 1)");
        assert!(matches!(err, SemanticError::AmbiguousOverload { ref candidates, .. } if candidates.len() == 2));
    }

    #[test]
    fn unmatched_constructor_leaves_no_target() {
        with_analysis("class P { def init(x: Int) {} }\nnew P(\"s\")", |ctx, stmts| {
            let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
            let construction = body.construction(last_expr(stmts).id()).unwrap();
            assert_eq!(construction.init, None);
        });
    }

    #[test]
    fn inherited_init_is_not_a_constructor() {
        with_analysis(
            "class A { var x: Int  def init(x: Int) { @x = x } }\nclass B < A {}\nnew B(3)",
            |ctx, stmts| {
                let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
                let construction = body.construction(last_expr(stmts).id()).unwrap();
                assert_eq!(construction.init, None);
            },
        );
    }

    #[test]
    fn ambiguous_constructor_fails() {
        let err = semantic("class P { def init(a: Long, b: Int) {}  def init(a: Int, b: Long) {} }\nnew P(1, 2)");
        assert!(matches!(err, SemanticError::AmbiguousOverload { .. }));
    }

    #[test]
    fn constructor_may_be_skipped_without_arguments() {
        with_analysis("class P { var x: Int  def init(x: Int) { @x = x } }\nnew P", |ctx, stmts| {
            let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
            let construction = body.construction(last_expr(stmts).id()).unwrap();
            assert_eq!(construction.init, None);
        });
    }

    #[test]
    fn instance_variable_outside_method_fails() {
        let err = semantic("@x");
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn static_call_on_class() {
        with_analysis(
            "class M { static def twice(x: Int) -> Int { return x * 2 } }\nM.twice(4)",
            |ctx, stmts| {
                let body = ctx.typed_body(ctx.entry().unwrap()).unwrap();
                let target = body.call(last_expr(stmts).id()).unwrap();
                assert_eq!(ctx.registry().canonical_name(target), "M.twice(Int)");
                assert!(ctx.typed_body(target).is_some());
            },
        );
    }
}
