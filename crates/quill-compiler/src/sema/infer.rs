//! Operator dispatch, casts and array element inference.
//!
//! Operators are ordinary overload resolution against native functions:
//!
//! | Operands                      | Candidates                      |
//! |-------------------------------|---------------------------------|
//! | `Bool and Bool`, `Bool or Bool` | `Bool` class functions        |
//! | two numerics                  | class functions of the wider one |
//! | `String` on the left          | `String` methods, left is the receiver |
//! | two references (`==`, `!=`)   | `Object` reference comparison   |

use quill_core::{PrimitiveKind, QuillResult, SemanticError, Span};
use quill_parser::ast::{BinaryExpr, BinaryOp, CastExpr, UnaryExpr};
use quill_registry::{FuncId, TypeId, conversion_name};

use super::BodyAnalyzer;

impl<'a, 'c, 'ast> BodyAnalyzer<'a, 'c, 'ast> {
    pub(super) fn analyze_binary(&mut self, binary: &'ast BinaryExpr<'ast>) -> QuillResult<Option<TypeId>> {
        let left = self.analyze_value(binary.left)?;
        let right = self.analyze_value(binary.right)?;
        let symbol = binary.op.symbol();

        let (candidates, args) = self.operator_candidates(binary.op, left, right, binary.span)?;
        if candidates.is_empty() {
            return Err(self.undefined_operator(symbol, left, right, binary.span).into());
        }
        let target = self.select(&candidates, &args, symbol, binary.span)?;
        self.body.record_call(binary.id, target);
        Ok(self.call_result(target))
    }

    /// Candidates for `left op right` and the argument list they are
    /// matched against.
    fn operator_candidates(
        &self,
        op: BinaryOp,
        left: TypeId,
        right: TypeId,
        span: Span,
    ) -> QuillResult<(Vec<FuncId>, Vec<TypeId>)> {
        let registry = self.registry();
        let symbol = op.symbol();
        let bool_ty = registry.primitive(PrimitiveKind::Bool);
        let string = registry.builtins().string;
        let numeric = |ty: TypeId| registry.primitive_kind(ty).filter(|kind| kind.is_numeric());

        if op.is_logical() {
            if left != bool_ty || right != bool_ty {
                return Err(SemanticError::mismatch(
                    format!(
                        "'{symbol}' expects Bool operands, found '{}' and '{}'",
                        registry.name(left),
                        registry.name(right)
                    ),
                    span,
                )
                .into());
            }
            return Ok((registry.static_candidates(bool_ty, symbol), vec![left, right]));
        }

        if left == string && matches!(op, BinaryOp::Add | BinaryOp::Equal | BinaryOp::NotEqual) {
            return Ok((registry.method_candidates(string, symbol), vec![right]));
        }

        if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
            let wider = a.wider(b).unwrap_or(a);
            let owner = registry.primitive(wider);
            return Ok((registry.static_candidates(owner, symbol), vec![left, right]));
        }

        let equality = matches!(op, BinaryOp::Equal | BinaryOp::NotEqual);
        let related = registry.castable(left, right).is_some() || registry.castable(right, left).is_some();
        if equality && registry.is_reference(left) && registry.is_reference(right) && related {
            let object = registry.builtins().object;
            return Ok((registry.static_candidates(object, symbol), vec![object, object]));
        }

        Err(self.undefined_operator(symbol, left, right, span).into())
    }

    fn undefined_operator(&self, symbol: &str, left: TypeId, right: TypeId, span: Span) -> SemanticError {
        SemanticError::mismatch(
            format!(
                "operator '{symbol}' is not defined for '{}' and '{}'",
                self.type_name(left),
                self.type_name(right)
            ),
            span,
        )
    }

    pub(super) fn analyze_unary(&mut self, unary: &'ast UnaryExpr<'ast>) -> QuillResult<Option<TypeId>> {
        let operand = self.analyze_value(unary.operand)?;
        let symbol = unary.op.symbol();
        let candidates = self.registry().static_candidates(operand, symbol);
        if candidates.is_empty() {
            return Err(SemanticError::mismatch(
                format!("cannot negate a value of type '{}'", self.type_name(operand)),
                unary.span,
            )
            .into());
        }
        let target = self.select(&candidates, &[operand], symbol, unary.span)?;
        self.body.record_call(unary.id, target);
        Ok(self.call_result(target))
    }

    /// `value as T`.
    ///
    /// Numeric casts call the conversion native of the source type and may
    /// narrow. Reference casts are checked against the hierarchy in either
    /// direction and cost nothing at run time.
    pub(super) fn analyze_cast(&mut self, cast: &'ast CastExpr<'ast>) -> QuillResult<TypeId> {
        let from = self.analyze_value(cast.expr)?;
        let to = self.resolve_type(cast.ty.name, cast.ty.span)?;
        if from == to {
            return Ok(to);
        }

        let numeric = |ty: TypeId| self.registry().primitive_kind(ty).filter(|kind| kind.is_numeric());
        if let (Some(_), Some(target)) = (numeric(from), numeric(to)) {
            let name = conversion_name(target);
            let candidates = self.registry().static_candidates(from, &name);
            let conversion = self.select(&candidates, &[from], &name, cast.span)?;
            self.body.record_call(cast.id, conversion);
            return Ok(to);
        }

        let registry = self.registry();
        let references = registry.is_reference(from) && registry.is_reference(to);
        let related = registry.castable(from, to).is_some() || registry.castable(to, from).is_some();
        if references && related {
            return Ok(to);
        }
        Err(SemanticError::mismatch(
            format!("cannot cast '{}' to '{}'", registry.name(from), registry.name(to)),
            cast.span,
        )
        .into())
    }

    /// Element type of an array literal without a written type: the nearest
    /// type every element converts to.
    pub(super) fn infer_element(&self, types: &[TypeId], span: Span) -> QuillResult<TypeId> {
        self.registry()
            .common_ancestor(types)
            .ok_or_else(|| SemanticError::mismatch("cannot infer array element type", span).into())
    }
}
