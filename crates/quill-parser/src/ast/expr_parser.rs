//! Expression parsing using Pratt parsing.
//!
//! Postfix `(` and `[` must start on the same line as the expression they
//! extend. Statements are separated by whitespace alone, so this is what
//! keeps `x` followed by a new line starting with `[1, 2]` two statements.

use ordered_float::OrderedFloat;
use quill_core::{ParseError, ParseErrorKind};

use super::expr::*;
use super::ops::{ASSIGN_BP, BinaryOp, CAST_BP, POSTFIX_BP, UnaryOp};
use super::parser::Parser;
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse an expression whose operators bind at least as tight as `min_bp`.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Dot => {
                    if POSTFIX_BP < min_bp {
                        break;
                    }
                    lhs = self.parse_member(lhs)?;
                }
                TokenKind::LeftParen if self.on_same_line() => {
                    if POSTFIX_BP < min_bp {
                        break;
                    }
                    lhs = self.parse_free_call(lhs)?;
                }
                TokenKind::LeftBracket if self.on_same_line() => {
                    if POSTFIX_BP < min_bp {
                        break;
                    }
                    self.advance();
                    let index = self.parse_expr(0)?;
                    self.expect(TokenKind::RightBracket)?;
                    let span = self.span_from(lhs.span());
                    let id = self.next_id();
                    lhs = self.alloc_expr(Expr::ArrayAccess(self.arena.alloc(IndexExpr {
                        array: lhs,
                        index,
                        id,
                        span,
                    })));
                }
                TokenKind::As => {
                    if CAST_BP < min_bp {
                        break;
                    }
                    self.advance();
                    let ty = self.parse_type()?;
                    let span = self.span_from(lhs.span());
                    let id = self.next_id();
                    lhs = self.alloc_expr(Expr::Cast(self.arena.alloc(CastExpr {
                        expr: lhs,
                        ty,
                        id,
                        span,
                    })));
                }
                TokenKind::Equal => {
                    let (l_bp, r_bp) = ASSIGN_BP;
                    if l_bp < min_bp {
                        break;
                    }
                    if !lhs.is_assignable() {
                        return Err(ParseError::new(
                            ParseErrorKind::UnexpectedToken,
                            token.span,
                            "left side of '=' is not assignable",
                        ));
                    }
                    self.advance();
                    let value = self.parse_expr(r_bp)?;
                    let span = lhs.span().to(value.span());
                    let id = self.next_id();
                    lhs = self.alloc_expr(Expr::Assign(self.arena.alloc(AssignExpr {
                        target: lhs,
                        value,
                        id,
                        span,
                    })));
                }
                kind => {
                    let Some(op) = BinaryOp::from_token(kind) else {
                        break;
                    };
                    let (l_bp, r_bp) = op.binding_power();
                    if l_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let right = self.parse_expr(r_bp)?;
                    let span = lhs.span().to(right.span());
                    let id = self.next_id();
                    lhs = self.alloc_expr(Expr::Binary(self.arena.alloc(BinaryExpr {
                        left: lhs,
                        op,
                        right,
                        id,
                        span,
                    })));
                }
            }
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = self.peek();
        let literal = |kind| LiteralExpr {
            kind,
            id: super::NodeId(0),
            span: token.span,
        };

        let expr = match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.span,
                        format!("integer literal '{}' is out of range", token.lexeme),
                    )
                })?;
                self.literal(literal(LiteralKind::Int(value)))
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.span,
                        format!("invalid float literal '{}'", token.lexeme),
                    )
                })?;
                self.literal(literal(LiteralKind::Double(OrderedFloat(value))))
            }
            TokenKind::StringLiteral => {
                self.advance();
                self.literal(literal(LiteralKind::Str(token.lexeme)))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                self.literal(literal(LiteralKind::Bool(token.kind == TokenKind::True)))
            }
            TokenKind::Null => {
                self.advance();
                self.literal(literal(LiteralKind::Null))
            }
            TokenKind::Identifier => {
                self.advance();
                let id = self.next_id();
                Expr::Identifier(self.arena.alloc(NameExpr {
                    name: token.lexeme,
                    id,
                    span: token.span,
                }))
            }
            TokenKind::Constant => {
                self.advance();
                if self.check(TokenKind::LeftBracket) && self.on_same_line() {
                    let element = super::TypeRef {
                        name: token.lexeme,
                        span: token.span,
                    };
                    return self.parse_array_literal(Some(element), token.span);
                }
                let id = self.next_id();
                Expr::Constant(self.arena.alloc(NameExpr {
                    name: token.lexeme,
                    id,
                    span: token.span,
                }))
            }
            TokenKind::At => {
                self.advance();
                let name = self.expect_identifier()?;
                let id = self.next_id();
                Expr::InstanceVariableRef(self.arena.alloc(NameExpr {
                    name: name.lexeme,
                    id,
                    span: token.span.to(name.span),
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => return self.parse_array_literal(None, token.span),
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr(UnaryOp::binding_power())?;
                let span = token.span.to(operand.span());
                let id = self.next_id();
                Expr::Unary(self.arena.alloc(UnaryExpr {
                    op: UnaryOp::Neg,
                    operand,
                    id,
                    span,
                }))
            }
            TokenKind::New => return self.parse_new(),
            TokenKind::Sizeof => {
                self.advance();
                self.expect(TokenKind::LeftParen)?;
                let ty = self.parse_type()?;
                self.expect(TokenKind::RightParen)?;
                let span = self.span_from(token.span);
                let id = self.next_id();
                Expr::SizeOf(self.arena.alloc(SizeOfExpr { ty, id, span }))
            }
            TokenKind::Reserved => return Err(self.reserved_error(token)),
            TokenKind::Eof => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEof,
                    token.span,
                    "expected expression",
                ));
            }
            _ => return Err(ParseError::expected_expression(token.span, &token.describe())),
        };

        Ok(self.alloc_expr(expr))
    }

    fn literal(&mut self, mut literal: LiteralExpr<'ast>) -> Expr<'ast> {
        literal.id = self.next_id();
        Expr::Literal(self.arena.alloc(literal))
    }

    #[inline]
    fn alloc_expr(&self, expr: Expr<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(expr)
    }

    /// `( expr, ... )` with the opening paren as the current token.
    fn parse_args(&mut self) -> Result<&'ast [Expr<'ast>], ParseError> {
        self.expect(TokenKind::LeftParen)?;
        self.parse_expr_list(TokenKind::RightParen)
    }

    /// Comma separated expressions up to and including `close`.
    fn parse_expr_list(&mut self, close: TokenKind) -> Result<&'ast [Expr<'ast>], ParseError> {
        let mut items = Vec::new();
        if self.eat(close).is_none() {
            loop {
                items.push(*self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_some() {
                    continue;
                }
                self.expect(close)?;
                break;
            }
        }
        Ok(self.arena.alloc_slice_copy(&items))
    }

    /// `receiver.name` or `receiver.name(args)`.
    fn parse_member(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.advance(); // '.'
        let name = self.expect_identifier()?;

        if self.check(TokenKind::LeftParen) && self.on_same_line() {
            let args = self.parse_args()?;
            let span = self.span_from(object.span());
            let id = self.next_id();
            return Ok(self.alloc_expr(Expr::Call(self.arena.alloc(CallExpr {
                receiver: Some(object),
                name: name.lexeme,
                args,
                id,
                span,
            }))));
        }

        let span = object.span().to(name.span);
        let id = self.next_id();
        Ok(self.alloc_expr(Expr::MemberAccess(self.arena.alloc(MemberExpr {
            object,
            field: name.lexeme,
            id,
            span,
        }))))
    }

    /// `name(args)`: only a bare identifier can be called directly.
    fn parse_free_call(&mut self, callee: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        let Expr::Identifier(name) = callee else {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                self.peek().span,
                "only named functions can be called",
            ));
        };
        let args = self.parse_args()?;
        let span = self.span_from(name.span);
        let id = self.next_id();
        Ok(self.alloc_expr(Expr::Call(self.arena.alloc(CallExpr {
            receiver: None,
            name: name.name,
            args,
            id,
            span,
        }))))
    }

    /// `[a, b]` or, after the element type has been consumed, `T[a, b]`.
    fn parse_array_literal(
        &mut self,
        element: Option<super::TypeRef<'ast>>,
        start: quill_core::Span,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftBracket)?;
        let elements = self.parse_expr_list(TokenKind::RightBracket)?;
        let span = self.span_from(start);
        let id = self.next_id();
        Ok(self.alloc_expr(Expr::ArrayLiteral(self.arena.alloc(ArrayLiteralExpr {
            element,
            elements,
            id,
            span,
        }))))
    }

    /// `new T`, `new T(args)`, `new T[length]`.
    fn parse_new(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.advance().span;
        let base = self.parse_type_base()?;

        let mut rendered = bumpalo::collections::String::from_str_in(base.name, self.arena);
        while self.check(TokenKind::LeftBracket) && self.on_same_line() {
            self.advance();
            if self.eat(TokenKind::RightBracket).is_some() {
                rendered.push_str("[]");
                continue;
            }
            let element = super::TypeRef {
                name: rendered.into_bump_str(),
                span: self.span_from(base.span),
            };
            let length = self.parse_expr(0)?;
            self.expect(TokenKind::RightBracket)?;
            let span = self.span_from(start);
            let id = self.next_id();
            return Ok(self.alloc_expr(Expr::NewArray(self.arena.alloc(NewArrayExpr {
                element,
                length,
                id,
                span,
            }))));
        }

        let ty = super::TypeRef {
            name: rendered.into_bump_str(),
            span: self.span_from(base.span),
        };
        let args: &'ast [Expr<'ast>] = if self.check(TokenKind::LeftParen) && self.on_same_line() {
            self.parse_args()?
        } else {
            &[]
        };
        let span = self.span_from(start);
        let id = self.next_id();
        Ok(self.alloc_expr(Expr::New(self.arena.alloc(NewExpr { ty, args, id, span }))))
    }
}
