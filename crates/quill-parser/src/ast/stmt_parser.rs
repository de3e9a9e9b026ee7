//! Statement and declaration parsing.

use quill_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use super::stmt::*;
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// A top-level item: a declaration or a statement.
    pub(super) fn parse_top_level(&mut self) -> Result<Stmt<'ast>, ParseError> {
        match self.peek().kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::Extern => self.parse_extern(),
            TokenKind::Class => Ok(Stmt::Class(self.parse_class()?)),
            TokenKind::Def => {
                let function = self.parse_function(false)?;
                Ok(Stmt::Function(self.arena.alloc(function)))
            }
            TokenKind::Static => Err(ParseError::new(
                ParseErrorKind::InvalidStatement,
                self.peek().span,
                "'static' is only valid inside a class body",
            )),
            _ => self.parse_statement(),
        }
    }

    /// A statement inside a block (or at the top level).
    pub(super) fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Var => Ok(Stmt::Var(self.parse_var()?)),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LeftBrace => Ok(Stmt::Body(self.parse_body()?)),
            TokenKind::Def | TokenKind::Class | TokenKind::Import | TokenKind::Extern | TokenKind::Static => {
                Err(ParseError::new(
                    ParseErrorKind::InvalidStatement,
                    token.span,
                    format!("'{}' declarations are only allowed at the top level", token.lexeme),
                ))
            }
            TokenKind::Reserved => Err(self.reserved_error(token)),
            _ => Ok(Stmt::Expr(self.parse_expr(0)?)),
        }
    }

    #[inline]
    fn alloc_stmt(&self, stmt: Stmt<'ast>) -> &'ast Stmt<'ast> {
        self.arena.alloc(stmt)
    }

    pub(super) fn parse_body(&mut self) -> Result<&'ast Body<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut stmts = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon).is_some() {}
            if self.eat(TokenKind::RightBrace).is_some() {
                break;
            }
            if self.is_eof() {
                return Err(self.error_expected("'}'"));
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(self.arena.alloc(Body {
            stmts: self.arena.alloc_slice_copy(&stmts),
            span: self.span_from(open.span),
        }))
    }

    fn parse_var(&mut self) -> Result<&'ast VarStmt<'ast>, ParseError> {
        let start = self.advance().span;
        let name = self.expect_identifier()?;
        let ty = match self.eat(TokenKind::Colon) {
            Some(_) => Some(self.parse_type()?),
            None => None,
        };
        let init = match self.eat(TokenKind::Equal) {
            Some(_) => Some(self.parse_expr(0)?),
            None => None,
        };
        if ty.is_none() && init.is_none() {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedType,
                name.span,
                format!("variable '{}' needs a type or an initializer", name.lexeme),
            ));
        }
        let span = self.span_from(start);
        let id = self.next_id();
        Ok(self.arena.alloc(VarStmt {
            name: name.lexeme,
            ty,
            init,
            id,
            span,
        }))
    }

    /// `if (cond) stmt (elseif (cond) stmt)* (else stmt)?`
    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let then_branch = self.parse_statement()?;
        let then_branch = self.alloc_stmt(then_branch);

        let else_branch = match self.peek().kind {
            // `elseif` parses as a nested `if` in the else branch.
            TokenKind::Elseif => Some(self.parse_if()?),
            TokenKind::Else => {
                self.advance();
                Some(self.parse_statement()?)
            }
            _ => None,
        };
        let else_branch = else_branch.map(|stmt| self.alloc_stmt(stmt));

        let span = self.span_from(start);
        let id = self.next_id();
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_branch,
            else_branch,
            id,
            span,
        })))
    }

    /// `for (cond) body` or `for (init; cond; step) body`.
    fn parse_for(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LeftParen)?;

        let first = if self.check(TokenKind::Var) {
            Stmt::Var(self.parse_var()?)
        } else {
            Stmt::Expr(self.parse_expr(0)?)
        };

        let (init, condition, step) = if self.eat(TokenKind::Semicolon).is_some() {
            let condition = self.parse_expr(0)?;
            self.expect(TokenKind::Semicolon)?;
            let step = if self.check(TokenKind::RightParen) {
                None
            } else {
                Some(self.parse_expr(0)?)
            };
            (Some(self.alloc_stmt(first)), condition, step)
        } else {
            let Stmt::Expr(condition) = first else {
                return Err(self.error_expected("';' after loop initializer"));
            };
            (None, condition, None)
        };
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_statement()?;
        let body = self.alloc_stmt(body);
        let span = self.span_from(start);
        let id = self.next_id();
        Ok(Stmt::For(self.arena.alloc(ForStmt {
            init,
            condition,
            step,
            body,
            id,
            span,
        })))
    }

    /// `return` takes a value only when an expression starts on the same line.
    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.advance().span;
        let ends_here = !self.on_same_line()
            || matches!(
                self.peek().kind,
                TokenKind::RightBrace | TokenKind::Semicolon | TokenKind::Else | TokenKind::Elseif | TokenKind::Eof
            );
        let value = if ends_here { None } else { Some(self.parse_expr(0)?) };
        let span = self.span_from(start);
        let id = self.next_id();
        Ok(Stmt::Return(self.arena.alloc(ReturnStmt { value, id, span })))
    }

    // =========================================
    // Declarations
    // =========================================

    fn parse_import(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.advance().span;
        let path = self.expect(TokenKind::StringLiteral)?;
        Ok(Stmt::Import(self.arena.alloc(ImportDecl {
            path: path.lexeme,
            span: start.to(path.span),
        })))
    }

    fn parse_extern(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.advance().span;
        if self.eat(TokenKind::Type).is_some() {
            let name = self.expect_constant()?;
            return Ok(Stmt::ExternType(self.arena.alloc(ExternTypeDecl {
                name: name.lexeme,
                span: start.to(name.span),
            })));
        }

        self.expect(TokenKind::Def)?;
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        Ok(Stmt::ExternFunction(self.arena.alloc(ExternFunctionDecl {
            name: name.lexeme,
            params,
            return_type,
            span: self.span_from(start),
        })))
    }

    fn parse_function(&mut self, is_static: bool) -> Result<FunctionDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Def)?.span;
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_body()?;
        let id = self.next_id();
        Ok(FunctionDecl {
            name: name.lexeme,
            params,
            return_type,
            body,
            is_static,
            id,
            span: start.to(name.span),
        })
    }

    fn parse_params(&mut self) -> Result<&'ast [Param<'ast>], ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if self.eat(TokenKind::RightParen).is_none() {
            loop {
                let name = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: name.lexeme,
                    ty,
                    span: name.span.to(ty.span),
                });
                if self.eat(TokenKind::Comma).is_some() {
                    continue;
                }
                self.expect(TokenKind::RightParen)?;
                break;
            }
        }
        Ok(self.arena.alloc_slice_copy(&params))
    }

    fn parse_return_type(&mut self) -> Result<Option<super::TypeRef<'ast>>, ParseError> {
        match self.eat(TokenKind::Arrow) {
            Some(_) => Ok(Some(self.parse_type()?)),
            None => Ok(None),
        }
    }

    /// `class Name<T> < Super { ... }`
    fn parse_class(&mut self) -> Result<&'ast ClassDecl<'ast>, ParseError> {
        let start = self.advance().span;
        let name = self.expect_constant()?;

        let mut generic_params = Vec::new();
        if self.at_generic_params() {
            self.advance();
            loop {
                generic_params.push(self.expect_constant()?.lexeme);
                if self.eat(TokenKind::Comma).is_some() {
                    continue;
                }
                self.expect(TokenKind::Greater)?;
                break;
            }
        }

        let superclass = match self.eat(TokenKind::Less) {
            Some(_) => Some(self.parse_type()?),
            None => None,
        };

        self.expect(TokenKind::LeftBrace)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon).is_some() {}
            let token = self.peek();
            match token.kind {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Var => {
                    self.advance();
                    let field = self.expect_identifier()?;
                    self.expect(TokenKind::Colon)?;
                    let ty = self.parse_type()?;
                    fields.push(FieldDecl {
                        name: field.lexeme,
                        ty,
                        span: field.span.to(ty.span),
                    });
                }
                TokenKind::Def => methods.push(self.parse_function(false)?),
                TokenKind::Static => {
                    self.advance();
                    methods.push(self.parse_function(true)?);
                }
                TokenKind::Eof => return Err(self.error_expected("'}'")),
                TokenKind::Reserved => return Err(self.reserved_error(token)),
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidStatement,
                        token.span,
                        format!("expected field or method in class body, found {}", token.describe()),
                    ));
                }
            }
        }

        let id = self.next_id();
        Ok(self.arena.alloc(ClassDecl {
            name: name.lexeme,
            generic_params: self.arena.alloc_slice_copy(&generic_params),
            superclass,
            fields: self.arena.alloc_slice_copy(&fields),
            methods: self.arena.alloc_slice_copy(&methods),
            id,
            span: start.to(name.span),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Script};
    use bumpalo::Bump;
    use quill_core::QuillError;

    fn parse<'a>(source: &str, arena: &'a Bump) -> Script<'a> {
        Parser::parse(source, arena).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        let arena = Bump::new();
        match Parser::parse(source, &arena) {
            Err(QuillError::Parse(err)) => err,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn class_with_generics_and_superclass() {
        let arena = Bump::new();
        let script = parse(
            "class Pair<K, V> < Base<K> { var key: K  var value: V  static def make() -> Int { return 1 } }",
            &arena,
        );
        let Stmt::Class(class) = script.stmts()[0] else {
            panic!("expected class");
        };
        assert_eq!(class.name, "Pair");
        assert_eq!(class.generic_params, &["K", "V"]);
        assert_eq!(class.superclass.map(|s| s.name), Some("Base<K>"));
        assert_eq!(class.fields.len(), 2);
        assert!(class.methods[0].is_static);
    }

    #[test]
    fn superclass_without_generics() {
        let arena = Bump::new();
        let script = parse("class Dog < Animal { def speak() -> Int { return 2 } }", &arena);
        let Stmt::Class(class) = script.stmts()[0] else {
            panic!("expected class");
        };
        assert!(class.generic_params.is_empty());
        assert_eq!(class.superclass.map(|s| s.name), Some("Animal"));
        assert_eq!(class.methods[0].return_type.map(|t| t.name), Some("Int"));
    }

    #[test]
    fn return_value_only_on_same_line() {
        let arena = Bump::new();
        let script = parse("def f() { return\n 1 }", &arena);
        let Stmt::Function(f) = script.stmts()[0] else {
            panic!("expected function");
        };
        assert_eq!(f.body.stmts.len(), 2);
        assert!(matches!(f.body.stmts[0], Stmt::Return(r) if r.value.is_none()));

        let script = parse("def g() -> Int { return 1 }", &arena);
        let Stmt::Function(g) = script.stmts()[0] else {
            panic!("expected function");
        };
        assert!(matches!(g.body.stmts[0], Stmt::Return(r) if r.value.is_some()));
    }

    #[test]
    fn if_elseif_else_chain() {
        let arena = Bump::new();
        let script = parse("if (a) x = 1 elseif (b) x = 2 else x = 3", &arena);
        let Stmt::If(outer) = script.stmts()[0] else {
            panic!("expected if");
        };
        let Some(Stmt::If(inner)) = outer.else_branch else {
            panic!("expected nested if");
        };
        assert!(inner.else_branch.is_some());
    }

    #[test]
    fn if_return_else_return_on_one_line() {
        let arena = Bump::new();
        let script = parse("def fact(n: Long) -> Long { if (n < 2) return 1 else return n * fact(n - 1) }", &arena);
        let Stmt::Function(f) = script.stmts()[0] else {
            panic!("expected function");
        };
        let Stmt::If(branch) = f.body.stmts[0] else {
            panic!("expected if");
        };
        assert!(matches!(branch.then_branch, Stmt::Return(r) if r.value.is_some()));
        assert!(matches!(branch.else_branch, Some(Stmt::Return(_))));
    }

    #[test]
    fn for_loop_forms() {
        let arena = Bump::new();
        let script = parse(
            "for (var i = 0; i < 10; i = i + 1) { total = total + i }\nfor (total < 100) total = total * 2",
            &arena,
        );
        let Stmt::For(counted) = script.stmts()[0] else {
            panic!("expected for");
        };
        assert!(matches!(counted.init, Some(Stmt::Var(_))));
        assert!(counted.step.is_some());
        let Stmt::For(simple) = script.stmts()[1] else {
            panic!("expected for");
        };
        assert!(simple.init.is_none());
        assert!(matches!(simple.condition, Expr::Binary(_)));
    }

    #[test]
    fn var_forms() {
        let arena = Bump::new();
        let script = parse("var a: Int\nvar b = 2\nvar c: Long = 3", &arena);
        assert!(matches!(script.stmts()[0], Stmt::Var(v) if v.ty.is_some() && v.init.is_none()));
        assert!(matches!(script.stmts()[1], Stmt::Var(v) if v.ty.is_none() && v.init.is_some()));
        assert!(matches!(script.stmts()[2], Stmt::Var(v) if v.ty.is_some() && v.init.is_some()));
        assert_eq!(parse_err("var d").kind, ParseErrorKind::ExpectedType);
    }

    #[test]
    fn whitespace_separates_statements_on_one_line() {
        let arena = Bump::new();
        let script = parse("var x = 10 x = x + 5 x", &arena);
        assert_eq!(script.stmts().len(), 3);
    }

    #[test]
    fn reserved_keywords_rejected() {
        for source in ["fn foo() {}", "struct Point {}", "module m", "include \"x\"", "func f"] {
            assert_eq!(parse_err(source).kind, ParseErrorKind::ReservedKeyword, "{source}");
        }
    }

    #[test]
    fn declarations_rejected_inside_bodies() {
        assert_eq!(parse_err("def f() { def g() {} }").kind, ParseErrorKind::InvalidStatement);
        assert_eq!(parse_err("static def f() {}").kind, ParseErrorKind::InvalidStatement);
    }

    #[test]
    fn extern_declarations() {
        let arena = Bump::new();
        let script = parse("extern def puts(s: Pointer<Char>) -> Int\nextern type FILE", &arena);
        assert!(matches!(
            script.stmts()[0],
            Stmt::ExternFunction(f) if f.params[0].ty.name == "Pointer<Char>"
        ));
        assert!(matches!(script.stmts()[1], Stmt::ExternType(t) if t.name == "FILE"));
    }
}
