//! Type expression parsing.
//!
//! ```text
//! type      := base ('[' ']')*
//! base      := Constant ('<' type (',' type)* '>')?
//! ```
//!
//! The result is rendered back into a canonical string (`Map<K, List<V>>[]`)
//! rather than kept as a tree.

use bumpalo::collections::String as BumpString;
use quill_core::ParseError;

use super::TypeRef;
use super::parser::Parser;
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse a full type including array suffixes.
    pub(super) fn parse_type(&mut self) -> Result<TypeRef<'ast>, ParseError> {
        let start = self.peek().span;
        let mut rendered = BumpString::new_in(self.arena);
        self.render_type_base(&mut rendered)?;
        while self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            self.advance();
            self.advance();
            rendered.push_str("[]");
        }
        Ok(TypeRef {
            name: rendered.into_bump_str(),
            span: self.span_from(start),
        })
    }

    /// Parse a type without array suffixes; used where `[` starts something
    /// else, as in `new Int[n]`.
    pub(super) fn parse_type_base(&mut self) -> Result<TypeRef<'ast>, ParseError> {
        let start = self.peek().span;
        let mut rendered = BumpString::new_in(self.arena);
        self.render_type_base(&mut rendered)?;
        Ok(TypeRef {
            name: rendered.into_bump_str(),
            span: self.span_from(start),
        })
    }

    fn render_type_base(&mut self, out: &mut BumpString<'ast>) -> Result<(), ParseError> {
        let base = self.expect_constant()?;
        out.push_str(base.lexeme);

        if self.eat(TokenKind::Less).is_some() {
            out.push('<');
            loop {
                let arg = self.parse_type()?;
                out.push_str(arg.name);
                if self.eat(TokenKind::Comma).is_some() {
                    out.push_str(", ");
                    continue;
                }
                self.expect(TokenKind::Greater)?;
                break;
            }
            out.push('>');
        }
        Ok(())
    }

    /// Whether `<` at the current position opens a generic parameter list
    /// (`<T>` or `<K, V>`) rather than a superclass clause.
    pub(super) fn at_generic_params(&self) -> bool {
        self.check(TokenKind::Less)
            && self.peek_nth(1).kind == TokenKind::Constant
            && matches!(self.peek_nth(2).kind, TokenKind::Greater | TokenKind::Comma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn render(source: &str) -> String {
        let arena = Bump::new();
        let mut parser = Parser::new(source, &arena).unwrap();
        parser.parse_type().unwrap().name.to_string()
    }

    #[test]
    fn simple_and_array_types() {
        assert_eq!(render("Int"), "Int");
        assert_eq!(render("Int[][]"), "Int[][]");
    }

    #[test]
    fn generic_types_render_canonically() {
        assert_eq!(render("Map<K,List<V>>"), "Map<K, List<V>>");
        assert_eq!(render("Box< Int >[]"), "Box<Int>[]");
        assert_eq!(render("Pointer<Int[]>"), "Pointer<Int[]>");
    }

    #[test]
    fn lowercase_is_not_a_type() {
        let arena = Bump::new();
        let mut parser = Parser::new("int", &arena).unwrap();
        assert!(parser.parse_type().is_err());
    }
}
