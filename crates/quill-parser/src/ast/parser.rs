//! Parser state and token helpers.
//!
//! Parsing is split across `expr_parser`, `stmt_parser` and `type_parser`,
//! each adding an `impl` block to [`Parser`]. The first error aborts the
//! parse; there is no recovery.

use bumpalo::Bump;
use quill_core::{ParseError, ParseErrorKind, QuillError, Span};

use super::{NodeId, Script};
use crate::lexer::{Lexer, Token, TokenKind};

pub struct Parser<'ast> {
    pub(super) tokens: Vec<Token<'ast>>,
    pub(super) position: usize,
    pub(super) arena: &'ast Bump,
    next_id: u32,
}

impl<'ast> Parser<'ast> {
    /// Tokenize `source` into a new parser.
    pub fn new(source: &str, arena: &'ast Bump) -> Result<Self, QuillError> {
        let tokens = Lexer::new(source, arena).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            arena,
            next_id: 0,
        })
    }

    /// Parse a complete source file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Script<'ast>, QuillError> {
        let mut parser = Parser::new(source, arena)?;
        Ok(parser.parse_script()?)
    }

    pub(super) fn parse_script(&mut self) -> Result<Script<'ast>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(TokenKind::Semicolon).is_some() {}
            if self.is_eof() {
                break;
            }
            stmts.push(self.parse_top_level()?);
        }
        Ok(Script::new(self.arena.alloc_slice_copy(&stmts), self.next_id))
    }

    // =========================================
    // Token access
    // =========================================

    #[inline]
    pub(super) fn peek(&self) -> Token<'ast> {
        self.peek_nth(0)
    }

    pub(super) fn peek_nth(&self, n: usize) -> Token<'ast> {
        let index = (self.position + n).min(self.tokens.len() - 1);
        self.tokens[index]
    }

    /// The most recently consumed token.
    pub(super) fn previous(&self) -> Token<'ast> {
        self.tokens[self.position.saturating_sub(1)]
    }

    pub(super) fn advance(&mut self) -> Token<'ast> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    #[inline]
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    #[inline]
    pub(super) fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Whether the next token starts on the same line as the previous one.
    pub(super) fn on_same_line(&self) -> bool {
        self.position > 0 && self.peek().span.line == self.previous().span.line
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error_expected(&format!("'{}'", kind.as_str())))
    }

    pub(super) fn expect_identifier(&mut self) -> Result<Token<'ast>, ParseError> {
        if self.check(TokenKind::Identifier) {
            return Ok(self.advance());
        }
        let token = self.peek();
        Err(self.reserved_or(
            ParseErrorKind::ExpectedIdentifier,
            format!("expected identifier, found {}", token.describe()),
        ))
    }

    pub(super) fn expect_constant(&mut self) -> Result<Token<'ast>, ParseError> {
        if self.check(TokenKind::Constant) {
            return Ok(self.advance());
        }
        let token = self.peek();
        Err(self.reserved_or(
            ParseErrorKind::ExpectedType,
            format!("expected type name, found {}", token.describe()),
        ))
    }

    // =========================================
    // Errors and ids
    // =========================================

    pub(super) fn error_expected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            return ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {expected}"),
            );
        }
        if token.kind == TokenKind::Reserved {
            return self.reserved_error(token);
        }
        ParseError::expected_token(token.span, expected, &token.describe())
    }

    /// Report a reserved keyword in preference to `kind` when the current
    /// token is one.
    pub(super) fn reserved_or(&self, kind: ParseErrorKind, message: String) -> ParseError {
        let token = self.peek();
        match token.kind {
            TokenKind::Reserved => self.reserved_error(token),
            TokenKind::Eof => ParseError::new(ParseErrorKind::UnexpectedEof, token.span, message),
            _ => ParseError::new(kind, token.span, message),
        }
    }

    pub(super) fn reserved_error(&self, token: Token<'ast>) -> ParseError {
        ParseError::new(
            ParseErrorKind::ReservedKeyword,
            token.span,
            format!("'{}' is reserved and cannot be used", token.lexeme),
        )
    }

    pub(super) fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Span from `start` up to the end of the last consumed token.
    pub(super) fn span_from(&self, start: Span) -> Span {
        start.to(self.previous().span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_errors_surface_as_lex_errors() {
        let arena = Bump::new();
        let err = Parser::parse("var s = \"open", &arena).unwrap_err();
        assert!(matches!(err, QuillError::Lex(_)));
    }

    #[test]
    fn unexpected_eof_is_reported() {
        let arena = Bump::new();
        let err = Parser::parse("def f(", &arena).unwrap_err();
        let QuillError::Parse(err) = err else {
            panic!("expected parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn semicolons_are_optional_separators() {
        let arena = Bump::new();
        let script = Parser::parse("var a = 1; var b = 2;; a", &arena).unwrap();
        assert_eq!(script.stmts().len(), 3);
    }
}
