//! Main lexer implementation for Quill.
//!
//! The [`Lexer`] converts source text into [`Token`]s, dispatching on the
//! first character of each token. All lexemes are copied into the arena so
//! the source string can be freed after lexing completes.

use bumpalo::Bump;
use quill_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for Quill source code.
///
/// The `'src` lifetime is the source being lexed; `'ast` is the arena the
/// lexemes are copied into.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
        }
    }

    /// Scan the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token<'ast>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token<'ast>, LexError> {
        self.skip_trivia();

        let start = self.start();
        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(
                TokenKind::Eof,
                "",
                Span::point(self.cursor.line(), self.cursor.column()),
            ));
        };

        match c {
            '"' => self.scan_string(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if is_ident_start(c) => Ok(self.scan_word(start)),
            _ => self.scan_punct(start),
        }
    }

    // =========================================
    // Internal: helpers
    // =========================================

    fn start(&self) -> (u32, u32, u32) {
        (self.cursor.line(), self.cursor.column(), self.cursor.offset())
    }

    /// Skip whitespace and `#` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.advance();
                }
                Some('#') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                _ => return,
            }
        }
    }

    fn span_from(&self, (line, col, offset): (u32, u32, u32)) -> Span {
        Span::new(line, col, self.cursor.offset() - offset)
    }

    fn make_token(&self, kind: TokenKind, start: (u32, u32, u32)) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start.2));
        Token::new(kind, lexeme, self.span_from(start))
    }

    // =========================================
    // Scanning
    // =========================================

    fn scan_word(&mut self, start: (u32, u32, u32)) -> Token<'ast> {
        let word = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(word).unwrap_or_else(|| {
            if word.starts_with(|c: char| c.is_ascii_uppercase()) {
                TokenKind::Constant
            } else {
                TokenKind::Identifier
            }
        });
        self.make_token(kind, start)
    }

    fn scan_number(&mut self, start: (u32, u32, u32)) -> Result<Token<'ast>, LexError> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::IntLiteral;

        // A dot only continues the number when a digit follows, so `xs.length`
        // style member access after an integer is never swallowed.
        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let has_digits = match self.cursor.peek_nth(1) {
                Some('+' | '-') => self.cursor.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if !has_digits {
                self.cursor.advance();
                return Err(LexError::InvalidNumber {
                    span: self.span_from(start),
                    detail: "exponent has no digits".into(),
                });
            }
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        if self.cursor.check(is_ident_start) {
            self.cursor.eat_while(is_ident_continue);
            return Err(LexError::InvalidNumber {
                span: self.span_from(start),
                detail: format!("invalid suffix in '{}'", self.cursor.slice_from(start.2)),
            });
        }

        Ok(self.make_token(kind, start))
    }

    fn scan_string(&mut self, start: (u32, u32, u32)) -> Result<Token<'ast>, LexError> {
        self.cursor.advance(); // opening quote
        let mut contents = bumpalo::collections::String::new_in(self.arena);

        loop {
            match self.cursor.advance() {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: Span::new(start.0, start.1, 1),
                    });
                }
                Some('"') => break,
                Some('\\') => {
                    let escape_span = Span::new(self.cursor.line(), self.cursor.column() - 1, 2);
                    let escaped = match self.cursor.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(ch) => return Err(LexError::InvalidEscape { ch, span: escape_span }),
                        None => {
                            return Err(LexError::UnterminatedString {
                                span: Span::new(start.0, start.1, 1),
                            });
                        }
                    };
                    contents.push(escaped);
                }
                Some(ch) => contents.push(ch),
            }
        }

        Ok(Token::new(
            TokenKind::StringLiteral,
            contents.into_bump_str(),
            self.span_from(start),
        ))
    }

    fn scan_punct(&mut self, start: (u32, u32, u32)) -> Result<Token<'ast>, LexError> {
        use TokenKind::*;

        let Some(c) = self.cursor.advance() else {
            return Ok(self.make_token(Eof, start));
        };
        let kind = match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            '[' => LeftBracket,
            ']' => RightBracket,
            ',' => Comma,
            '.' => Dot,
            ':' => Colon,
            ';' => Semicolon,
            '@' => At,
            '+' => Plus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '-' if self.cursor.eat('>') => Arrow,
            '-' => Minus,
            '<' if self.cursor.eat('=') => LessEqual,
            '<' => Less,
            '>' if self.cursor.eat('=') => GreaterEqual,
            '>' => Greater,
            '=' if self.cursor.eat('=') => EqualEqual,
            '=' => Equal,
            '!' if self.cursor.eat('=') => BangEqual,
            ch => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    span: self.span_from(start),
                });
            }
        };
        Ok(self.make_token(kind, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        Lexer::new(source, &arena)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_class_header() {
        use TokenKind::*;
        assert_eq!(
            kinds("class Dog < Animal {"),
            vec![Class, Constant, Less, Constant, LeftBrace, Eof]
        );
    }

    #[test]
    fn lex_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("a <= b != c -> -d == e"),
            vec![
                Identifier, LessEqual, Identifier, BangEqual, Identifier, Arrow, Minus, Identifier,
                EqualEqual, Identifier, Eof
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        let arena = Bump::new();
        let tokens = Lexer::new("42 2.5 1e3 7.length", &arena).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[1].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[1].lexeme, "2.5");
        assert_eq!(tokens[2].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[3].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[4].kind, TokenKind::Dot);
    }

    #[test]
    fn lex_string_escapes() {
        let arena = Bump::new();
        let tokens = Lexer::new(r#""a\tb\n\"q\"""#, &arena).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].lexeme, "a\tb\n\"q\"");
    }

    #[test]
    fn lex_skips_comments() {
        use TokenKind::*;
        assert_eq!(kinds("x # the rest is ignored\ny"), vec![Identifier, Identifier, Eof]);
    }

    #[test]
    fn lex_tracks_positions() {
        let arena = Bump::new();
        let tokens = Lexer::new("var x\n  x = 1", &arena).tokenize().unwrap();
        assert_eq!(tokens[2].span, Span::new(2, 3, 1));
        assert_eq!(tokens[4].span, Span::new(2, 7, 1));
    }

    #[test]
    fn lex_errors() {
        let arena = Bump::new();
        assert!(matches!(
            Lexer::new("x = $", &arena).tokenize(),
            Err(LexError::UnexpectedChar { ch: '$', .. })
        ));
        assert!(matches!(
            Lexer::new("\"open", &arena).tokenize(),
            Err(LexError::UnterminatedString { .. })
        ));
        assert!(matches!(
            Lexer::new("\"\\q\"", &arena).tokenize(),
            Err(LexError::InvalidEscape { ch: 'q', .. })
        ));
        assert!(matches!(
            Lexer::new("12abc", &arena).tokenize(),
            Err(LexError::InvalidNumber { .. })
        ));
    }
}
