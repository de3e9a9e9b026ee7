//! Token types for the Quill lexer.

use quill_core::Span;
use std::fmt;

/// A token from the source code.
///
/// The lexeme lives in the AST arena so tokens outlive the source string.
/// For string literals the lexeme holds the unescaped contents without the
/// surrounding quotes.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Human readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Identifier | TokenKind::Constant => format!("'{}'", self.lexeme),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                format!("number '{}'", self.lexeme)
            }
            TokenKind::StringLiteral => "string literal".to_string(),
            kind => format!("'{}'", kind.as_str()),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types in Quill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals and names
    // =========================================
    /// `42`
    IntLiteral,
    /// `2.5`, `1e3`
    FloatLiteral,
    /// `"text"`
    StringLiteral,
    /// Lowercase or `_` initial: variables, functions, fields.
    Identifier,
    /// Uppercase initial: type names.
    Constant,

    // =========================================
    // Keywords
    // =========================================
    Def,
    If,
    Elseif,
    Else,
    For,
    Return,
    New,
    Var,
    Class,
    Static,
    Extern,
    As,
    And,
    Or,
    Import,
    Sizeof,
    Type,
    True,
    False,
    Null,
    /// `fn`, `struct`, `module`, `include`, `func`: reserved, never valid.
    Reserved,

    // =========================================
    // Punctuation
    // =========================================
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    At,
    Arrow,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    Equal,

    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer",
            FloatLiteral => "float",
            StringLiteral => "string",
            Identifier => "identifier",
            Constant => "type name",
            Def => "def",
            If => "if",
            Elseif => "elseif",
            Else => "else",
            For => "for",
            Return => "return",
            New => "new",
            Var => "var",
            Class => "class",
            Static => "static",
            Extern => "extern",
            As => "as",
            And => "and",
            Or => "or",
            Import => "import",
            Sizeof => "sizeof",
            Type => "type",
            True => "true",
            False => "false",
            Null => "null",
            Reserved => "reserved keyword",
            LeftParen => "(",
            RightParen => ")",
            LeftBrace => "{",
            RightBrace => "}",
            LeftBracket => "[",
            RightBracket => "]",
            Comma => ",",
            Dot => ".",
            Colon => ":",
            Semicolon => ";",
            At => "@",
            Arrow => "->",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            EqualEqual => "==",
            BangEqual => "!=",
            Equal => "=",
            Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a word to its keyword kind.
pub fn lookup_keyword(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match word {
        "def" => Def,
        "if" => If,
        "elseif" => Elseif,
        "else" => Else,
        "for" => For,
        "return" => Return,
        "new" => New,
        "var" => Var,
        "class" => Class,
        "static" => Static,
        "extern" => Extern,
        "as" => As,
        "and" => And,
        "or" => Or,
        "import" => Import,
        "sizeof" => Sizeof,
        "type" => Type,
        "true" => True,
        "false" => False,
        "null" => Null,
        "fn" | "struct" | "module" | "include" | "func" => Reserved,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(lookup_keyword("elseif"), Some(TokenKind::Elseif));
        assert_eq!(lookup_keyword("sizeof"), Some(TokenKind::Sizeof));
        assert_eq!(lookup_keyword("speak"), None);
    }

    #[test]
    fn reserved_words_share_one_kind() {
        for word in ["fn", "struct", "module", "include", "func"] {
            assert_eq!(lookup_keyword(word), Some(TokenKind::Reserved));
        }
    }

    #[test]
    fn describe_quotes_names() {
        let token = Token::new(TokenKind::Identifier, "speak", Span::new(1, 1, 5));
        assert_eq!(token.describe(), "'speak'");
        let eof = Token::new(TokenKind::Eof, "", Span::point(3, 1));
        assert_eq!(eof.describe(), "end of file");
    }
}
