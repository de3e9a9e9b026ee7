//! Error types for every compilation phase.
//!
//! ## Error Hierarchy
//!
//! ```text
//! QuillError (top-level wrapper)
//! ├── LexError       - tokenization errors
//! ├── ParseError     - syntax errors (with ParseErrorKind)
//! ├── SemanticError  - type resolution, scoping, overloads, returns
//! └── CodegenError   - internal invariant failures while lowering
//! ```
//!
//! Every error is fatal for the unit being compiled: the first one raised
//! unwinds through `?` to the caller, which discards the whole compilation
//! context. There is no multi-error batching.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors raised while scanning source text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("invalid escape sequence '\\{ch}' at {span}")]
    InvalidEscape { ch: char, span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// A token that cannot start or continue the current construct.
    UnexpectedToken,
    /// Input ended in the middle of a construct.
    UnexpectedEof,
    ExpectedExpression,
    ExpectedType,
    ExpectedIdentifier,
    /// A statement that is only valid in a class body, or vice versa.
    InvalidStatement,
    /// A keyword the language reserves but does not implement.
    ReservedKeyword,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidStatement => "invalid statement",
            ParseErrorKind::ReservedKeyword => "reserved keyword",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntax error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn unexpected_token(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected {found}"),
        )
    }

    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }
}

// ============================================================================
// Semantic Errors
// ============================================================================

/// Errors raised by the semantic analyzer.
///
/// Every variant carries the span of the node that triggered it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    /// A variable, type, field or function name that is not bound, or a call
    /// no candidate accepts.
    #[error("at {span}: undefined {what} '{name}'")]
    UndefinedSymbol {
        what: &'static str,
        name: String,
        span: Span,
    },

    #[error("at {span}: type mismatch: {message}")]
    TypeMismatch { message: String, span: Span },

    /// Two or more candidates share the minimal castability distance.
    #[error("at {span}: ambiguous call to '{name}': candidates {}", candidates.join(", "))]
    AmbiguousOverload {
        name: String,
        candidates: Vec<String>,
        span: Span,
    },

    #[error("at {span}: not all paths of '{function}' return a value")]
    MissingReturn { function: String, span: Span },

    #[error("at {span}: '{name}' is already defined in this scope")]
    RedefinitionError { name: String, span: Span },

    #[error("at {span}: unreachable code")]
    UnreachableCode { span: Span },

    #[error("at {span}: cannot import '{path}': {reason}")]
    ImportFailed {
        path: String,
        reason: String,
        span: Span,
    },
}

impl SemanticError {
    pub fn undefined(what: &'static str, name: impl Into<String>, span: Span) -> Self {
        SemanticError::UndefinedSymbol {
            what,
            name: name.into(),
            span,
        }
    }

    /// Candidates exist for a call but none accepts the argument types.
    pub fn no_matching_function(name: &str, arguments: &str, span: Span) -> Self {
        SemanticError::UndefinedSymbol {
            what: "function matching",
            name: format!("{name}({arguments})"),
            span,
        }
    }

    pub fn mismatch(message: impl Into<String>, span: Span) -> Self {
        SemanticError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    /// "expected `expected`, found `found`" flavoured type mismatch.
    pub fn expected(expected: &str, found: &str, span: Span) -> Self {
        Self::mismatch(format!("expected '{expected}', found '{found}'"), span)
    }

    pub fn span(&self) -> Span {
        match self {
            SemanticError::UndefinedSymbol { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::AmbiguousOverload { span, .. }
            | SemanticError::MissingReturn { span, .. }
            | SemanticError::RedefinitionError { span, .. }
            | SemanticError::UnreachableCode { span }
            | SemanticError::ImportFailed { span, .. } => *span,
        }
    }
}

// ============================================================================
// Codegen Errors
// ============================================================================

/// Failures while lowering a typed unit.
///
/// A successful analysis guarantees these never fire for user programs; they
/// signal a broken compiler invariant or a backend failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("internal compiler error: {0}")]
    Internal(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl CodegenError {
    pub fn internal(message: impl Into<String>) -> Self {
        CodegenError::Internal(message.into())
    }

    pub fn backend(error: impl std::fmt::Display) -> Self {
        CodegenError::Backend(error.to_string())
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Any error the compiler can produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuillError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),
}

impl QuillError {
    /// Source position of the error, if it refers to user code.
    pub fn span(&self) -> Option<Span> {
        match self {
            QuillError::Lex(e) => Some(e.span()),
            QuillError::Parse(e) => Some(e.span),
            QuillError::Semantic(e) => Some(e.span()),
            QuillError::Codegen(_) => None,
        }
    }

    /// Whether this is a semantic error. Handy in tests.
    pub fn as_semantic(&self) -> Option<&SemanticError> {
        match self {
            QuillError::Semantic(e) => Some(e),
            _ => None,
        }
    }
}

pub type QuillResult<T> = Result<T, QuillError>;
