//! Quill core types.
//!
//! Leaf crate shared by every stage of the Quill compiler:
//!
//! - [`Span`]: source locations carried by tokens, AST nodes and diagnostics
//! - [`error`]: the error taxonomy for lexing, parsing, analysis and codegen
//! - [`PrimitiveKind`]: the built-in scalar types and their numeric rank ladder
//! - [`TypeHash`]: deterministic type identity used by runtime metadata

pub mod error;
mod primitive;
mod span;
mod type_hash;

pub use error::{
    CodegenError, LexError, ParseError, ParseErrorKind, QuillError, QuillResult, SemanticError,
};
pub use primitive::PrimitiveKind;
pub use span::Span;
pub use type_hash::TypeHash;
