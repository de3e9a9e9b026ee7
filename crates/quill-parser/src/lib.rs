//! Quill parser crate.
//!
//! Lexer and Pratt parser for Quill source files. All AST nodes and token
//! lexemes are allocated in a caller-supplied [`bumpalo::Bump`] arena, so the
//! source text can be dropped once parsing returns.
//!
//! # Example
//!
//! ```
//! use quill_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     class Counter {
//!         var count: Int
//!         def bump() { @count = @count + 1 }
//!     }
//!     var c = new Counter
//!     c.bump()
//! "#;
//!
//! let script = Parser::parse(source, &arena).expect("valid source");
//! assert_eq!(script.stmts().len(), 3);
//! ```

pub mod ast;
pub mod lexer;

pub use ast::Parser;
pub use lexer::{Lexer, Token, TokenKind};
