//! Quill
//!
//! A small statically typed, class-based language compiled to native code
//! through Cranelift.
//!
//! ```no_run
//! use quill::{Unit, Value};
//!
//! let mut unit = Unit::new();
//! unit.add_source(
//!     "main.ql",
//!     r#"
//!     class Animal { def speak() -> Int { return 1 } }
//!     class Dog < Animal { def speak() -> Int { return 2 } }
//!     var a: Animal = new Dog
//!     a.speak()
//!     "#,
//! )?;
//! unit.build()?;
//! assert_eq!(unit.run()?, Value::Int(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The stages live in their own crates and are re-exported here:
//!
//! - [`quill_parser`]: lexer and parser
//! - [`quill_registry`]: types, functions and the built-in natives
//! - [`quill_compiler`]: semantic analysis and code generation

mod config;
mod source;
mod unit;
mod value;

pub use config::{DEFAULT_EXTENSION, UnitConfig};
pub use source::{FsLoader, MemoryLoader, SourceLoader};
pub use unit::{BuildError, Unit, UnitError};
pub use value::Value;

pub use quill_compiler::{JitOptions, OptLevel, set_stdout_capture};
pub use quill_core::{CodegenError, LexError, ParseError, QuillError, QuillResult, SemanticError, Span};

pub use quill_compiler;
pub use quill_parser;
pub use quill_registry;
