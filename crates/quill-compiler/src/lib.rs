//! Quill Compiler
//!
//! Semantic analysis and native code generation for Quill units.
//!
//! ## Architecture
//!
//! - **Analysis**: declarations of every file are registered, then function
//!   bodies are type-checked on demand starting from `main`
//! - **Generation**: every function reachable from `main` is lowered to
//!   Cranelift IR and finalized in a JIT module
//!
//! ## Modules
//!
//! - [`context`]: registry plus analysis side tables, shared by both phases
//! - [`sema`]: the analyzer and the typed bodies it records
//! - [`overload`]: overload resolution by conversion cost
//! - [`scope`]: lexical variable scopes of one body
//! - [`codegen`]: lowering, data layout and the JIT backend
//! - [`runtime`]: host functions called from generated code

pub mod codegen;
pub mod context;
pub mod overload;
pub mod runtime;
pub mod scope;
pub mod sema;

pub use codegen::jit::{JitOptions, OptLevel};
pub use codegen::{CompiledModule, EmitState, Generator};
pub use context::{CompilationContext, FunctionState};
pub use overload::{OverloadMatch, resolve_overload};
pub use runtime::{read_string, set_stdout_capture};
pub use sema::{Analyzer, SourceFile, TypedBody};

pub use quill_core::{CodegenError, QuillError, QuillResult, SemanticError};
