//! Type and function registry for Quill.
//!
//! This crate holds every type and function overload of a compilation unit:
//!
//! - [`Registry`]: interned types, the function table and function scopes
//! - [`Type`]: the closed set of type variants
//! - [`Function`]: one overload, with its body source and override map
//! - [`TypeName`]: structured parsing of written type names
//!
//! The registry is pre-seeded with the primitive types, `Object`, `String`,
//! `Pointer<T>` and their native functions (see [`builtins`]).

pub mod builtins;
mod function;
mod hierarchy;
mod ids;
mod instance_cache;
mod registry;
mod scope;
mod type_name;
mod types;

pub use builtins::{Builtins, conversion_name};
pub use function::{
    ArithOp, CompareOp, Function, FunctionBody, FunctionFlags, LogicOp, NativeOp, Param, Signature,
};
pub use ids::{FuncId, ScopeId, TypeId};
pub use registry::{Registry, Resolution};
pub use scope::ScopeArena;
pub use type_name::{TypeName, render_instance, split_top_level};
pub use types::{ExternalType, Field, ObjectType, Substitution, Type, TypeInfo};
