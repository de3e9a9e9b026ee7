//! Values returned from `main`.

use std::fmt;

use quill_core::PrimitiveKind;
use quill_registry::{Registry, TypeId};

/// How the entry function's result is read back, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResultKind {
    Void,
    Primitive(PrimitiveKind),
    String,
    Reference,
}

impl ResultKind {
    pub(crate) fn of(registry: &Registry<'_>, ty: Option<TypeId>) -> Self {
        let Some(ty) = ty else {
            return ResultKind::Void;
        };
        if ty == registry.builtins().string {
            return ResultKind::String;
        }
        match registry.primitive_kind(ty) {
            Some(PrimitiveKind::Null) | None => ResultKind::Reference,
            Some(kind) => ResultKind::Primitive(kind),
        }
    }
}

/// The result of running a unit: the value of its last top-level
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// `None` for a null `String`.
    String(Option<String>),
    /// Address of a heap object, zero for null.
    Reference(usize),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Char(c) => Some(c as i64),
            Value::Short(v) => Some(v.into()),
            Value::Int(v) => Some(v.into()),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v.into()),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::String(None) | Value::Reference(0))
    }

    /// Name of the Quill type this value came from.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "Void",
            Value::Bool(_) => "Bool",
            Value::Char(_) => "Char",
            Value::Short(_) => "Short",
            Value::Int(_) => "Int",
            Value::Long(_) => "Long",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Reference(_) => "Object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(Some(s)) => f.write_str(s),
            Value::String(None) | Value::Reference(0) => f.write_str("null"),
            Value::Reference(address) => write!(f, "<object {address:#x}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_kinds() {
        let registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let null = registry.primitive(PrimitiveKind::Null);
        assert_eq!(ResultKind::of(&registry, None), ResultKind::Void);
        assert_eq!(
            ResultKind::of(&registry, Some(int)),
            ResultKind::Primitive(PrimitiveKind::Int)
        );
        assert_eq!(
            ResultKind::of(&registry, Some(registry.builtins().string)),
            ResultKind::String
        );
        assert_eq!(ResultKind::of(&registry, Some(null)), ResultKind::Reference);
        assert_eq!(
            ResultKind::of(&registry, Some(registry.builtins().object)),
            ResultKind::Reference
        );
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Int(15).as_i64(), Some(15));
        assert_eq!(Value::Double(5.5).as_f64(), Some(5.5));
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::String(Some("hi".into())).as_str(), Some("hi"));
        assert!(Value::Reference(0).is_null());
        assert_eq!(Value::Long(1).type_name(), "Long");
    }

    #[test]
    fn display() {
        assert_eq!(Value::Double(5.5).to_string(), "5.5");
        assert_eq!(Value::String(None).to_string(), "null");
        assert_eq!(Value::Char('q').to_string(), "q");
    }
}
