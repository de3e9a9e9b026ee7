//! The closed set of Quill types.

use quill_core::{PrimitiveKind, Span, TypeHash};
use quill_parser::ast::ClassDecl;

use crate::{ScopeId, TypeId};

/// Generic parameter name -> concrete type.
pub type Substitution = rustc_hash::FxHashMap<String, TypeId>;

/// A type variant. Common data (name, method tables, hash) lives in
/// [`TypeInfo`].
#[derive(Debug, Clone)]
pub enum Type<'ast> {
    Primitive(PrimitiveKind),
    Object(ObjectType<'ast>),
    Array(TypeId),
    Pointer(TypeId),
    External(ExternalType),
}

impl<'ast> Type<'ast> {
    /// Kind name used in redefinition diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Type::Primitive(_) => "primitive",
            Type::Object(_) => "class",
            Type::Array(_) => "array",
            Type::Pointer(_) => "pointer",
            Type::External(_) => "extern type",
        }
    }

    /// Whether two variants may share one registry name.
    pub fn same_kind(&self, other: &Type<'_>) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_object(&self) -> Option<&ObjectType<'ast>> {
        match self {
            Type::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Values of reference types are a single pointer word.
    pub fn is_reference(&self) -> bool {
        match self {
            Type::Primitive(kind) => *kind == PrimitiveKind::Null,
            _ => true,
        }
    }
}

/// An instance variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub span: Span,
}

/// A class: user defined, builtin (`Object`, `String`) or a generic
/// instantiation.
#[derive(Debug, Clone, Default)]
pub struct ObjectType<'ast> {
    pub superclass: Option<TypeId>,
    /// Own instance variables in declaration order; inherited fields live in
    /// the superclass.
    pub fields: Vec<Field>,
    /// Non-empty for a generic template such as `Box<T>`.
    pub generic_params: Vec<String>,
    /// Non-empty for an instantiation such as `Box<Int>`.
    pub generic_args: Vec<TypeId>,
    /// The template an instantiation was created from.
    pub template: Option<TypeId>,
    /// Parameter -> argument map of an instantiation.
    pub substitution: Substitution,
    /// Class declarations contributing members, in attach order.
    pub decls: Vec<&'ast ClassDecl<'ast>>,
}

impl<'ast> ObjectType<'ast> {
    pub fn is_template(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// An opaque host type declared with `extern type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalType {
    /// Every `extern type` declaration of this name.
    pub declared_at: Vec<Span>,
}

/// A registered type.
#[derive(Debug, Clone)]
pub struct TypeInfo<'ast> {
    /// Canonical rendered name, e.g. `Box<Int>` or `Int[]`.
    pub name: String,
    pub ty: Type<'ast>,
    /// Instance methods and `init` constructors (receiver passed first).
    /// Links to the superclass's method scope for classes.
    pub methods: ScopeId,
    /// Class functions. Native operators of primitives live here too.
    pub statics: ScopeId,
    pub hash: TypeHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_compare_by_variant() {
        let a = Type::Array(TypeId::new(1));
        let b = Type::Array(TypeId::new(2));
        assert!(a.same_kind(&b));
        assert!(!a.same_kind(&Type::Primitive(PrimitiveKind::Int)));
    }

    #[test]
    fn null_and_objects_are_references() {
        assert!(Type::Primitive(PrimitiveKind::Null).is_reference());
        assert!(!Type::Primitive(PrimitiveKind::Long).is_reference());
        assert!(Type::Object(ObjectType::default()).is_reference());
        assert!(Type::External(ExternalType::default()).is_reference());
    }
}
