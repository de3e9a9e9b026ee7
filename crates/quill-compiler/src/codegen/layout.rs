//! Machine representation of Quill values and heap records.
//!
//! Objects:
//!
//! ```text
//! +0   vtable pointer (null when the class has no virtual methods)
//! +8   type metadata pointer
//! +16  instance variables, one 8-byte word each, superclass fields first
//! ```
//!
//! Type metadata is `{ hash: u64, name: *const c_char, parent: *const Metadata }`.
//! Arrays are `{ length: i64, capacity: i64, data: *mut T }` with elements
//! stored at their natural width. A `String` is an object whose single field
//! is a NUL-terminated `char*`.

use cranelift_codegen::ir::{AbiParam, Type, types};
use quill_core::PrimitiveKind;
use quill_registry::{Registry, TypeId};

pub const WORD: i32 = 8;
pub const POINTER_TYPE: Type = types::I64;

pub const VTABLE_OFFSET: i32 = 0;
pub const METADATA_OFFSET: i32 = 8;
pub const FIELDS_OFFSET: i32 = 16;
pub const STRING_DATA_OFFSET: i32 = FIELDS_OFFSET;
pub const STRING_OBJECT_SIZE: i64 = (FIELDS_OFFSET + WORD) as i64;

pub const METADATA_HASH_OFFSET: usize = 0;
pub const METADATA_NAME_OFFSET: usize = 8;
pub const METADATA_PARENT_OFFSET: usize = 16;
pub const METADATA_SIZE: usize = 24;

pub const ARRAY_LENGTH_OFFSET: i32 = 0;
pub const ARRAY_CAPACITY_OFFSET: i32 = 8;
pub const ARRAY_DATA_OFFSET: i32 = 16;

#[inline]
pub fn field_offset(slot: usize) -> i32 {
    FIELDS_OFFSET + WORD * slot as i32
}

#[inline]
pub fn object_size(fields: usize) -> i64 {
    i64::from(FIELDS_OFFSET) + i64::from(WORD) * fields as i64
}

/// Cranelift type of a primitive value.
pub fn primitive_type(kind: PrimitiveKind) -> Type {
    match kind {
        PrimitiveKind::Bool | PrimitiveKind::Char => types::I8,
        PrimitiveKind::Short => types::I16,
        PrimitiveKind::Int => types::I32,
        PrimitiveKind::Long => types::I64,
        PrimitiveKind::Float => types::F32,
        PrimitiveKind::Double => types::F64,
        PrimitiveKind::Null => POINTER_TYPE,
    }
}

/// Cranelift type of a value of `ty`. References are one pointer word.
pub fn value_type(registry: &Registry<'_>, ty: TypeId) -> Type {
    match registry.primitive_kind(ty) {
        Some(kind) => primitive_type(kind),
        None => POINTER_TYPE,
    }
}

/// Parameter or return slot of `ty`, extended the way C expects narrow
/// integers.
pub fn abi_param(registry: &Registry<'_>, ty: TypeId) -> AbiParam {
    let param = AbiParam::new(value_type(registry, ty));
    match registry.primitive_kind(ty) {
        Some(PrimitiveKind::Bool | PrimitiveKind::Char) => param.uext(),
        Some(PrimitiveKind::Short) => param.sext(),
        _ => param,
    }
}

/// Whether integer operations on `kind` are unsigned.
#[inline]
pub fn is_unsigned(kind: PrimitiveKind) -> bool {
    matches!(kind, PrimitiveKind::Bool | PrimitiveKind::Char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_follow_the_header() {
        assert_eq!(field_offset(0), 16);
        assert_eq!(field_offset(2), 32);
        assert_eq!(object_size(0), 16);
        assert_eq!(object_size(3), 40);
    }

    #[test]
    fn primitives_map_to_natural_widths() {
        for kind in PrimitiveKind::NUMERIC {
            assert_eq!(primitive_type(kind).bytes(), kind.byte_width());
        }
    }

    #[test]
    fn references_are_pointer_words() {
        let registry = Registry::new();
        assert_eq!(value_type(&registry, registry.builtins().string), POINTER_TYPE);
        assert_eq!(value_type(&registry, registry.primitive(PrimitiveKind::Int)), types::I32);
    }
}
