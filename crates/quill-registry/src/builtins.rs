//! The pre-seeded types and native functions.
//!
//! | Owner      | Natives                                                    |
//! |------------|------------------------------------------------------------|
//! | numerics   | `+ - * / %`, `< <= > >=`, `neg`, `== !=`, `as T`, `to_string` |
//! | `Bool`     | `== !=`, `and or`, `as T`, `to_string`                      |
//! | `String`   | `+` (String, Int, Long, Double, Bool), `== !=`, `length`   |
//! | `Object`   | `== !=` (reference identity)                               |
//! | `T[]`      | `add`, `length`, `capacity`, `get`, `set`                  |
//! | `Pointer<T>` | `init`, `get`, `set`                                     |
//! | module     | `print` for String, Char, Int, Long, Double, Bool          |
//!
//! Array and pointer natives are installed when the type is first created,
//! see [`Registry::array_of`](crate::Registry::array_of).

use quill_core::{PrimitiveKind, Span};

use crate::function::{ArithOp, CompareOp, Function, FunctionFlags, LogicOp, NativeOp};
use crate::types::{Field, ObjectType, Type};
use crate::{Registry, TypeId};

/// Ids of the pre-seeded types.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    /// Indexed by the primitive's discriminant.
    pub primitives: [TypeId; 8],
    pub object: TypeId,
    pub string: TypeId,
    /// The `Pointer<T>` template; instances are [`Type::Pointer`].
    pub pointer: TypeId,
}

impl Builtins {
    pub(crate) fn placeholder() -> Self {
        let zero = TypeId::new(0);
        Builtins {
            primitives: [zero; 8],
            object: zero,
            string: zero,
            pointer: zero,
        }
    }
}

/// Name of the conversion native from the owning primitive to `target`.
pub fn conversion_name(target: PrimitiveKind) -> String {
    format!("as {target}")
}

const ARITH: [(&str, ArithOp); 5] = [
    ("+", ArithOp::Add),
    ("-", ArithOp::Sub),
    ("*", ArithOp::Mul),
    ("/", ArithOp::Div),
    ("%", ArithOp::Rem),
];

const RELATIONAL: [(&str, CompareOp); 4] = [
    ("<", CompareOp::Less),
    ("<=", CompareOp::LessEqual),
    (">", CompareOp::Greater),
    (">=", CompareOp::GreaterEqual),
];

const EQUALITY: [(&str, CompareOp); 2] = [("==", CompareOp::Equal), ("!=", CompareOp::NotEqual)];

pub(crate) fn install(registry: &mut Registry<'_>) {
    let span = Span::default();

    for kind in PrimitiveKind::NUMERIC.into_iter().chain([PrimitiveKind::Null]) {
        let id = registry.intern(kind.name(), Type::Primitive(kind));
        registry.builtins.primitives[u8::from(kind) as usize] = id;
    }

    let object = register_class(registry, "Object", ObjectType::default());
    registry.builtins.object = object;

    let pointer = register_class(
        registry,
        "Pointer",
        ObjectType {
            generic_params: vec!["T".to_string()],
            ..ObjectType::default()
        },
    );
    registry.builtins.pointer = pointer;

    let char_ptr = registry.pointer_of(registry.primitive(PrimitiveKind::Char));
    let string = register_class(
        registry,
        "String",
        ObjectType {
            fields: vec![Field {
                name: "data".to_string(),
                ty: char_ptr,
                span,
            }],
            ..ObjectType::default()
        },
    );
    registry.builtins.string = string;
    registry.link_class(string, object);

    install_primitive_natives(registry);
    install_string_natives(registry);

    let bool_ty = registry.primitive(PrimitiveKind::Bool);
    for (name, op) in EQUALITY {
        let negate = op == CompareOp::NotEqual;
        static_native(registry, object, name, NativeOp::RefCompare { negate }, vec![object, object], Some(bool_ty));
    }

    for kind in [
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Double,
        PrimitiveKind::Bool,
    ] {
        let param = registry.primitive(kind);
        global_native(registry, "print", NativeOp::Print, vec![param]);
    }
    global_native(registry, "print", NativeOp::Print, vec![string]);
}

fn register_class<'ast>(registry: &mut Registry<'ast>, name: &str, object: ObjectType<'ast>) -> TypeId {
    registry.intern(name, Type::Object(object))
}

fn install_primitive_natives(registry: &mut Registry<'_>) {
    let bool_ty = registry.primitive(PrimitiveKind::Bool);
    let string = registry.builtins.string;

    for kind in PrimitiveKind::NUMERIC {
        let ty = registry.primitive(kind);

        if kind != PrimitiveKind::Bool {
            for (name, op) in ARITH {
                // Cranelift has no float remainder.
                if op == ArithOp::Rem && kind.is_float() {
                    continue;
                }
                static_native(registry, ty, name, NativeOp::Arith(op), vec![ty, ty], Some(ty));
            }
            for (name, op) in RELATIONAL {
                static_native(registry, ty, name, NativeOp::Compare(op), vec![ty, ty], Some(bool_ty));
            }
            static_native(registry, ty, "neg", NativeOp::Negate, vec![ty], Some(ty));
        } else {
            static_native(registry, ty, "and", NativeOp::Logic(LogicOp::And), vec![ty, ty], Some(ty));
            static_native(registry, ty, "or", NativeOp::Logic(LogicOp::Or), vec![ty, ty], Some(ty));
        }

        for (name, op) in EQUALITY {
            static_native(registry, ty, name, NativeOp::Compare(op), vec![ty, ty], Some(bool_ty));
        }

        for target in PrimitiveKind::NUMERIC {
            if target != kind {
                let target_ty = registry.primitive(target);
                let name = conversion_name(target);
                static_native(registry, ty, &name, NativeOp::Convert(target), vec![ty], Some(target_ty));
            }
        }

        method_native(registry, ty, "to_string", NativeOp::ToString, vec![], Some(string));
    }
}

fn install_string_natives(registry: &mut Registry<'_>) {
    let string = registry.builtins.string;
    let bool_ty = registry.primitive(PrimitiveKind::Bool);
    let int = registry.primitive(PrimitiveKind::Int);

    let mut concat_params = vec![string];
    for kind in [PrimitiveKind::Int, PrimitiveKind::Long, PrimitiveKind::Double, PrimitiveKind::Bool] {
        concat_params.push(registry.primitive(kind));
    }
    for param in concat_params {
        method_native(registry, string, "+", NativeOp::StringConcat, vec![param], Some(string));
    }
    method_native(registry, string, "==", NativeOp::StringEquals { negate: false }, vec![string], Some(bool_ty));
    method_native(registry, string, "!=", NativeOp::StringEquals { negate: true }, vec![string], Some(bool_ty));
    method_native(registry, string, "length", NativeOp::StringLength, vec![], Some(int));
}

/// Native methods of a freshly created `T[]`.
pub(crate) fn install_array_natives(registry: &mut Registry<'_>, array: TypeId, element: TypeId) {
    let int = registry.primitive(PrimitiveKind::Int);
    method_native(registry, array, "add", NativeOp::ArrayAdd, vec![element], None);
    method_native(registry, array, "length", NativeOp::ArrayLength, vec![], Some(int));
    method_native(registry, array, "capacity", NativeOp::ArrayCapacity, vec![], Some(int));
    method_native(registry, array, "get", NativeOp::ArrayGet, vec![int], Some(element));
    method_native(registry, array, "set", NativeOp::ArraySet, vec![int, element], None);
}

/// Native methods of a freshly created `Pointer<T>`.
pub(crate) fn install_pointer_natives(registry: &mut Registry<'_>, pointer: TypeId, pointee: TypeId) {
    let int = registry.primitive(PrimitiveKind::Int);
    let mut init = Function::native("init", Some(pointer), NativeOp::PointerInit, vec![int], None);
    init.flags |= FunctionFlags::CONSTRUCTOR;
    let methods = registry.get(pointer).methods;
    let id = registry.add_function(init);
    registry.scopes_mut().insert(methods, "init", id);

    method_native(registry, pointer, "get", NativeOp::PointerGet, vec![int], Some(pointee));
    method_native(registry, pointer, "set", NativeOp::PointerSet, vec![int, pointee], None);
}

fn static_native(
    registry: &mut Registry<'_>,
    owner: TypeId,
    name: &str,
    op: NativeOp,
    params: Vec<TypeId>,
    ret: Option<TypeId>,
) {
    let mut function = Function::native(name, Some(owner), op, params, ret);
    function.flags |= FunctionFlags::STATIC;
    let scope = registry.get(owner).statics;
    let id = registry.add_function(function);
    registry.scopes_mut().insert(scope, name, id);
}

fn method_native(
    registry: &mut Registry<'_>,
    owner: TypeId,
    name: &str,
    op: NativeOp,
    params: Vec<TypeId>,
    ret: Option<TypeId>,
) {
    let function = Function::native(name, Some(owner), op, params, ret);
    let scope = registry.get(owner).methods;
    let id = registry.add_function(function);
    registry.scopes_mut().insert(scope, name, id);
}

fn global_native(registry: &mut Registry<'_>, name: &str, op: NativeOp, params: Vec<TypeId>) {
    let function = Function::native(name, None, op, params, None);
    let scope = registry.module_scope();
    let id = registry.add_function(function);
    registry.scopes_mut().insert(scope, name, id);
}
