//! Inline emission of native functions.

use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};
use cranelift_codegen::ir::{InstBuilder, Value, types};
use quill_core::{CodegenError, PrimitiveKind};
use quill_registry::{ArithOp, CompareOp, FuncId, LogicOp, NativeOp, TypeId};

use super::function::FunctionLowering;
use super::layout::{
    ARRAY_CAPACITY_OFFSET, ARRAY_DATA_OFFSET, ARRAY_LENGTH_OFFSET, METADATA_OFFSET, POINTER_TYPE,
    STRING_DATA_OFFSET, STRING_OBJECT_SIZE, is_unsigned, primitive_type, value_type,
};
use crate::runtime::RuntimeFn;

/// How a value is handed to the formatting and printing runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Formatter {
    Integer,
    Float,
    Bool,
    Char,
    Str,
}

impl Formatter {
    fn format_fn(self) -> RuntimeFn {
        match self {
            Formatter::Integer => RuntimeFn::FmtI64,
            Formatter::Float => RuntimeFn::FmtF64,
            Formatter::Bool => RuntimeFn::FmtBool,
            Formatter::Char => RuntimeFn::FmtChar,
            Formatter::Str => RuntimeFn::FmtStr,
        }
    }

    fn print_fn(self) -> RuntimeFn {
        match self {
            Formatter::Integer => RuntimeFn::PrintI64,
            Formatter::Float => RuntimeFn::PrintF64,
            Formatter::Bool => RuntimeFn::PrintBool,
            Formatter::Char => RuntimeFn::PrintChar,
            Formatter::Str => RuntimeFn::PrintStr,
        }
    }
}

impl<'g, 'c, 'ast, 'f> FunctionLowering<'g, 'c, 'ast, 'f> {
    /// Emit `op` for a call to the native `target`.
    ///
    /// `receiver` is set for methods (`String`, array and pointer natives
    /// and `to_string`); operator class functions take both operands in
    /// `args`.
    pub(super) fn emit_native(
        &mut self,
        op: NativeOp,
        target: FuncId,
        receiver: Option<Value>,
        args: &[Value],
    ) -> Result<Option<Value>, CodegenError> {
        let registry = self.registry();
        let function = registry.function(target);
        let owner = function.owner;
        let owner_type = || owner.ok_or_else(|| CodegenError::internal("native function without an owner type"));
        let owner_kind = || {
            owner_type().and_then(|owner| {
                registry
                    .primitive_kind(owner)
                    .ok_or_else(|| CodegenError::internal("native operator on a non-primitive"))
            })
        };
        let arg = |index: usize| -> Result<Value, CodegenError> {
            args.get(index)
                .copied()
                .ok_or_else(|| CodegenError::internal(format!("native call is missing argument {index}")))
        };
        let this = || receiver.ok_or_else(|| CodegenError::internal("native method without a receiver"));

        let value = match op {
            NativeOp::Arith(op) => Some(self.arith(op, owner_kind()?, arg(0)?, arg(1)?)?),
            NativeOp::Compare(op) => Some(self.compare(op, owner_kind()?, arg(0)?, arg(1)?)),
            NativeOp::Logic(LogicOp::And) => Some(self.builder.ins().band(arg(0)?, arg(1)?)),
            NativeOp::Logic(LogicOp::Or) => Some(self.builder.ins().bor(arg(0)?, arg(1)?)),
            NativeOp::Negate => {
                let value = arg(0)?;
                Some(if owner_kind()?.is_float() {
                    self.builder.ins().fneg(value)
                } else {
                    self.builder.ins().ineg(value)
                })
            }
            NativeOp::Convert(to) => Some(self.convert(arg(0)?, owner_kind()?, to)),
            NativeOp::ToString => {
                let (formatter, value) = self.format_operand(this()?, owner_type()?);
                let prefix = self.builder.ins().iconst(POINTER_TYPE, 0);
                Some(self.format_string(formatter, prefix, value)?)
            }
            NativeOp::RefCompare { negate } => {
                let cond = if negate { IntCC::NotEqual } else { IntCC::Equal };
                Some(self.builder.ins().icmp(cond, arg(0)?, arg(1)?))
            }
            NativeOp::StringConcat => {
                let param = self.param_types(target)?[0];
                let (formatter, value) = self.format_operand(arg(0)?, param);
                Some(self.format_string(formatter, this()?, value)?)
            }
            NativeOp::StringEquals { negate } => {
                let equal = self.call_runtime_value(RuntimeFn::StringEq, &[this()?, arg(0)?])?;
                Some(if negate {
                    self.builder.ins().icmp_imm(IntCC::Equal, equal, 0)
                } else {
                    equal
                })
            }
            NativeOp::StringLength => {
                let length = self.call_runtime_value(RuntimeFn::StringLength, &[this()?])?;
                Some(self.builder.ins().ireduce(types::I32, length))
            }
            NativeOp::ArrayAdd => {
                let element = self.element_type(owner_type()?)?;
                let size = i64::from(registry.size_of(element));
                let size = self.builder.ins().iconst(types::I64, size);
                let slot = self.call_runtime_value(RuntimeFn::ArrayPushSlot, &[this()?, size])?;
                self.store(arg(0)?, slot, 0);
                None
            }
            NativeOp::ArrayLength | NativeOp::ArrayCapacity => {
                let offset = if op == NativeOp::ArrayLength {
                    ARRAY_LENGTH_OFFSET
                } else {
                    ARRAY_CAPACITY_OFFSET
                };
                let count = self.load(types::I64, this()?, offset);
                Some(self.builder.ins().ireduce(types::I32, count))
            }
            NativeOp::ArrayGet | NativeOp::PointerGet => {
                let element = self.element_type(owner_type()?)?;
                let base = self.element_base(op, this()?);
                let address = self.indexed_address(base, arg(0)?, element);
                Some(self.load(value_type(registry, element), address, 0))
            }
            NativeOp::ArraySet | NativeOp::PointerSet => {
                let element = self.element_type(owner_type()?)?;
                let base = self.element_base(op, this()?);
                let address = self.indexed_address(base, arg(0)?, element);
                self.store(arg(1)?, address, 0);
                None
            }
            NativeOp::PointerInit => {
                let element = self.element_type(owner_type()?)?;
                let count = self.builder.ins().sextend(types::I64, arg(0)?);
                let bytes = self.builder.ins().imul_imm(count, i64::from(registry.size_of(element)));
                Some(self.call_runtime_value(RuntimeFn::Alloc, &[bytes])?)
            }
            NativeOp::Print => {
                let param = self.param_types(target)?[0];
                let (formatter, value) = self.format_operand(arg(0)?, param);
                self.call_runtime(formatter.print_fn(), &[value])?;
                None
            }
        };
        Ok(value)
    }

    /// Arrays keep their elements behind the data pointer; a pointer is the
    /// buffer itself.
    fn element_base(&mut self, op: NativeOp, receiver: Value) -> Value {
        match op {
            NativeOp::ArrayGet | NativeOp::ArraySet => self.load(POINTER_TYPE, receiver, ARRAY_DATA_OFFSET),
            _ => receiver,
        }
    }

    fn arith(&mut self, op: ArithOp, kind: PrimitiveKind, a: Value, b: Value) -> Result<Value, CodegenError> {
        let ins = self.builder.ins();
        if kind.is_float() {
            return match op {
                ArithOp::Add => Ok(ins.fadd(a, b)),
                ArithOp::Sub => Ok(ins.fsub(a, b)),
                ArithOp::Mul => Ok(ins.fmul(a, b)),
                ArithOp::Div => Ok(ins.fdiv(a, b)),
                ArithOp::Rem => Err(CodegenError::internal("floating point remainder")),
            };
        }
        let unsigned = is_unsigned(kind);
        Ok(match op {
            ArithOp::Add => ins.iadd(a, b),
            ArithOp::Sub => ins.isub(a, b),
            ArithOp::Mul => ins.imul(a, b),
            ArithOp::Div if unsigned => ins.udiv(a, b),
            ArithOp::Div => ins.sdiv(a, b),
            ArithOp::Rem if unsigned => ins.urem(a, b),
            ArithOp::Rem => ins.srem(a, b),
        })
    }

    fn compare(&mut self, op: CompareOp, kind: PrimitiveKind, a: Value, b: Value) -> Value {
        if kind.is_float() {
            let cond = match op {
                CompareOp::Less => FloatCC::LessThan,
                CompareOp::LessEqual => FloatCC::LessThanOrEqual,
                CompareOp::Greater => FloatCC::GreaterThan,
                CompareOp::GreaterEqual => FloatCC::GreaterThanOrEqual,
                CompareOp::Equal => FloatCC::Equal,
                CompareOp::NotEqual => FloatCC::NotEqual,
            };
            return self.builder.ins().fcmp(cond, a, b);
        }
        let unsigned = is_unsigned(kind);
        let cond = match op {
            CompareOp::Less if unsigned => IntCC::UnsignedLessThan,
            CompareOp::Less => IntCC::SignedLessThan,
            CompareOp::LessEqual if unsigned => IntCC::UnsignedLessThanOrEqual,
            CompareOp::LessEqual => IntCC::SignedLessThanOrEqual,
            CompareOp::Greater if unsigned => IntCC::UnsignedGreaterThan,
            CompareOp::Greater => IntCC::SignedGreaterThan,
            CompareOp::GreaterEqual if unsigned => IntCC::UnsignedGreaterThanOrEqual,
            CompareOp::GreaterEqual => IntCC::SignedGreaterThanOrEqual,
            CompareOp::Equal => IntCC::Equal,
            CompareOp::NotEqual => IntCC::NotEqual,
        };
        self.builder.ins().icmp(cond, a, b)
    }

    /// Numeric conversion. Narrowing truncates, float to integer saturates
    /// and anything to `Bool` tests for non-zero.
    pub(super) fn convert(&mut self, value: Value, from: PrimitiveKind, to: PrimitiveKind) -> Value {
        if from == to {
            return value;
        }
        let (from_ty, to_ty) = (primitive_type(from), primitive_type(to));
        let ins = self.builder.ins();

        if to == PrimitiveKind::Bool {
            return if from.is_float() {
                let zero = if from_ty == types::F32 {
                    ins.f32const(0.0)
                } else {
                    ins.f64const(0.0)
                };
                self.builder.ins().fcmp(FloatCC::NotEqual, value, zero)
            } else {
                ins.icmp_imm(IntCC::NotEqual, value, 0)
            };
        }

        match (from.is_float(), to.is_float()) {
            (false, false) if to_ty.bits() > from_ty.bits() => {
                if is_unsigned(from) {
                    ins.uextend(to_ty, value)
                } else {
                    ins.sextend(to_ty, value)
                }
            }
            (false, false) if to_ty.bits() < from_ty.bits() => ins.ireduce(to_ty, value),
            (false, false) => value,
            (false, true) => {
                let unsigned = is_unsigned(from);
                let wide = if from_ty.bits() >= 32 {
                    value
                } else if unsigned {
                    ins.uextend(types::I32, value)
                } else {
                    ins.sextend(types::I32, value)
                };
                if unsigned {
                    self.builder.ins().fcvt_from_uint(to_ty, wide)
                } else {
                    self.builder.ins().fcvt_from_sint(to_ty, wide)
                }
            }
            (true, false) => {
                let int_ty = if to_ty.bits() < 32 { types::I32 } else { to_ty };
                let converted = ins.fcvt_to_sint_sat(int_ty, value);
                if int_ty == to_ty {
                    converted
                } else {
                    self.builder.ins().ireduce(to_ty, converted)
                }
            }
            (true, true) if to_ty.bits() > from_ty.bits() => ins.fpromote(to_ty, value),
            (true, true) => ins.fdemote(to_ty, value),
        }
    }

    /// Widen `value` of type `ty` to what its formatter takes.
    fn format_operand(&mut self, value: Value, ty: TypeId) -> (Formatter, Value) {
        match self.registry().primitive_kind(ty) {
            Some(PrimitiveKind::Bool) => (Formatter::Bool, value),
            Some(PrimitiveKind::Char) => (Formatter::Char, value),
            Some(PrimitiveKind::Short | PrimitiveKind::Int) => {
                (Formatter::Integer, self.builder.ins().sextend(types::I64, value))
            }
            Some(PrimitiveKind::Long) => (Formatter::Integer, value),
            Some(PrimitiveKind::Float) => (Formatter::Float, self.builder.ins().fpromote(types::F64, value)),
            Some(PrimitiveKind::Double) => (Formatter::Float, value),
            Some(PrimitiveKind::Null) | None => (Formatter::Str, value),
        }
    }

    /// Two-pass formatting into a fresh `String`: measure, allocate
    /// `length + 1` bytes, format into the buffer.
    fn format_string(&mut self, formatter: Formatter, prefix: Value, value: Value) -> Result<Value, CodegenError> {
        let format = formatter.format_fn();
        let null = self.builder.ins().iconst(POINTER_TYPE, 0);
        let zero = self.builder.ins().iconst(types::I64, 0);
        let length = self.call_runtime_value(format, &[null, zero, prefix, value])?;
        let capacity = self.builder.ins().iadd_imm(length, 1);
        let buffer = self.call_runtime_value(RuntimeFn::Alloc, &[capacity])?;
        self.call_runtime(format, &[buffer, capacity, prefix, value])?;
        self.new_string(buffer)
    }

    /// Wrap a NUL-terminated buffer in a `String` object.
    fn new_string(&mut self, data: Value) -> Result<Value, CodegenError> {
        let string = self.registry().builtins().string;
        let size = self.builder.ins().iconst(types::I64, STRING_OBJECT_SIZE);
        let object = self.call_runtime_value(RuntimeFn::Alloc, &[size])?;
        let metadata = self.generator.type_metadata(string)?;
        let metadata = self.data_address(metadata);
        self.store(metadata, object, METADATA_OFFSET);
        self.store(data, object, STRING_DATA_OFFSET);
        Ok(object)
    }
}
