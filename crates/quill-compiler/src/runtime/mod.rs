//! Host functions called from generated code.
//!
//! Every callable is listed once in [`RuntimeFn`] with its symbol name,
//! address and ABI signature. The JIT registers all of them up front and the
//! code generator imports them on first use.

mod alloc;
mod array;
mod print;
mod string;

pub use print::set_stdout_capture;
pub use string::read_string;

/// A runtime callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFn {
    Alloc,
    ArrayNew,
    ArrayPushSlot,
    StringEq,
    StringLength,
    FmtI64,
    FmtF64,
    FmtBool,
    FmtChar,
    FmtStr,
    PrintI64,
    PrintF64,
    PrintBool,
    PrintChar,
    PrintStr,
}

/// ABI-level parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiTy {
    Ptr,
    I8,
    I64,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigSpec {
    pub params: &'static [AbiTy],
    pub ret: Option<AbiTy>,
}

/// `(buf, cap, prefix, value) -> length`
const fn fmt_sig(value: AbiTy) -> SigSpec {
    SigSpec {
        params: match value {
            AbiTy::Ptr => &[AbiTy::Ptr, AbiTy::I64, AbiTy::Ptr, AbiTy::Ptr],
            AbiTy::I8 => &[AbiTy::Ptr, AbiTy::I64, AbiTy::Ptr, AbiTy::I8],
            AbiTy::I64 => &[AbiTy::Ptr, AbiTy::I64, AbiTy::Ptr, AbiTy::I64],
            AbiTy::F64 => &[AbiTy::Ptr, AbiTy::I64, AbiTy::Ptr, AbiTy::F64],
        },
        ret: Some(AbiTy::I64),
    }
}

impl RuntimeFn {
    pub const ALL: [RuntimeFn; 15] = [
        RuntimeFn::Alloc,
        RuntimeFn::ArrayNew,
        RuntimeFn::ArrayPushSlot,
        RuntimeFn::StringEq,
        RuntimeFn::StringLength,
        RuntimeFn::FmtI64,
        RuntimeFn::FmtF64,
        RuntimeFn::FmtBool,
        RuntimeFn::FmtChar,
        RuntimeFn::FmtStr,
        RuntimeFn::PrintI64,
        RuntimeFn::PrintF64,
        RuntimeFn::PrintBool,
        RuntimeFn::PrintChar,
        RuntimeFn::PrintStr,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            RuntimeFn::Alloc => "quill_alloc",
            RuntimeFn::ArrayNew => "quill_array_new",
            RuntimeFn::ArrayPushSlot => "quill_array_push_slot",
            RuntimeFn::StringEq => "quill_string_eq",
            RuntimeFn::StringLength => "quill_string_length",
            RuntimeFn::FmtI64 => "quill_fmt_i64",
            RuntimeFn::FmtF64 => "quill_fmt_f64",
            RuntimeFn::FmtBool => "quill_fmt_bool",
            RuntimeFn::FmtChar => "quill_fmt_char",
            RuntimeFn::FmtStr => "quill_fmt_str",
            RuntimeFn::PrintI64 => "quill_print_i64",
            RuntimeFn::PrintF64 => "quill_print_f64",
            RuntimeFn::PrintBool => "quill_print_bool",
            RuntimeFn::PrintChar => "quill_print_char",
            RuntimeFn::PrintStr => "quill_print_str",
        }
    }

    pub fn address(self) -> *const u8 {
        match self {
            RuntimeFn::Alloc => alloc::quill_alloc as *const u8,
            RuntimeFn::ArrayNew => array::quill_array_new as *const u8,
            RuntimeFn::ArrayPushSlot => array::quill_array_push_slot as *const u8,
            RuntimeFn::StringEq => string::quill_string_eq as *const u8,
            RuntimeFn::StringLength => string::quill_string_length as *const u8,
            RuntimeFn::FmtI64 => string::quill_fmt_i64 as *const u8,
            RuntimeFn::FmtF64 => string::quill_fmt_f64 as *const u8,
            RuntimeFn::FmtBool => string::quill_fmt_bool as *const u8,
            RuntimeFn::FmtChar => string::quill_fmt_char as *const u8,
            RuntimeFn::FmtStr => string::quill_fmt_str as *const u8,
            RuntimeFn::PrintI64 => print::quill_print_i64 as *const u8,
            RuntimeFn::PrintF64 => print::quill_print_f64 as *const u8,
            RuntimeFn::PrintBool => print::quill_print_bool as *const u8,
            RuntimeFn::PrintChar => print::quill_print_char as *const u8,
            RuntimeFn::PrintStr => print::quill_print_str as *const u8,
        }
    }

    pub fn signature(self) -> SigSpec {
        use AbiTy::*;
        match self {
            RuntimeFn::Alloc => SigSpec {
                params: &[I64],
                ret: Some(Ptr),
            },
            RuntimeFn::ArrayNew => SigSpec {
                params: &[I64, I64],
                ret: Some(Ptr),
            },
            RuntimeFn::ArrayPushSlot => SigSpec {
                params: &[Ptr, I64],
                ret: Some(Ptr),
            },
            RuntimeFn::StringEq => SigSpec {
                params: &[Ptr, Ptr],
                ret: Some(I8),
            },
            RuntimeFn::StringLength => SigSpec {
                params: &[Ptr],
                ret: Some(I64),
            },
            RuntimeFn::FmtI64 => fmt_sig(I64),
            RuntimeFn::FmtF64 => fmt_sig(F64),
            RuntimeFn::FmtBool | RuntimeFn::FmtChar => fmt_sig(I8),
            RuntimeFn::FmtStr => fmt_sig(Ptr),
            RuntimeFn::PrintI64 => SigSpec {
                params: &[I64],
                ret: None,
            },
            RuntimeFn::PrintF64 => SigSpec {
                params: &[F64],
                ret: None,
            },
            RuntimeFn::PrintBool | RuntimeFn::PrintChar => SigSpec {
                params: &[I8],
                ret: None,
            },
            RuntimeFn::PrintStr => SigSpec {
                params: &[Ptr],
                ret: None,
            },
        }
    }
}
