//! String formatting and comparison.
//!
//! The `quill_fmt_*` functions follow `snprintf` semantics: they write at
//! most `cap - 1` bytes of `prefix` followed by the formatted value into
//! `buf`, NUL-terminate it, and return the full length. Generated code calls
//! each formatter twice, first with a null buffer to learn the length and
//! then with a buffer of `length + 1` bytes.

use std::ffi::{CStr, c_char};

use crate::codegen::layout::STRING_DATA_OFFSET;

/// Bytes of a `String` object, empty for null.
pub(crate) unsafe fn string_bytes<'a>(object: *const u8) -> &'a [u8] {
    if object.is_null() {
        return &[];
    }
    unsafe {
        let data = object.add(STRING_DATA_OFFSET as usize).cast::<*const c_char>().read();
        if data.is_null() {
            &[]
        } else {
            CStr::from_ptr(data).to_bytes()
        }
    }
}

/// Copy the text of a `String` object out of generated code's memory.
///
/// # Safety
///
/// `object` must be null or point to a live `String` object.
pub unsafe fn read_string(object: *const u8) -> Option<String> {
    if object.is_null() {
        return None;
    }
    let bytes = unsafe { string_bytes(object) };
    Some(String::from_utf8_lossy(bytes).into_owned())
}

unsafe fn format_into(buf: *mut u8, cap: i64, prefix: *const u8, value: &[u8]) -> i64 {
    unsafe {
        let prefix = string_bytes(prefix);
        let total = prefix.len() + value.len();
        if !buf.is_null() && cap > 0 {
            let room = (cap as usize - 1).min(total);
            let from_prefix = room.min(prefix.len());
            buf.copy_from_nonoverlapping(prefix.as_ptr(), from_prefix);
            buf.add(from_prefix)
                .copy_from_nonoverlapping(value.as_ptr(), room - from_prefix);
            buf.add(room).write(0);
        }
        total as i64
    }
}

pub(crate) unsafe extern "C" fn quill_fmt_i64(buf: *mut u8, cap: i64, prefix: *const u8, value: i64) -> i64 {
    unsafe { format_into(buf, cap, prefix, value.to_string().as_bytes()) }
}

pub(crate) unsafe extern "C" fn quill_fmt_f64(buf: *mut u8, cap: i64, prefix: *const u8, value: f64) -> i64 {
    unsafe { format_into(buf, cap, prefix, value.to_string().as_bytes()) }
}

pub(crate) unsafe extern "C" fn quill_fmt_bool(buf: *mut u8, cap: i64, prefix: *const u8, value: u8) -> i64 {
    let text: &[u8] = if value != 0 { b"true" } else { b"false" };
    unsafe { format_into(buf, cap, prefix, text) }
}

pub(crate) unsafe extern "C" fn quill_fmt_char(buf: *mut u8, cap: i64, prefix: *const u8, value: u8) -> i64 {
    unsafe { format_into(buf, cap, prefix, &[value]) }
}

pub(crate) unsafe extern "C" fn quill_fmt_str(buf: *mut u8, cap: i64, prefix: *const u8, value: *const u8) -> i64 {
    unsafe { format_into(buf, cap, prefix, string_bytes(value)) }
}

/// Content equality; two nulls are equal.
pub(crate) unsafe extern "C" fn quill_string_eq(a: *const u8, b: *const u8) -> u8 {
    let equal = match (a.is_null(), b.is_null()) {
        (true, true) => true,
        (false, false) => unsafe { string_bytes(a) == string_bytes(b) },
        _ => false,
    };
    u8::from(equal)
}

pub(crate) unsafe extern "C" fn quill_string_length(object: *const u8) -> i64 {
    unsafe { string_bytes(object).len() as i64 }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A heap `String` object around `text`, laid out like generated ones.
    pub(crate) fn string_object(text: &str) -> *const u8 {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        let data = Box::leak(data.into_boxed_slice()).as_ptr();
        let object = Box::leak(Box::new([0usize; 3]));
        object[2] = data as usize;
        object.as_ptr().cast()
    }

    fn two_pass(format: impl Fn(*mut u8, i64) -> i64) -> String {
        let length = format(std::ptr::null_mut(), 0);
        let mut buf = vec![0xffu8; length as usize + 1];
        let written = format(buf.as_mut_ptr(), length + 1);
        assert_eq!(written, length);
        assert_eq!(buf[length as usize], 0);
        buf.truncate(length as usize);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn dry_run_reports_length() {
        let prefix = string_object("n=");
        let length = unsafe { quill_fmt_i64(std::ptr::null_mut(), 0, prefix, -42) };
        assert_eq!(length, 5);
    }

    #[test]
    fn formats_with_prefix() {
        let prefix = string_object("x: ");
        assert_eq!(two_pass(|b, c| unsafe { quill_fmt_i64(b, c, prefix, 7) }), "x: 7");
        assert_eq!(two_pass(|b, c| unsafe { quill_fmt_f64(b, c, prefix, 5.5) }), "x: 5.5");
        assert_eq!(two_pass(|b, c| unsafe { quill_fmt_bool(b, c, prefix, 1) }), "x: true");
        assert_eq!(two_pass(|b, c| unsafe { quill_fmt_char(b, c, prefix, b'q') }), "x: q");
    }

    #[test]
    fn null_prefix_formats_the_value_alone() {
        let text = two_pass(|b, c| unsafe { quill_fmt_bool(b, c, std::ptr::null(), 0) });
        assert_eq!(text, "false");
    }

    #[test]
    fn concatenates_strings() {
        let (a, b) = (string_object("foo"), string_object("bar"));
        assert_eq!(two_pass(|buf, c| unsafe { quill_fmt_str(buf, c, a, b) }), "foobar");
    }

    #[test]
    fn short_buffer_truncates() {
        let prefix = string_object("abc");
        let mut buf = [0xffu8; 3];
        let length = unsafe { quill_fmt_i64(buf.as_mut_ptr(), 3, prefix, 12) };
        assert_eq!(length, 5);
        assert_eq!(&buf, b"ab\0");
    }

    #[test]
    fn reads_string_objects() {
        unsafe {
            assert_eq!(read_string(string_object("quill")).as_deref(), Some("quill"));
            assert_eq!(read_string(std::ptr::null()), None);
        }
    }

    #[test]
    fn equality_and_length() {
        let (a, b, c) = (string_object("hey"), string_object("hey"), string_object("hi"));
        unsafe {
            assert_eq!(quill_string_eq(a, b), 1);
            assert_eq!(quill_string_eq(a, c), 0);
            assert_eq!(quill_string_eq(std::ptr::null(), std::ptr::null()), 1);
            assert_eq!(quill_string_eq(a, std::ptr::null()), 0);
            assert_eq!(quill_string_length(c), 2);
            assert_eq!(quill_string_length(std::ptr::null()), 0);
        }
    }
}
