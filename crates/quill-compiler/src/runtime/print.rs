//! The global `print` overloads. Each call writes one line.

use std::cell::RefCell;
use std::io::Write;

use super::string::string_bytes;

thread_local! {
    static STDOUT_CAPTURE: RefCell<Option<Box<dyn Write + Send>>> = const { RefCell::new(None) };
}

/// Redirect `print` output of the current thread. `None` restores stdout.
pub fn set_stdout_capture(writer: Option<Box<dyn Write + Send>>) {
    STDOUT_CAPTURE.with(|cell| {
        *cell.borrow_mut() = writer;
    });
}

fn writeln_stdout(bytes: &[u8]) {
    STDOUT_CAPTURE.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let result = match borrow.as_mut() {
            Some(writer) => writer.write_all(bytes).and_then(|()| writer.write_all(b"\n")),
            None => {
                let mut out = std::io::stdout().lock();
                out.write_all(bytes).and_then(|()| out.write_all(b"\n"))
            }
        };
        // Output errors cannot be reported back to generated code.
        let _ = result;
    });
}

pub(crate) extern "C" fn quill_print_i64(value: i64) {
    writeln_stdout(value.to_string().as_bytes());
}

pub(crate) extern "C" fn quill_print_f64(value: f64) {
    writeln_stdout(value.to_string().as_bytes());
}

pub(crate) extern "C" fn quill_print_bool(value: u8) {
    writeln_stdout(if value != 0 { b"true" } else { b"false" });
}

pub(crate) extern "C" fn quill_print_char(value: u8) {
    writeln_stdout(&[value]);
}

pub(crate) unsafe extern "C" fn quill_print_str(object: *const u8) {
    writeln_stdout(unsafe { string_bytes(object) });
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::runtime::string::tests::string_object;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn captured_lines() {
        let out = Shared::default();
        set_stdout_capture(Some(Box::new(out.clone())));
        quill_print_i64(-3);
        quill_print_f64(2.5);
        quill_print_bool(1);
        quill_print_char(b'z');
        unsafe { quill_print_str(string_object("done")) };
        set_stdout_capture(None);

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "-3\n2.5\ntrue\nz\ndone\n");
    }
}
