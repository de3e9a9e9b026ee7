//! Heap allocation for objects, strings and pointer buffers.
//!
//! Memory is zero-filled and never freed. A failed allocation aborts
//! through [`std::alloc::handle_alloc_error`].

use std::alloc::{Layout, handle_alloc_error};

const ALIGN: usize = 8;

/// `ptr` if the allocator returned memory, otherwise the layout that could
/// not be satisfied.
pub(crate) fn non_null(ptr: *mut u8, size: usize) -> Result<*mut u8, Layout> {
    if !ptr.is_null() {
        return Ok(ptr);
    }
    Err(Layout::from_size_align(size, ALIGN).unwrap_or(Layout::new::<u64>()))
}

/// `count * size` zeroed bytes.
pub(crate) unsafe fn zeroed(count: usize, size: usize) -> *mut u8 {
    let ptr = unsafe { libc::calloc(count, size).cast() };
    non_null(ptr, count.saturating_mul(size)).unwrap_or_else(|layout| handle_alloc_error(layout))
}

/// Resize `ptr` to `size` bytes, keeping its contents.
pub(crate) unsafe fn resize(ptr: *mut u8, size: usize) -> *mut u8 {
    let ptr = unsafe { libc::realloc(ptr.cast(), size).cast() };
    non_null(ptr, size).unwrap_or_else(|layout| handle_alloc_error(layout))
}

/// Allocate `size` zeroed bytes.
pub(crate) unsafe extern "C" fn quill_alloc(size: i64) -> *mut u8 {
    let size = size.max(1) as usize;
    unsafe { zeroed(1, size) }
}
