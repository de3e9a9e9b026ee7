//! Growable array records.

use std::ptr;

use super::alloc::{resize, zeroed};

/// Matches the offsets in [`crate::codegen::layout`].
#[repr(C)]
#[derive(Debug)]
pub(crate) struct ArrayRecord {
    pub length: i64,
    pub capacity: i64,
    pub data: *mut u8,
}

const MIN_CAPACITY: u64 = 8;

pub(crate) fn initial_capacity(length: i64) -> i64 {
    (length.max(0) as u64).next_power_of_two().max(MIN_CAPACITY) as i64
}

/// A new array of `length` zeroed elements.
pub(crate) unsafe extern "C" fn quill_array_new(length: i64, elem_size: i64) -> *mut ArrayRecord {
    let length = length.max(0);
    let capacity = initial_capacity(length);
    unsafe {
        let record: *mut ArrayRecord = zeroed(1, std::mem::size_of::<ArrayRecord>()).cast();
        let data = zeroed(capacity as usize, elem_size.max(1) as usize);
        record.write(ArrayRecord {
            length,
            capacity,
            data,
        });
        record
    }
}

/// Append a zeroed element and return its address for the caller to fill.
///
/// Capacity doubles exactly when the new length would exceed it.
pub(crate) unsafe extern "C" fn quill_array_push_slot(array: *mut ArrayRecord, elem_size: i64) -> *mut u8 {
    let elem_size = elem_size.max(1) as usize;
    unsafe {
        let record = &mut *array;
        if record.length + 1 > record.capacity {
            let old = record.capacity as usize;
            let grown = old * 2;
            let data = resize(record.data, grown.saturating_mul(elem_size));
            ptr::write_bytes(data.add(old * elem_size), 0, (grown - old) * elem_size);
            record.data = data;
            record.capacity = grown as i64;
        }
        let slot = record.data.add(record.length as usize * elem_size);
        record.length += 1;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_capacity_is_a_power_of_two_at_least_eight() {
        assert_eq!(initial_capacity(0), 8);
        assert_eq!(initial_capacity(3), 8);
        assert_eq!(initial_capacity(8), 8);
        assert_eq!(initial_capacity(9), 16);
        assert_eq!(initial_capacity(100), 128);
    }

    #[test]
    fn ninth_push_doubles_capacity() {
        unsafe {
            let array = quill_array_new(0, 4);
            for i in 0..8 {
                quill_array_push_slot(array, 4).cast::<i32>().write(i);
            }
            assert_eq!((*array).capacity, 8);
            quill_array_push_slot(array, 4).cast::<i32>().write(8);
            assert_eq!((*array).length, 9);
            assert_eq!((*array).capacity, 16);
            let values = std::slice::from_raw_parts((*array).data.cast::<i32>(), 9);
            assert_eq!(values, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        }
    }

    #[test]
    fn new_elements_are_zeroed() {
        unsafe {
            let array = quill_array_new(3, 8);
            assert_eq!((*array).length, 3);
            let values = std::slice::from_raw_parts((*array).data.cast::<i64>(), 3);
            assert_eq!(values, &[0, 0, 0]);
        }
    }
}
