use std::marker::PhantomData;

use crate::backend::{measure_gas, GasMeter};
use crate::db::gas_meter_t;
use crate::iterators;
use crate::memory::{assert_slot_empty, write_slot, UnmanagedVector};
use crate::panic::contain;
use crate::status::{bad_argument, StatusCode};

/// A reference to an iterator in the registry. Opaque to the caller.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct iterator_t {
    /// An ID assigned to this contract call. 0 is never a valid call ID.
    pub call_id: u64,
    /// 1-based index of the iterator within the call's frame.
    pub iterator_index: u64,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct IteratorVtable {
    pub next_db: extern "C" fn(
        iterator_t,
        *const gas_meter_t,
        *mut u64,
        *mut UnmanagedVector, // key output
        *mut UnmanagedVector, // value output
        *mut UnmanagedVector, // error message output
    ) -> i32,
}

/// The iterator handed to the caller by `scan`.
#[repr(C)]
pub struct FfiIterator<'a> {
    pub gas_meter: *const gas_meter_t,
    pub state: iterator_t,
    pub vtable: IteratorVtable,
    _lifetime: PhantomData<&'a ()>,
}

impl FfiIterator<'_> {
    /// An iterator that does not point anywhere. The caller passes this as the
    /// output slot of `scan`.
    pub fn stub() -> Self {
        FfiIterator {
            gas_meter: std::ptr::null(),
            state: iterator_t::default(),
            vtable: IteratorVtable {
                next_db: c_next_stub,
            },
            _lifetime: PhantomData,
        }
    }
}

pub(crate) fn build_iterator<'a, G: GasMeter>(
    gas_meter: *const gas_meter_t,
    call_id: u64,
    iterator_index: u64,
) -> FfiIterator<'a> {
    FfiIterator {
        gas_meter,
        state: iterator_t {
            call_id,
            iterator_index,
        },
        vtable: IteratorVtable {
            next_db: c_next::<G>,
        },
        _lifetime: PhantomData,
    }
}

extern "C" fn c_next_stub(
    _iterator: iterator_t,
    _gas_meter: *const gas_meter_t,
    _used_gas: *mut u64,
    _key: *mut UnmanagedVector,
    _value: *mut UnmanagedVector,
    _error_msg: *mut UnmanagedVector,
) -> i32 {
    StatusCode::BadArgument.into()
}

extern "C" fn c_next<G: GasMeter>(
    iterator: iterator_t,
    gas_meter: *const gas_meter_t,
    used_gas: *mut u64,
    key_out: *mut UnmanagedVector,
    value_out: *mut UnmanagedVector,
    error_msg: *mut UnmanagedVector,
) -> i32 {
    contain("next", error_msg, || {
        if iterator.call_id == 0
            || gas_meter.is_null()
            || used_gas.is_null()
            || key_out.is_null()
            || value_out.is_null()
            || error_msg.is_null()
        {
            return bad_argument("next");
        }
        unsafe {
            assert_slot_empty(key_out);
            assert_slot_empty(value_out);
            assert_slot_empty(error_msg);
        }

        let gas_meter = unsafe { &*(gas_meter as *const G) };
        let step = iterators::with_iterator(iterator.call_id, iterator.iterator_index, |it| {
            if !it.valid() {
                return None;
            }
            // An iterator is created with its first entry loaded, so we read
            // the current entry and advance afterwards.
            Some(measure_gas(
                || gas_meter.gas_consumed(),
                || {
                    let record = (it.key().to_vec(), it.value().to_vec());
                    it.next();
                    record
                },
            ))
        });

        match step {
            Ok(Some(((key, value), gas_used))) => {
                unsafe {
                    used_gas.write(gas_used);
                    write_slot(key_out, Some(key));
                    write_slot(value_out, Some(value));
                }
                StatusCode::Ok
            }
            Ok(None) => {
                // end of iterator, both outputs stay None
                unsafe { used_gas.write(0) };
                StatusCode::Ok
            }
            Err(err) => {
                log::warn!("Cannot step iterator: {err}");
                StatusCode::BadArgument
            }
        }
    })
}
