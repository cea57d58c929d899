use std::marker::PhantomData;

use crate::backend::{measure_gas, GasMeter, Order, Storage};
use crate::iterator::{build_iterator, FfiIterator};
use crate::iterators::{self, RegistryError};
use crate::memory::{assert_slot_empty, write_slot, U8SliceView, UnmanagedVector};
use crate::panic::contain;
use crate::status::{bad_argument, StatusCode};

// this represents something passed in from the caller side of FFI
#[repr(C)]
pub struct db_t {
    _private: [u8; 0],
}

// this represents something passed in from the caller side of FFI
#[repr(C)]
pub struct gas_meter_t {
    _private: [u8; 0],
}

// These functions return a raw i32 because the caller cannot trust the other side
// to only return known values. Convert with `StatusCode::from`.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct DbVtable {
    pub read_db: extern "C" fn(
        *mut db_t,
        *const gas_meter_t,
        *mut u64,
        U8SliceView,
        *mut UnmanagedVector, // result output
        *mut UnmanagedVector, // error message output
    ) -> i32,
    pub write_db: extern "C" fn(
        *mut db_t,
        *const gas_meter_t,
        *mut u64,
        U8SliceView,
        U8SliceView,
        *mut UnmanagedVector, // error message output
    ) -> i32,
    pub remove_db: extern "C" fn(
        *mut db_t,
        *const gas_meter_t,
        *mut u64,
        U8SliceView,
        *mut UnmanagedVector, // error message output
    ) -> i32,
    // order -> Ascending = 1, Descending = 2
    pub scan_db: extern "C" fn(
        *mut db_t,
        *const gas_meter_t,
        *mut u64,
        U8SliceView,
        U8SliceView,
        i32,
        *mut FfiIterator,
        *mut UnmanagedVector, // error message output
    ) -> i32,
}

/// The store of one call along with the call ID under which iterators
/// created through this store are registered (see [`crate::start_call`]).
pub struct DbState<S: Storage> {
    pub store: S,
    pub iterator_stack_id: u64,
}

impl<S: Storage> DbState<S> {
    pub fn new(store: S, iterator_stack_id: u64) -> Self {
        DbState {
            store,
            iterator_stack_id,
        }
    }
}

/// The store as handed to the caller. Only valid as long as the `DbState`
/// and gas meter it was built from, which the lifetime enforces.
#[repr(C)]
pub struct Db<'a> {
    pub gas_meter: *const gas_meter_t,
    pub state: *mut db_t,
    pub vtable: DbVtable,
    _lifetime: PhantomData<&'a mut ()>,
}

pub fn build_db<'a, S: Storage, G: GasMeter>(
    state: &'a mut DbState<S>,
    gas_meter: &'a G,
) -> Db<'a> {
    Db {
        gas_meter: gas_meter as *const G as *const gas_meter_t,
        state: state as *mut DbState<S> as *mut db_t,
        vtable: DbVtable {
            read_db: c_get::<S, G>,
            write_db: c_set::<S, G>,
            remove_db: c_delete::<S, G>,
            scan_db: c_scan::<S, G>,
        },
        _lifetime: PhantomData,
    }
}

extern "C" fn c_get<S: Storage, G: GasMeter>(
    ptr: *mut db_t,
    gas_meter: *const gas_meter_t,
    used_gas: *mut u64,
    key: U8SliceView,
    value_out: *mut UnmanagedVector,
    error_msg: *mut UnmanagedVector,
) -> i32 {
    contain("get", error_msg, || {
        if ptr.is_null()
            || gas_meter.is_null()
            || used_gas.is_null()
            || value_out.is_null()
            || error_msg.is_null()
        {
            return bad_argument("get");
        }
        unsafe {
            assert_slot_empty(value_out);
            assert_slot_empty(error_msg);
        }
        let Some(key) = key.read() else {
            return bad_argument("get");
        };

        let state = unsafe { &*(ptr as *const DbState<S>) };
        let gas_meter = unsafe { &*(gas_meter as *const G) };
        let (value, gas_used) = measure_gas(|| gas_meter.gas_consumed(), || state.store.get(key));

        unsafe {
            used_gas.write(gas_used);
            // None when the key is missing, which is different from an empty value
            write_slot(value_out, value);
        }
        StatusCode::Ok
    })
}

extern "C" fn c_set<S: Storage, G: GasMeter>(
    ptr: *mut db_t,
    gas_meter: *const gas_meter_t,
    used_gas: *mut u64,
    key: U8SliceView,
    value: U8SliceView,
    error_msg: *mut UnmanagedVector,
) -> i32 {
    contain("set", error_msg, || {
        if ptr.is_null() || gas_meter.is_null() || used_gas.is_null() || error_msg.is_null() {
            return bad_argument("set");
        }
        unsafe { assert_slot_empty(error_msg) };
        let (Some(key), Some(value)) = (key.read(), value.read()) else {
            return bad_argument("set");
        };

        let state = unsafe { &mut *(ptr as *mut DbState<S>) };
        let gas_meter = unsafe { &*(gas_meter as *const G) };
        let ((), gas_used) = measure_gas(
            || gas_meter.gas_consumed(),
            || state.store.set(key, value),
        );

        unsafe { used_gas.write(gas_used) };
        StatusCode::Ok
    })
}

extern "C" fn c_delete<S: Storage, G: GasMeter>(
    ptr: *mut db_t,
    gas_meter: *const gas_meter_t,
    used_gas: *mut u64,
    key: U8SliceView,
    error_msg: *mut UnmanagedVector,
) -> i32 {
    contain("delete", error_msg, || {
        if ptr.is_null() || gas_meter.is_null() || used_gas.is_null() || error_msg.is_null() {
            return bad_argument("delete");
        }
        unsafe { assert_slot_empty(error_msg) };
        let Some(key) = key.read() else {
            return bad_argument("delete");
        };

        let state = unsafe { &mut *(ptr as *mut DbState<S>) };
        let gas_meter = unsafe { &*(gas_meter as *const G) };
        let ((), gas_used) = measure_gas(|| gas_meter.gas_consumed(), || state.store.remove(key));

        unsafe { used_gas.write(gas_used) };
        StatusCode::Ok
    })
}

#[allow(clippy::too_many_arguments)]
extern "C" fn c_scan<S: Storage, G: GasMeter>(
    ptr: *mut db_t,
    gas_meter: *const gas_meter_t,
    used_gas: *mut u64,
    start: U8SliceView,
    end: U8SliceView,
    order: i32,
    out: *mut FfiIterator,
    error_msg: *mut UnmanagedVector,
) -> i32 {
    contain("scan", error_msg, || {
        if ptr.is_null()
            || gas_meter.is_null()
            || used_gas.is_null()
            || out.is_null()
            || error_msg.is_null()
        {
            return bad_argument("scan");
        }
        unsafe { assert_slot_empty(error_msg) };
        let Ok(order) = Order::try_from(order) else {
            return bad_argument("scan");
        };

        let state = unsafe { &*(ptr as *const DbState<S>) };
        let call_id = state.iterator_stack_id;
        // no store access for a call that was never started or already ended
        if !iterators::has_frame(call_id) {
            return bad_argument("scan");
        }

        let gas_meter_ref = unsafe { &*(gas_meter as *const G) };
        // only the creation is metered here, every step is metered by `next`
        let (iterator, gas_used) = measure_gas(
            || gas_meter_ref.gas_consumed(),
            || state.store.iterator(start.read(), end.read(), order),
        );
        unsafe { used_gas.write(gas_used) };

        match iterators::store_iterator(call_id, iterator) {
            Ok(index) => {
                unsafe { out.write(build_iterator::<G>(gas_meter, call_id, index)) };
                StatusCode::Ok
            }
            Err(err @ RegistryError::LimitReached { .. }) => {
                unsafe { write_slot(error_msg, Some(err.to_string().into_bytes())) };
                StatusCode::User
            }
            Err(err) => {
                log::warn!("Cannot register iterator: {err}");
                StatusCode::BadArgument
            }
        }
    })
}
