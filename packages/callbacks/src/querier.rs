use std::marker::PhantomData;

use crate::backend::{measure_gas, Querier};
use crate::binary::Binary;
use crate::memory::{assert_slot_empty, write_slot, U8SliceView, UnmanagedVector};
use crate::panic::contain;
use crate::results::{ContractResult, SystemResult};
use crate::status::{bad_argument, StatusCode};

/// A Querier result as seen by the caller of `query_external`, serialized to JSON.
pub type QuerierResult = SystemResult<ContractResult<Binary>>;

// this represents something passed in from the caller side of FFI
#[repr(C)]
pub struct querier_t {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct QuerierVtable {
    pub query_external: extern "C" fn(
        *const querier_t,
        u64,
        *mut u64,
        U8SliceView,
        *mut UnmanagedVector, // result output
        *mut UnmanagedVector, // error message output
    ) -> i32,
}

#[repr(C)]
pub struct FfiQuerier<'a> {
    pub state: *const querier_t,
    pub vtable: QuerierVtable,
    _lifetime: PhantomData<&'a ()>,
}

pub fn build_querier<Q: Querier>(querier: &Q) -> FfiQuerier<'_> {
    FfiQuerier {
        state: querier as *const Q as *const querier_t,
        vtable: QuerierVtable {
            query_external: c_query_external::<Q>,
        },
        _lifetime: PhantomData,
    }
}

extern "C" fn c_query_external<Q: Querier>(
    ptr: *const querier_t,
    gas_limit: u64,
    used_gas: *mut u64,
    request: U8SliceView,
    result_out: *mut UnmanagedVector,
    error_msg: *mut UnmanagedVector,
) -> i32 {
    contain("query_external", error_msg, || {
        if ptr.is_null() || used_gas.is_null() || result_out.is_null() || error_msg.is_null() {
            return bad_argument("query_external");
        }
        unsafe {
            assert_slot_empty(result_out);
            assert_slot_empty(error_msg);
        }
        let Some(request) = request.read() else {
            return bad_argument("query_external");
        };

        let querier = unsafe { &*(ptr as *const Q) };
        let (response, gas_used) = measure_gas(
            || querier.gas_consumed(),
            || querier.query_raw(request, gas_limit),
        );
        unsafe { used_gas.write(gas_used) };

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                // dispatch failed, e.g. because the query went over its gas limit
                unsafe { write_slot(error_msg, Some(err.to_string().into_bytes())) };
                return StatusCode::User;
            }
        };

        match serde_json::to_vec(&response) {
            Ok(bytes) => {
                unsafe { write_slot(result_out, Some(bytes)) };
                StatusCode::Ok
            }
            Err(err) => {
                log::error!("Cannot serialize query response: {err}");
                unsafe { write_slot(error_msg, Some(err.to_string().into_bytes())) };
                StatusCode::Other
            }
        }
    })
}
