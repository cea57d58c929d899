use std::marker::PhantomData;

use crate::backend::Api;
use crate::memory::{assert_slot_empty, write_slot, U8SliceView, UnmanagedVector};
use crate::panic::contain;
use crate::status::{bad_argument, StatusCode};

// this represents something passed in from the caller side of FFI
#[repr(C)]
pub struct api_t {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct ApiVtable {
    pub humanize_address: extern "C" fn(
        *const api_t,
        U8SliceView,
        *mut UnmanagedVector, // human output
        *mut UnmanagedVector, // error message output
        *mut u64,
    ) -> i32,
    pub canonicalize_address: extern "C" fn(
        *const api_t,
        U8SliceView,
        *mut UnmanagedVector, // canonical output
        *mut UnmanagedVector, // error message output
        *mut u64,
    ) -> i32,
}

#[repr(C)]
pub struct FfiApi<'a> {
    pub state: *const api_t,
    pub vtable: ApiVtable,
    _lifetime: PhantomData<&'a ()>,
}

pub fn build_api<A: Api>(api: &A) -> FfiApi<'_> {
    FfiApi {
        state: api as *const A as *const api_t,
        vtable: ApiVtable {
            humanize_address: c_human_address::<A>,
            canonicalize_address: c_canonical_address::<A>,
        },
        _lifetime: PhantomData,
    }
}

extern "C" fn c_human_address<A: Api>(
    ptr: *const api_t,
    src: U8SliceView,
    dest: *mut UnmanagedVector,
    error_msg: *mut UnmanagedVector,
    used_gas: *mut u64,
) -> i32 {
    contain("humanize_address", error_msg, || {
        if ptr.is_null() || dest.is_null() || error_msg.is_null() || used_gas.is_null() {
            return bad_argument("humanize_address");
        }
        unsafe {
            assert_slot_empty(dest);
            assert_slot_empty(error_msg);
        }
        let Some(canonical) = src.read() else {
            return bad_argument("humanize_address");
        };

        let api = unsafe { &*(ptr as *const A) };
        let (result, gas_info) = api.human_address(canonical);
        unsafe { used_gas.write(gas_info.cost) };

        match result {
            Err(err) => {
                // store the actual error message in the return buffer
                unsafe { write_slot(error_msg, Some(err.to_user_message().into_bytes())) };
                StatusCode::User
            }
            Ok(human) if human.is_empty() => {
                panic!("`Api::human_address()` returned an empty string for {canonical:?}")
            }
            Ok(human) => {
                unsafe { write_slot(dest, Some(human.into_bytes())) };
                StatusCode::Ok
            }
        }
    })
}

extern "C" fn c_canonical_address<A: Api>(
    ptr: *const api_t,
    src: U8SliceView,
    dest: *mut UnmanagedVector,
    error_msg: *mut UnmanagedVector,
    used_gas: *mut u64,
) -> i32 {
    contain("canonicalize_address", error_msg, || {
        if ptr.is_null() || dest.is_null() || error_msg.is_null() || used_gas.is_null() {
            return bad_argument("canonicalize_address");
        }
        unsafe {
            assert_slot_empty(dest);
            assert_slot_empty(error_msg);
        }
        let Some(src) = src.read() else {
            return bad_argument("canonicalize_address");
        };

        let Ok(human) = std::str::from_utf8(src) else {
            unsafe {
                used_gas.write(0);
                write_slot(error_msg, Some(b"Input is not valid UTF-8".to_vec()));
            }
            return StatusCode::User;
        };

        let api = unsafe { &*(ptr as *const A) };
        let (result, gas_info) = api.canonical_address(human);
        unsafe { used_gas.write(gas_info.cost) };

        match result {
            Err(err) => {
                unsafe { write_slot(error_msg, Some(err.to_user_message().into_bytes())) };
                StatusCode::User
            }
            Ok(canonical) if canonical.is_empty() => {
                panic!("`Api::canonical_address()` returned an empty address for {human:?}")
            }
            Ok(canonical) => {
                unsafe { write_slot(dest, Some(canonical)) };
                StatusCode::Ok
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendResult, GasInfo};
    use crate::testing::MockApi;

    /// An API that claims success but returns nothing
    struct EmptyApi;

    impl Api for EmptyApi {
        fn canonical_address(&self, _human: &str) -> BackendResult<Vec<u8>> {
            (Ok(vec![]), GasInfo::with_cost(3))
        }

        fn human_address(&self, _canonical: &[u8]) -> BackendResult<String> {
            (Ok(String::new()), GasInfo::with_cost(4))
        }
    }

    #[test]
    fn humanize_rejects_null_pointers() {
        let api = MockApi::default();
        let ffi_api = build_api(&api);
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0u64;
        let code = (ffi_api.vtable.humanize_address)(
            ffi_api.state,
            U8SliceView::new(Some(b"foo")),
            std::ptr::null_mut(),
            &mut error_msg,
            &mut used_gas,
        );
        assert_eq!(StatusCode::from(code), StatusCode::BadArgument);
    }

    #[test]
    fn empty_results_are_contained_faults() {
        let api = EmptyApi;
        let ffi_api = build_api(&api);

        let mut dest = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0u64;
        let code = (ffi_api.vtable.humanize_address)(
            ffi_api.state,
            U8SliceView::new(Some(b"foo")),
            &mut dest,
            &mut error_msg,
            &mut used_gas,
        );
        assert_eq!(StatusCode::from(code), StatusCode::Panic);
        assert_eq!(dest.consume(), None);
        let msg = String::from_utf8(error_msg.consume().unwrap()).unwrap();
        assert!(msg.contains("returned an empty string"), "{msg}");

        let mut dest = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let code = (ffi_api.vtable.canonicalize_address)(
            ffi_api.state,
            U8SliceView::new(Some(b"foo")),
            &mut dest,
            &mut error_msg,
            &mut used_gas,
        );
        assert_eq!(StatusCode::from(code), StatusCode::Panic);
        assert_eq!(dest.consume(), None);
        let _ = error_msg.consume();
    }

    #[test]
    fn canonicalize_rejects_invalid_utf8_as_user_error() {
        let api = MockApi::default();
        let ffi_api = build_api(&api);

        let mut dest = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 77u64;
        let code = (ffi_api.vtable.canonicalize_address)(
            ffi_api.state,
            U8SliceView::new(Some(&[0xC3u8, 0x28][..])),
            &mut dest,
            &mut error_msg,
            &mut used_gas,
        );
        assert_eq!(StatusCode::from(code), StatusCode::User);
        assert_eq!(used_gas, 0);
        assert_eq!(dest.consume(), None);
        assert_eq!(
            error_msg.consume(),
            Some(b"Input is not valid UTF-8".to_vec())
        );
    }

    #[test]
    fn non_user_backend_errors_keep_description() {
        let api = MockApi::new_failing("temporarily unavailable");
        let ffi_api = build_api(&api);

        let mut dest = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0u64;
        let code = (ffi_api.vtable.humanize_address)(
            ffi_api.state,
            U8SliceView::new(Some(b"foo")),
            &mut dest,
            &mut error_msg,
            &mut used_gas,
        );
        assert_eq!(StatusCode::from(code), StatusCode::User);
        let msg = String::from_utf8(error_msg.consume().unwrap()).unwrap();
        assert_eq!(
            msg,
            BackendError::unknown("temporarily unavailable").to_string()
        );
    }
}
