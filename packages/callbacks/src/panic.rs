//! Containment of panics at the FFI boundary.
//!
//! Unwinding out of an `extern "C"` function aborts the process, so every callback
//! runs its body through [`contain`]. A contained panic is turned into a [`StatusCode`].
//! The only information we can rely on is the kind label of a [`HostFault`] payload:
//! a fault labelled [`OUT_OF_GAS_KIND`] becomes [`StatusCode::OutOfGas`], everything
//! else becomes [`StatusCode::Panic`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::memory::UnmanagedVector;
use crate::status::StatusCode;

/// Kind label of faults raised by gas meters when the gas limit is exceeded.
pub const OUT_OF_GAS_KIND: &str = "ErrorOutOfGas";

/// A panic payload raised by host capabilities.
///
/// Raise it with [`HostFault::raise`] (or `std::panic::panic_any`). The bridge
/// classifies it by [`kind`](HostFault::kind) only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {descriptor}")]
pub struct HostFault {
    kind: String,
    descriptor: String,
}

impl HostFault {
    pub fn new(kind: impl Into<String>, descriptor: impl Into<String>) -> Self {
        HostFault {
            kind: kind.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn out_of_gas(descriptor: impl Into<String>) -> Self {
        HostFault::new(OUT_OF_GAS_KIND, descriptor)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn raise(self) -> ! {
        panic::panic_any(self)
    }
}

/// Maps a panic payload to a status code and a human readable description.
pub fn classify(payload: &(dyn Any + Send)) -> (StatusCode, String) {
    if let Some(fault) = payload.downcast_ref::<HostFault>() {
        let code = match fault.kind() {
            OUT_OF_GAS_KIND => StatusCode::OutOfGas,
            _ => StatusCode::Panic,
        };
        return (code, fault.to_string());
    }

    let msg = if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Box<dyn Any>".to_string()
    };
    (StatusCode::Panic, msg)
}

/// Runs the body of the callback `name` and converts its outcome to the raw status code.
///
/// On a contained panic, the fault description is stored in `error_msg` if that slot is
/// present and still empty. `used_gas` and all other outputs are left untouched.
pub(crate) fn contain<F>(name: &str, error_msg: *mut UnmanagedVector, body: F) -> i32
where
    F: FnOnce() -> StatusCode,
{
    let code = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(code) => code,
        Err(payload) => {
            let (code, msg) = classify(payload.as_ref());
            match code {
                StatusCode::OutOfGas => log::debug!("Out of gas in callback {name}: {msg}"),
                _ => log::error!("Panic in callback {name}: {msg}"),
            }
            // SAFETY: the pointer was provided by the caller for exactly this purpose.
            // We only write into a slot that holds no vector, so nothing leaks.
            unsafe {
                if !error_msg.is_null() && (*error_msg).is_none() {
                    error_msg.write(UnmanagedVector::new(Some(msg.into_bytes())));
                }
            }
            code
        }
    };
    code.into()
}
