use crate::backend::BackendError;
use crate::memory::UnmanagedVector;

/// The result of every callback crossing the FFI boundary.
///
/// This is a closed set. The numeric values are part of the ABI and must never change.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 0,
    /// An unclassified panic was contained. The cause is unknown, so callers should abort.
    Panic = 1,
    /// A required pointer or handle was null or otherwise invalid.
    BadArgument = 2,
    /// A contained panic was identified as gas exhaustion.
    OutOfGas = 3,
    /// A failure that happened after the host operation succeeded, e.g. serialization.
    /// The message is stored in the error buffer.
    Other = 4,
    /// The host capability rejected the input. The message is stored in the error buffer.
    /// This is the only status that should be reported back to the contract.
    User = 5,
}

impl From<StatusCode> for i32 {
    fn from(code: StatusCode) -> Self {
        code as i32
    }
}

impl From<i32> for StatusCode {
    /// We do not trust the other side to return one of the known values.
    /// Everything unknown is treated as `Other`.
    fn from(n: i32) -> Self {
        match n {
            0 => StatusCode::Ok,
            1 => StatusCode::Panic,
            2 => StatusCode::BadArgument,
            3 => StatusCode::OutOfGas,
            5 => StatusCode::User,
            _ => StatusCode::Other,
        }
    }
}

/// Logs a protocol defect of the caller and returns [`StatusCode::BadArgument`].
/// Only valid before any host logic ran, since no gas is reported.
pub(crate) fn bad_argument(callback: &str) -> StatusCode {
    log::warn!("Bad argument passed to callback {callback}");
    StatusCode::BadArgument
}

impl StatusCode {
    /// Converts a status and the error buffer of the same call into a result.
    ///
    /// The error buffer is always consumed, such that the caller does not need
    /// to care about releasing it. `default_error_msg` is used for `Other` and `User`
    /// when no message was written.
    pub fn into_result<F>(
        self,
        error_msg: UnmanagedVector,
        default_error_msg: F,
    ) -> Result<(), BackendError>
    where
        F: FnOnce() -> String,
    {
        let msg = error_msg
            .consume()
            .map(|data| String::from_utf8_lossy(&data).into_owned());

        match self {
            StatusCode::Ok => Ok(()),
            StatusCode::Panic => Err(BackendError::ForeignPanic { msg }),
            StatusCode::BadArgument => Err(BackendError::bad_argument()),
            StatusCode::OutOfGas => Err(BackendError::OutOfGas { msg }),
            StatusCode::Other => Err(BackendError::unknown(
                msg.unwrap_or_else(default_error_msg),
            )),
            StatusCode::User => Err(BackendError::user_err(
                msg.unwrap_or_else(default_error_msg),
            )),
        }
    }
}
