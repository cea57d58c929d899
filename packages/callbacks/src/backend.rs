use std::ops::AddAssign;
use std::string::FromUtf8Error;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Gas = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GasInfo {
    /// The gas cost of a computation that was executed already but not yet charged
    pub cost: u64,
    /// Gas that was used and charged externally. This is needed to
    /// adjust the VM's gas limit but does not affect the gas usage.
    pub externally_used: u64,
}

impl GasInfo {
    pub fn with_cost(amount: u64) -> Self {
        GasInfo {
            cost: amount,
            externally_used: 0,
        }
    }

    pub fn with_externally_used(amount: u64) -> Self {
        GasInfo {
            cost: 0,
            externally_used: amount,
        }
    }

    /// Creates a gas information with no cost for the caller and with zero externally used gas.
    ///
    /// Caution: when using this you need to make sure no gas was metered externally to keep the gas values in sync.
    pub fn free() -> Self {
        GasInfo {
            cost: 0,
            externally_used: 0,
        }
    }
}

impl AddAssign for GasInfo {
    fn add_assign(&mut self, other: Self) {
        *self = GasInfo {
            cost: self.cost + other.cost,
            externally_used: self.externally_used + other.externally_used,
        };
    }
}

/// The gas meter of the current invocation, owned by the host.
///
/// The bridge only ever reads it. Charging gas is up to the capabilities
/// (e.g. a gas-metered store), which may panic with
/// [`HostFault::out_of_gas`](crate::HostFault::out_of_gas) when the limit is hit.
pub trait GasMeter {
    /// Returns the gas consumed so far. Must be monotonically non-decreasing
    /// within one invocation.
    fn gas_consumed(&self) -> Gas;
}

/// Runs `operation` and returns its output along with the gas consumed in between,
/// as reported by `gas_consumed`.
pub(crate) fn measure_gas<T>(
    gas_consumed: impl Fn() -> Gas,
    operation: impl FnOnce() -> T,
) -> (T, Gas) {
    let gas_before = gas_consumed();
    let output = operation();
    let gas_after = gas_consumed();
    (output, gas_after.saturating_sub(gas_before))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Ascending = 1,
    Descending = 2,
}

impl TryFrom<i32> for Order {
    type Error = BackendError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Order::Ascending),
            2 => Ok(Order::Descending),
            _ => Err(BackendError::bad_argument()),
        }
    }
}

impl From<Order> for i32 {
    fn from(original: Order) -> i32 {
        original as _
    }
}

/// Access to the host's key/value store, i.e. the chain state of the contract.
pub trait Storage {
    /// Returns None when key does not exist.
    /// Returns Some(Vec<u8>) when key exists, which may be an empty value.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Removes a database entry at `key`. Removing a missing key is a no-op.
    fn remove(&mut self, key: &[u8]);

    /// Allows iteration over a set of key/value pairs, either forwards or backwards.
    ///
    /// The bound `start` is inclusive and `end` is exclusive. `None` means unbounded.
    /// If `start` is lexicographically greater than or equal to `end`, an empty range is described,
    /// no matter of the order.
    ///
    /// The returned iterator is positioned at its first element already. It must not borrow
    /// the store, since it outlives the call that created it.
    fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn StorageIterator>;
}

/// A cursor over a range of the store, as created by [`Storage::iterator`].
///
/// Once invalid, an iterator remains invalid forever. Calling [`key`](StorageIterator::key),
/// [`value`](StorageIterator::value) or [`next`](StorageIterator::next) on an invalid
/// iterator is a bug and may panic.
pub trait StorageIterator: Send {
    fn valid(&self) -> bool;

    /// Moves the iterator to the next entry in iteration order.
    fn next(&mut self);

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];
}

/// Api are callbacks to system functions defined outside of the wasm modules.
/// This is a trait to allow Mocks in the test code.
///
/// These should all be pure (stateless) functions. If you need state, you probably want
/// to use the Querier.
pub trait Api {
    /// Converts a human readable address into its canonical binary form.
    /// Must never return an empty address on success.
    fn canonical_address(&self, human: &str) -> BackendResult<Vec<u8>>;

    /// Converts a canonical address into its human readable form.
    /// Must never return an empty address on success.
    fn human_address(&self, canonical: &[u8]) -> BackendResult<String>;
}

pub trait Querier {
    /// The dispatch result that is serialized to JSON and handed to the caller.
    /// This is usually [`QuerierResult`](crate::QuerierResult).
    type Response: Serialize;

    /// This is all that must be implemented for the Querier.
    /// This allows us to pass through binary queries from one level to another without
    /// knowing the custom format, or we can decode it, with the knowledge of the allowed
    /// types.
    ///
    /// The gas limit describes how much gas this particular query is allowed
    /// to consume. Enforcing it is the responsibility of the implementation.
    fn query_raw(&self, request: &[u8], gas_limit: u64) -> Result<Self::Response, QueryError>;

    /// Gas consumed by this querier so far. Used to measure the cost of a single query.
    fn gas_consumed(&self) -> Gas;
}

/// A failure to dispatch a query at all, as opposed to a query that was
/// dispatched and produced an error result.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query ran out of gas: used {used}, limit {limit}")]
    OutOfGas { limit: u64, used: u64 },
    #[error("Query failed: {msg}")]
    Failed { msg: String },
}

impl QueryError {
    pub fn out_of_gas(limit: u64, used: u64) -> Self {
        QueryError::OutOfGas { limit, used }
    }

    pub fn failed<S: ToString>(msg: S) -> Self {
        QueryError::Failed {
            msg: msg.to_string(),
        }
    }
}

/// A result type for calling into the backend. Such a call can cause
/// non-negligible computational cost in both success and faiure case and must always have gas information
/// attached.
pub type BackendResult<T> = (core::result::Result<T, BackendError>, GasInfo);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BackendError {
    #[error("Panic in FFI call: {msg:?}")]
    ForeignPanic { msg: Option<String> },
    #[error("Bad argument")]
    BadArgument {},
    #[error("VM received invalid UTF-8 data from backend")]
    InvalidUtf8 {},
    #[error("Ran out of gas during call into backend: {msg:?}")]
    OutOfGas { msg: Option<String> },
    #[error("Unknown error during call into backend: {msg:?}")]
    Unknown { msg: Option<String> },
    // This is the only error case of BackendError that is reported back to the contract.
    #[error("User error during call into backend: {msg}")]
    UserErr { msg: String },
}

impl BackendError {
    pub fn foreign_panic() -> Self {
        BackendError::ForeignPanic { msg: None }
    }

    pub fn bad_argument() -> Self {
        BackendError::BadArgument {}
    }

    pub fn out_of_gas() -> Self {
        BackendError::OutOfGas { msg: None }
    }

    pub fn unknown<S: ToString>(msg: S) -> Self {
        BackendError::Unknown {
            msg: Some(msg.to_string()),
        }
    }

    /// Use `::unknown(msg: S)` if possible
    pub fn unknown_without_message() -> Self {
        BackendError::Unknown { msg: None }
    }

    pub fn user_err<S: ToString>(msg: S) -> Self {
        BackendError::UserErr {
            msg: msg.to_string(),
        }
    }

    /// The message written into the error buffer when a host capability fails with this error.
    pub(crate) fn to_user_message(&self) -> String {
        match self {
            BackendError::UserErr { msg } => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<FromUtf8Error> for BackendError {
    fn from(_original: FromUtf8Error) -> Self {
        BackendError::InvalidUtf8 {}
    }
}
