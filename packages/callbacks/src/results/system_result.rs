use std::fmt;

use serde::{Deserialize, Serialize};

/// This is the outer result type returned by a querier to the contract.
///
/// We use a custom type here instead of Rust's Result because we want to be able to
/// define the serialization, which is a public interface. Every implementation of the
/// caller side needs to understand the same JSON representation.
///
/// # Examples
///
/// Success:
///
/// ```
/// # use cosmwasm_callbacks::{Binary, ContractResult, SystemResult};
/// let data = Binary::from(b"hello, world");
/// let result = SystemResult::Ok(ContractResult::Ok(data));
/// assert_eq!(serde_json::to_vec(&result).unwrap(), br#"{"ok":{"ok":"aGVsbG8sIHdvcmxk"}}"#);
/// ```
///
/// Failure:
///
/// ```
/// # use cosmwasm_callbacks::{Binary, SystemResult, SystemError};
/// let error = SystemError::Unknown {};
/// let result: SystemResult<Binary> = SystemResult::Err(error);
/// assert_eq!(serde_json::to_vec(&result).unwrap(), br#"{"error":{"unknown":{}}}"#);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SystemResult<S> {
    Ok(S),
    #[serde(rename = "error")]
    Err(SystemError),
}

// Implementations here mimic the Result API and should be implemented via a conversion to Result
// to ensure API consistency
impl<S> SystemResult<S> {
    /// Converts a `SystemResult<S>` to a `Result<S, SystemError>` as a convenient way
    /// to access the full Result API.
    pub fn into_result(self) -> Result<S, SystemError> {
        Result::<S, SystemError>::from(self)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SystemResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, SystemResult::Err(_))
    }
}

impl<S: fmt::Debug> SystemResult<S> {
    pub fn unwrap(self) -> S {
        self.into_result().unwrap()
    }

    pub fn unwrap_err(self) -> SystemError {
        self.into_result().unwrap_err()
    }
}

impl<S> From<Result<S, SystemError>> for SystemResult<S> {
    fn from(original: Result<S, SystemError>) -> SystemResult<S> {
        match original {
            Ok(value) => SystemResult::Ok(value),
            Err(err) => SystemResult::Err(err),
        }
    }
}

impl<S> From<SystemResult<S>> for Result<S, SystemError> {
    fn from(original: SystemResult<S>) -> Result<S, SystemError> {
        match original {
            SystemResult::Ok(value) => Ok(value),
            SystemResult::Err(err) => Err(err),
        }
    }
}

/// SystemError is used for errors inside the host that are API friendly (i.e. serializable).
///
/// The querier uses it for a request that could not be handled at all, e.g. because
/// it is malformed or addresses a contract that does not exist. Errors created by the
/// queried contract itself are in the inner [`ContractResult`](crate::ContractResult).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SystemError {
    #[error("Cannot parse request: {error} in: {}", String::from_utf8_lossy(request))]
    InvalidRequest { error: String, request: Vec<u8> },
    #[error("Cannot parse response: {error} in: {}", String::from_utf8_lossy(response))]
    InvalidResponse { error: String, response: Vec<u8> },
    #[error("No such contract: {addr}")]
    NoSuchContract { addr: String },
    #[error("Unknown system error")]
    Unknown {},
    #[error("Unsupported query type: {kind}")]
    UnsupportedRequest { kind: String },
}
