use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{Gas, Querier, QueryError};
use crate::binary::Binary;
use crate::querier::QuerierResult;
use crate::results::{ContractResult, SystemError, SystemResult};

const GAS_COST_QUERY_FLAT: u64 = 100_000;
/// Gas per request byte
const GAS_COST_QUERY_REQUEST_MULTIPLIER: u64 = 0;
/// Gas per reponse byte
const GAS_COST_QUERY_RESPONSE_MULTIPLIER: u64 = 100;

/// MockQuerier answers raw requests from a table of canned responses.
/// Requests that are not in the table result in a [`SystemError::InvalidRequest`].
#[derive(Debug, Default)]
pub struct MockQuerier {
    responses: BTreeMap<Vec<u8>, QuerierResult>,
    consumed: AtomicU64,
}

impl MockQuerier {
    pub fn new() -> Self {
        MockQuerier::default()
    }

    /// Registers a successful contract response for the request.
    pub fn with_response(self, request: &[u8], response: Binary) -> Self {
        self.with_result(request, SystemResult::Ok(ContractResult::Ok(response)))
    }

    /// Registers an error created by the queried contract for the request.
    pub fn with_contract_error(self, request: &[u8], msg: impl Into<String>) -> Self {
        self.with_result(request, SystemResult::Ok(ContractResult::Err(msg.into())))
    }

    pub fn with_result(mut self, request: &[u8], result: QuerierResult) -> Self {
        self.responses.insert(request.to_vec(), result);
        self
    }
}

impl Querier for MockQuerier {
    type Response = QuerierResult;

    fn query_raw(&self, request: &[u8], gas_limit: u64) -> Result<QuerierResult, QueryError> {
        let response = match self.responses.get(request) {
            Some(response) => response.clone(),
            None => SystemResult::Err(SystemError::InvalidRequest {
                error: "No response registered for request".to_string(),
                request: request.to_vec(),
            }),
        };
        let response_len = serde_json::to_vec(&response).map_or(0, |bytes| bytes.len());
        let gas_used = GAS_COST_QUERY_FLAT
            + (GAS_COST_QUERY_REQUEST_MULTIPLIER * (request.len() as u64))
            + (GAS_COST_QUERY_RESPONSE_MULTIPLIER * (response_len as u64));

        // In a production implementation, this should stop the query execution in the middle of the computation.
        // Thus no query response is returned to the caller.
        if gas_used > gas_limit {
            self.consumed.fetch_add(gas_limit, Ordering::SeqCst);
            return Err(QueryError::out_of_gas(gas_limit, gas_used));
        }

        self.consumed.fetch_add(gas_used, Ordering::SeqCst);
        Ok(response)
    }

    fn gas_consumed(&self) -> Gas {
        self.consumed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_raw_returns_registered_response() {
        let querier = MockQuerier::new().with_response(b"ping", Binary::from(b"pong"));
        let response = querier.query_raw(b"ping", 10_000_000).unwrap();
        assert_eq!(
            response,
            SystemResult::Ok(ContractResult::Ok(Binary::from(b"pong")))
        );
        // {"ok":{"ok":"cG9uZw=="}} has 24 bytes
        assert_eq!(querier.gas_consumed(), GAS_COST_QUERY_FLAT + 24 * 100);
    }

    #[test]
    fn query_raw_returns_contract_errors() {
        let querier = MockQuerier::new().with_contract_error(b"ping", "not found");
        let response = querier.query_raw(b"ping", 10_000_000).unwrap();
        assert_eq!(
            response,
            SystemResult::Ok(ContractResult::Err("not found".to_string()))
        );
    }

    #[test]
    fn query_raw_fails_for_unknown_requests() {
        let querier = MockQuerier::new();
        let response = querier.query_raw(b"foo", 10_000_000).unwrap();
        match response {
            SystemResult::Err(SystemError::InvalidRequest { request, .. }) => {
                assert_eq!(request, b"foo")
            }
            other => panic!("Unexpected response: {other:?}"),
        }
    }

    #[test]
    fn query_raw_enforces_gas_limit() {
        let querier = MockQuerier::new().with_response(b"ping", Binary::from(b"pong"));
        let err = querier.query_raw(b"ping", 5_000).unwrap_err();
        assert_eq!(err, QueryError::out_of_gas(5_000, GAS_COST_QUERY_FLAT + 24 * 100));
        assert_eq!(querier.gas_consumed(), 5_000);
    }
}
