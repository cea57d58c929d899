//! The calling side of the callbacks. These adapters invoke the vtables exactly the way
//! the VM does: empty output slots in, raw status code out, and the error buffer turned
//! into a [`BackendError`]. All output buffers are consumed, on success and on failure.

use crate::api::FfiApi;
use crate::backend::{BackendError, BackendResult, GasInfo, Order};
use crate::db::Db;
use crate::iterator::FfiIterator;
use crate::memory::{U8SliceView, UnmanagedVector};
use crate::querier::FfiQuerier;
use crate::status::StatusCode;

pub struct StorageCaller<'a> {
    db: Db<'a>,
}

impl<'a> StorageCaller<'a> {
    pub fn new(db: Db<'a>) -> Self {
        StorageCaller { db }
    }

    pub fn get(&self, key: &[u8]) -> BackendResult<Option<Vec<u8>>> {
        let mut output = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.db.vtable.read_db)(
            self.db.state,
            self.db.gas_meter,
            &mut used_gas as *mut u64,
            U8SliceView::new(Some(key)),
            &mut output as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
        );
        // We destruct the UnmanagedVector here, no matter if we need the data.
        let output = output.consume();

        let gas_info = GasInfo::with_externally_used(used_gas);
        let default = || {
            format!(
                "Failed to read a key in the db: {}",
                String::from_utf8_lossy(key)
            )
        };
        if let Err(err) = StatusCode::from(code).into_result(error_msg, default) {
            return (Err(err), gas_info);
        }
        (Ok(output), gas_info)
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> BackendResult<()> {
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.db.vtable.write_db)(
            self.db.state,
            self.db.gas_meter,
            &mut used_gas as *mut u64,
            U8SliceView::new(Some(key)),
            U8SliceView::new(Some(value)),
            &mut error_msg as *mut UnmanagedVector,
        );
        let gas_info = GasInfo::with_externally_used(used_gas);
        let default = || {
            format!(
                "Failed to set a key in the db: {}",
                String::from_utf8_lossy(key),
            )
        };
        let result = StatusCode::from(code).into_result(error_msg, default);
        (result, gas_info)
    }

    pub fn remove(&mut self, key: &[u8]) -> BackendResult<()> {
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.db.vtable.remove_db)(
            self.db.state,
            self.db.gas_meter,
            &mut used_gas as *mut u64,
            U8SliceView::new(Some(key)),
            &mut error_msg as *mut UnmanagedVector,
        );
        let gas_info = GasInfo::with_externally_used(used_gas);
        let default = || {
            format!(
                "Failed to delete a key in the db: {}",
                String::from_utf8_lossy(key),
            )
        };
        let result = StatusCode::from(code).into_result(error_msg, default);
        (result, gas_info)
    }

    pub fn scan(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> BackendResult<IteratorCaller<'a>> {
        let mut error_msg = UnmanagedVector::default();
        let mut iterator = FfiIterator::stub();
        let mut used_gas = 0_u64;
        let code = (self.db.vtable.scan_db)(
            self.db.state,
            self.db.gas_meter,
            &mut used_gas as *mut u64,
            U8SliceView::new(start),
            U8SliceView::new(end),
            order.into(),
            &mut iterator as *mut FfiIterator,
            &mut error_msg as *mut UnmanagedVector,
        );
        let gas_info = GasInfo::with_externally_used(used_gas);
        let default = || {
            format!(
                "Failed to read the next key between {:?} and {:?}",
                start.map(String::from_utf8_lossy),
                end.map(String::from_utf8_lossy),
            )
        };
        if let Err(err) = StatusCode::from(code).into_result(error_msg, default) {
            return (Err(err), gas_info);
        }
        (Ok(IteratorCaller { iterator }), gas_info)
    }
}

pub struct IteratorCaller<'a> {
    iterator: FfiIterator<'a>,
}

impl IteratorCaller<'_> {
    pub fn next(&mut self) -> BackendResult<Option<(Vec<u8>, Vec<u8>)>> {
        let mut output_key = UnmanagedVector::default();
        let mut output_value = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.iterator.vtable.next_db)(
            self.iterator.state,
            self.iterator.gas_meter,
            &mut used_gas as *mut u64,
            &mut output_key as *mut UnmanagedVector,
            &mut output_value as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
        );
        // We destruct the UnmanagedVectors here, no matter if we need the data.
        let output_key = output_key.consume();
        let output_value = output_value.consume();

        let gas_info = GasInfo::with_externally_used(used_gas);
        let default = || "Failed to fetch next item from iterator".to_string();
        if let Err(err) = StatusCode::from(code).into_result(error_msg, default) {
            return (Err(err), gas_info);
        }

        let result = match (output_key, output_value) {
            (Some(key), Some(value)) => Ok(Some((key, value))),
            (None, None) => Ok(None),
            _ => Err(BackendError::unknown(
                "Got only one of key and value from iterator",
            )),
        };
        (result, gas_info)
    }
}

pub struct ApiCaller<'a> {
    api: FfiApi<'a>,
}

impl<'a> ApiCaller<'a> {
    pub fn new(api: FfiApi<'a>) -> Self {
        ApiCaller { api }
    }

    pub fn canonical_address(&self, human: &str) -> BackendResult<Vec<u8>> {
        let mut output = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.api.vtable.canonicalize_address)(
            self.api.state,
            U8SliceView::new(Some(human.as_bytes())),
            &mut output as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
            &mut used_gas as *mut u64,
        );
        // We destruct the UnmanagedVector here, no matter if we need the data.
        let output = output.consume();

        let gas_info = GasInfo::with_cost(used_gas);
        let default = || format!("Failed to canonicalize the address: {human}");
        if let Err(err) = StatusCode::from(code).into_result(error_msg, default) {
            return (Err(err), gas_info);
        }

        let result = output.ok_or_else(|| BackendError::unknown("Unset output"));
        (result, gas_info)
    }

    pub fn human_address(&self, canonical: &[u8]) -> BackendResult<String> {
        let mut output = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.api.vtable.humanize_address)(
            self.api.state,
            U8SliceView::new(Some(canonical)),
            &mut output as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
            &mut used_gas as *mut u64,
        );
        // We destruct the UnmanagedVector here, no matter if we need the data.
        let output = output.consume();

        let gas_info = GasInfo::with_cost(used_gas);
        let default = || format!("Failed to humanize the address: {canonical:?}");
        if let Err(err) = StatusCode::from(code).into_result(error_msg, default) {
            return (Err(err), gas_info);
        }

        let result = match output {
            Some(human) => String::from_utf8(human).map_err(BackendError::from),
            None => Err(BackendError::unknown("Unset output")),
        };
        (result, gas_info)
    }
}

pub struct QuerierCaller<'a> {
    querier: FfiQuerier<'a>,
}

impl<'a> QuerierCaller<'a> {
    pub fn new(querier: FfiQuerier<'a>) -> Self {
        QuerierCaller { querier }
    }

    /// Returns the JSON serialized response.
    pub fn query_raw(&self, request: &[u8], gas_limit: u64) -> BackendResult<Vec<u8>> {
        let mut output = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let mut used_gas = 0_u64;
        let code = (self.querier.vtable.query_external)(
            self.querier.state,
            gas_limit,
            &mut used_gas as *mut u64,
            U8SliceView::new(Some(request)),
            &mut output as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
        );
        let output = output.consume();

        let gas_info = GasInfo::with_externally_used(used_gas);
        let default = || {
            format!(
                "Failed to query another contract with this request: {}",
                String::from_utf8_lossy(request)
            )
        };
        if let Err(err) = StatusCode::from(code).into_result(error_msg, default) {
            return (Err(err), gas_info);
        }

        let result = output.ok_or_else(|| BackendError::unknown("Unset output"));
        (result, gas_info)
    }
}
