//! Host callbacks handed to a VM through a stable C ABI.
//!
//! The host implements [`Storage`], [`Api`] and [`Querier`] and turns them into vtables
//! with [`build_db`], [`build_api`] and [`build_querier`]. Every callback validates its
//! arguments, meters gas, contains panics and reports a [`StatusCode`]. Iterators created
//! by `scan` live in a process-wide registry, scoped by call (see [`CallScope`]).

mod api;
mod backend;
mod binary;
mod caller;
mod config;
mod db;
mod iterator;
mod iterators;
mod memory;
mod panic;
mod querier;
mod results;
mod status;

// We keep the following modules public in order to allow tests of embedders to use mocks.
pub mod testing;

pub use api::{api_t, build_api, ApiVtable, FfiApi};
pub use backend::{
    Api, BackendError, BackendResult, Gas, GasInfo, GasMeter, Order, Querier, QueryError,
    Storage, StorageIterator,
};
pub use binary::Binary;
pub use caller::{ApiCaller, IteratorCaller, QuerierCaller, StorageCaller};
pub use config::Config;
pub use db::{build_db, db_t, gas_meter_t, Db, DbState, DbVtable};
pub use iterator::{iterator_t, FfiIterator, IteratorVtable};
pub use iterators::{end_call, iterator_count, start_call, CallScope, RegistryError};
pub use memory::{destroy_unmanaged_vector, new_unmanaged_vector, U8SliceView, UnmanagedVector};
pub use panic::{classify, HostFault, OUT_OF_GAS_KIND};
pub use querier::{build_querier, querier_t, FfiQuerier, QuerierResult, QuerierVtable};
pub use results::{ContractResult, SystemError, SystemResult};
pub use status::StatusCode;
