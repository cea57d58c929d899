// The external interface is `use cosmwasm_callbacks::testing::X` for all integration testing symbols, no matter where they live internally.

mod gas_meter;
mod mock;
mod querier;
mod shuffle;
mod storage;

pub use gas_meter::MockGasMeter;
pub use mock::MockApi;
pub use querier::MockQuerier;
pub use shuffle::{digit_sum, riffle_shuffle};
pub use storage::MockStorage;
