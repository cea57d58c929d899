mod contract_result;
mod system_result;

pub use contract_result::ContractResult;
pub use system_result::{SystemError, SystemResult};
