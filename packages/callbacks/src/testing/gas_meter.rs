use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::{Gas, GasMeter};
use crate::panic::HostFault;

/// A gas meter with a hard limit. Clones share the same counter, such that
/// a store can charge the meter that is handed to the bridge.
#[derive(Clone, Debug)]
pub struct MockGasMeter {
    limit: Gas,
    consumed: Arc<AtomicU64>,
}

impl MockGasMeter {
    pub fn new(limit: Gas) -> Self {
        MockGasMeter {
            limit,
            consumed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn limit(&self) -> Gas {
        self.limit
    }

    /// Charges `amount`. Raises an out of gas fault when the limit is exceeded,
    /// after the amount was added.
    pub fn consume(&self, amount: Gas, descriptor: &str) {
        let before = self.consumed.fetch_add(amount, Ordering::SeqCst);
        if before.saturating_add(amount) > self.limit {
            HostFault::out_of_gas(descriptor).raise();
        }
    }
}

impl GasMeter for MockGasMeter {
    fn gas_consumed(&self) -> Gas {
        self.consumed.load(Ordering::SeqCst)
    }
}
