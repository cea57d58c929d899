use serde::{Deserialize, Serialize};

/// Iterators one call can open before `scan` starts failing. Contracts
/// iterating over this many ranges in a single call are most likely broken.
const DEFAULT_ITERATOR_LIMIT: usize = 32_768;

/// Configuration of the callbacks, provided by the host per call.
///
/// All fields are optional because they may come from a host that does not
/// know about them yet. Missing values fall back to the defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Config {
    /// Maximum number of iterators that can be registered within one call scope.
    pub iterator_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iterator_limit(mut self, limit: usize) -> Self {
        self.iterator_limit = Some(limit);
        self
    }

    pub fn iterator_limit(&self) -> usize {
        self.iterator_limit.unwrap_or(DEFAULT_ITERATOR_LIMIT)
    }
}
