//! Registry of the iterators created by `scan`.
//!
//! Iterators must survive between two callbacks, but a callback only gets plain data
//! from the caller. So every iterator is stored in a frame that belongs to one call
//! (i.e. one execution of a contract) and is referenced by `(call_id, index)`.
//!
//! Frames are created by [`start_call`] and removed as a whole by [`end_call`].
//! Single iterators are never removed. Call IDs are never reused, such that a
//! handle into a frame that was torn down can never point to another call's iterator.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::backend::StorageIterator;
use crate::config::Config;

struct Frame {
    limit: usize,
    iterators: Vec<Box<dyn StorageIterator>>,
}

static FRAMES: Mutex<BTreeMap<u64, Arc<Mutex<Frame>>>> = Mutex::new(BTreeMap::new());

/// The last call ID handed out. 0 is never used as a call ID.
static LATEST_CALL_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No iterator frame for call {call_id}")]
    UnknownCall { call_id: u64 },
    #[error("Reached iterator limit ({limit})")]
    LimitReached { limit: usize },
    #[error("Iterator {index} does not exist in call {call_id}")]
    IteratorDoesNotExist { call_id: u64, index: u64 },
}

// A panic in a stepping iterator poisons the lock, but the invocation is
// aborted anyway and the frame is still structurally intact.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn frame(call_id: u64) -> Result<Arc<Mutex<Frame>>, RegistryError> {
    lock(&FRAMES)
        .get(&call_id)
        .cloned()
        .ok_or(RegistryError::UnknownCall { call_id })
}

/// Creates a fresh iterator frame and returns its call ID.
/// The caller must eventually call [`end_call`] with this ID.
pub fn start_call(config: &Config) -> u64 {
    let call_id = LATEST_CALL_ID.fetch_add(1, Ordering::SeqCst) + 1;
    let frame = Frame {
        limit: config.iterator_limit(),
        iterators: Vec::new(),
    };
    lock(&FRAMES).insert(call_id, Arc::new(Mutex::new(frame)));
    log::debug!("Started iterator frame for call {call_id}");
    call_id
}

/// Removes the frame of the given call including all its iterators.
pub fn end_call(call_id: u64) {
    let removed = lock(&FRAMES).remove(&call_id);
    match removed {
        Some(frame) => {
            let count = lock(&frame).iterators.len();
            log::debug!("Ended call {call_id}, dropping {count} iterators");
        }
        None => log::warn!("Ended call {call_id} which has no iterator frame"),
    }
}

/// Returns the number of iterators registered for the call or None if the call has no frame.
pub fn iterator_count(call_id: u64) -> Option<usize> {
    let frame = frame(call_id).ok()?;
    let count = lock(&frame).iterators.len();
    Some(count)
}

/// Returns true if the call has an open frame, i.e. iterators can be stored for it.
pub(crate) fn has_frame(call_id: u64) -> bool {
    lock(&FRAMES).contains_key(&call_id)
}

/// Stores an iterator in the call's frame and returns its index.
/// Indices start at 1, such that a zeroed handle is never valid.
pub(crate) fn store_iterator(
    call_id: u64,
    iterator: Box<dyn StorageIterator>,
) -> Result<u64, RegistryError> {
    let frame = frame(call_id)?;
    let mut frame = lock(&frame);
    if frame.iterators.len() >= frame.limit {
        return Err(RegistryError::LimitReached { limit: frame.limit });
    }
    frame.iterators.push(iterator);
    Ok(frame.iterators.len() as u64)
}

/// Runs `action` with exclusive access to the iterator at the given handle.
pub(crate) fn with_iterator<T, F>(call_id: u64, index: u64, action: F) -> Result<T, RegistryError>
where
    F: FnOnce(&mut dyn StorageIterator) -> T,
{
    let frame = frame(call_id)?;
    let mut frame = lock(&frame);
    let position = index
        .checked_sub(1)
        .and_then(|position| usize::try_from(position).ok());
    let iterator = match position {
        Some(position) => frame.iterators.get_mut(position),
        None => None,
    };
    match iterator {
        Some(iterator) => Ok(action(iterator.as_mut())),
        None => Err(RegistryError::IteratorDoesNotExist { call_id, index }),
    }
}

/// Owns the iterator frame of one call and tears it down when dropped.
///
/// ```
/// # use cosmwasm_callbacks::{CallScope, Config};
/// let scope = CallScope::open(&Config::default());
/// let call_id = scope.call_id();
/// // build a `DbState` with `call_id` and call into the VM
/// drop(scope);
/// assert_eq!(cosmwasm_callbacks::iterator_count(call_id), None);
/// ```
#[derive(Debug)]
pub struct CallScope {
    call_id: u64,
}

impl CallScope {
    pub fn open(config: &Config) -> Self {
        CallScope {
            call_id: start_call(config),
        }
    }

    pub fn call_id(&self) -> u64 {
        self.call_id
    }
}

impl Drop for CallScope {
    fn drop(&mut self) {
        end_call(self.call_id);
    }
}
