use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use super::VectorIndex;
use crate::Result;

/// Build-once handle to a process-wide index.
///
/// The initializer runs at most once per handle even when several threads ask
/// at the same time. A failed initialization is not cached, so the next caller
/// tries again.
#[derive(Debug, Default)]
pub struct SharedIndex {
    cell: OnceLock<Arc<VectorIndex>>,
    init: Mutex<()>,
}

impl SharedIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> Option<Arc<VectorIndex>> {
        self.cell.get().map(Arc::clone)
    }

    #[inline]
    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<VectorIndex>>
    where
        F: FnOnce() -> Result<VectorIndex>,
    {
        if let Some(index) = self.cell.get() {
            return Ok(Arc::clone(index));
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = self.cell.get() {
            return Ok(Arc::clone(index));
        }

        debug!("Initializing shared index");
        let index = Arc::new(init()?);
        // Only reachable while holding the lock with the cell still empty
        let _ = self.cell.set(Arc::clone(&index));
        Ok(index)
    }
}
