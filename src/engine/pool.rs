// src/engine/pool.rs
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::DispatchError;

/// Bounded set of execution slots shared by the jobs of one dispatch call
#[derive(Clone)]
pub struct JobPool {
    size: usize,
    semaphore: Arc<Semaphore>,
}

impl JobPool {
    /// Build a pool with `size` slots on the current tokio runtime
    pub fn new(size: usize) -> Result<Self, DispatchError> {
        if size == 0 {
            return Err(DispatchError::EmptyPool(size));
        }

        tokio::runtime::Handle::try_current()
            .map_err(|e| DispatchError::NoRuntime(e.to_string()))?;

        debug!("Created job pool with {} slots", size);
        Ok(Self {
            size,
            semaphore: Arc::new(Semaphore::new(size)),
        })
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, DispatchError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::PoolClosed)
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
