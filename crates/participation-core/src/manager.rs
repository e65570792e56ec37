//! The participation manager: one lock over ledger state and event registry.
//!
//! [`ParticipationManager`] wraps the participation source in a single
//! [`tokio::sync::Mutex`]. [`aggregate`](ParticipationManager::aggregate)
//! holds that lock from the ledger-index read through the last balance
//! query, and every ledger-mutating operation goes through
//! [`update`](ParticipationManager::update) under the same lock. A writer
//! that advances the ledger therefore waits for an in-flight aggregation to
//! finish, and vice versa.
//!
//! Balance queries are synchronous and may be slow, so the aggregation runs
//! on Tokio's blocking pool with an owned lock guard. A caller that wraps
//! `aggregate` in a timeout is released when the timeout expires; the
//! abandoned aggregation keeps the lock until it completes and its result
//! is discarded.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::aggregate::aggregate;
use crate::error::AggregateError;
use crate::provider::ParticipationSource;
use crate::snapshot::Snapshot;

/// Owner of the participation source and its process-wide lock.
#[derive(Debug, Default)]
pub struct ParticipationManager<S> {
    state: Arc<Mutex<S>>,
}

impl<S> ParticipationManager<S> {
    /// Wrap a participation source.
    pub fn new(state: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Run a ledger-mutating operation under the manager lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.state.lock().await;
        f(&mut guard)
    }

    /// Run a read-only operation under the manager lock.
    pub async fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.state.lock().await;
        f(&guard)
    }
}

impl<S> ParticipationManager<S>
where
    S: ParticipationSource + Send + 'static,
{
    /// Compute a coherent [`Snapshot`] of all events.
    ///
    /// Waits for any in-progress mutation, then holds the lock for the
    /// whole computation.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if the ledger index, the event set, or
    /// any balance query cannot be read, or if the aggregation task dies.
    pub async fn aggregate(&self) -> Result<Snapshot, AggregateError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        tokio::task::spawn_blocking(move || aggregate(&*guard))
            .await
            .map_err(AggregateError::Aborted)?
    }
}
