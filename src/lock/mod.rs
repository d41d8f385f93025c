//! Per-user mutual exclusion.
//!
//! A user may have at most one photo in flight. The lock table is the only
//! state shared between invocations, and its uniqueness constraint is the
//! single source of truth: concurrent acquisitions from different processes
//! are serialized by the store, never by in-process coordination.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::core::models::Stage;
use crate::errors::BotError;

pub use postgres::PgLockStore;

/// One row of the lock table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LockRecord {
    pub chat_id: i64,
    pub locked_at: DateTime<Utc>,
}

#[async_trait]
pub trait LockStore: Send + Sync {
    /// Create the backing table if missing. Safe to call on every invocation.
    async fn ensure_schema(&self) -> Result<(), BotError>;

    /// Delete every record older than `threshold`; returns how many were removed.
    async fn reap_stale(&self, threshold: Duration) -> Result<u64, BotError>;

    /// Insert a record for `chat_id` and return it. `Ok(None)` when one already exists.
    async fn try_acquire(&self, chat_id: i64) -> Result<Option<LockRecord>, BotError>;

    /// Delete the record for `chat_id`. Releasing a missing record is not an error.
    async fn release(&self, chat_id: i64) -> Result<(), BotError>;

    /// Delete `record` only if it is still the live row for its chat, i.e. it
    /// was not reaped and replaced by a later acquisition. Returns whether a
    /// row was removed.
    async fn release_record(&self, record: &LockRecord) -> Result<bool, BotError>;

    /// The live record for `chat_id`, if any.
    async fn current(&self, chat_id: i64) -> Result<Option<LockRecord>, BotError>;
}

/// Proof of a successful [`LockStore::try_acquire`].
///
/// Call [`LockLease::release`] when the guarded work ends. A lease that is
/// dropped instead (early return, panic unwinding through its owner) spawns
/// the release on the current runtime, so every acquisition is released once.
/// Release is compare-and-delete on the acquired record: a lease whose row was
/// reaped as stale never removes the row of the job that replaced it.
#[must_use = "dropping a lease releases the lock"]
pub struct LockLease {
    store: Arc<dyn LockStore>,
    record: LockRecord,
    released: bool,
}

impl LockLease {
    pub fn new(store: Arc<dyn LockStore>, record: LockRecord) -> Self {
        Self {
            store,
            record,
            released: false,
        }
    }

    #[must_use]
    pub fn chat_id(&self) -> i64 {
        self.record.chat_id
    }

    #[must_use]
    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    pub async fn release(mut self) {
        self.released = true;
        release_logged(self.store.as_ref(), &self.record).await;
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let store = Arc::clone(&self.store);
        let record = self.record.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { release_logged(store.as_ref(), &record).await });
            }
            Err(_) => {
                error!(
                    chat_id = record.chat_id,
                    "Lock lease dropped outside a runtime; record left for stale reaping"
                );
            }
        }
    }
}

async fn release_logged(store: &dyn LockStore, record: &LockRecord) {
    let chat_id = record.chat_id;
    match store.release_record(record).await {
        Ok(true) => info!(chat_id, stage = %Stage::Released, "Lock released"),
        Ok(false) => warn!(
            chat_id,
            stage = %Stage::Released,
            "Lock was reaped before release; newer lock left in place"
        ),
        // The stale reaper reclaims the row if the delete never lands.
        Err(e) => error!(chat_id, stage = %Stage::Released, "Failed to release lock: {}", e),
    }
}
