//! Lock-guarded image processing.
//!
//! The [`Processor`] is the lock owner. It runs in-process behind the
//! delegation gateway, or inside the worker behind `POST /process`; either way
//! the protocol is the same:
//!
//! 1. [`Processor::admit`] bootstraps the schema, reaps stale locks, and tries
//!    to acquire the user's lock. A busy user is told to wait right here.
//! 2. [`Processor::run`] consumes the [`LockLease`], runs describe → speech →
//!    deliver within the lock lifetime, and releases the lease exactly once
//!    whatever happens inside.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::deliver::{SpeechStatus, deliver_description, notify};
use crate::ai::{SpeechClient, VisionClient};
use crate::core::config::AppConfig;
use crate::core::models::{ImageJob, ProcessingJob, Stage};
use crate::core::ports::{Describer, Notifier, SpeechSynthesizer};
use crate::errors::BotError;
use crate::lock::{LockLease, LockRecord, LockStore, PgLockStore};
use crate::telegram::TelegramClient;
use crate::telegram::messages;

/// Result of an acquisition attempt.
pub enum Admission {
    Acquired(LockLease),
    /// Another job holds the user's lock, or the store could not vouch for
    /// exclusivity. The user has already been told to wait.
    Busy,
}

#[derive(Clone)]
pub struct Processor {
    locks: Option<Arc<dyn LockStore>>,
    notifier: Arc<dyn Notifier>,
    describer: Arc<dyn Describer>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    stale_after: Duration,
}

impl Processor {
    #[must_use]
    pub fn new(
        locks: Option<Arc<dyn LockStore>>,
        notifier: Arc<dyn Notifier>,
        describer: Arc<dyn Describer>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
        stale_after: Duration,
    ) -> Self {
        Self {
            locks,
            notifier,
            describer,
            speech,
            stale_after,
        }
    }

    /// Wire the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `DATABASE_URL` is set but unparseable.
    pub fn from_config(config: &AppConfig, telegram: Arc<TelegramClient>) -> Result<Self, BotError> {
        let locks: Option<Arc<dyn LockStore>> = match config.database_url.as_deref() {
            Some(url) => Some(Arc::new(PgLockStore::connect_lazy(url)?)),
            None => {
                warn!("DATABASE_URL is not set; photo jobs will be rejected");
                None
            }
        };
        let describer = Arc::new(VisionClient::new(
            config.openrouter_api_key.clone(),
            config.vision_api_url.clone(),
            config.vision_model.clone(),
        ));
        let speech = config
            .converter_api_url
            .clone()
            .map(|url| Arc::new(SpeechClient::new(url)) as Arc<dyn SpeechSynthesizer>);

        Ok(Self::new(
            locks,
            telegram,
            describer,
            speech,
            config.lock_stale_after,
        ))
    }

    /// Try to take the user's lock.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` when no lock store is configured. The
    /// user is not notified in that case; the caller owns that message.
    pub async fn admit(&self, chat_id: i64) -> Result<Admission, BotError> {
        let Some(locks) = self.locks.as_ref() else {
            error!(chat_id, "No lock store configured (DATABASE_URL)");
            return Err(BotError::ConfigurationMissing("DATABASE_URL".to_string()));
        };

        match self.try_lock(locks.as_ref(), chat_id).await {
            Ok(Some(record)) => {
                info!(chat_id, stage = %Stage::Acquired, "Lock acquired");
                Ok(Admission::Acquired(LockLease::new(Arc::clone(locks), record)))
            }
            Ok(None) => {
                let held_secs = match locks.current(chat_id).await {
                    Ok(Some(record)) => Some((chrono::Utc::now() - record.locked_at).num_seconds()),
                    _ => None,
                };
                info!(chat_id, stage = %Stage::LockWait, ?held_secs, "User already has a job in flight");
                notify(self.notifier.as_ref(), chat_id, messages::PLEASE_WAIT).await;
                Ok(Admission::Busy)
            }
            Err(e) => {
                // Exclusivity cannot be guaranteed, so the job is refused.
                error!(chat_id, stage = %Stage::LockWait, "Lock store unavailable: {}", e);
                notify(self.notifier.as_ref(), chat_id, messages::PLEASE_WAIT).await;
                Ok(Admission::Busy)
            }
        }
    }

    async fn try_lock(
        &self,
        locks: &dyn LockStore,
        chat_id: i64,
    ) -> Result<Option<LockRecord>, BotError> {
        locks.ensure_schema().await?;
        let reaped = locks.reap_stale(self.stale_after).await?;
        if reaped > 0 {
            warn!(reaped, "Reaped stale user locks");
        }
        locks.try_acquire(chat_id).await
    }

    /// Run the pipeline under `lease` and release it.
    ///
    /// The pipeline is cut off once it has run for the staleness threshold, so
    /// it never keeps working after its lock could have been reaped.
    pub async fn run(&self, lease: LockLease, job: ImageJob) {
        let chat_id = lease.chat_id();
        let guarded = AssertUnwindSafe(self.process(job)).catch_unwind();
        let outcome = tokio::time::timeout(self.stale_after, guarded).await;
        lease.release().await;

        match outcome {
            Ok(Ok(())) => info!(chat_id, stage = %Stage::Done, "Photo job finished"),
            Ok(Err(_)) => {
                error!(chat_id, stage = %Stage::Aborted, "Photo job panicked");
                notify(self.notifier.as_ref(), chat_id, messages::GENERIC_FAILURE).await;
            }
            Err(_) => {
                error!(
                    chat_id,
                    stage = %Stage::Aborted,
                    limit_secs = self.stale_after.as_secs(),
                    "Photo job exceeded the lock lifetime"
                );
                notify(self.notifier.as_ref(), chat_id, messages::GENERIC_FAILURE).await;
            }
        }
    }

    async fn process(&self, job: ImageJob) {
        let chat_id = job.chat_id;
        let mut state = ProcessingJob::new(&job);
        info!(chat_id, stage = %Stage::Processing, "Processing photo");
        notify(self.notifier.as_ref(), chat_id, messages::PROCESSING_STARTED).await;

        let description = match self.describer.describe(&state.image_url).await {
            Ok(d) => d,
            Err(e) => {
                warn!(chat_id, "Description failed: {}", e);
                notify(self.notifier.as_ref(), chat_id, e.user_message()).await;
                return;
            }
        };

        let speech = match self.speech.as_ref() {
            Some(converter) => match converter.synthesize(&description).await {
                Ok(audio) => {
                    state.audio = Some(audio);
                    SpeechStatus::Converted
                }
                Err(e) => {
                    warn!(chat_id, "Speech conversion failed: {}", e);
                    SpeechStatus::Failed
                }
            },
            None => SpeechStatus::Skipped,
        };

        state.description = Some(description);
        deliver_description(self.notifier.as_ref(), state, speech).await;
    }
}
