//! Webhook orchestration.
//!
//! [`Orchestrator::accept`] is synchronous: it classifies the update and
//! spawns the continuation, so the handler can acknowledge the platform
//! before any outbound call is made. Telegram retries webhooks that answer
//! slowly, and a retry here would be a duplicate photo job.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::gateway::{DelegationGateway, DelegationOutcome};
use crate::core::config::{AppConfig, DelegationDiscipline};
use crate::core::models::{ImageJob, Stage};
use crate::core::ports::{ImageSource, Notifier};
use crate::errors::BotError;
use crate::telegram::messages;
use crate::telegram::{Classification, TelegramClient, Update, classify};
use crate::worker::deliver::notify;
use crate::worker::processor::Processor;

#[derive(Clone)]
pub struct Orchestrator {
    notifier: Arc<dyn Notifier>,
    images: Arc<dyn ImageSource>,
    gateway: DelegationGateway,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        images: Arc<dyn ImageSource>,
        gateway: DelegationGateway,
    ) -> Self {
        Self {
            notifier,
            images,
            gateway,
        }
    }

    /// Wire the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the in-process lock store URL is unparseable.
    pub fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        let telegram = Arc::new(TelegramClient::new(
            config.telegram_bot_token.clone(),
            config.telegram_api_base.clone(),
        ));
        let gateway = DelegationGateway::from_config(config, || {
            Processor::from_config(config, Arc::clone(&telegram))
        })?;
        Ok(Self::new(telegram.clone(), telegram, gateway))
    }

    /// Classify `update` and spawn whatever follows. Returns `None` when the
    /// update needs no work at all.
    pub fn accept(&self, update: &Update) -> Option<JoinHandle<()>> {
        let correlation_id = Uuid::new_v4().to_string();
        let classification = classify(update);

        let (chat_id, work) = match classification {
            Classification::Ignore => {
                info!(%correlation_id, stage = %Stage::Idle, "Ignoring update without a chat");
                return None;
            }
            Classification::Text { chat_id } => (chat_id, None),
            Classification::Photo { chat_id, file_id } => (chat_id, Some(file_id)),
        };

        let span = info_span!("update", %correlation_id, chat_id);
        let this = self.clone();
        let continuation = async move {
            info!(stage = %Stage::Classified, photo = work.is_some(), "Update classified");
            let body = async {
                match work {
                    Some(file_id) => this.handle_photo(chat_id, &file_id).await,
                    None => {
                        info!(stage = %Stage::Idle, "Text message, sending help");
                        notify(this.notifier.as_ref(), chat_id, messages::HELP).await;
                    }
                }
            };
            if AssertUnwindSafe(body).catch_unwind().await.is_err() {
                error!(stage = %Stage::Aborted, "Update continuation panicked");
                notify(this.notifier.as_ref(), chat_id, messages::GENERIC_FAILURE).await;
            }
        };

        Some(tokio::spawn(continuation.instrument(span)))
    }

    async fn handle_photo(&self, chat_id: i64, file_id: &str) {
        let image_url = match self.images.resolve_image_url(file_id).await {
            Ok(url) => url,
            Err(e) => {
                warn!(stage = %Stage::Aborted, "Cannot retrieve image: {}", e);
                notify(self.notifier.as_ref(), chat_id, messages::IMAGE_UNAVAILABLE).await;
                return;
            }
        };
        let job = ImageJob { image_url, chat_id };

        match self.gateway.discipline() {
            DelegationDiscipline::Detached => {
                self.gateway.detach(job);
                info!("Photo job detached");
            }
            DelegationDiscipline::Awaited => match self.gateway.delegate(job).await {
                DelegationOutcome::Accepted => info!("Photo job accepted"),
                // The lock owner already told the user to wait.
                DelegationOutcome::Busy => info!(stage = %Stage::Aborted, "User busy"),
                DelegationOutcome::Failed(e) => {
                    error!(stage = %Stage::Aborted, "Delegation failed: {}", e);
                    notify(self.notifier.as_ref(), chat_id, e.user_message()).await;
                }
            },
        }
    }
}
