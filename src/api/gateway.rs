//! Delegation gateway: where and how a photo job runs.
//!
//! The topology decides *where* the lock-guarded work happens (this process,
//! or a worker reached over HTTP). The discipline decides whether the webhook
//! continuation waits for the answer. Both are plain configuration so tests
//! can drive every combination.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::core::config::{AppConfig, DelegationDiscipline, DelegationTopology};
use crate::core::models::ImageJob;
use crate::errors::BotError;
use crate::worker::processor::{Admission, Processor};

/// Slack on top of the worker's own job deadline before giving up on its answer.
const WORKER_RESPONSE_MARGIN: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub enum DelegationOutcome {
    /// The job ran to completion under the user's lock.
    Accepted,
    /// A job for this user is already running; the user has been told.
    Busy,
    /// Nothing ran. The caller owns the user-facing message.
    Failed(BotError),
}

/// Hands a job to a worker process.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, job: &ImageJob) -> DelegationOutcome;
}

/// `POST {base}/process` client for the remote worker.
pub struct HttpWorkerClient {
    base_url: Option<String>,
    http: Client,
}

impl HttpWorkerClient {
    /// `timeout` must cover a whole job: the worker answers once the
    /// pipeline has finished.
    #[must_use]
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            http,
        }
    }
}

#[async_trait]
impl JobSubmitter for HttpWorkerClient {
    async fn submit(&self, job: &ImageJob) -> DelegationOutcome {
        let Some(base) = self.base_url.as_deref() else {
            error!(chat_id = job.chat_id, "WORKER_API_URL is not set; job not delegated");
            return DelegationOutcome::Failed(BotError::ConfigurationMissing(
                "WORKER_API_URL".to_string(),
            ));
        };

        let resp = match self
            .http
            .post(format!("{base}/process"))
            .json(job)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!(chat_id = job.chat_id, "Error delegating task to worker: {}", e);
                return DelegationOutcome::Failed(e.into());
            }
        };

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        outcome_for_status(status, &body)
    }
}

/// Interpret the worker's acknowledgement.
#[must_use]
pub fn outcome_for_status(status: StatusCode, body: &str) -> DelegationOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        info!("Worker is busy, request acknowledged");
        DelegationOutcome::Busy
    } else if status.is_success() {
        DelegationOutcome::Accepted
    } else {
        let preview: String = body.chars().take(200).collect();
        warn!("Error from worker service: status={} body={}", status, preview);
        DelegationOutcome::Failed(BotError::UpstreamError(format!(
            "worker returned {status}: {preview}"
        )))
    }
}

#[derive(Clone)]
pub enum DelegationTarget {
    InProcess(Processor),
    Remote(Arc<dyn JobSubmitter>),
}

#[derive(Clone)]
pub struct DelegationGateway {
    target: DelegationTarget,
    discipline: DelegationDiscipline,
}

impl DelegationGateway {
    #[must_use]
    pub fn new(target: DelegationTarget, discipline: DelegationDiscipline) -> Self {
        Self { target, discipline }
    }

    /// # Errors
    ///
    /// Propagates `Processor::from_config` failures for the in-process topology.
    pub fn from_config(
        config: &AppConfig,
        processor: impl FnOnce() -> Result<Processor, BotError>,
    ) -> Result<Self, BotError> {
        let target = match config.topology {
            DelegationTopology::InProcess => DelegationTarget::InProcess(processor()?),
            DelegationTopology::Remote => DelegationTarget::Remote(Arc::new(
                HttpWorkerClient::new(
                    config.worker_api_url.clone(),
                    config.lock_stale_after + WORKER_RESPONSE_MARGIN,
                ),
            )),
        };
        Ok(Self::new(target, config.discipline))
    }

    #[must_use]
    pub fn discipline(&self) -> DelegationDiscipline {
        self.discipline
    }

    /// Run or hand off `job` once and report how it went. Never retries.
    pub async fn delegate(&self, job: ImageJob) -> DelegationOutcome {
        match &self.target {
            DelegationTarget::Remote(submitter) => submitter.submit(&job).await,
            DelegationTarget::InProcess(processor) => match processor.admit(job.chat_id).await {
                Ok(Admission::Acquired(lease)) => {
                    processor.run(lease, job).await;
                    DelegationOutcome::Accepted
                }
                Ok(Admission::Busy) => DelegationOutcome::Busy,
                Err(e) => DelegationOutcome::Failed(e),
            },
        }
    }

    /// Fire-and-forget: spawn [`Self::delegate`] and log whatever it returns.
    pub fn detach(&self, job: ImageJob) {
        let gateway = self.clone();
        let chat_id = job.chat_id;
        tokio::spawn(async move {
            match gateway.delegate(job).await {
                DelegationOutcome::Accepted => info!(chat_id, "Detached delegation accepted"),
                DelegationOutcome::Busy => info!(chat_id, "Detached delegation: user busy"),
                DelegationOutcome::Failed(e) => {
                    error!(chat_id, "Detached delegation failed: {}", e);
                }
            }
        });
    }
}
