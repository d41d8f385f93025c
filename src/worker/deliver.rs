use tracing::{error, info};

use crate::core::models::ProcessingJob;
use crate::core::ports::Notifier;
use crate::telegram::messages::{
    DESCRIPTION_FILENAME, VOICE_FILENAME, speech_fallback,
};

/// How the speech step ended for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStatus {
    /// Audio is attached to the job.
    Converted,
    /// Conversion was attempted and failed.
    Failed,
    /// No converter is configured.
    Skipped,
}

/// Send a user a plain text message, logging instead of failing.
pub async fn notify(notifier: &dyn Notifier, chat_id: i64, text: &str) {
    if let Err(e) = notifier.send_text(chat_id, text).await {
        error!(chat_id, "Failed to notify user: {}", e);
    }
}

/// Deliver a finished description: the voice note (or a text stand-in), then
/// the description as a `.txt` document the user can copy from.
///
/// Delivery failures are logged and never propagate.
pub async fn deliver_description(notifier: &dyn Notifier, job: ProcessingJob, speech: SpeechStatus) {
    let chat_id = job.chat_id;
    let Some(description) = job.description else {
        error!(chat_id, "deliver_description called without a description");
        return;
    };

    match (job.audio, speech) {
        (Some(audio), _) => {
            info!(chat_id, bytes = audio.len(), "Sending voice description");
            if let Err(e) = notifier.send_audio(chat_id, audio, VOICE_FILENAME).await {
                error!(chat_id, "Failed to send voice message: {}", e);
            }
        }
        (None, SpeechStatus::Failed) => {
            notify(notifier, chat_id, &speech_fallback(&description)).await;
        }
        (None, _) => {
            notify(notifier, chat_id, &description).await;
        }
    }

    if let Err(e) = notifier
        .send_file(chat_id, description.into_bytes(), DESCRIPTION_FILENAME)
        .await
    {
        error!(chat_id, "Failed to send description file: {}", e);
    }
}
