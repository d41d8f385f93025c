use std::fmt;

use serde::{Deserialize, Serialize};

/// A photo ready for description: the wire body of the worker's `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageJob {
    pub image_url: String,
    pub chat_id: i64,
}

/// State carried through one lock-guarded run.
#[derive(Debug)]
pub struct ProcessingJob {
    pub chat_id: i64,
    pub image_url: String,
    pub description: Option<String>,
    pub audio: Option<Vec<u8>>,
}

impl ProcessingJob {
    #[must_use]
    pub fn new(job: &ImageJob) -> Self {
        Self {
            chat_id: job.chat_id,
            image_url: job.image_url.clone(),
            description: None,
            audio: None,
        }
    }
}

/// Orchestration stages, logged as the `stage` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Classified,
    /// Text or ignored update; no lock is touched.
    Idle,
    LockWait,
    Acquired,
    Processing,
    Released,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Classified => "classified",
            Stage::Idle => "idle",
            Stage::LockWait => "lock_wait",
            Stage::Acquired => "acquired",
            Stage::Processing => "processing",
            Stage::Released => "released",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_log_as_snake_case() {
        assert_eq!(Stage::Idle.to_string(), "idle");
        assert_eq!(Stage::LockWait.to_string(), "lock_wait");
        assert_eq!(Stage::Aborted.to_string(), "aborted");
    }
}
