#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use lookout::api::gateway::{DelegationOutcome, JobSubmitter};
use lookout::core::models::ImageJob;
use lookout::core::ports::{Describer, ImageSource, Notifier, SpeechSynthesizer};
use lookout::errors::BotError;
use lookout::lock::{LockRecord, LockStore};
use lookout::worker::Processor;

pub const DESCRIPTION: &str = "A red bicycle leaning against a brick wall.";

/// In-memory lock table with the same insert-if-absent semantics as Postgres.
#[derive(Default)]
pub struct MemoryLockStore {
    rows: Mutex<HashMap<i64, DateTime<Utc>>>,
    pub schema_calls: AtomicUsize,
    pub acquired: AtomicUsize,
    pub releases: AtomicUsize,
    pub unavailable: AtomicBool,
}

impl MemoryLockStore {
    pub fn insert_at(&self, chat_id: i64, locked_at: DateTime<Utc>) {
        self.rows.lock().unwrap().insert(chat_id, locked_at);
    }

    /// Backdate the live row for `chat_id`, as if its job had been running for `age`.
    pub fn age(&self, chat_id: i64, age: chrono::Duration) {
        if let Some(locked_at) = self.rows.lock().unwrap().get_mut(&chat_id) {
            *locked_at = *locked_at - age;
        }
    }

    pub fn holds(&self, chat_id: i64) -> bool {
        self.rows.lock().unwrap().contains_key(&chat_id)
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), BotError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BotError::LockStoreUnavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn ensure_schema(&self) -> Result<(), BotError> {
        self.check()?;
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reap_stale(&self, threshold: Duration) -> Result<u64, BotError> {
        self.check()?;
        let cutoff = Utc::now() - chrono::Duration::from_std(threshold).unwrap();
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, locked_at| *locked_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn try_acquire(&self, chat_id: i64) -> Result<Option<LockRecord>, BotError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&chat_id) {
            return Ok(None);
        }
        let locked_at = Utc::now();
        rows.insert(chat_id, locked_at);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Some(LockRecord { chat_id, locked_at }))
    }

    async fn release(&self, chat_id: i64) -> Result<(), BotError> {
        self.check()?;
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().remove(&chat_id);
        Ok(())
    }

    async fn release_record(&self, record: &LockRecord) -> Result<bool, BotError> {
        self.check()?;
        self.releases.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if rows.get(&record.chat_id) == Some(&record.locked_at) {
            rows.remove(&record.chat_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn current(&self, chat_id: i64) -> Result<Option<LockRecord>, BotError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&chat_id)
            .map(|locked_at| LockRecord {
                chat_id,
                locked_at: *locked_at,
            }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(i64, String),
    Audio(i64, Vec<u8>, String),
    File(i64, Vec<u8>, String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        audio: Vec<u8>,
        filename: &str,
    ) -> Result<(), BotError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Audio(chat_id, audio, filename.to_string()));
        Ok(())
    }

    async fn send_file(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<(), BotError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::File(chat_id, bytes, filename.to_string()));
        Ok(())
    }
}

/// Describer scripted by a closure.
pub struct ScriptedDescriber {
    reply: Box<dyn Fn() -> Result<String, BotError> + Send + Sync>,
    pub calls: AtomicUsize,
}

impl ScriptedDescriber {
    pub fn ok() -> Self {
        Self::with(|| Ok(DESCRIPTION.to_string()))
    }

    pub fn with(reply: impl Fn() -> Result<String, BotError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Describer for ScriptedDescriber {
    async fn describe(&self, _image_url: &str) -> Result<String, BotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)()
    }
}

/// Blocks inside `describe` until [`GatedDescriber::open`] is called.
#[derive(Default)]
pub struct GatedDescriber {
    entered: Notify,
    gate: Notify,
    pub calls: AtomicUsize,
}

impl GatedDescriber {
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl Describer for GatedDescriber {
    async fn describe(&self, _image_url: &str) -> Result<String, BotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(DESCRIPTION.to_string())
    }
}

pub struct PanickingDescriber;

#[async_trait]
impl Describer for PanickingDescriber {
    async fn describe(&self, _image_url: &str) -> Result<String, BotError> {
        panic!("vision client blew up");
    }
}

pub struct FakeSpeech {
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, BotError> {
        if self.fail {
            Err(BotError::UpstreamError("converter returned 500".to_string()))
        } else {
            Ok(b"OggS-fake".to_vec())
        }
    }
}

pub struct FakeImages {
    pub fail: bool,
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn resolve_image_url(&self, file_id: &str) -> Result<String, BotError> {
        if self.fail {
            Err(BotError::ApiError("file not found".to_string()))
        } else {
            Ok(format!("https://files.example/{file_id}.jpg"))
        }
    }
}

/// Records submitted jobs and answers with a fixed outcome.
pub struct FakeSubmitter {
    reply: Box<dyn Fn() -> DelegationOutcome + Send + Sync>,
    pub jobs: Mutex<Vec<ImageJob>>,
}

impl FakeSubmitter {
    pub fn new(reply: impl Fn() -> DelegationOutcome + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            jobs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobSubmitter for FakeSubmitter {
    async fn submit(&self, job: &ImageJob) -> DelegationOutcome {
        self.jobs.lock().unwrap().push(job.clone());
        (self.reply)()
    }
}

pub fn processor(
    store: &Arc<MemoryLockStore>,
    notifier: &Arc<RecordingNotifier>,
    describer: Arc<dyn Describer>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
) -> Processor {
    Processor::new(
        Some(store.clone() as Arc<dyn LockStore>),
        notifier.clone(),
        describer,
        speech,
        Duration::from_secs(120),
    )
}

pub fn job(chat_id: i64) -> ImageJob {
    ImageJob {
        image_url: "https://files.example/photo.jpg".to_string(),
        chat_id,
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_for(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
