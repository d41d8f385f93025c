//! Inbound webhook payloads and the message classifier.

use serde::Deserialize;

/// A Telegram `Update`, reduced to the fields this bot reads.
///
/// Every field is optional so that update kinds the bot does not handle
/// (callback queries, polls, member updates) still deserialize and classify
/// as [`Classification::Ignore`].
#[derive(Debug, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
    #[serde(default)]
    pub edited_channel_post: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub chat: Option<Chat>,
    /// Available sizes of one photo, ascending by resolution.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Photo { chat_id: i64, file_id: String },
    Text { chat_id: i64 },
    Ignore,
}

impl Update {
    /// The first message-bearing field present, in platform priority order.
    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
    }
}

/// Decide what kind of event this is. Pure; no I/O.
#[must_use]
pub fn classify(update: &Update) -> Classification {
    let Some(message) = update.message() else {
        return Classification::Ignore;
    };
    let Some(chat_id) = message.chat.as_ref().and_then(|c| c.id) else {
        return Classification::Ignore;
    };

    // Last entry is the largest rendition.
    match message.photo.as_deref().and_then(|sizes| sizes.last()) {
        Some(largest) => Classification::Photo {
            chat_id,
            file_id: largest.file_id.clone(),
        },
        None => Classification::Text { chat_id },
    }
}
