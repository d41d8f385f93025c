//! User-facing chat strings.

pub const HELP: &str = "Hi! Send me a photo and I'll describe it for you, as a voice message \
and as a text file you can copy from. I only describe pictures, so I can't chat about anything else.";

pub const PROCESSING_STARTED: &str = "Got your photo! I'm describing it now. You'll get a voice \
message and a description.txt file in a moment (free services can be slow, thanks for your patience).";

pub const PLEASE_WAIT: &str =
    "I'm still working on your previous photo. Please wait for it to finish before sending another one.";

pub const IMAGE_UNAVAILABLE: &str =
    "Sorry, I couldn't retrieve that image from Telegram. Please try sending it again.";

pub const RATE_LIMITED: &str =
    "The description service is overloaded right now. Please try again in a minute.";

pub const GENERIC_FAILURE: &str = "Sorry, something went wrong while describing your photo. Please try again.";

pub const SYSTEM_ERROR: &str =
    "System error: the bot is not configured correctly. Please let the administrator know.";

pub const VOICE_FILENAME: &str = "voice.ogg";
pub const DESCRIPTION_FILENAME: &str = "description.txt";

/// Telegram's `sendMessage` text limit, in characters.
pub const TEXT_LIMIT: usize = 4096;

/// Text sent instead of the voice message when speech conversion fails.
#[must_use]
pub fn speech_fallback(description: &str) -> String {
    format!("(Voice unavailable) Description: {description}")
}

/// Split `text` into chunks of at most `limit` characters, preferring to break
/// after a newline or space in the second half of a chunk.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let hard_end = (start + limit).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            chars[start + limit / 2..hard_end]
                .iter()
                .rposition(|c| *c == '\n' || *c == ' ')
                .map_or(hard_end, |pos| start + limit / 2 + pos + 1)
        };
        chunks.push(chars[start..end].iter().collect());
        start = end;
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}
