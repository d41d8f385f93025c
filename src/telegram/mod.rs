//! All Telegram-specific functionality

pub mod client;
pub mod messages;
pub mod update;

pub use client::TelegramClient;
pub use update::{Classification, Update, classify};
