//! Telegram Bot API transport (long polling).

pub mod client;
pub mod types;

pub use client::{TelegramClient, TelegramError};
