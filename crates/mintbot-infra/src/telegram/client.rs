//! TelegramClient -- the three Bot API calls mintbot needs.
//!
//! Request URLs embed the bot token, so transport errors are stripped of
//! their URL before they are logged or returned.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use mintbot_types::config::TelegramConfig;
use mintbot_types::error::ConfigError;
use mintbot_types::token::ImageReference;

use super::types::{ApiResponse, File, GetFile, GetUpdates, PhotoSize, SendMessage, Update};

const ALLOWED_UPDATES: &[&str] = &["message"];

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(String),

    #[error("telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("unexpected telegram response: {0}")]
    Decode(String),
}

impl TelegramError {
    /// Telegram could not parse the Markdown entities in a message.
    fn is_markdown_rejection(&self) -> bool {
        matches!(self, Self::Api { code: 400, description } if description.contains("parse entities"))
    }
}

// Holds the bot token; no Debug.
pub struct TelegramClient {
    client: reqwest::Client,
    token: SecretString,
    api_base: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, ConfigError> {
        let token = config.require_bot_token()?.clone();
        // Must outlive the long-poll wait.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()
            .expect("failed to create reqwest client");

        Ok(Self {
            client,
            token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token.expose_secret())
    }

    /// Download URL for a `file_path` returned by `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.api_base, self.token.expose_secret())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url().to_string()))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Decode(e.without_url().to_string()))?;
        unwrap_response(parsed)
    }

    /// Long-poll for new messages after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &body).await
    }

    /// Send `text` to `chat_id`. Markdown that Telegram refuses to parse is
    /// resent as plain text.
    pub async fn send_message(&self, chat_id: i64, text: &str, markdown: bool) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: markdown.then_some("Markdown"),
            disable_web_page_preview: true,
        };

        match self.call::<_, serde_json::Value>("sendMessage", &body).await {
            Ok(_) => Ok(()),
            Err(err) if markdown && err.is_markdown_rejection() => {
                tracing::debug!(chat_id, "markdown rejected, resending as plain text");
                let plain = SendMessage {
                    parse_mode: None,
                    ..body
                };
                self.call::<_, serde_json::Value>("sendMessage", &plain)
                    .await
                    .map(|_| ())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &GetFile { file_id }).await
    }

    /// Download reference for the largest size of a photo.
    pub async fn photo_reference(&self, sizes: &[PhotoSize]) -> Result<ImageReference, TelegramError> {
        let largest = largest_photo(sizes)
            .ok_or_else(|| TelegramError::Decode("photo without sizes".to_string()))?;
        let file = self.get_file(&largest.file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| TelegramError::Decode(format!("file {} has no path", file.file_id)))?;
        Ok(ImageReference::new(self.file_url(&path)))
    }
}

fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, TelegramError> {
    match response {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            ok: true,
            result: None,
            ..
        } => Err(TelegramError::Decode("missing result".to_string())),
        ApiResponse {
            description,
            error_code,
            ..
        } => Err(TelegramError::Api {
            code: error_code.unwrap_or_default(),
            description: description.unwrap_or_default(),
        }),
    }
}

fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|p| (u64::from(p.width) * u64::from(p.height), p.file_size.unwrap_or(0)))
}
