//! Telegram long-poll runner.
//!
//! Pulls updates with `getUpdates`, turns each message into an [`Inbound`]
//! and hands it to the keyed dispatcher without waiting. Replies go straight
//! back to the originating chat through [`TelegramSink`].

use std::sync::Arc;
use std::time::Duration;

use mintbot_core::dispatch::DispatchError;
use mintbot_core::ports::ReplySink;
use mintbot_core::reply::{self, Reply};
use mintbot_core::session::Input;
use mintbot_infra::telegram::types::{Message, PhotoSize};
use mintbot_infra::telegram::TelegramClient;
use mintbot_types::session::ConversationId;
use mintbot_types::token::ImageReference;

use crate::state::{AppState, Inbound, Outbox};

/// Pause after a failed poll before retrying.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Delivers replies to one Telegram chat.
pub struct TelegramSink {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramSink {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }

    /// Download reference for the largest photo size; `None` after logging
    /// when Telegram cannot resolve it.
    pub async fn photo_reference(&self, sizes: &[PhotoSize]) -> Option<ImageReference> {
        match self.client.photo_reference(sizes).await {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(chat_id = self.chat_id, error = %err, "could not resolve photo");
                None
            }
        }
    }
}

impl ReplySink for TelegramSink {
    async fn send(&self, reply: Reply) {
        if let Err(err) = self
            .client
            .send_message(self.chat_id, &reply.text, reply.markdown)
            .await
        {
            tracing::warn!(chat_id = self.chat_id, error = %err, "failed to deliver reply");
        }
    }
}

/// Poll until `state.cancel` fires.
pub async fn run_telegram(state: AppState, client: Arc<TelegramClient>) {
    let mut offset: Option<i64> = None;
    tracing::info!("telegram polling started");

    loop {
        let polled = tokio::select! {
            _ = state.cancel.cancelled() => break,
            polled = client.get_updates(offset) => polled,
        };

        let updates = match polled {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed, retrying");
                tokio::select! {
                    _ = state.cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(message) = update.message {
                route(&state, &client, message);
            }
        }
    }

    tracing::info!("telegram polling stopped");
}

fn route(state: &AppState, client: &Arc<TelegramClient>, message: Message) {
    let chat_id = message.chat.id;
    let Some(inbound) = to_inbound(message) else {
        return;
    };

    let sink = Outbox::Telegram(TelegramSink::new(Arc::clone(client), chat_id));
    match state
        .dispatcher
        .try_dispatch(ConversationId(chat_id), inbound, sink)
    {
        Ok(()) => {}
        Err(DispatchError::Busy(_)) => {
            tracing::warn!(chat_id, "conversation queue full, input dropped");
            let sink = TelegramSink::new(Arc::clone(client), chat_id);
            tokio::spawn(async move { sink.send(reply::busy()).await });
        }
        Err(err) => tracing::warn!(chat_id, error = %err, "input dropped"),
    }
}

fn to_inbound(message: Message) -> Option<Inbound> {
    if let Some(text) = message.text {
        return Some(Inbound::Input(Input::Text(text)));
    }
    message
        .photo
        .filter(|sizes| !sizes.is_empty())
        .map(Inbound::TelegramPhoto)
}
