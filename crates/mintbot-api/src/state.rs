//! Application state wiring all services together.
//!
//! `ConversationService` is generic over its collaborators; AppState pins
//! it to the concrete infra adapters and puts the keyed dispatcher in front
//! of it. Both transports (Telegram and HTTP) share this wiring.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use mintbot_core::conversation::ConversationService;
use mintbot_core::dispatch::{InputHandler, KeyedDispatcher};
use mintbot_core::idea::IdeaGenerator;
use mintbot_core::ports::ReplySink;
use mintbot_core::provision::Provisioner;
use mintbot_core::reply::{Reply, ReplyBuffer};
use mintbot_core::session::{Input, SessionStore};
use mintbot_infra::idea::{DexScreenerTrends, OpenAiEnhancer};
use mintbot_infra::pinning::NftStoragePublisher;
use mintbot_infra::solana::SolanaLedger;
use mintbot_infra::telegram::types::PhotoSize;
use mintbot_types::config::{IdeaConfig, MintbotConfig};
use mintbot_types::session::ConversationId;
use mintbot_types::token::ImageReference;

use crate::runner::TelegramSink;

/// How often idle session slots are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub type ConcreteIdeaGenerator = IdeaGenerator<DexScreenerTrends, OpenAiEnhancer>;

pub type ConcreteConversationService =
    ConversationService<NftStoragePublisher, SolanaLedger, DexScreenerTrends, OpenAiEnhancer>;

pub type ConcreteDispatcher = KeyedDispatcher<InboundHandler, Outbox, Inbound>;

/// One inbound message as queued for its conversation.
pub enum Inbound {
    Input(Input),
    /// Telegram photo sizes, resolved to a download URL by the worker so the
    /// poll loop never waits on `getFile`.
    TelegramPhoto(Vec<PhotoSize>),
}

/// Resolves transport-specific inputs, then runs the conversation service.
pub struct InboundHandler {
    conversations: Arc<ConcreteConversationService>,
}

impl InputHandler<Outbox, Inbound> for InboundHandler {
    async fn handle_input(&self, id: ConversationId, inbound: Inbound, sink: &Outbox) {
        let input = match inbound {
            Inbound::Input(input) => input,
            Inbound::TelegramPhoto(sizes) => match sink.resolve_photo(&sizes).await {
                Some(image) => Input::Image(image),
                None => return,
            },
        };
        self.conversations.handle(id, input, sink).await
    }
}

/// Where one input's replies go.
pub enum Outbox {
    Telegram(TelegramSink),
    Buffer(Arc<ReplyBuffer>),
}

impl Outbox {
    async fn resolve_photo(&self, sizes: &[PhotoSize]) -> Option<ImageReference> {
        match self {
            Outbox::Telegram(sink) => sink.photo_reference(sizes).await,
            Outbox::Buffer(_) => None,
        }
    }
}

impl ReplySink for Outbox {
    async fn send(&self, reply: Reply) {
        match self {
            Outbox::Telegram(sink) => sink.send(reply).await,
            Outbox::Buffer(buffer) => buffer.send(reply).await,
        }
    }
}

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<ConcreteConversationService>,
    pub dispatcher: ConcreteDispatcher,
    pub cancel: CancellationToken,
    pub config: Arc<MintbotConfig>,
}

impl AppState {
    /// Wire adapters, the conversation service and the dispatcher, and start
    /// the session sweeper. Background tasks stop when `cancel` fires.
    pub fn init(config: MintbotConfig, cancel: CancellationToken) -> Self {
        let provisioner = Provisioner::new(
            NftStoragePublisher::new(&config.pinning),
            SolanaLedger::new(&config.ledger),
            config.ledger.cluster.clone(),
        );
        let store = SessionStore::new();
        let conversations = Arc::new(ConversationService::new(
            store.clone(),
            provisioner,
            build_idea_generator(&config.ideas),
        ));

        let max_idle = config
            .session
            .idle_timeout_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(chrono::Duration::seconds);
        store.spawn_sweeper(SWEEP_INTERVAL, max_idle, cancel.clone());

        tracing::info!(
            pinning = config.pinning.api_key.is_some(),
            ideas = ?conversations.ideas().strategy(),
            cluster = %config.ledger.cluster,
            idle_timeout_secs = ?config.session.idle_timeout_secs,
            "application state initialized"
        );

        let handler = InboundHandler {
            conversations: Arc::clone(&conversations),
        };
        let dispatcher = KeyedDispatcher::new(Arc::new(handler), cancel.clone());

        Self {
            conversations,
            dispatcher,
            cancel,
            config: Arc::new(config),
        }
    }
}

pub fn build_idea_generator(config: &IdeaConfig) -> ConcreteIdeaGenerator {
    IdeaGenerator::new(
        DexScreenerTrends::new(config.trends_url.clone()),
        OpenAiEnhancer::from_config(config),
    )
}
