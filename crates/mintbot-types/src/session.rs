//! Conversation session types.
//!
//! A `Session` exists only while a creation or revocation flow is in
//! progress. "Idle" is modelled as the absence of a session rather than a
//! state variant, so a cancelled or finished conversation leaves nothing
//! behind in the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provisioning::LedgerAddress;
use crate::token::ImageReference;

/// Opaque per-conversation key (a Telegram chat id, or an HTTP path id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Where a conversation currently is.
///
/// Creation flow states are listed in collection order; the revocation flow
/// has its own two states. There is no separate confirmation state:
/// `AwaitingSecret` covers both "awaiting confirmation" and the secret
/// prompt. It is entered right after the review summary is shown, and
/// sending the key is the confirmation. `/cancel` declines. It is the only
/// creation state that accepts key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    CollectingName,
    CollectingSymbol,
    CollectingDescription,
    CollectingSupply,
    CollectingImage,
    CollectingWebsite,
    CollectingTwitter,
    CollectingTelegram,
    CollectingDiscord,
    AwaitingSecret,
    AwaitingRevokeTarget,
    AwaitingRevokeSecret,
}

impl SessionState {
    /// Whether this state belongs to the token creation flow.
    pub fn is_creation(&self) -> bool {
        !matches!(
            self,
            SessionState::AwaitingRevokeTarget | SessionState::AwaitingRevokeSecret
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::CollectingName => "collecting_name",
            SessionState::CollectingSymbol => "collecting_symbol",
            SessionState::CollectingDescription => "collecting_description",
            SessionState::CollectingSupply => "collecting_supply",
            SessionState::CollectingImage => "collecting_image",
            SessionState::CollectingWebsite => "collecting_website",
            SessionState::CollectingTwitter => "collecting_twitter",
            SessionState::CollectingTelegram => "collecting_telegram",
            SessionState::CollectingDiscord => "collecting_discord",
            SessionState::AwaitingSecret => "awaiting_secret",
            SessionState::AwaitingRevokeTarget => "awaiting_revoke_target",
            SessionState::AwaitingRevokeSecret => "awaiting_revoke_secret",
        };
        f.write_str(name)
    }
}

/// Fields collected so far. Each is `Some` only once its collecting state
/// has been passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFields {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub supply: Option<u64>,
    pub image: Option<ImageReference>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    /// Defaults to keeping authorities.
    pub revoke_requested: bool,
    /// Target mint for the revocation flow.
    pub mint_address: Option<LedgerAddress>,
}

/// Per-conversation mutable record, owned by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: ConversationId,
    pub state: SessionState,
    pub fields: SessionFields,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Start a new session in the given state with no fields collected.
    pub fn new(id: ConversationId, state: SessionState) -> Self {
        let now = Utc::now();
        Self {
            id,
            state,
            fields: SessionFields::default(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Move to `state` and refresh the activity timestamp.
    pub fn advance(&mut self, state: SessionState) {
        self.state = state;
        self.touch();
    }

    /// Refresh the activity timestamp without changing state.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
