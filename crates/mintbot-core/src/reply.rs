//! Outbound message copy.
//!
//! Everything the bot says lives here so the state machine and the
//! conversation service only decide *which* reply to send. Replies are
//! Telegram legacy Markdown; user-supplied values are escaped.

use std::sync::Mutex;

use serde::Serialize;

use mintbot_types::error::ValidationError;
use mintbot_types::provisioning::{
    ProvisionedToken, ProvisioningOutcome, RevocationOutcome, StepFailure,
};
use mintbot_types::session::SessionState;
use mintbot_types::token::{format_grouped, Idea, TokenSpec};

use crate::ports::ReplySink;

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    /// Render with Markdown formatting.
    pub markdown: bool,
}

impl Reply {
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: true,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
        }
    }
}

/// Collects replies in memory, for request/response transports.
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    replies: Mutex<Vec<Reply>>,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every reply collected so far.
    pub fn drain(&self) -> Vec<Reply> {
        match self.replies.lock() {
            Ok(mut replies) => std::mem::take(&mut *replies),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ReplySink for ReplyBuffer {
    async fn send(&self, reply: Reply) {
        match self.replies.lock() {
            Ok(mut replies) => replies.push(reply),
            Err(poisoned) => poisoned.into_inner().push(reply),
        }
    }
}

impl<S: ReplySink> ReplySink for std::sync::Arc<S> {
    async fn send(&self, reply: Reply) {
        S::send(self.as_ref(), reply).await
    }
}

/// Escape characters that legacy Markdown treats as formatting.
pub fn escape_markdown(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn help() -> Reply {
    Reply::markdown(
        "🤖 *mintbot*\n\n\
         Commands:\n\
         /idea - Generate a token idea\n\
         /create - Create a token (9 decimals) with image and social links\n\
         /revoke <MINT> - Revoke mint/freeze authority and lock metadata\n\
         /cancel - Reset the session",
    )
}

pub fn cancelled() -> Reply {
    Reply::markdown("🧹 Session cleared.")
}

pub fn idea(idea: &Idea) -> Reply {
    Reply::markdown(format!(
        "💡 *Idea*\n🪙 *Name:* {}\n🔤 *Symbol:* {}\n📝 {}\n\nRun /create to mint it.",
        escape_markdown(&idea.name),
        escape_markdown(&idea.symbol),
        escape_markdown(&idea.description),
    ))
}

/// The question asked on entering `state`.
pub fn prompt(state: SessionState) -> Reply {
    let text = match state {
        SessionState::CollectingName => "🪙 Send *Token Name*:",
        SessionState::CollectingSymbol => "🔤 Send *Symbol* (4-10 chars):",
        SessionState::CollectingDescription => "📝 Send *Description*:",
        SessionState::CollectingSupply => "💰 Send *Total Supply* (integer):",
        SessionState::CollectingImage => "📸 Upload your *token image* as a photo.",
        SessionState::CollectingWebsite => "🌐 *Website* URL (or type `skip`):",
        SessionState::CollectingTwitter => "🐦 *Twitter/X* URL (or `skip`):",
        SessionState::CollectingTelegram => "📣 *Telegram* URL (or `skip`):",
        SessionState::CollectingDiscord => "👥 *Discord* URL (or `skip`):",
        SessionState::AwaitingSecret => {
            "🔑 Send your *base58 secret key* to mint, or /cancel."
        }
        SessionState::AwaitingRevokeTarget => "🧾 Send the *mint address* to revoke.",
        SessionState::AwaitingRevokeSecret => {
            "🔑 Send your *base58 secret key* (token owner) to revoke authorities & lock metadata."
        }
    };
    Reply::markdown(text)
}

/// Re-prompt after rejected input. The session has not advanced.
pub fn invalid_input(error: &ValidationError, state: SessionState) -> Reply {
    let reason = match error {
        ValidationError::InvalidSupply(_) => "❌ Invalid supply. Try again.".to_string(),
        ValidationError::InvalidMintAddress(_) => {
            "❌ That does not look like a mint address. Try again.".to_string()
        }
        other => format!("❌ {}.", capitalize(&other.to_string())),
    };
    Reply::markdown(format!("{reason}\n{}", prompt(state).text))
}

pub fn image_expected() -> Reply {
    Reply::markdown("📸 Please upload the token image as a *photo*.")
}

pub fn pinning_not_configured() -> Reply {
    Reply::markdown("⚠️ Set NFT\\_STORAGE\\_API\\_KEY and restart.")
}

/// Review summary shown once every field is collected.
pub fn review(spec: &TokenSpec) -> Reply {
    Reply::markdown(format!(
        "📦 *Review*\n\
         🪙 *Name:* {}\n\
         🔤 *Symbol:* {}\n\
         📝 *Desc:* {}\n\
         💰 *Supply:* {}\n\
         🧮 *Decimals:* {}\n\
         🔗 *Links:* {}\n\
         {}\n\n\
         Set /revoke\\_yes or /revoke\\_no, then send your *base58 secret key* to mint.",
        escape_markdown(&spec.name),
        escape_markdown(&spec.symbol),
        escape_markdown(&spec.description),
        format_grouped(spec.supply),
        spec.decimals(),
        escape_markdown(&spec.links.summary()),
        authority_choice_line(spec.revoke_authorities),
    ))
}

pub fn revoke_choice(revoke: bool) -> Reply {
    Reply::markdown(authority_choice_line(revoke))
}

fn authority_choice_line(revoke: bool) -> &'static str {
    if revoke {
        "🔒 Will revoke *mint*/*freeze* and lock metadata."
    } else {
        "🔓 Authorities will be kept."
    }
}

pub fn revoke_choice_without_session() -> Reply {
    Reply::markdown("ℹ️ Nothing to apply that to. Run /create first.")
}

pub fn revoke_usage() -> Reply {
    Reply::plain("Usage: /revoke <MINT_ADDRESS>\nOr send the mint address now.")
}

pub fn unhandled() -> Reply {
    Reply::markdown("🤖 No active session. Run /create to start, or /help for commands.")
}

pub fn unknown_command(word: &str) -> Reply {
    Reply::plain(format!("Unknown command /{word}. Try /help."))
}

pub fn busy() -> Reply {
    Reply::plain("⏳ Still working on your earlier messages. Please wait a moment and try again.")
}

pub fn minting_started() -> Reply {
    Reply::markdown("⛓️ Minting on Solana...")
}

pub fn revoking_started() -> Reply {
    Reply::markdown("⛓️ Revoking authorities...")
}

pub fn secret_rejected(state: SessionState) -> Reply {
    Reply::markdown(format!(
        "❌ That secret key could not be read. Nothing was sent.\n{}",
        prompt(state).text
    ))
}

pub fn incomplete_session() -> Reply {
    Reply::markdown("❌ Session was missing fields and has been cleared. Run /create again.")
}

pub fn provisioning(outcome: &ProvisioningOutcome) -> Reply {
    match outcome {
        ProvisioningOutcome::Created(token) => created(token),
        ProvisioningOutcome::SecretRejected(_) => secret_rejected(SessionState::AwaitingSecret),
        ProvisioningOutcome::Failed(failure) => step_failed("Mint failed", failure),
    }
}

fn created(token: &ProvisionedToken) -> Reply {
    let authority_line = match (token.authorities_revoked, token.metadata_lock_failed) {
        (true, false) => "🔒 Authorities revoked & metadata locked.",
        (true, true) => {
            "🔒 Authorities revoked.\n⚠️ Metadata could not be locked; it is still mutable."
        }
        (false, _) => "🔓 Authorities kept (you can /revoke later).",
    };
    Reply::markdown(format!(
        "✅ *Token created!*\n\
         🧾 *Mint:* [{mint}]({explorer_mint})\n\
         👛 *Owner:* [{owner}]({explorer_owner})\n\
         🔗 *Metadata:* {uri}\n\
         {authority_line}",
        mint = token.mint,
        explorer_mint = token.explorer_mint,
        owner = token.owner,
        explorer_owner = token.explorer_owner,
        uri = escape_markdown(&token.metadata_uri),
    ))
}

pub fn revocation(outcome: &RevocationOutcome) -> Reply {
    match outcome {
        RevocationOutcome::Revoked(result) => {
            let mut text = format!("✅ Revoked. Explorer: {}", result.explorer_mint);
            if result.metadata_lock_failed {
                text.push_str("\n⚠️ Metadata could not be locked; it is still mutable.");
            }
            Reply::plain(text)
        }
        RevocationOutcome::SecretRejected(_) => secret_rejected(SessionState::AwaitingRevokeSecret),
        RevocationOutcome::Failed(failure) => step_failed("Revoke failed", failure),
    }
}

/// Names the failed step and everything that committed before it.
fn step_failed(headline: &str, failure: &StepFailure) -> Reply {
    let mut text = format!(
        "❌ {headline} while {}: {}",
        failure.step.describe(),
        failure.error
    );

    if failure.completed.is_empty() {
        text.push_str("\nNothing was changed.");
    } else {
        let done: Vec<&str> = failure.completed.iter().map(|s| s.describe()).collect();
        text.push_str(&format!("\nAlready done: {}.", done.join(", ")));
    }
    if let Some(mint) = &failure.mint {
        text.push_str(&format!("\nMint: {mint}"));
    }
    if failure.left_partial_state() {
        text.push_str("\nOn-chain changes above were kept and were not retried.");
    }
    Reply::plain(text)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use mintbot_types::error::LedgerError;
    use mintbot_types::provisioning::{CollaboratorError, LedgerAddress, ProvisioningStep};
    use mintbot_types::token::{ImageReference, TokenLinks};

    use super::*;

    fn spec() -> TokenSpec {
        TokenSpec {
            name: "Doge_Blast".to_string(),
            symbol: "DOGEBLAST1".to_string(),
            description: "x".to_string(),
            supply: 1_000_000,
            image: ImageReference::new("https://files.example/p.jpg"),
            links: TokenLinks::default(),
            revoke_authorities: true,
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c`d[e"), "a\\_b\\*c\\`d\\[e");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn test_review_shows_grouped_supply_and_decimals() {
        let reply = review(&spec());
        assert!(reply.text.contains("1,000,000"));
        assert!(reply.text.contains("*Decimals:* 9"));
        assert!(reply.text.contains("Doge\\_Blast"));
        assert!(reply.text.contains("*Links:* none"));
        assert!(reply.text.contains("Will revoke"));
    }

    #[test]
    fn test_invalid_supply_reprompts() {
        let reply = invalid_input(
            &ValidationError::InvalidSupply("abc".to_string()),
            SessionState::CollectingSupply,
        );
        assert!(reply.text.starts_with("❌ Invalid supply. Try again."));
        assert!(reply.text.contains("Total Supply"));
    }

    #[test]
    fn test_invalid_name_message_is_capitalized() {
        let reply = invalid_input(&ValidationError::EmptyName, SessionState::CollectingName);
        assert!(reply.text.starts_with("❌ Token name cannot be empty."));
    }

    #[test]
    fn test_step_failure_names_step_and_completed_steps() {
        let outcome = ProvisioningOutcome::Failed(StepFailure {
            step: ProvisioningStep::CreateMetadataAccount,
            error: CollaboratorError::Ledger(LedgerError::Rejected("custom program error".to_string())),
            completed: vec![ProvisioningStep::PublishMetadata, ProvisioningStep::CreateMint],
            mint: Some(LedgerAddress::new("Mint111")),
        });
        let reply = provisioning(&outcome);
        assert!(reply.text.contains("creating the on-chain metadata"));
        assert!(reply.text.contains("Already done: uploading the image and metadata, creating the token mint."));
        assert!(reply.text.contains("Mint: Mint111"));
        assert!(!reply.text.contains("minting the supply"));
    }

    #[test]
    fn test_created_with_lock_caveat() {
        let token = ProvisionedToken {
            mint: LedgerAddress::new("Mint111"),
            owner: LedgerAddress::new("Owner111"),
            token_account: LedgerAddress::new("Ata111"),
            metadata_account: LedgerAddress::new("Meta111"),
            metadata_uri: "https://ipfs.io/ipfs/cid".to_string(),
            minted_base_units: 1,
            authorities_revoked: true,
            metadata_lock_failed: true,
            explorer_mint: "https://explorer/mint".to_string(),
            explorer_owner: "https://explorer/owner".to_string(),
        };
        let reply = provisioning(&ProvisioningOutcome::Created(token));
        assert!(reply.text.contains("Token created"));
        assert!(reply.text.contains("could not be locked"));
    }
}
