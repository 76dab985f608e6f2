//! Conversation service.
//!
//! `ConversationService` is the single entry point for inbound messages. It
//! takes the per-conversation lock, routes slash commands, feeds everything
//! else to the state machine, and runs the provisioning pipelines when the
//! machine reaches a terminal action. The lock is held for the whole input,
//! including provisioning, so `/cancel` only ever lands between steps.

use tracing::Instrument;

use mintbot_types::provisioning::{ProvisioningOutcome, RevocationOutcome};
use mintbot_types::session::{ConversationId, Session};

use crate::command::Command;
use crate::dispatch::InputHandler;
use crate::idea::IdeaGenerator;
use crate::ports::{IdeaEnhancer, LedgerClient, MetadataPublisher, ReplySink, TrendSource};
use crate::provision::Provisioner;
use crate::reply;
use crate::session::{Input, SessionMachine, SessionStore, Transition};

pub struct ConversationService<P, L, T, E> {
    store: SessionStore,
    machine: SessionMachine,
    provisioner: Provisioner<P, L>,
    ideas: IdeaGenerator<T, E>,
}

impl<P, L, T, E> ConversationService<P, L, T, E>
where
    P: MetadataPublisher,
    L: LedgerClient,
    T: TrendSource,
    E: IdeaEnhancer,
{
    pub fn new(store: SessionStore, provisioner: Provisioner<P, L>, ideas: IdeaGenerator<T, E>) -> Self {
        let machine = SessionMachine::new(provisioner.publisher().is_configured());
        Self {
            store,
            machine,
            provisioner,
            ideas,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn ideas(&self) -> &IdeaGenerator<T, E> {
        &self.ideas
    }

    /// Process one inbound input for `id`, sending replies to `sink`.
    pub async fn handle<S: ReplySink>(&self, id: ConversationId, input: Input, sink: &S) {
        let span = tracing::info_span!("conversation", conversation = %id);
        self.handle_inner(id, input, sink).instrument(span).await
    }

    async fn handle_inner<S: ReplySink>(&self, id: ConversationId, input: Input, sink: &S) {
        let mut slot = self.store.lock(id).await;

        if let Input::Text(text) = &input {
            if let Some(command) = Command::parse(text) {
                self.command(id, command, &mut slot, sink).await;
                return;
            }
        }

        let Some(session) = slot.as_mut() else {
            match input {
                Input::Text(_) => sink.send(reply::unhandled()).await,
                Input::Image(_) => tracing::debug!("image with no session ignored"),
            }
            return;
        };

        match self.machine.step(session, input) {
            Transition::Reply(reply) => {
                tracing::debug!(state = %session.state, "session step");
                sink.send(reply).await;
            }
            Transition::Ignore => {
                tracing::debug!(state = %session.state, "input ignored in this state");
            }
            Transition::Abandon(reply) => {
                tracing::warn!(state = %session.state, "abandoning incomplete session");
                *slot = None;
                sink.send(reply).await;
            }
            Transition::Provision { spec, secret } => {
                sink.send(reply::minting_started()).await;
                let outcome = self
                    .provisioner
                    .create_token(&spec, &secret)
                    .instrument(tracing::info_span!("create_token", symbol = %spec.symbol))
                    .await;
                drop(secret);

                match &outcome {
                    ProvisioningOutcome::SecretRejected(_) => session.touch(),
                    ProvisioningOutcome::Created(token) => {
                        tracing::info!(mint = %token.mint, revoked = token.authorities_revoked, "token created");
                        *slot = None;
                    }
                    ProvisioningOutcome::Failed(failure) => {
                        tracing::warn!(step = %failure.step, completed = failure.completed.len(), "token creation failed");
                        *slot = None;
                    }
                }
                sink.send(reply::provisioning(&outcome)).await;
            }
            Transition::Revoke { mint, secret } => {
                sink.send(reply::revoking_started()).await;
                let outcome = self
                    .provisioner
                    .revoke_all(&mint, &secret)
                    .instrument(tracing::info_span!("revoke_all", mint = %mint))
                    .await;
                drop(secret);

                match &outcome {
                    RevocationOutcome::SecretRejected(_) => session.touch(),
                    RevocationOutcome::Revoked(result) => {
                        tracing::info!(lock_failed = result.metadata_lock_failed, "authorities revoked");
                        *slot = None;
                    }
                    RevocationOutcome::Failed(failure) => {
                        tracing::warn!(step = %failure.step, "revocation failed");
                        *slot = None;
                    }
                }
                sink.send(reply::revocation(&outcome)).await;
            }
        }
    }

    async fn command<S: ReplySink>(
        &self,
        id: ConversationId,
        command: Command,
        slot: &mut Option<Session>,
        sink: &S,
    ) {
        tracing::debug!(?command, "command");
        let reply = match command {
            Command::Start | Command::Help => reply::help(),
            Command::Idea => reply::idea(&self.ideas.generate().await),
            Command::Create => {
                let (session, reply) = self.machine.start_creation(id);
                tracing::info!("creation session started");
                *slot = Some(session);
                reply
            }
            Command::Revoke(mint) => match self.machine.start_revocation(id, mint.as_deref()) {
                Ok((session, reply)) => {
                    tracing::info!(state = %session.state, "revocation session started");
                    *slot = Some(session);
                    reply
                }
                Err(reply) => reply,
            },
            Command::RevokeYes => self.revoke_choice(slot, true),
            Command::RevokeNo => self.revoke_choice(slot, false),
            Command::Cancel => {
                if slot.take().is_some() {
                    tracing::info!("session cancelled");
                }
                reply::cancelled()
            }
            Command::Unknown(word) => reply::unknown_command(&word),
        };
        sink.send(reply).await;
    }

    fn revoke_choice(&self, slot: &mut Option<Session>, revoke: bool) -> reply::Reply {
        match slot.as_mut() {
            Some(session) => self.machine.set_revoke_choice(session, revoke),
            None => reply::revoke_choice_without_session(),
        }
    }
}

impl<P, L, T, E, S> InputHandler<S> for ConversationService<P, L, T, E>
where
    P: MetadataPublisher + 'static,
    L: LedgerClient + 'static,
    T: TrendSource + 'static,
    E: IdeaEnhancer + 'static,
    S: ReplySink + 'static,
{
    async fn handle_input(&self, id: ConversationId, input: Input, sink: &S) {
        self.handle(id, input, sink).await
    }
}

#[cfg(test)]
mod tests {
    use mintbot_types::session::SessionState;
    use mintbot_types::token::ImageReference;

    use super::*;
    use crate::idea::tests::{CannedEnhancer, FixedTrends};
    use crate::provision::tests::{MockLedger, MockPublisher};
    use crate::reply::ReplyBuffer;

    type TestService = ConversationService<MockPublisher, MockLedger, FixedTrends, CannedEnhancer>;

    const ID: ConversationId = ConversationId(7);
    const MINT: &str = "So11111111111111111111111111111111111111112";

    fn service_with(ledger: MockLedger) -> TestService {
        ConversationService::new(
            SessionStore::new(),
            Provisioner::new(MockPublisher::default(), ledger, "mainnet"),
            IdeaGenerator::new(FixedTrends(Ok(vec!["WIF".to_string()])), None),
        )
    }

    fn service() -> TestService {
        service_with(MockLedger::default())
    }

    async fn say(service: &TestService, text: &str) -> Vec<String> {
        let sink = ReplyBuffer::new();
        service.handle(ID, Input::Text(text.to_string()), &sink).await;
        sink.drain().into_iter().map(|r| r.text).collect()
    }

    async fn upload(service: &TestService) -> Vec<String> {
        let sink = ReplyBuffer::new();
        let image = ImageReference::new("https://files.example/photo.jpg");
        service.handle(ID, Input::Image(image), &sink).await;
        sink.drain().into_iter().map(|r| r.text).collect()
    }

    async fn state(service: &TestService) -> Option<SessionState> {
        service.store().get(ID).await.map(|s| s.state)
    }

    #[tokio::test]
    async fn test_end_to_end_create_with_revocation() {
        let service = service();

        say(&service, "/create").await;
        say(&service, "DogeBlast").await;
        say(&service, "dogeblast123456").await;
        say(&service, "x").await;
        say(&service, "1,000,000").await;
        upload(&service).await;
        for _ in 0..3 {
            say(&service, "skip").await;
        }
        let review = say(&service, "skip").await;
        assert!(review[0].contains("DOGEBLAST1"));
        assert!(review[0].contains("1,000,000"));
        assert!(review[0].contains("*Decimals:* 9"));

        let choice = say(&service, "/revoke_yes").await;
        assert!(choice[0].contains("Will revoke"));
        assert_eq!(state(&service).await, Some(SessionState::AwaitingSecret));

        let replies = say(&service, "owner-secret").await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].contains("Minting"));
        assert!(replies[1].contains("Token created"));
        assert!(replies[1].contains("Authorities revoked & metadata locked"));
        assert!(!replies[1].contains("could not be locked"));

        assert_eq!(
            service.provisioner.publisher().published.lock().unwrap()[0].symbol,
            "DOGEBLAST1"
        );
        assert_eq!(state(&service).await, None);
    }

    #[tokio::test]
    async fn test_cancel_from_any_state_clears_session() {
        let service = service();
        let inputs = ["/create", "DogeBlast", "DOGE", "x", "1000"];
        for depth in 0..inputs.len() {
            for input in &inputs[..=depth] {
                say(&service, input).await;
            }
            assert!(state(&service).await.is_some());
            let replies = say(&service, "/cancel").await;
            assert_eq!(replies, vec!["🧹 Session cleared."]);
            assert_eq!(state(&service).await, None);
        }

        say(&service, &format!("/revoke {MINT}")).await;
        say(&service, "/cancel").await;
        assert_eq!(state(&service).await, None);
    }

    #[tokio::test]
    async fn test_text_without_session_is_unhandled() {
        let service = service();
        let replies = say(&service, "hello").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("No active session"));
        assert!(upload(&service).await.is_empty());
    }

    #[tokio::test]
    async fn test_revoke_choice_without_session_creates_nothing() {
        let service = service();
        let replies = say(&service, "/revoke_yes").await;
        assert!(replies[0].contains("/create"));
        assert_eq!(state(&service).await, None);
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_consumed_as_input() {
        let service = service();
        say(&service, "/create").await;
        let replies = say(&service, "/launch").await;
        assert!(replies[0].contains("Unknown command"));
        assert_eq!(state(&service).await, Some(SessionState::CollectingName));
        assert!(service.store().get(ID).await.unwrap().fields.name.is_none());
    }

    #[tokio::test]
    async fn test_revocation_only_flow() {
        let service = service();
        // Leftover creation history must not matter.
        say(&service, "/create").await;
        say(&service, "Old").await;

        say(&service, &format!("/revoke {MINT}")).await;
        assert_eq!(state(&service).await, Some(SessionState::AwaitingRevokeSecret));

        let replies = say(&service, "owner-secret").await;
        assert!(replies[1].starts_with("✅ Revoked. Explorer: https://explorer.solana.com/address/"));

        let calls = service.provisioner_calls();
        let revokes = calls.iter().filter(|c| c.starts_with("revoke")).count();
        let locks = calls.iter().filter(|c| c.starts_with("lock")).count();
        assert_eq!((revokes, locks), (2, 1));
        assert_eq!(calls.len(), 3);
        assert_eq!(state(&service).await, None);
    }

    #[tokio::test]
    async fn test_rejected_secret_keeps_session() {
        let service = service();
        say(&service, &format!("/revoke {MINT}")).await;
        let replies = say(&service, "garbage").await;
        assert!(replies[1].contains("could not be read"));
        assert_eq!(state(&service).await, Some(SessionState::AwaitingRevokeSecret));
        assert!(service.provisioner_calls().is_empty());
    }

    #[tokio::test]
    async fn test_step_failure_clears_session() {
        let service = service_with(MockLedger::failing_on("create_metadata"));
        for input in ["/create", "DogeBlast", "DOGE", "x", "5"] {
            say(&service, input).await;
        }
        upload(&service).await;
        for _ in 0..4 {
            say(&service, "skip").await;
        }
        let replies = say(&service, "owner-secret").await;
        assert!(replies[1].contains("creating the on-chain metadata"));
        assert!(replies[1].contains("Mint: Mint111"));
        assert_eq!(state(&service).await, None);
        assert!(!service.provisioner_calls().iter().any(|c| c.starts_with("mint_to")));
    }

    #[tokio::test]
    async fn test_idea_command() {
        let service = service();
        let replies = say(&service, "/idea").await;
        assert!(replies[0].contains("WIFB"));
        assert!(replies[0].contains("/create"));
    }

    impl TestService {
        fn provisioner_calls(&self) -> Vec<String> {
            self.provisioner.ledger().calls()
        }
    }
}
