//! Session state machine.
//!
//! `SessionMachine` maps (current session, input) to the next session and
//! either a reply or a terminal action. It is synchronous and never touches
//! the network; terminal actions are executed by the conversation service.
//! Slash commands never reach [`SessionMachine::step`].

use mintbot_types::provisioning::LedgerAddress;
use mintbot_types::secret::OwnerSecret;
use mintbot_types::session::{ConversationId, Session, SessionFields, SessionState};
use mintbot_types::token::{ImageReference, TokenLinks, TokenSpec};

use crate::reply::{self, Reply};
use crate::validate;

/// One inbound, non-command input.
#[derive(Debug, Clone)]
pub enum Input {
    Text(String),
    Image(ImageReference),
}

/// What the conversation service must do after a step.
#[derive(Debug)]
pub enum Transition {
    /// Send `Reply`; the session (possibly advanced) is kept.
    Reply(Reply),
    /// Input not applicable to the current state. Nothing is sent.
    Ignore,
    /// Terminal: run the create pipeline.
    Provision { spec: TokenSpec, secret: OwnerSecret },
    /// Terminal: run the revoke pipeline.
    Revoke {
        mint: LedgerAddress,
        secret: OwnerSecret,
    },
    /// The session is unusable and must be deleted; send `Reply`.
    Abandon(Reply),
}

/// Drives input collection for the creation and revocation flows.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    /// Whether image uploads can be accepted at all.
    pinning_configured: bool,
}

impl SessionMachine {
    pub fn new(pinning_configured: bool) -> Self {
        Self { pinning_configured }
    }

    /// Start the creation flow, replacing whatever session existed.
    pub fn start_creation(&self, id: ConversationId) -> (Session, Reply) {
        let state = SessionState::CollectingName;
        (Session::new(id, state), reply::prompt(state))
    }

    /// Start the revocation flow. With a mint address the flow goes straight
    /// to the secret prompt; without one it asks for the address first.
    pub fn start_revocation(
        &self,
        id: ConversationId,
        mint: Option<&str>,
    ) -> Result<(Session, Reply), Reply> {
        let Some(mint) = mint else {
            let session = Session::new(id, SessionState::AwaitingRevokeTarget);
            return Ok((session, reply::revoke_usage()));
        };

        let address = validate::parse_mint_address(mint)
            .map_err(|err| reply::invalid_input(&err, SessionState::AwaitingRevokeTarget))?;
        let mut session = Session::new(id, SessionState::AwaitingRevokeSecret);
        session.fields.mint_address = Some(LedgerAddress::new(address));
        Ok((session, reply::prompt(SessionState::AwaitingRevokeSecret)))
    }

    /// Record the authority choice. Allowed at any point of the creation
    /// flow before the secret is submitted.
    pub fn set_revoke_choice(&self, session: &mut Session, revoke: bool) -> Reply {
        if !session.state.is_creation() {
            return reply::revoke_choice_without_session();
        }
        session.fields.revoke_requested = revoke;
        session.touch();
        reply::revoke_choice(revoke)
    }

    /// Apply one input to `session`.
    pub fn step(&self, session: &mut Session, input: Input) -> Transition {
        let state = session.state;
        let text = match input {
            Input::Image(image) => return self.accept_image(session, image),
            Input::Text(text) => text,
        };

        let fields = &mut session.fields;
        let next = match state {
            SessionState::CollectingName => validate::normalize_name(&text).map(|name| {
                fields.name = Some(name);
                SessionState::CollectingSymbol
            }),
            SessionState::CollectingSymbol => validate::normalize_symbol(&text).map(|symbol| {
                fields.symbol = Some(symbol);
                SessionState::CollectingDescription
            }),
            SessionState::CollectingDescription => {
                validate::normalize_description(&text).map(|description| {
                    fields.description = Some(description);
                    SessionState::CollectingSupply
                })
            }
            SessionState::CollectingSupply => validate::parse_supply(&text).map(|supply| {
                fields.supply = Some(supply);
                SessionState::CollectingImage
            }),
            SessionState::CollectingImage => {
                session.touch();
                return Transition::Reply(reply::image_expected());
            }
            SessionState::CollectingWebsite => {
                fields.website = validate::parse_link(&text);
                Ok(SessionState::CollectingTwitter)
            }
            SessionState::CollectingTwitter => {
                fields.twitter = validate::parse_link(&text);
                Ok(SessionState::CollectingTelegram)
            }
            SessionState::CollectingTelegram => {
                fields.telegram = validate::parse_link(&text);
                Ok(SessionState::CollectingDiscord)
            }
            SessionState::CollectingDiscord => {
                fields.discord = validate::parse_link(&text);
                return self.enter_review(session);
            }
            SessionState::AwaitingSecret => {
                let Some(spec) = freeze(&session.fields) else {
                    return Transition::Abandon(reply::incomplete_session());
                };
                return Transition::Provision {
                    spec,
                    secret: OwnerSecret::new(text.trim()),
                };
            }
            SessionState::AwaitingRevokeTarget => {
                validate::parse_mint_address(&text).map(|mint| {
                    fields.mint_address = Some(LedgerAddress::new(mint));
                    SessionState::AwaitingRevokeSecret
                })
            }
            SessionState::AwaitingRevokeSecret => {
                let Some(mint) = session.fields.mint_address.clone() else {
                    return Transition::Abandon(reply::incomplete_session());
                };
                return Transition::Revoke {
                    mint,
                    secret: OwnerSecret::new(text.trim()),
                };
            }
        };

        match next {
            Ok(next) => {
                session.advance(next);
                Transition::Reply(reply::prompt(next))
            }
            Err(err) => {
                tracing::debug!(conversation = %session.id, state = %state, error = %err, "input rejected");
                session.touch();
                Transition::Reply(reply::invalid_input(&err, state))
            }
        }
    }

    fn accept_image(&self, session: &mut Session, image: ImageReference) -> Transition {
        if session.state != SessionState::CollectingImage {
            return Transition::Ignore;
        }
        if !self.pinning_configured {
            return Transition::Reply(reply::pinning_not_configured());
        }
        session.fields.image = Some(image);
        session.advance(SessionState::CollectingWebsite);
        Transition::Reply(reply::prompt(SessionState::CollectingWebsite))
    }

    /// Show the review summary and move straight on to the secret prompt.
    fn enter_review(&self, session: &mut Session) -> Transition {
        match freeze(&session.fields) {
            Some(spec) => {
                session.advance(SessionState::AwaitingSecret);
                Transition::Reply(reply::review(&spec))
            }
            None => Transition::Abandon(reply::incomplete_session()),
        }
    }
}

/// Build the immutable `TokenSpec` from collected fields. `None` if any
/// required field is missing.
pub fn freeze(fields: &SessionFields) -> Option<TokenSpec> {
    Some(TokenSpec {
        name: fields.name.clone()?,
        symbol: fields.symbol.clone()?,
        description: fields.description.clone()?,
        supply: fields.supply?,
        image: fields.image.clone()?,
        links: TokenLinks {
            website: fields.website.clone(),
            twitter: fields.twitter.clone(),
            telegram: fields.telegram.clone(),
            discord: fields.discord.clone(),
        },
        revoke_authorities: fields.revoke_requested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: ConversationId = ConversationId(42);

    fn machine() -> SessionMachine {
        SessionMachine::new(true)
    }

    fn text(value: &str) -> Input {
        Input::Text(value.to_string())
    }

    fn image() -> Input {
        Input::Image(ImageReference::new("https://files.example/photo.jpg"))
    }

    fn reply_text(transition: Transition) -> String {
        match transition {
            Transition::Reply(reply) => reply.text,
            other => panic!("expected reply, got {other:?}"),
        }
    }

    /// Drive a fresh session up to (but not including) the image upload.
    fn session_at_image(m: &SessionMachine) -> Session {
        let (mut session, _) = m.start_creation(ID);
        for input in ["DogeBlast", "dogeblast123456", "x", "1,000,000"] {
            m.step(&mut session, text(input));
        }
        assert_eq!(session.state, SessionState::CollectingImage);
        session
    }

    #[test]
    fn test_full_collection_reaches_secret_prompt() {
        let m = machine();
        let mut session = session_at_image(&m);
        m.step(&mut session, image());
        for link in ["https://doge.blast", "skip", "SKIP", "skip"] {
            m.step(&mut session, text(link));
        }

        assert_eq!(session.state, SessionState::AwaitingSecret);
        assert_eq!(session.fields.symbol.as_deref(), Some("DOGEBLAST1"));
        assert_eq!(session.fields.supply, Some(1_000_000));
        assert_eq!(session.fields.website.as_deref(), Some("https://doge.blast"));
        assert!(session.fields.twitter.is_none());
    }

    #[test]
    fn test_review_is_sent_on_last_link() {
        let m = machine();
        let mut session = session_at_image(&m);
        m.step(&mut session, image());
        for link in ["skip", "skip", "skip"] {
            m.step(&mut session, text(link));
        }
        let review = reply_text(m.step(&mut session, text("skip")));
        assert!(review.contains("*Supply:* 1,000,000"));
        assert!(review.contains("*Decimals:* 9"));
        assert!(review.contains("*Links:* none"));
    }

    #[test]
    fn test_invalid_supply_does_not_advance() {
        let m = machine();
        let (mut session, _) = m.start_creation(ID);
        for input in ["DogeBlast", "DOGE", "x"] {
            m.step(&mut session, text(input));
        }
        let reply = reply_text(m.step(&mut session, text("-5")));
        assert!(reply.contains("Invalid supply"));
        assert_eq!(session.state, SessionState::CollectingSupply);
        assert!(session.fields.supply.is_none());
    }

    #[test]
    fn test_blank_name_does_not_advance() {
        let m = machine();
        let (mut session, _) = m.start_creation(ID);
        m.step(&mut session, text("   "));
        assert_eq!(session.state, SessionState::CollectingName);
    }

    #[test]
    fn test_image_outside_image_step_is_ignored() {
        let m = machine();
        let (mut session, _) = m.start_creation(ID);
        assert!(matches!(m.step(&mut session, image()), Transition::Ignore));
        assert_eq!(session.state, SessionState::CollectingName);
        assert!(session.fields.image.is_none());
    }

    #[test]
    fn test_text_at_image_step_reprompts() {
        let m = machine();
        let mut session = session_at_image(&m);
        let reply = reply_text(m.step(&mut session, text("here it is")));
        assert!(reply.contains("photo"));
        assert_eq!(session.state, SessionState::CollectingImage);
    }

    #[test]
    fn test_image_without_pinning_credentials_does_not_advance() {
        let m = SessionMachine::new(false);
        let mut session = session_at_image(&m);
        let reply = reply_text(m.step(&mut session, image()));
        assert!(reply.contains("NFT"));
        assert_eq!(session.state, SessionState::CollectingImage);
    }

    #[test]
    fn test_secret_freezes_spec_with_current_revoke_choice() {
        let m = machine();
        let mut session = session_at_image(&m);
        m.step(&mut session, image());
        for link in ["skip", "skip", "skip", "skip"] {
            m.step(&mut session, text(link));
        }
        m.set_revoke_choice(&mut session, true);

        match m.step(&mut session, text("  owner-secret  ")) {
            Transition::Provision { spec, secret } => {
                assert!(spec.revoke_authorities);
                assert_eq!(spec.name, "DogeBlast");
                assert_eq!(secret.expose(), "owner-secret");
            }
            other => panic!("expected provision, got {other:?}"),
        }
        // Secret material is never written to the session.
        assert_eq!(session.state, SessionState::AwaitingSecret);
    }

    #[test]
    fn test_secret_state_with_missing_fields_is_abandoned() {
        let m = machine();
        let mut session = Session::new(ID, SessionState::AwaitingSecret);
        assert!(matches!(
            m.step(&mut session, text("owner-secret")),
            Transition::Abandon(_)
        ));
    }

    #[test]
    fn test_revoke_choice_only_applies_to_creation() {
        let m = machine();
        let (mut session, _) = m.start_creation(ID);
        m.set_revoke_choice(&mut session, true);
        assert!(session.fields.revoke_requested);
        m.set_revoke_choice(&mut session, false);
        assert!(!session.fields.revoke_requested);

        let (mut revoking, _) = m.start_revocation(ID, None).unwrap();
        let reply = m.set_revoke_choice(&mut revoking, true);
        assert!(reply.text.contains("/create"));
        assert!(!revoking.fields.revoke_requested);
    }

    #[test]
    fn test_revocation_with_target() {
        let m = machine();
        let mint = "So11111111111111111111111111111111111111112";
        let (mut session, _) = m.start_revocation(ID, Some(mint)).unwrap();
        assert_eq!(session.state, SessionState::AwaitingRevokeSecret);

        match m.step(&mut session, text("owner-secret")) {
            Transition::Revoke { mint: target, .. } => assert_eq!(target.as_str(), mint),
            other => panic!("expected revoke, got {other:?}"),
        }
    }

    #[test]
    fn test_revocation_asks_for_target() {
        let m = machine();
        let (mut session, reply) = m.start_revocation(ID, None).unwrap();
        assert!(reply.text.starts_with("Usage: /revoke <MINT_ADDRESS>"));
        assert_eq!(session.state, SessionState::AwaitingRevokeTarget);

        m.step(&mut session, text("not-a-mint"));
        assert_eq!(session.state, SessionState::AwaitingRevokeTarget);

        m.step(&mut session, text("So11111111111111111111111111111111111111112"));
        assert_eq!(session.state, SessionState::AwaitingRevokeSecret);
    }

    #[test]
    fn test_revocation_rejects_malformed_target() {
        let m = machine();
        assert!(m.start_revocation(ID, Some("mintX")).is_err());
    }

    #[test]
    fn test_freeze_requires_every_field() {
        let mut fields = SessionFields {
            name: Some("A".to_string()),
            symbol: Some("A".to_string()),
            description: Some("A".to_string()),
            supply: Some(1),
            ..Default::default()
        };
        assert!(freeze(&fields).is_none());
        fields.image = Some(ImageReference::new("https://files.example/a.png"));
        assert!(freeze(&fields).is_some());
    }
}
