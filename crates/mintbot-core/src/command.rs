//! Slash-command parsing.
//!
//! Any input starting with `/` is a command and never reaches the session
//! state machine, even when the command is unknown.

/// Recognized bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Idea,
    Create,
    /// `/revoke [MINT]`
    Revoke(Option<String>),
    RevokeYes,
    RevokeNo,
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse `text` as a command. Returns `None` when it is not one.
    ///
    /// A `@botname` suffix on the command word is ignored, as Telegram group
    /// chats append it.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let mut parts = rest.split_whitespace();
        let word = parts.next().unwrap_or_default();
        let word = word.split('@').next().unwrap_or_default().to_lowercase();
        let argument = parts.next().map(str::to_string);

        let command = match word.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "idea" => Command::Idea,
            "create" => Command::Create,
            "revoke" => Command::Revoke(argument),
            "revoke_yes" => Command::RevokeYes,
            "revoke_no" => Command::RevokeNo,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(word),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(Command::parse("DogeBlast"), None);
        assert_eq!(Command::parse("https://x.io/a"), None);
    }

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/create"), Some(Command::Create));
        assert_eq!(Command::parse("/CANCEL"), Some(Command::Cancel));
        assert_eq!(Command::parse(" /revoke_yes "), Some(Command::RevokeYes));
        assert_eq!(Command::parse("/idea@mintbot"), Some(Command::Idea));
    }

    #[test]
    fn test_parse_revoke_argument() {
        assert_eq!(Command::parse("/revoke"), Some(Command::Revoke(None)));
        assert_eq!(
            Command::parse("/revoke   MintAddr111  extra"),
            Some(Command::Revoke(Some("MintAddr111".to_string())))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("/launch"),
            Some(Command::Unknown("launch".to_string()))
        );
        assert_eq!(Command::parse("/"), Some(Command::Unknown(String::new())));
    }
}
