use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// An owner's secret key exactly as pasted into the conversation.
///
/// Lives only on the orchestrator call stack: it is never stored in a
/// session, never logged, and zeroized when dropped.
pub struct OwnerSecret(SecretString);

impl OwnerSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Access the underlying secret value.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for OwnerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerSecret(\"***\")")
    }
}

/// Show masked representation: last 4 chars visible.
///
/// - "sk-abcdefghijklmnop" -> "****mnop"
/// - "abc" -> "****"
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_secret_debug_hides_value() {
        let secret = OwnerSecret::new("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP7");
        let debug = format!("{secret:?}");
        assert!(!debug.contains("5KQwr"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_owner_secret_expose() {
        let secret = OwnerSecret::new("abc123");
        assert_eq!(secret.expose(), "abc123");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-abc123xyz"), "****3xyz");
        assert_eq!(mask_secret("ab"), "****");
    }
}
