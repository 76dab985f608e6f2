//! Token parameter types.
//!
//! `TokenSpec` is the immutable value frozen from a completed creation
//! session. The supply it carries is a whole-token count; scaling to base
//! units happens exactly once, inside the provisioning orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed number of decimal places for every token this system issues.
pub const DECIMALS: u8 = 9;

/// Maximum token name length, in UTF-8 bytes. The on-chain metadata
/// program rejects longer names.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum token symbol length, in UTF-8 bytes.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Where the token image can be fetched from (usually a transport file URL).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference(pub String);

impl ImageReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Telegram file URLs embed the bot token, so the reference is never printed.
impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageReference(..)")
    }
}

/// Optional social links attached to the token metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLinks {
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
}

impl TokenLinks {
    /// Metadata `extensions` map. Every key is present; skipped links are
    /// published as empty strings.
    pub fn extensions(&self) -> BTreeMap<String, String> {
        self.entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.unwrap_or_default().to_string()))
            .collect()
    }

    /// One-line summary for the review message, e.g.
    /// `website: https://x.io | discord: https://discord.gg/x`, or `none`.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .entries()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| format!("{key}: {v}")))
            .collect();

        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" | ")
        }
    }

    fn entries(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("website", self.website.as_deref()),
            ("twitter", self.twitter.as_deref()),
            ("telegram", self.telegram.as_deref()),
            ("discord", self.discord.as_deref()),
        ]
    }
}

/// Immutable creation parameters assembled from a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    /// Normalized name (at most 32 characters).
    pub name: String,
    /// Normalized symbol (at most 10 characters, uppercase).
    pub symbol: String,
    pub description: String,
    /// Whole tokens, as entered by the user.
    pub supply: u64,
    pub image: ImageReference,
    pub links: TokenLinks,
    /// Revoke mint/freeze authorities and lock metadata right after minting.
    pub revoke_authorities: bool,
}

impl TokenSpec {
    pub fn decimals(&self) -> u8 {
        DECIMALS
    }

    /// The off-chain JSON document body (without the image, which the
    /// pinning collaborator fills in after uploading it).
    pub fn off_chain_metadata(&self) -> OffChainMetadata {
        OffChainMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            description: self.description.clone(),
            extensions: self.links.extensions(),
        }
    }
}

/// Off-chain metadata fields handed to the pinning collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffChainMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub extensions: BTreeMap<String, String>,
}

/// On-chain metadata record contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// A suggested token idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub name: String,
    pub symbol: String,
    pub description: String,
}

/// Format a whole number with `,` thousands separators (`1000000` -> `1,000,000`).
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TokenSpec {
        TokenSpec {
            name: "DogeBlast".to_string(),
            symbol: "DOGEBLAST1".to_string(),
            description: "x".to_string(),
            supply: 1_000_000,
            image: ImageReference::new("https://files.example/photo.jpg"),
            links: TokenLinks {
                website: Some("https://doge.blast".to_string()),
                ..Default::default()
            },
            revoke_authorities: true,
        }
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(0), "0");
        assert_eq!(format_grouped(999), "999");
        assert_eq!(format_grouped(1_000), "1,000");
        assert_eq!(format_grouped(1_000_000), "1,000,000");
        assert_eq!(format_grouped(12_345_678), "12,345,678");
    }

    #[test]
    fn test_extensions_always_has_all_keys() {
        let ext = spec().links.extensions();
        assert_eq!(ext.len(), 4);
        assert_eq!(ext["website"], "https://doge.blast");
        assert_eq!(ext["twitter"], "");
        assert_eq!(ext["discord"], "");
    }

    #[test]
    fn test_links_summary() {
        assert_eq!(TokenLinks::default().summary(), "none");
        let links = TokenLinks {
            website: Some("https://a.io".to_string()),
            discord: Some("https://discord.gg/a".to_string()),
            ..Default::default()
        };
        assert_eq!(
            links.summary(),
            "website: https://a.io | discord: https://discord.gg/a"
        );
    }

    #[test]
    fn test_image_reference_debug_hides_url() {
        let image = ImageReference::new("https://api.telegram.org/file/bot123:SECRET/photo.jpg");
        assert!(!format!("{image:?}").contains("SECRET"));
    }

    #[test]
    fn test_off_chain_metadata_copies_fields() {
        let meta = spec().off_chain_metadata();
        assert_eq!(meta.name, "DogeBlast");
        assert_eq!(meta.symbol, "DOGEBLAST1");
        assert_eq!(meta.extensions.len(), 4);
    }
}
