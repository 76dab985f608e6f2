//! Token idea generation.
//!
//! The strategy is picked by configuration: with no enhancer configured the
//! deterministic template is used; with one, the template is still built
//! first and the enhancer's answer overrides whichever fields it supplies.
//! Neither trend lookup nor enhancement can make `generate` fail.

use serde::Deserialize;

use mintbot_types::token::Idea;

use crate::ports::{IdeaEnhancer, IdeaPrompt, TrendSource};

/// Maximum number of trend seeds considered.
pub const MAX_SEEDS: usize = 8;

const FALLBACK_BASE: &str = "SOL";

/// Which generation path is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaStrategy {
    Template,
    Enhanced,
}

/// Deterministic idea built from trend seeds.
pub fn template_idea(seeds: &[String]) -> Idea {
    let base: String = seeds
        .first()
        .map(|seed| seed.chars().filter(char::is_ascii_alphanumeric).collect())
        .unwrap_or_else(|| FALLBACK_BASE.to_string());

    let name_stem: String = base.chars().take(8).collect();
    let symbol_stem: String = base.chars().take(4).collect();

    let description = if seeds.is_empty() {
        "Auto-generated Solana meme token idea.".to_string()
    } else {
        let shown: Vec<&str> = seeds.iter().take(3).map(String::as_str).collect();
        format!(
            "Meme token infused with trends from {} on Solana.",
            shown.join(", ")
        )
    };

    Idea {
        name: format!("{name_stem} Blast"),
        symbol: format!("{symbol_stem}B").to_uppercase(),
        description,
    }
}

/// Prompt asking the enhancer for a compact JSON idea.
pub fn enhancement_prompt(seeds: &[String]) -> IdeaPrompt {
    IdeaPrompt {
        system: "You produce safe, short JSON only.".to_string(),
        user: format!(
            "You are naming a new Solana meme token. Based on trending seeds: {}.\n\
             Return a compact JSON with keys: name (<= 24 chars), symbol (<= 8 uppercase letters), \
             description (<= 160 chars).",
            seeds.join(", ")
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdeaFields {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Merge an enhancer answer into `template`.
///
/// The JSON object is taken from the first `{` to the last `}` in `raw`.
/// Missing or empty fields keep the template value. Returns `None` when no
/// object can be parsed.
pub fn merge_enhanced(raw: &str, template: &Idea) -> Option<Idea> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let fields: IdeaFields = serde_json::from_str(&raw[start..=end]).ok()?;

    let pick = |value: Option<String>, fallback: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    Some(Idea {
        name: pick(fields.name, &template.name),
        symbol: pick(fields.symbol, &template.symbol),
        description: pick(fields.description, &template.description),
    })
}

/// Idea generator over a trend source and an optional enhancer.
pub struct IdeaGenerator<T, E> {
    trends: T,
    enhancer: Option<E>,
}

impl<T, E> IdeaGenerator<T, E>
where
    T: TrendSource,
    E: IdeaEnhancer,
{
    pub fn new(trends: T, enhancer: Option<E>) -> Self {
        Self { trends, enhancer }
    }

    pub fn strategy(&self) -> IdeaStrategy {
        if self.enhancer.is_some() {
            IdeaStrategy::Enhanced
        } else {
            IdeaStrategy::Template
        }
    }

    /// Produce one idea. Always succeeds.
    pub async fn generate(&self) -> Idea {
        let seeds = match self.trends.trend_seeds().await {
            Ok(mut seeds) => {
                seeds.retain(|s| !s.trim().is_empty());
                seeds.truncate(MAX_SEEDS);
                seeds
            }
            Err(err) => {
                tracing::warn!(error = %err, "trend lookup failed, using fallback seed");
                Vec::new()
            }
        };

        let template = template_idea(&seeds);
        let Some(enhancer) = &self.enhancer else {
            return template;
        };

        match enhancer.complete(&enhancement_prompt(&seeds)).await {
            Ok(raw) => merge_enhanced(&raw, &template).unwrap_or_else(|| {
                tracing::warn!(enhancer = enhancer.name(), "enhancer answer had no JSON idea");
                template
            }),
            Err(err) => {
                tracing::warn!(enhancer = enhancer.name(), error = %err, "idea enhancement failed");
                template
            }
        }
    }
}
