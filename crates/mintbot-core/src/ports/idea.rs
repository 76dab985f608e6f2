//! Idea suggestion collaborators. Both are best-effort: errors are logged
//! and the idea generator falls back to its template.

use std::future::Future;

use mintbot_types::error::IdeaError;

/// Supplies currently trending token names or symbols.
pub trait TrendSource: Send + Sync {
    fn trend_seeds(&self) -> impl Future<Output = Result<Vec<String>, IdeaError>> + Send;
}

/// A system + user prompt pair for a text generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaPrompt {
    pub system: String,
    pub user: String,
}

/// Free-text generator used to improve on the template idea.
pub trait IdeaEnhancer: Send + Sync {
    /// Human-readable backend name (e.g. the model id).
    fn name(&self) -> &str;

    /// Raw completion text for `prompt`.
    fn complete(
        &self,
        prompt: &IdeaPrompt,
    ) -> impl Future<Output = Result<String, IdeaError>> + Send;
}
