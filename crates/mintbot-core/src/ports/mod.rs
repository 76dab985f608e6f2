//! Collaborator traits ("ports") implemented by `mintbot-infra`.
//!
//! All async methods use RPITIT, consistent with every async trait in this
//! workspace. The core never depends on a concrete adapter.

pub mod idea;
pub mod ledger;
pub mod pinning;
pub mod transport;

pub use idea::{IdeaEnhancer, IdeaPrompt, TrendSource};
pub use ledger::LedgerClient;
pub use pinning::MetadataPublisher;
pub use transport::ReplySink;
