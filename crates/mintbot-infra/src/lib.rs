//! Infrastructure layer for mintbot.
//!
//! Concrete implementations of the collaborator traits defined in
//! `mintbot-core`: Telegram Bot API transport, nft.storage-style pinning,
//! the Solana JSON-RPC ledger, and idea sources. Also loads configuration.

pub mod config;
pub mod idea;
pub mod pinning;
pub mod solana;
pub mod telegram;
