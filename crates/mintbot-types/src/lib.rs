//! Shared domain types for mintbot.
//!
//! This crate contains the domain types used across the workspace:
//! conversation sessions, token specifications, provisioning outcomes,
//! owner secrets, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, secrecy.

pub mod config;
pub mod error;
pub mod provisioning;
pub mod secret;
pub mod session;
pub mod token;
