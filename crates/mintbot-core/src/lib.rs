//! Conversation logic for mintbot.
//!
//! This crate holds the input validator, the session store and state
//! machine, the provisioning orchestrator and the collaborator traits
//! ("ports") that `mintbot-infra` implements. It depends only on
//! `mintbot-types`, never on `mintbot-infra` or any HTTP client.

pub mod command;
pub mod conversation;
pub mod dispatch;
pub mod idea;
pub mod ports;
pub mod provision;
pub mod reply;
pub mod session;
pub mod validate;
