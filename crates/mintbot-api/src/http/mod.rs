//! HTTP transport for mintbot.
//!
//! Axum-based API at `/api/v1/` with envelope responses and optional bearer
//! authentication. Conversations are driven by posting messages; replies
//! come back in the response.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
