//! Outbound transport collaborator.

use std::future::Future;

use crate::reply::Reply;

/// Where replies for one conversation are delivered.
///
/// Sending is fire-and-forget from the core's point of view: delivery
/// errors are the transport's to log.
pub trait ReplySink: Send + Sync {
    fn send(&self, reply: Reply) -> impl Future<Output = ()> + Send;
}
