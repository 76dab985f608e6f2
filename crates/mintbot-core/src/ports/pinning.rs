//! Metadata pinning collaborator.

use std::future::Future;

use mintbot_types::error::PublishError;
use mintbot_types::token::{ImageReference, OffChainMetadata};

/// Content-addressed storage for the token image and JSON metadata.
pub trait MetadataPublisher: Send + Sync {
    /// Whether credentials are configured. Checked before the image step so
    /// the user is told up front instead of failing at mint time.
    fn is_configured(&self) -> bool;

    /// Download the image the user uploaded.
    fn fetch_image(
        &self,
        image: &ImageReference,
    ) -> impl Future<Output = Result<Vec<u8>, PublishError>> + Send;

    /// Pin the image, then a JSON document pointing at it. Returns the
    /// metadata URI.
    fn publish(
        &self,
        image: Vec<u8>,
        metadata: &OffChainMetadata,
    ) -> impl Future<Output = Result<String, PublishError>> + Send;
}
