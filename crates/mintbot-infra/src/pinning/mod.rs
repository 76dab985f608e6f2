//! nft.storage-compatible metadata pinning.

pub mod client;
pub mod types;

pub use client::NftStoragePublisher;
