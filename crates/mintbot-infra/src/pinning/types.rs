//! Wire types for the pinning service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mintbot_types::token::OffChainMetadata;

/// Response body of `POST /upload`.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub ok: bool,
    pub value: Option<UploadValue>,
    pub error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct UploadValue {
    pub cid: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadErrorBody {
    #[serde(default)]
    pub message: String,
}

/// The JSON document wallets and explorers read through the metadata URI.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MetadataDocument {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub extensions: BTreeMap<String, String>,
}

impl MetadataDocument {
    pub fn new(metadata: &OffChainMetadata, image_uri: String) -> Self {
        Self {
            name: metadata.name.clone(),
            symbol: metadata.symbol.clone(),
            description: metadata.description.clone(),
            image: image_uri,
            extensions: metadata.extensions.clone(),
        }
    }
}
