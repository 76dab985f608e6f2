//! Provisioning pipeline steps and outcomes.
//!
//! Every outcome records exactly which steps committed. A failed outcome
//! names the step that failed; steps after it were never attempted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, PublishError};

/// A base58 ledger account address (mint, owner, token account, metadata).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerAddress(pub String);

impl LedgerAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the explorer URL for an address. Pure string formatting, no
/// network access.
pub fn explorer_address_url(cluster: &str, address: &LedgerAddress) -> String {
    format!("https://explorer.solana.com/address/{address}?cluster={cluster}")
}

/// Authority kinds that can be revoked on a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityKind {
    MintTokens,
    FreezeAccount,
}

impl fmt::Display for AuthorityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityKind::MintTokens => write!(f, "mint"),
            AuthorityKind::FreezeAccount => write!(f, "freeze"),
        }
    }
}

/// One step of a provisioning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    PublishMetadata,
    CreateMint,
    CreateMetadataAccount,
    MintSupply,
    RevokeMintAuthority,
    RevokeFreezeAuthority,
    LockMetadata,
}

impl ProvisioningStep {
    /// Plain-language description for user-facing messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ProvisioningStep::PublishMetadata => "uploading the image and metadata",
            ProvisioningStep::CreateMint => "creating the token mint",
            ProvisioningStep::CreateMetadataAccount => "creating the on-chain metadata",
            ProvisioningStep::MintSupply => "minting the supply",
            ProvisioningStep::RevokeMintAuthority => "revoking the mint authority",
            ProvisioningStep::RevokeFreezeAuthority => "revoking the freeze authority",
            ProvisioningStep::LockMetadata => "locking the metadata",
        }
    }

    /// Stable failure code (`MetadataPublishFailed`, `MintCreationFailed`, ...).
    pub fn failure_code(&self) -> &'static str {
        match self {
            ProvisioningStep::PublishMetadata => "MetadataPublishFailed",
            ProvisioningStep::CreateMint => "MintCreationFailed",
            ProvisioningStep::CreateMetadataAccount => "MetadataAccountFailed",
            ProvisioningStep::MintSupply => "SupplyMintFailed",
            ProvisioningStep::RevokeMintAuthority => "MintAuthorityRevokeFailed",
            ProvisioningStep::RevokeFreezeAuthority => "FreezeAuthorityRevokeFailed",
            ProvisioningStep::LockMetadata => "MetadataLockFailed",
        }
    }

    /// Whether the step writes to the ledger (as opposed to the pinning service).
    pub fn is_on_chain(&self) -> bool {
        !matches!(self, ProvisioningStep::PublishMetadata)
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_code().trim_end_matches("Failed"))
    }
}

/// The collaborator error behind a failed step.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("pinning service: {0}")]
    Publish(#[from] PublishError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}

/// A pipeline that stopped at `step`.
#[derive(Debug)]
pub struct StepFailure {
    pub step: ProvisioningStep,
    pub error: CollaboratorError,
    /// Steps that committed before the failure, in order.
    pub completed: Vec<ProvisioningStep>,
    /// Mint created before the failure, if any. Surfaced so the user can
    /// find (and later revoke) a partially provisioned token.
    pub mint: Option<LedgerAddress>,
}

impl StepFailure {
    /// Whether anything was written to the ledger before the failure.
    pub fn left_partial_state(&self) -> bool {
        self.completed.iter().any(ProvisioningStep::is_on_chain)
    }
}

/// A fully provisioned token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedToken {
    pub mint: LedgerAddress,
    pub owner: LedgerAddress,
    pub token_account: LedgerAddress,
    pub metadata_account: LedgerAddress,
    pub metadata_uri: String,
    /// Supply minted, in base units.
    pub minted_base_units: u64,
    pub authorities_revoked: bool,
    /// Soft warning: authorities were revoked but the metadata lock failed.
    pub metadata_lock_failed: bool,
    pub explorer_mint: String,
    pub explorer_owner: String,
}

impl ProvisionedToken {
    /// Succeeded, but with a caveat the user should see.
    pub fn has_caveats(&self) -> bool {
        self.metadata_lock_failed
    }
}

/// Result of `CreateToken`.
#[derive(Debug)]
pub enum ProvisioningOutcome {
    Created(ProvisionedToken),
    /// The owner secret could not be parsed. No step was attempted.
    SecretRejected(LedgerError),
    Failed(StepFailure),
}

impl ProvisioningOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProvisioningOutcome::Created(_))
    }

    pub fn failed_step(&self) -> Option<ProvisioningStep> {
        match self {
            ProvisioningOutcome::Failed(failure) => Some(failure.step),
            _ => None,
        }
    }
}

/// Result of a successful `RevokeAll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationResult {
    pub mint: LedgerAddress,
    pub revoked: bool,
    pub metadata_lock_failed: bool,
    pub explorer_mint: String,
}

/// Result of `RevokeAll`.
#[derive(Debug)]
pub enum RevocationOutcome {
    Revoked(RevocationResult),
    SecretRejected(LedgerError),
    Failed(StepFailure),
}

impl RevocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RevocationOutcome::Revoked(_))
    }
}
