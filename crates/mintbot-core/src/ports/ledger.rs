//! Ledger client collaborator.
//!
//! Each write method submits one transaction and resolves once it is
//! confirmed. None of them retry; the orchestrator decides what happens
//! after a failure.

use std::future::Future;

use mintbot_types::error::LedgerError;
use mintbot_types::provisioning::{AuthorityKind, LedgerAddress};
use mintbot_types::secret::OwnerSecret;
use mintbot_types::token::OnChainMetadata;

pub trait LedgerClient: Send + Sync {
    /// Key material able to sign transactions. Never stored in a session.
    type Signer: Send + Sync;

    /// Parse the owner's secret. Fails with `LedgerError::InvalidSecretKey`.
    fn signer_from_secret(&self, secret: &OwnerSecret) -> Result<Self::Signer, LedgerError>;

    fn signer_address(&self, signer: &Self::Signer) -> LedgerAddress;

    /// Create a mint with `authority` as both mint and freeze authority.
    fn create_mint(
        &self,
        authority: &Self::Signer,
        decimals: u8,
    ) -> impl Future<Output = Result<LedgerAddress, LedgerError>> + Send;

    /// Create the metadata record for `mint`. Returns its address.
    fn create_metadata_account(
        &self,
        mint: &LedgerAddress,
        authority: &Self::Signer,
        data: &OnChainMetadata,
        mutable: bool,
    ) -> impl Future<Output = Result<LedgerAddress, LedgerError>> + Send;

    /// The owner's token account for `mint`, created if missing.
    fn get_or_create_token_account(
        &self,
        owner: &Self::Signer,
        mint: &LedgerAddress,
    ) -> impl Future<Output = Result<LedgerAddress, LedgerError>> + Send;

    /// Mint `amount` base units of `mint` into `account`.
    fn mint_to(
        &self,
        authority: &Self::Signer,
        mint: &LedgerAddress,
        account: &LedgerAddress,
        amount: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Set the `kind` authority of `mint` to none. Irreversible.
    fn revoke_authority(
        &self,
        authority: &Self::Signer,
        mint: &LedgerAddress,
        kind: AuthorityKind,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Derive the metadata record address for `mint`. No network access.
    fn metadata_account_for(&self, mint: &LedgerAddress) -> Result<LedgerAddress, LedgerError>;

    /// Mark the metadata record immutable.
    fn lock_metadata(
        &self,
        authority: &Self::Signer,
        metadata_account: &LedgerAddress,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}
