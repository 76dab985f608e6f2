//! Provisioning orchestrator.
//!
//! `Provisioner` runs the ordered create and revoke pipelines against the
//! pinning and ledger collaborators. Each step is attempted at most once and
//! the first failure stops the pipeline; nothing is retried or rolled back.
//! The outcome records exactly which steps committed.

use std::future::Future;

use mintbot_types::error::LedgerError;
use mintbot_types::provisioning::{
    explorer_address_url, AuthorityKind, CollaboratorError, LedgerAddress, ProvisionedToken,
    ProvisioningOutcome, ProvisioningStep, RevocationOutcome, RevocationResult, StepFailure,
};
use mintbot_types::secret::OwnerSecret;
use mintbot_types::token::{OnChainMetadata, TokenSpec, DECIMALS};

use crate::ports::{LedgerClient, MetadataPublisher};

/// Scale a whole-token supply to base units.
pub fn to_base_units(supply: u64, decimals: u8) -> Result<u64, LedgerError> {
    10u64
        .checked_pow(u32::from(decimals))
        .and_then(|scale| supply.checked_mul(scale))
        .ok_or(LedgerError::AmountOverflow)
}

// ---------------------------------------------------------------------------
// Step bookkeeping
// ---------------------------------------------------------------------------

/// Tracks committed steps for one pipeline run.
#[derive(Debug, Default)]
struct StepLog {
    completed: Vec<ProvisioningStep>,
    mint: Option<LedgerAddress>,
}

impl StepLog {
    /// Await one step. On success the step is recorded as committed; on
    /// failure the pipeline's `StepFailure` is built from what committed so far.
    async fn run<T, E, F>(&mut self, step: ProvisioningStep, operation: F) -> Result<T, StepFailure>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<CollaboratorError>,
    {
        tracing::debug!(%step, "provisioning step started");
        match operation.await {
            Ok(value) => {
                tracing::info!(%step, "provisioning step committed");
                self.completed.push(step);
                Ok(value)
            }
            Err(err) => Err(self.fail(step, err.into())),
        }
    }

    fn fail(&self, step: ProvisioningStep, error: CollaboratorError) -> StepFailure {
        tracing::warn!(%step, error = %error, completed = self.completed.len(), "provisioning step failed");
        StepFailure {
            step,
            error,
            completed: self.completed.clone(),
            mint: self.mint.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

/// Sequences the create and revoke pipelines.
pub struct Provisioner<P, L> {
    publisher: P,
    ledger: L,
    /// Cluster name used in explorer links.
    cluster: String,
}

impl<P, L> Provisioner<P, L>
where
    P: MetadataPublisher,
    L: LedgerClient,
{
    pub fn new(publisher: P, ledger: L, cluster: impl Into<String>) -> Self {
        Self {
            publisher,
            ledger,
            cluster: cluster.into(),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    #[cfg(test)]
    pub(crate) fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Create a token: publish metadata, create the mint and its metadata
    /// record, mint the supply, and optionally revoke both authorities.
    pub async fn create_token(&self, spec: &TokenSpec, secret: &OwnerSecret) -> ProvisioningOutcome {
        let owner = match self.ledger.signer_from_secret(secret) {
            Ok(owner) => owner,
            Err(err) => {
                tracing::info!(error = %err, "owner secret rejected before provisioning");
                return ProvisioningOutcome::SecretRejected(err);
            }
        };

        match self.run_create(spec, &owner).await {
            Ok(token) => ProvisioningOutcome::Created(token),
            Err(failure) => ProvisioningOutcome::Failed(failure),
        }
    }

    async fn run_create(&self, spec: &TokenSpec, owner: &L::Signer) -> Result<ProvisionedToken, StepFailure> {
        let mut log = StepLog::default();
        let owner_address = self.ledger.signer_address(owner);

        let amount = to_base_units(spec.supply, DECIMALS)
            .map_err(|err| log.fail(ProvisioningStep::MintSupply, err.into()))?;

        let metadata_uri = log
            .run(ProvisioningStep::PublishMetadata, async {
                let image = self.publisher.fetch_image(&spec.image).await?;
                self.publisher.publish(image, &spec.off_chain_metadata()).await
            })
            .await?;

        let mint = log
            .run(
                ProvisioningStep::CreateMint,
                self.ledger.create_mint(owner, DECIMALS),
            )
            .await?;
        log.mint = Some(mint.clone());
        tracing::info!(mint = %mint, "mint created");

        // Revoking right away means the record is created locked.
        let mutable = !spec.revoke_authorities;
        let on_chain = OnChainMetadata {
            name: spec.name.clone(),
            symbol: spec.symbol.clone(),
            uri: metadata_uri.clone(),
        };
        let metadata_account = log
            .run(
                ProvisioningStep::CreateMetadataAccount,
                self.ledger
                    .create_metadata_account(&mint, owner, &on_chain, mutable),
            )
            .await?;

        let token_account = log
            .run(ProvisioningStep::MintSupply, async {
                let account = self.ledger.get_or_create_token_account(owner, &mint).await?;
                self.ledger.mint_to(owner, &mint, &account, amount).await?;
                Ok::<_, LedgerError>(account)
            })
            .await?;

        let mut metadata_lock_failed = false;
        if spec.revoke_authorities {
            self.revoke_both(&mut log, owner, &mint).await?;
            if mutable {
                metadata_lock_failed = !self.try_lock(owner, &metadata_account).await;
            }
        }

        Ok(ProvisionedToken {
            explorer_mint: explorer_address_url(&self.cluster, &mint),
            explorer_owner: explorer_address_url(&self.cluster, &owner_address),
            mint,
            owner: owner_address,
            token_account,
            metadata_account,
            metadata_uri,
            minted_base_units: amount,
            authorities_revoked: spec.revoke_authorities,
            metadata_lock_failed,
        })
    }

    /// Revoke both authorities of an existing mint, then attempt to lock its
    /// metadata. Always issues exactly two revokes and one lock attempt
    /// unless a revoke fails.
    pub async fn revoke_all(&self, mint: &LedgerAddress, secret: &OwnerSecret) -> RevocationOutcome {
        let owner = match self.ledger.signer_from_secret(secret) {
            Ok(owner) => owner,
            Err(err) => {
                tracing::info!(error = %err, "owner secret rejected before revocation");
                return RevocationOutcome::SecretRejected(err);
            }
        };

        let mut log = StepLog {
            mint: Some(mint.clone()),
            ..Default::default()
        };
        if let Err(failure) = self.revoke_both(&mut log, &owner, mint).await {
            return RevocationOutcome::Failed(failure);
        }

        let locked = match self.ledger.metadata_account_for(mint) {
            Ok(metadata_account) => self.try_lock(&owner, &metadata_account).await,
            Err(err) => {
                tracing::warn!(mint = %mint, error = %err, "could not derive metadata account");
                false
            }
        };

        RevocationOutcome::Revoked(RevocationResult {
            mint: mint.clone(),
            revoked: true,
            metadata_lock_failed: !locked,
            explorer_mint: explorer_address_url(&self.cluster, mint),
        })
    }

    async fn revoke_both(
        &self,
        log: &mut StepLog,
        owner: &L::Signer,
        mint: &LedgerAddress,
    ) -> Result<(), StepFailure> {
        log.run(
            ProvisioningStep::RevokeMintAuthority,
            self.ledger
                .revoke_authority(owner, mint, AuthorityKind::MintTokens),
        )
        .await?;
        log.run(
            ProvisioningStep::RevokeFreezeAuthority,
            self.ledger
                .revoke_authority(owner, mint, AuthorityKind::FreezeAccount),
        )
        .await
    }

    /// Soft step: a failure is reported as a caveat, never as a pipeline failure.
    async fn try_lock(&self, owner: &L::Signer, metadata_account: &LedgerAddress) -> bool {
        match self.ledger.lock_metadata(owner, metadata_account).await {
            Ok(()) => {
                tracing::info!(metadata = %metadata_account, "metadata locked");
                true
            }
            Err(err) => {
                tracing::warn!(metadata = %metadata_account, error = %err, "metadata lock failed");
                false
            }
        }
    }
}
