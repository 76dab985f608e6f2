//! SolanaLedger -- concrete [`LedgerClient`] over JSON-RPC.
//!
//! Transactions are built and signed locally; the RPC node only sees the
//! signed wire bytes. Each trait method is exactly one transaction.

use std::time::Duration;

use mintbot_core::ports::LedgerClient;
use mintbot_types::config::LedgerSection;
use mintbot_types::error::LedgerError;
use mintbot_types::provisioning::{AuthorityKind, LedgerAddress};
use mintbot_types::secret::OwnerSecret;
use mintbot_types::token::OnChainMetadata;

use super::instruction::{
    self, Instruction, MINT_ACCOUNT_SIZE, MetadataArgs, TokenAuthority,
};
use super::keypair::Keypair;
use super::pubkey::{Pubkey, TOKEN_PROGRAM_ID, associated_token_address, metadata_address};
use super::rpc::RpcClient;
use super::transaction::{Message, Transaction};

pub struct SolanaLedger {
    rpc: RpcClient,
}

impl SolanaLedger {
    pub fn new(config: &LedgerSection) -> Self {
        Self {
            rpc: RpcClient::new(
                config.rpc_url.clone(),
                Duration::from_secs(config.confirm_timeout_secs),
            ),
        }
    }

    async fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> Result<String, LedgerError> {
        let blockhash = self.rpc.latest_blockhash().await?;
        let message = Message::compile(instructions, &payer.pubkey(), blockhash)?;

        let mut signers = vec![payer];
        signers.extend_from_slice(extra_signers);
        let tx = Transaction::sign(message, &signers)?;

        self.rpc.send_and_confirm(&tx).await
    }
}

impl From<AuthorityKind> for TokenAuthority {
    fn from(kind: AuthorityKind) -> Self {
        match kind {
            AuthorityKind::MintTokens => TokenAuthority::MintTokens,
            AuthorityKind::FreezeAccount => TokenAuthority::FreezeAccount,
        }
    }
}

impl LedgerClient for SolanaLedger {
    type Signer = Keypair;

    fn signer_from_secret(&self, secret: &OwnerSecret) -> Result<Keypair, LedgerError> {
        Keypair::parse(secret.expose())
    }

    fn signer_address(&self, signer: &Keypair) -> LedgerAddress {
        signer.pubkey().to_address()
    }

    async fn create_mint(&self, authority: &Keypair, decimals: u8) -> Result<LedgerAddress, LedgerError> {
        let mint = Keypair::generate();
        let owner = authority.pubkey();
        let lamports = self
            .rpc
            .minimum_balance_for_rent_exemption(MINT_ACCOUNT_SIZE)
            .await?;

        let instructions = [
            instruction::create_account(
                &owner,
                &mint.pubkey(),
                lamports,
                MINT_ACCOUNT_SIZE,
                &TOKEN_PROGRAM_ID,
            ),
            instruction::initialize_mint2(&mint.pubkey(), decimals, &owner, Some(&owner)),
        ];
        let signature = self.submit(&instructions, authority, &[&mint]).await?;
        tracing::info!(mint = %mint.pubkey(), %signature, "mint created");
        Ok(mint.pubkey().to_address())
    }

    async fn create_metadata_account(
        &self,
        mint: &LedgerAddress,
        authority: &Keypair,
        data: &OnChainMetadata,
        mutable: bool,
    ) -> Result<LedgerAddress, LedgerError> {
        let mint = Pubkey::try_from(mint)?;
        let metadata = metadata_address(&mint)?;
        let args = MetadataArgs {
            name: &data.name,
            symbol: &data.symbol,
            uri: &data.uri,
            is_mutable: mutable,
        };

        let ix = instruction::create_metadata_account_v3(&metadata, &mint, &authority.pubkey(), &args);
        let signature = self.submit(&[ix], authority, &[]).await?;
        tracing::info!(%mint, %metadata, %signature, mutable, "metadata account created");
        Ok(metadata.to_address())
    }

    async fn get_or_create_token_account(
        &self,
        owner: &Keypair,
        mint: &LedgerAddress,
    ) -> Result<LedgerAddress, LedgerError> {
        let mint = Pubkey::try_from(mint)?;
        let wallet = owner.pubkey();
        let account = associated_token_address(&wallet, &mint)?;

        if self.rpc.account_exists(&account).await? {
            tracing::debug!(%account, "token account already exists");
            return Ok(account.to_address());
        }

        let ix = instruction::create_associated_token_account_idempotent(&wallet, &account, &wallet, &mint);
        let signature = self.submit(&[ix], owner, &[]).await?;
        tracing::info!(%account, %signature, "token account created");
        Ok(account.to_address())
    }

    async fn mint_to(
        &self,
        authority: &Keypair,
        mint: &LedgerAddress,
        account: &LedgerAddress,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mint = Pubkey::try_from(mint)?;
        let account = Pubkey::try_from(account)?;

        let ix = instruction::mint_to(&mint, &account, &authority.pubkey(), amount);
        let signature = self.submit(&[ix], authority, &[]).await?;
        tracing::info!(%mint, amount, %signature, "supply minted");
        Ok(())
    }

    async fn revoke_authority(
        &self,
        authority: &Keypair,
        mint: &LedgerAddress,
        kind: AuthorityKind,
    ) -> Result<(), LedgerError> {
        let mint = Pubkey::try_from(mint)?;

        let ix = instruction::set_authority(&mint, &authority.pubkey(), kind.into(), None);
        let signature = self.submit(&[ix], authority, &[]).await?;
        tracing::info!(%mint, authority = %kind, %signature, "authority revoked");
        Ok(())
    }

    fn metadata_account_for(&self, mint: &LedgerAddress) -> Result<LedgerAddress, LedgerError> {
        let mint = Pubkey::try_from(mint)?;
        Ok(metadata_address(&mint)?.to_address())
    }

    async fn lock_metadata(
        &self,
        authority: &Keypair,
        metadata_account: &LedgerAddress,
    ) -> Result<(), LedgerError> {
        let metadata = Pubkey::try_from(metadata_account)?;

        let ix = instruction::lock_metadata_account(&metadata, &authority.pubkey());
        let signature = self.submit(&[ix], authority, &[]).await?;
        tracing::info!(%metadata, %signature, "metadata locked");
        Ok(())
    }
}
