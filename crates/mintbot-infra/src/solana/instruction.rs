//! Instruction builders for the System, SPL Token, Associated Token Account
//! and Token Metadata programs.
//!
//! Only the handful of instructions token provisioning needs. Layouts follow
//! each program's native encoding: little-endian integers for the system and
//! token programs, borsh for token metadata.

use super::pubkey::{
    ASSOCIATED_TOKEN_PROGRAM_ID, Pubkey, SYSTEM_PROGRAM_ID, TOKEN_METADATA_PROGRAM_ID,
    TOKEN_PROGRAM_ID,
};

/// Size of an SPL Token mint account.
pub const MINT_ACCOUNT_SIZE: u64 = 82;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// SPL Token authority slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenAuthority {
    MintTokens = 0,
    FreezeAccount = 1,
}

// ---------------------------------------------------------------------------
// System program
// ---------------------------------------------------------------------------

pub fn create_account(
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    let mut data = Vec::with_capacity(52);
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(&owner.0);

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(*new_account, true),
        ],
        data,
    }
}

// ---------------------------------------------------------------------------
// SPL Token
// ---------------------------------------------------------------------------

pub fn initialize_mint2(
    mint: &Pubkey,
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> Instruction {
    let mut data = vec![20, decimals];
    data.extend_from_slice(&mint_authority.0);
    push_optional_key(&mut data, freeze_authority);

    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![AccountMeta::writable(*mint, false)],
        data,
    }
}

pub fn mint_to(mint: &Pubkey, destination: &Pubkey, authority: &Pubkey, amount: u64) -> Instruction {
    let mut data = vec![7];
    data.extend_from_slice(&amount.to_le_bytes());

    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*authority, true),
        ],
        data,
    }
}

pub fn set_authority(
    mint: &Pubkey,
    current: &Pubkey,
    kind: TokenAuthority,
    new_authority: Option<&Pubkey>,
) -> Instruction {
    let mut data = vec![6, kind as u8];
    push_optional_key(&mut data, new_authority);

    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(*current, true),
        ],
        data,
    }
}

fn push_optional_key(data: &mut Vec<u8>, key: Option<&Pubkey>) {
    match key {
        Some(key) => {
            data.push(1);
            data.extend_from_slice(&key.0);
        }
        None => data.push(0),
    }
}

// ---------------------------------------------------------------------------
// Associated Token Account
// ---------------------------------------------------------------------------

pub fn create_associated_token_account_idempotent(
    payer: &Pubkey,
    associated: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(*associated, false),
            AccountMeta::readonly(*wallet, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ],
        data: vec![1],
    }
}

// ---------------------------------------------------------------------------
// Token Metadata
// ---------------------------------------------------------------------------

pub struct MetadataArgs<'a> {
    pub name: &'a str,
    pub symbol: &'a str,
    pub uri: &'a str,
    pub is_mutable: bool,
}

/// `CreateMetadataAccountV3` with no creators, collection or uses and a
/// zero seller fee.
pub fn create_metadata_account_v3(
    metadata: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    args: &MetadataArgs<'_>,
) -> Instruction {
    let mut data = vec![33];
    push_borsh_string(&mut data, args.name);
    push_borsh_string(&mut data, args.symbol);
    push_borsh_string(&mut data, args.uri);
    data.extend_from_slice(&0u16.to_le_bytes()); // seller_fee_basis_points
    data.push(0); // creators
    data.push(0); // collection
    data.push(0); // uses
    data.push(u8::from(args.is_mutable));
    data.push(0); // collection_details

    Instruction {
        program_id: TOKEN_METADATA_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*metadata, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(*authority, true),
            AccountMeta::writable(*authority, true),
            AccountMeta::readonly(*authority, true),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    }
}

/// `UpdateMetadataAccountV2` that only sets `is_mutable = false`.
pub fn lock_metadata_account(metadata: &Pubkey, update_authority: &Pubkey) -> Instruction {
    Instruction {
        program_id: TOKEN_METADATA_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*metadata, false),
            AccountMeta::readonly(*update_authority, true),
        ],
        // data, update_authority, primary_sale_happened unset; is_mutable = Some(false)
        data: vec![15, 0, 0, 0, 1, 0],
    }
}

fn push_borsh_string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}
