//! 32-byte ledger addresses and program-derived addresses.

use std::fmt;

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use mintbot_types::error::LedgerError;
use mintbot_types::provisioning::LedgerAddress;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey(pub [u8; 32]);

/// System program (`11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey([0; 32]);

/// SPL Token program (`TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`).
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133, 237,
    95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// Associated Token Account program (`ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`).
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153, 218,
    255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

/// Metaplex Token Metadata program (`metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`).
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = Pubkey([
    11, 112, 101, 177, 227, 209, 124, 69, 56, 157, 82, 127, 107, 4, 195, 205, 88, 184, 108, 115,
    26, 160, 253, 181, 73, 182, 209, 188, 3, 248, 41, 70,
]);

impl Pubkey {
    pub fn from_base58(value: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidAddress(value.to_string());
        let bytes = bs58::decode(value.trim()).into_vec().map_err(|_| invalid())?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn to_address(&self) -> LedgerAddress {
        LedgerAddress::new(self.to_base58())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the bytes decompress to an ed25519 point.
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }

    /// Hash `seeds` under `program`. `None` when the result lands on the
    /// curve and is therefore not a valid derived address.
    pub fn create_program_address(seeds: &[&[u8]], program: &Pubkey) -> Option<Pubkey> {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update(program.0);
        hasher.update(PDA_MARKER);
        let candidate = Pubkey(hasher.finalize().into());
        (!candidate.is_on_curve()).then_some(candidate)
    }

    /// First off-curve address for `seeds`, searching bump seeds from 255
    /// down.
    pub fn find_program_address(seeds: &[&[u8]], program: &Pubkey) -> Option<(Pubkey, u8)> {
        (0..=u8::MAX).rev().find_map(|bump| {
            let bump_seed = [bump];
            let mut with_bump: Vec<&[u8]> = seeds.to_vec();
            with_bump.push(&bump_seed);
            Self::create_program_address(&with_bump, program).map(|address| (address, bump))
        })
    }
}

impl TryFrom<&LedgerAddress> for Pubkey {
    type Error = LedgerError;

    fn try_from(address: &LedgerAddress) -> Result<Self, Self::Error> {
        Self::from_base58(address.as_str())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_base58())
    }
}

/// Metaplex metadata account for `mint`.
pub fn metadata_address(mint: &Pubkey) -> Result<Pubkey, LedgerError> {
    Pubkey::find_program_address(
        &[&b"metadata"[..], &TOKEN_METADATA_PROGRAM_ID.0[..], &mint.0[..]],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .map(|(address, _)| address)
    .ok_or_else(|| LedgerError::InvalidAddress(mint.to_base58()))
}

/// Associated token account of `owner` for `mint`.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, LedgerError> {
    Pubkey::find_program_address(
        &[&owner.0[..], &TOKEN_PROGRAM_ID.0[..], &mint.0[..]],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _)| address)
    .ok_or_else(|| LedgerError::InvalidAddress(owner.to_base58()))
}
