//! Owner and mint signing keys.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use secrecy::zeroize::Zeroizing;

use mintbot_types::error::LedgerError;

use super::pubkey::Pubkey;

/// An ed25519 signing key. Debug output shows the public half only.
pub struct Keypair(SigningKey);

impl Keypair {
    /// Fresh random key, used for new mint accounts.
    pub fn generate() -> Self {
        Self(SigningKey::generate(&mut OsRng))
    }

    /// Parse an exported secret key.
    ///
    /// Accepts a base58 64-byte keypair (secret then public half), a base58
    /// 32-byte seed, or the JSON byte array written by `solana-keygen`.
    pub fn parse(secret: &str) -> Result<Self, LedgerError> {
        let bytes = decode_secret(secret)?;
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        match bytes.len() {
            64 => {
                let mut keypair = Zeroizing::new([0u8; 64]);
                keypair.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&keypair)
                    .map(Self)
                    .map_err(|_| {
                        LedgerError::InvalidSecretKey("public half does not match".to_string())
                    })
            }
            32 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(bytes);
                Ok(Self(SigningKey::from_bytes(&seed)))
            }
            n => Err(LedgerError::InvalidSecretKey(format!(
                "expected 64 or 32 bytes, got {n}"
            ))),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.0.sign(message).to_bytes()
    }
}

/// Raw secret key bytes, wiped when dropped.
fn decode_secret(secret: &str) -> Result<Zeroizing<Vec<u8>>, LedgerError> {
    let secret = secret.trim();
    let bytes = if secret.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(secret)
            .map_err(|_| LedgerError::InvalidSecretKey("malformed JSON byte array".to_string()))?
    } else {
        bs58::decode(secret)
            .into_vec()
            .map_err(|_| LedgerError::InvalidSecretKey("not valid base58".to_string()))?
    };
    Ok(Zeroizing::new(bytes))
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.pubkey())
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    use super::*;

    fn exported(seed: [u8; 32]) -> String {
        let key = SigningKey::from_bytes(&seed);
        bs58::encode(key.to_keypair_bytes()).into_string()
    }

    #[test]
    fn test_parse_base58_keypair() {
        let keypair = Keypair::parse(&exported([9u8; 32])).unwrap();
        let expected = SigningKey::from_bytes(&[9u8; 32]).verifying_key().to_bytes();
        assert_eq!(keypair.pubkey().0, expected);
    }

    #[test]
    fn test_parse_seed_and_json_forms_agree() {
        let seed = [4u8; 32];
        let from_seed = Keypair::parse(&bs58::encode(seed).into_string()).unwrap();

        let bytes = SigningKey::from_bytes(&seed).to_keypair_bytes().to_vec();
        let from_json = Keypair::parse(&serde_json::to_string(&bytes).unwrap()).unwrap();

        assert_eq!(from_seed.pubkey(), from_json.pubkey());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Keypair::parse("0OIl"),
            Err(LedgerError::InvalidSecretKey(_))
        ));
        assert!(matches!(
            Keypair::parse("3xy"),
            Err(LedgerError::InvalidSecretKey(_))
        ));
        assert!(matches!(
            Keypair::parse("[1, 2, 300]"),
            Err(LedgerError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn test_parse_rejects_mismatched_public_half() {
        let mut bytes = SigningKey::from_bytes(&[5u8; 32]).to_keypair_bytes();
        bytes[63] ^= 0xff;
        let encoded = bs58::encode(bytes).into_string();
        assert!(Keypair::parse(&encoded).is_err());
    }

    #[test]
    fn test_error_never_echoes_secret() {
        let secret = "4".repeat(40);
        let err = Keypair::parse(&secret).unwrap_err();
        assert!(!err.to_string().contains(&secret));
    }

    #[test]
    fn test_decoded_secret_is_zeroizing() {
        use secrecy::zeroize::Zeroize;

        let mut bytes = decode_secret(&exported([7u8; 32])).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[..32], &[7u8; 32]);
        bytes.zeroize();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_signature_verifies() {
        let keypair = Keypair::generate();
        let signature = Signature::from_bytes(&keypair.sign(b"message"));
        let verifying = VerifyingKey::from_bytes(&keypair.pubkey().0).unwrap();
        assert!(verifying.verify(b"message", &signature).is_ok());
    }
}
