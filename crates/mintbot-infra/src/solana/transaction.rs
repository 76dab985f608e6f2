//! Legacy transaction messages: account ordering, compilation, signing and
//! wire encoding.

use mintbot_types::error::LedgerError;

use super::instruction::Instruction;
use super::keypair::Keypair;
use super::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Default)]
struct KeyFlags {
    signer: bool,
    writable: bool,
}

impl Message {
    /// Compile `instructions` with `payer` as the fee payer.
    ///
    /// Keys are ordered writable signers, readonly signers, writable
    /// non-signers, readonly non-signers, with the payer first. Flags of a
    /// key used more than once are merged.
    pub fn compile(
        instructions: &[Instruction],
        payer: &Pubkey,
        recent_blockhash: [u8; 32],
    ) -> Result<Self, LedgerError> {
        let mut keys: Vec<(Pubkey, KeyFlags)> = vec![(
            *payer,
            KeyFlags {
                signer: true,
                writable: true,
            },
        )];
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            match keys.iter_mut().find(|(k, _)| *k == pubkey) {
                Some((_, flags)) => {
                    flags.signer |= signer;
                    flags.writable |= writable;
                }
                None => keys.push((pubkey, KeyFlags { signer, writable })),
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable sort keeps the payer first and first-use order within groups.
        keys.sort_by_key(|(_, flags)| match (flags.signer, flags.writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if keys.len() > usize::from(u8::MAX) {
            return Err(LedgerError::Rejected("too many accounts".to_string()));
        }

        let count = |signer: bool, writable: bool| {
            keys.iter()
                .filter(|(_, f)| f.signer == signer && f.writable == writable)
                .count() as u8
        };
        let header = MessageHeader {
            num_required_signatures: count(true, true) + count(true, false),
            num_readonly_signed: count(true, false),
            num_readonly_unsigned: count(false, false),
        };

        let account_keys: Vec<Pubkey> = keys.into_iter().map(|(k, _)| k).collect();
        let index_of = |pubkey: &Pubkey| {
            account_keys
                .iter()
                .position(|k| k == pubkey)
                .map(|i| i as u8)
                .unwrap_or_default()
        };
        let instructions = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|a| index_of(&a.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..usize::from(self.header.num_required_signatures)]
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = vec![
            self.header.num_required_signatures,
            self.header.num_readonly_signed,
            self.header.num_readonly_unsigned,
        ];
        push_short_len(&mut out, self.account_keys.len());
        for key in &self.account_keys {
            out.extend_from_slice(&key.0);
        }
        out.extend_from_slice(&self.recent_blockhash);
        push_short_len(&mut out, self.instructions.len());
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            push_short_len(&mut out, ix.accounts.len());
            out.extend_from_slice(&ix.accounts);
            push_short_len(&mut out, ix.data.len());
            out.extend_from_slice(&ix.data);
        }
        out
    }
}

/// A fully signed transaction ready for `sendTransaction`.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: Message,
}

impl Transaction {
    /// Sign `message` with `signers`. Every required signer must be present;
    /// extra signers are an error.
    pub fn sign(message: Message, signers: &[&Keypair]) -> Result<Self, LedgerError> {
        let bytes = message.serialize();
        let required = message.signer_keys();
        if signers.len() != required.len() {
            return Err(LedgerError::Rejected(format!(
                "expected {} signers, got {}",
                required.len(),
                signers.len()
            )));
        }

        let signatures = required
            .iter()
            .map(|key| {
                signers
                    .iter()
                    .find(|s| s.pubkey() == *key)
                    .map(|s| s.sign(&bytes))
                    .ok_or_else(|| LedgerError::Rejected(format!("missing signature for {key}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            signatures,
            message,
        })
    }

    /// Base58 of the first signature, which identifies the transaction.
    pub fn id(&self) -> String {
        self.signatures
            .first()
            .map(|s| bs58::encode(s).into_string())
            .unwrap_or_default()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_short_len(&mut out, self.signatures.len());
        for signature in &self.signatures {
            out.extend_from_slice(signature);
        }
        out.extend_from_slice(&self.message.serialize());
        out
    }
}

/// Compact-u16 length prefix.
fn push_short_len(out: &mut Vec<u8>, len: usize) {
    let mut rem = len;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    use crate::solana::instruction::{AccountMeta, create_account, mint_to};
    use crate::solana::pubkey::{SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
    use super::*;

    #[test]
    fn test_short_len_encoding() {
        let encode = |n| {
            let mut out = Vec::new();
            push_short_len(&mut out, n);
            out
        };
        assert_eq!(encode(0), vec![0]);
        assert_eq!(encode(127), vec![0x7f]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(16_383), vec![0xff, 0x7f]);
        assert_eq!(encode(16_384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_compile_orders_accounts_and_counts_header() {
        let payer = Keypair::generate();
        let mint = Keypair::generate();
        let ix = create_account(&payer.pubkey(), &mint.pubkey(), 10, 82, &TOKEN_PROGRAM_ID);

        let message = Message::compile(&[ix], &payer.pubkey(), [7; 32]).unwrap();
        assert_eq!(
            message.account_keys,
            vec![payer.pubkey(), mint.pubkey(), SYSTEM_PROGRAM_ID]
        );
        assert_eq!(
            message.header,
            MessageHeader {
                num_required_signatures: 2,
                num_readonly_signed: 0,
                num_readonly_unsigned: 1,
            }
        );
        assert_eq!(message.instructions[0].program_id_index, 2);
        assert_eq!(message.instructions[0].accounts, vec![0, 1]);
    }

    #[test]
    fn test_compile_merges_duplicate_keys() {
        let payer = Keypair::generate();
        let mint = Pubkey([2; 32]);
        let account = Pubkey([3; 32]);
        let ix = mint_to(&mint, &account, &payer.pubkey(), 5);

        let message = Message::compile(&[ix], &payer.pubkey(), [0; 32]).unwrap();
        // payer is both fee payer and readonly authority: one entry, writable signer.
        assert_eq!(message.account_keys.len(), 4);
        assert_eq!(message.account_keys[0], payer.pubkey());
        assert_eq!(message.header.num_required_signatures, 1);
        assert_eq!(message.header.num_readonly_signed, 0);
        assert_eq!(message.instructions[0].accounts, vec![1, 2, 0]);
    }

    #[test]
    fn test_readonly_signer_group() {
        let payer = Keypair::generate();
        let other = Pubkey([9; 32]);
        let ix = Instruction {
            program_id: TOKEN_PROGRAM_ID,
            accounts: vec![AccountMeta::readonly(other, true)],
            data: vec![],
        };
        let message = Message::compile(&[ix], &payer.pubkey(), [0; 32]).unwrap();
        assert_eq!(message.header.num_required_signatures, 2);
        assert_eq!(message.header.num_readonly_signed, 1);
        assert_eq!(message.signer_keys(), &[payer.pubkey(), other]);
    }

    #[test]
    fn test_signatures_verify_over_message_bytes() {
        let payer = Keypair::generate();
        let mint = Keypair::generate();
        let ix = create_account(&payer.pubkey(), &mint.pubkey(), 10, 82, &TOKEN_PROGRAM_ID);
        let message = Message::compile(&[ix], &payer.pubkey(), [1; 32]).unwrap();
        let bytes = message.serialize();

        // Signer order in the slice does not matter.
        let tx = Transaction::sign(message, &[&mint, &payer]).unwrap();
        assert_eq!(tx.signatures.len(), 2);

        for (key, signature) in [payer.pubkey(), mint.pubkey()].iter().zip(&tx.signatures) {
            let verifying = VerifyingKey::from_bytes(&key.0).unwrap();
            assert!(verifying.verify(&bytes, &Signature::from_bytes(signature)).is_ok());
        }

        let wire = tx.serialize();
        assert_eq!(wire[0], 2);
        assert_eq!(wire.len(), 1 + 128 + bytes.len());
        assert_eq!(tx.id(), bs58::encode(tx.signatures[0]).into_string());
    }

    #[test]
    fn test_sign_requires_every_signer() {
        let payer = Keypair::generate();
        let mint = Keypair::generate();
        let ix = create_account(&payer.pubkey(), &mint.pubkey(), 10, 82, &TOKEN_PROGRAM_ID);
        let message = Message::compile(&[ix], &payer.pubkey(), [1; 32]).unwrap();

        assert!(Transaction::sign(message, &[&payer]).is_err());
    }

    #[test]
    fn test_create_account_message_wire_bytes() {
        let payer = Pubkey::from_base58("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM").unwrap();
        let mint = Pubkey::from_base58("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").unwrap();
        let mut blockhash = [0u8; 32];
        for (i, byte) in blockhash.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let ix = create_account(&payer, &mint, 1_461_600, 82, &TOKEN_PROGRAM_ID);

        let bytes = Message::compile(&[ix], &payer, blockhash).unwrap().serialize();
        assert_eq!(bytes.len(), 190);
        assert_eq!(
            STANDARD.encode(&bytes),
            "AgABA36MCIdgv94d3c8ywX8gm4JC7lKq8TH6zYjQ6ixtCwbyxvp6877brTo9ZfNqq8l0MbG75MLS9uDkfKYCA0Uv\
             XWEAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4f\
             AQICAAE0AAAAAGBNFgAAAAAAUgAAAAAAAAAG3fbh12Whk9nL4UbO63msHLSF7V9bN5E6jPWFfv8AqQ=="
        );
    }
}
