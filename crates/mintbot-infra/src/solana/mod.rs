//! Solana ledger adapter: local signing, legacy transactions, JSON-RPC.

pub mod instruction;
pub mod keypair;
pub mod ledger;
pub mod pubkey;
pub mod rpc;
pub mod transaction;

pub use keypair::Keypair;
pub use ledger::SolanaLedger;
pub use pubkey::Pubkey;
