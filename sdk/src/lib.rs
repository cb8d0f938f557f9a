//! Journal SDK - client library for the journal program
//!
//! Journal entries are program accounts addressed by their owner and
//! title. This SDK provides:
//! - Entry address derivation
//! - Instruction building for create, update and delete
//! - Account decoding and program-wide enumeration
//! - A [`JournalService`] tying these to an RPC node and a signing identity

pub mod address;
pub mod config;
pub mod error;
pub mod identity;
pub mod instruction;
pub mod rpc;
pub mod service;
pub mod state;

// Re-export key types
pub use address::{derive_entry_address, normalize_title, RecordAddress, JOURNAL_ENTRY_SEED};
pub use config::JournalConfig;
pub use error::{DecodeError, JournalError, Result};
pub use identity::{IdentityEvent, IdentityProvider, KeypairIdentity};
pub use instruction::{
    build_create, build_delete, build_update, AccountRequirement, AccountRole,
    OperationDescriptor, OperationKind,
};
pub use rpc::{ProgramAccountFilter, RpcGateway, SolanaRpcGateway};
pub use service::{CreateReceipt, JournalService, ListOutcome, SkippedAccount};
pub use state::JournalEntry;

// Re-export commonly used Solana types
pub use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};

use sha2::{Digest, Sha256};

/// Journal program deployed at this address unless configured otherwise
pub const PROGRAM_ID: Pubkey = solana_sdk::pubkey!("5GEgJnuMG7VgAbt8dU31tqeVzmk1UokxUBc1N8y4u89v");

/// Default journal program ID
pub fn program_id() -> Pubkey {
    PROGRAM_ID
}

fn discriminator(preimage: &str) -> [u8; 8] {
    let hash = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Instruction discriminator: first 8 bytes of `sha256("global:<name>")`
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator(&format!("global:{name}"))
}

/// Account discriminator: first 8 bytes of `sha256("account:<Type>")`
pub fn account_discriminator(type_name: &str) -> [u8; 8] {
    discriminator(&format!("account:{type_name}"))
}
