//! Journal entry address derivation
//!
//! An entry lives at the program address derived from
//! `["journal_entry", owner, nfc(title)]`. The program derives the same
//! address on chain, so any drift here makes entries unreachable.

use crate::{JournalError, Result};
use solana_sdk::pubkey::{Pubkey, MAX_SEED_LEN};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Domain separation seed for journal entry accounts
pub const JOURNAL_ENTRY_SEED: &[u8] = b"journal_entry";

/// A derived entry address together with its bump seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Normalize a title to NFC
pub fn normalize_title(title: &str) -> String {
    title.nfc().collect()
}

/// Normalize a title and check it can be used as a seed.
pub fn title_seed(title: &str) -> Result<String> {
    let normalized = normalize_title(title);
    if normalized.is_empty() {
        return Err(JournalError::InvalidTitle("Title cannot be empty".to_string()));
    }
    if normalized.len() > MAX_SEED_LEN {
        return Err(JournalError::InvalidTitle(format!(
            "Title is {} bytes, seeds are limited to {} bytes",
            normalized.len(),
            MAX_SEED_LEN
        )));
    }
    Ok(normalized)
}

/// Derive the journal entry address for an owner and title
pub fn derive_entry_address(
    owner: &Pubkey,
    title: &str,
    program_id: &Pubkey,
) -> Result<RecordAddress> {
    let seed = title_seed(title)?;
    let (address, bump) = Pubkey::try_find_program_address(
        &[JOURNAL_ENTRY_SEED, owner.as_ref(), seed.as_bytes()],
        program_id,
    )
    .ok_or(JournalError::AddressDerivation)?;

    debug!("Derived entry {} (bump {}) for owner {}", address, bump, owner);
    Ok(RecordAddress { address, bump })
}
