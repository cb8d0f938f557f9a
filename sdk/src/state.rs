//! Journal entry account layout
//!
//! Layout written by the program:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 8    | discriminator                 |
//! | 8      | 32   | owner                         |
//! | 40     | 4+n  | title (u32 LE length + UTF-8) |
//! | ..     | 4+m  | content (u32 LE length + UTF-8) |
//!
//! Accounts are allocated at [`JournalEntry::SPACE`] bytes, so anything
//! after the content is zero padding.

use crate::{account_discriminator, DecodeError};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Maximum title length accepted by the program, in bytes
pub const MAX_TITLE_LEN: usize = 64;

/// Maximum content length accepted by the program, in bytes
pub const MAX_CONTENT_LEN: usize = 256;

/// Offset of the owner field
pub const OWNER_OFFSET: usize = 8;

/// A decoded journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub owner: Pubkey,
    pub title: String,
    pub content: String,
}

impl JournalEntry {
    /// Allocated account size
    pub const SPACE: usize = 8 + 32 + (4 + MAX_TITLE_LEN) + (4 + MAX_CONTENT_LEN);

    /// Discriminator of journal entry accounts
    pub fn discriminator() -> [u8; 8] {
        account_discriminator("JournalEntry")
    }

    /// Decode account data. Trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader { data, offset: 0 };

        let expected = Self::discriminator();
        let found = reader.take("discriminator", 8)?;
        if found != expected {
            return Err(DecodeError::BadDiscriminator {
                expected,
                found: found.to_vec(),
            });
        }

        let owner_bytes: [u8; 32] = reader.array("owner")?;
        let title = reader.string("title")?;
        let content = reader.string("content")?;

        Ok(Self {
            owner: Pubkey::new_from_array(owner_bytes),
            title,
            content,
        })
    }

    /// Encode the entry the way the program stores it, without padding
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(8 + 32 + 8 + self.title.len() + self.content.len());
        data.extend_from_slice(&Self::discriminator());
        data.extend_from_slice(&self.owner.to_bytes());
        data.extend_from_slice(&(self.title.len() as u32).to_le_bytes());
        data.extend_from_slice(self.title.as_bytes());
        data.extend_from_slice(&(self.content.len() as u32).to_le_bytes());
        data.extend_from_slice(self.content.as_bytes());
        data
    }

    /// Encode and zero-pad to the allocated account size
    pub fn encode_padded(&self) -> Vec<u8> {
        let mut data = self.encode();
        if data.len() < Self::SPACE {
            data.resize(Self::SPACE, 0);
        }
        data
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.data.len() - self.offset;
        if len > available {
            return Err(DecodeError::Truncated {
                field,
                needed: len,
                available,
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = u32::from_le_bytes(self.array(field)?) as usize;
        let bytes = self.take(field, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}
