//! Operation descriptors for the journal program's mutating instructions

use crate::{
    address::{title_seed, RecordAddress},
    instruction_discriminator,
    state::MAX_CONTENT_LEN,
    JournalError, Result,
};
use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

/// Mutating operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Program instruction name
    pub fn instruction_name(&self) -> &'static str {
        match self {
            OperationKind::Create => "create_journal_entry",
            OperationKind::Update => "update_journal_entry",
            OperationKind::Delete => "delete_journal_entry",
        }
    }

    pub fn discriminator(&self) -> [u8; 8] {
        instruction_discriminator(self.instruction_name())
    }
}

/// What an account is doing in an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountRole {
    /// The journal entry account
    Record,
    /// The entry owner, who signs and pays rent
    Owner,
    /// The system program, allocating or reclaiming space
    Allocator,
}

/// An account the instruction needs, with its access mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRequirement {
    pub role: AccountRole,
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountRequirement {
    fn meta(&self) -> AccountMeta {
        AccountMeta {
            pubkey: self.pubkey,
            is_signer: self.is_signer,
            is_writable: self.is_writable,
        }
    }
}

/// Unsigned description of one mutating operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub kind: OperationKind,
    pub address: RecordAddress,
    pub owner: Pubkey,
    /// Normalized title, as used in the address seeds
    pub title: String,
    /// New content for create and update
    pub content: Option<String>,
    pub accounts: Vec<AccountRequirement>,
}

#[derive(BorshSerialize)]
struct TitleContentArgs {
    title: String,
    content: String,
}

#[derive(BorshSerialize)]
struct TitleArgs {
    title: String,
}

impl OperationDescriptor {
    /// Instruction data: discriminator followed by Borsh-encoded arguments
    pub fn instruction_data(&self) -> Result<Vec<u8>> {
        let mut data = self.kind.discriminator().to_vec();
        let args = match (&self.kind, &self.content) {
            (OperationKind::Create | OperationKind::Update, Some(content)) => TitleContentArgs {
                title: self.title.clone(),
                content: content.clone(),
            }
            .try_to_vec()?,
            (OperationKind::Delete, None) => TitleArgs { title: self.title.clone() }.try_to_vec()?,
            _ => {
                return Err(JournalError::Serialization(format!(
                    "{} carries mismatched content",
                    self.kind.instruction_name()
                )))
            }
        };
        data.extend_from_slice(&args);
        Ok(data)
    }

    /// Build the program instruction
    pub fn to_instruction(&self, program_id: &Pubkey) -> Result<Instruction> {
        Ok(Instruction {
            program_id: *program_id,
            accounts: self.accounts.iter().map(AccountRequirement::meta).collect(),
            data: self.instruction_data()?,
        })
    }

    /// Short human readable description for logs
    pub fn description(&self) -> String {
        format!(
            "{} '{}' at {}",
            self.kind.instruction_name(),
            self.title,
            self.address.address
        )
    }
}

fn accounts(address: &RecordAddress, owner: Pubkey) -> Vec<AccountRequirement> {
    vec![
        AccountRequirement {
            role: AccountRole::Record,
            pubkey: address.address,
            is_signer: false,
            is_writable: true,
        },
        AccountRequirement {
            role: AccountRole::Owner,
            pubkey: owner,
            is_signer: true,
            is_writable: true,
        },
        AccountRequirement {
            role: AccountRole::Allocator,
            pubkey: system_program::id(),
            is_signer: false,
            is_writable: false,
        },
    ]
}

fn check_content(content: &str) -> Result<()> {
    if content.len() > MAX_CONTENT_LEN {
        return Err(JournalError::InvalidContent(format!(
            "Content is {} bytes, the program stores at most {}",
            content.len(),
            MAX_CONTENT_LEN
        )));
    }
    Ok(())
}

/// Build a create operation. Whether the address is free is checked on chain.
pub fn build_create(
    address: RecordAddress,
    owner: Pubkey,
    title: &str,
    content: &str,
) -> Result<OperationDescriptor> {
    let title = title_seed(title)?;
    check_content(content)?;
    Ok(OperationDescriptor {
        kind: OperationKind::Create,
        accounts: accounts(&address, owner),
        address,
        owner,
        title,
        content: Some(content.to_string()),
    })
}

/// Build an update operation. Only the content changes; the title selects the entry.
pub fn build_update(
    address: RecordAddress,
    owner: Pubkey,
    title: &str,
    content: &str,
) -> Result<OperationDescriptor> {
    let title = title_seed(title)?;
    check_content(content)?;
    Ok(OperationDescriptor {
        kind: OperationKind::Update,
        accounts: accounts(&address, owner),
        address,
        owner,
        title,
        content: Some(content.to_string()),
    })
}

/// Build a delete operation, returning the entry's rent to the owner
pub fn build_delete(
    address: RecordAddress,
    owner: Pubkey,
    title: &str,
) -> Result<OperationDescriptor> {
    let title = title_seed(title)?;
    Ok(OperationDescriptor {
        kind: OperationKind::Delete,
        accounts: accounts(&address, owner),
        address,
        owner,
        title,
        content: None,
    })
}
