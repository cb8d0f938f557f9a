//! Network access: submitting operations and reading program accounts
//!
//! Nothing here retries. A failed call surfaces to the caller as-is.

use crate::{
    identity::IdentityProvider, instruction::OperationDescriptor, state::OWNER_OFFSET,
    JournalConfig, JournalError, Result,
};
use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, message::Message, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Server-side filters for program account enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramAccountFilter {
    /// Only accounts starting with this discriminator
    pub discriminator: Option<[u8; 8]>,
    /// Only entries owned by this identity
    pub owner: Option<Pubkey>,
}

impl ProgramAccountFilter {
    /// Translate into RPC memcmp filters
    pub fn to_rpc_filters(&self) -> Vec<RpcFilterType> {
        let mut filters = Vec::new();
        if let Some(discriminator) = &self.discriminator {
            filters.push(memcmp(0, discriminator));
        }
        if let Some(owner) = &self.owner {
            filters.push(memcmp(OWNER_OFFSET, owner.as_ref()));
        }
        filters
    }

    /// Whether raw account data passes the filter
    pub fn matches(&self, data: &[u8]) -> bool {
        let starts_with = |offset: usize, bytes: &[u8]| {
            data.get(offset..offset + bytes.len()) == Some(bytes)
        };
        self.discriminator.map_or(true, |d| starts_with(0, &d))
            && self.owner.map_or(true, |o| starts_with(OWNER_OFFSET, o.as_ref()))
    }
}

/// Data of an account fetched at an entry address. Anything the program does
/// not own (nothing there, or lamports sent to an unused address) is no entry.
fn entry_data(address: &Pubkey, program_id: &Pubkey, account: Option<Account>) -> Result<Vec<u8>> {
    match account {
        Some(account) if account.owner == *program_id => Ok(account.data),
        Some(account) => {
            debug!("Account {} is owned by {}, not the program", address, account.owner);
            Err(JournalError::NotFound(*address))
        }
        None => {
            debug!("No account at {}", address);
            Err(JournalError::NotFound(*address))
        }
    }
}

fn memcmp(offset: usize, bytes: &[u8]) -> RpcFilterType {
    RpcFilterType::Memcmp(Memcmp::new(
        offset,
        MemcmpEncodedBytes::Base58(bs58::encode(bytes).into_string()),
    ))
}

/// Request/response access to the ledger
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Sign the operation through `identity`, send it, and wait for confirmation
    async fn submit(
        &self,
        descriptor: &OperationDescriptor,
        identity: &dyn IdentityProvider,
    ) -> Result<Signature>;

    /// Raw data of the program-owned account at `address`, or [`JournalError::NotFound`]
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>>;

    /// Every account owned by `program_id` that passes `filter`, in no particular order
    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        filter: &ProgramAccountFilter,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;
}

/// Gateway backed by a Solana JSON-RPC node
pub struct SolanaRpcGateway {
    rpc_client: Arc<RpcClient>,
    program_id: Pubkey,
    commitment: CommitmentConfig,
}

impl SolanaRpcGateway {
    pub fn new(rpc_url: String, program_id: Pubkey, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_client: Arc::new(RpcClient::new_with_commitment(rpc_url, commitment)),
            program_id,
            commitment,
        }
    }

    pub fn from_config(config: &JournalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.rpc_url.clone(),
            config.program_id()?,
            config.commitment_config()?,
        ))
    }

    /// Get the RPC client
    pub fn rpc_client(&self) -> &Arc<RpcClient> {
        &self.rpc_client
    }
}

#[async_trait]
impl RpcGateway for SolanaRpcGateway {
    async fn submit(
        &self,
        descriptor: &OperationDescriptor,
        identity: &dyn IdentityProvider,
    ) -> Result<Signature> {
        let instruction = descriptor.to_instruction(&self.program_id)?;
        let recent_blockhash = self.rpc_client.get_latest_blockhash().await?;

        // Owner pays fees and rent
        let message =
            Message::new_with_blockhash(&[instruction], Some(&descriptor.owner), &recent_blockhash);
        let signed = identity.sign(Transaction::new_unsigned(message)).await?;

        let signature = self.rpc_client.send_and_confirm_transaction(&signed).await?;
        info!(
            "Submitted {} ({:?}): {}",
            descriptor.description(),
            self.commitment.commitment,
            signature
        );
        Ok(signature)
    }

    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, self.commitment)
            .await?;
        entry_data(address, &self.program_id, response.value)
    }

    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        filter: &ProgramAccountFilter,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let filters = filter.to_rpc_filters();
        let config = RpcProgramAccountsConfig {
            filters: if filters.is_empty() { None } else { Some(filters) },
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self
            .rpc_client
            .get_program_accounts_with_config(program_id, config)
            .await?;
        debug!("Program {} returned {} accounts", program_id, accounts.len());

        Ok(accounts
            .into_iter()
            .map(|(pubkey, account)| (pubkey, account.data))
            .collect())
    }
}
