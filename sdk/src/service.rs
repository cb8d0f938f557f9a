//! Journal service: create, read, update, delete and list entries
//!
//! Each call resolves the identity, derives the entry address, and goes to
//! the network once. Nothing read from the ledger is kept between calls.
//! Concurrent calls for the same title race on chain; the program decides.

use crate::{
    address::{derive_entry_address, RecordAddress},
    identity::{IdentityEvent, IdentityProvider},
    instruction::{build_create, build_delete, build_update},
    rpc::{ProgramAccountFilter, RpcGateway, SolanaRpcGateway},
    DecodeError, JournalConfig, JournalEntry, JournalError, Result,
};
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use tokio::sync::{broadcast, broadcast::error::TryRecvError, Mutex};
use tracing::{debug, info, warn};

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReceipt {
    pub signature: Signature,
    pub address: Pubkey,
}

/// An account that could not be read as a journal entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAccount {
    pub address: Pubkey,
    pub error: DecodeError,
}

/// Outcome of enumerating program accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOutcome {
    pub entries: Vec<(Pubkey, JournalEntry)>,
    pub skipped: Vec<SkippedAccount>,
}

impl ListOutcome {
    /// Decode every account independently
    pub fn from_accounts(accounts: Vec<(Pubkey, Vec<u8>)>) -> Self {
        let mut outcome = Self::default();
        for (address, data) in accounts {
            match JournalEntry::decode(&data) {
                Ok(entry) => outcome.entries.push((address, entry)),
                Err(error) => {
                    warn!("Skipping unreadable account {}: {}", address, error);
                    outcome.skipped.push(SkippedAccount { address, error });
                }
            }
        }
        outcome
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

struct IdentityCache {
    current: Option<Pubkey>,
    events: broadcast::Receiver<IdentityEvent>,
}

impl IdentityCache {
    /// Drop the cached identity if the provider reported any change. Returns
    /// whether it did.
    fn apply_events(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    debug!("Identity changed: {:?}", event);
                    changed = true;
                }
                Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if changed {
            self.current = None;
        }
        changed
    }
}

/// Entry point for journal operations
pub struct JournalService {
    program_id: Pubkey,
    gateway: Arc<dyn RpcGateway>,
    identity: Arc<dyn IdentityProvider>,
    filter_by_discriminator: bool,
    identity_cache: Mutex<IdentityCache>,
}

impl JournalService {
    pub fn new(
        program_id: Pubkey,
        gateway: Arc<dyn RpcGateway>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let events = identity.subscribe();
        Self {
            program_id,
            gateway,
            identity,
            filter_by_discriminator: true,
            identity_cache: Mutex::new(IdentityCache {
                current: None,
                events,
            }),
        }
    }

    /// Build a service talking to the configured RPC node
    pub fn from_config(config: &JournalConfig, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let gateway = Arc::new(SolanaRpcGateway::from_config(config)?);
        Ok(Self::new(config.program_id()?, gateway, identity)
            .with_discriminator_filter(config.filter_by_discriminator))
    }

    /// Whether enumeration asks the node for journal entry accounts only
    pub fn with_discriminator_filter(mut self, enabled: bool) -> Self {
        self.filter_by_discriminator = enabled;
        self
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Connect the identity provider
    pub async fn connect(&self) -> Result<Pubkey> {
        let pubkey = self.identity.connect().await?;
        self.identity_cache.lock().await.current = Some(pubkey);
        Ok(pubkey)
    }

    async fn current_identity(&self) -> Result<Pubkey> {
        {
            let mut cache = self.identity_cache.lock().await;
            cache.apply_events();

            if !self.identity.is_available() {
                cache.current = None;
                return Err(JournalError::IdentityUnavailable);
            }

            if let Some(pubkey) = cache.current {
                return Ok(pubkey);
            }
        }

        // Resolving may prompt the user; other calls proceed meanwhile
        let pubkey = self.identity.identity().await?;

        let mut cache = self.identity_cache.lock().await;
        if !cache.apply_events() {
            cache.current = Some(pubkey);
        }
        Ok(pubkey)
    }

    /// Address of the current identity's entry with this title
    pub async fn address_of(&self, title: &str) -> Result<RecordAddress> {
        let owner = self.current_identity().await?;
        derive_entry_address(&owner, title, &self.program_id)
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<CreateReceipt> {
        let owner = self.current_identity().await?;
        let address = derive_entry_address(&owner, title, &self.program_id)?;
        let descriptor = build_create(address, owner, title, content)?;

        let signature = self.gateway.submit(&descriptor, self.identity.as_ref()).await?;
        info!("Created entry '{}' at {}", descriptor.title, address.address);

        Ok(CreateReceipt {
            signature,
            address: address.address,
        })
    }

    pub async fn read(&self, title: &str) -> Result<JournalEntry> {
        let owner = self.current_identity().await?;
        let address = derive_entry_address(&owner, title, &self.program_id)?;
        let data = self.gateway.fetch_account(&address.address).await?;
        Ok(JournalEntry::decode(&data)?)
    }

    pub async fn update(&self, title: &str, content: &str) -> Result<Signature> {
        let owner = self.current_identity().await?;
        let address = derive_entry_address(&owner, title, &self.program_id)?;
        let descriptor = build_update(address, owner, title, content)?;

        let signature = self.gateway.submit(&descriptor, self.identity.as_ref()).await?;
        info!("Updated entry '{}' at {}", descriptor.title, address.address);
        Ok(signature)
    }

    pub async fn delete(&self, title: &str) -> Result<Signature> {
        let owner = self.current_identity().await?;
        let address = derive_entry_address(&owner, title, &self.program_id)?;
        let descriptor = build_delete(address, owner, title)?;

        let signature = self.gateway.submit(&descriptor, self.identity.as_ref()).await?;
        info!("Deleted entry '{}' at {}", descriptor.title, address.address);
        Ok(signature)
    }

    /// Every journal entry held by the program, whoever owns it.
    ///
    /// Accounts that fail to decode are reported in [`ListOutcome::skipped`]
    /// instead of failing the call. RPC failures still fail it.
    pub async fn list_all(&self) -> Result<ListOutcome> {
        let filter = ProgramAccountFilter {
            discriminator: self.discriminator_filter(),
            owner: None,
        };
        self.list(&filter).await
    }

    /// Entries owned by the current identity
    pub async fn list_owned(&self) -> Result<ListOutcome> {
        let owner = self.current_identity().await?;
        let filter = ProgramAccountFilter {
            discriminator: self.discriminator_filter(),
            owner: Some(owner),
        };
        self.list(&filter).await
    }

    fn discriminator_filter(&self) -> Option<[u8; 8]> {
        self.filter_by_discriminator
            .then(JournalEntry::discriminator)
    }

    async fn list(&self, filter: &ProgramAccountFilter) -> Result<ListOutcome> {
        let accounts = self
            .gateway
            .list_program_accounts(&self.program_id, filter)
            .await?;
        let total = accounts.len();
        let outcome = ListOutcome::from_accounts(accounts);

        info!(
            "Listed {} entries from {} accounts ({} skipped)",
            outcome.entries.len(),
            total,
            outcome.skipped_count()
        );
        Ok(outcome)
    }
}
