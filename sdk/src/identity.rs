//! Signing identity abstraction
//!
//! The SDK never holds keys on its own behalf. Everything that needs the
//! owner's public key or signature goes through an [`IdentityProvider`],
//! which a wallet integration or a test double can implement.

use crate::{JournalConfig, JournalError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Connection changes reported by an identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityEvent {
    Connected(Pubkey),
    Disconnected,
}

/// External signing identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether an identity is present and connected right now
    fn is_available(&self) -> bool;

    /// Connect the identity, possibly prompting the user
    async fn connect(&self) -> Result<Pubkey>;

    /// Current public identity
    async fn identity(&self) -> Result<Pubkey>;

    /// Sign a transaction whose blockhash is already set
    async fn sign(&self, transaction: Transaction) -> Result<Transaction>;

    /// Sign a batch of transactions
    async fn sign_all(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign(transaction).await?);
        }
        Ok(signed)
    }

    /// Subscribe to connect/disconnect notifications
    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;
}

/// Identity backed by a local keypair
pub struct KeypairIdentity {
    keypair: Keypair,
    connected: AtomicBool,
    events: broadcast::Sender<IdentityEvent>,
}

impl KeypairIdentity {
    /// Create a connected identity
    pub fn new(keypair: Keypair) -> Self {
        let identity = Self::disconnected(keypair);
        identity.connected.store(true, Ordering::SeqCst);
        identity
    }

    /// Create an identity that must be connected before use
    pub fn disconnected(keypair: Keypair) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            keypair,
            connected: AtomicBool::new(false),
            events,
        }
    }

    /// Connected identity from the configured keypair file
    pub fn from_config(config: &JournalConfig) -> Result<Self> {
        Ok(Self::new(config.load_keypair()?))
    }

    /// Disconnect and notify subscribers
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Identity {} disconnected", self.keypair.pubkey());
            let _ = self.events.send(IdentityEvent::Disconnected);
        }
    }
}

#[async_trait]
impl IdentityProvider for KeypairIdentity {
    fn is_available(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<Pubkey> {
        let pubkey = self.keypair.pubkey();
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Identity {} connected", pubkey);
            let _ = self.events.send(IdentityEvent::Connected(pubkey));
        }
        Ok(pubkey)
    }

    async fn identity(&self) -> Result<Pubkey> {
        if !self.is_available() {
            return Err(JournalError::IdentityUnavailable);
        }
        Ok(self.keypair.pubkey())
    }

    async fn sign(&self, mut transaction: Transaction) -> Result<Transaction> {
        if !self.is_available() {
            return Err(JournalError::SigningUnavailable(
                "Identity is disconnected".to_string(),
            ));
        }

        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| JournalError::SigningUnavailable(e.to_string()))?;

        debug!("Signed transaction with {}", self.keypair.pubkey());
        Ok(transaction)
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }
}
