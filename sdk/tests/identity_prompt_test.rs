//! A pending wallet prompt holds up only the call waiting on it

mod common;

use async_trait::async_trait;
use common::InMemoryLedger;
use journal_sdk::{
    derive_entry_address, program_id, IdentityEvent, IdentityProvider, JournalError,
    JournalService, Pubkey, Result,
};
use solana_sdk::transaction::Transaction;
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, Notify, Semaphore};

/// Wallet whose identity lookup waits until the user approves
struct PromptingWallet {
    owner: Pubkey,
    prompt_open: Notify,
    approvals: Semaphore,
    events: broadcast::Sender<IdentityEvent>,
}

impl PromptingWallet {
    fn new() -> Self {
        Self {
            owner: Pubkey::new_unique(),
            prompt_open: Notify::new(),
            approvals: Semaphore::new(0),
            events: broadcast::channel(4).0,
        }
    }
}

#[async_trait]
impl IdentityProvider for PromptingWallet {
    fn is_available(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<Pubkey> {
        Ok(self.owner)
    }

    async fn identity(&self) -> Result<Pubkey> {
        self.prompt_open.notify_one();
        self.approvals
            .acquire()
            .await
            .map_err(|_| JournalError::IdentityUnavailable)?
            .forget();
        Ok(self.owner)
    }

    async fn sign(&self, _transaction: Transaction) -> Result<Transaction> {
        Err(JournalError::SigningUnavailable("not used".to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn test_pending_prompt_does_not_block_other_calls() {
    let wallet = Arc::new(PromptingWallet::new());
    let ledger = Arc::new(InMemoryLedger::new(program_id()));
    let service = Arc::new(JournalService::new(program_id(), ledger, wallet.clone()));

    let pending = tokio::spawn({
        let service = service.clone();
        async move { service.address_of("Diary").await }
    });
    wallet.prompt_open.notified().await;

    let connected = tokio::time::timeout(Duration::from_secs(5), service.connect())
        .await
        .expect("connect waited behind the open prompt")
        .unwrap();
    assert_eq!(connected, wallet.owner);

    let other = tokio::time::timeout(Duration::from_secs(5), service.address_of("Notes"))
        .await
        .expect("address_of waited behind the open prompt")
        .unwrap();
    assert_eq!(
        other,
        derive_entry_address(&wallet.owner, "Notes", &program_id()).unwrap()
    );

    wallet.approvals.add_permits(1);
    let address = pending.await.unwrap().unwrap();
    assert_eq!(
        address,
        derive_entry_address(&wallet.owner, "Diary", &program_id()).unwrap()
    );
}
