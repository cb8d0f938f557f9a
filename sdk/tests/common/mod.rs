#![allow(dead_code)]

use async_trait::async_trait;
use journal_sdk::{
    IdentityProvider, JournalEntry, JournalError, JournalService, KeypairIdentity,
    OperationDescriptor, OperationKind, ProgramAccountFilter, Result, RpcGateway,
};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    hash::Hash,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// In-memory stand-in for the ledger and the journal program
pub struct InMemoryLedger {
    pub program_id: Pubkey,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    calls: AtomicUsize,
    fail_rpc: AtomicBool,
}

impl InMemoryLedger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail_rpc: AtomicBool::new(false),
        }
    }

    /// Number of gateway calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail at the transport level
    pub fn fail_rpc(&self, fail: bool) {
        self.fail_rpc.store(fail, Ordering::SeqCst);
    }

    /// Place arbitrary data at an address owned by the program
    pub fn insert_raw(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn contains(&self, address: &Pubkey) -> bool {
        self.accounts.lock().unwrap().contains_key(address)
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_rpc.load(Ordering::SeqCst) {
            return Err(ClientError::from(ClientErrorKind::Custom(
                "connection refused".to_string(),
            ))
            .into());
        }
        Ok(())
    }

    fn apply(&self, descriptor: &OperationDescriptor) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let address = descriptor.address.address;

        let existing = accounts
            .get(&address)
            .map(|data| JournalEntry::decode(data))
            .transpose()
            .map_err(|e| JournalError::RejectedByProgram(e.to_string()))?;

        match (descriptor.kind, existing) {
            (OperationKind::Create, Some(_)) => Err(JournalError::RejectedByProgram(
                format!("Allocate: account {address} already in use"),
            )),
            (OperationKind::Create, None) => {
                let entry = JournalEntry {
                    owner: descriptor.owner,
                    title: descriptor.title.clone(),
                    content: descriptor.content.clone().unwrap_or_default(),
                };
                accounts.insert(address, entry.encode_padded());
                Ok(())
            }
            (_, None) => Err(JournalError::RejectedByProgram(
                "AccountNotInitialized".to_string(),
            )),
            (_, Some(entry)) if entry.owner != descriptor.owner => Err(
                JournalError::RejectedByProgram("Unauthorized".to_string()),
            ),
            (OperationKind::Update, Some(mut entry)) => {
                entry.content = descriptor.content.clone().unwrap_or_default();
                accounts.insert(address, entry.encode_padded());
                Ok(())
            }
            (OperationKind::Delete, Some(_)) => {
                accounts.remove(&address);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RpcGateway for InMemoryLedger {
    async fn submit(
        &self,
        descriptor: &OperationDescriptor,
        identity: &dyn IdentityProvider,
    ) -> Result<Signature> {
        self.begin_call()?;

        let instruction = descriptor.to_instruction(&self.program_id)?;
        let message =
            Message::new_with_blockhash(&[instruction], Some(&descriptor.owner), &Hash::new_unique());
        let signed = identity.sign(Transaction::new_unsigned(message)).await?;
        if signed.verify().is_err() {
            return Err(JournalError::RejectedByProgram(
                "missing required signature".to_string(),
            ));
        }

        self.apply(descriptor)?;
        Ok(signed.signatures[0])
    }

    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>> {
        self.begin_call()?;
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or(JournalError::NotFound(*address))
    }

    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        filter: &ProgramAccountFilter,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        self.begin_call()?;
        if *program_id != self.program_id {
            return Ok(Vec::new());
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, data)| filter.matches(data))
            .map(|(address, data)| (*address, data.clone()))
            .collect())
    }
}

pub struct TestContext {
    pub ledger: Arc<InMemoryLedger>,
    pub identity: Arc<KeypairIdentity>,
    pub service: JournalService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_identity(KeypairIdentity::new(Keypair::new()))
    }

    pub fn with_identity(identity: KeypairIdentity) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(journal_sdk::program_id()));
        let identity = Arc::new(identity);
        let service = JournalService::new(journal_sdk::program_id(), ledger.clone(), identity.clone());
        Self {
            ledger,
            identity,
            service,
        }
    }

    /// A second service sharing the ledger but signing as someone else
    pub fn other_user(&self) -> JournalService {
        JournalService::new(
            journal_sdk::program_id(),
            self.ledger.clone(),
            Arc::new(KeypairIdentity::new(Keypair::new())),
        )
    }
}
