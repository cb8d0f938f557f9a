//! Configuration for the journal SDK

use crate::{JournalError, Result, PROGRAM_ID};
use serde::Deserialize;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};
use std::{fs, str::FromStr};

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Solana RPC URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Commitment level submitted transactions are confirmed at
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Journal program ID
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// Ask the RPC node to return only journal entry accounts when enumerating
    #[serde(default = "default_filter_by_discriminator")]
    pub filter_by_discriminator: bool,

    /// Optional keypair file for a local signing identity
    #[serde(default)]
    pub keypair_path: Option<String>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            commitment: default_commitment(),
            program_id: default_program_id(),
            filter_by_discriminator: default_filter_by_discriminator(),
            keypair_path: None,
        }
    }
}

impl JournalConfig {
    /// Load configuration from file or environment variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let config = if let Some(path) = config_path {
            let content = fs::read_to_string(path).map_err(|e| {
                JournalError::invalid_configuration(format!(
                    "Failed to read config file {path}: {e}"
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::from_env()?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            JournalError::invalid_configuration(format!("Failed to parse config: {e}"))
        })
    }

    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let filter_by_discriminator = match std::env::var("JOURNAL_FILTER_BY_DISCRIMINATOR") {
            Ok(value) => value.parse().map_err(|_| {
                JournalError::invalid_configuration(format!(
                    "JOURNAL_FILTER_BY_DISCRIMINATOR must be true or false, got {value}"
                ))
            })?,
            Err(_) => default_filter_by_discriminator(),
        };

        Ok(Self {
            rpc_url: std::env::var("JOURNAL_RPC_URL").unwrap_or_else(|_| default_rpc_url()),
            commitment: std::env::var("JOURNAL_COMMITMENT")
                .unwrap_or_else(|_| default_commitment()),
            program_id: std::env::var("JOURNAL_PROGRAM_ID")
                .unwrap_or_else(|_| default_program_id()),
            filter_by_discriminator,
            keypair_path: std::env::var("JOURNAL_KEYPAIR_PATH").ok(),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.rpc_url.starts_with("http") {
            return Err(JournalError::invalid_configuration(
                "RPC URL must start with http or https",
            ));
        }

        self.program_id()?;
        self.commitment_config()?;

        Ok(())
    }

    /// Get the journal program ID as a Pubkey
    pub fn program_id(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.program_id).map_err(|_| {
            JournalError::invalid_configuration(format!("Invalid program ID: {}", self.program_id))
        })
    }

    /// Get the configured commitment
    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        let commitment = CommitmentLevel::from_str(&self.commitment).map_err(|_| {
            JournalError::invalid_configuration(format!(
                "Unknown commitment level: {}",
                self.commitment
            ))
        })?;
        Ok(CommitmentConfig { commitment })
    }

    /// Load the keypair from the configured path
    pub fn load_keypair(&self) -> Result<Keypair> {
        let path = self
            .keypair_path
            .as_deref()
            .ok_or_else(|| JournalError::invalid_configuration("No keypair path configured"))?;
        read_keypair_file(path).map_err(|e| {
            JournalError::invalid_configuration(format!("Failed to read keypair file {path}: {e}"))
        })
    }
}

// Default values
fn default_rpc_url() -> String { "http://127.0.0.1:8899".to_string() }
fn default_commitment() -> String { "processed".to_string() }
fn default_program_id() -> String { PROGRAM_ID.to_string() }
fn default_filter_by_discriminator() -> bool { true }
