//! Error types for the journal SDK
//!
//! Every failure a public operation can produce is a distinct variant, so
//! callers can tell a missing wallet from a missing record from a network
//! outage without string matching.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Failures while turning raw account bytes into a [`crate::JournalEntry`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Bad discriminator: expected {expected:?}, found {found:?}")]
    BadDiscriminator { expected: [u8; 8], found: Vec<u8> },

    #[error("Truncated account data: {field} needs {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },
}

/// Main error type for the journal SDK
#[derive(Error, Debug)]
pub enum JournalError {
    // Identity Errors (1000-1099)
    #[error("No signing identity is available")]
    IdentityUnavailable,

    #[error("Identity connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("User rejected the signing request: {0}")]
    UserRejected(String),

    #[error("Signing unavailable: {0}")]
    SigningUnavailable(String),

    // Validation Errors (3000-3099)
    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("No valid program address for seeds")]
    AddressDerivation,

    // Record Errors (4000-4099)
    #[error("Journal entry not found: {0}")]
    NotFound(Pubkey),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // Program Errors (6000-6099)
    #[error("Rejected by program: {0}")]
    RejectedByProgram(String),

    // SDK Errors (8000-8099)
    #[error("Invalid SDK configuration: {0}")]
    InvalidConfiguration(String),

    #[error("RPC error: {0}")]
    Rpc(Box<solana_client::client_error::ClientError>),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl JournalError {
    /// Get the error code for this error
    pub fn code(&self) -> u32 {
        match self {
            JournalError::IdentityUnavailable => 1000,
            JournalError::ConnectionRejected(_) => 1001,
            JournalError::UserRejected(_) => 1002,
            JournalError::SigningUnavailable(_) => 1003,

            JournalError::InvalidTitle(_) => 3000,
            JournalError::InvalidContent(_) => 3001,
            JournalError::AddressDerivation => 3002,

            JournalError::NotFound(_) => 4000,
            JournalError::Decode(DecodeError::BadDiscriminator { .. }) => 4001,
            JournalError::Decode(DecodeError::Truncated { .. }) => 4002,
            JournalError::Decode(DecodeError::InvalidUtf8 { .. }) => 4003,

            JournalError::RejectedByProgram(_) => 6000,

            JournalError::InvalidConfiguration(_) => 8000,
            JournalError::Rpc(_) => 8001,
            JournalError::Serialization(_) => 8002,
        }
    }

    /// Create a new configuration error
    pub fn invalid_configuration<T: std::fmt::Display>(msg: T) -> Self {
        JournalError::InvalidConfiguration(msg.to_string())
    }

    /// Whether the failure happened before anything reached the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            JournalError::IdentityUnavailable
                | JournalError::InvalidTitle(_)
                | JournalError::InvalidContent(_)
                | JournalError::AddressDerivation
                | JournalError::InvalidConfiguration(_)
                | JournalError::Serialization(_)
        )
    }
}

impl From<solana_client::client_error::ClientError> for JournalError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        // A transaction error means the request arrived and was refused.
        match err.get_transaction_error() {
            Some(tx_err) => Self::RejectedByProgram(tx_err.to_string()),
            None => Self::Rpc(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for JournalError {
    fn from(err: std::io::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, JournalError>;
