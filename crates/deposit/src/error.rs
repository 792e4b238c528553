//! Deposit error types

use std::io;

use stakekit_crypto::{
    BlsError, KeyDerivationError, KeystoreError, MnemonicError, SigningError,
};
use thiserror::Error;

/// Errors raised while merkleizing chunks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// More leaves than a tree of the requested depth can hold
    #[error("too many chunks for depth {depth}: {count} > {capacity}")]
    TooManyChunks {
        count: usize,
        depth: usize,
        capacity: u64,
    },

    /// Depth beyond the precomputed zero-hash table
    #[error("merkle depth {depth} exceeds maximum {max}")]
    DepthTooLarge { depth: usize, max: usize },

    /// Leaf index outside the tree
    #[error("leaf index {index} out of range for {len} leaves")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised while decoding a deposit data record
#[derive(Debug, Error)]
pub enum DepositError {
    /// Field is not valid hex or has the wrong width
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Stored root does not match the recomputed one
    #[error("deposit data root mismatch: expected {expected}, computed {computed}")]
    RootMismatch { expected: String, computed: String },

    /// JSON encoding error
    #[error("deposit data JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while deriving, encrypting and saving validator credentials
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),

    #[error(transparent)]
    KeyDerivation(#[from] KeyDerivationError),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error(transparent)]
    Bls(#[from] BlsError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Deposit(#[from] DepositError),

    /// Failed to write credentials to disk
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for Merkle operations
pub type MerkleResult<T> = Result<T, MerkleError>;

/// Result type for deposit data operations
pub type DepositResult<T> = Result<T, DepositError>;

/// Result type for credential operations
pub type CredentialResult<T> = Result<T, CredentialError>;
