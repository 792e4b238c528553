//! Validator deposit generation
//!
//! This crate provides:
//! - SHA-256 Merkle roots, trees and proofs over 32-byte chunks
//! - Deposit messages, signing domains and signed deposit data records
//! - Per-validator credentials derived in parallel from one mnemonic
//! - `deposit.toml` configuration and tracing setup

pub mod config;
pub mod credentials;
pub mod deposit;
pub mod error;
pub mod logging;
pub mod merkle;

// Configuration exports
pub use config::{
    ChainConfig, DepositConfig, KeystoreConfig, LogConfig, ValidatorsConfig,
    DEPOSIT_CONFIG_FILENAME,
};

// Credential exports
pub use credentials::{
    keystore_filename, CredentialSet, KeyType, KeystoreOptions, ValidatorCredential,
    DEPOSIT_DATA_FILENAME,
};

// Deposit exports
pub use deposit::{
    compute_domain, deposit_data_from_json, deposit_data_to_json, pack_bytes, signing_root,
    withdrawal_credentials, DepositData, DepositDataJson, DepositMessage, Domain,
    BLS_WITHDRAWAL_PREFIX, DEPOSIT_AMOUNT_GWEI, DOMAIN_DEPOSIT, GENESIS_FORK_VERSION,
};

// Error exports
pub use error::{
    CredentialError, CredentialResult, DepositError, DepositResult, MerkleError, MerkleResult,
};

// Merkle exports
pub use merkle::{
    general_merkleize, general_merkleize_padded, hash_pair, merkle_proof, merkle_root,
    merkle_tree, verify_merkle_proof, zero_hash, Chunk, MAX_DEPTH, ZERO_HASHES,
};

pub use logging::init_tracing;
