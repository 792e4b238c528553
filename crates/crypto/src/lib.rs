//! Cryptographic primitives for validator credentials
//!
//! This crate provides:
//! - BIP-39 mnemonic generation and seed derivation
//! - EIP-2333 hierarchical BLS12-381 key derivation over EIP-2334 paths
//! - BLS12-381 proof-of-possession signatures behind a `Signer` trait
//! - EIP-2335 password-encrypted keystores (scrypt/PBKDF2, AES-128-CTR/XOR)
//! - Zeroizing containers for every secret on those paths

pub mod bls;
pub mod error;
pub mod keystore;
pub mod mnemonic;
pub mod secure;
pub mod tree;

// BLS12-381 exports
pub use bls::{
    BlsPublicKey, BlsSecretKey, BlsSignature, LocalSigner, Signer, DST_POP, PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};

// Error exports
pub use error::{
    BlsError, KeyDerivationError, KeyDerivationResult, SigningError, SigningResult,
};

// Secure memory exports
pub use secure::{ExposeSecret, IntoSecret, SecretArray, SecretBytes, SecretString, Seed};

// Keystore exports
pub use keystore::{CipherKind, KdfKind, KdfParams, Keystore, KeystoreBuilder, KeystoreError};

// Mnemonic exports
pub use mnemonic::{Mnemonic, MnemonicError};

// Key tree exports
pub use tree::{
    derive_child, derive_master, derive_path, derive_validator_secrets, mnemonic_and_path_to_key,
    SecretScalar, ValidatorSecrets,
};
