//! Cryptographic error types

use thiserror::Error;

/// BLS12-381 primitive errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlsError {
    /// Invalid secret key bytes (zero, or not below the curve order)
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    /// Invalid public key bytes
    #[error("invalid public key bytes")]
    InvalidPublicKey,

    /// Invalid signature bytes
    #[error("invalid signature bytes")]
    InvalidSignature,

    /// Signature verification failed
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Errors raised while walking the key tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyDerivationError {
    /// Seed shorter than the 32 bytes HKDF needs for a sound master key
    #[error("invalid seed length: expected at least {min} bytes, got {actual}")]
    InvalidSeedLength { min: usize, actual: usize },

    /// Malformed textual derivation path
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// Derivation produced the zero scalar
    #[error("derived key is zero")]
    ZeroKey,

    /// Derived scalar rejected by the curve library
    #[error(transparent)]
    Bls(#[from] BlsError),
}

/// Errors raised while producing or checking a domain-separated signature
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// Domain type or fork version of the wrong width
    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidDomainLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Key material of the wrong width
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Signature does not verify under the given public key and domain
    #[error("signature does not verify for the signing root")]
    InvalidSignature,

    /// Underlying curve library error
    #[error(transparent)]
    Bls(#[from] BlsError),
}

/// Result type for key tree operations
pub type KeyDerivationResult<T> = Result<T, KeyDerivationError>;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;
