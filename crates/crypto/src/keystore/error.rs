//! Failures while reading, writing or opening a keystore

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Wrong password, or the file was modified
    #[error("keystore checksum mismatch (wrong password or corrupted file)")]
    ChecksumMismatch,

    /// `kdf`, `checksum` or `cipher` names a function outside the supported set
    #[error("unsupported keystore function {0:?}")]
    UnsupportedFunction(String),

    #[error("malformed keystore JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// KDF parameters outside what the function accepts
    #[error("bad kdf params: {0}")]
    InvalidKdfParams(String),

    /// IV or ciphertext unusable with the selected cipher
    #[error("bad cipher params: {0}")]
    InvalidCipherParams(String),

    /// The KDF itself failed
    #[error("kdf failure: {0}")]
    KdfError(String),

    /// A hex field did not decode
    #[error("hex decode: {0}")]
    HexError(String),

    /// [`KeystoreBuilder`](super::KeystoreBuilder) was built without this input
    #[error("keystore builder is missing {0}")]
    MissingField(&'static str),

    #[error("keystore file: {0}")]
    IoError(#[from] io::Error),
}

pub type KeystoreResult<T> = Result<T, KeystoreError>;
