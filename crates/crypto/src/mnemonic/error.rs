//! Error types for mnemonic operations

use thiserror::Error;

/// Result type for mnemonic operations
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Errors that can occur while encoding or decoding a mnemonic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    /// Entropy size outside 128..=256 bits in 32-bit steps
    #[error("unsupported entropy length: {0} bits (must be 128, 160, 192, 224 or 256)")]
    UnsupportedEntropyLength(usize),

    /// Supplied entropy does not match the requested size
    #[error("entropy is {actual} bits but {expected} bits were requested")]
    EntropyLengthMismatch { expected: usize, actual: usize },

    /// Phrase word count does not correspond to a supported entropy size
    #[error("invalid word count: {0} (must be 12, 15, 18, 21 or 24)")]
    InvalidWordCount(usize),

    /// A word is not in the word list
    #[error("unknown word at position {index}: {word:?}")]
    UnknownWord { index: usize, word: String },

    /// Checksum bits do not match the entropy
    #[error("invalid mnemonic checksum")]
    InvalidChecksum,

    /// Any other rejection from the BIP-39 decoder
    #[error("invalid mnemonic phrase: {0}")]
    InvalidPhrase(String),
}
