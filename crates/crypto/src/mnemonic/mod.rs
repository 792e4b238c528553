//! BIP-39 mnemonic encoding and seed derivation
//!
//! Entropy of 128 to 256 bits is encoded as 12 to 24 words from the English
//! word list, and any phrase can be stretched into a 64-byte seed with
//! PBKDF2-HMAC-SHA512 after NFKD normalization.
//!
//! # Example
//!
//! ```rust
//! use stakekit_crypto::mnemonic::Mnemonic;
//!
//! let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
//! assert_eq!(
//!     mnemonic.phrase(),
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
//! );
//! let seed = mnemonic.to_seed("TREZOR");
//! assert_eq!(seed.expose_secret()[..4], [0xc5, 0x52, 0x57, 0xc3]);
//! ```
//!
//! # Security
//!
//! - The phrase is held in a `SecretString` and redacted from `Debug`
//! - Seeds are returned in a zeroizing [`Seed`](crate::secure::Seed)

mod codec;
mod error;

pub use codec::{
    generate, to_seed, word_list, Mnemonic, DEFAULT_ENTROPY_BITS, PBKDF2_ROUNDS,
    SUPPORTED_ENTROPY_BITS,
};
pub use error::{MnemonicError, MnemonicResult};
