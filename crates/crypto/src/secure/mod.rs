//! Secure memory handling for key material
//!
//! Containers for seeds, private keys, passwords and KDF output with:
//! - Automatic zeroing on drop via `zeroize`
//! - Debug output masking to prevent log exposure
//! - No `Clone`, so every copy is an explicit `expose_secret()`
//!
//! # Security Properties
//!
//! - Buffers are zeroized when dropped, including on error paths and panics
//! - Debug output shows `[REDACTED]` instead of secret bytes
//!
//! # Example
//!
//! ```rust
//! use stakekit_crypto::secure::Seed;
//!
//! let seed = Seed::new([7u8; 64]);
//! assert_eq!(seed.expose_secret().len(), 64);
//! drop(seed); // Memory is zeroed here
//! ```

mod secret;

pub use secret::{IntoSecret, SecretArray, SecretBytes, SecretString, Seed};

pub use secrecy::ExposeSecret;
