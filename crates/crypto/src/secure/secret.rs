//! Zeroizing containers
//!
//! Heap secrets (passwords, KDF output, decrypted payloads) use `secrecy`
//! boxes. Fixed-width secrets (seeds, scalars) use [`SecretArray`], which
//! keeps the bytes inline and wipes them on drop.

use secrecy::{SecretBox, SecretString as SecrecySecretString};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Heap byte buffer wiped on drop.
///
/// ```rust
/// use stakekit_crypto::secure::SecretBytes;
/// use secrecy::ExposeSecret;
///
/// let dk = SecretBytes::new(Box::new(vec![0u8; 32]));
/// assert_eq!(dk.expose_secret().len(), 32);
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// String wiped on drop; holds passwords and mnemonic phrases.
pub type SecretString = SecrecySecretString;

/// Inline `N`-byte secret wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretArray<const N: usize> {
    bytes: [u8; N],
}

/// BIP-39 seed.
pub type Seed = SecretArray<64>;

impl<const N: usize> SecretArray<N> {
    /// Take ownership of `bytes`.
    pub fn new(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// All-zero buffer for KDFs that write their output in place.
    pub fn zeroed() -> Self {
        Self::new([0u8; N])
    }

    /// Borrow the bytes. Do not keep the borrow around.
    pub fn expose_secret(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Borrow the bytes mutably.
    pub fn expose_secret_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }
}

impl<const N: usize> std::fmt::Debug for SecretArray<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretArray<{}>(***)", N)
    }
}

/// Move an owned value into its zeroizing counterpart.
pub trait IntoSecret {
    type Secret;

    fn into_secret(self) -> Self::Secret;
}

impl IntoSecret for String {
    type Secret = SecretString;

    fn into_secret(self) -> SecretString {
        SecretString::from(self)
    }
}

impl IntoSecret for Vec<u8> {
    type Secret = SecretBytes;

    fn into_secret(self) -> SecretBytes {
        SecretBytes::new(Box::new(self))
    }
}
