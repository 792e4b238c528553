//! EIP-2335 compatible encrypted keystore implementation
//!
//! A keystore holds a secret encrypted under a password:
//!
//! - scrypt or PBKDF2-HMAC-SHA256 derives a key from the password
//! - AES-128-CTR (or XOR) encrypts the secret with that key
//! - SHA-256 over `dk[16..32] || ciphertext` detects a wrong password
//!
//! # Security
//!
//! The checksum is compared in constant time and checked before the
//! ciphertext is decrypted. Derived keys and plaintexts are returned in
//! zeroizing containers.
//!
//! # Example
//!
//! ```rust,ignore
//! use stakekit_crypto::keystore::{CipherKind, KdfKind, Keystore};
//!
//! let keystore = Keystore::encrypt(&secret_key_bytes, "password", KdfKind::Scrypt, CipherKind::Aes128Ctr, None, None)?;
//! keystore.save("./validator_keys/keystore-m_12381_3600_0_0_0.json")?;
//!
//! let loaded = Keystore::load("./validator_keys/keystore-m_12381_3600_0_0_0.json")?;
//! let secret = loaded.decrypt("password")?;
//! ```

mod checksum;
mod cipher;
mod encrypted;
mod error;
mod kdf;
mod romix;

pub use checksum::{compute_checksum, verify_checksum, ChecksumModule, ChecksumParams};
pub use cipher::{
    decrypt_secret, encrypt_secret, generate_iv, CipherKind, CipherModule, CipherParams,
    IV_LENGTH,
};
pub use encrypted::{CryptoModule, Keystore, KeystoreBuilder, KEYSTORE_VERSION};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{
    generate_salt, pbkdf2_derive_key, scrypt_derive_key, scrypt_working_set, KdfKind, KdfModule,
    KdfParams, DKLEN, MAX_DKLEN, MAX_PBKDF2_C, MAX_SCRYPT_MEMORY, PBKDF2_C, PBKDF2_PRF,
    SALT_LENGTH, SCRYPT_N, SCRYPT_P, SCRYPT_R,
};
