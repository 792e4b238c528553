//! EIP-2335 keystore
//!
//! Combines the KDF, cipher and checksum modules into one JSON document that
//! holds a secret (normally a BLS private key) encrypted under a password.

use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::checksum::ChecksumModule;
use super::cipher::{CipherKind, CipherModule};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{generate_salt, KdfKind, KdfModule, KdfParams};
use crate::secure::{SecretBytes, SecretString};

/// Version number written into new keystores
pub const KEYSTORE_VERSION: u32 = 4;

/// Password-encrypted secret in EIP-2335 layout
///
/// Every call to [`Keystore::encrypt`] or [`KeystoreBuilder::build`] returns
/// a fresh, independently owned value with its own id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keystore {
    /// Crypto parameters (KDF + checksum + cipher)
    pub crypto: CryptoModule,
    /// Free-form label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex public key of the stored secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// Derivation path (if derived from a mnemonic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unique identifier (UUID v4 for new keystores)
    #[serde(alias = "uuid")]
    pub id: String,
    /// Format version; 4 when written here
    pub version: u32,
}

/// `kdf`, `checksum` and `cipher` sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CryptoModule {
    /// Password KDF
    pub kdf: KdfModule,
    /// Password check
    pub checksum: ChecksumModule,
    /// Cipher and ciphertext
    pub cipher: CipherModule,
}

impl Keystore {
    /// Encrypt a secret with default-cost parameters
    ///
    /// # Arguments
    ///
    /// * `secret` - plaintext, normally a 32-byte BLS scalar
    /// * `password` - The password to derive the decryption key from
    /// * `kdf` - scrypt or PBKDF2
    /// * `cipher` - AES-128-CTR or XOR
    /// * `kdf_salt` - Salt to use instead of 32 random bytes
    /// * `cipher_iv` - IV to use instead of 16 random bytes (AES only)
    ///
    /// # Returns
    ///
    /// New Keystore ready to be saved
    pub fn encrypt(
        secret: &[u8],
        password: &str,
        kdf: KdfKind,
        cipher: CipherKind,
        kdf_salt: Option<&[u8]>,
        cipher_iv: Option<&[u8]>,
    ) -> KeystoreResult<Self> {
        let mut builder = KeystoreBuilder::new()
            .secret(secret)
            .password(password)
            .kdf(kdf)
            .cipher(cipher);
        if let Some(salt) = kdf_salt {
            builder = builder.salt(salt);
        }
        if let Some(iv) = cipher_iv {
            builder = builder.iv(iv);
        }
        builder.build()
    }

    /// Open the keystore with `password`
    ///
    /// The checksum is verified before any decryption takes place.
    ///
    /// # Errors
    ///
    /// `ChecksumMismatch` for a wrong password or modified ciphertext.
    pub fn decrypt(&self, password: &str) -> KeystoreResult<SecretBytes> {
        let cipher_kind = self.crypto.cipher.kind()?;
        self.crypto.cipher.params.validate(cipher_kind)?;

        let derived_key = self.crypto.kdf.derive_key(password)?;
        let dk_bytes = derived_key.expose_secret();

        let ciphertext = self.crypto.cipher.ciphertext()?;
        self.crypto.checksum.verify(dk_bytes, &ciphertext)?;

        self.crypto.cipher.decrypt(dk_bytes)
    }

    /// Parse keystore JSON
    ///
    /// # Errors
    ///
    /// `UnsupportedFunction` for an unknown kdf, checksum or cipher function,
    /// `MalformedJson` for invalid JSON or missing fields.
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        check_functions(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as pretty JSON
    ///
    /// On Unix the file is made readable by its owner only.
    ///
    /// # Arguments
    ///
    /// * `path` - destination file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KeystoreResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_json()?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, permissions)?;
        }

        debug!(path = %path.display(), id = %self.id, "saved keystore");
        Ok(())
    }

    /// Read and parse a keystore file
    pub fn load<P: AsRef<Path>>(path: P) -> KeystoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Get the id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the public key if present
    pub fn pubkey(&self) -> Option<&str> {
        self.pubkey.as_deref()
    }

    /// Free-form label, when recorded
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// EIP-2334 path of the stored key, when recorded
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

fn check_functions(value: &Value) -> KeystoreResult<()> {
    let crypto = &value["crypto"];

    if let Some(function) = crypto["kdf"]["function"].as_str() {
        if KdfKind::from_function(function).is_none() {
            return Err(KeystoreError::UnsupportedFunction(function.to_string()));
        }
    }
    if let Some(function) = crypto["checksum"]["function"].as_str() {
        if !ChecksumModule::is_supported(function) {
            return Err(KeystoreError::UnsupportedFunction(function.to_string()));
        }
    }
    if let Some(function) = crypto["cipher"]["function"].as_str() {
        if CipherKind::from_function(function).is_none() {
            return Err(KeystoreError::UnsupportedFunction(function.to_string()));
        }
    }
    Ok(())
}

/// Builder for creating Keystore instances
#[derive(Default)]
pub struct KeystoreBuilder {
    secret: Option<SecretBytes>,
    password: Option<SecretString>,
    kdf: KdfKind,
    kdf_params: Option<KdfParams>,
    salt: Option<Vec<u8>>,
    cipher: CipherKind,
    iv: Option<Vec<u8>>,
    pubkey: Option<String>,
    description: Option<String>,
    path: Option<String>,
    id: Option<String>,
}

impl KeystoreBuilder {
    /// Builder with default KDF and cipher
    pub fn new() -> Self {
        Self::default()
    }

    /// Plaintext to protect
    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(SecretBox::new(Box::new(secret.to_vec())));
        self
    }

    /// Set the password for key derivation
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(SecretString::from(password.to_string()));
        self
    }

    /// Select the KDF (default-cost parameters)
    pub fn kdf(mut self, kdf: KdfKind) -> Self {
        self.kdf = kdf;
        self
    }

    /// Use explicit KDF parameters, e.g. a low-cost setting for tests
    ///
    /// Overrides [`kdf`](Self::kdf). A salt set with [`salt`](Self::salt)
    /// still replaces the one carried here.
    pub fn kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = Some(params);
        self
    }

    /// Set the KDF salt (normally 32 random bytes)
    pub fn salt(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    /// Select the cipher
    pub fn cipher(mut self, cipher: CipherKind) -> Self {
        self.cipher = cipher;
        self
    }

    /// Set the AES IV (normally 16 random bytes)
    pub fn iv(mut self, iv: &[u8]) -> Self {
        self.iv = Some(iv.to_vec());
        self
    }

    /// Record the hex public key
    pub fn pubkey(mut self, pubkey: &str) -> Self {
        self.pubkey = Some(pubkey.to_string());
        self
    }

    /// Attach a label
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the derivation path (if derived from a mnemonic)
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Set a custom id (normally a random UUID v4)
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Derive the key, encrypt and checksum
    ///
    /// # Returns
    ///
    /// Keystore ready to be saved
    pub fn build(self) -> KeystoreResult<Keystore> {
        let secret = self.secret.ok_or(KeystoreError::MissingField("secret"))?;
        let password = self
            .password
            .ok_or(KeystoreError::MissingField("password"))?;

        let kdf = match (self.kdf_params, self.salt) {
            (Some(params), Some(salt)) => KdfModule::from_params(params.with_salt(&salt)),
            (Some(params), None) => KdfModule::from_params(params),
            (None, salt) => {
                let salt = salt.unwrap_or_else(generate_salt);
                KdfModule::new(self.kdf, &salt)
            }
        };

        debug!(
            kdf = %kdf.function,
            cipher = self.cipher.as_str(),
            path = self.path.as_deref().unwrap_or(""),
            "encrypting keystore"
        );

        let derived_key = kdf.derive_key(password.expose_secret())?;
        let dk_bytes = derived_key.expose_secret();

        let cipher = CipherModule::encrypt(
            self.cipher,
            secret.expose_secret(),
            dk_bytes,
            self.iv.as_deref(),
        )?;
        let checksum = ChecksumModule::compute(dk_bytes, &cipher.ciphertext()?)?;

        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Keystore {
            crypto: CryptoModule {
                kdf,
                checksum,
                cipher,
            },
            description: self.description,
            pubkey: self.pubkey,
            path: self.path,
            id,
            version: KEYSTORE_VERSION,
        })
    }
}
