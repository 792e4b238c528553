//! Validator credentials derived from a mnemonic
//!
//! Every validator `i` owns two keys from the EIP-2334 tree:
//!
//! - withdrawal key at `m/12381/3600/i/0`
//! - signing key at `m/12381/3600/i/0/0`
//!
//! A [`CredentialSet`] derives a contiguous range of validators, encrypts
//! their keys into keystores and produces the signed deposit data for them.
//!
//! # Security
//!
//! The seed is shared read-only between derivation workers and is zeroized
//! when the set has been built. Private keys live only inside
//! [`LocalSigner`]s; logs carry validator indices and paths, never key
//! material.
//!
//! # Example
//!
//! ```rust,ignore
//! use stakekit_deposit::{CredentialSet, KeystoreOptions, DEPOSIT_AMOUNT_GWEI, GENESIS_FORK_VERSION};
//!
//! let set = CredentialSet::from_mnemonic(&phrase, "", 0, 4, DEPOSIT_AMOUNT_GWEI)?;
//! set.save_keystores("./validator_keys", "keystore password", &KeystoreOptions::default(), false)?;
//! set.save_deposit_data("./validator_keys/deposit_data.json", &GENESIS_FORK_VERSION)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use secrecy::ExposeSecret;
use stakekit_crypto::keystore::generate_salt;
use stakekit_crypto::tree::{derive_validator_secrets, signing_path, withdrawal_path};
use stakekit_crypto::{
    BlsPublicKey, BlsSecretKey, CipherKind, KdfKind, KdfParams, KeyDerivationError, Keystore,
    KeystoreBuilder, LocalSigner, Mnemonic, Signer,
};
use tracing::{debug, info};

use crate::deposit::{
    compute_domain, deposit_data_to_json, withdrawal_credentials, DepositData, DepositMessage,
    DOMAIN_DEPOSIT,
};
use crate::error::{CredentialError, CredentialResult};
use crate::merkle::ZERO_HASHES;

/// Default name of the deposit data file
pub const DEPOSIT_DATA_FILENAME: &str = "deposit_data.json";

/// Which of a validator's two keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Signing,
    Withdrawal,
}

impl KeyType {
    /// Prefix used in keystore file names
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Signing => "signing",
            KeyType::Withdrawal => "withdrawal",
        }
    }
}

/// How keystores are encrypted
#[derive(Debug, Clone, Default)]
pub struct KeystoreOptions {
    /// KDF used with its default cost
    pub kdf: KdfKind,
    /// Explicit KDF cost; the salt is replaced with a fresh one per keystore
    pub kdf_params: Option<KdfParams>,
    pub cipher: CipherKind,
}

impl KeystoreOptions {
    /// Default-cost options for a KDF and cipher
    pub fn new(kdf: KdfKind, cipher: CipherKind) -> Self {
        Self {
            kdf,
            kdf_params: None,
            cipher,
        }
    }

    /// Use explicit KDF parameters
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf = params.kind();
        self.kdf_params = Some(params);
        self
    }
}

/// Keys and deposit amount of one validator
pub struct ValidatorCredential {
    /// Validator index in the key tree
    pub index: u32,
    /// Deposit amount in Gwei
    pub amount: u64,
    withdrawal: LocalSigner,
    signing: LocalSigner,
}

impl ValidatorCredential {
    /// Derive validator `index` from a seed
    ///
    /// # Arguments
    ///
    /// * `seed` - BIP-39 seed, at least 32 bytes
    /// * `index` - validator index
    /// * `amount` - deposit amount in Gwei
    pub fn derive(seed: &[u8], index: u32, amount: u64) -> CredentialResult<Self> {
        let secrets = derive_validator_secrets(seed, index)?;
        let withdrawal = BlsSecretKey::from_bytes(secrets.withdrawal.expose_secret())?;
        let signing = BlsSecretKey::from_bytes(secrets.signing.expose_secret())?;

        debug!(index, path = %signing_path(index), "derived validator keys");

        Ok(Self {
            index,
            amount,
            withdrawal: LocalSigner::new(withdrawal),
            signing: LocalSigner::new(signing),
        })
    }

    /// EIP-2334 path of the withdrawal key
    pub fn withdrawal_path(&self) -> String {
        withdrawal_path(self.index)
    }

    /// EIP-2334 path of the signing key
    pub fn signing_path(&self) -> String {
        signing_path(self.index)
    }

    /// Path of one of the two keys
    pub fn path(&self, key_type: KeyType) -> String {
        match key_type {
            KeyType::Signing => self.signing_path(),
            KeyType::Withdrawal => self.withdrawal_path(),
        }
    }

    /// Signer holding the validator signing key
    pub fn signer(&self) -> &LocalSigner {
        &self.signing
    }

    /// Validator public key
    pub fn signing_pubkey(&self) -> BlsPublicKey {
        self.signing.pubkey()
    }

    /// Withdrawal public key
    pub fn withdrawal_pubkey(&self) -> BlsPublicKey {
        self.withdrawal.pubkey()
    }

    /// BLS withdrawal credentials of this validator
    pub fn withdrawal_credentials(&self) -> [u8; 32] {
        withdrawal_credentials(&self.withdrawal_pubkey())
    }

    /// Unsigned deposit for this validator
    pub fn deposit_message(&self) -> DepositMessage {
        DepositMessage::new(
            &self.signing_pubkey(),
            self.withdrawal_credentials(),
            self.amount,
        )
    }

    /// Signed deposit under the deposit domain of `fork_version`
    pub fn deposit_data(&self, fork_version: &[u8]) -> CredentialResult<DepositData> {
        Ok(self
            .deposit_message()
            .sign(&self.signing, &DOMAIN_DEPOSIT, fork_version)?)
    }

    /// Encrypt one key into a keystore carrying its path and public key
    ///
    /// # Arguments
    ///
    /// * `key_type` - signing or withdrawal key
    /// * `password` - keystore password
    /// * `options` - KDF and cipher selection
    pub fn keystore(
        &self,
        key_type: KeyType,
        password: &str,
        options: &KeystoreOptions,
    ) -> CredentialResult<Keystore> {
        let signer = match key_type {
            KeyType::Signing => &self.signing,
            KeyType::Withdrawal => &self.withdrawal,
        };
        let secret = signer.secret_key().to_bytes();
        let pubkey = hex::encode(signer.pubkey().to_bytes());

        let mut builder = KeystoreBuilder::new()
            .secret(secret.expose_secret())
            .password(password)
            .kdf(options.kdf)
            .cipher(options.cipher)
            .path(&self.path(key_type))
            .pubkey(&pubkey);
        if let Some(params) = &options.kdf_params {
            builder = builder.kdf_params(params.clone()).salt(&generate_salt());
        }

        Ok(builder.build()?)
    }
}

impl std::fmt::Debug for ValidatorCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorCredential")
            .field("index", &self.index)
            .field("amount", &self.amount)
            .field("signing_pubkey", &self.signing_pubkey())
            .finish_non_exhaustive()
    }
}

/// Credentials of a contiguous range of validators
#[derive(Debug)]
pub struct CredentialSet {
    credentials: Vec<ValidatorCredential>,
}

impl CredentialSet {
    /// Derive validators `start_index..start_index + count` from a mnemonic
    ///
    /// # Arguments
    ///
    /// * `phrase` - BIP-39 mnemonic
    /// * `password` - optional mnemonic password (empty for none)
    /// * `start_index` - first validator index
    /// * `count` - number of validators
    /// * `amount` - deposit amount in Gwei for each validator
    pub fn from_mnemonic(
        phrase: &str,
        password: &str,
        start_index: u32,
        count: u32,
        amount: u64,
    ) -> CredentialResult<Self> {
        let mnemonic = Mnemonic::from_phrase(phrase)?;
        let seed = mnemonic.to_seed(password);
        Self::from_seed(seed.expose_secret(), start_index, count, amount)
    }

    /// Derive validators from an existing seed
    pub fn from_seed(
        seed: &[u8],
        start_index: u32,
        count: u32,
        amount: u64,
    ) -> CredentialResult<Self> {
        let end_index = start_index.checked_add(count).ok_or_else(|| {
            KeyDerivationError::InvalidPath(format!(
                "validator range {start_index}+{count} overflows u32"
            ))
        })?;

        info!(start_index, count, amount, "deriving validator credentials");

        // Build the table once here rather than racing on it in every worker
        Lazy::force(&ZERO_HASHES);

        let credentials: CredentialResult<Vec<_>> = (start_index..end_index)
            .into_par_iter()
            .map(|index| ValidatorCredential::derive(seed, index, amount))
            .collect();

        Ok(Self {
            credentials: credentials?,
        })
    }

    /// Credentials in index order
    pub fn credentials(&self) -> &[ValidatorCredential] {
        &self.credentials
    }

    /// Iterate in index order
    pub fn iter(&self) -> impl Iterator<Item = &ValidatorCredential> {
        self.credentials.iter()
    }

    /// Number of validators
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether the set holds no validators
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Encrypt every key of one type, in index order
    pub fn keystores(
        &self,
        key_type: KeyType,
        password: &str,
        options: &KeystoreOptions,
    ) -> CredentialResult<Vec<Keystore>> {
        info!(
            key_type = key_type.as_str(),
            count = self.len(),
            kdf = options.kdf.as_str(),
            "encrypting keystores"
        );
        self.credentials
            .par_iter()
            .map(|credential| credential.keystore(key_type, password, options))
            .collect()
    }

    /// Keystores of every signing key
    pub fn signing_keystores(
        &self,
        password: &str,
        options: &KeystoreOptions,
    ) -> CredentialResult<Vec<Keystore>> {
        self.keystores(KeyType::Signing, password, options)
    }

    /// Keystores of every withdrawal key
    pub fn withdrawal_keystores(
        &self,
        password: &str,
        options: &KeystoreOptions,
    ) -> CredentialResult<Vec<Keystore>> {
        self.keystores(KeyType::Withdrawal, password, options)
    }

    /// Signed deposit data of every validator, in index order
    pub fn deposit_data(&self, fork_version: &[u8]) -> CredentialResult<Vec<DepositData>> {
        let domain = compute_domain(&DOMAIN_DEPOSIT, fork_version)?;
        Ok(self
            .credentials
            .iter()
            .map(|credential| {
                credential
                    .deposit_message()
                    .sign_with_domain(credential.signer(), &domain)
            })
            .collect())
    }

    /// The `deposit_data.json` document
    pub fn deposit_data_json(&self, fork_version: &[u8]) -> CredentialResult<String> {
        Ok(deposit_data_to_json(&self.deposit_data(fork_version)?)?)
    }

    /// Write keystores into `dir`
    ///
    /// Files are named `{signing|withdrawal}-keystore-{path}.json` with `/`
    /// in the path replaced by `_`. Withdrawal keystores are written only
    /// when `save_withdrawal_keys` is set.
    ///
    /// # Returns
    ///
    /// Paths of the written files
    pub fn save_keystores<P: AsRef<Path>>(
        &self,
        dir: P,
        password: &str,
        options: &KeystoreOptions,
        save_withdrawal_keys: bool,
    ) -> CredentialResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut key_types = vec![KeyType::Signing];
        if save_withdrawal_keys {
            key_types.push(KeyType::Withdrawal);
        }

        let mut written = Vec::new();
        for key_type in key_types {
            for keystore in self.keystores(key_type, password, options)? {
                let path = dir.join(keystore_filename(key_type, keystore.path().unwrap_or("")));
                keystore.save(&path)?;
                written.push(path);
            }
        }

        info!(dir = %dir.display(), files = written.len(), "saved keystores");
        Ok(written)
    }

    /// Write the deposit data JSON to `path`
    pub fn save_deposit_data<P: AsRef<Path>>(
        &self,
        path: P,
        fork_version: &[u8],
    ) -> CredentialResult<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.deposit_data_json(fork_version)?)?;

        info!(path = %path.display(), count = self.len(), "saved deposit data");
        Ok(path.to_path_buf())
    }
}

/// File name of a keystore for the key at `path`
pub fn keystore_filename(key_type: KeyType, path: &str) -> String {
    format!("{}-keystore-{}.json", key_type.as_str(), path.replace('/', "_"))
}
