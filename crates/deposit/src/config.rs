//! Deposit generation settings
//!
//! Settings that stay the same between runs live in a `deposit.toml` file,
//! so callers only supply the mnemonic and passwords.
//!
//! # Example deposit.toml
//!
//! ```toml
//! [chain]
//! # Fork version of the target chain (4 bytes, hex)
//! fork-version = "00000000"
//! # Deposit per validator in Gwei
//! amount-gwei = 32000000000
//!
//! [keystore]
//! # Password KDF (scrypt|pbkdf2)
//! kdf = "scrypt"
//! # Secret cipher (aes-128-ctr|xor)
//! cipher = "aes-128-ctr"
//!
//! [validators]
//! start-index = 0
//! count = 1
//! save-withdrawal-keys = false
//! output-dir = "validator_keys"
//!
//! [log]
//! # trace|debug|info|warn|error
//! level = "info"
//! # text|json
//! format = "text"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use stakekit_crypto::{CipherKind, KdfKind};
use std::path::{Path, PathBuf};

use crate::credentials::{KeystoreOptions, DEPOSIT_DATA_FILENAME};
use crate::deposit::DEPOSIT_AMOUNT_GWEI;

/// Default deposit configuration filename.
pub const DEPOSIT_CONFIG_FILENAME: &str = "deposit.toml";

/// Deposit generation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DepositConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub keystore: KeystoreConfig,

    #[serde(default)]
    pub validators: ValidatorsConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Target chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    /// Fork version mixed into the deposit domain, as 8 hex digits.
    #[serde(default = "default_fork_version")]
    pub fork_version: String,

    /// Deposit per validator in Gwei.
    #[serde(default = "default_amount_gwei")]
    pub amount_gwei: u64,
}

/// Keystore encryption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeystoreConfig {
    #[serde(default)]
    pub kdf: KdfKind,

    #[serde(default)]
    pub cipher: CipherKind,
}

/// Which validators to generate and where to put them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidatorsConfig {
    /// First validator index.
    #[serde(default)]
    pub start_index: u32,

    /// Number of validators.
    #[serde(default = "default_count")]
    pub count: u32,

    /// Also write keystores for the withdrawal keys.
    #[serde(default)]
    pub save_withdrawal_keys: bool,

    /// Directory receiving keystores and deposit data.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset (trace|debug|info|warn|error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (text|json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_fork_version() -> String {
    "00000000".to_string()
}

fn default_amount_gwei() -> u64 {
    DEPOSIT_AMOUNT_GWEI
}

fn default_count() -> u32 {
    1
}

fn default_output_dir() -> String {
    "validator_keys".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            fork_version: default_fork_version(),
            amount_gwei: default_amount_gwei(),
        }
    }
}

impl Default for ValidatorsConfig {
    fn default() -> Self {
        Self {
            start_index: 0,
            count: default_count(),
            save_withdrawal_keys: false,
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ChainConfig {
    /// Decode the fork version.
    pub fn fork_version_bytes(&self) -> Result<[u8; 4]> {
        let hex_str = self
            .fork_version
            .strip_prefix("0x")
            .unwrap_or(&self.fork_version);
        let bytes = hex::decode(hex_str)
            .with_context(|| format!("Invalid fork version hex: {}", self.fork_version))?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Fork version must be 4 bytes, got {len}"))
    }
}

impl KeystoreConfig {
    /// Default-cost keystore options for the configured KDF and cipher.
    pub fn options(&self) -> KeystoreOptions {
        KeystoreOptions::new(self.kdf, self.cipher)
    }
}

impl DepositConfig {
    /// Get the path to the config file under `home`.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join(DEPOSIT_CONFIG_FILENAME)
    }

    /// Load configuration from file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deposit config: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse deposit config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid deposit config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize deposit config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write deposit config: {}", path.display()))?;

        Ok(())
    }

    /// Check values the type system does not.
    pub fn validate(&self) -> Result<()> {
        self.chain.fork_version_bytes()?;
        if self.chain.amount_gwei == 0 {
            bail!("Deposit amount must be positive");
        }
        if self
            .validators
            .start_index
            .checked_add(self.validators.count)
            .is_none()
        {
            bail!(
                "Validator range {}+{} overflows",
                self.validators.start_index,
                self.validators.count
            );
        }
        Ok(())
    }

    /// Resolve the output directory against `home` when relative.
    pub fn effective_output_dir(&self, home: &Path) -> PathBuf {
        let dir = PathBuf::from(&self.validators.output_dir);
        if dir.is_absolute() {
            dir
        } else {
            home.join(dir)
        }
    }

    /// Path of the deposit data file inside the output directory.
    pub fn deposit_data_path(&self, home: &Path) -> PathBuf {
        self.effective_output_dir(home).join(DEPOSIT_DATA_FILENAME)
    }
}
