//! Password KDFs for keystores
//!
//! scrypt and PBKDF2-HMAC-SHA256 as used by EIP-2335 keystores. Parameters
//! are always read from the keystore itself, so low-cost test keystores and
//! legacy files with `r = 1` decrypt like any other.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use super::error::{KeystoreError, KeystoreResult};
use super::romix;
use crate::secure::SecretBytes;

/// Default scrypt cost (2^18)
pub const SCRYPT_N: u32 = 262144;
/// Default scrypt block size
pub const SCRYPT_R: u32 = 1;
/// Default scrypt parallelization
pub const SCRYPT_P: u32 = 8;

/// Default PBKDF2 iteration count (2^18)
pub const PBKDF2_C: u32 = 262144;
/// The only supported PBKDF2 pseudo-random function
pub const PBKDF2_PRF: &str = "hmac-sha256";

/// Output length
pub const DKLEN: u32 = 32;

/// Largest scrypt working set, `128 * r * (n + p)` bytes, a keystore may ask for (1 GiB)
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;
/// Largest PBKDF2 iteration count a keystore may ask for
pub const MAX_PBKDF2_C: u32 = 1 << 24;
/// Largest derived key length a keystore may ask for
pub const MAX_DKLEN: u32 = 1024;

/// Bytes of salt drawn for new keystores
pub const SALT_LENGTH: usize = 32;

/// Password-based key derivation function selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfKind {
    /// scrypt (RFC 7914)
    #[default]
    Scrypt,
    /// PBKDF2 with HMAC-SHA256
    Pbkdf2,
}

impl KdfKind {
    /// Keystore `function` identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            KdfKind::Scrypt => "scrypt",
            KdfKind::Pbkdf2 => "pbkdf2",
        }
    }

    /// Parse a keystore `function` identifier
    pub fn from_function(function: &str) -> Option<Self> {
        [KdfKind::Scrypt, KdfKind::Pbkdf2]
            .into_iter()
            .find(|kind| function.eq_ignore_ascii_case(kind.as_str()))
    }
}

/// `kdf` section of a keystore
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfModule {
    /// KDF function identifier (`"scrypt"` or `"pbkdf2"`)
    pub function: String,
    /// Function parameters
    pub params: KdfParams,
    /// Always empty
    pub message: String,
}

impl KdfModule {
    /// Default-cost module of the given kind
    pub fn new(kind: KdfKind, salt: &[u8]) -> Self {
        let params = match kind {
            KdfKind::Scrypt => KdfParams::scrypt(SCRYPT_N, SCRYPT_R, SCRYPT_P, salt),
            KdfKind::Pbkdf2 => KdfParams::pbkdf2(PBKDF2_C, salt),
        };
        Self::from_params(params)
    }

    /// Module for explicit parameters; the function name follows the variant
    pub fn from_params(params: KdfParams) -> Self {
        Self {
            function: params.kind().as_str().to_string(),
            params,
            message: String::new(),
        }
    }

    /// Which KDF this module names
    pub fn kind(&self) -> KeystoreResult<KdfKind> {
        KdfKind::from_function(&self.function)
            .ok_or_else(|| KeystoreError::UnsupportedFunction(self.function.clone()))
    }

    /// Derive the decryption key from `password`
    ///
    /// The password is used as its UTF-8 bytes.
    pub fn derive_key(&self, password: &str) -> KeystoreResult<SecretBytes> {
        if self.kind()? != self.params.kind() {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "{} module carries {} parameters",
                self.function,
                self.params.kind().as_str()
            )));
        }
        self.params.validate()?;
        debug!(kdf = self.params.kind().as_str(), "deriving keystore decryption key");

        match &self.params {
            KdfParams::Scrypt {
                dklen,
                n,
                r,
                p,
                salt,
            } => {
                let salt_bytes =
                    hex::decode(salt).map_err(|e| KeystoreError::HexError(e.to_string()))?;
                scrypt_derive_key(password, &salt_bytes, *n, *r, *p, *dklen as usize)
            }
            KdfParams::Pbkdf2 {
                dklen, c, salt, ..
            } => {
                let salt_bytes =
                    hex::decode(salt).map_err(|e| KeystoreError::HexError(e.to_string()))?;
                Ok(pbkdf2_derive_key(password, &salt_bytes, *c, *dklen as usize))
            }
        }
    }
}

/// Parameters of either KDF, told apart by their fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum KdfParams {
    /// scrypt parameters
    Scrypt {
        /// Output length
        dklen: u32,
        /// Cost, a power of two
        n: u32,
        /// Block factor
        r: u32,
        /// Lane count
        p: u32,
        /// Hex salt
        salt: String,
    },
    /// PBKDF2 parameters
    Pbkdf2 {
        /// Output length
        dklen: u32,
        /// Iteration count
        c: u32,
        /// Pseudo-random function, `"hmac-sha256"`
        prf: String,
        /// Hex salt
        salt: String,
    },
}

impl KdfParams {
    /// scrypt parameters with a 32-byte output
    pub fn scrypt(n: u32, r: u32, p: u32, salt: &[u8]) -> Self {
        KdfParams::Scrypt {
            dklen: DKLEN,
            n,
            r,
            p,
            salt: hex::encode(salt),
        }
    }

    /// PBKDF2-HMAC-SHA256 parameters with a 32-byte output
    pub fn pbkdf2(c: u32, salt: &[u8]) -> Self {
        KdfParams::Pbkdf2 {
            dklen: DKLEN,
            c,
            prf: PBKDF2_PRF.to_string(),
            salt: hex::encode(salt),
        }
    }

    /// Which KDF these parameters belong to
    pub fn kind(&self) -> KdfKind {
        match self {
            KdfParams::Scrypt { .. } => KdfKind::Scrypt,
            KdfParams::Pbkdf2 { .. } => KdfKind::Pbkdf2,
        }
    }

    /// Replace the salt
    pub fn with_salt(mut self, new_salt: &[u8]) -> Self {
        match &mut self {
            KdfParams::Scrypt { salt, .. } | KdfParams::Pbkdf2 { salt, .. } => {
                *salt = hex::encode(new_salt);
            }
        }
        self
    }

    /// Reject parameters the KDF cannot run with
    pub fn validate(&self) -> KeystoreResult<()> {
        let (dklen, salt) = match self {
            KdfParams::Scrypt {
                dklen, n, r, p, salt,
            } => {
                if *n < 2 || !n.is_power_of_two() {
                    return Err(KeystoreError::InvalidKdfParams(
                        "n must be a power of 2 greater than 1".to_string(),
                    ));
                }
                if *r == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "scrypt r is zero".to_string(),
                    ));
                }
                if *p == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "scrypt p is zero".to_string(),
                    ));
                }
                scrypt_working_set(*n, *r, *p)?;
                (dklen, salt)
            }
            KdfParams::Pbkdf2 {
                dklen, c, prf, salt,
            } => {
                if !prf.eq_ignore_ascii_case(PBKDF2_PRF) {
                    return Err(KeystoreError::UnsupportedFunction(prf.clone()));
                }
                if *c == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "c must be positive".to_string(),
                    ));
                }
                if *c > MAX_PBKDF2_C {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "pbkdf2 c={c} exceeds {MAX_PBKDF2_C}"
                    )));
                }
                (dklen, salt)
            }
        };

        // The checksum consumes dk[16..32]
        if *dklen < DKLEN || *dklen > MAX_DKLEN {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "dklen must be between {DKLEN} and {MAX_DKLEN}"
            )));
        }
        hex::decode(salt)
            .map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e)))?;
        Ok(())
    }
}

/// Bytes scrypt allocates for `n`, `r` and `p`
///
/// # Errors
///
/// `InvalidKdfParams` above [`MAX_SCRYPT_MEMORY`].
pub fn scrypt_working_set(n: u32, r: u32, p: u32) -> KeystoreResult<u64> {
    let bytes = 128u128 * u128::from(r) * (u128::from(n) + u128::from(p));
    if bytes > u128::from(MAX_SCRYPT_MEMORY) {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "scrypt n={n} r={r} p={p} needs {bytes} bytes, limit is {MAX_SCRYPT_MEMORY}"
        )));
    }
    Ok(bytes as u64)
}

/// scrypt over the raw password bytes
///
/// Parameter sets accepted by the `scrypt` crate go through it; the rest
/// (notably `r = 1` with `n = 2^18`) are computed locally.
///
/// # Arguments
///
/// * `password` - User password
/// * `salt` - Salt bytes
/// * `n` - cost, a power of two above 1
/// * `r` - block factor
/// * `p` - lane count
/// * `dklen` - output length
///
/// # Returns
///
/// `dklen` zeroizing bytes
pub fn scrypt_derive_key(
    password: &str,
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    if n < 2 || !n.is_power_of_two() || r == 0 || p == 0 {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "unusable scrypt parameters n={n} r={r} p={p}"
        )));
    }
    let working_set = scrypt_working_set(n, r, p)?;
    let log_n = n.trailing_zeros() as u8;

    let mut output = vec![0u8; dklen];
    match scrypt::Params::new(log_n, r, p, dklen) {
        Ok(params) => {
            scrypt::scrypt(password.as_bytes(), salt, &params, &mut output)
                .map_err(|e| KeystoreError::KdfError(e.to_string()))?;
        }
        Err(_) => {
            debug!(n, r, p, working_set, "scrypt parameters outside crate bounds, using local ROMix");
            romix::scrypt(
                password.as_bytes(),
                salt,
                log_n,
                r as usize,
                p as usize,
                &mut output,
            );
        }
    }

    Ok(SecretBox::new(Box::new(output)))
}

/// Derive a key using PBKDF2-HMAC-SHA256
pub fn pbkdf2_derive_key(password: &str, salt: &[u8], c: u32, dklen: usize) -> SecretBytes {
    let mut output = vec![0u8; dklen];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, c, &mut output);
    SecretBox::new(Box::new(output))
}

/// Fresh random salt
pub fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
