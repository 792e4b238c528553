//! Symmetric ciphers for keystore encryption
//!
//! AES-128-CTR keyed with `dk[0..16]` and a 16-byte IV, and a plain XOR
//! stream with the whole derived key (secret no longer than the key, no IV).

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use rand::RngCore;
use secrecy::{ExposeSecret, ExposeSecretMut, SecretBox};
use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// Counter block width
pub const IV_LENGTH: usize = 16;

/// Bytes of the derived key that key AES
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// Cipher selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherKind {
    /// AES-128 in big-endian counter mode
    #[default]
    #[serde(rename = "aes-128-ctr")]
    Aes128Ctr,
    /// XOR with the derived key
    #[serde(rename = "xor")]
    Xor,
}

impl CipherKind {
    /// Keystore `function` identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherKind::Aes128Ctr => "aes-128-ctr",
            CipherKind::Xor => "xor",
        }
    }

    /// Parse a keystore `function` identifier
    pub fn from_function(function: &str) -> Option<Self> {
        [CipherKind::Aes128Ctr, CipherKind::Xor]
            .into_iter()
            .find(|kind| function.eq_ignore_ascii_case(kind.as_str()))
    }
}

/// `cipher` section of a keystore
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherModule {
    /// `"aes-128-ctr"` or `"xor"`
    pub function: String,
    pub params: CipherParams,
    /// Hex ciphertext
    pub message: String,
}

impl CipherModule {
    /// Encrypt `secret` under the derived key
    ///
    /// `iv` is only used by AES-128-CTR; a random one is drawn when absent.
    pub fn encrypt(
        kind: CipherKind,
        secret: &[u8],
        derived_key: &[u8],
        iv: Option<&[u8]>,
    ) -> KeystoreResult<Self> {
        match kind {
            CipherKind::Aes128Ctr => {
                let iv = iv.map(<[u8]>::to_vec).unwrap_or_else(generate_iv);
                let ciphertext = encrypt_secret(secret, derived_key, &iv)?;
                Ok(Self {
                    function: kind.as_str().to_string(),
                    params: CipherParams {
                        iv: Some(hex::encode(&iv)),
                    },
                    message: hex::encode(ciphertext),
                })
            }
            CipherKind::Xor => {
                let ciphertext = xor_secret(secret, derived_key)?;
                Ok(Self {
                    function: kind.as_str().to_string(),
                    params: CipherParams { iv: None },
                    message: hex::encode(ciphertext.expose_secret()),
                })
            }
        }
    }

    /// Which cipher this module names
    pub fn kind(&self) -> KeystoreResult<CipherKind> {
        CipherKind::from_function(&self.function)
            .ok_or_else(|| KeystoreError::UnsupportedFunction(self.function.clone()))
    }

    /// Decoded IV
    pub fn iv(&self) -> KeystoreResult<Vec<u8>> {
        let iv = self.params.iv.as_deref().ok_or_else(|| {
            KeystoreError::InvalidCipherParams(format!("{} has no iv", self.function))
        })?;
        hex::decode(iv).map_err(|e| KeystoreError::HexError(format!("cipher iv: {e}")))
    }

    /// Decoded ciphertext
    pub fn ciphertext(&self) -> KeystoreResult<Vec<u8>> {
        hex::decode(&self.message)
            .map_err(|e| KeystoreError::HexError(format!("cipher message: {e}")))
    }

    /// Recover the plaintext with the derived key
    pub fn decrypt(&self, derived_key: &[u8]) -> KeystoreResult<SecretBytes> {
        let ciphertext = self.ciphertext()?;
        match self.kind()? {
            CipherKind::Aes128Ctr => decrypt_secret(&ciphertext, derived_key, &self.iv()?),
            CipherKind::Xor => xor_secret(&ciphertext, derived_key),
        }
    }
}

/// `{"iv": "<hex>"}` for AES-128-CTR, `{}` for XOR
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
}

impl CipherParams {
    /// Reject parameters `kind` cannot run with
    pub fn validate(&self, kind: CipherKind) -> KeystoreResult<()> {
        match (kind, &self.iv) {
            (CipherKind::Aes128Ctr, Some(iv)) => {
                let iv = hex::decode(iv)
                    .map_err(|e| KeystoreError::InvalidCipherParams(format!("iv: {e}")))?;
                check_iv(&iv)
            }
            (CipherKind::Aes128Ctr, None) => Err(KeystoreError::InvalidCipherParams(
                "aes-128-ctr has no iv".to_string(),
            )),
            (CipherKind::Xor, _) => Ok(()),
        }
    }
}

fn check_iv(iv: &[u8]) -> KeystoreResult<()> {
    if iv.len() != IV_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "iv is {} bytes, want {IV_LENGTH}",
            iv.len()
        )));
    }
    Ok(())
}

fn xor_secret(input: &[u8], derived_key: &[u8]) -> KeystoreResult<SecretBytes> {
    if input.len() > derived_key.len() {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "xor cipher needs a secret no longer than the {}-byte key, got {}",
            derived_key.len(),
            input.len()
        )));
    }
    let output = input.iter().zip(derived_key).map(|(a, b)| a ^ b).collect();
    Ok(SecretBox::new(Box::new(output)))
}

fn aes_128_ctr(data: &mut [u8], key: &[u8], iv: &[u8]) -> KeystoreResult<()> {
    let aes_key = key.get(..AES_KEY_LENGTH).ok_or_else(|| {
        KeystoreError::InvalidCipherParams(format!(
            "derived key is {} bytes, aes needs {AES_KEY_LENGTH}",
            key.len()
        ))
    })?;
    check_iv(iv)?;

    let mut cipher = Aes128Ctr::new_from_slices(aes_key, iv)
        .map_err(|e| KeystoreError::InvalidCipherParams(e.to_string()))?;
    cipher.apply_keystream(data);
    Ok(())
}

/// AES-128-CTR encryption keyed with `encryption_key[..16]`
///
/// # Arguments
///
/// * `secret` - plaintext
/// * `encryption_key` - KDF output
/// * `iv` - counter block
pub fn encrypt_secret(secret: &[u8], encryption_key: &[u8], iv: &[u8]) -> KeystoreResult<Vec<u8>> {
    let mut ciphertext = secret.to_vec();
    aes_128_ctr(&mut ciphertext, encryption_key, iv)?;
    Ok(ciphertext)
}

/// Inverse of [`encrypt_secret`]; the plaintext comes back zeroizing
pub fn decrypt_secret(
    ciphertext: &[u8],
    decryption_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    let mut plaintext = SecretBox::new(Box::new(ciphertext.to_vec()));
    aes_128_ctr(plaintext.expose_secret_mut(), decryption_key, iv)?;
    Ok(plaintext)
}

/// Fresh random counter block
pub fn generate_iv() -> Vec<u8> {
    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    // PBKDF2-HMAC-SHA256("testpassword", 0x11 * 32, c=16)
    const DK: &str = "8d5a9061b2c3b69e26865d1d218422f67ae16dcaae9186dd02b896d768f5d7e0";
    const SECRET: &str = "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d";

    fn dk() -> Vec<u8> {
        hex::decode(DK).unwrap()
    }

    #[test]
    fn test_aes_vector() {
        let module = CipherModule::encrypt(
            CipherKind::Aes128Ctr,
            &hex::decode(SECRET).unwrap(),
            &dk(),
            Some(&[0x22; 16]),
        )
        .unwrap();
        assert_eq!(
            module.message,
            "fefccb595501a8fd9ef2737a67ec2d6b4956d8f2c629adb04c9165a6e0a349ef"
        );
        assert_eq!(module.params.iv.as_deref(), Some("22222222222222222222222222222222"));
        assert_eq!(hex::encode(module.decrypt(&dk()).unwrap().expose_secret()), SECRET);
    }

    #[test]
    fn test_xor_vector() {
        let module =
            CipherModule::encrypt(CipherKind::Xor, &hex::decode(SECRET).unwrap(), &dk(), None)
                .unwrap();
        assert_eq!(
            module.message,
            "f77225dbe506809d9636264b9a23700102aa98cc54046b1e974d59bb1de1297d"
        );
        assert_eq!(module.params.iv, None);
        assert_eq!(hex::encode(module.decrypt(&dk()).unwrap().expose_secret()), SECRET);
    }

    #[test]
    fn test_xor_rejects_long_secret() {
        let result = CipherModule::encrypt(CipherKind::Xor, &[0u8; 33], &dk(), None);
        assert!(matches!(result, Err(KeystoreError::InvalidCipherParams(_))));
    }

    #[test]
    fn test_xor_params_serialize_empty() {
        let module = CipherModule::encrypt(CipherKind::Xor, &[1u8; 32], &dk(), None).unwrap();
        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["params"], serde_json::json!({}));
        assert_eq!(json["function"], "xor");
    }

    #[test]
    fn test_ctr_keeps_length_across_blocks() {
        let key = dk();
        let iv = [0x5e; IV_LENGTH];
        for len in [0usize, 5, 16, 48, 95] {
            let plain: Vec<u8> = (0..len as u8).collect();
            let sealed = encrypt_secret(&plain, &key, &iv).unwrap();
            assert_eq!(sealed.len(), len);
            let opened = decrypt_secret(&sealed, &key, &iv).unwrap();
            assert_eq!(opened.expose_secret(), &plain);
        }
    }

    #[test]
    fn test_short_key_or_iv_rejected() {
        assert!(matches!(
            encrypt_secret(b"abc", &[1; 15], &[2; IV_LENGTH]),
            Err(KeystoreError::InvalidCipherParams(_))
        ));
        assert!(matches!(
            encrypt_secret(b"abc", &[1; 32], &[2; 12]),
            Err(KeystoreError::InvalidCipherParams(_))
        ));
    }

    #[test]
    fn test_params_validation() {
        let aes = CipherParams {
            iv: Some(hex::encode([0u8; 16])),
        };
        assert!(aes.validate(CipherKind::Aes128Ctr).is_ok());
        assert!(CipherParams::default()
            .validate(CipherKind::Aes128Ctr)
            .is_err());
        assert!(CipherParams::default().validate(CipherKind::Xor).is_ok());
        let short = CipherParams {
            iv: Some("00".to_string()),
        };
        assert!(short.validate(CipherKind::Aes128Ctr).is_err());
    }

    #[test]
    fn test_unknown_cipher() {
        let module = CipherModule {
            function: "aes-256-gcm".to_string(),
            params: CipherParams::default(),
            message: String::new(),
        };
        assert!(matches!(
            module.decrypt(&dk()),
            Err(KeystoreError::UnsupportedFunction(_))
        ));
    }

    #[test]
    fn test_random_iv_used_when_absent() {
        let a = CipherModule::encrypt(CipherKind::Aes128Ctr, &[7u8; 32], &dk(), None).unwrap();
        let b = CipherModule::encrypt(CipherKind::Aes128Ctr, &[7u8; 32], &dk(), None).unwrap();
        assert_eq!(a.iv().unwrap().len(), IV_LENGTH);
        assert_ne!(a.params.iv, b.params.iv);
        assert_ne!(a.message, b.message);
    }
}
