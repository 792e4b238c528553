//! Password check for keystores
//!
//! The stored value is `SHA-256(dk[16..32] || ciphertext)`: the upper half of
//! the derived key never touches the cipher, so a match means both the
//! password and the ciphertext are the ones the keystore was written with.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::error::{KeystoreError, KeystoreResult};

/// Checksum function identifier written by this crate
pub const CHECKSUM_FUNCTION: &str = "sha256";

/// `checksum` section of a keystore
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecksumModule {
    /// Older files spell it `"SHA256"`
    pub function: String,
    pub params: ChecksumParams,
    /// Hex digest
    pub message: String,
}

/// Always `{}` on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChecksumParams {}

impl ChecksumModule {
    /// Wrap an already computed digest
    pub fn new(digest: &[u8]) -> Self {
        Self {
            function: CHECKSUM_FUNCTION.to_string(),
            params: ChecksumParams::default(),
            message: hex::encode(digest),
        }
    }

    /// Digest `derived_key` and `ciphertext` into a new section
    pub fn compute(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<Self> {
        Ok(Self::new(&compute_checksum(derived_key, ciphertext)?))
    }

    /// Whether `function` names SHA-256, ignoring case
    pub fn is_supported(function: &str) -> bool {
        function.eq_ignore_ascii_case(CHECKSUM_FUNCTION)
    }

    /// Decoded digest
    pub fn digest(&self) -> KeystoreResult<Vec<u8>> {
        hex::decode(&self.message)
            .map_err(|e| KeystoreError::HexError(format!("checksum message: {e}")))
    }

    /// Recompute and compare against the stored digest
    ///
    /// # Errors
    ///
    /// `UnsupportedFunction` for anything but SHA-256, `ChecksumMismatch`
    /// when the digests differ.
    pub fn verify(&self, derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<()> {
        if !Self::is_supported(&self.function) {
            return Err(KeystoreError::UnsupportedFunction(self.function.clone()));
        }
        verify_checksum(derived_key, ciphertext, &self.digest()?)
    }
}

/// `SHA-256(derived_key[16..32] || ciphertext)`
///
/// # Arguments
///
/// * `derived_key` - KDF output, 32 bytes or more
/// * `ciphertext` - encrypted secret
pub fn compute_checksum(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<[u8; 32]> {
    let upper = derived_key.get(16..32).ok_or_else(|| {
        KeystoreError::InvalidKdfParams(format!(
            "checksum needs a 32-byte derived key, have {}",
            derived_key.len()
        ))
    })?;

    let digest = Sha256::new()
        .chain_update(upper)
        .chain_update(ciphertext)
        .finalize();
    Ok(digest.into())
}

/// Compare a recomputed checksum with `expected` in constant time
pub fn verify_checksum(
    derived_key: &[u8],
    ciphertext: &[u8],
    expected: &[u8],
) -> KeystoreResult<()> {
    let computed = compute_checksum(derived_key, ciphertext)?;
    if bool::from(computed.as_slice().ct_eq(expected)) {
        Ok(())
    } else {
        Err(KeystoreError::ChecksumMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_vector() {
        // dk = PBKDF2("testpassword", 0x11 * 32, c=16), xor ciphertext
        let dk = hex::decode("8d5a9061b2c3b69e26865d1d218422f67ae16dcaae9186dd02b896d768f5d7e0")
            .unwrap();
        let ct = hex::decode("f77225dbe506809d9636264b9a23700102aa98cc54046b1e974d59bb1de1297d")
            .unwrap();
        assert_eq!(
            ChecksumModule::compute(&dk, &ct).unwrap().message,
            "500af19fe81fa86cd9692872712899af742be3b75b3bd958044f59791f4b524b"
        );
    }

    #[test]
    fn test_lower_half_of_key_ignored() {
        let ct = [0x5c; 48];
        let mut dk_a = [0x01; 32];
        let mut dk_b = [0x02; 32];
        dk_a[16..].fill(0x7f);
        dk_b[16..].fill(0x7f);
        assert_eq!(
            compute_checksum(&dk_a, &ct).unwrap(),
            compute_checksum(&dk_b, &ct).unwrap()
        );

        dk_b[31] ^= 1;
        assert_ne!(
            compute_checksum(&dk_a, &ct).unwrap(),
            compute_checksum(&dk_b, &ct).unwrap()
        );
    }

    #[test]
    fn test_mismatch_and_length() {
        let dk = [0x44; 32];
        let ct = [0x55; 32];
        let good = compute_checksum(&dk, &ct).unwrap();

        assert!(verify_checksum(&dk, &ct, &good).is_ok());
        assert!(matches!(
            verify_checksum(&dk, &ct, &good[..31]),
            Err(KeystoreError::ChecksumMismatch)
        ));
        assert!(matches!(
            verify_checksum(&dk, &[0x56; 32], &good),
            Err(KeystoreError::ChecksumMismatch)
        ));
        assert!(matches!(
            compute_checksum(&[0u8; 31], &ct),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
    }

    #[test]
    fn test_function_name_case() {
        let dk = [0x11; 32];
        let ct = [0x22; 32];
        let mut module = ChecksumModule::compute(&dk, &ct).unwrap();
        module.function = "SHA256".to_string();
        assert!(module.verify(&dk, &ct).is_ok());

        module.message.replace_range(0..2, "zz");
        assert!(matches!(
            module.verify(&dk, &ct),
            Err(KeystoreError::HexError(_))
        ));

        module.function = "keccak256".to_string();
        assert!(matches!(
            module.verify(&dk, &ct),
            Err(KeystoreError::UnsupportedFunction(_))
        ));
    }
}
