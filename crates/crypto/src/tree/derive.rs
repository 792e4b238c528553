//! Master and child key derivation over the BLS12-381 scalar field

use hkdf::Hkdf;
use ruint::aliases::U384;
use sha2::Sha256;
use tracing::trace;
use zeroize::Zeroizing;

use super::lamport::compressed_lamport_pk;
use super::path::{parse_path, signing_indices, withdrawal_indices};
use crate::error::{KeyDerivationError, KeyDerivationResult};
use crate::mnemonic;
use crate::secure::SecretArray;

/// HKDF salt for hashing into the scalar field
pub const KEYGEN_SALT: &[u8] = b"BLS-SIG-KEYGEN-SALT-";

/// Order `r` of the BLS12-381 scalar field, big-endian
pub const CURVE_ORDER: [u8; 32] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05,
    0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01,
];

/// Minimum seed length accepted by [`derive_master`]
pub const MIN_SEED_LENGTH: usize = 32;

const OKM_LENGTH: usize = 48;

/// A scalar in `(0, r)` as 32 big-endian bytes, zeroized on drop
pub type SecretScalar = SecretArray<32>;

/// Hash `ikm` into a scalar.
///
/// HKDF-SHA256 with salt `"BLS-SIG-KEYGEN-SALT-"` and empty info produces
/// 48 bytes, read big-endian and reduced modulo `r`.
///
/// # Errors
///
/// `ZeroKey` in the (negligible) case that the reduction yields zero.
pub fn hkdf_mod_r(ikm: &[u8]) -> KeyDerivationResult<SecretScalar> {
    let hk = Hkdf::<Sha256>::new(Some(KEYGEN_SALT), ikm);
    let mut okm = Zeroizing::new([0u8; OKM_LENGTH]);
    hk.expand(&[], okm.as_mut_slice())
        .expect("48 bytes is within the HKDF limit");

    let order = U384::from_be_slice(&CURVE_ORDER);
    let okm_int = Zeroizing::new(U384::from_be_slice(okm.as_slice()));
    let reduced = Zeroizing::new(*okm_int % order);
    let wide = Zeroizing::new(reduced.to_be_bytes::<OKM_LENGTH>());

    let mut scalar = SecretScalar::zeroed();
    scalar
        .expose_secret_mut()
        .copy_from_slice(&wide[OKM_LENGTH - 32..]);

    if scalar.expose_secret().iter().all(|&b| b == 0) {
        return Err(KeyDerivationError::ZeroKey);
    }
    Ok(scalar)
}

/// Derive the master key from a seed.
///
/// # Errors
///
/// `InvalidSeedLength` for seeds shorter than 32 bytes.
pub fn derive_master(seed: &[u8]) -> KeyDerivationResult<SecretScalar> {
    if seed.len() < MIN_SEED_LENGTH {
        return Err(KeyDerivationError::InvalidSeedLength {
            min: MIN_SEED_LENGTH,
            actual: seed.len(),
        });
    }
    hkdf_mod_r(seed)
}

/// Derive the child of `parent` at `index`.
pub fn derive_child(parent: &SecretScalar, index: u32) -> KeyDerivationResult<SecretScalar> {
    let lamport_pk = Zeroizing::new(compressed_lamport_pk(parent.expose_secret(), index));
    hkdf_mod_r(lamport_pk.as_slice())
}

/// Walk `indices` from the master key of `seed`.
///
/// Each intermediate key is dropped (and zeroized) once its child exists.
pub fn derive_path(seed: &[u8], indices: &[u32]) -> KeyDerivationResult<SecretScalar> {
    let mut key = derive_master(seed)?;
    for &index in indices {
        key = derive_child(&key, index)?;
    }
    Ok(key)
}

/// Seed a phrase and walk a textual path, e.g. `"m/12381/3600/0/0/0"`.
pub fn mnemonic_and_path_to_key(
    phrase: &str,
    password: &str,
    path: &str,
) -> KeyDerivationResult<SecretScalar> {
    let indices = parse_path(path)?;
    let seed = mnemonic::to_seed(phrase, password);
    derive_path(seed.expose_secret(), &indices)
}

/// Withdrawal and signing secrets of one validator
#[derive(Debug)]
pub struct ValidatorSecrets {
    /// Validator index `i` in `m/12381/3600/i/...`
    pub index: u32,
    /// Key at `m/12381/3600/i/0`
    pub withdrawal: SecretScalar,
    /// Key at `m/12381/3600/i/0/0`
    pub signing: SecretScalar,
}

/// Derive both keys of validator `index`.
///
/// The signing key is taken as the child of the withdrawal key, so the
/// shared prefix of the two paths is walked once.
pub fn derive_validator_secrets(seed: &[u8], index: u32) -> KeyDerivationResult<ValidatorSecrets> {
    trace!(index, "deriving validator secrets");
    let withdrawal = derive_path(seed, &withdrawal_indices(index))?;
    let last = signing_indices(index)[4];
    let signing = derive_child(&withdrawal, last)?;

    Ok(ValidatorSecrets {
        index,
        withdrawal,
        signing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // EIP-2333 test case 0
    const SEED: &str = "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04";
    const MASTER_SK: &str = "1baa85baae3855480656e3e77b8e42c6f4be751a2d089e2caab293c39befaa41";
    const CHILD_SK: &str = "10675005371da254560dc0c5f9cdf87b305501233b3f69a5f413bea78a67c508";

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn scalar(hex_str: &str) -> SecretScalar {
        SecretScalar::new(hex::decode(hex_str).unwrap().try_into().unwrap())
    }

    #[test]
    fn test_master_key_vector() {
        let master = derive_master(&hex::decode(SEED).unwrap()).unwrap();
        assert_eq!(hex::encode(master.expose_secret()), MASTER_SK);
    }

    #[test]
    fn test_child_key_vector() {
        let child = derive_child(&scalar(MASTER_SK), 0).unwrap();
        assert_eq!(hex::encode(child.expose_secret()), CHILD_SK);
    }

    #[test]
    fn test_hkdf_mod_r_decimal_vectors() {
        // Same vector in the decimal form it is published in
        let master = derive_master(&hex::decode(SEED).unwrap()).unwrap();
        assert_eq!(
            U384::from_be_slice(master.expose_secret()).to_string(),
            "12513733877922233913083619867448865075222526338446857121953625441395088009793"
        );
        let child = derive_child(&master, 0).unwrap();
        assert_eq!(
            U384::from_be_slice(child.expose_secret()).to_string(),
            "7419543105316279183937430842449358701327973165530407166294956473095303972104"
        );
    }

    #[test]
    fn test_scalars_are_below_order() {
        let order = U384::from_be_slice(&CURVE_ORDER);
        for i in 0..8u8 {
            let key = hkdf_mod_r(&[i; 32]).unwrap();
            assert!(U384::from_be_slice(key.expose_secret()) < order);
        }
    }

    #[test]
    fn test_reduction_intermediates_zeroize() {
        let mut value = U384::from_be_slice(&[0xffu8; OKM_LENGTH]);
        zeroize::Zeroize::zeroize(&mut value);
        assert_eq!(value, U384::ZERO);
    }

    #[test]
    fn test_short_seed_rejected() {
        assert_eq!(
            derive_master(&[0u8; 16]).unwrap_err(),
            KeyDerivationError::InvalidSeedLength { min: 32, actual: 16 }
        );
    }

    #[test]
    fn test_validator_secrets_vector() {
        let seed = mnemonic::to_seed(ABANDON_ABOUT, "");
        let secrets = derive_validator_secrets(seed.expose_secret(), 0).unwrap();
        assert_eq!(
            hex::encode(secrets.withdrawal.expose_secret()),
            "118e908b7d8ae0e3c8c149e030aa0a1ff9e3124365007d9cd26849343595d3ea"
        );
        assert_eq!(
            hex::encode(secrets.signing.expose_secret()),
            "42cf0cc74d549c504e34abf0c5ffea7e58b449e9ecbb792c91aaa41b78f1ee71"
        );
    }

    #[test]
    fn test_signing_key_matches_full_path() {
        let via_path =
            mnemonic_and_path_to_key(ABANDON_ABOUT, "", "m/12381/3600/0/0/0").unwrap();
        let seed = mnemonic::to_seed(ABANDON_ABOUT, "");
        let secrets = derive_validator_secrets(seed.expose_secret(), 0).unwrap();
        assert_eq!(via_path.expose_secret(), secrets.signing.expose_secret());
    }

    #[test]
    fn test_empty_path_is_master() {
        let seed = hex::decode(SEED).unwrap();
        let key = derive_path(&seed, &[]).unwrap();
        assert_eq!(hex::encode(key.expose_secret()), MASTER_SK);
    }

    #[test]
    fn test_invalid_path_propagates() {
        assert!(matches!(
            mnemonic_and_path_to_key(ABANDON_ABOUT, "", "x/1"),
            Err(KeyDerivationError::InvalidPath(_))
        ));
    }
}
