//! BLS12-381 signing for validator credentials
//!
//! Thin wrappers over `blst::min_pk` (48-byte public keys in G1, 96-byte
//! signatures in G2) using the proof-of-possession ciphersuite that deposit
//! signatures are checked against. The rest of the workspace reaches the
//! curve only through [`BlsSecretKey`], [`BlsPublicKey`], [`BlsSignature`]
//! and the [`Signer`] capability trait.

use crate::error::BlsError;
use crate::secure::SecretArray;
use blst::min_pk::{PublicKey as BlstPubKey, SecretKey as BlstSecKey, Signature as BlstSig};
use blst::BLST_ERROR;
use serde::{Deserialize, Serialize};

/// Ciphersuite tag for proof-of-possession signatures
pub const DST_POP: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Secret key length in bytes (big-endian scalar)
pub const SECRET_KEY_LENGTH: usize = 32;

/// Compressed public key length in bytes
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// Compressed signature length in bytes
pub const SIGNATURE_LENGTH: usize = 96;

/// BLS12-381 secret key (scalar in `(0, r)`)
///
/// Not `Clone`; the underlying `blst` key is zeroized when dropped.
pub struct BlsSecretKey(BlstSecKey);

impl BlsSecretKey {
    /// Load from a 32-byte big-endian scalar
    ///
    /// Rejects zero and values `>= r`.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, BlsError> {
        BlstSecKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| BlsError::InvalidSecretKey)
    }

    /// Load from an arbitrary slice (e.g. a decrypted keystore payload)
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BlsError> {
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| BlsError::InvalidSecretKey)?;
        let arr = SecretArray::new(arr);
        Self::from_bytes(arr.expose_secret())
    }

    /// Serialize to the 32-byte big-endian scalar
    pub fn to_bytes(&self) -> SecretArray<SECRET_KEY_LENGTH> {
        SecretArray::new(self.0.to_bytes())
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey(self.0.sk_to_pk())
    }

    /// Sign a message under the proof-of-possession ciphersuite
    pub fn sign(&self, msg: &[u8]) -> BlsSignature {
        BlsSignature(self.0.sign(msg, DST_POP, &[]))
    }
}

impl std::fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlsSecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// BLS12-381 public key (48 bytes compressed)
#[derive(Clone, PartialEq, Eq)]
pub struct BlsPublicKey(BlstPubKey);

impl BlsPublicKey {
    /// Load from 48 compressed bytes, validating the point
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self, BlsError> {
        let pk = BlstPubKey::from_bytes(bytes).map_err(|_| BlsError::InvalidPublicKey)?;
        pk.validate().map_err(|_| BlsError::InvalidPublicKey)?;
        Ok(Self(pk))
    }

    /// Serialize to bytes (48 bytes compressed)
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Verify a signature over `msg`
    pub fn verify(&self, msg: &[u8], sig: &BlsSignature) -> bool {
        sig.0.verify(true, msg, DST_POP, &[], &self.0, true) == BLST_ERROR::BLST_SUCCESS
    }
}

impl std::fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "BlsPublicKey({})", hex::encode(&bytes[..8]))
    }
}

/// BLS12-381 signature (96 bytes compressed)
#[derive(Clone)]
pub struct BlsSignature(BlstSig);

impl BlsSignature {
    /// Load from 96 compressed bytes
    pub fn from_bytes(bytes: &[u8; SIGNATURE_LENGTH]) -> Result<Self, BlsError> {
        BlstSig::from_bytes(bytes)
            .map(Self)
            .map_err(|_| BlsError::InvalidSignature)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Verify this signature against a public key
    pub fn verify(&self, msg: &[u8], pubkey: &BlsPublicKey) -> bool {
        pubkey.verify(msg, self)
    }
}

impl std::fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "BlsSignature({})", hex::encode(&bytes[..8]))
    }
}

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

/// Hex (de)serialization for fixed-width curve encodings.
macro_rules! impl_hex_serde {
    ($ty:ty, $len:expr, $what:literal) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&hex::encode(self.to_bytes()))
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                let bytes = hex::decode(s.trim_start_matches("0x"))
                    .map_err(serde::de::Error::custom)?;
                let arr: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom(concat!("invalid ", $what, " length")))?;
                Self::from_bytes(&arr).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_hex_serde!(BlsPublicKey, PUBLIC_KEY_LENGTH, "public key");
impl_hex_serde!(BlsSignature, SIGNATURE_LENGTH, "signature");

/// Something that can produce BLS signatures for one public key.
///
/// The deposit builder only ever talks to this trait, so a remote or
/// hardware-backed signer can be dropped in without touching call sites.
pub trait Signer {
    /// Sign `msg` (a 32-byte signing root in practice)
    fn sign(&self, msg: &[u8]) -> BlsSignature;

    /// Public key the signatures verify under
    fn pubkey(&self) -> BlsPublicKey;
}

/// Software signer holding the secret key in process memory
pub struct LocalSigner {
    secret_key: BlsSecretKey,
    public_key: BlsPublicKey,
}

impl LocalSigner {
    /// Wrap a secret key
    pub fn new(secret_key: BlsSecretKey) -> Self {
        let public_key = secret_key.public_key();
        Self {
            secret_key,
            public_key,
        }
    }

    /// Borrow the secret key (for keystore export)
    pub fn secret_key(&self) -> &BlsSecretKey {
        &self.secret_key
    }
}

impl Signer for LocalSigner {
    fn sign(&self, msg: &[u8]) -> BlsSignature {
        self.secret_key.sign(msg)
    }

    fn pubkey(&self) -> BlsPublicKey {
        self.public_key.clone()
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Public key of a secret key (`SkToPk`)
pub fn priv_to_pub(sk: &BlsSecretKey) -> BlsPublicKey {
    sk.public_key()
}

/// Sign `msg` with `sk`
pub fn sign(sk: &BlsSecretKey, msg: &[u8]) -> BlsSignature {
    sk.sign(msg)
}

/// Verify `sig` over `msg` under `pk`
pub fn verify(pk: &BlsPublicKey, msg: &[u8], sig: &BlsSignature) -> bool {
    pk.verify(msg, sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(byte: u8) -> BlsSecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = byte;
        BlsSecretKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_sign_verify() {
        let sk = test_key(7);
        let pk = priv_to_pub(&sk);
        let msg = [0x42u8; 32];

        let sig = sign(&sk, &msg);
        assert!(verify(&pk, &msg, &sig));
        assert!(!verify(&pk, &[0x43u8; 32], &sig));
    }

    #[test]
    fn test_wrong_key_fails() {
        let sig = test_key(1).sign(b"root");
        assert!(!sig.verify(b"root", &test_key(2).public_key()));
    }

    #[test]
    fn test_zero_secret_key_rejected() {
        assert_eq!(
            BlsSecretKey::from_bytes(&[0u8; 32]).unwrap_err(),
            BlsError::InvalidSecretKey
        );
    }

    #[test]
    fn test_secret_key_at_or_above_order_rejected() {
        let r = hex::decode("73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001")
            .unwrap();
        assert!(BlsSecretKey::from_slice(&r).is_err());
        assert!(BlsSecretKey::from_slice(&[0xff; 32]).is_err());
    }

    #[test]
    fn test_from_slice_length() {
        assert!(BlsSecretKey::from_slice(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_public_key_roundtrip() {
        let pk = test_key(9).public_key();
        let restored = BlsPublicKey::from_bytes(&pk.to_bytes()).unwrap();
        assert_eq!(pk, restored);
    }

    #[test]
    fn test_serde_hex() {
        let sk = test_key(3);
        let pk = sk.public_key();
        let sig = sk.sign(b"msg");

        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", hex::encode(pk.to_bytes())));
        let parsed: BlsPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pk);

        let json = serde_json::to_string(&sig).unwrap();
        let parsed: BlsSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sig);

        assert!(serde_json::from_str::<BlsPublicKey>("\"abcd\"").is_err());
    }

    #[test]
    fn test_signer_trait() {
        let signer = LocalSigner::new(test_key(5));
        let sig = Signer::sign(&signer, b"deposit");
        assert!(signer.pubkey().verify(b"deposit", &sig));
    }

    #[test]
    fn test_debug_redacted() {
        let debug = format!("{:?}", test_key(5));
        assert!(debug.contains("[REDACTED]"));
    }
}
