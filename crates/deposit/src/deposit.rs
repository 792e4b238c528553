//! Deposit messages, signing domains and deposit data records
//!
//! A deposit binds a validator signing key to withdrawal credentials and an
//! amount. The message is merkleized, mixed with a 4-byte domain type and
//! 4-byte fork version into a signing root, and signed with the validator's
//! BLS key. The resulting record is what the deposit contract receives.
//!
//! # Security
//!
//! The signing root commits to the domain, so a deposit signature cannot be
//! replayed on a chain with a different fork version.
//!
//! # Example
//!
//! ```rust,ignore
//! use stakekit_deposit::deposit::{withdrawal_credentials, DepositMessage, DEPOSIT_AMOUNT_GWEI};
//!
//! let message = DepositMessage::new(
//!     &signer.pubkey(),
//!     withdrawal_credentials(&withdrawal_pubkey),
//!     DEPOSIT_AMOUNT_GWEI,
//! );
//! let data = message.sign(&signer, &DOMAIN_DEPOSIT, &GENESIS_FORK_VERSION)?;
//! println!("{}", hex::encode(data.deposit_data_root()));
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stakekit_crypto::{
    BlsPublicKey, BlsSignature, Signer, SigningError, SigningResult, PUBLIC_KEY_LENGTH,
    SIGNATURE_LENGTH,
};

use crate::error::{DepositError, DepositResult};
use crate::merkle::{hash_pair, merkle_root, Chunk};

/// Domain type of validator deposits
pub const DOMAIN_DEPOSIT: [u8; 4] = [0x03, 0x00, 0x00, 0x00];

/// Fork version of the genesis chain
pub const GENESIS_FORK_VERSION: [u8; 4] = [0x00; 4];

/// Full validator deposit, 32 ETH in Gwei
pub const DEPOSIT_AMOUNT_GWEI: u64 = 32_000_000_000;

/// First byte of BLS withdrawal credentials
pub const BLS_WITHDRAWAL_PREFIX: u8 = 0x00;

/// Width of a domain type or fork version
pub const DOMAIN_PART_LENGTH: usize = 4;

/// `domain_type || fork_version`
pub type Domain = [u8; 8];

/// Split bytes into 32-byte chunks, zero-padding the last one on the right
pub fn pack_bytes(bytes: &[u8]) -> Vec<Chunk> {
    bytes
        .chunks(32)
        .map(|part| {
            let mut chunk = [0u8; 32];
            chunk[..part.len()].copy_from_slice(part);
            chunk
        })
        .collect()
}

/// Little-endian `u64` in a zero-padded chunk
fn pack_u64(value: u64) -> Chunk {
    let mut chunk = [0u8; 32];
    chunk[..8].copy_from_slice(&value.to_le_bytes());
    chunk
}

/// Build the signing domain
///
/// # Arguments
///
/// * `domain_type` - 4-byte domain type, e.g. [`DOMAIN_DEPOSIT`]
/// * `fork_version` - 4-byte fork version
///
/// # Returns
///
/// `domain_type || fork_version`
pub fn compute_domain(domain_type: &[u8], fork_version: &[u8]) -> SigningResult<Domain> {
    check_domain_part("domain type", domain_type)?;
    check_domain_part("fork version", fork_version)?;

    let mut domain = [0u8; 8];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(fork_version);
    Ok(domain)
}

fn check_domain_part(field: &'static str, bytes: &[u8]) -> SigningResult<()> {
    if bytes.len() != DOMAIN_PART_LENGTH {
        return Err(SigningError::InvalidDomainLength {
            field,
            expected: DOMAIN_PART_LENGTH,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Root actually signed: the object root merkleized with its domain
pub fn signing_root(object_root: &Chunk, domain: &Domain) -> Chunk {
    let mut domain_chunk = [0u8; 32];
    domain_chunk[..8].copy_from_slice(domain);
    hash_pair(object_root, &domain_chunk)
}

/// BLS withdrawal credentials: `0x00 || sha256(pubkey)[1..]`
pub fn withdrawal_credentials(withdrawal_pubkey: &BlsPublicKey) -> [u8; 32] {
    let mut credentials: [u8; 32] = Sha256::digest(withdrawal_pubkey.to_bytes()).into();
    credentials[0] = BLS_WITHDRAWAL_PREFIX;
    credentials
}

/// Unsigned deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositMessage {
    pub pubkey: [u8; PUBLIC_KEY_LENGTH],
    pub withdrawal_credentials: [u8; 32],
    pub amount: u64,
}

impl DepositMessage {
    /// Create a message for a validator signing key
    pub fn new(pubkey: &BlsPublicKey, withdrawal_credentials: [u8; 32], amount: u64) -> Self {
        Self {
            pubkey: pubkey.to_bytes(),
            withdrawal_credentials,
            amount,
        }
    }

    fn chunks(&self) -> Vec<Chunk> {
        let mut chunks = pack_bytes(&self.pubkey);
        chunks.push(self.withdrawal_credentials);
        chunks.push(pack_u64(self.amount));
        chunks
    }

    /// Merkle root over pubkey, withdrawal credentials and amount
    pub fn hash_tree_root(&self) -> Chunk {
        merkle_root(&self.chunks(), 2).expect("deposit message has four chunks")
    }

    /// Root signed for this message under `domain`
    pub fn signing_root(&self, domain: &Domain) -> Chunk {
        signing_root(&self.hash_tree_root(), domain)
    }

    /// Sign under the domain built from `domain_type` and `fork_version`
    ///
    /// # Arguments
    ///
    /// * `signer` - holder of the validator signing key
    /// * `domain_type` - normally [`DOMAIN_DEPOSIT`]
    /// * `fork_version` - normally [`GENESIS_FORK_VERSION`]
    ///
    /// # Returns
    ///
    /// The signed deposit data record
    pub fn sign<S: Signer>(
        &self,
        signer: &S,
        domain_type: &[u8],
        fork_version: &[u8],
    ) -> SigningResult<DepositData> {
        let domain = compute_domain(domain_type, fork_version)?;
        Ok(self.sign_with_domain(signer, &domain))
    }

    /// Sign under a precomputed domain
    pub fn sign_with_domain<S: Signer>(&self, signer: &S, domain: &Domain) -> DepositData {
        let signature = signer.sign(&self.signing_root(domain));
        DepositData {
            pubkey: self.pubkey,
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
            signature: signature.to_bytes(),
        }
    }
}

/// Signed deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositData {
    pub pubkey: [u8; PUBLIC_KEY_LENGTH],
    pub withdrawal_credentials: [u8; 32],
    pub amount: u64,
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl DepositData {
    /// The message this record signs
    pub fn message(&self) -> DepositMessage {
        DepositMessage {
            pubkey: self.pubkey,
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
        }
    }

    /// Merkle root over all four fields, signature included
    pub fn deposit_data_root(&self) -> Chunk {
        let mut chunks = self.message().chunks();
        chunks.extend(pack_bytes(&self.signature));
        merkle_root(&chunks, 3).expect("deposit data has seven chunks")
    }

    /// Check the signature against the recomputed signing root
    pub fn verify(&self, domain: &Domain) -> SigningResult<()> {
        let pubkey = BlsPublicKey::from_bytes(&self.pubkey)?;
        let signature = BlsSignature::from_bytes(&self.signature)?;
        let root = self.message().signing_root(domain);
        if !pubkey.verify(&root, &signature) {
            return Err(SigningError::InvalidSignature);
        }
        Ok(())
    }
}

/// JSON form of a deposit data record, hex without `0x`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositDataJson {
    pub pubkey: String,
    pub withdrawal_credentials: String,
    pub amount: u64,
    pub signature: String,
    pub deposit_data_root: String,
}

impl From<&DepositData> for DepositDataJson {
    fn from(data: &DepositData) -> Self {
        Self {
            pubkey: hex::encode(data.pubkey),
            withdrawal_credentials: hex::encode(data.withdrawal_credentials),
            amount: data.amount,
            signature: hex::encode(data.signature),
            deposit_data_root: hex::encode(data.deposit_data_root()),
        }
    }
}

impl TryFrom<&DepositDataJson> for DepositData {
    type Error = DepositError;

    fn try_from(json: &DepositDataJson) -> DepositResult<Self> {
        let data = DepositData {
            pubkey: decode_field("pubkey", &json.pubkey)?,
            withdrawal_credentials: decode_field(
                "withdrawal_credentials",
                &json.withdrawal_credentials,
            )?,
            amount: json.amount,
            signature: decode_field("signature", &json.signature)?,
        };

        let expected: [u8; 32] = decode_field("deposit_data_root", &json.deposit_data_root)?;
        let computed = data.deposit_data_root();
        if expected != computed {
            return Err(DepositError::RootMismatch {
                expected: hex::encode(expected),
                computed: hex::encode(computed),
            });
        }
        Ok(data)
    }
}

fn decode_field<const N: usize>(field: &'static str, value: &str) -> DepositResult<[u8; N]> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(value).map_err(|e| DepositError::InvalidField {
        field,
        reason: e.to_string(),
    })?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| DepositError::InvalidField {
        field,
        reason: format!("expected {N} bytes, got {len}"),
    })
}

/// Render records as the `deposit_data.json` array
pub fn deposit_data_to_json(records: &[DepositData]) -> DepositResult<String> {
    let entries: Vec<DepositDataJson> = records.iter().map(DepositDataJson::from).collect();
    Ok(serde_json::to_string(&entries)?)
}

/// Parse a `deposit_data.json` array, checking every stored root
pub fn deposit_data_from_json(json: &str) -> DepositResult<Vec<DepositData>> {
    let entries: Vec<DepositDataJson> = serde_json::from_str(json)?;
    entries.iter().map(DepositData::try_from).collect()
}
