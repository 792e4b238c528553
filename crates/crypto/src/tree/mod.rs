//! Hierarchical BLS key derivation (EIP-2333) over EIP-2334 paths
//!
//! Keys form a tree rooted at the master key of a seed. Each child is
//! obtained by expanding its parent into a Lamport key pair, compressing the
//! public half, and hashing the result into the BLS12-381 scalar field.
//!
//! # Example
//!
//! ```rust
//! use stakekit_crypto::mnemonic::to_seed;
//! use stakekit_crypto::tree::{derive_validator_secrets, signing_path};
//!
//! let seed = to_seed(
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//!     "",
//! );
//! let secrets = derive_validator_secrets(seed.expose_secret(), 0).unwrap();
//! assert_eq!(secrets.index, 0);
//! assert_eq!(signing_path(0), "m/12381/3600/0/0/0");
//! ```
//!
//! # Security
//!
//! Every scalar is a [`SecretScalar`] and is zeroized on drop. Intermediate
//! Lamport chunks live in `Zeroizing` buffers.

mod derive;
mod lamport;
mod path;

pub use derive::{
    derive_child, derive_master, derive_path, derive_validator_secrets, hkdf_mod_r,
    mnemonic_and_path_to_key, SecretScalar, ValidatorSecrets, CURVE_ORDER, KEYGEN_SALT,
    MIN_SEED_LENGTH,
};
pub use lamport::{compressed_lamport_pk, flip_bits, lamport_chunks, LAMPORT_CHUNKS};
pub use path::{
    format_path, parse_path, signing_indices, signing_path, withdrawal_indices, withdrawal_path,
    COIN_TYPE, PURPOSE,
};
