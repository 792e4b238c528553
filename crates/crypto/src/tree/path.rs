//! Derivation paths for validator keys
//!
//! Validator keys follow the EIP-2334 layout:
//! ```text
//! m / 12381 / 3600 / validator_index / 0        withdrawal key
//! m / 12381 / 3600 / validator_index / 0 / 0    signing key
//! ```

use crate::error::{KeyDerivationError, KeyDerivationResult};

/// BLS12-381 curve purpose (EIP-2334)
pub const PURPOSE: u32 = 12381;

/// Coin type for the beacon chain (60**2, the second iteration of Ethereum's)
pub const COIN_TYPE: u32 = 3600;

/// Path indices for a validator's withdrawal key
pub fn withdrawal_indices(validator_index: u32) -> [u32; 4] {
    [PURPOSE, COIN_TYPE, validator_index, 0]
}

/// Path indices for a validator's signing key
pub fn signing_indices(validator_index: u32) -> [u32; 5] {
    [PURPOSE, COIN_TYPE, validator_index, 0, 0]
}

/// Textual withdrawal path, e.g. `m/12381/3600/7/0`
pub fn withdrawal_path(validator_index: u32) -> String {
    format_path(&withdrawal_indices(validator_index))
}

/// Textual signing path, e.g. `m/12381/3600/7/0/0`
pub fn signing_path(validator_index: u32) -> String {
    format_path(&signing_indices(validator_index))
}

/// Render indices as `m/a/b/...`
pub fn format_path(indices: &[u32]) -> String {
    let mut path = String::from("m");
    for index in indices {
        path.push('/');
        path.push_str(&index.to_string());
    }
    path
}

/// Parse a textual path such as `"m/12381/3600/0/0"` into indices.
///
/// Spaces are ignored. `"m"` alone addresses the master key. Hardened
/// markers are not part of this scheme and are rejected.
///
/// # Errors
///
/// `InvalidPath` if the path does not start with `m`, has an empty
/// component, or has a component that is not a decimal `u32`.
pub fn parse_path(path: &str) -> KeyDerivationResult<Vec<u32>> {
    let compact: String = path.chars().filter(|c| !c.is_whitespace()).collect();

    let mut parts = compact.split('/');
    if parts.next() != Some("m") {
        return Err(KeyDerivationError::InvalidPath(format!(
            "{path:?} must start with 'm'"
        )));
    }

    parts
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(KeyDerivationError::InvalidPath(format!(
                    "invalid path component {part:?} in {path:?}"
                )));
            }
            part.parse::<u32>().map_err(|_| {
                KeyDerivationError::InvalidPath(format!("path component {part} exceeds u32"))
            })
        })
        .collect()
}
