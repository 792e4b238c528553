//! Lamport compression step of the key tree
//!
//! A parent key is expanded into two sets of 255 Lamport one-time secret
//! chunks (one from the key, one from its bitwise complement), every chunk is
//! hashed into its Lamport public half, and the 510 hashes are compressed
//! into a single 32-byte value that seeds the child key.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Number of 32-byte chunks in one Lamport set
pub const LAMPORT_CHUNKS: usize = 255;

/// Width of a Lamport chunk and of the parent key encoding
pub const CHUNK_SIZE: usize = 32;

const LAMPORT_OKM_LENGTH: usize = LAMPORT_CHUNKS * CHUNK_SIZE;

/// Expand `ikm` under `salt` into 255 Lamport secret chunks.
///
/// HKDF-SHA256 extract-then-expand with empty info, 8160 bytes of output.
pub fn lamport_chunks(
    ikm: &[u8; CHUNK_SIZE],
    salt: &[u8; CHUNK_SIZE],
) -> Zeroizing<Vec<[u8; CHUNK_SIZE]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt.as_slice()), ikm);
    let mut okm = Zeroizing::new(vec![0u8; LAMPORT_OKM_LENGTH]);
    // 8160 is exactly the 255 * HashLen ceiling of HKDF-SHA256
    hk.expand(&[], &mut okm)
        .expect("lamport output length is within the HKDF limit");

    let chunks = okm
        .chunks_exact(CHUNK_SIZE)
        .map(|chunk| {
            let mut out = [0u8; CHUNK_SIZE];
            out.copy_from_slice(chunk);
            out
        })
        .collect();
    Zeroizing::new(chunks)
}

/// Bitwise complement of a 256-bit value
pub fn flip_bits(value: &[u8; CHUNK_SIZE]) -> Zeroizing<[u8; CHUNK_SIZE]> {
    let mut out = Zeroizing::new([0u8; CHUNK_SIZE]);
    for (o, v) in out.iter_mut().zip(value) {
        *o = !v;
    }
    out
}

/// Index as a 32-byte big-endian salt
pub fn index_salt(index: u32) -> [u8; CHUNK_SIZE] {
    let mut salt = [0u8; CHUNK_SIZE];
    salt[CHUNK_SIZE - 4..].copy_from_slice(&index.to_be_bytes());
    salt
}

/// Compressed Lamport public key of `(parent_key, index)`.
///
/// `parent_key` is the 32-byte big-endian encoding of the parent scalar.
pub fn compressed_lamport_pk(parent_key: &[u8; CHUNK_SIZE], index: u32) -> [u8; 32] {
    let salt = index_salt(index);
    let lamport_0 = lamport_chunks(parent_key, &salt);
    let not_parent = flip_bits(parent_key);
    let lamport_1 = lamport_chunks(&not_parent, &salt);

    let mut compressor = Sha256::new();
    for chunk in lamport_0.iter().chain(lamport_1.iter()) {
        compressor.update(Sha256::digest(chunk));
    }
    compressor.finalize().into()
}
