//! scrypt over PBKDF2-HMAC-SHA256 and Salsa20/8 (RFC 7914)
//!
//! The `scrypt` crate enforces `n < 2^(16 * r)`, which rules out the
//! `n = 2^18, r = 1` parameters that older keystores carry. This module
//! computes the same function without that bound, with the Salsa20/8 core
//! taken from the `salsa20` crate.

use pbkdf2::pbkdf2_hmac;
use salsa20::cipher::typenum::U4;
use salsa20::cipher::StreamCipherCore;
use salsa20::SalsaCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

type Salsa20_8 = SalsaCore<U4>;

/// Bytes in one Salsa20 block
const BLOCK_LEN: usize = 64;

/// scrypt with `n = 2^log_n`, block size `r` and `p` lanes into `output`.
///
/// Callers are expected to have validated `r > 0`, `p > 0` and that the
/// `128 * r * n` byte working set is addressable.
pub(crate) fn scrypt(password: &[u8], salt: &[u8], log_n: u8, r: usize, p: usize, output: &mut [u8]) {
    let n = 1usize << log_n;
    let lane_len = 128 * r;

    let mut b = Zeroizing::new(vec![0u8; p * lane_len]);
    pbkdf2_hmac::<Sha256>(password, salt, 1, &mut b);

    let mut v = Zeroizing::new(vec![0u8; lane_len * n]);
    let mut scratch = Zeroizing::new(vec![0u8; lane_len]);

    for lane in b.chunks_exact_mut(lane_len) {
        romix(lane, &mut v, &mut scratch, n);
    }

    pbkdf2_hmac::<Sha256>(password, &b, 1, output);
}

fn romix(x: &mut [u8], v: &mut [u8], scratch: &mut [u8], n: usize) {
    let len = x.len();
    for slot in v.chunks_exact_mut(len) {
        slot.copy_from_slice(x);
        block_mix(x, scratch);
        x.copy_from_slice(scratch);
    }
    for _ in 0..n {
        let j = integerify(x, n);
        for (a, b) in x.iter_mut().zip(&v[j * len..(j + 1) * len]) {
            *a ^= b;
        }
        block_mix(x, scratch);
        x.copy_from_slice(scratch);
    }
}

/// First word of the last 64-byte block, masked to `n - 1`
fn integerify(x: &[u8], n: usize) -> usize {
    let tail = &x[x.len() - BLOCK_LEN..];
    u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]) as usize & (n - 1)
}

/// BlockMix: even-indexed outputs first, then odd-indexed ones.
fn block_mix(input: &[u8], output: &mut [u8]) {
    let half = input.len() / 2;

    let mut x = [0u8; BLOCK_LEN];
    x.copy_from_slice(&input[input.len() - BLOCK_LEN..]);
    let mut state = [0u32; 16];

    for (i, block) in input.chunks_exact(BLOCK_LEN).enumerate() {
        for ((word, a), b) in state
            .iter_mut()
            .zip(x.chunks_exact(4))
            .zip(block.chunks_exact(4))
        {
            *word = u32::from_le_bytes([a[0] ^ b[0], a[1] ^ b[1], a[2] ^ b[2], a[3] ^ b[3]]);
        }
        Salsa20_8::from_raw_state(state).write_keystream_block((&mut x).into());

        let dst = (i / 2) * BLOCK_LEN + (i % 2) * half;
        output[dst..dst + BLOCK_LEN].copy_from_slice(&x);
    }

    x.zeroize();
    state.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7914_vector() {
        // scrypt("", "", N=16, r=1, p=1, dkLen=64)
        let mut out = [0u8; 64];
        scrypt(b"", b"", 4, 1, 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );
    }

    #[test]
    fn test_matches_scrypt_crate() {
        for (log_n, r, p) in [(10u8, 8u32, 1u32), (4, 1, 8), (6, 2, 3)] {
            let params = scrypt::Params::new(log_n, r, p, 32).unwrap();
            let mut expected = [0u8; 32];
            scrypt::scrypt(b"password", b"NaCl", &params, &mut expected).unwrap();

            let mut actual = [0u8; 32];
            scrypt(b"password", b"NaCl", log_n, r as usize, p as usize, &mut actual);
            assert_eq!(actual, expected, "log_n={log_n} r={r} p={p}");
        }
    }

    #[test]
    fn test_block_mix_reorders_outputs() {
        // Two blocks: output[0] = salsa(in[1] ^ in[0]), output[1] = salsa(output[0] ^ in[1])
        let input: Vec<u8> = (0..128u8).collect();
        let mut output = [0u8; 128];
        block_mix(&input, &mut output);

        let mut state = [0u32; 16];
        for (i, word) in state.iter_mut().enumerate() {
            let k = i * 4;
            *word = u32::from_le_bytes([
                input[64 + k] ^ input[k],
                input[65 + k] ^ input[k + 1],
                input[66 + k] ^ input[k + 2],
                input[67 + k] ^ input[k + 3],
            ]);
        }
        let mut first = [0u8; 64];
        Salsa20_8::from_raw_state(state).write_keystream_block((&mut first).into());
        assert_eq!(&output[..64], &first[..]);
        assert_ne!(&output[64..], &input[64..]);
    }
}
