//! SHA-256 binary Merkle trees over 32-byte chunks
//!
//! Trees have a fixed depth; missing leaves are virtual zero chunks and the
//! root of an all-zero subtree of height `h` is `ZERO_HASHES[h]`. Two ways of
//! computing a root are offered:
//!
//! - [`merkle_root`] hashes level by level, padding odd levels
//! - [`general_merkleize`] folds leaves into an `O(depth)` stack without
//!   materializing any level
//!
//! Both agree for the same depth. [`merkle_tree`] keeps every layer so that
//! inclusion proofs can be cut from it.

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use crate::error::{MerkleError, MerkleResult};

/// A 32-byte tree node
pub type Chunk = [u8; 32];

/// Deepest tree supported
pub const MAX_DEPTH: usize = 32;

/// Roots of all-zero subtrees, `ZERO_HASHES[0]` being the zero chunk
pub static ZERO_HASHES: Lazy<[Chunk; MAX_DEPTH + 1]> = Lazy::new(|| {
    let mut hashes = [[0u8; 32]; MAX_DEPTH + 1];
    for i in 1..=MAX_DEPTH {
        hashes[i] = hash_pair(&hashes[i - 1], &hashes[i - 1]);
    }
    hashes
});

/// Hash two sibling nodes into their parent
pub fn hash_pair(left: &Chunk, right: &Chunk) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root of an all-zero subtree of the given height
pub fn zero_hash(depth: usize) -> MerkleResult<Chunk> {
    check_depth(depth)?;
    Ok(ZERO_HASHES[depth])
}

/// Merkle root of `chunks` in a tree of depth `depth`
///
/// # Arguments
///
/// * `chunks` - leaves, at most `2^depth`
/// * `depth` - tree height, at most [`MAX_DEPTH`]
///
/// # Returns
///
/// The root; `ZERO_HASHES[depth]` for no chunks
pub fn merkle_root(chunks: &[Chunk], depth: usize) -> MerkleResult<Chunk> {
    check_depth(depth)?;
    check_capacity(chunks.len(), depth)?;

    if chunks.is_empty() {
        return Ok(ZERO_HASHES[depth]);
    }

    let mut level = chunks.to_vec();
    for height in 0..depth {
        if level.len() % 2 == 1 {
            level.push(ZERO_HASHES[height]);
        }
        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    Ok(level[0])
}

/// Merkle root at the smallest depth that fits `chunks`
///
/// Depth is `bit_length(count - 1)`, so one chunk is its own root and no
/// chunks give the zero chunk.
pub fn general_merkleize(chunks: &[Chunk]) -> MerkleResult<Chunk> {
    merkleize_with_limit(chunks, 0)
}

/// Merkle root as if `chunks` were padded with zero chunks to `pad_to` leaves
///
/// Used for variable-length lists whose tree is sized by their limit.
pub fn general_merkleize_padded(chunks: &[Chunk], pad_to: usize) -> MerkleResult<Chunk> {
    if chunks.len() > pad_to.max(1) {
        return Err(MerkleError::TooManyChunks {
            count: chunks.len(),
            depth: bit_length(pad_to.saturating_sub(1)),
            capacity: pad_to.max(1) as u64,
        });
    }
    merkleize_with_limit(chunks, pad_to)
}

fn merkleize_with_limit(chunks: &[Chunk], pad_to: usize) -> MerkleResult<Chunk> {
    let count = chunks.len();
    let depth = bit_length(count.saturating_sub(1));
    let max_depth = depth.max(bit_length(pad_to.saturating_sub(1)));
    check_depth(max_depth)?;

    let mut stack = vec![[0u8; 32]; max_depth + 1];
    for (i, chunk) in chunks.iter().enumerate() {
        fold(&mut stack, *chunk, i, count, depth);
    }

    // Close an incomplete right edge with zero leaves
    if (1usize << depth) != count {
        fold(&mut stack, ZERO_HASHES[0], count, count, depth);
    }

    for height in depth..max_depth {
        stack[height + 1] = hash_pair(&stack[height], &ZERO_HASHES[height]);
    }

    Ok(stack[max_depth])
}

/// Merge leaf `index` into the stack of pending left siblings
///
/// At `index == count` the value is a padding node and is carried up with
/// zero right siblings until it reaches `depth`.
fn fold(stack: &mut [Chunk], mut node: Chunk, index: usize, count: usize, depth: usize) {
    let mut height = 0;
    loop {
        if index & (1 << height) == 0 {
            if index == count && height < depth {
                node = hash_pair(&node, &ZERO_HASHES[height]);
            } else {
                break;
            }
        } else {
            node = hash_pair(&stack[height], &node);
        }
        height += 1;
    }
    stack[height] = node;
}

/// Every layer of a depth-`depth` tree, leaves first, root last
///
/// Layers hold only the nodes above real leaves; the implicit right-hand
/// nodes are zero hashes.
pub fn merkle_tree(leaves: &[Chunk], depth: usize) -> MerkleResult<Vec<Vec<Chunk>>> {
    check_depth(depth)?;
    check_capacity(leaves.len(), depth)?;

    let mut layers = Vec::with_capacity(depth + 1);
    let mut level = leaves.to_vec();
    for height in 0..depth {
        layers.push(level.clone());
        if level.len() % 2 == 1 {
            level.push(ZERO_HASHES[height]);
        }
        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    if level.is_empty() {
        level.push(ZERO_HASHES[depth]);
    }
    layers.push(level);

    Ok(layers)
}

/// Sibling path from leaf `index` to the root of `tree`
///
/// # Arguments
///
/// * `tree` - layers as returned by [`merkle_tree`]
/// * `index` - position of the leaf
///
/// # Returns
///
/// One sibling per level, bottom up
pub fn merkle_proof(tree: &[Vec<Chunk>], index: usize) -> MerkleResult<Vec<Chunk>> {
    let leaves = tree.first().map_or(0, Vec::len);
    if index >= leaves {
        return Err(MerkleError::IndexOutOfRange { index, len: leaves });
    }

    let depth = tree.len() - 1;
    let proof = (0..depth)
        .map(|height| {
            let sibling = (index >> height) ^ 1;
            tree[height]
                .get(sibling)
                .copied()
                .unwrap_or(ZERO_HASHES[height])
        })
        .collect();

    Ok(proof)
}

/// Check that `leaf` sits at `index` under `root`
///
/// Proofs longer than [`MAX_DEPTH`] never verify.
pub fn verify_merkle_proof(leaf: &Chunk, proof: &[Chunk], index: usize, root: &Chunk) -> bool {
    if proof.len() > MAX_DEPTH {
        return false;
    }
    let computed = proof
        .iter()
        .enumerate()
        .fold(*leaf, |node, (height, sibling)| {
            if (index as u64 >> height) & 1 == 1 {
                hash_pair(sibling, &node)
            } else {
                hash_pair(&node, sibling)
            }
        });
    computed == *root
}

fn bit_length(value: usize) -> usize {
    (usize::BITS - value.leading_zeros()) as usize
}

fn check_depth(depth: usize) -> MerkleResult<()> {
    if depth > MAX_DEPTH {
        return Err(MerkleError::DepthTooLarge {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(())
}

fn check_capacity(count: usize, depth: usize) -> MerkleResult<()> {
    let capacity = 1u64 << depth;
    if count as u64 > capacity {
        return Err(MerkleError::TooManyChunks {
            count,
            depth,
            capacity,
        });
    }
    Ok(())
}
