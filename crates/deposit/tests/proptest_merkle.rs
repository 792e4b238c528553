//! Property-based tests for Merkle hashing and deposit roots

use proptest::prelude::*;
use stakekit_deposit::{
    general_merkleize, general_merkleize_padded, merkle_proof, merkle_root, merkle_tree,
    pack_bytes, verify_merkle_proof, Chunk, DepositMessage,
};

fn chunks_strategy(max: usize) -> impl Strategy<Value = Vec<Chunk>> {
    prop::collection::vec(any::<[u8; 32]>(), 0..max)
}

fn depth_for(count: usize) -> usize {
    (usize::BITS - count.saturating_sub(1).leading_zeros()) as usize
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: the incremental fold equals the level-by-level root
    #[test]
    fn prop_general_merkleize_matches_merkle_root(chunks in chunks_strategy(40)) {
        let depth = depth_for(chunks.len());
        prop_assert_eq!(general_merkleize(&chunks).unwrap(), merkle_root(&chunks, depth).unwrap());
    }

    /// Property: padding to a limit equals a root at the limit's depth
    #[test]
    fn prop_padded_matches_deeper_root(chunks in chunks_strategy(17), extra in 0usize..5) {
        let depth = depth_for(chunks.len()) + extra;
        let pad_to = 1usize << depth;
        prop_assert_eq!(
            general_merkleize_padded(&chunks, pad_to).unwrap(),
            merkle_root(&chunks, depth).unwrap()
        );
    }

    /// Property: every leaf has a proof that verifies against the root
    #[test]
    fn prop_proofs_verify_for_every_leaf(chunks in chunks_strategy(24).prop_filter("non-empty", |c| !c.is_empty()), extra in 0usize..3) {
        let depth = depth_for(chunks.len()) + extra;
        let tree = merkle_tree(&chunks, depth).unwrap();
        let root = merkle_root(&chunks, depth).unwrap();
        prop_assert_eq!(tree[depth][0], root);

        for (i, leaf) in chunks.iter().enumerate() {
            let proof = merkle_proof(&tree, i).unwrap();
            prop_assert_eq!(proof.len(), depth);
            prop_assert!(verify_merkle_proof(leaf, &proof, i, &root));
        }
    }

    /// Property: a modified leaf fails its proof
    #[test]
    fn prop_modified_leaf_fails(chunks in chunks_strategy(16).prop_filter("non-empty", |c| !c.is_empty()), pick in any::<prop::sample::Index>(), bit in 0u8..8) {
        let depth = depth_for(chunks.len());
        let tree = merkle_tree(&chunks, depth).unwrap();
        let root = tree[depth][0];
        let i = pick.index(chunks.len());

        let mut leaf = chunks[i];
        leaf[0] ^= 1 << bit;
        let proof = merkle_proof(&tree, i).unwrap();
        prop_assert!(!verify_merkle_proof(&leaf, &proof, i, &root));
    }

    /// Property: packing keeps the bytes and pads only the tail
    #[test]
    fn prop_pack_bytes_layout(bytes in prop::collection::vec(any::<u8>(), 1..200)) {
        let packed = pack_bytes(&bytes);
        prop_assert_eq!(packed.len(), bytes.len().div_ceil(32));

        let flat: Vec<u8> = packed.iter().flatten().copied().collect();
        prop_assert_eq!(&flat[..bytes.len()], &bytes[..]);
        prop_assert!(flat[bytes.len()..].iter().all(|b| *b == 0));
    }

    /// Property: any change to a deposit message changes its root
    #[test]
    fn prop_message_root_binds_fields(
        pubkey in any::<[u8; 32]>(),
        credentials in any::<[u8; 32]>(),
        amount in any::<u64>(),
        offset in 0usize..48,
    ) {
        let mut key = [0u8; 48];
        key[..32].copy_from_slice(&pubkey);
        let message = DepositMessage { pubkey: key, withdrawal_credentials: credentials, amount };
        let root = message.hash_tree_root();

        let mut changed = message.clone();
        changed.pubkey[offset] ^= 0x80;
        prop_assert_ne!(changed.hash_tree_root(), root);

        let mut changed = message.clone();
        changed.amount = amount.wrapping_add(1);
        prop_assert_ne!(changed.hash_tree_root(), root);
    }
}
