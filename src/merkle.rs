//! Merkle proof engine: thin wrapper around the standard
//! SSZ binary Merkle tree, translating generalized indices into the
//! `(field_index, depth)` pairs `merkle_proof` actually takes.
//!
//! A generalized index `g` in a perfect binary tree of depth `d` decomposes
//! as `g = 2^d + field_index`. This crate only ever proves against two
//! fixed, known-depth trees — `BeaconState`'s top-level field tree (depth
//! `BEACON_STATE_FIELD_TREE_DEPTH`) and `BeaconBlockBody`'s (depth
//! `BEACON_BLOCK_BODY_FIELD_TREE_DEPTH`) — so the decomposition is exact
//! division, not a search.

use merkle_proof::MerkleTree;

use crate::error::ConstructionError;
use crate::ssz::Hash256;

/// A Merkle inclusion proof: the leaf and the sibling hashes from the leaf
/// up to (not including) the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf: Hash256,
    pub branch: Vec<Hash256>,
}

/// Splits a generalized index into `(field_index, depth)` against a tree of
/// the given depth. Returns [`ConstructionError::IndexOutOfRange`] if the
/// generalized index doesn't belong to a tree of that depth.
pub fn field_index_for(generalized_index: usize, depth: usize) -> Result<usize, ConstructionError> {
    let base = 1usize
        .checked_shl(depth as u32)
        .ok_or(ConstructionError::IndexOutOfRange(generalized_index, depth))?;
    let next_base = base << 1;
    if generalized_index < base || generalized_index >= next_base {
        return Err(ConstructionError::IndexOutOfRange(generalized_index, depth));
    }
    Ok(generalized_index - base)
}

/// Builds a proof for `generalized_index` against a tree whose leaves are
/// `leaves`, at the given depth (`leaves.len() <= 2^depth`; shorter vectors
/// are zero-padded by `MerkleTree::create` itself).
pub fn prove(
    leaves: &[Hash256],
    generalized_index: usize,
    depth: usize,
) -> Result<MerkleProof, ConstructionError> {
    let field_index = field_index_for(generalized_index, depth)?;
    let tree = MerkleTree::create(leaves, depth);
    let (leaf, branch) = tree
        .generate_proof(field_index, depth)
        .map_err(|_| ConstructionError::IndexOutOfRange(generalized_index, depth))?;
    Ok(MerkleProof { leaf, branch })
}

/// Verifies `proof.leaf` is included in `root` at `generalized_index`, for a
/// tree of the given depth.
pub fn verify(
    proof: &MerkleProof,
    generalized_index: usize,
    depth: usize,
    root: Hash256,
) -> Result<bool, ConstructionError> {
    let field_index = field_index_for(generalized_index, depth)?;
    Ok(merkle_proof::verify_merkle_proof(
        proof.leaf,
        &proof.branch,
        depth,
        field_index,
        root,
    ))
}

/// Like [`prove`], but against an already-built tree rather than a fresh
/// leaf set — used for the retained block-roots tree, where rebuilding from
/// leaves on every ancestry proof would be wasteful.
pub fn prove_with_tree(
    tree: &MerkleTree,
    generalized_index: usize,
    depth: usize,
) -> Result<MerkleProof, ConstructionError> {
    let field_index = field_index_for(generalized_index, depth)?;
    let (leaf, branch) = tree
        .generate_proof(field_index, depth)
        .map_err(|_| ConstructionError::IndexOutOfRange(generalized_index, depth))?;
    Ok(MerkleProof { leaf, branch })
}

/// Recomputes the root a proof would produce, without checking it against
/// an expected value. Used to fold a subtree proof into a containing tree's
/// leaf before verifying the rest of the branch (the ancestry proof stitches
/// a block-roots proof onto the finalized header's body tree this way).
pub fn root_from_branch(proof: &MerkleProof, generalized_index: usize, depth: usize) -> Result<Hash256, ConstructionError> {
    let field_index = field_index_for(generalized_index, depth)?;
    Ok(merkle_proof::merkle_root_from_branch(
        proof.leaf,
        &proof.branch,
        depth,
        field_index,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Hash256> {
        (0..n).map(|i| Hash256::repeat_byte(i as u8)).collect()
    }

    #[test]
    fn field_index_for_block_roots_gindex() {
        assert_eq!(
            field_index_for(crate::config::BLOCK_ROOTS_GENERALIZED_INDEX, crate::config::BEACON_STATE_FIELD_TREE_DEPTH).unwrap(),
            5
        );
    }

    #[test]
    fn field_index_for_execution_payload_gindex() {
        assert_eq!(
            field_index_for(
                crate::config::EXECUTION_PAYLOAD_GENERALIZED_INDEX,
                crate::config::BEACON_BLOCK_BODY_FIELD_TREE_DEPTH
            )
            .unwrap(),
            9
        );
    }

    #[test]
    fn field_index_for_rejects_wrong_depth() {
        assert!(field_index_for(37, 4).is_err());
    }

    #[test]
    fn prove_then_verify_round_trips() {
        let depth = 5;
        let ls = leaves(28);
        let root = MerkleTree::create(&ls, depth).hash();
        let gindex = (1usize << depth) + 5;
        let proof = prove(&ls, gindex, depth).unwrap();
        assert_eq!(proof.leaf, ls[5]);
        assert!(verify(&proof, gindex, depth, root).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_leaf() {
        let depth = 5;
        let ls = leaves(28);
        let root = MerkleTree::create(&ls, depth).hash();
        let gindex = (1usize << depth) + 5;
        let mut proof = prove(&ls, gindex, depth).unwrap();
        proof.leaf = Hash256::repeat_byte(0xff);
        assert!(!verify(&proof, gindex, depth, root).unwrap());
    }
}
