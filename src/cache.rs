//! Proof cache: the block-roots sub-tree derived from the
//! most recently processed finalized checkpoint, retained for ancestry-proof
//! construction against later, non-finalized headers.

use std::sync::{Arc, Mutex};

use merkle_proof::MerkleTree;

use crate::ssz::Hash256;

/// `{ slot, finalized_block_root, block_roots_tree }` — the block-roots
/// tree is wrapped in `Arc` because an `Update` record and the cache both
/// hold read-only references to the same tree after it is built.
#[derive(Clone)]
pub struct CachedProof {
    pub slot: u64,
    pub finalized_block_root: Hash256,
    pub block_roots_tree: Arc<MerkleTree>,
}

/// Holds at most one entry; `set` is the only way to update it, and always
/// evicts whatever was there before. Not a global — owned by the caller and
/// passed by reference into the assembler calls that need it.
#[derive(Default)]
pub struct ProofCache {
    current: Mutex<Option<CachedProof>>,
}

impl ProofCache {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    pub fn set(&self, entry: CachedProof) {
        tracing::debug!(
            slot = entry.slot,
            finalized_block_root = %entry.finalized_block_root,
            "proof cache updated"
        );
        *self.current.lock().expect("proof cache mutex poisoned") = Some(entry);
    }

    pub fn current(&self) -> Option<CachedProof> {
        self.current.lock().expect("proof cache mutex poisoned").clone()
    }

    /// The cached entry only if it still matches the given finalized root —
    /// callers use this to detect a stale cache against a checkpoint that
    /// has since advanced.
    pub fn matching(&self, finalized_block_root: Hash256) -> Option<CachedProof> {
        self.current()
            .filter(|entry| entry.finalized_block_root == finalized_block_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Arc<MerkleTree> {
        Arc::new(MerkleTree::create(&[Hash256::zero()], 1))
    }

    #[test]
    fn set_overwrites_previous_entry() {
        let cache = ProofCache::new();
        cache.set(CachedProof {
            slot: 1,
            finalized_block_root: Hash256::repeat_byte(1),
            block_roots_tree: sample_tree(),
        });
        cache.set(CachedProof {
            slot: 2,
            finalized_block_root: Hash256::repeat_byte(2),
            block_roots_tree: sample_tree(),
        });
        let current = cache.current().unwrap();
        assert_eq!(current.slot, 2);
        assert_eq!(current.finalized_block_root, Hash256::repeat_byte(2));
    }

    #[test]
    fn matching_returns_none_for_stale_root() {
        let cache = ProofCache::new();
        cache.set(CachedProof {
            slot: 1,
            finalized_block_root: Hash256::repeat_byte(1),
            block_roots_tree: sample_tree(),
        });
        assert!(cache.matching(Hash256::repeat_byte(2)).is_none());
        assert!(cache.matching(Hash256::repeat_byte(1)).is_some());
    }
}
