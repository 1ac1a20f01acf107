use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::containers::quoted_u64;
use super::primitives::{Hash256, Slot};

/// `(slot, proposer_index, parent_root, state_root, body_root)`.
///
/// `hash_tree_root(header) == block_root` for every header this crate
/// surfaces — callers rely on this to cross-check a header against the
/// block root returned independently by the beacon API (`spec.md` §8,
/// "Header root consistency").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconHeader {
    #[serde(with = "quoted_u64")]
    pub slot: Slot,
    #[serde(with = "quoted_u64")]
    pub proposer_index: u64,
    pub parent_root: Hash256,
    pub state_root: Hash256,
    pub body_root: Hash256,
}

impl BeaconHeader {
    pub fn block_root(&self) -> Hash256 {
        self.tree_hash_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_uses_quoted_integers() {
        let header = BeaconHeader {
            slot: 123,
            proposer_index: 7,
            parent_root: Hash256::repeat_byte(1),
            state_root: Hash256::repeat_byte(2),
            body_root: Hash256::repeat_byte(3),
        };
        let json = serde_json::to_string(&header).unwrap();
        assert!(json.contains("\"123\""));
        let back: BeaconHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }
}
