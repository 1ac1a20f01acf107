use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, FixedVector};
use tree_hash_derive::TreeHash;

use super::primitives::{BlsPubkey, BlsSignature};
use crate::config::EthSpecVariant;

/// `(pubkeys, aggregate_pubkey)`. Committee size is spec-variant: 512
/// (mainnet) or 32 (minimal), carried via `V::SyncCommitteeSizeTypenum`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "V: EthSpecVariant")]
pub struct SyncCommittee<V: EthSpecVariant> {
    pub pubkeys: FixedVector<BlsPubkey, V::SyncCommitteeSizeTypenum>,
    pub aggregate_pubkey: BlsPubkey,
}

/// `(committee_bits, signature)`. Part of `BeaconBlockBodyCapella`; this
/// crate never checks the signature or bit threshold (see `spec.md`
/// Non-goals) but still needs its `hash_tree_root` to build the body tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "V: EthSpecVariant")]
pub struct SyncAggregate<V: EthSpecVariant> {
    pub sync_committee_bits: BitVector<V::SyncCommitteeSizeTypenum>,
    pub sync_committee_signature: BlsSignature,
}

impl<V: EthSpecVariant> SyncAggregate<V> {
    pub fn new(
        sync_committee_bits: BitVector<V::SyncCommitteeSizeTypenum>,
        sync_committee_signature: BlsSignature,
    ) -> Self {
        Self {
            sync_committee_bits,
            sync_committee_signature,
        }
    }

    /// Number of committee members whose bit is set. Exposed for sanity
    /// logging in the assembler; this crate never checks a quorum
    /// threshold itself — the downstream verifier does.
    pub fn participant_count(&self) -> usize {
        self.sync_committee_bits.iter().filter(|b| *b).count()
    }
}
