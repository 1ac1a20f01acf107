//! `BeaconBlockBodyCapella` and the thin `BeaconBlock` wrapper around it.
//! `execution_payload` sits at field index 9 (generalized index
//! `crate::config::EXECUTION_PAYLOAD_GENERALIZED_INDEX`).

use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, VariableList};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::containers::{
    AttesterSlashing, Eth1Data, ProposerSlashing, SignedBlsToExecutionChange,
    SignedVoluntaryExit,
};
use super::primitives::{BlsSignature, Hash256, Slot};
use super::sync_committee::SyncAggregate;
use super::ExecutionPayloadCapella;
use crate::config::EthSpecVariant;

/// Field order is load-bearing — it fixes `hash_tree_root` and therefore
/// `EXECUTION_PAYLOAD_GENERALIZED_INDEX`. Do not reorder.
///
/// `execution_payload` is the full `ExecutionPayloadCapella`, with inline
/// `transactions`/`withdrawals` lists — the shape `/eth/v2/beacon/blocks/{id}`
/// actually returns. `BeaconStateCapella::latest_execution_payload_header`
/// carries the roots-only header form instead; see
/// `ExecutionPayloadCapella::to_header`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "V: EthSpecVariant")]
pub struct BeaconBlockBodyCapella<V: EthSpecVariant> {
    pub randao_reveal: BlsSignature,
    pub eth1_data: Eth1Data,
    pub graffiti: Hash256,
    pub proposer_slashings: VariableList<ProposerSlashing, typenum::U16>,
    pub attester_slashings: VariableList<AttesterSlashing, typenum::U2>,
    pub attestations: VariableList<super::containers::Attestation, typenum::U128>,
    pub deposits: VariableList<super::containers::Deposit, typenum::U16>,
    pub voluntary_exits: VariableList<SignedVoluntaryExit, typenum::U16>,
    pub sync_aggregate: SyncAggregate<V>,
    pub execution_payload: ExecutionPayloadCapella,
    pub bls_to_execution_changes: VariableList<SignedBlsToExecutionChange, typenum::U16>,
}

impl<V: EthSpecVariant> BeaconBlockBodyCapella<V> {
    pub fn hash_tree_root(&self) -> Hash256 {
        TreeHash::tree_hash_root(self)
    }

    /// The 11 top-level field roots, in declaration order — the leaves the
    /// execution-payload proof (generalized index 25) is built from.
    pub fn field_roots(&self) -> Vec<Hash256> {
        vec![
            self.randao_reveal.tree_hash_root(),
            self.eth1_data.tree_hash_root(),
            self.graffiti.tree_hash_root(),
            self.proposer_slashings.tree_hash_root(),
            self.attester_slashings.tree_hash_root(),
            self.attestations.tree_hash_root(),
            self.deposits.tree_hash_root(),
            self.voluntary_exits.tree_hash_root(),
            self.sync_aggregate.tree_hash_root(),
            self.execution_payload.tree_hash_root(),
            self.bls_to_execution_changes.tree_hash_root(),
        ]
    }
}

/// `(slot, proposer_index, parent_root, state_root, body)`. Not itself
/// needed by the proof engine (which only ever hashes the body), but kept
/// as the natural pairing a beacon-block API response decodes into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "V: EthSpecVariant")]
pub struct BeaconBlock<V: EthSpecVariant> {
    #[serde(with = "super::containers::quoted_u64")]
    pub slot: Slot,
    #[serde(with = "super::containers::quoted_u64")]
    pub proposer_index: u64,
    pub parent_root: Hash256,
    pub state_root: Hash256,
    pub body: BeaconBlockBodyCapella<V>,
}
