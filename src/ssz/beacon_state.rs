//! `BeaconStateCapella`: the field-complete state container, and the one
//! operation the rest of the crate actually needs from it —
//! `block_roots()`, at generalized index 37 in every post-Altair fork this
//! crate targets.

use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, BitVector, FixedVector, VariableList};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::containers::{quoted_u64, Checkpoint, Eth1Data, Fork, Validator};
use super::header::BeaconHeader;
use super::primitives::{BlsPubkey, Hash256};
use super::sync_committee::SyncCommittee;
use super::ExecutionPayloadHeaderCapella;
use crate::config::EthSpecVariant;
use crate::error::DecodeError;

/// `Vector[Root, SLOTS_PER_HISTORICAL_ROOT]`, field index 5 of
/// `BeaconStateCapella` (generalized index
/// `crate::config::BLOCK_ROOTS_GENERALIZED_INDEX`). Kept as a distinct
/// newtype so the proof engine can take it by reference without borrowing
/// the whole state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "V: EthSpecVariant")]
pub struct BlockRootsContainer<V: EthSpecVariant> {
    pub roots: FixedVector<Hash256, V::SlotsPerHistoricalRootTypenum>,
}

impl<V: EthSpecVariant> BlockRootsContainer<V> {
    pub fn get(&self, index: usize) -> Option<Hash256> {
        self.roots.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Field order is load-bearing — it fixes `hash_tree_root` and therefore the
/// generalized indices this crate hardcodes. Do not reorder, insert, or
/// remove fields without updating `BLOCK_ROOTS_GENERALIZED_INDEX` in lockstep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "V: EthSpecVariant")]
pub struct BeaconStateCapella<V: EthSpecVariant> {
    #[serde(with = "quoted_u64")]
    pub genesis_time: u64,
    pub genesis_validators_root: Hash256,
    #[serde(with = "quoted_u64")]
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconHeader,
    pub block_roots: FixedVector<Hash256, V::SlotsPerHistoricalRootTypenum>,
    pub state_roots: FixedVector<Hash256, V::SlotsPerHistoricalRootTypenum>,
    pub historical_roots: VariableList<Hash256, typenum::U16777216>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, typenum::U2048>,
    #[serde(with = "quoted_u64")]
    pub eth1_deposit_index: u64,
    pub validators: VariableList<Validator, typenum::U1099511627776>,
    pub balances: VariableList<u64, typenum::U1099511627776>,
    pub randao_mixes: FixedVector<Hash256, typenum::U65536>,
    pub slashings: FixedVector<u64, typenum::U8192>,
    pub previous_epoch_participation: VariableList<u8, typenum::U1099511627776>,
    pub current_epoch_participation: VariableList<u8, typenum::U1099511627776>,
    pub justification_bits: BitVector<typenum::U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub inactivity_scores: VariableList<u64, typenum::U1099511627776>,
    pub current_sync_committee: SyncCommittee<V>,
    pub next_sync_committee: SyncCommittee<V>,
    pub latest_execution_payload_header: ExecutionPayloadHeaderCapella,
    #[serde(with = "quoted_u64")]
    pub next_withdrawal_index: u64,
    #[serde(with = "quoted_u64")]
    pub next_withdrawal_validator_index: u64,
    pub historical_summaries: VariableList<Hash256, typenum::U16777216>,
}

impl<V: EthSpecVariant> BeaconStateCapella<V> {
    /// The generalized-index-37 subtree. Clones the vector out rather than
    /// borrowing, since the caller typically drops the rest of the state
    /// immediately after (the state file is deleted right after this call —
    /// see `spec.md` §4.4).
    pub fn block_roots(&self) -> BlockRootsContainer<V> {
        BlockRootsContainer {
            roots: self.block_roots.clone(),
        }
    }

    pub fn hash_tree_root(&self) -> Hash256 {
        TreeHash::tree_hash_root(self)
    }

    /// The 28 top-level field roots, in declaration order. Proving
    /// `BLOCK_ROOTS_GENERALIZED_INDEX` against the tree built from these
    /// leaves is how `block_roots()`'s own root gets attached under the
    /// state root — `tree_hash_root` alone only gives the final hash, not
    /// the intermediate leaves a proof needs.
    pub fn field_roots(&self) -> Vec<Hash256> {
        vec![
            self.genesis_time.tree_hash_root(),
            self.genesis_validators_root.tree_hash_root(),
            self.slot.tree_hash_root(),
            self.fork.tree_hash_root(),
            self.latest_block_header.tree_hash_root(),
            self.block_roots.tree_hash_root(),
            self.state_roots.tree_hash_root(),
            self.historical_roots.tree_hash_root(),
            self.eth1_data.tree_hash_root(),
            self.eth1_data_votes.tree_hash_root(),
            self.eth1_deposit_index.tree_hash_root(),
            self.validators.tree_hash_root(),
            self.balances.tree_hash_root(),
            self.randao_mixes.tree_hash_root(),
            self.slashings.tree_hash_root(),
            self.previous_epoch_participation.tree_hash_root(),
            self.current_epoch_participation.tree_hash_root(),
            self.justification_bits.tree_hash_root(),
            self.previous_justified_checkpoint.tree_hash_root(),
            self.current_justified_checkpoint.tree_hash_root(),
            self.finalized_checkpoint.tree_hash_root(),
            self.inactivity_scores.tree_hash_root(),
            self.current_sync_committee.tree_hash_root(),
            self.next_sync_committee.tree_hash_root(),
            self.latest_execution_payload_header.tree_hash_root(),
            self.next_withdrawal_index.tree_hash_root(),
            self.next_withdrawal_validator_index.tree_hash_root(),
            self.historical_summaries.tree_hash_root(),
        ]
    }
}

/// Decodes an SSZ-encoded `BeaconStateCapella` for the given spec variant.
/// `V` is chosen by the caller (via [`crate::config::SpecVariant`]) rather
/// than sniffed from the bytes — the beacon API never tells you which
/// preset a response uses.
pub fn decode_beacon_state<V: EthSpecVariant>(
    bytes: &[u8],
) -> Result<BeaconStateCapella<V>, DecodeError> {
    ssz::Decode::from_ssz_bytes(bytes).map_err(|e| DecodeError::Ssz(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mainnet;

    fn sample_state() -> BeaconStateCapella<Mainnet> {
        let zero_committee = SyncCommittee {
            pubkeys: FixedVector::from_elem(BlsPubkey([0u8; 48])),
            aggregate_pubkey: BlsPubkey([0u8; 48]),
        };
        BeaconStateCapella::<Mainnet> {
            genesis_time: 1_606_824_023,
            genesis_validators_root: Hash256::zero(),
            slot: 8_192_000,
            fork: Fork {
                previous_version: [0, 0, 0, 0],
                current_version: [0, 0, 0, 1],
                epoch: 0,
            },
            latest_block_header: BeaconHeader {
                slot: 8_192_000,
                proposer_index: 1,
                parent_root: Hash256::repeat_byte(1),
                state_root: Hash256::zero(),
                body_root: Hash256::repeat_byte(2),
            },
            block_roots: FixedVector::from_elem(Hash256::zero()),
            state_roots: FixedVector::from_elem(Hash256::zero()),
            historical_roots: VariableList::empty(),
            eth1_data: Eth1Data {
                deposit_root: Hash256::zero(),
                deposit_count: 0,
                block_hash: Hash256::zero(),
            },
            eth1_data_votes: VariableList::empty(),
            eth1_deposit_index: 0,
            validators: VariableList::empty(),
            balances: VariableList::empty(),
            randao_mixes: FixedVector::from_elem(Hash256::zero()),
            slashings: FixedVector::from_elem(0),
            previous_epoch_participation: VariableList::empty(),
            current_epoch_participation: VariableList::empty(),
            justification_bits: BitVector::new(),
            previous_justified_checkpoint: Checkpoint { epoch: 0, root: Hash256::zero() },
            current_justified_checkpoint: Checkpoint { epoch: 0, root: Hash256::zero() },
            finalized_checkpoint: Checkpoint { epoch: 0, root: Hash256::zero() },
            inactivity_scores: VariableList::empty(),
            current_sync_committee: zero_committee.clone(),
            next_sync_committee: zero_committee,
            latest_execution_payload_header: sample_execution_header(),
            next_withdrawal_index: 0,
            next_withdrawal_validator_index: 0,
            historical_summaries: VariableList::empty(),
        }
    }

    fn sample_execution_header() -> ExecutionPayloadHeaderCapella {
        ExecutionPayloadHeaderCapella {
            parent_hash: Hash256::zero(),
            fee_recipient: [0u8; 20],
            state_root: Hash256::zero(),
            receipts_root: Hash256::zero(),
            logs_bloom: FixedVector::from_elem(0),
            prev_randao: Hash256::zero(),
            block_number: 1,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: 1_700_000_000,
            extra_data: VariableList::empty(),
            base_fee_per_gas: ethereum_types::U256::zero(),
            block_hash: Hash256::zero(),
            transactions_root: Hash256::zero(),
            withdrawals_root: Hash256::zero(),
        }
    }

    #[test]
    fn ssz_round_trip_preserves_block_roots() {
        let mut state = sample_state();
        state.block_roots[3] = Hash256::repeat_byte(9);
        let bytes = ssz::Encode::as_ssz_bytes(&state);
        let decoded: BeaconStateCapella<Mainnet> = decode_beacon_state(&bytes).unwrap();
        assert_eq!(decoded.block_roots().get(3), Some(Hash256::repeat_byte(9)));
        assert_eq!(decoded.hash_tree_root(), state.hash_tree_root());
    }

    #[test]
    fn block_roots_container_exposes_full_vector() {
        let state = sample_state();
        let container = state.block_roots();
        assert_eq!(container.len(), Mainnet::slots_per_historical_root());
    }
}
