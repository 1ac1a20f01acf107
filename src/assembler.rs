//! Update assembler: composes checkpoint, sync-committee
//! period, finality, and header-ancestry updates from the beacon client
//! facade's raw outputs plus the Merkle proof engine, enforcing the
//! sync-period boundary and missed-slot recovery invariants.

use std::marker::PhantomData;
use std::sync::Arc;

use merkle_proof::MerkleTree;
use ssz::Encode;
use tokio_util::sync::CancellationToken;
use tree_hash::TreeHash;

use crate::beacon_client::BeaconClient;
use crate::cache::CachedProof;
use crate::config::{
    Config, EthSpecVariant, BEACON_BLOCK_BODY_FIELD_TREE_DEPTH, BEACON_STATE_FIELD_TREE_DEPTH,
    BLOCK_ROOTS_GENERALIZED_INDEX, EXECUTION_PAYLOAD_GENERALIZED_INDEX,
};
use crate::error::{BoundaryError, ConstructionError, CoreError, NotFoundKind, Result};
use crate::merkle::{self, MerkleProof};
use crate::ssz::{
    BeaconHeader, BlsPubkey, BlsSignature, ExecutionPayloadHeaderCapella, Hash256, Slot,
    SyncCommittee,
};

/// A sync committee with its pubkeys flattened to owned bytes — the
/// variant-erased shape the assembler's records cross the C5/C6 boundary
/// with, rather than staying generic over `V` all the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommitteeSnapshot {
    pub pubkeys: Vec<BlsPubkey>,
    pub aggregate_pubkey: BlsPubkey,
}

impl SyncCommitteeSnapshot {
    fn from_typed<V: EthSpecVariant>(committee: &SyncCommittee<V>) -> Self {
        Self {
            pubkeys: committee.pubkeys.iter().copied().collect(),
            aggregate_pubkey: committee.aggregate_pubkey,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextSyncCommitteeUpdate {
    pub committee: SyncCommitteeSnapshot,
    pub branch: Vec<Hash256>,
}

/// `{ header_branch, finalized_block_root }` — present on a `HeaderUpdate`
/// exactly when the header is not itself the checkpoint's finalized header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestryProof {
    pub header_branch: Vec<Hash256>,
    pub finalized_block_root: Hash256,
}

/// Output of [`UpdateAssembler::get_checkpoint`].
#[derive(Debug, Clone)]
pub struct BeaconCheckpoint {
    pub header: BeaconHeader,
    pub current_sync_committee: SyncCommitteeSnapshot,
    pub current_sync_committee_branch: Vec<Hash256>,
    pub validators_root: Hash256,
    pub block_roots_root: Hash256,
    pub block_roots_branch: Vec<Hash256>,
}

/// A sync-committee-period or finality-only update. `next_sync_committee_update`
/// is `Some` only for period updates.
#[derive(Clone)]
pub struct Update {
    pub attested_header: BeaconHeader,
    pub sync_committee_bits: Vec<u8>,
    pub sync_committee_signature: BlsSignature,
    pub signature_slot: Slot,
    pub next_sync_committee_update: Option<NextSyncCommitteeUpdate>,
    pub finalized_header: BeaconHeader,
    pub finality_branch: Vec<Hash256>,
    pub block_roots_root: Hash256,
    pub block_roots_branch: Vec<Hash256>,
    pub finalized_header_block_root: Hash256,
    /// Retained so a later `get_header_update_with_ancestry_proof` call can
    /// prove ancestry without recomputing the block-roots tree. Not part of
    /// the wire encoding (`encoding.rs` never reads this field).
    pub block_roots_tree: Arc<MerkleTree>,
}

impl std::fmt::Debug for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("attested_header", &self.attested_header)
            .field("finalized_header", &self.finalized_header)
            .field("signature_slot", &self.signature_slot)
            .field(
                "next_sync_committee_update",
                &self.next_sync_committee_update.is_some(),
            )
            .finish()
    }
}

/// A header-ancestry update.
#[derive(Debug, Clone)]
pub struct HeaderUpdate {
    pub header: BeaconHeader,
    pub ancestry_proof: Option<AncestryProof>,
    pub execution_header: ExecutionPayloadHeaderCapella,
    pub execution_payload_root: Hash256,
    pub execution_branch: Vec<Hash256>,
    pub next_sync_aggregate_bits: Vec<u8>,
    pub next_sync_aggregate_signature: BlsSignature,
}

/// The block-roots proof plus the retained sub-tree.
struct BlockRootsProof {
    proof: MerkleProof,
    tree: Arc<MerkleTree>,
}

/// The core advances one sync-committee period at a time: `[last_synced +
/// 1]` if behind, else nothing to fetch.
pub fn get_sync_periods_to_fetch(last_synced: u64, current: u64) -> Vec<u64> {
    if last_synced < current {
        vec![last_synced + 1]
    } else {
        Vec::new()
    }
}

/// `true` exactly when `new_finalized_block_root` differs from `last_root`.
pub fn has_finalized_header_changed(new_finalized_block_root: Hash256, last_root: Hash256) -> bool {
    new_finalized_block_root != last_root
}

/// `slot / (slots_in_epoch * epochs_per_sync_committee_period)` is carried
/// on [`Config`]; everything else the core needs lives here.
pub struct UpdateAssembler<V: EthSpecVariant, C: BeaconClient<V>> {
    config: Config,
    client: Arc<C>,
    _variant: PhantomData<V>,
}

impl<V: EthSpecVariant, C: BeaconClient<V>> UpdateAssembler<V, C> {
    pub fn new(config: Config, client: Arc<C>) -> Self {
        Self {
            config,
            client,
            _variant: PhantomData,
        }
    }

    pub async fn get_checkpoint(&self, cancel: &CancellationToken) -> Result<BeaconCheckpoint> {
        let finalized = self.client.get_finalized_checkpoint(cancel).await?;
        let bootstrap = self
            .client
            .get_bootstrap(finalized.finalized_block_root, cancel)
            .await?;
        let genesis = self.client.get_genesis(cancel).await?;
        let block_roots = self.get_block_roots(bootstrap.header.slot, cancel).await?;

        Ok(BeaconCheckpoint {
            header: bootstrap.header,
            current_sync_committee: SyncCommitteeSnapshot::from_typed(&bootstrap.current_sync_committee),
            current_sync_committee_branch: bootstrap.current_sync_committee_branch,
            validators_root: genesis.genesis_validators_root,
            block_roots_root: block_roots.proof.leaf,
            block_roots_branch: block_roots.proof.branch,
        })
    }

    pub async fn get_sync_committee_period_update(
        &self,
        from_period: u64,
        cancel: &CancellationToken,
    ) -> Result<crate::error::SyncCommitteePeriodUpdateOutcome> {
        use crate::error::SyncCommitteePeriodUpdateOutcome as Outcome;

        let committee_update = self.client.get_committee_period_update(from_period, cancel).await?;
        let actual_period = self.config.compute_sync_period(committee_update.finalized_header.slot);
        let block_roots = self
            .get_block_roots(committee_update.finalized_header.slot, cancel)
            .await?;

        let update = Update {
            attested_header: committee_update.attested_header,
            sync_committee_bits: committee_update.sync_aggregate.sync_committee_bits.as_ssz_bytes(),
            sync_committee_signature: committee_update.sync_aggregate.sync_committee_signature,
            signature_slot: committee_update.signature_slot,
            next_sync_committee_update: Some(NextSyncCommitteeUpdate {
                committee: SyncCommitteeSnapshot::from_typed(&committee_update.next_sync_committee),
                branch: committee_update.next_sync_committee_branch,
            }),
            finalized_header_block_root: committee_update.finalized_header.block_root(),
            finalized_header: committee_update.finalized_header,
            finality_branch: committee_update.finality_branch,
            block_roots_root: block_roots.proof.leaf,
            block_roots_branch: block_roots.proof.branch,
            block_roots_tree: block_roots.tree,
        };

        if actual_period != from_period {
            return Ok(Outcome::WrongPeriod {
                update,
                error: BoundaryError {
                    requested_period: from_period,
                    actual_period,
                },
            });
        }
        Ok(Outcome::Ok(update))
    }

    pub async fn get_finalized_update(&self, cancel: &CancellationToken) -> Result<Update> {
        let finality_update = self.client.get_latest_finalized_update(cancel).await?;
        let block_roots = self
            .get_block_roots(finality_update.finalized_header.slot, cancel)
            .await?;

        Ok(Update {
            attested_header: finality_update.attested_header,
            sync_committee_bits: finality_update.sync_aggregate.sync_committee_bits.as_ssz_bytes(),
            sync_committee_signature: finality_update.sync_aggregate.sync_committee_signature,
            signature_slot: finality_update.signature_slot,
            next_sync_committee_update: None,
            finalized_header_block_root: finality_update.finalized_header.block_root(),
            finalized_header: finality_update.finalized_header,
            finality_branch: finality_update.finality_branch,
            block_roots_root: block_roots.proof.leaf,
            block_roots_branch: block_roots.proof.branch,
            block_roots_tree: block_roots.tree,
        })
    }

    /// Alias for [`Self::get_finalized_update`], kept for callers that think
    /// in terms of "the latest finalized header" rather than "an update".
    pub async fn get_latest_finalized_header(&self, cancel: &CancellationToken) -> Result<Update> {
        self.get_finalized_update(cancel).await
    }

    /// Missed-slot recovery: `get_header_by_slot` is retried with an
    /// advancing slot, up to `slots_in_epoch` attempts, because beacon
    /// slots may be empty. `get_beacon_block_root` is deliberately not used
    /// here — for an empty slot it silently returns the *previous* slot's
    /// root, which would break monotonic header streaming.
    pub async fn get_next_header_update_by_slot_with_ancestry_proof(
        &self,
        slot: Slot,
        checkpoint: Option<&CachedProof>,
        cancel: &CancellationToken,
    ) -> Result<HeaderUpdate> {
        let mut found = None;
        for offset in 0..self.config.slots_in_epoch {
            match self.client.get_header_by_slot(slot + offset, cancel).await {
                Ok(header) => {
                    found = Some(header);
                    break;
                }
                Err(CoreError::NotFound(NotFoundKind::HeaderNotAtSlot(_))) => continue,
                Err(e) => return Err(e),
            }
        }
        let header = found.ok_or(NotFoundKind::HeaderNotAtSlot(slot))?;
        let block_root = self.client.get_beacon_block_root(header.slot, cancel).await?;
        self.get_header_update_with_ancestry_proof(block_root, checkpoint, cancel).await
    }

    pub async fn get_header_update_with_ancestry_proof(
        &self,
        block_root: Hash256,
        checkpoint: Option<&CachedProof>,
        cancel: &CancellationToken,
    ) -> Result<HeaderUpdate> {
        let block = self.client.get_beacon_block(block_root, cancel).await?;
        let header = self.client.get_header_by_slot(block.slot, cancel).await?;
        if header.block_root() != block_root {
            return Err(ConstructionError::HeaderRootMismatch.into());
        }

        let body_field_roots = block.body.field_roots();
        let execution_proof = merkle::prove(
            &body_field_roots,
            EXECUTION_PAYLOAD_GENERALIZED_INDEX,
            BEACON_BLOCK_BODY_FIELD_TREE_DEPTH,
        )?;
        let execution_payload_root = execution_proof.leaf;
        if execution_payload_root != block.body.execution_payload.tree_hash_root() {
            return Err(ConstructionError::LeafMismatch {
                index: EXECUTION_PAYLOAD_GENERALIZED_INDEX,
                computed: format!("{:#x}", block.body.execution_payload.tree_hash_root()),
                expected: format!("{execution_payload_root:#x}"),
            }
            .into());
        }

        let ancestry_proof = match checkpoint {
            Some(cp) if block.slot != cp.slot => Some(self.build_ancestry_proof(cp, block.slot, block_root)?),
            _ => None,
        };

        Ok(HeaderUpdate {
            header,
            ancestry_proof,
            execution_header: block.body.execution_payload.to_header(),
            execution_payload_root,
            execution_branch: execution_proof.branch,
            next_sync_aggregate_bits: block.body.sync_aggregate.sync_committee_bits.as_ssz_bytes(),
            next_sync_aggregate_signature: block.body.sync_aggregate.sync_committee_signature,
        })
    }

    /// Downloads the beacon state at `slot`, decodes it, and proves
    /// `BLOCK_ROOTS_GENERALIZED_INDEX` against its top-level field tree. The
    /// state file is read once inside this call and deleted when the
    /// `TempStateFile` guard drops at the end of the scope, on every exit
    /// path including early returns via `?`.
    async fn get_block_roots(&self, slot: Slot, cancel: &CancellationToken) -> Result<BlockRootsProof> {
        let temp_file = self.client.download_beacon_state(slot, cancel).await?;
        let bytes = temp_file.read().await?;
        let state: crate::ssz::BeaconStateCapella<V> = crate::ssz::decode_beacon_state(&bytes)?;

        let field_roots = state.field_roots();
        let state_proof = merkle::prove(&field_roots, BLOCK_ROOTS_GENERALIZED_INDEX, BEACON_STATE_FIELD_TREE_DEPTH)?;

        let block_roots = state.block_roots();
        let leaves: Vec<Hash256> = (0..block_roots.len())
            .map(|i| block_roots.get(i).expect("index within bounds"))
            .collect();
        let history_depth = V::HISTORY_TREE_DEPTH;
        let block_roots_tree = MerkleTree::create(&leaves, history_depth);

        if block_roots_tree.hash() != state_proof.leaf {
            return Err(ConstructionError::LeafMismatch {
                index: BLOCK_ROOTS_GENERALIZED_INDEX,
                computed: format!("{:#x}", block_roots_tree.hash()),
                expected: format!("{:#x}", state_proof.leaf),
            }
            .into());
        }

        Ok(BlockRootsProof {
            proof: state_proof,
            tree: Arc::new(block_roots_tree),
        })
    }

    /// `index_in_vector = slot mod SLOTS_PER_HISTORICAL_ROOT`, `leaf_index =
    /// SLOTS_PER_HISTORICAL_ROOT + index_in_vector`. A leaf mismatch here
    /// indicates a state/header inconsistency and is always fatal — never
    /// silently relayed.
    fn build_ancestry_proof(&self, checkpoint: &CachedProof, slot: Slot, block_root: Hash256) -> Result<AncestryProof> {
        let slots_per_historical_root = V::slots_per_historical_root() as u64;
        let index_in_vector = slot % slots_per_historical_root;
        let generalized_index = (slots_per_historical_root + index_in_vector) as usize;

        let proof = merkle::prove_with_tree(&checkpoint.block_roots_tree, generalized_index, V::HISTORY_TREE_DEPTH)?;
        if proof.leaf != block_root {
            return Err(ConstructionError::LeafMismatch {
                index: generalized_index,
                computed: format!("{:#x}", proof.leaf),
                expected: format!("{block_root:#x}"),
            }
            .into());
        }

        Ok(AncestryProof {
            header_branch: proof.branch,
            finalized_block_root: checkpoint.finalized_block_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_periods_to_fetch_advances_one_at_a_time() {
        assert_eq!(get_sync_periods_to_fetch(10, 12), vec![11]);
        assert_eq!(get_sync_periods_to_fetch(12, 12), Vec::<u64>::new());
        assert_eq!(get_sync_periods_to_fetch(13, 12), Vec::<u64>::new());
    }

    #[test]
    fn has_finalized_header_changed_detects_rotation() {
        let old_root = Hash256::repeat_byte(1);
        let new_root = Hash256::repeat_byte(2);
        assert!(has_finalized_header_changed(new_root, old_root));
        assert!(!has_finalized_header_changed(old_root, old_root));
    }
}
