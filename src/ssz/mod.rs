//! SSZ object model: typed beacon-chain containers with
//! canonical serialization and Merkle tree construction, for both the
//! `mainnet` and `minimal` spec variants.

mod beacon_block;
mod beacon_state;
mod containers;
mod execution;
mod header;
mod primitives;
mod sync_committee;

pub use beacon_block::{BeaconBlock, BeaconBlockBodyCapella};
pub use beacon_state::{decode_beacon_state, BeaconStateCapella, BlockRootsContainer};
pub use containers::{
    quoted_u64, AttestationData, AttesterSlashing, BlsToExecutionChange, Checkpoint, Deposit,
    DepositData, Eth1Data, Fork, IndexedAttestation, ProposerSlashing, SignedBeaconBlockHeader,
    SignedBlsToExecutionChange, SignedVoluntaryExit, Validator, VoluntaryExit,
};
pub use execution::{ExecutionPayloadCapella, ExecutionPayloadHeaderCapella, Withdrawal};
pub use header::BeaconHeader;
pub use primitives::{BlsPubkey, BlsSignature, Epoch, Hash256, Slot};
pub use sync_committee::{SyncAggregate, SyncCommittee};

use crate::error::DecodeError;

/// Decode an SSZ-encoded [`BeaconBlockBodyCapella`].
pub fn decode_beacon_block_body<V: crate::config::EthSpecVariant>(
    bytes: &[u8],
) -> Result<BeaconBlockBodyCapella<V>, DecodeError> {
    ssz::Decode::from_ssz_bytes(bytes).map_err(|e| DecodeError::Ssz(format!("{e:?}")))
}
