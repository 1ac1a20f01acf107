//! Light-client update construction core for an Ethereum beacon-chain
//! bridge relayer: decodes SSZ beacon-chain objects, proves the two fixed
//! generalized indices a downstream on-chain verifier checks
//! (`block_roots` at 37, `execution_payload` at 25), and assembles the
//! checkpoint / sync-committee-period / header-ancestry records the relayer
//! submits on chain.

pub mod assembler;
pub mod beacon_client;
pub mod cache;
pub mod config;
pub mod encoding;
pub mod error;
pub mod merkle;
pub mod ssz;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use assembler::{
    get_sync_periods_to_fetch, has_finalized_header_changed, AncestryProof, BeaconCheckpoint,
    HeaderUpdate, NextSyncCommitteeUpdate, SyncCommitteeSnapshot, Update, UpdateAssembler,
};
pub use beacon_client::{BeaconClient, HttpBeaconClient, TempStateFile};
pub use cache::{CachedProof, ProofCache};
pub use config::{Config, EthSpecVariant, Mainnet, Minimal, SpecVariant};
pub use error::{CoreError, Result, SyncCommitteePeriodUpdateOutcome};
