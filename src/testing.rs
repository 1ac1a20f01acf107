//! Test tooling: an in-memory [`BeaconClient`] double, so
//! the assembler's sync-period, missed-slot, and ancestry-proof logic can be
//! exercised without a live beacon node. Canned per-call outcomes are
//! consumed in FIFO order for the singleton endpoints (mirroring one update
//! becoming available at a time) and by key for the per-slot/per-root ones.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::beacon_client::{
    Bootstrap, BeaconClient, CommitteePeriodUpdate, FinalizedCheckpoint, FinalizedUpdate, Genesis,
    TempStateFile,
};
use crate::config::EthSpecVariant;
use crate::error::{CoreError, NotFoundKind, Result};
use crate::ssz::{BeaconBlock, BeaconHeader, Hash256, Slot};

/// A canned outcome for one mock call. Distinguished "not found" conditions
/// are spelled out rather than carrying an opaque `CoreError`, since
/// `CoreError` holds a `reqwest::Error` and isn't `Clone`.
#[derive(Clone)]
enum Outcome<T> {
    Ready(T),
    HeaderNotAtSlot(u64),
    StateNotAvailableYet(u64),
}

impl<T> Outcome<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Outcome::Ready(v) => Ok(v),
            Outcome::HeaderNotAtSlot(slot) => Err(NotFoundKind::HeaderNotAtSlot(slot).into()),
            Outcome::StateNotAvailableYet(slot) => Err(NotFoundKind::StateNotAvailableYet(slot).into()),
        }
    }
}

fn pop_front<T>(queue: &Mutex<VecDeque<Outcome<T>>>) -> Result<T> {
    queue
        .lock()
        .expect("mock queue mutex poisoned")
        .pop_front()
        .unwrap_or_else(|| panic!("mock beacon client: no canned response queued"))
        .into_result()
}

/// In-memory [`BeaconClient`] double for assembler tests.
///
/// `state_dir` is real — `download_beacon_state` still writes a file to
/// disk, so `TempStateFile`'s read-then-delete lifecycle is exercised the
/// same way it is against a live endpoint.
pub struct MockBeaconClient<V: EthSpecVariant> {
    finalized_checkpoint: Mutex<VecDeque<Outcome<FinalizedCheckpoint>>>,
    bootstrap: Mutex<VecDeque<Outcome<Bootstrap<V>>>>,
    genesis: Mutex<VecDeque<Outcome<Genesis>>>,
    committee_period_update: Mutex<VecDeque<Outcome<CommitteePeriodUpdate<V>>>>,
    finalized_update: Mutex<VecDeque<Outcome<FinalizedUpdate<V>>>>,
    headers_by_slot: Mutex<HashMap<u64, Outcome<BeaconHeader>>>,
    block_roots_by_slot: Mutex<HashMap<u64, Outcome<Hash256>>>,
    blocks_by_root: Mutex<HashMap<Hash256, Outcome<BeaconBlock<V>>>>,
    state_bytes_by_slot: Mutex<HashMap<u64, Outcome<Vec<u8>>>>,
    state_dir: PathBuf,
    state_file_seq: AtomicU64,
    header_lookup_count: AtomicU64,
}

impl<V: EthSpecVariant> MockBeaconClient<V> {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            finalized_checkpoint: Mutex::new(VecDeque::new()),
            bootstrap: Mutex::new(VecDeque::new()),
            genesis: Mutex::new(VecDeque::new()),
            committee_period_update: Mutex::new(VecDeque::new()),
            finalized_update: Mutex::new(VecDeque::new()),
            headers_by_slot: Mutex::new(HashMap::new()),
            block_roots_by_slot: Mutex::new(HashMap::new()),
            blocks_by_root: Mutex::new(HashMap::new()),
            state_bytes_by_slot: Mutex::new(HashMap::new()),
            state_dir,
            state_file_seq: AtomicU64::new(0),
            header_lookup_count: AtomicU64::new(0),
        }
    }

    /// Number of `get_header_by_slot` calls issued so far — used to pin the
    /// missed-slot retry bound (`spec.md` §8 scenario 3).
    pub fn header_lookup_count(&self) -> u64 {
        self.header_lookup_count.load(Ordering::Relaxed)
    }

    pub fn push_finalized_checkpoint(&self, checkpoint: FinalizedCheckpoint) {
        self.finalized_checkpoint.lock().expect("mock beacon client mutex poisoned").push_back(Outcome::Ready(checkpoint));
    }

    pub fn push_bootstrap(&self, bootstrap: Bootstrap<V>) {
        self.bootstrap.lock().expect("mock beacon client mutex poisoned").push_back(Outcome::Ready(bootstrap));
    }

    pub fn push_genesis(&self, genesis: Genesis) {
        self.genesis.lock().expect("mock beacon client mutex poisoned").push_back(Outcome::Ready(genesis));
    }

    pub fn push_committee_period_update(&self, update: CommitteePeriodUpdate<V>) {
        self.committee_period_update.lock().expect("mock beacon client mutex poisoned").push_back(Outcome::Ready(update));
    }

    pub fn push_finalized_update(&self, update: FinalizedUpdate<V>) {
        self.finalized_update.lock().expect("mock beacon client mutex poisoned").push_back(Outcome::Ready(update));
    }

    pub fn set_header_at_slot(&self, slot: u64, header: BeaconHeader) {
        self.headers_by_slot.lock().expect("mock beacon client mutex poisoned").insert(slot, Outcome::Ready(header));
    }

    /// Marks `slot` as empty — `get_header_by_slot` returns
    /// `NotFoundKind::HeaderNotAtSlot`, as a live beacon node would for a
    /// skipped slot.
    pub fn set_missing_header_at_slot(&self, slot: u64) {
        self.headers_by_slot.lock().expect("mock beacon client mutex poisoned").insert(slot, Outcome::HeaderNotAtSlot(slot));
    }

    pub fn set_block_root_at_slot(&self, slot: u64, root: Hash256) {
        self.block_roots_by_slot.lock().expect("mock beacon client mutex poisoned").insert(slot, Outcome::Ready(root));
    }

    pub fn set_block(&self, root: Hash256, block: BeaconBlock<V>) {
        self.blocks_by_root.lock().expect("mock beacon client mutex poisoned").insert(root, Outcome::Ready(block));
    }

    pub fn set_state_bytes_at_slot(&self, slot: u64, bytes: Vec<u8>) {
        self.state_bytes_by_slot.lock().expect("mock beacon client mutex poisoned").insert(slot, Outcome::Ready(bytes));
    }

    pub fn set_state_unavailable_at_slot(&self, slot: u64) {
        self.state_bytes_by_slot
            .lock()
            .expect("mock beacon client mutex poisoned")
            .insert(slot, Outcome::StateNotAvailableYet(slot));
    }

    fn next_state_file_path(&self, slot: Slot) -> PathBuf {
        let seq = self.state_file_seq.fetch_add(1, Ordering::Relaxed);
        self.state_dir.join(format!("mock_state_{slot}_{seq}.ssz"))
    }
}

#[async_trait]
impl<V: EthSpecVariant> BeaconClient<V> for MockBeaconClient<V> {
    async fn get_finalized_checkpoint(&self, _cancel: &CancellationToken) -> Result<FinalizedCheckpoint> {
        pop_front(&self.finalized_checkpoint)
    }

    async fn get_bootstrap(&self, _block_root: Hash256, _cancel: &CancellationToken) -> Result<Bootstrap<V>> {
        pop_front(&self.bootstrap)
    }

    async fn get_genesis(&self, _cancel: &CancellationToken) -> Result<Genesis> {
        pop_front(&self.genesis)
    }

    async fn get_committee_period_update(&self, _period: u64, _cancel: &CancellationToken) -> Result<CommitteePeriodUpdate<V>> {
        pop_front(&self.committee_period_update)
    }

    async fn get_latest_finalized_update(&self, _cancel: &CancellationToken) -> Result<FinalizedUpdate<V>> {
        pop_front(&self.finalized_update)
    }

    async fn get_header_by_slot(&self, slot: Slot, _cancel: &CancellationToken) -> Result<BeaconHeader> {
        self.header_lookup_count.fetch_add(1, Ordering::Relaxed);
        self.headers_by_slot
            .lock()
            .expect("mock beacon client mutex poisoned")
            .get(&slot)
            .cloned()
            .unwrap_or(Outcome::HeaderNotAtSlot(slot))
            .into_result()
    }

    async fn get_beacon_block_root(&self, slot: Slot, _cancel: &CancellationToken) -> Result<Hash256> {
        self.block_roots_by_slot
            .lock()
            .expect("mock beacon client mutex poisoned")
            .get(&slot)
            .cloned()
            .unwrap_or(Outcome::HeaderNotAtSlot(slot))
            .into_result()
    }

    async fn get_beacon_block(&self, block_root: Hash256, _cancel: &CancellationToken) -> Result<BeaconBlock<V>> {
        self.blocks_by_root
            .lock()
            .expect("mock beacon client mutex poisoned")
            .get(&block_root)
            .cloned()
            .ok_or_else(|| CoreError::from(NotFoundKind::HeaderNotAtSlot(0)))?
            .into_result()
    }

    async fn download_beacon_state(&self, slot: Slot, _cancel: &CancellationToken) -> Result<TempStateFile> {
        let outcome = self
            .state_bytes_by_slot
            .lock()
            .expect("mock beacon client mutex poisoned")
            .get(&slot)
            .cloned()
            .unwrap_or(Outcome::StateNotAvailableYet(slot));
        let bytes = outcome.into_result()?;

        std::fs::create_dir_all(&self.state_dir)?;
        let path = self.next_state_file_path(slot);
        tokio::fs::write(&path, &bytes).await?;
        Ok(TempStateFile::new(path))
    }
}
