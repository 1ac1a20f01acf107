//! Beacon client facade: the narrow interface over a beacon
//! HTTP endpoint that the rest of the crate depends on.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, EthSpecVariant};
use crate::error::{CoreError, DecodeError, NotFoundKind, Result};
use crate::ssz::{BeaconBlock, BeaconHeader, Hash256, Slot, SyncAggregate, SyncCommittee};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedCheckpoint {
    pub finalized_block_root: Hash256,
}

#[derive(Debug, Clone)]
pub struct Genesis {
    pub genesis_validators_root: Hash256,
}

#[derive(Debug, Clone)]
pub struct Bootstrap<V: EthSpecVariant> {
    pub header: BeaconHeader,
    pub current_sync_committee: SyncCommittee<V>,
    pub current_sync_committee_branch: Vec<Hash256>,
}

#[derive(Debug, Clone)]
pub struct CommitteePeriodUpdate<V: EthSpecVariant> {
    pub attested_header: BeaconHeader,
    pub finalized_header: BeaconHeader,
    pub finality_branch: Vec<Hash256>,
    pub next_sync_committee: SyncCommittee<V>,
    pub next_sync_committee_branch: Vec<Hash256>,
    pub sync_aggregate: SyncAggregate<V>,
    pub signature_slot: Slot,
}

#[derive(Debug, Clone)]
pub struct FinalizedUpdate<V: EthSpecVariant> {
    pub attested_header: BeaconHeader,
    pub finalized_header: BeaconHeader,
    pub finality_branch: Vec<Hash256>,
    pub sync_aggregate: SyncAggregate<V>,
    pub signature_slot: Slot,
}

/// A downloaded beacon state SSZ blob staged on disk. Deleted on drop,
/// regardless of whether it was ever read, so every exit path releases it
/// without a manual try/finally.
pub struct TempStateFile {
    path: PathBuf,
}

impl TempStateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

impl Drop for TempStateFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed temporary beacon state file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temporary beacon state file"),
        }
    }
}

/// Narrow interface over a beacon HTTP endpoint, parametric in the spec
/// variant so response bodies decode straight into the right
/// `SyncCommittee`/`SyncAggregate` shape. All methods accept a
/// [`CancellationToken`] at the I/O boundary; CPU-bound decode/hash/prove
/// work downstream of these calls is not cancellable.
#[async_trait]
pub trait BeaconClient<V: EthSpecVariant>: Send + Sync {
    async fn get_finalized_checkpoint(&self, cancel: &CancellationToken) -> Result<FinalizedCheckpoint>;
    async fn get_bootstrap(&self, block_root: Hash256, cancel: &CancellationToken) -> Result<Bootstrap<V>>;
    async fn get_genesis(&self, cancel: &CancellationToken) -> Result<Genesis>;
    async fn get_committee_period_update(&self, period: u64, cancel: &CancellationToken) -> Result<CommitteePeriodUpdate<V>>;
    async fn get_latest_finalized_update(&self, cancel: &CancellationToken) -> Result<FinalizedUpdate<V>>;
    async fn get_header_by_slot(&self, slot: Slot, cancel: &CancellationToken) -> Result<BeaconHeader>;
    async fn get_beacon_block_root(&self, slot: Slot, cancel: &CancellationToken) -> Result<Hash256>;
    async fn get_beacon_block(&self, block_root: Hash256, cancel: &CancellationToken) -> Result<BeaconBlock<V>>;
    async fn download_beacon_state(&self, slot: Slot, cancel: &CancellationToken) -> Result<TempStateFile>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// `reqwest`-backed [`BeaconClient`] with multi-endpoint fallback: each call
/// tries `config.beacon_endpoints` in order, continuing past transport
/// errors and returning the first successful (or first distinguished
/// not-found) response.
pub struct HttpBeaconClient<V: EthSpecVariant> {
    http: reqwest::Client,
    endpoints: Vec<String>,
    state_dir: PathBuf,
    state_file_seq: AtomicU64,
    _variant: PhantomData<V>,
}

impl<V: EthSpecVariant> HttpBeaconClient<V> {
    pub fn new(config: &Config) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.state_dir)?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoints: config.beacon_endpoints.clone(),
            state_dir: config.state_dir.clone(),
            state_file_seq: AtomicU64::new(0),
            _variant: PhantomData,
        })
    }

    /// Issues `GET {endpoint}{path}` against each configured endpoint in
    /// turn. Transport errors fall through to the next endpoint; a
    /// successful response (including a 404, handled by the caller) returns
    /// immediately. The last endpoint's transport error is returned if all
    /// endpoints fail.
    async fn get_bytes(&self, path: &str, cancel: &CancellationToken) -> Result<(reqwest::StatusCode, Vec<u8>)> {
        if self.endpoints.is_empty() {
            return Err(CoreError::Decode(DecodeError::Api(
                "no beacon endpoints configured".into(),
            )));
        }
        let mut last_err = None;
        for endpoint in &self.endpoints {
            let url = format!("{}{}", endpoint.trim_end_matches('/'), path);
            let request = self.http.get(&url).send();
            tokio::select! {
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                result = request => match result {
                    Ok(response) => {
                        let status = response.status();
                        let bytes = response.bytes().await.map_err(CoreError::Transport)?;
                        return Ok((status, bytes.to_vec()));
                    }
                    Err(e) => {
                        tracing::warn!(url, error = %e, "beacon endpoint unreachable, trying next");
                        last_err = Some(e);
                    }
                },
            }
        }
        Err(CoreError::Transport(last_err.expect("at least one endpoint configured")))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, cancel: &CancellationToken) -> Result<T> {
        let (status, bytes) = self.get_bytes(path, cancel).await?;
        if !status.is_success() {
            return Err(CoreError::Decode(DecodeError::Api(format!(
                "{path} returned HTTP {status}"
            ))));
        }
        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(DecodeError::from)?;
        Ok(envelope.data)
    }

    fn next_state_file_path(&self, slot: Slot) -> PathBuf {
        let seq = self.state_file_seq.fetch_add(1, Ordering::Relaxed);
        self.state_dir.join(format!("state_{slot}_{seq}.ssz"))
    }
}

#[async_trait]
impl<V: EthSpecVariant> BeaconClient<V> for HttpBeaconClient<V> {
    async fn get_finalized_checkpoint(&self, cancel: &CancellationToken) -> Result<FinalizedCheckpoint> {
        #[derive(Deserialize)]
        struct FinalityCheckpoints {
            finalized: CheckpointJson,
        }
        #[derive(Deserialize)]
        struct CheckpointJson {
            root: Hash256,
        }
        let checkpoints: FinalityCheckpoints = self
            .get_json("/eth/v1/beacon/states/head/finality_checkpoints", cancel)
            .await?;
        Ok(FinalizedCheckpoint {
            finalized_block_root: checkpoints.finalized.root,
        })
    }

    async fn get_bootstrap(&self, block_root: Hash256, cancel: &CancellationToken) -> Result<Bootstrap<V>> {
        #[derive(Deserialize)]
        #[serde(bound = "V: EthSpecVariant")]
        struct BootstrapJson<V: EthSpecVariant> {
            header: HeaderWrapper,
            current_sync_committee: SyncCommittee<V>,
            current_sync_committee_branch: Vec<Hash256>,
        }
        #[derive(Deserialize)]
        struct HeaderWrapper {
            beacon: BeaconHeader,
        }
        let path = format!("/eth/v1/beacon/light_client/bootstrap/{block_root:#x}");
        let body: BootstrapJson<V> = self.get_json(&path, cancel).await?;
        Ok(Bootstrap {
            header: body.header.beacon,
            current_sync_committee: body.current_sync_committee,
            current_sync_committee_branch: body.current_sync_committee_branch,
        })
    }

    async fn get_genesis(&self, cancel: &CancellationToken) -> Result<Genesis> {
        #[derive(Deserialize)]
        struct GenesisJson {
            genesis_validators_root: Hash256,
        }
        let genesis: GenesisJson = self.get_json("/eth/v1/beacon/genesis", cancel).await?;
        Ok(Genesis {
            genesis_validators_root: genesis.genesis_validators_root,
        })
    }

    async fn get_committee_period_update(&self, period: u64, cancel: &CancellationToken) -> Result<CommitteePeriodUpdate<V>> {
        #[derive(Deserialize)]
        #[serde(bound = "V: EthSpecVariant")]
        struct UpdateJson<V: EthSpecVariant> {
            attested_header: HeaderWrapper,
            finalized_header: HeaderWrapper,
            finality_branch: Vec<Hash256>,
            next_sync_committee: SyncCommittee<V>,
            next_sync_committee_branch: Vec<Hash256>,
            sync_aggregate: SyncAggregate<V>,
            #[serde(with = "crate::ssz::quoted_u64")]
            signature_slot: Slot,
        }
        #[derive(Deserialize)]
        struct HeaderWrapper {
            beacon: BeaconHeader,
        }
        let path = format!("/eth/v1/beacon/light_client/updates?start_period={period}&count=1");
        let mut updates: Vec<UpdateJson<V>> = {
            #[derive(Deserialize)]
            #[serde(bound = "V: EthSpecVariant")]
            struct Envelope<V: EthSpecVariant> {
                data: UpdateJson<V>,
            }
            let (status, bytes) = self.get_bytes(&path, cancel).await?;
            if !status.is_success() {
                return Err(CoreError::Decode(DecodeError::Api(format!(
                    "{path} returned HTTP {status}"
                ))));
            }
            let envelopes: Vec<Envelope<V>> = serde_json::from_slice(&bytes).map_err(DecodeError::from)?;
            envelopes.into_iter().map(|e| e.data).collect()
        };
        let update = updates
            .pop()
            .ok_or_else(|| CoreError::Decode(DecodeError::Api(format!("no committee update for period {period}"))))?;
        Ok(CommitteePeriodUpdate {
            attested_header: update.attested_header.beacon,
            finalized_header: update.finalized_header.beacon,
            finality_branch: update.finality_branch,
            next_sync_committee: update.next_sync_committee,
            next_sync_committee_branch: update.next_sync_committee_branch,
            sync_aggregate: update.sync_aggregate,
            signature_slot: update.signature_slot,
        })
    }

    async fn get_latest_finalized_update(&self, cancel: &CancellationToken) -> Result<FinalizedUpdate<V>> {
        #[derive(Deserialize)]
        #[serde(bound = "V: EthSpecVariant")]
        struct FinalityUpdateJson<V: EthSpecVariant> {
            attested_header: HeaderWrapper,
            finalized_header: HeaderWrapper,
            finality_branch: Vec<Hash256>,
            sync_aggregate: SyncAggregate<V>,
            #[serde(with = "crate::ssz::quoted_u64")]
            signature_slot: Slot,
        }
        #[derive(Deserialize)]
        struct HeaderWrapper {
            beacon: BeaconHeader,
        }
        let update: FinalityUpdateJson<V> = self
            .get_json("/eth/v1/beacon/light_client/finality_update", cancel)
            .await?;
        Ok(FinalizedUpdate {
            attested_header: update.attested_header.beacon,
            finalized_header: update.finalized_header.beacon,
            finality_branch: update.finality_branch,
            sync_aggregate: update.sync_aggregate,
            signature_slot: update.signature_slot,
        })
    }

    async fn get_header_by_slot(&self, slot: Slot, cancel: &CancellationToken) -> Result<BeaconHeader> {
        #[derive(Deserialize)]
        struct HeaderResponse {
            header: SignedHeader,
        }
        #[derive(Deserialize)]
        struct SignedHeader {
            message: BeaconHeader,
        }
        let path = format!("/eth/v1/beacon/headers/{slot}");
        let (status, bytes) = self.get_bytes(&path, cancel).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NotFoundKind::HeaderNotAtSlot(slot).into());
        }
        if !status.is_success() {
            return Err(CoreError::Decode(DecodeError::Api(format!(
                "{path} returned HTTP {status}"
            ))));
        }
        let envelope: Envelope<HeaderResponse> = serde_json::from_slice(&bytes).map_err(DecodeError::from)?;
        Ok(envelope.data.header.message)
    }

    async fn get_beacon_block_root(&self, slot: Slot, cancel: &CancellationToken) -> Result<Hash256> {
        #[derive(Deserialize)]
        struct RootJson {
            root: Hash256,
        }
        let path = format!("/eth/v1/beacon/blocks/{slot}/root");
        let (status, bytes) = self.get_bytes(&path, cancel).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NotFoundKind::HeaderNotAtSlot(slot).into());
        }
        if !status.is_success() {
            return Err(CoreError::Decode(DecodeError::Api(format!(
                "{path} returned HTTP {status}"
            ))));
        }
        let envelope: Envelope<RootJson> = serde_json::from_slice(&bytes).map_err(DecodeError::from)?;
        Ok(envelope.data.root)
    }

    async fn get_beacon_block(&self, block_root: Hash256, cancel: &CancellationToken) -> Result<BeaconBlock<V>> {
        #[derive(Deserialize)]
        #[serde(bound = "V: EthSpecVariant")]
        struct SignedBlock<V: EthSpecVariant> {
            message: BeaconBlock<V>,
        }
        let path = format!("/eth/v2/beacon/blocks/{block_root:#x}");
        let envelope: SignedBlock<V> = self.get_json(&path, cancel).await?;
        Ok(envelope.message)
    }

    async fn download_beacon_state(&self, slot: Slot, cancel: &CancellationToken) -> Result<TempStateFile> {
        if self.endpoints.is_empty() {
            return Err(CoreError::Decode(DecodeError::Api(
                "no beacon endpoints configured".into(),
            )));
        }
        let path = format!("/eth/v2/debug/beacon/states/{slot}");
        let mut last_err = None;
        for endpoint in &self.endpoints {
            let url = format!("{}{}", endpoint.trim_end_matches('/'), path);
            let request = self
                .http
                .get(&url)
                .header("Accept", "application/octet-stream")
                .send();
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                result = request => result,
            };
            let mut response = match response {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(url, error = %e, "beacon endpoint unreachable, trying next");
                    last_err = Some(e);
                    continue;
                }
            };
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(NotFoundKind::StateNotAvailableYet(slot).into());
            }
            if !response.status().is_success() {
                continue;
            }

            let temp_file = TempStateFile::new(self.next_state_file_path(slot));
            let mut file = tokio::fs::File::create(temp_file.path()).await?;
            loop {
                let chunk = tokio::select! {
                    _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                    chunk = response.chunk() => chunk.map_err(CoreError::Transport)?,
                };
                match chunk {
                    Some(bytes) => file.write_all(&bytes).await?,
                    None => break,
                }
            }
            file.flush().await?;
            return Ok(temp_file);
        }
        match last_err {
            Some(e) => Err(CoreError::Transport(e)),
            None => Err(NotFoundKind::StateNotAvailableYet(slot).into()),
        }
    }
}
