//! Fetches a bootstrap checkpoint and the next sync-committee-period update
//! from a live beacon node, printing the assembled records' key fields.
//!
//! Run with a reachable beacon HTTP endpoint:
//! `BEACON_ENDPOINTS=http://localhost:5052 cargo run --example sync_checkpoint`

use std::sync::Arc;

use beacon_light_client_core::assembler::{get_sync_periods_to_fetch, UpdateAssembler};
use beacon_light_client_core::beacon_client::HttpBeaconClient;
use beacon_light_client_core::config::{Config, Mainnet};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let client = Arc::new(HttpBeaconClient::<Mainnet>::new(&config)?);
    let assembler = UpdateAssembler::new(config.clone(), client);
    let cancel = CancellationToken::new();

    let checkpoint = assembler.get_checkpoint(&cancel).await?;
    tracing::info!(slot = checkpoint.header.slot, "fetched bootstrap checkpoint");

    let current_period = config.compute_sync_period(checkpoint.header.slot);
    for period in get_sync_periods_to_fetch(current_period, current_period + 1) {
        match assembler.get_sync_committee_period_update(period, &cancel).await? {
            beacon_light_client_core::error::SyncCommitteePeriodUpdateOutcome::Ok(update) => {
                tracing::info!(
                    attested_slot = update.attested_header.slot,
                    finalized_slot = update.finalized_header.slot,
                    "assembled sync-committee-period update"
                );
            }
            beacon_light_client_core::error::SyncCommitteePeriodUpdateOutcome::WrongPeriod { error, .. } => {
                tracing::warn!(%error, "finalized header rotated past the requested period; retry next tick");
            }
        }
    }

    Ok(())
}
