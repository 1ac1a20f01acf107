//! Spec-variant and runtime configuration.
//!
//! Beacon chain presets ("mainnet", "minimal") differ only in a handful of
//! size constants and the shape of a few SSZ containers. [`EthSpecVariant`]
//! carries those constants as associated constants on zero-sized marker
//! types ([`Mainnet`], [`Minimal`]), so variant dispatch happens once, at
//! construction, rather than as a tag threaded through every call.

use std::fmt;

use ssz_types::typenum::{Unsigned, U32, U512, U64, U8192};

/// The block-roots vector sits at this generalized index within a
/// `BeaconState` Merkle tree for every post-Altair fork this crate targets.
/// Tied to the SSZ layout of `BeaconStateCapella`; a fork that reshapes the
/// container requires updating this constant in lockstep with the type.
pub const BLOCK_ROOTS_GENERALIZED_INDEX: usize = 37;

/// The execution payload sits at this generalized index within a
/// `BeaconBlockBody` Merkle tree from Bellatrix onward.
pub const EXECUTION_PAYLOAD_GENERALIZED_INDEX: usize = 25;

/// Depth of the top-level `BeaconState` field tree (32 leaf slots, 29 used).
pub const BEACON_STATE_FIELD_TREE_DEPTH: usize = 5;

/// Depth of the top-level `BeaconBlockBody` field tree (16 leaf slots, 11 used).
pub const BEACON_BLOCK_BODY_FIELD_TREE_DEPTH: usize = 4;

/// A beacon chain preset. Selects vector lengths and SSZ layouts.
///
/// The `*Typenum` associated types carry the same sizes as compile-time
/// typenum unsigned integers, so `FixedVector`/`BitVector` fields can be
/// parameterized directly on the variant (the way lighthouse's `EthSpec`
/// trait does), instead of threading a runtime size tag through every SSZ
/// container.
pub trait EthSpecVariant: Clone + fmt::Debug + Send + Sync + 'static {
    type SlotsPerHistoricalRootTypenum: Unsigned + Clone + fmt::Debug + Send + Sync + 'static;
    type SyncCommitteeSizeTypenum: Unsigned + Clone + fmt::Debug + Send + Sync + 'static;

    /// `log2(SLOTS_PER_HISTORICAL_ROOT)`.
    const HISTORY_TREE_DEPTH: usize;

    fn name() -> &'static str;

    /// Length of the `block_roots` / `state_roots` vectors in `BeaconState`,
    /// and the bound of the ancestry-proof window.
    fn slots_per_historical_root() -> usize {
        Self::SlotsPerHistoricalRootTypenum::to_usize()
    }

    /// Number of validators in a sync committee.
    fn sync_committee_size() -> usize {
        Self::SyncCommitteeSizeTypenum::to_usize()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mainnet;

impl EthSpecVariant for Mainnet {
    type SlotsPerHistoricalRootTypenum = U8192;
    type SyncCommitteeSizeTypenum = U512;
    const HISTORY_TREE_DEPTH: usize = 13;

    fn name() -> &'static str {
        "mainnet"
    }
}

#[derive(Clone, Debug, Default)]
pub struct Minimal;

impl EthSpecVariant for Minimal {
    type SlotsPerHistoricalRootTypenum = U64;
    type SyncCommitteeSizeTypenum = U32;
    const HISTORY_TREE_DEPTH: usize = 6;

    fn name() -> &'static str {
        "minimal"
    }
}

/// Runtime-selected spec variant, used where the variant isn't known at
/// compile time (e.g. reading `BEACON_SPEC_VARIANT` from the environment).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecVariant {
    Mainnet,
    Minimal,
}

impl SpecVariant {
    pub fn slots_per_historical_root(self) -> usize {
        match self {
            SpecVariant::Mainnet => Mainnet::slots_per_historical_root(),
            SpecVariant::Minimal => Minimal::slots_per_historical_root(),
        }
    }

    pub fn sync_committee_size(self) -> usize {
        match self {
            SpecVariant::Mainnet => Mainnet::sync_committee_size(),
            SpecVariant::Minimal => Minimal::sync_committee_size(),
        }
    }

    pub fn history_tree_depth(self) -> usize {
        match self {
            SpecVariant::Mainnet => Mainnet::HISTORY_TREE_DEPTH,
            SpecVariant::Minimal => Minimal::HISTORY_TREE_DEPTH,
        }
    }
}

impl fmt::Display for SpecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVariant::Mainnet => write!(f, "mainnet"),
            SpecVariant::Minimal => write!(f, "minimal"),
        }
    }
}

/// Runtime configuration for the update assembler and beacon client facade.
///
/// `beacon_endpoints` is plural to support fallback across multiple beacon
/// nodes.
#[derive(Clone, Debug)]
pub struct Config {
    pub spec_variant: SpecVariant,
    pub slots_in_epoch: u64,
    pub epochs_per_sync_committee_period: u64,
    pub max_slots_per_historical_root: u64,
    pub beacon_endpoints: Vec<String>,
    /// Directory used to stage downloaded beacon state files before they are
    /// parsed and deleted. Defaults to a subdirectory of the OS temp dir.
    pub state_dir: std::path::PathBuf,
}

impl Config {
    pub fn mainnet(beacon_endpoints: Vec<String>) -> Self {
        Self {
            spec_variant: SpecVariant::Mainnet,
            slots_in_epoch: 32,
            epochs_per_sync_committee_period: 256,
            max_slots_per_historical_root: Mainnet::slots_per_historical_root() as u64,
            beacon_endpoints,
            state_dir: default_state_dir(),
        }
    }

    pub fn minimal(beacon_endpoints: Vec<String>) -> Self {
        Self {
            spec_variant: SpecVariant::Minimal,
            slots_in_epoch: 8,
            epochs_per_sync_committee_period: 8,
            max_slots_per_historical_root: Minimal::slots_per_historical_root() as u64,
            beacon_endpoints,
            state_dir: default_state_dir(),
        }
    }

    /// Read configuration from the environment: `BEACON_ENDPOINTS` (comma
    /// separated), `BEACON_SPEC_VARIANT` (`mainnet`|`minimal`, default
    /// `mainnet`), `BEACON_STATES_DIR` (optional override for
    /// [`Config::state_dir`]).
    pub fn from_env() -> Self {
        let endpoints = std::env::var("BEACON_ENDPOINTS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut config = match std::env::var("BEACON_SPEC_VARIANT").as_deref() {
            Ok("minimal") => Self::minimal(endpoints),
            _ => Self::mainnet(endpoints),
        };

        if let Ok(dir) = std::env::var("BEACON_STATES_DIR") {
            config.state_dir = std::path::PathBuf::from(dir);
        }

        config
    }

    /// `slot / (slots_in_epoch * epochs_per_sync_committee_period)`.
    pub fn compute_sync_period(&self, slot: u64) -> u64 {
        slot / (self.slots_in_epoch * self.epochs_per_sync_committee_period)
    }
}

fn default_state_dir() -> std::path::PathBuf {
    std::env::temp_dir().join("beacon_light_client_states")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_sync_period_mainnet() {
        let config = Config::mainnet(vec!["http://localhost:5052".into()]);
        // mainnet: 32 slots/epoch * 256 epochs/period = 8192 slots/period
        assert_eq!(config.compute_sync_period(0), 0);
        assert_eq!(config.compute_sync_period(8191), 0);
        assert_eq!(config.compute_sync_period(8192), 1);
        assert_eq!(config.compute_sync_period(11 * 8192 + 100), 11);
        assert_eq!(config.compute_sync_period(12 * 8192 + 5), 12);
    }

    #[test]
    fn from_env_defaults_to_mainnet() {
        std::env::remove_var("BEACON_SPEC_VARIANT");
        std::env::remove_var("BEACON_ENDPOINTS");
        let config = Config::from_env();
        assert_eq!(config.spec_variant, SpecVariant::Mainnet);
        assert!(config.beacon_endpoints.is_empty());
    }
}
