use thiserror::Error;

use crate::assembler::Update;

/// Distinguished "not found" conditions surfaced by the beacon client facade.
///
/// These are not transport failures: the endpoint answered, it simply has
/// nothing at the requested slot (yet, or ever).
#[derive(Debug, Error)]
pub enum NotFoundKind {
    /// `get_header_by_slot` found no block at the requested slot. Recoverable
    /// locally by the assembler, which advances the slot and retries.
    #[error("no beacon header at slot {0}")]
    HeaderNotAtSlot(u64),

    /// `download_beacon_state` has nothing for the requested slot yet. The
    /// outer driver is expected to retry after a delay.
    #[error("beacon state not available yet for slot {0}")]
    StateNotAvailableYet(u64),
}

/// The sync-committee rotation boundary was crossed underneath a
/// committee-period update request.
#[derive(Debug, Error)]
#[error("finalized header for period {requested_period} actually falls in period {actual_period}")]
pub struct BoundaryError {
    pub requested_period: u64,
    pub actual_period: u64,
}

/// Malformed wire data: SSZ bytes that don't decode, or a beacon API JSON
/// response missing fields the facade depends on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("ssz decode error: {0}")]
    Ssz(String),

    #[error("unexpected beacon API response shape: {0}")]
    Api(String),

    #[error("malformed canonical-encoding wire data: {0}")]
    Wire(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A proof or header failed an internal consistency check. These indicate a
/// bug in this crate or an inconsistency on the beacon node side, and must
/// never be silently retried or relayed.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("leaf {computed} does not match expected root {expected} for index {index}")]
    LeafMismatch {
        index: usize,
        computed: String,
        expected: String,
    },

    #[error("generalized index {0} is out of range for a tree of depth {1}")]
    IndexOutOfRange(usize, usize),

    #[error("block-roots tree handle missing; checkpoint was not primed")]
    MissingBlockRootsTree,

    #[error("hash_tree_root(header) did not match the block root returned for its slot")]
    HeaderRootMismatch,
}

/// The complete error taxonomy surfaced by this crate. Each variant is a
/// *kind*, not a specific failure site; call sites attach context with
/// `.map_err`/`?` as usual.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    NotFound(#[from] NotFoundKind),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Outcome of [`crate::assembler::UpdateAssembler::get_sync_committee_period_update`].
///
/// The boundary case is not a plain `Result<Update, CoreError>` because the
/// caller needs the assembled (but un-submittable) update to decide whether
/// to retry with the next period — see `spec.md` §7.
#[derive(Debug)]
pub enum SyncCommitteePeriodUpdateOutcome {
    /// The finalized header landed in the requested period; safe to submit.
    Ok(Update),
    /// The finalized header landed in a later period. `update` is returned
    /// for inspection only; callers must not submit it.
    WrongPeriod { update: Update, error: BoundaryError },
}
