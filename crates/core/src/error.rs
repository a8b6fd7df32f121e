//! Error taxonomy for the decomposition engine.
//!
//! Every variant is a configuration error: the caller asked for something
//! inconsistent and nothing is retried. Eigensolver non-convergence is *not*
//! represented here; it degrades to a zero coefficient plus a warning (see
//! [`crate::projection::decompose_requests`]).

use crate::recording::MonitorId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModeError {
    #[error("monitor geometry mismatch: {0}")]
    GeometryMismatch(String),

    #[error("frequency mismatch: sample at ω={sample}, basis at ω={basis}")]
    FrequencyMismatch { sample: f64, basis: f64 },

    #[error("reference dataset for monitor '{monitor}' does not cover ω={omega}")]
    FrequencyCoverage { monitor: MonitorId, omega: f64 },

    #[error("monitor mismatch: expected '{expected}', found '{found}'")]
    MonitorMismatch { expected: MonitorId, found: MonitorId },

    #[error("invalid frequency ω={0}: must be finite and non-negative")]
    InvalidFrequency(f64),

    #[error("band indices are 1-based, got band {0}")]
    InvalidBandIndex(usize),

    #[error("band {band} requested but the solver only provides {available}")]
    BandOutOfRange { band: usize, available: usize },

    #[error("diffraction order {order} is evanescent at ω={omega}")]
    EvanescentOrder { order: String, omega: f64 },

    #[error("diffraction order {order} has {found} indices, lattice has {expected} periodic directions")]
    OrderRank {
        order: String,
        expected: usize,
        found: usize,
    },

    #[error("plane of incidence is undefined: wavevector is parallel to axis {axis:?}")]
    DegeneratePlaneOfIncidence { axis: [f64; 3] },

    #[error("invalid parity selection: {0}")]
    InvalidParity(String),

    #[error("basis source cannot serve this request: {0}")]
    UnsupportedRequest(String),

    #[error("phases are not comparable across provenances ({left} vs {right})")]
    IncomparablePhase { left: String, right: String },

    #[error("reference dataset for monitor '{0}' already stored")]
    DuplicateReference(MonitorId),

    #[error("duplicate frequency ω={0} in recording")]
    DuplicateFrequency(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
