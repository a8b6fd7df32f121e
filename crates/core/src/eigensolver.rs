//! Seam to an external frequency-domain eigenmode solver.
//!
//! The engine never iterates on its own; tolerance and iteration limits are
//! handed through untouched in [`EigenOptions`].

use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::frequency::FrequencyPoint;
use crate::grid::MonitorGrid;
use crate::mode::ModeBasisVector;
use crate::symmetry::ParitySelector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenOptions {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-8,
        }
    }
}

impl EigenOptions {
    pub fn validate(&self) -> Result<(), ModeError> {
        if self.max_iter == 0 {
            return Err(ModeError::InvalidConfig(
                "eigensolver max_iter must be at least 1".to_string(),
            ));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ModeError::InvalidConfig(format!(
                "eigensolver tol must be positive, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Result of one band solve.
#[derive(Debug, Clone)]
pub enum EigenOutcome {
    Converged(ModeBasisVector),
    /// The root-find for β gave up; usually the band is evanescent here.
    NotConverged { iterations: usize, residual: f64 },
}

pub trait EigenmodeSolver: Send + Sync {
    /// Solver identity, used in basis provenance.
    fn name(&self) -> &str;

    /// Monitor the solver produces profiles for.
    fn monitor(&self) -> MonitorGrid;

    /// Upper bound on band indices, if the solver knows one.
    fn max_bands(&self) -> Option<usize> {
        None
    }

    /// Solve for `band` (1-based, decreasing β) at `frequency`.
    fn solve_band(
        &self,
        frequency: FrequencyPoint,
        band: usize,
        parity: &ParitySelector,
        direction_hint: Option<[f64; 3]>,
        options: &EigenOptions,
    ) -> Result<EigenOutcome, ModeError>;
}
