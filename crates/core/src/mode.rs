//! Basis modes and the coefficients extracted against them.

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::field::TangentialField;
use crate::frequency::FrequencyPoint;
use crate::grid::MonitorGrid;
use crate::lattice::DiffractionOrder;
use crate::polarization::Polarization;

/// Relative size of Im β above which a mode counts as evanescent.
pub const EVANESCENT_TOL: f64 = 1e-9;

/// Wavevector component along the monitor normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationConstant(pub Complex64);

impl PropagationConstant {
    pub fn real(beta: f64) -> Self {
        Self(Complex64::new(beta, 0.0))
    }

    pub fn value(&self) -> Complex64 {
        self.0
    }

    pub fn is_evanescent(&self) -> bool {
        let beta = self.0;
        beta.im.abs() > EVANESCENT_TOL * beta.norm().max(f64::MIN_POSITIVE)
    }
}

/// Where a basis vector came from, and hence which phase convention it uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Numerical eigensolver; the global phase follows `phase_convention`.
    Eigensolver {
        solver: String,
        phase_convention: String,
    },
    /// Closed-form planewave with caller-supplied S/P amplitudes.
    AnalyticPlanewave,
}

impl Provenance {
    pub fn is_phase_comparable(&self, other: &Provenance) -> bool {
        self == other
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Eigensolver {
                solver,
                phase_convention,
            } => write!(f, "eigensolver:{solver}[{phase_convention}]"),
            Provenance::AnalyticPlanewave => f.write_str("analytic-planewave"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisLabel {
    /// 1-based band index, ordered by decreasing propagation constant.
    Band(usize),
    Order(DiffractionOrder),
}

impl fmt::Display for BasisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisLabel::Band(band) => write!(f, "band{band}"),
            BasisLabel::Order(order) => write!(f, "order{order}"),
        }
    }
}

/// One element of a decomposition basis: the forward-travelling transverse
/// profile on the monitor grid plus its propagation constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeBasisVector {
    pub label: BasisLabel,
    pub frequency: FrequencyPoint,
    pub profile: TangentialField,
    pub beta: PropagationConstant,
    /// Transverse wavevector, used for angles; zero when unknown.
    pub transverse_k: [f64; 2],
    pub polarization: Polarization,
    pub provenance: Provenance,
}

impl ModeBasisVector {
    pub fn grid(&self) -> MonitorGrid {
        self.profile.grid()
    }

    /// Overlap of the mode with itself, `N = Σ n̂·(E* × H) dA`.
    pub fn self_overlap(&self) -> Complex64 {
        self.profile.cross_overlap(&self.profile)
    }

    /// Power carried by the unscaled profile.
    pub fn power(&self) -> f64 {
        self.self_overlap().re
    }

    pub fn backward_profile(&self) -> TangentialField {
        self.profile.reversed()
    }

    pub fn is_evanescent(&self) -> bool {
        self.beta.is_evanescent() || self.power() <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoefficientStatus {
    Propagating,
    Evanescent,
    NotConverged,
}

/// Complex amplitude of one mode in one direction; `|α|²` is the power it
/// carries through the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeCoefficient {
    pub amplitude: Complex64,
    pub direction: Direction,
    pub status: CoefficientStatus,
    pub provenance: Provenance,
}

impl ModeCoefficient {
    pub fn zero(direction: Direction, status: CoefficientStatus, provenance: Provenance) -> Self {
        Self {
            amplitude: Complex64::ZERO,
            direction,
            status,
            provenance,
        }
    }

    /// Power in this mode; zero unless the mode propagates.
    pub fn power(&self) -> f64 {
        match self.status {
            CoefficientStatus::Propagating => self.amplitude.norm_sqr(),
            _ => 0.0,
        }
    }

    pub fn phase(&self) -> f64 {
        self.amplitude.arg()
    }

    pub fn is_propagating(&self) -> bool {
        self.status == CoefficientStatus::Propagating
    }

    /// Phase of `self` relative to `other`, wrapped to (−π, π].
    ///
    /// Only meaningful when both bases share a phase-fixing convention.
    pub fn relative_phase(&self, other: &ModeCoefficient) -> Result<f64, ModeError> {
        if !self.provenance.is_phase_comparable(&other.provenance) {
            return Err(ModeError::IncomparablePhase {
                left: self.provenance.to_string(),
                right: other.provenance.to_string(),
            });
        }
        Ok((self.amplitude * other.amplitude.conj()).arg())
    }
}
