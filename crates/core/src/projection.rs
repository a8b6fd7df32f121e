//! Projection of sampled monitor fields onto a mode basis.
//!
//! Uses both E and H so that forward and backward waves with the same
//! transverse shape separate. With the cross overlap
//! `⟨a, b⟩ = Σ n̂·(E_a* × H_b) dA`, `N = ⟨m, m⟩` and a sample `s`:
//!
//! ```text
//! c1 = ⟨m, s⟩          = N  (a − b)
//! c2 = conj(⟨s, m⟩)    = N* (a + b)
//! a  = (c2/N* + c1/N) / 2      b = (c2/N* − c1/N) / 2
//! α± = (a | b) · √(Re N)
//! ```
//!
//! so `|α|²` is the power that mode carries, whatever the profile's own
//! normalization.

use std::time::Instant;

use log::{debug, warn};
use num_complex::Complex64;

use crate::error::ModeError;
use crate::frequency::FrequencyPoint;
use crate::mode::{BasisLabel, CoefficientStatus, Direction, ModeBasisVector, ModeCoefficient, Provenance};
use crate::provider::{BasisRequest, BasisResponse, ModeBasisProvider};
use crate::recording::{FieldSample, MonitorId};

/// Forward and backward coefficients of one basis vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeCoefficients {
    pub index: usize,
    pub label: BasisLabel,
    pub beta: Complex64,
    pub transverse_k: [f64; 2],
    /// Power carried by the unscaled basis profile.
    pub mode_power: f64,
    pub forward: ModeCoefficient,
    pub backward: ModeCoefficient,
}

impl ModeCoefficients {
    pub fn get(&self, direction: Direction) -> &ModeCoefficient {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn status(&self) -> CoefficientStatus {
        self.forward.status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    NotConverged { reason: String },
    Evanescent,
}

/// Side-channel signal that a coefficient was forced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionWarning {
    pub index: usize,
    pub label: BasisLabel,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub monitor: MonitorId,
    pub frequency: FrequencyPoint,
    pub modes: Vec<ModeCoefficients>,
    pub warnings: Vec<DecompositionWarning>,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn coefficient(&self, index: usize, direction: Direction) -> Option<&ModeCoefficient> {
        self.modes.get(index).map(|mode| mode.get(direction))
    }

    pub fn find(&self, label: &BasisLabel) -> Option<&ModeCoefficients> {
        self.modes.iter().find(|mode| &mode.label == label)
    }

    /// Sum of `|α|²` over propagating modes in one direction.
    pub fn total_power(&self, direction: Direction) -> f64 {
        self.modes.iter().map(|mode| mode.get(direction).power()).sum()
    }

    /// Phase of every propagating coefficient in `direction` relative to the
    /// coefficient of `reference`.
    pub fn relative_phases(
        &self,
        reference: &BasisLabel,
        direction: Direction,
    ) -> Result<Vec<(BasisLabel, f64)>, ModeError> {
        let anchor = self
            .find(reference)
            .map(|mode| mode.get(direction))
            .filter(|coefficient| coefficient.is_propagating())
            .ok_or_else(|| {
                ModeError::InvalidConfig(format!("no propagating {reference} to take phases from"))
            })?;
        self.modes
            .iter()
            .map(|mode| (mode, mode.get(direction)))
            .filter(|(_, coefficient)| coefficient.is_propagating())
            .map(|(mode, coefficient)| Ok((mode.label.clone(), coefficient.relative_phase(anchor)?)))
            .collect()
    }
}

/// Project `sample` onto `basis`. Pure; the basis is used in the given order.
pub fn decompose(sample: &FieldSample, basis: &[ModeBasisVector]) -> Result<Decomposition, ModeError> {
    let start = Instant::now();
    let grid = sample.grid();
    for mode in basis {
        grid.check_matches(&mode.grid())?;
        check_frequency(&sample.frequency, &mode.frequency)?;
    }

    let mut modes = Vec::with_capacity(basis.len());
    let mut warnings = Vec::new();
    for (index, mode) in basis.iter().enumerate() {
        let coefficients = project(sample, index, mode);
        if coefficients.status() == CoefficientStatus::Evanescent {
            warn!(
                "[decompose] {} {} is evanescent at ω={:.6} (β={:.3e}); coefficient set to zero",
                sample.monitor,
                mode.label,
                sample.frequency.omega(),
                mode.beta.value()
            );
            warnings.push(DecompositionWarning {
                index,
                label: mode.label.clone(),
                kind: WarningKind::Evanescent,
            });
        }
        modes.push(coefficients);
    }

    let decomposition = Decomposition {
        monitor: sample.monitor.clone(),
        frequency: sample.frequency,
        modes,
        warnings,
    };
    debug!(
        "[decompose] {} ω={:.6} modes={} forward={:.6e} backward={:.6e} elapsed={:.2?}",
        decomposition.monitor,
        decomposition.frequency.omega(),
        decomposition.len(),
        decomposition.total_power(Direction::Forward),
        decomposition.total_power(Direction::Backward),
        start.elapsed()
    );
    Ok(decomposition)
}

/// Resolve each request through `provider`, then project.
///
/// A basis that fails to converge yields a zero coefficient flagged
/// `NotConverged` plus a warning; configuration errors abort.
pub fn decompose_requests<P>(
    sample: &FieldSample,
    provider: &P,
    requests: &[BasisRequest],
) -> Result<Decomposition, ModeError>
where
    P: ModeBasisProvider + ?Sized,
{
    let mut basis = Vec::with_capacity(requests.len());
    let mut failures: Vec<Option<(BasisLabel, String)>> = Vec::with_capacity(requests.len());
    for request in requests {
        check_frequency(&sample.frequency, &request.frequency)?;
        match provider.resolve(request)? {
            BasisResponse::Mode(mode) => {
                basis.push(mode);
                failures.push(None);
            }
            BasisResponse::NotConverged { label, reason } => {
                warn!(
                    "[decompose] {} {} at ω={:.6}: {}; coefficient set to zero",
                    sample.monitor,
                    label,
                    sample.frequency.omega(),
                    reason
                );
                failures.push(Some((label, reason)));
            }
        }
    }

    let projected = decompose(sample, &basis)?;
    let mut projected_modes = projected.modes.into_iter();
    let mut projected_warnings = projected.warnings.into_iter().peekable();
    let mut modes = Vec::with_capacity(requests.len());
    let mut warnings = Vec::new();
    for (index, failure) in failures.into_iter().enumerate() {
        match failure {
            None => {
                let Some(mut mode) = projected_modes.next() else {
                    continue;
                };
                let projected_index = mode.index;
                while let Some(mut warning) = projected_warnings.next_if(|w| w.index == projected_index) {
                    warning.index = index;
                    warnings.push(warning);
                }
                mode.index = index;
                modes.push(mode);
            }
            Some((label, reason)) => {
                warnings.push(DecompositionWarning {
                    index,
                    label: label.clone(),
                    kind: WarningKind::NotConverged { reason },
                });
                modes.push(not_converged(index, label));
            }
        }
    }

    Ok(Decomposition {
        monitor: projected.monitor,
        frequency: projected.frequency,
        modes,
        warnings,
    })
}

fn project(sample: &FieldSample, index: usize, mode: &ModeBasisVector) -> ModeCoefficients {
    let provenance = mode.provenance.clone();
    let norm = mode.self_overlap();
    let mode_power = norm.re;
    if mode.is_evanescent() || norm.norm() == 0.0 {
        return ModeCoefficients {
            index,
            label: mode.label.clone(),
            beta: mode.beta.value(),
            transverse_k: mode.transverse_k,
            mode_power: mode_power.max(0.0),
            forward: ModeCoefficient::zero(Direction::Forward, CoefficientStatus::Evanescent, provenance.clone()),
            backward: ModeCoefficient::zero(Direction::Backward, CoefficientStatus::Evanescent, provenance),
        };
    }

    let c1 = mode.profile.cross_overlap(&sample.field);
    let c2 = sample.field.cross_overlap(&mode.profile).conj();
    let a = 0.5 * (c2 / norm.conj() + c1 / norm);
    let b = 0.5 * (c2 / norm.conj() - c1 / norm);
    let scale = mode_power.sqrt();

    ModeCoefficients {
        index,
        label: mode.label.clone(),
        beta: mode.beta.value(),
        transverse_k: mode.transverse_k,
        mode_power,
        forward: ModeCoefficient {
            amplitude: a * scale,
            direction: Direction::Forward,
            status: CoefficientStatus::Propagating,
            provenance: provenance.clone(),
        },
        backward: ModeCoefficient {
            amplitude: b * scale,
            direction: Direction::Backward,
            status: CoefficientStatus::Propagating,
            provenance,
        },
    }
}

fn not_converged(index: usize, label: BasisLabel) -> ModeCoefficients {
    // No basis vector exists, so there is no phase convention to carry.
    let provenance = Provenance::Eigensolver {
        solver: "unresolved".to_string(),
        phase_convention: "none".to_string(),
    };
    ModeCoefficients {
        index,
        label,
        beta: Complex64::ZERO,
        transverse_k: [0.0, 0.0],
        mode_power: 0.0,
        forward: ModeCoefficient::zero(Direction::Forward, CoefficientStatus::NotConverged, provenance.clone()),
        backward: ModeCoefficient::zero(Direction::Backward, CoefficientStatus::NotConverged, provenance),
    }
}

fn check_frequency(sample: &FrequencyPoint, basis: &FrequencyPoint) -> Result<(), ModeError> {
    if sample.approx_eq(basis) {
        Ok(())
    } else {
        Err(ModeError::FrequencyMismatch {
            sample: sample.omega(),
            basis: basis.omega(),
        })
    }
}
