//! Reference eigenmode solver for a homogeneous medium with one periodic
//! transverse direction (line monitor of a 2D run).
//!
//! Bands are the propagating planewave orders sorted by decreasing `k_n`.
//! With a mirror on the periodic axis at normal incidence, `+m` and `−m`
//! collapse into one standing-wave band, so band `b` is order `|m| = b − 1`
//! for even parity and `|m| = b` for odd parity. Requests past the last
//! propagating band report non-convergence, like a root-find chasing an
//! evanescent mode.

use std::cmp::Ordering;

use num_complex::Complex64;

use crate::eigensolver::{EigenOptions, EigenOutcome, EigenmodeSolver};
use crate::error::ModeError;
use crate::field::{FieldComponent, TangentialField};
use crate::frequency::FrequencyPoint;
use crate::grid::{Axis, MonitorGrid};
use crate::lattice::{DiffractionOrder, TransverseLattice};
use crate::mode::{BasisLabel, ModeBasisVector, PropagationConstant, Provenance};
use crate::planewave::{Medium, PlanewaveResolver, planewave_profile};
use crate::polarization::Polarization;
use crate::symmetry::{Parity, ParitySelector};

const SOLVER_NAME: &str = "homogeneous-planewave";
const PHASE_CONVENTION: &str = "max-e-real";

#[derive(Debug, Clone)]
pub struct HomogeneousBandSolver {
    resolver: PlanewaveResolver,
    slot: usize,
    periodic_axis: Axis,
}

/// Orders merged into one band, with the shared `k_n`.
struct BandGroup {
    orders: Vec<DiffractionOrder>,
    k_normal: f64,
}

impl HomogeneousBandSolver {
    pub fn new(grid: MonitorGrid, period: f64, medium: Medium, k_offset: f64) -> Result<Self, ModeError> {
        if !grid.is_line() {
            return Err(ModeError::InvalidConfig(format!(
                "homogeneous band solver needs a line monitor, got {}x{}",
                grid.n1, grid.n2
            )));
        }
        let slot = grid.sampled_slot();
        let mut offset = [0.0; 2];
        offset[slot] = k_offset;
        let lattice = TransverseLattice::for_line(&grid, period);
        let resolver = PlanewaveResolver::new(grid, lattice, medium, offset)?;
        let (t1, t2) = grid.transverse_axes();
        let periodic_axis = if slot == 0 { t1 } else { t2 };
        Ok(Self {
            resolver,
            slot,
            periodic_axis,
        })
    }

    pub fn resolver(&self) -> &PlanewaveResolver {
        &self.resolver
    }

    fn band_groups(&self, frequency: FrequencyPoint, parity: &ParitySelector) -> Result<Vec<BandGroup>, ModeError> {
        let orders = self.resolver.enumerate_orders(frequency)?;
        match parity.parity_for(self.periodic_axis) {
            None => Ok(self
                .resolver
                .band_ordering(frequency, &orders)?
                .into_iter()
                .map(|assignment| BandGroup {
                    orders: vec![assignment.order],
                    k_normal: assignment.k_normal,
                })
                .collect()),
            Some(mirror) => {
                let k_offset = self.resolver.k_offset()[self.slot];
                if k_offset.abs() > 1e-12 {
                    return Err(ModeError::InvalidParity(format!(
                        "mirror on {:?} requires normal incidence, k_offset={k_offset}",
                        self.periodic_axis
                    )));
                }
                let first = match mirror {
                    Parity::Even => 0,
                    Parity::Odd => 1,
                };
                let mut groups = Vec::new();
                for order in orders.iter().filter(|o| o.indices()[0] >= first) {
                    let m = order.indices()[0];
                    let Some(k_normal) = self.resolver.normal_wavevector(frequency, order)? else {
                        continue;
                    };
                    let mut members = vec![order.clone()];
                    if m != 0 {
                        members.push(DiffractionOrder::single(-m));
                    }
                    groups.push(BandGroup {
                        orders: members,
                        k_normal,
                    });
                }
                groups.sort_by(|a, b| b.k_normal.partial_cmp(&a.k_normal).unwrap_or(Ordering::Equal));
                Ok(groups)
            }
        }
    }

    fn amplitudes(parity: &ParitySelector) -> (Complex64, Complex64, Polarization) {
        match parity.polarization() {
            Some(Polarization::TE) => (Complex64::new(1.0, 0.0), Complex64::ZERO, Polarization::TE),
            Some(Polarization::TM) => (Complex64::ZERO, Complex64::new(1.0, 0.0), Polarization::TM),
            _ => {
                let half = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
                (half, half, Polarization::Hybrid)
            }
        }
    }
}

impl EigenmodeSolver for HomogeneousBandSolver {
    fn name(&self) -> &str {
        SOLVER_NAME
    }

    fn monitor(&self) -> MonitorGrid {
        self.resolver.grid()
    }

    /// A planewave expansion on `n` samples resolves at most `n` orders.
    fn max_bands(&self) -> Option<usize> {
        Some(self.resolver.grid().counts()[self.slot])
    }

    fn solve_band(
        &self,
        frequency: FrequencyPoint,
        band: usize,
        parity: &ParitySelector,
        _direction_hint: Option<[f64; 3]>,
        options: &EigenOptions,
    ) -> Result<EigenOutcome, ModeError> {
        let groups = self.band_groups(frequency, parity)?;
        let Some(group) = band.checked_sub(1).and_then(|idx| groups.get(idx)) else {
            return Ok(EigenOutcome::NotConverged {
                iterations: options.max_iter,
                residual: 1.0,
            });
        };

        let grid = self.resolver.grid();
        let medium = self.resolver.medium();
        let lattice = self.resolver.lattice();
        let axis = self.periodic_axis.unit();
        let (s, p, polarization) = Self::amplitudes(parity);
        let sign = match parity.parity_for(self.periodic_axis) {
            Some(Parity::Odd) => -1.0,
            _ => 1.0,
        };
        let weight = 1.0 / (group.orders.len() as f64).sqrt();

        let mut profile = TangentialField::zeros(grid);
        let mut transverse_k = [0.0; 2];
        for (idx, order) in group.orders.iter().enumerate() {
            let kt = lattice.transverse_k(order, self.resolver.k_offset())?;
            if idx == 0 {
                transverse_k = kt;
            }
            let wave = planewave_profile(&grid, &medium, kt, group.k_normal, s, p, axis)?;
            let coeff = if idx == 0 { weight } else { sign * weight };
            profile.axpy(Complex64::new(coeff, 0.0), &wave)?;
        }
        fix_phase(&mut profile);

        Ok(EigenOutcome::Converged(ModeBasisVector {
            label: BasisLabel::Band(band),
            frequency,
            profile,
            beta: PropagationConstant::real(group.k_normal),
            transverse_k,
            polarization,
            provenance: Provenance::Eigensolver {
                solver: SOLVER_NAME.to_string(),
                phase_convention: PHASE_CONVENTION.to_string(),
            },
        }))
    }
}

/// Rotate the profile so its largest E sample is real and positive.
fn fix_phase(profile: &mut TangentialField) {
    let pivot = [FieldComponent::E1, FieldComponent::E2]
        .iter()
        .flat_map(|&c| profile.component(c).iter().copied())
        .fold(Complex64::ZERO, |best, v| {
            if v.norm() > best.norm() * (1.0 + 1e-12) { v } else { best }
        });
    if pivot.norm() > 0.0 {
        profile.scale(pivot.conj() / pivot.norm());
    }
}
