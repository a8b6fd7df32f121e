//! Transverse periodicity of a monitor and diffraction-order labels.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::grid::MonitorGrid;

/// Periods along the two transverse slots of a monitor; `None` means the
/// direction is not periodic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransverseLattice {
    pub periods: [Option<f64>; 2],
}

impl TransverseLattice {
    pub fn aperiodic() -> Self {
        Self::default()
    }

    pub fn along(slot: usize, period: f64) -> Self {
        let mut periods = [None, None];
        periods[slot.min(1)] = Some(period);
        Self { periods }
    }

    /// Periodic along the sampled direction of a line monitor.
    pub fn for_line(grid: &MonitorGrid, period: f64) -> Self {
        Self::along(grid.sampled_slot(), period)
    }

    pub fn rectangular(p1: f64, p2: f64) -> Self {
        Self {
            periods: [Some(p1), Some(p2)],
        }
    }

    pub fn validate(&self) -> Result<(), ModeError> {
        for period in self.periods.iter().flatten() {
            if !period.is_finite() || *period <= 0.0 {
                return Err(ModeError::InvalidConfig(format!(
                    "lattice period must be positive and finite, got {period}"
                )));
            }
        }
        Ok(())
    }

    /// Transverse slots that carry an order index, in order.
    pub fn periodic_slots(&self) -> Vec<usize> {
        (0..2).filter(|&slot| self.periods[slot].is_some()).collect()
    }

    pub fn rank(&self) -> usize {
        self.periods.iter().filter(|p| p.is_some()).count()
    }

    /// Reciprocal lattice constant `2π/Λ` of one slot.
    pub fn reciprocal(&self, slot: usize) -> Option<f64> {
        self.periods
            .get(slot)
            .copied()
            .flatten()
            .map(|period| 2.0 * PI / period)
    }

    /// Transverse wavevector of `order` given the Bloch offset `k_offset`.
    pub fn transverse_k(&self, order: &DiffractionOrder, k_offset: [f64; 2]) -> Result<[f64; 2], ModeError> {
        let slots = self.periodic_slots();
        if order.rank() != slots.len() {
            return Err(ModeError::OrderRank {
                order: order.to_string(),
                expected: slots.len(),
                found: order.rank(),
            });
        }
        let mut k = k_offset;
        for (&slot, &m) in slots.iter().zip(order.indices()) {
            if let Some(g) = self.reciprocal(slot) {
                k[slot] += g * m as f64;
            }
        }
        Ok(k)
    }
}

/// One integer per periodic lattice direction.
///
/// Not a band index: for oblique incidence the band ordering of the same
/// planewaves differs from the integer sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffractionOrder(Vec<i32>);

impl DiffractionOrder {
    pub fn new(indices: Vec<i32>) -> Self {
        Self(indices)
    }

    pub fn single(m: i32) -> Self {
        Self(vec![m])
    }

    pub fn indices(&self) -> &[i32] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for DiffractionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (idx, m) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{m}")?;
        }
        f.write_str(")")
    }
}
