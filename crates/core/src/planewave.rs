//! Analytic planewave diffraction orders in a homogeneous medium.
//!
//! Order `m` along a periodic direction of period Λ has transverse
//! wavevector `k_offset + 2πm/Λ`. It propagates iff
//! `(ω n)² − |k_t|² > ε (ω n)²` with a small relative ε, so orders sitting
//! exactly on a Wood anomaly (grazing, `k_n = 0`) count as evanescent and the
//! order count grows monotonically with ω.

use std::cmp::Ordering;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::field::TangentialField;
use crate::frequency::FrequencyPoint;
use crate::grid::MonitorGrid;
use crate::lattice::{DiffractionOrder, TransverseLattice};
use crate::mode::{BasisLabel, ModeBasisVector, PropagationConstant, Provenance};
use crate::polarization::Polarization;

const PROPAGATION_TOL: f64 = 1e-12;

/// Upper bound on candidate orders scanned per frequency.
pub const MAX_ORDER_CANDIDATES: usize = 1 << 20;

/// Scalar isotropic medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    #[serde(default = "unit")]
    pub epsilon: f64,
    #[serde(default = "unit")]
    pub mu: f64,
}

fn unit() -> f64 {
    1.0
}

impl Default for Medium {
    fn default() -> Self {
        Self::vacuum()
    }
}

impl Medium {
    pub fn vacuum() -> Self {
        Self {
            epsilon: 1.0,
            mu: 1.0,
        }
    }

    pub fn dielectric(index: f64) -> Self {
        Self {
            epsilon: index * index,
            mu: 1.0,
        }
    }

    pub fn index(&self) -> f64 {
        (self.epsilon * self.mu).sqrt()
    }

    /// Wave admittance `√(ε/μ)`: `|H| = Y |E|` for a planewave.
    pub fn admittance(&self) -> f64 {
        (self.epsilon / self.mu).sqrt()
    }

    pub fn validate(&self) -> Result<(), ModeError> {
        let ok = self.epsilon.is_finite() && self.mu.is_finite() && self.epsilon > 0.0 && self.mu > 0.0;
        if ok {
            Ok(())
        } else {
            Err(ModeError::InvalidConfig(format!(
                "medium needs positive finite ε and μ, got ε={} μ={}",
                self.epsilon, self.mu
            )))
        }
    }
}

/// Caller-fixed planewave: which order, the S/P amplitudes, and the axis that
/// together with the wavevector spans the plane of incidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanewaveSpec {
    pub order: DiffractionOrder,
    pub s: Complex64,
    pub p: Complex64,
    pub axis: [f64; 3],
}

impl PlanewaveSpec {
    pub fn new(order: DiffractionOrder, s: Complex64, p: Complex64, axis: [f64; 3]) -> Self {
        Self { order, s, p, axis }
    }

    pub fn s_polarized(order: DiffractionOrder, axis: [f64; 3]) -> Self {
        Self::new(order, Complex64::new(1.0, 0.0), Complex64::ZERO, axis)
    }

    pub fn p_polarized(order: DiffractionOrder, axis: [f64; 3]) -> Self {
        Self::new(order, Complex64::ZERO, Complex64::new(1.0, 0.0), axis)
    }

    pub fn validate(&self) -> Result<(), ModeError> {
        validate_amplitudes(self.s, self.p)
    }

    pub fn polarization(&self) -> Polarization {
        match (self.s == Complex64::ZERO, self.p == Complex64::ZERO) {
            (false, true) => Polarization::TE,
            (true, false) => Polarization::TM,
            _ => Polarization::Hybrid,
        }
    }
}

/// Band index assigned to a diffraction order by sorting on decreasing `k_n`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandAssignment {
    pub band: usize,
    pub order: DiffractionOrder,
    pub k_normal: f64,
}

/// Enumerates and builds planewave bases on one monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanewaveResolver {
    grid: MonitorGrid,
    lattice: TransverseLattice,
    medium: Medium,
    k_offset: [f64; 2],
}

impl PlanewaveResolver {
    pub fn new(
        grid: MonitorGrid,
        lattice: TransverseLattice,
        medium: Medium,
        k_offset: [f64; 2],
    ) -> Result<Self, ModeError> {
        lattice.validate()?;
        medium.validate()?;
        if k_offset.iter().any(|k| !k.is_finite()) {
            return Err(ModeError::InvalidConfig(format!(
                "k_offset must be finite, got {k_offset:?}"
            )));
        }
        Ok(Self {
            grid,
            lattice,
            medium,
            k_offset,
        })
    }

    pub fn grid(&self) -> MonitorGrid {
        self.grid
    }

    pub fn lattice(&self) -> TransverseLattice {
        self.lattice
    }

    pub fn medium(&self) -> Medium {
        self.medium
    }

    pub fn k_offset(&self) -> [f64; 2] {
        self.k_offset
    }

    pub fn enumerate_orders(&self, frequency: FrequencyPoint) -> Result<Vec<DiffractionOrder>, ModeError> {
        enumerate_orders(frequency, self.k_offset, &self.lattice, &self.medium)
    }

    /// `k_n` of a propagating order, `None` when evanescent.
    pub fn normal_wavevector(
        &self,
        frequency: FrequencyPoint,
        order: &DiffractionOrder,
    ) -> Result<Option<f64>, ModeError> {
        let kt = self.lattice.transverse_k(order, self.k_offset)?;
        Ok(normal_component(frequency, &self.medium, kt))
    }

    /// Signed diffraction angle in degrees from the monitor normal; the sign
    /// follows the first non-zero transverse component.
    pub fn diffraction_angle(
        &self,
        frequency: FrequencyPoint,
        order: &DiffractionOrder,
    ) -> Result<f64, ModeError> {
        let kt = self.lattice.transverse_k(order, self.k_offset)?;
        let kn = normal_component(frequency, &self.medium, kt).ok_or_else(|| {
            ModeError::EvanescentOrder {
                order: order.to_string(),
                omega: frequency.omega(),
            }
        })?;
        Ok(angle_degrees(kt, kn))
    }

    /// Band labels of `orders`, sorted by decreasing `k_n` (ties by order).
    pub fn band_ordering(
        &self,
        frequency: FrequencyPoint,
        orders: &[DiffractionOrder],
    ) -> Result<Vec<BandAssignment>, ModeError> {
        let mut entries = Vec::with_capacity(orders.len());
        for order in orders {
            let kn = self.normal_wavevector(frequency, order)?.ok_or_else(|| {
                ModeError::EvanescentOrder {
                    order: order.to_string(),
                    omega: frequency.omega(),
                }
            })?;
            entries.push((order.clone(), kn));
        }
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(idx, (order, k_normal))| BandAssignment {
                band: idx + 1,
                order,
                k_normal,
            })
            .collect())
    }

    /// Forward planewave profile of one order with explicit S/P amplitudes.
    pub fn basis_for_order(
        &self,
        frequency: FrequencyPoint,
        spec: &PlanewaveSpec,
    ) -> Result<ModeBasisVector, ModeError> {
        spec.validate()?;
        let kt = self.lattice.transverse_k(&spec.order, self.k_offset)?;
        let kn = normal_component(frequency, &self.medium, kt).ok_or_else(|| {
            ModeError::EvanescentOrder {
                order: spec.order.to_string(),
                omega: frequency.omega(),
            }
        })?;
        let profile = planewave_profile(&self.grid, &self.medium, kt, kn, spec.s, spec.p, spec.axis)?;
        Ok(ModeBasisVector {
            label: BasisLabel::Order(spec.order.clone()),
            frequency,
            profile,
            beta: PropagationConstant::real(kn),
            transverse_k: kt,
            polarization: spec.polarization(),
            provenance: Provenance::AnalyticPlanewave,
        })
    }
}

/// S/P amplitudes must be finite and not both zero; a planewave without
/// content carries no power and cannot be normalized.
pub fn validate_amplitudes(s: Complex64, p: Complex64) -> Result<(), ModeError> {
    let finite = |a: Complex64| a.re.is_finite() && a.im.is_finite();
    if !(finite(s) && finite(p)) {
        return Err(ModeError::InvalidConfig(format!(
            "planewave amplitudes must be finite, got s={s} p={p}"
        )));
    }
    if s == Complex64::ZERO && p == Complex64::ZERO {
        return Err(ModeError::InvalidConfig(
            "planewave S and P amplitudes are both zero".to_string(),
        ));
    }
    Ok(())
}

/// Propagating orders in ascending lexicographic integer order.
///
/// Fails when the candidate set exceeds [`MAX_ORDER_CANDIDATES`].
pub fn enumerate_orders(
    frequency: FrequencyPoint,
    k_offset: [f64; 2],
    lattice: &TransverseLattice,
    medium: &Medium,
) -> Result<Vec<DiffractionOrder>, ModeError> {
    let k = frequency.omega() * medium.index();
    let too_many = || {
        ModeError::InvalidConfig(format!(
            "ω={} spans more than {MAX_ORDER_CANDIDATES} candidate diffraction orders",
            frequency.omega()
        ))
    };
    let mut ranges: Vec<(i32, i32)> = Vec::new();
    let mut total: usize = 1;
    for slot in lattice.periodic_slots() {
        let Some(g) = lattice.reciprocal(slot) else {
            continue;
        };
        let (lo, hi) = order_range(k, k_offset[slot], g).ok_or_else(too_many)?;
        let span = (i64::from(hi) - i64::from(lo) + 1).max(0) as usize;
        total = total
            .checked_mul(span)
            .filter(|&n| n <= MAX_ORDER_CANDIDATES)
            .ok_or_else(too_many)?;
        ranges.push((lo, hi));
    }

    let mut candidates: Vec<Vec<i32>> = vec![Vec::new()];
    for &(lo, hi) in &ranges {
        let mut next = Vec::with_capacity(candidates.len() * (hi - lo + 1).max(0) as usize);
        for prefix in &candidates {
            for m in lo..=hi {
                let mut indices = prefix.clone();
                indices.push(m);
                next.push(indices);
            }
        }
        candidates = next;
    }

    Ok(candidates
        .into_iter()
        .map(DiffractionOrder::new)
        .filter(|order| {
            lattice
                .transverse_k(order, k_offset)
                .ok()
                .and_then(|kt| normal_component(frequency, medium, kt))
                .is_some()
        })
        .collect())
}

/// Inclusive candidate index range along one periodic slot, padded by one
/// on each side. `None` when the bounds leave the `i32` range.
fn order_range(k: f64, offset: f64, g: f64) -> Option<(i32, i32)> {
    let lo = ((-k - offset) / g).ceil() - 1.0;
    let hi = ((k - offset) / g).floor() + 1.0;
    let limit = f64::from(i32::MAX);
    if !(lo.is_finite() && hi.is_finite()) || lo < -limit || hi > limit {
        return None;
    }
    Some((lo as i32, hi as i32))
}

fn normal_component(frequency: FrequencyPoint, medium: &Medium, kt: [f64; 2]) -> Option<f64> {
    let k = frequency.omega() * medium.index();
    let k2 = k * k;
    let kn2 = k2 - (kt[0] * kt[0] + kt[1] * kt[1]);
    if kn2 > PROPAGATION_TOL * k2 {
        Some(kn2.sqrt())
    } else {
        None
    }
}

pub(crate) fn angle_degrees(kt: [f64; 2], kn: f64) -> f64 {
    let kt_norm = (kt[0] * kt[0] + kt[1] * kt[1]).sqrt();
    let sign = if kt[0] != 0.0 {
        kt[0].signum()
    } else {
        kt[1].signum()
    };
    sign * kt_norm.atan2(kn).to_degrees()
}

/// Tangential E/H of `E = S ê_S + P ê_P`, `H = Y k̂ × E` at every sample.
pub(crate) fn planewave_profile(
    grid: &MonitorGrid,
    medium: &Medium,
    kt: [f64; 2],
    kn: f64,
    s: Complex64,
    p: Complex64,
    axis: [f64; 3],
) -> Result<TangentialField, ModeError> {
    let (t1, t2) = grid.transverse_axes();
    let mut k = [0.0; 3];
    k[t1.index()] = kt[0];
    k[t2.index()] = kt[1];
    k[grid.normal.index()] = kn;

    let k_norm = norm(k);
    let axis_norm = norm(axis);
    if !(axis_norm.is_finite() && axis_norm > 0.0) {
        return Err(ModeError::DegeneratePlaneOfIncidence { axis });
    }
    let s_raw = cross(k, axis);
    let s_norm = norm(s_raw);
    if s_norm <= 1e-12 * k_norm * axis_norm {
        return Err(ModeError::DegeneratePlaneOfIncidence { axis });
    }
    let s_hat = scale(s_raw, 1.0 / s_norm);
    let k_hat = scale(k, 1.0 / k_norm);
    let p_hat = cross(k_hat, s_hat);

    let e: [Complex64; 3] = std::array::from_fn(|i| s * s_hat[i] + p * p_hat[i]);
    let y = medium.admittance();
    let h: [Complex64; 3] = [
        (e[2] * k_hat[1] - e[1] * k_hat[2]) * y,
        (e[0] * k_hat[2] - e[2] * k_hat[0]) * y,
        (e[1] * k_hat[0] - e[0] * k_hat[1]) * y,
    ];

    let (i1, i2) = (t1.index(), t2.index());
    Ok(TangentialField::from_fn(*grid, |_, coords| {
        let phase = Complex64::from_polar(1.0, kt[0] * coords[0] + kt[1] * coords[1]);
        [e[i1] * phase, e[i2] * phase, h[i1] * phase, h[i2] * phase]
    }))
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn scale(v: [f64; 3], alpha: f64) -> [f64; 3] {
    [v[0] * alpha, v[1] * alpha, v[2] * alpha]
}
