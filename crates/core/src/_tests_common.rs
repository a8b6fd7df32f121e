#![cfg(test)]

use num_complex::Complex64;

use crate::{
    field::{FieldComponent, TangentialField},
    frequency::FrequencyPoint,
    grid::{Axis, MonitorGrid},
    lattice::TransverseLattice,
    mode::ModeBasisVector,
    planewave::{Medium, PlanewaveResolver},
};

pub(crate) const PERIOD: f64 = 10.0;

pub(crate) fn assert_close(actual: f64, expected: f64, tol: f64, what: &str) {
    assert!(
        (actual - expected).abs() < tol,
        "{what}: expected {expected}, got {actual} (tol {tol})"
    );
}

pub(crate) fn omega(value: f64) -> FrequencyPoint {
    FrequencyPoint::new(value).expect("valid frequency")
}

/// Line monitor normal to x spanning exactly one period along y.
pub(crate) fn period_line(n: usize) -> MonitorGrid {
    MonitorGrid::centered_line(Axis::X, n, PERIOD)
}

pub(crate) fn resolver(grid: MonitorGrid, medium: Medium, k_offset: f64) -> PlanewaveResolver {
    let lattice = TransverseLattice::for_line(&grid, PERIOD);
    let mut offset = [0.0; 2];
    offset[grid.sampled_slot()] = k_offset;
    PlanewaveResolver::new(grid, lattice, medium, offset).expect("valid resolver")
}

/// Copy of `mode` rescaled to carry unit power.
pub(crate) fn unit_power(mode: &ModeBasisVector) -> ModeBasisVector {
    let mut out = mode.clone();
    let power = mode.power();
    assert!(power > 0.0, "mode {} carries no power", mode.label);
    out.profile.scale(Complex64::new(1.0 / power.sqrt(), 0.0));
    out
}

/// `Σ fwd_i m_i + Σ bwd_i m_i⁻` over unit-power profiles.
pub(crate) fn superpose(
    grid: MonitorGrid,
    forward: &[(Complex64, &ModeBasisVector)],
    backward: &[(Complex64, &ModeBasisVector)],
) -> TangentialField {
    let mut field = TangentialField::zeros(grid);
    for (amp, mode) in forward {
        field
            .axpy(*amp, &unit_power(mode).profile)
            .expect("matching grids");
    }
    for (amp, mode) in backward {
        field
            .axpy(*amp, &unit_power(mode).backward_profile())
            .expect("matching grids");
    }
    field
}

pub(crate) fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Largest sample magnitude over all four components.
pub(crate) fn max_abs(field: &TangentialField) -> f64 {
    FieldComponent::ALL
        .iter()
        .flat_map(|&component| field.component(component).iter())
        .map(|v| v.norm())
        .fold(0.0, f64::max)
}
