#![cfg(test)]

use num_complex::Complex64;

use super::_tests_common::{assert_close, c, omega, period_line, resolver, superpose, unit_power};
use super::error::ModeError;
use super::field::TangentialField;
use super::lattice::DiffractionOrder;
use super::mode::{BasisLabel, CoefficientStatus, Direction, ModeBasisVector, PropagationConstant};
use super::planewave::{Medium, PlanewaveSpec};
use super::projection::{WarningKind, decompose, decompose_requests};
use super::provider::{BasisRequest, BasisSource};
use super::recording::{FieldSample, MonitorId, MonitorRecording};
use super::reference::ReferenceDataset;
use super::spectra::PowerBudget;

const Y_AXIS: [f64; 3] = [0.0, 1.0, 0.0];

fn s_mode(k_offset: f64, medium: Medium, m: i32) -> ModeBasisVector {
    resolver(period_line(64), medium, k_offset)
        .basis_for_order(omega(2.0), &PlanewaveSpec::s_polarized(DiffractionOrder::single(m), Y_AXIS))
        .unwrap()
}

fn sample(field: TangentialField) -> FieldSample {
    FieldSample::new(MonitorId::from("port"), omega(2.0), field)
}

#[test]
fn unit_power_forward_mode_gives_unit_coefficient() {
    let mode = s_mode(0.0, Medium::vacuum(), 1);
    let field = unit_power(&mode).profile;
    let result = decompose(&sample(field), std::slice::from_ref(&mode)).unwrap();

    let forward = result.coefficient(0, Direction::Forward).unwrap();
    let backward = result.coefficient(0, Direction::Backward).unwrap();
    assert_close(forward.power(), 1.0, 1e-12, "forward |α|²");
    assert!(backward.power() < 1e-20);
    assert_eq!(forward.status, CoefficientStatus::Propagating);
    assert!(result.warnings.is_empty());
}

#[test]
fn backward_wave_lands_in_backward_coefficient() {
    let mode = s_mode(0.0, Medium::dielectric(1.5), 0);
    let field = superpose(mode.grid(), &[], &[(c(0.0, 0.5), &mode)]);
    let result = decompose(&sample(field), std::slice::from_ref(&mode)).unwrap();
    assert!(result.coefficient(0, Direction::Forward).unwrap().power() < 1e-20);
    let backward = result.coefficient(0, Direction::Backward).unwrap();
    assert!((backward.amplitude - c(0.0, 0.5)).norm() < 1e-12);
}

#[test]
fn recovers_complex_amplitudes_of_a_superposition() {
    let modes: Vec<_> = (-2..=2).map(|m| s_mode(0.2, Medium::vacuum(), m)).collect();
    let forward: Vec<(Complex64, &ModeBasisVector)> = modes
        .iter()
        .enumerate()
        .map(|(i, mode)| (Complex64::from_polar(0.1 + 0.1 * i as f64, i as f64), mode))
        .collect();
    let backward = vec![(c(0.05, -0.2), &modes[1]), (c(-0.3, 0.0), &modes[4])];
    let field = superpose(modes[0].grid(), &forward, &backward);

    let result = decompose(&sample(field), &modes).unwrap();
    for (i, (amp, _)) in forward.iter().enumerate() {
        let got = result.coefficient(i, Direction::Forward).unwrap().amplitude;
        assert!((got - amp).norm() < 1e-10, "forward mode {i}: {got} vs {amp}");
    }
    assert!((result.coefficient(1, Direction::Backward).unwrap().amplitude - c(0.05, -0.2)).norm() < 1e-10);
    assert!((result.coefficient(4, Direction::Backward).unwrap().amplitude - c(-0.3, 0.0)).norm() < 1e-10);
    assert!(result.coefficient(2, Direction::Backward).unwrap().power() < 1e-20);
}

#[test]
fn coefficient_power_ignores_profile_normalization() {
    let mode = s_mode(0.0, Medium::vacuum(), 0);
    let mut scaled = mode.clone();
    scaled.profile.scale(c(0.0, 7.5));
    let field = unit_power(&mode).profile;

    let a = decompose(&sample(field.clone()), &[mode]).unwrap();
    let b = decompose(&sample(field), &[scaled]).unwrap();
    let pa = a.coefficient(0, Direction::Forward).unwrap().power();
    let pb = b.coefficient(0, Direction::Forward).unwrap().power();
    assert_close(pa, 1.0, 1e-12, "unscaled basis");
    assert_close(pb, 1.0, 1e-12, "scaled basis");
}

#[test]
fn geometry_mismatch_is_rejected() {
    let mode = s_mode(0.0, Medium::vacuum(), 0);
    let other = TangentialField::zeros(period_line(32));
    assert!(matches!(
        decompose(&sample(other), &[mode]),
        Err(ModeError::GeometryMismatch(_))
    ));
}

#[test]
fn frequency_mismatch_is_rejected() {
    let mode = s_mode(0.0, Medium::vacuum(), 0);
    let off = FieldSample::new(MonitorId::from("port"), omega(2.1), unit_power(&mode).profile);
    assert!(matches!(
        decompose(&off, &[mode]),
        Err(ModeError::FrequencyMismatch { .. })
    ));
}

#[test]
fn evanescent_basis_vector_is_zeroed_and_flagged() {
    let propagating = s_mode(0.0, Medium::vacuum(), 0);
    let mut evanescent = s_mode(0.0, Medium::vacuum(), 1);
    evanescent.label = BasisLabel::Band(9);
    evanescent.beta = PropagationConstant(c(0.0, 0.8));

    let field = superpose(
        propagating.grid(),
        &[(c(1.0, 0.0), &propagating), (c(1.0, 0.0), &evanescent)],
        &[],
    );
    let result = decompose(&sample(field), &[propagating, evanescent]).unwrap();

    let flagged = &result.modes[1];
    assert_eq!(flagged.status(), CoefficientStatus::Evanescent);
    assert_eq!(flagged.forward.amplitude, Complex64::ZERO);
    assert_eq!(flagged.backward.power(), 0.0);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].index, 1);
    assert_eq!(result.warnings[0].kind, WarningKind::Evanescent);
    assert_close(result.total_power(Direction::Forward), 1.0, 1e-12, "evanescent excluded");
}

#[test]
fn find_locates_coefficients_by_label() {
    let modes: Vec<_> = (-1..=1).map(|m| s_mode(0.0, Medium::vacuum(), m)).collect();
    let field = superpose(modes[0].grid(), &[(c(0.6, 0.0), &modes[2])], &[]);
    let result = decompose(&sample(field), &modes).unwrap();
    let found = result
        .find(&BasisLabel::Order(DiffractionOrder::single(1)))
        .expect("order +1 present");
    assert_eq!(found.index, 2);
    assert_close(found.forward.power(), 0.36, 1e-12, "order +1 power");
}

#[test]
fn relative_phases_are_taken_against_one_label() {
    let modes: Vec<_> = (-1..=1).map(|m| s_mode(0.0, Medium::vacuum(), m)).collect();
    let field = superpose(
        modes[0].grid(),
        &[
            (Complex64::from_polar(0.5, 0.3), &modes[0]),
            (Complex64::from_polar(0.7, 1.0), &modes[1]),
        ],
        &[],
    );
    let result = decompose(&sample(field), &modes).unwrap();
    let zero = BasisLabel::Order(DiffractionOrder::single(0));
    let phases = result.relative_phases(&zero, Direction::Forward).unwrap();

    assert_eq!(phases.len(), 3);
    assert_eq!(phases[0].0, BasisLabel::Order(DiffractionOrder::single(-1)));
    assert_close(phases[0].1, -0.7, 1e-10, "order -1 vs 0");
    assert_close(phases[1].1, 0.0, 1e-12, "order 0 vs itself");

    let missing = BasisLabel::Order(DiffractionOrder::single(5));
    assert!(matches!(
        result.relative_phases(&missing, Direction::Forward),
        Err(ModeError::InvalidConfig(_))
    ));
}

/// Lossless grating two-port: incident order 0 from vacuum, reflected
/// orders back into vacuum, transmitted orders into n = 1.5.
fn two_port_budget(k_offset: f64) -> PowerBudget {
    let f = omega(2.0);
    let grid = period_line(64);
    let vacuum = resolver(grid, Medium::vacuum(), k_offset);
    let glass = resolver(grid, Medium::dielectric(1.5), k_offset);
    let s = |order| PlanewaveSpec::s_polarized(order, Y_AXIS);

    let incident = vacuum.basis_for_order(f, &s(DiffractionOrder::single(0))).unwrap();
    let refl_orders = vacuum.enumerate_orders(f).unwrap();
    let trans_orders = glass.enumerate_orders(f).unwrap();
    let refl_modes: Vec<_> = refl_orders
        .iter()
        .map(|o| vacuum.basis_for_order(f, &s(o.clone())).unwrap())
        .collect();
    let trans_modes: Vec<_> = trans_orders
        .iter()
        .map(|o| glass.basis_for_order(f, &s(o.clone())).unwrap())
        .collect();

    let raw_r: Vec<Complex64> = (0..refl_modes.len())
        .map(|i| Complex64::from_polar(0.1 + 0.05 * i as f64, 0.7 * i as f64))
        .collect();
    let raw_t: Vec<Complex64> = (0..trans_modes.len())
        .map(|i| Complex64::from_polar(0.4 - 0.03 * i as f64, -0.3 * i as f64))
        .collect();
    let total: f64 = raw_r.iter().chain(&raw_t).map(|a| a.norm_sqr()).sum();
    let norm = Complex64::new(1.0 / total.sqrt(), 0.0);

    let reflected: Vec<_> = raw_r.iter().map(|a| a * norm).zip(&refl_modes).collect();
    let transmitted: Vec<_> = raw_t.iter().map(|a| a * norm).zip(&trans_modes).collect();

    let incident_only = superpose(grid, &[(c(1.0, 0.0), &incident)], &[]);
    let reference_run = MonitorRecording::new("refl".into(), grid)
        .with_sample(f, incident_only.clone())
        .unwrap();
    let mut full = incident_only;
    full.axpy(c(1.0, 0.0), &superpose(grid, &[], &reflected)).unwrap();
    let scattering_run = MonitorRecording::new("refl".into(), grid).with_sample(f, full).unwrap();
    let trans_run = MonitorRecording::new("trans".into(), grid)
        .with_sample(f, superpose(grid, &transmitted, &[]))
        .unwrap();

    let reference = ReferenceDataset::capture(&reference_run);
    let incident_flux = reference.incident_flux(&f).unwrap();
    let reflected_run = reference.subtract(&scattering_run).unwrap();

    let refl_requests: Vec<_> = refl_orders.into_iter().map(|o| BasisRequest::planewave(f, s(o))).collect();
    let trans_requests: Vec<_> = trans_orders.into_iter().map(|o| BasisRequest::planewave(f, s(o))).collect();
    let refl_dec = decompose_requests(
        &reflected_run.samples()[0],
        &BasisSource::planewave(vacuum),
        &refl_requests,
    )
    .unwrap();
    let trans_dec = decompose_requests(&trans_run.samples()[0], &BasisSource::planewave(glass), &trans_requests).unwrap();

    assert!(refl_dec.total_power(Direction::Forward) < 1e-20, "incident removed by subtraction");
    PowerBudget::from_decompositions(incident_flux, &refl_dec, &trans_dec).unwrap()
}

#[test]
fn lossless_two_port_conserves_power_at_normal_incidence() {
    let budget = two_port_budget(0.0);
    assert_close(budget.incident, 1.0, 1e-12, "incident flux");
    assert!(budget.is_conserved(1e-3), "R + T = {}", budget.total());
    assert!(budget.reflectance() > 0.0 && budget.transmittance() > 0.0);
}

#[test]
fn lossless_two_port_conserves_power_at_oblique_incidence() {
    let k_offset = 2.0 * 20f64.to_radians().sin();
    let budget = two_port_budget(k_offset);
    assert!(budget.is_conserved(1e-3), "R + T = {}", budget.total());
}
