#![cfg(test)]

use super::_tests_common::{PERIOD, assert_close, c, omega, resolver, superpose};
use super::export::{rows_from_decomposition, write_csv};
use super::grid::{Axis, MonitorGrid};
use super::lattice::{DiffractionOrder, TransverseLattice};
use super::mode::{BasisLabel, CoefficientStatus, Direction, PropagationConstant};
use super::planewave::{Medium, PlanewaveResolver, PlanewaveSpec};
use super::projection::decompose;
use super::recording::FieldSample;

#[test]
fn rows_carry_angle_power_and_status() {
    let f = omega(2.0);
    let grid = MonitorGrid::centered_line(Axis::X, 32, PERIOD);
    let pw = resolver(grid, Medium::vacuum(), 0.0);
    let order1 = pw
        .basis_for_order(f, &PlanewaveSpec::s_polarized(DiffractionOrder::single(1), [0.0, 1.0, 0.0]))
        .unwrap();
    let mut dead = order1.clone();
    dead.label = BasisLabel::Band(5);
    dead.beta = PropagationConstant(c(0.0, 1.0));

    let sample = FieldSample::new("port".into(), f, superpose(grid, &[(c(0.0, 0.5), &order1)], &[]));
    let decomposition = decompose(&sample, &[order1, dead]).unwrap();
    let rows = rows_from_decomposition(&decomposition, &[Direction::Forward, Direction::Backward]);

    assert_eq!(rows.len(), 4);
    let first = &rows[0];
    assert_eq!(first.label, "order(1)");
    assert_eq!(first.direction, Direction::Forward);
    assert_close(first.power, 0.25, 1e-12, "forward power");
    assert_close(first.phase_rad, std::f64::consts::FRAC_PI_2, 1e-12, "phase of 0.5i");
    let expected_angle = ((std::f64::consts::TAU / PERIOD) / 2.0).asin().to_degrees();
    assert_close(first.angle_deg.unwrap(), expected_angle, 1e-9, "angle");

    let evanescent = &rows[2];
    assert_eq!(evanescent.status, CoefficientStatus::Evanescent);
    assert!(evanescent.angle_deg.is_none());
    assert_eq!(evanescent.power, 0.0);
}

#[test]
fn csv_has_header_and_quotes_comma_labels() {
    let f = omega(1.0);
    let grid = MonitorGrid::new(Axis::Z, 8, 8, PERIOD / 8.0, PERIOD / 8.0);
    let lattice = TransverseLattice::rectangular(PERIOD, PERIOD);
    let pw = PlanewaveResolver::new(grid, lattice, Medium::vacuum(), [0.0, 0.0]).unwrap();
    let spec = PlanewaveSpec::s_polarized(DiffractionOrder::new(vec![1, 0]), [1.0, 0.0, 0.0]);
    let mode = pw.basis_for_order(f, &spec).unwrap();
    let sample = FieldSample::new("plane".into(), f, superpose(grid, &[(c(1.0, 0.0), &mode)], &[]));
    let decomposition = decompose(&sample, &[mode]).unwrap();
    let rows = rows_from_decomposition(&decomposition, &[Direction::Forward]);

    let mut out = Vec::new();
    write_csv(&rows, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("omega,wavelength,label,direction,angle_deg,power,phase_rad,status")
    );
    let row = lines.next().unwrap();
    assert!(row.contains("\"order(1,0)\",forward,"), "{row}");
    assert!(row.ends_with(",propagating"), "{row}");
    assert!(lines.next().is_none());
}
