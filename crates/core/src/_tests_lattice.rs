#![cfg(test)]

use super::error::ModeError;
use super::grid::{Axis, MonitorGrid};
use super::lattice::{DiffractionOrder, TransverseLattice};

const TAU: f64 = std::f64::consts::PI * 2.0;

#[test]
fn line_lattice_uses_sampled_slot() {
    let grid = MonitorGrid::line(Axis::Y, 10, 1.0);
    let lattice = TransverseLattice::for_line(&grid, 5.0);
    assert_eq!(lattice.periodic_slots(), vec![1]);
    assert_eq!(lattice.rank(), 1);
    assert!((lattice.reciprocal(1).unwrap() - TAU / 5.0).abs() < 1e-12);
    assert!(lattice.reciprocal(0).is_none());
}

#[test]
fn transverse_k_adds_reciprocal_multiples_to_offset() {
    let lattice = TransverseLattice::rectangular(2.0, 4.0);
    let k = lattice
        .transverse_k(&DiffractionOrder::new(vec![1, -2]), [0.1, 0.2])
        .unwrap();
    assert!((k[0] - (0.1 + TAU / 2.0)).abs() < 1e-12);
    assert!((k[1] - (0.2 - 2.0 * TAU / 4.0)).abs() < 1e-12);
}

#[test]
fn aperiodic_slot_keeps_offset() {
    let lattice = TransverseLattice::along(0, 3.0);
    let k = lattice.transverse_k(&DiffractionOrder::single(1), [0.0, 0.7]).unwrap();
    assert!((k[1] - 0.7).abs() < 1e-15);
}

#[test]
fn order_rank_must_match_lattice() {
    let lattice = TransverseLattice::along(0, 3.0);
    let err = lattice
        .transverse_k(&DiffractionOrder::new(vec![1, 1]), [0.0, 0.0])
        .unwrap_err();
    assert!(matches!(err, ModeError::OrderRank { expected: 1, found: 2, .. }));
}

#[test]
fn rejects_non_positive_period() {
    assert!(TransverseLattice::along(0, 0.0).validate().is_err());
    assert!(TransverseLattice::along(1, -2.0).validate().is_err());
    assert!(TransverseLattice::aperiodic().validate().is_ok());
}

#[test]
fn orders_display_and_sort_lexicographically() {
    let mut orders = vec![
        DiffractionOrder::new(vec![1, 0]),
        DiffractionOrder::new(vec![-1, 2]),
        DiffractionOrder::new(vec![0, -1]),
    ];
    orders.sort();
    assert_eq!(orders[0].to_string(), "(-1,2)");
    assert_eq!(orders[2].to_string(), "(1,0)");
}
