#![cfg(test)]

use super::error::ModeError;
use super::grid::{Axis, MonitorGrid};
use super::polarization::Polarization;
use super::symmetry::{Dimensionality, MirrorSymmetry, Parity, ParitySelector};

#[test]
fn out_of_plane_mirror_selects_polarization_in_2d() {
    let te = ParitySelector::new(Dimensionality::Two, [MirrorSymmetry::new(Axis::Z, Parity::Odd)]).unwrap();
    let tm = ParitySelector::new(Dimensionality::Two, [MirrorSymmetry::new(Axis::Z, Parity::Even)]).unwrap();
    assert_eq!(te.polarization(), Some(Polarization::TE));
    assert_eq!(tm.polarization(), Some(Polarization::TM));
    assert_eq!(ParitySelector::none(Dimensionality::Two).polarization(), None);
}

#[test]
fn polarization_is_undefined_in_3d() {
    let selector =
        ParitySelector::new(Dimensionality::Three, [MirrorSymmetry::new(Axis::Z, Parity::Odd)]).unwrap();
    assert_eq!(selector.polarization(), None);
}

#[test]
fn duplicate_axis_is_rejected() {
    let err = ParitySelector::new(
        Dimensionality::Two,
        [
            MirrorSymmetry::new(Axis::Y, Parity::Even),
            MirrorSymmetry::new(Axis::Y, Parity::Odd),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, ModeError::InvalidParity(_)));
}

#[test]
fn three_mirrors_are_rejected_in_3d() {
    let mirrors = [Axis::X, Axis::Y, Axis::Z].map(|axis| MirrorSymmetry::new(axis, Parity::Even));
    assert!(ParitySelector::new(Dimensionality::Three, mirrors).is_err());
    assert!(ParitySelector::new(Dimensionality::Two, mirrors).is_ok());
}

#[test]
fn mirror_normal_to_monitor_is_rejected() {
    let grid = MonitorGrid::line(Axis::X, 16, 0.5);
    let along_normal =
        ParitySelector::new(Dimensionality::Two, [MirrorSymmetry::new(Axis::X, Parity::Even)]).unwrap();
    assert!(matches!(
        along_normal.validate_for(&grid),
        Err(ModeError::InvalidParity(_))
    ));

    let transverse =
        ParitySelector::new(Dimensionality::Two, [MirrorSymmetry::new(Axis::Y, Parity::Odd)]).unwrap();
    assert!(transverse.validate_for(&grid).is_ok());
}

#[test]
fn dimensionality_must_match_monitor() {
    let plane = MonitorGrid::new(Axis::Z, 8, 8, 0.5, 0.5);
    let selector = ParitySelector::none(Dimensionality::Two);
    assert!(selector.validate_for(&plane).is_err());
    assert!(ParitySelector::none(Dimensionality::Three).validate_for(&plane).is_ok());
}
