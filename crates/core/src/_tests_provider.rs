#![cfg(test)]

use std::f64::consts::{FRAC_1_SQRT_2, TAU};

use num_complex::Complex64;

use super::_tests_common::{PERIOD, assert_close, c, omega, period_line, resolver, superpose};
use super::band_solver::HomogeneousBandSolver;
use super::eigensolver::{EigenOptions, EigenOutcome, EigenmodeSolver};
use super::error::ModeError;
use super::frequency::FrequencyPoint;
use super::grid::{Axis, MonitorGrid};
use super::lattice::DiffractionOrder;
use super::mode::{BasisLabel, CoefficientStatus, Direction, ModeBasisVector};
use super::planewave::{Medium, PlanewaveSpec};
use super::projection::{WarningKind, decompose_requests};
use super::provider::{BasisRequest, BasisResponse, BasisSource, ModeBasisProvider, RequestKind};
use super::recording::{FieldSample, MonitorId};
use super::symmetry::{Dimensionality, MirrorSymmetry, Parity, ParitySelector};

const Y_AXIS: [f64; 3] = [0.0, 1.0, 0.0];

fn band_source(k_offset: f64) -> BasisSource {
    let solver = HomogeneousBandSolver::new(period_line(32), PERIOD, Medium::vacuum(), k_offset).unwrap();
    BasisSource::eigensolver(solver, EigenOptions::default()).unwrap()
}

fn te_even() -> ParitySelector {
    ParitySelector::new(
        Dimensionality::Two,
        [
            MirrorSymmetry::new(Axis::Y, Parity::Even),
            MirrorSymmetry::new(Axis::Z, Parity::Odd),
        ],
    )
    .unwrap()
}

/// Solver that never converges.
struct StubbornSolver {
    grid: MonitorGrid,
}

impl EigenmodeSolver for StubbornSolver {
    fn name(&self) -> &str {
        "stubborn"
    }

    fn monitor(&self) -> MonitorGrid {
        self.grid
    }

    fn solve_band(
        &self,
        _frequency: FrequencyPoint,
        _band: usize,
        _parity: &ParitySelector,
        _direction_hint: Option<[f64; 3]>,
        options: &EigenOptions,
    ) -> Result<EigenOutcome, ModeError> {
        Ok(EigenOutcome::NotConverged {
            iterations: options.max_iter,
            residual: 10.0 * options.tol,
        })
    }
}

#[test]
fn non_convergence_gives_zero_coefficient_and_warning() {
    let source = band_source(0.0);
    let f = omega(2.0);
    let grid = period_line(32);
    let band1 = match source.resolve(&BasisRequest::band(f, 1, te_even())).unwrap() {
        BasisResponse::Mode(mode) => mode,
        other => panic!("band 1 should converge, got {other:?}"),
    };
    let field = superpose(grid, &[(c(0.8, 0.0), &band1)], &[]);
    let sample = FieldSample::new(MonitorId::from("port"), f, field);

    // Four even TE bands propagate at ω = 2; band 6 does not exist.
    let requests = vec![
        BasisRequest::band(f, 1, te_even()),
        BasisRequest::band(f, 6, te_even()),
        BasisRequest::band(f, 2, te_even()),
    ];
    let result = decompose_requests(&sample, &source, &requests).unwrap();

    assert_eq!(result.len(), 3);
    assert_close(result.modes[0].forward.power(), 0.64, 1e-12, "band 1 power");
    let failed = &result.modes[1];
    assert_eq!(failed.index, 1);
    assert_eq!(failed.status(), CoefficientStatus::NotConverged);
    assert_eq!(failed.forward.amplitude, Complex64::ZERO);
    assert_eq!(failed.backward.amplitude, Complex64::ZERO);
    assert_eq!(result.modes[2].index, 2);
    assert_eq!(result.modes[2].status(), CoefficientStatus::Propagating);

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].index, 1);
    assert!(matches!(result.warnings[0].kind, WarningKind::NotConverged { .. }));
}

#[test]
fn eigen_options_are_passed_through_unchanged() {
    let grid = period_line(16);
    let options = EigenOptions { max_iter: 17, tol: 1e-5 };
    let source = BasisSource::eigensolver(StubbornSolver { grid }, options).unwrap();
    let request = BasisRequest::band(omega(1.0), 1, ParitySelector::none(Dimensionality::Two));
    match source.resolve(&request).unwrap() {
        BasisResponse::NotConverged { reason, .. } => {
            assert!(reason.contains("17 iterations"), "{reason}");
            assert!(reason.contains("stubborn"), "{reason}");
        }
        BasisResponse::Mode(_) => panic!("stubborn solver converged"),
    }
}

#[test]
fn invalid_eigen_options_are_rejected() {
    let grid = period_line(16);
    let options = EigenOptions { max_iter: 0, tol: 1e-8 };
    assert!(BasisSource::eigensolver(StubbornSolver { grid }, options).is_err());
}

#[test]
fn band_index_is_validated() {
    let source = band_source(0.0);
    let f = omega(2.0);
    assert!(matches!(
        source.resolve(&BasisRequest::band(f, 0, te_even())),
        Err(ModeError::InvalidBandIndex(0))
    ));
    assert!(matches!(
        source.resolve(&BasisRequest::band(f, 33, te_even())),
        Err(ModeError::BandOutOfRange { band: 33, available: 32 })
    ));
}

#[test]
fn mirror_normal_to_monitor_is_a_configuration_error() {
    let source = band_source(0.0);
    let parity = ParitySelector::new(Dimensionality::Two, [MirrorSymmetry::new(Axis::X, Parity::Odd)]).unwrap();
    assert!(matches!(
        source.resolve(&BasisRequest::band(omega(2.0), 1, parity)),
        Err(ModeError::InvalidParity(_))
    ));
}

#[test]
fn backward_direction_hint_is_rejected() {
    let source = band_source(0.0);
    let request = BasisRequest {
        frequency: omega(2.0),
        kind: RequestKind::Band {
            band: 1,
            parity: te_even(),
            direction_hint: Some([-1.0, 0.0, 0.0]),
        },
    };
    assert!(matches!(source.resolve(&request), Err(ModeError::InvalidConfig(_))));
}

#[test]
fn request_shape_must_match_source() {
    let f = omega(2.0);
    let planewave = BasisSource::planewave(resolver(period_line(32), Medium::vacuum(), 0.0));
    assert!(matches!(
        planewave.resolve(&BasisRequest::band(f, 1, te_even())),
        Err(ModeError::UnsupportedRequest(_))
    ));
    let pw_request = BasisRequest::planewave(f, PlanewaveSpec::s_polarized(DiffractionOrder::single(0), Y_AXIS));
    assert!(matches!(
        band_source(0.0).resolve(&pw_request),
        Err(ModeError::UnsupportedRequest(_))
    ));
    assert_eq!(planewave.kind(), "planewave");
    assert_eq!(planewave.propagating_orders(f).unwrap().len(), 7);
    assert!(band_source(0.0).propagating_orders(f).unwrap().is_empty());
}

#[test]
fn phases_compare_only_within_one_provenance() {
    let f = omega(2.0);
    let grid = period_line(32);
    let bands = band_source(0.0);
    let planewaves = BasisSource::planewave(resolver(grid, Medium::vacuum(), 0.0));
    let pw = |m| BasisRequest::planewave(f, PlanewaveSpec::s_polarized(DiffractionOrder::single(m), Y_AXIS));

    let order0 = match planewaves.resolve(&pw(0)).unwrap() {
        BasisResponse::Mode(mode) => mode,
        other => panic!("{other:?}"),
    };
    let field = superpose(grid, &[(c(0.0, 1.0), &order0)], &[(c(0.5, 0.0), &order0)]);
    let sample = FieldSample::new(MonitorId::from("port"), f, field);

    let by_order = decompose_requests(&sample, &planewaves, &[pw(0), pw(1)]).unwrap();
    let by_band = decompose_requests(&sample, &bands, &[BasisRequest::band(f, 1, te_even())]).unwrap();

    let fwd = &by_order.modes[0].forward;
    let bwd = &by_order.modes[0].backward;
    assert_close(fwd.relative_phase(bwd).unwrap(), std::f64::consts::FRAC_PI_2, 1e-12, "i relative to 1");
    assert!(matches!(
        fwd.relative_phase(&by_band.modes[0].forward),
        Err(ModeError::IncomparablePhase { .. })
    ));
}

#[test]
fn band_and_order_bases_agree_on_total_power_off_normal() {
    let f = omega(2.0);
    let g = TAU / PERIOD;
    let k_offset = 0.4 * g;
    let grid = period_line(32);
    let pw_resolver = resolver(grid, Medium::vacuum(), k_offset);
    let orders = pw_resolver.enumerate_orders(f).unwrap();
    let hybrid = |order: DiffractionOrder| {
        PlanewaveSpec::new(order, c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0), Y_AXIS)
    };
    let modes: Vec<ModeBasisVector> = orders
        .iter()
        .map(|o| pw_resolver.basis_for_order(f, &hybrid(o.clone())).unwrap())
        .collect();
    let forward: Vec<_> = modes
        .iter()
        .enumerate()
        .map(|(i, mode)| (Complex64::from_polar(0.2 + 0.1 * i as f64, 1.3 * i as f64), mode))
        .collect();
    let backward = vec![(c(0.1, 0.2), &modes[2])];
    let sample = FieldSample::new(MonitorId::from("port"), f, superpose(grid, &forward, &backward));

    let order_requests: Vec<_> = orders.iter().cloned().map(|o| BasisRequest::planewave(f, hybrid(o))).collect();
    let by_order = decompose_requests(&sample, &BasisSource::planewave(pw_resolver), &order_requests).unwrap();

    let band_requests: Vec<_> = (1..=orders.len())
        .map(|b| BasisRequest::band(f, b, ParitySelector::none(Dimensionality::Two)))
        .collect();
    let by_band = decompose_requests(&sample, &band_source(k_offset), &band_requests).unwrap();

    for direction in [Direction::Forward, Direction::Backward] {
        assert_close(
            by_band.total_power(direction),
            by_order.total_power(direction),
            1e-3,
            "total power",
        );
    }
    // Band 2 is order −1, not the second entry of the order list.
    let band2 = by_band.modes[1].forward.power();
    let order_m1 = by_order
        .find(&BasisLabel::Order(DiffractionOrder::single(-1)))
        .unwrap()
        .forward
        .power();
    assert_close(band2, order_m1, 1e-9, "band 2 vs order -1");
    assert!((by_order.modes[1].forward.power() - band2).abs() > 1e-3);
}
