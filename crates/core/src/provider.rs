//! Uniform mode-basis interface over eigensolver bands and analytic planewaves.
//!
//! The projection engine only sees [`ModeBasisProvider`]; which construction
//! strategy runs is decided by the shape of the [`BasisRequest`].

use log::debug;

use crate::eigensolver::{EigenOptions, EigenOutcome, EigenmodeSolver};
use crate::error::ModeError;
use crate::frequency::FrequencyPoint;
use crate::lattice::DiffractionOrder;
use crate::mode::{BasisLabel, ModeBasisVector};
use crate::planewave::{PlanewaveResolver, PlanewaveSpec};
use crate::symmetry::ParitySelector;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Band {
        band: usize,
        parity: ParitySelector,
        /// Propagation direction for rotated or oblique frames.
        direction_hint: Option<[f64; 3]>,
    },
    Planewave(PlanewaveSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasisRequest {
    pub frequency: FrequencyPoint,
    pub kind: RequestKind,
}

impl BasisRequest {
    pub fn band(frequency: FrequencyPoint, band: usize, parity: ParitySelector) -> Self {
        Self {
            frequency,
            kind: RequestKind::Band {
                band,
                parity,
                direction_hint: None,
            },
        }
    }

    pub fn planewave(frequency: FrequencyPoint, spec: PlanewaveSpec) -> Self {
        Self {
            frequency,
            kind: RequestKind::Planewave(spec),
        }
    }

    pub fn label(&self) -> BasisLabel {
        match &self.kind {
            RequestKind::Band { band, .. } => BasisLabel::Band(*band),
            RequestKind::Planewave(spec) => BasisLabel::Order(spec.order.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BasisResponse {
    Mode(ModeBasisVector),
    NotConverged { label: BasisLabel, reason: String },
}

pub trait ModeBasisProvider {
    fn resolve(&self, request: &BasisRequest) -> Result<BasisResponse, ModeError>;
}

/// The two basis construction strategies behind one provider.
pub enum BasisSource {
    Eigensolver {
        solver: Box<dyn EigenmodeSolver>,
        options: EigenOptions,
    },
    Planewave(PlanewaveResolver),
}

impl BasisSource {
    pub fn eigensolver<S>(solver: S, options: EigenOptions) -> Result<Self, ModeError>
    where
        S: EigenmodeSolver + 'static,
    {
        options.validate()?;
        Ok(BasisSource::Eigensolver {
            solver: Box::new(solver),
            options,
        })
    }

    pub fn planewave(resolver: PlanewaveResolver) -> Self {
        BasisSource::Planewave(resolver)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BasisSource::Eigensolver { .. } => "eigensolver",
            BasisSource::Planewave(_) => "planewave",
        }
    }

    /// Every propagating planewave order at `frequency`; empty for eigensolver sources.
    pub fn propagating_orders(&self, frequency: FrequencyPoint) -> Result<Vec<DiffractionOrder>, ModeError> {
        match self {
            BasisSource::Planewave(resolver) => resolver.enumerate_orders(frequency),
            BasisSource::Eigensolver { .. } => Ok(Vec::new()),
        }
    }

    fn resolve_band(
        solver: &dyn EigenmodeSolver,
        options: &EigenOptions,
        frequency: FrequencyPoint,
        band: usize,
        parity: &ParitySelector,
        direction_hint: Option<[f64; 3]>,
    ) -> Result<BasisResponse, ModeError> {
        if band == 0 {
            return Err(ModeError::InvalidBandIndex(band));
        }
        if let Some(available) = solver.max_bands() {
            if band > available {
                return Err(ModeError::BandOutOfRange { band, available });
            }
        }
        let monitor = solver.monitor();
        parity.validate_for(&monitor)?;
        if let Some(hint) = direction_hint {
            let along_normal = hint[monitor.normal.index()];
            if hint.iter().any(|c| !c.is_finite()) || along_normal <= 0.0 {
                return Err(ModeError::InvalidConfig(format!(
                    "direction hint {hint:?} must point through the monitor along +{:?}",
                    monitor.normal
                )));
            }
        }

        match solver.solve_band(frequency, band, parity, direction_hint, options)? {
            EigenOutcome::Converged(mode) => {
                debug!(
                    "[basis] {} band {} at ω={:.6} β={:.6}",
                    solver.name(),
                    band,
                    frequency.omega(),
                    mode.beta.value()
                );
                Ok(BasisResponse::Mode(mode))
            }
            EigenOutcome::NotConverged {
                iterations,
                residual,
            } => Ok(BasisResponse::NotConverged {
                label: BasisLabel::Band(band),
                reason: format!(
                    "{} did not converge after {iterations} iterations (residual {residual:.2e}, tol {:.2e})",
                    solver.name(),
                    options.tol
                ),
            }),
        }
    }
}

impl ModeBasisProvider for BasisSource {
    fn resolve(&self, request: &BasisRequest) -> Result<BasisResponse, ModeError> {
        match (self, &request.kind) {
            (
                BasisSource::Eigensolver { solver, options },
                RequestKind::Band {
                    band,
                    parity,
                    direction_hint,
                },
            ) => Self::resolve_band(
                solver.as_ref(),
                options,
                request.frequency,
                *band,
                parity,
                *direction_hint,
            ),
            (BasisSource::Planewave(resolver), RequestKind::Planewave(spec)) => resolver
                .basis_for_order(request.frequency, spec)
                .map(BasisResponse::Mode),
            (BasisSource::Eigensolver { .. }, RequestKind::Planewave(spec)) => {
                Err(ModeError::UnsupportedRequest(format!(
                    "planewave order {} sent to an eigensolver source",
                    spec.order
                )))
            }
            (BasisSource::Planewave(_), RequestKind::Band { band, .. }) => {
                Err(ModeError::UnsupportedRequest(format!(
                    "band {band} sent to a planewave source"
                )))
            }
        }
    }
}
