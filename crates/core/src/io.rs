//! Configuration file parsing.
//!
//! A decomposition job names the monitor, the medium and periodicity the
//! basis lives in, and which basis vectors to project onto.
//!
//! # File Format
//!
//! ```toml
//! [monitor]
//! id = "transmission"
//! normal = "x"
//! n1 = 200
//! d1 = 0.05
//! origin = [-4.975, 0.0]
//!
//! [medium]
//! epsilon = 2.25
//!
//! [lattice]
//! period1 = 10.0
//! k_offset = [0.0, 0.0]
//!
//! [basis]
//! kind = "planewave"          # or "bands"
//! axis = [0.0, 1.0, 0.0]
//! s = [1.0, 0.0]
//! # orders = [[-1], [0], [1]] # omit for every propagating order
//!
//! [eigensolver]
//! max_iter = 200
//! tol = 1e-8
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::band_solver::HomogeneousBandSolver;
use crate::eigensolver::EigenOptions;
use crate::error::ModeError;
use crate::frequency::FrequencyPoint;
use crate::grid::MonitorGrid;
use crate::lattice::{DiffractionOrder, TransverseLattice};
use crate::metrics::MetricsConfig;
use crate::planewave::{Medium, PlanewaveResolver, PlanewaveSpec, validate_amplitudes};
use crate::provider::{BasisRequest, BasisSource, RequestKind};
use crate::recording::MonitorId;
use crate::symmetry::{Dimensionality, MirrorSymmetry, ParitySelector};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub id: String,
    #[serde(flatten)]
    pub grid: MonitorGrid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatticeConfig {
    #[serde(default)]
    pub period1: Option<f64>,
    #[serde(default)]
    pub period2: Option<f64>,
    /// Bloch offset of the transverse wavevector, per transverse slot.
    #[serde(default)]
    pub k_offset: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BasisConfig {
    Planewave {
        /// Explicit orders; every propagating order when omitted.
        #[serde(default)]
        orders: Option<Vec<DiffractionOrder>>,
        #[serde(default = "default_s_amplitude")]
        s: Complex64,
        #[serde(default)]
        p: Complex64,
        axis: [f64; 3],
    },
    Bands {
        bands: Vec<usize>,
        #[serde(default)]
        parity: Vec<MirrorSymmetry>,
        #[serde(default)]
        direction_hint: Option<[f64; 3]>,
    },
}

fn default_s_amplitude() -> Complex64 {
    Complex64::new(1.0, 0.0)
}

/// Decomposition job loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionConfig {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub medium: Medium,
    #[serde(default)]
    pub lattice: LatticeConfig,
    pub basis: BasisConfig,
    #[serde(default)]
    pub eigensolver: EigenOptions,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DecompositionConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn monitor_id(&self) -> MonitorId {
        MonitorId::new(self.monitor.id.clone())
    }

    pub fn grid(&self) -> MonitorGrid {
        self.monitor.grid
    }

    pub fn lattice(&self) -> TransverseLattice {
        TransverseLattice {
            periods: [self.lattice.period1, self.lattice.period2],
        }
    }

    pub fn validate(&self) -> Result<(), ModeError> {
        let grid = self.grid();
        if grid.is_empty() {
            return Err(ModeError::InvalidConfig("monitor has no samples".to_string()));
        }
        if !(grid.d1 > 0.0 && grid.d2 > 0.0) {
            return Err(ModeError::InvalidConfig(format!(
                "monitor spacing must be positive, got ({}, {})",
                grid.d1, grid.d2
            )));
        }
        self.lattice().validate()?;
        self.medium.validate()?;
        self.eigensolver.validate()?;
        match &self.basis {
            BasisConfig::Planewave { orders, s, p, .. } => {
                validate_amplitudes(*s, *p)?;
                if let Some(orders) = orders {
                    let rank = self.lattice().rank();
                    if let Some(bad) = orders.iter().find(|o| o.rank() != rank) {
                        return Err(ModeError::OrderRank {
                            order: bad.to_string(),
                            expected: rank,
                            found: bad.rank(),
                        });
                    }
                }
            }
            BasisConfig::Bands { bands, .. } => {
                if bands.is_empty() {
                    return Err(ModeError::InvalidConfig("basis.bands is empty".to_string()));
                }
                if let Some(&band) = bands.iter().find(|&&b| b == 0) {
                    return Err(ModeError::InvalidBandIndex(band));
                }
                self.parity()?.validate_for(&grid)?;
            }
        }
        Ok(())
    }

    pub fn parity(&self) -> Result<ParitySelector, ModeError> {
        let dims = Dimensionality::of_grid(&self.grid());
        match &self.basis {
            BasisConfig::Bands { parity, .. } => ParitySelector::new(dims, parity.iter().copied()),
            BasisConfig::Planewave { .. } => Ok(ParitySelector::none(dims)),
        }
    }

    pub fn planewave_resolver(&self) -> Result<PlanewaveResolver, ModeError> {
        PlanewaveResolver::new(self.grid(), self.lattice(), self.medium, self.lattice.k_offset)
    }

    /// Basis source described by the file. Band requests are served by the
    /// homogeneous reference solver; other eigensolvers are attached in code.
    pub fn basis_source(&self) -> Result<BasisSource, ModeError> {
        self.validate()?;
        match &self.basis {
            BasisConfig::Planewave { .. } => Ok(BasisSource::planewave(self.planewave_resolver()?)),
            BasisConfig::Bands { .. } => {
                let grid = self.grid();
                let slot = grid.sampled_slot();
                let lattice = self.lattice();
                let period = lattice.periods[slot].filter(|_| lattice.rank() == 1).ok_or_else(|| {
                    ModeError::InvalidConfig(
                        "band basis needs exactly one period along the sampled monitor direction".to_string(),
                    )
                })?;
                let solver = HomogeneousBandSolver::new(grid, period, self.medium, self.lattice.k_offset[slot])?;
                BasisSource::eigensolver(solver, self.eigensolver)
            }
        }
    }

    /// Requests for one frequency, in basis order.
    pub fn requests_for(&self, frequency: FrequencyPoint, source: &BasisSource) -> Result<Vec<BasisRequest>, ModeError> {
        match &self.basis {
            BasisConfig::Planewave { orders, s, p, axis } => {
                let orders = match orders {
                    Some(orders) => orders.clone(),
                    None => source.propagating_orders(frequency)?,
                };
                Ok(orders
                    .into_iter()
                    .map(|order| BasisRequest::planewave(frequency, PlanewaveSpec::new(order, *s, *p, *axis)))
                    .collect())
            }
            BasisConfig::Bands {
                bands,
                direction_hint,
                ..
            } => {
                let parity = self.parity()?;
                Ok(bands
                    .iter()
                    .map(|&band| BasisRequest {
                        frequency,
                        kind: RequestKind::Band {
                            band,
                            parity: parity.clone(),
                            direction_hint: *direction_hint,
                        },
                    })
                    .collect())
            }
        }
    }
}
