//! Mirror-symmetry selectors used to pick one mode out of a degenerate family.
//!
//! A selector is an explicit set of `(axis, parity)` pairs rather than a
//! combinable flag value. In-plane parities refer to the mode's dominant
//! out-of-plane component. For the out-of-plane mirror of a 2D run (`Z`),
//! `Odd` keeps the E-out-of-plane family (TE) and `Even` keeps the
//! H-out-of-plane family (TM).

use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::grid::{Axis, MonitorGrid};
use crate::polarization::Polarization;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

impl Default for Parity {
    fn default() -> Self {
        Parity::Even
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MirrorSymmetry {
    pub axis: Axis,
    pub parity: Parity,
}

impl MirrorSymmetry {
    pub fn new(axis: Axis, parity: Parity) -> Self {
        Self { axis, parity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensionality {
    /// Simulation in the xy plane; `Z` is the out-of-plane axis.
    Two,
    Three,
}

impl Dimensionality {
    pub fn of_grid(grid: &MonitorGrid) -> Self {
        if grid.is_line() {
            Dimensionality::Two
        } else {
            Dimensionality::Three
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParitySelector {
    dims: Dimensionality,
    mirrors: Vec<MirrorSymmetry>,
}

impl ParitySelector {
    /// No symmetry constraint. Degenerate partners come back as an arbitrary
    /// superposition.
    pub fn none(dims: Dimensionality) -> Self {
        Self {
            dims,
            mirrors: Vec::new(),
        }
    }

    pub fn new<I>(dims: Dimensionality, mirrors: I) -> Result<Self, ModeError>
    where
        I: IntoIterator<Item = MirrorSymmetry>,
    {
        let mut selected: Vec<MirrorSymmetry> = Vec::new();
        for mirror in mirrors {
            if selected.iter().any(|m| m.axis == mirror.axis) {
                return Err(ModeError::InvalidParity(format!(
                    "axis {:?} listed more than once",
                    mirror.axis
                )));
            }
            selected.push(mirror);
        }
        if dims == Dimensionality::Three && selected.len() == 3 {
            return Err(ModeError::InvalidParity(
                "three mirrors leave no propagation direction in 3D".to_string(),
            ));
        }
        Ok(Self {
            dims,
            mirrors: selected,
        })
    }

    pub fn dims(&self) -> Dimensionality {
        self.dims
    }

    pub fn mirrors(&self) -> &[MirrorSymmetry] {
        &self.mirrors
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    pub fn parity_for(&self, axis: Axis) -> Option<Parity> {
        self.mirrors.iter().find(|m| m.axis == axis).map(|m| m.parity)
    }

    /// Polarization family picked by the out-of-plane mirror of a 2D run.
    pub fn polarization(&self) -> Option<Polarization> {
        if self.dims != Dimensionality::Two {
            return None;
        }
        self.parity_for(Axis::Z).map(|parity| match parity {
            Parity::Odd => Polarization::TE,
            Parity::Even => Polarization::TM,
        })
    }

    /// Reject mirrors that cannot hold for modes crossing `grid`.
    pub fn validate_for(&self, grid: &MonitorGrid) -> Result<(), ModeError> {
        if Dimensionality::of_grid(grid) != self.dims {
            return Err(ModeError::InvalidParity(format!(
                "selector built for {:?} but monitor is {:?}",
                self.dims,
                Dimensionality::of_grid(grid)
            )));
        }
        if self.parity_for(grid.normal).is_some() {
            return Err(ModeError::InvalidParity(format!(
                "mirror normal to the monitor ({:?}) flips the propagation direction",
                grid.normal
            )));
        }
        Ok(())
    }
}
