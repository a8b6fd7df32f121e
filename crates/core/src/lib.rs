//! Core math, data model, and APIs for decomposing monitor fields into modes.

pub mod band_solver;
pub mod eigensolver;
pub mod error;
pub mod export;
pub mod field;
pub mod frequency;
pub mod grid;
pub mod io;
pub mod lattice;
pub mod metrics;
pub mod mode;
pub mod planewave;
pub mod polarization;
pub mod projection;
pub mod provider;
pub mod recording;
pub mod reference;
pub mod spectra;
pub mod symmetry;

#[cfg(test)]
mod _tests_common;
#[cfg(test)]
mod _tests_export;
#[cfg(test)]
mod _tests_lattice;
#[cfg(test)]
mod _tests_projection;
#[cfg(test)]
mod _tests_provider;
#[cfg(test)]
mod _tests_symmetry;
