//! Polarization markers (TE/TM) relative to the plane of incidence.
//!
//! TE is the S polarization (E perpendicular to the plane of incidence), TM
//! the P polarization (H perpendicular to it). Modes mixing both are `Hybrid`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarization {
    TE,
    TM,
    Hybrid,
}
