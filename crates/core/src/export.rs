//! Tabular export of mode coefficients for downstream analysis.

use std::io::{self, Write};

use serde::Serialize;

use crate::mode::{CoefficientStatus, Direction};
use crate::planewave::angle_degrees;
use crate::projection::Decomposition;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub omega: f64,
    pub wavelength: f64,
    pub label: String,
    pub direction: Direction,
    /// Propagation angle from the monitor normal, `None` when not propagating.
    pub angle_deg: Option<f64>,
    pub power: f64,
    pub phase_rad: f64,
    pub status: CoefficientStatus,
}

/// One row per (mode, direction) in `directions`.
pub fn rows_from_decomposition(decomposition: &Decomposition, directions: &[Direction]) -> Vec<ExportRow> {
    let mut rows = Vec::with_capacity(decomposition.len() * directions.len());
    for mode in &decomposition.modes {
        for &direction in directions {
            let coefficient = mode.get(direction);
            let angle_deg = match coefficient.status {
                CoefficientStatus::Propagating if mode.beta.re > 0.0 => {
                    Some(angle_degrees(mode.transverse_k, mode.beta.re))
                }
                _ => None,
            };
            rows.push(ExportRow {
                omega: decomposition.frequency.omega(),
                wavelength: decomposition.frequency.wavelength(),
                label: mode.label.to_string(),
                direction,
                angle_deg,
                power: coefficient.power(),
                phase_rad: coefficient.phase(),
                status: coefficient.status,
            });
        }
    }
    rows
}

pub fn write_csv<W: Write>(rows: &[ExportRow], writer: &mut W) -> io::Result<()> {
    write_csv_header(writer)?;
    for row in rows {
        write_csv_row(row, writer)?;
    }
    writer.flush()
}

pub fn write_csv_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "omega,wavelength,label,direction,angle_deg,power,phase_rad,status"
    )
}

pub fn write_csv_row<W: Write>(row: &ExportRow, writer: &mut W) -> io::Result<()> {
    let angle = row
        .angle_deg
        .map(|angle| angle.to_string())
        .unwrap_or_default();
    let label = if row.label.contains(',') {
        format!("\"{}\"", row.label)
    } else {
        row.label.clone()
    };
    let status = match row.status {
        CoefficientStatus::Propagating => "propagating",
        CoefficientStatus::Evanescent => "evanescent",
        CoefficientStatus::NotConverged => "not_converged",
    };
    writeln!(
        writer,
        "{},{},{},{},{},{},{},{}",
        row.omega, row.wavelength, label, row.direction, angle, row.power, row.phase_rad, status
    )
}
