//! Reflectance, transmittance and power budgets.

use serde::Serialize;

use crate::error::ModeError;
use crate::frequency::FrequencyPoint;
use crate::mode::Direction;
use crate::projection::Decomposition;
use crate::recording::MonitorRecording;
use crate::reference::ReferenceDataset;

/// Net flux of a monitor per frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxSpectrum {
    entries: Vec<(FrequencyPoint, f64)>,
}

impl FluxSpectrum {
    pub fn from_recording(recording: &MonitorRecording) -> Self {
        Self {
            entries: recording.fluxes(),
        }
    }

    pub fn flux_at(&self, frequency: &FrequencyPoint) -> Option<f64> {
        self.entries
            .iter()
            .find(|(f, _)| f.approx_eq(frequency))
            .map(|(_, flux)| *flux)
    }

    pub fn entries(&self) -> &[(FrequencyPoint, f64)] {
        &self.entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectrumRow {
    pub omega: f64,
    pub wavelength: f64,
    pub reflectance: f64,
    pub transmittance: f64,
    pub loss: f64,
}

/// `R = −Φ_refl / Φ_inc`, `T = Φ_trans / Φ_inc`, `loss = 1 − R − T`.
///
/// `reflected` must already have the incident fields subtracted, so its flux
/// is negative (it flows against the monitor normal).
pub fn normalized_spectra(
    incident: &ReferenceDataset,
    reflected: &FluxSpectrum,
    transmitted: &FluxSpectrum,
) -> Result<Vec<SpectrumRow>, ModeError> {
    let mut rows = Vec::with_capacity(transmitted.entries.len());
    for &(frequency, trans) in &transmitted.entries {
        let incident_flux = incident
            .incident_flux(&frequency)
            .ok_or_else(|| ModeError::FrequencyCoverage {
                monitor: incident.monitor().clone(),
                omega: frequency.omega(),
            })?;
        if incident_flux <= 0.0 {
            return Err(ModeError::InvalidConfig(format!(
                "incident flux at ω={} is {incident_flux}, cannot normalize",
                frequency.omega()
            )));
        }
        let refl = reflected.flux_at(&frequency).ok_or_else(|| {
            ModeError::InvalidConfig(format!(
                "reflected flux missing at ω={}",
                frequency.omega()
            ))
        })?;
        let reflectance = -refl / incident_flux;
        let transmittance = trans / incident_flux;
        rows.push(SpectrumRow {
            omega: frequency.omega(),
            wavelength: frequency.wavelength(),
            reflectance,
            transmittance,
            loss: 1.0 - reflectance - transmittance,
        });
    }
    Ok(rows)
}

/// Modal power bookkeeping for a two-port: backward modes on the reflection
/// monitor, forward modes on the transmission monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerBudget {
    pub incident: f64,
    pub reflected: f64,
    pub transmitted: f64,
}

impl PowerBudget {
    pub fn from_decompositions(
        incident: f64,
        reflected: &Decomposition,
        transmitted: &Decomposition,
    ) -> Result<Self, ModeError> {
        if !reflected.frequency.approx_eq(&transmitted.frequency) {
            return Err(ModeError::FrequencyMismatch {
                sample: reflected.frequency.omega(),
                basis: transmitted.frequency.omega(),
            });
        }
        if !(incident.is_finite() && incident > 0.0) {
            return Err(ModeError::InvalidConfig(format!(
                "incident power must be positive, got {incident}"
            )));
        }
        Ok(Self {
            incident,
            reflected: reflected.total_power(Direction::Backward),
            transmitted: transmitted.total_power(Direction::Forward),
        })
    }

    pub fn reflectance(&self) -> f64 {
        self.reflected / self.incident
    }

    pub fn transmittance(&self) -> f64 {
        self.transmitted / self.incident
    }

    pub fn total(&self) -> f64 {
        self.reflectance() + self.transmittance()
    }

    /// Lossless check: `|R + T − 1| ≤ tol`.
    pub fn is_conserved(&self, tol: f64) -> bool {
        (self.total() - 1.0).abs() <= tol
    }
}
