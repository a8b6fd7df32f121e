//! Incident-field capture and subtraction.
//!
//! Eigensolver bases at finite resolution are not exactly orthogonal to the
//! field solver's discretization, so projecting incident + reflected fields
//! leaks a little incident power into the reflected coefficients.
//! Subtracting an incident-only recording in the raw field domain first
//! removes that leakage to floating-point precision.

use std::collections::HashMap;

use log::debug;

use crate::error::ModeError;
use crate::frequency::{FrequencyPoint, FrequencySet};
use crate::grid::MonitorGrid;
use crate::recording::{FieldSample, MonitorId, MonitorRecording};

/// Incident-only fields of one monitor, saved from a normalization run.
///
/// Not `Clone`: [`subtract`](Self::subtract) consumes the dataset, so a
/// whole-recording subtraction happens at most once.
///
/// ```compile_fail
/// use modedecomp_core::reference::ReferenceDataset;
/// fn twice(dataset: &ReferenceDataset) -> ReferenceDataset {
///     dataset.clone()
/// }
/// ```
#[derive(Debug, PartialEq)]
pub struct ReferenceDataset {
    recording: MonitorRecording,
    incident_flux: Vec<(FrequencyPoint, f64)>,
}

impl ReferenceDataset {
    pub fn capture(recording: &MonitorRecording) -> Self {
        debug!(
            "[reference] captured monitor {} ({} frequencies)",
            recording.id(),
            recording.len()
        );
        Self {
            incident_flux: recording.fluxes(),
            recording: recording.clone(),
        }
    }

    pub fn monitor(&self) -> &MonitorId {
        self.recording.id()
    }

    pub fn grid(&self) -> MonitorGrid {
        self.recording.grid()
    }

    pub fn frequencies(&self) -> FrequencySet {
        self.recording.frequencies()
    }

    /// Net flux of the incident run at `frequency`.
    pub fn incident_flux(&self, frequency: &FrequencyPoint) -> Option<f64> {
        self.incident_flux
            .iter()
            .find(|(f, _)| f.approx_eq(frequency))
            .map(|(_, flux)| *flux)
    }

    /// `sample − reference` at the sample's frequency.
    ///
    /// Borrows the dataset, for callers that stream one frequency at a time;
    /// use [`subtract`](Self::subtract) once the whole recording is in hand.
    pub fn subtract_sample(&self, sample: &FieldSample) -> Result<FieldSample, ModeError> {
        self.check_monitor(&sample.monitor, &sample.grid())?;
        let reference = self.covering(&sample.frequency)?;
        let field = sample.field.checked_sub(&reference.field)?;
        Ok(FieldSample::new(sample.monitor.clone(), sample.frequency, field))
    }

    /// Subtract from every frequency of `recording`, consuming the dataset.
    ///
    /// Fails if any recorded frequency is missing from the reference; nothing
    /// is silently dropped.
    pub fn subtract(self, recording: &MonitorRecording) -> Result<MonitorRecording, ModeError> {
        self.check_monitor(recording.id(), &recording.grid())?;
        let mut out = MonitorRecording::new(recording.id().clone(), recording.grid());
        for sample in recording.samples() {
            let reference = self.covering(&sample.frequency)?;
            out.push(sample.frequency, sample.field.checked_sub(&reference.field)?)?;
        }
        debug!(
            "[reference] subtracted incident fields from monitor {} ({} frequencies)",
            recording.id(),
            out.len()
        );
        Ok(out)
    }

    fn check_monitor(&self, monitor: &MonitorId, grid: &MonitorGrid) -> Result<(), ModeError> {
        if monitor != self.recording.id() {
            return Err(ModeError::MonitorMismatch {
                expected: self.recording.id().clone(),
                found: monitor.clone(),
            });
        }
        self.recording.grid().check_matches(grid)
    }

    fn covering(&self, frequency: &FrequencyPoint) -> Result<&FieldSample, ModeError> {
        self.recording
            .sample_at(frequency)
            .ok_or_else(|| ModeError::FrequencyCoverage {
                monitor: self.recording.id().clone(),
                omega: frequency.omega(),
            })
    }
}

/// Reference datasets of a run sequence, one per monitor.
///
/// `take` hands the dataset out by value, so each one is consumed at most once.
#[derive(Debug, Default)]
pub struct ReferenceStore {
    datasets: HashMap<MonitorId, ReferenceDataset>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: ReferenceDataset) -> Result<(), ModeError> {
        let key = dataset.monitor().clone();
        if self.datasets.contains_key(&key) {
            return Err(ModeError::DuplicateReference(key));
        }
        self.datasets.insert(key, dataset);
        Ok(())
    }

    pub fn capture(&mut self, recording: &MonitorRecording) -> Result<(), ModeError> {
        self.insert(ReferenceDataset::capture(recording))
    }

    pub fn take(&mut self, monitor: &MonitorId) -> Option<ReferenceDataset> {
        self.datasets.remove(monitor)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
