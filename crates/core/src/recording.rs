//! Frequency-domain monitor data as handed over by the field solver.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModeError;
use crate::field::TangentialField;
use crate::frequency::{FrequencyPoint, FrequencySet};
use crate::grid::MonitorGrid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(String);

impl MonitorId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MonitorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Tangential fields of one monitor at one frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSample {
    pub monitor: MonitorId,
    pub frequency: FrequencyPoint,
    pub field: TangentialField,
}

impl FieldSample {
    pub fn new(monitor: MonitorId, frequency: FrequencyPoint, field: TangentialField) -> Self {
        Self {
            monitor,
            frequency,
            field,
        }
    }

    pub fn grid(&self) -> MonitorGrid {
        self.field.grid()
    }

    pub fn flux(&self) -> f64 {
        self.field.flux()
    }
}

/// Every frequency one monitor actually recorded during a run.
///
/// The solver may stop early and report fewer frequencies than requested;
/// consumers work with whatever is present.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRecording {
    id: MonitorId,
    grid: MonitorGrid,
    samples: Vec<FieldSample>,
}

impl MonitorRecording {
    pub fn new(id: MonitorId, grid: MonitorGrid) -> Self {
        Self {
            id,
            grid,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, frequency: FrequencyPoint, field: TangentialField) -> Result<(), ModeError> {
        self.grid.check_matches(&field.grid())?;
        if self.sample_at(&frequency).is_some() {
            return Err(ModeError::DuplicateFrequency(frequency.omega()));
        }
        self.samples
            .push(FieldSample::new(self.id.clone(), frequency, field));
        Ok(())
    }

    pub fn with_sample(mut self, frequency: FrequencyPoint, field: TangentialField) -> Result<Self, ModeError> {
        self.push(frequency, field)?;
        Ok(self)
    }

    pub fn id(&self) -> &MonitorId {
        &self.id
    }

    pub fn grid(&self) -> MonitorGrid {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    pub fn frequencies(&self) -> FrequencySet {
        self.samples.iter().map(|s| s.frequency).collect()
    }

    pub fn sample_at(&self, frequency: &FrequencyPoint) -> Option<&FieldSample> {
        self.samples.iter().find(|s| s.frequency.approx_eq(frequency))
    }

    /// Net flux per recorded frequency, in recording order.
    pub fn fluxes(&self) -> Vec<(FrequencyPoint, f64)> {
        self.samples.iter().map(|s| (s.frequency, s.flux())).collect()
    }
}
