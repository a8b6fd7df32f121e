//! Configuration for frequency sweeps.
//!
//! A sweep file is a decomposition job (see [`DecompositionConfig`]) plus a
//! `[sweep]` table that controls parallelism and output.
//!
//! ```toml
//! [monitor]
//! id = "reflection"
//! normal = "x"
//! n1 = 128
//! d1 = 0.078125
//!
//! [lattice]
//! period1 = 10.0
//!
//! [basis]
//! kind = "planewave"
//! axis = [0.0, 1.0, 0.0]
//!
//! [sweep]
//! threads = 4
//! output = "out/reflection.csv"
//! directions = ["backward"]
//! frequencies = { center = 2.0, width = 0.5, count = 51 }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use modedecomp_core::{
    error::ModeError,
    frequency::FrequencySet,
    io::DecompositionConfig,
    mode::Direction,
};

/// Frequencies the field solver was asked to record, `center ± width/2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub center: f64,
    pub width: f64,
    pub count: usize,
}

impl FrequencyRange {
    pub fn to_set(&self) -> Result<FrequencySet, ModeError> {
        FrequencySet::linspace(self.center, self.width, self.count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSection {
    /// Worker threads; physical core count when unset.
    #[serde(default)]
    pub threads: Option<usize>,

    /// CSV destination. Nothing is written when unset.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Directions exported per mode.
    #[serde(default = "default_directions")]
    pub directions: Vec<Direction>,

    /// Requested frequencies, used to report the ones the recording lacks.
    #[serde(default)]
    pub frequencies: Option<FrequencyRange>,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            threads: None,
            output: None,
            directions: default_directions(),
            frequencies: None,
        }
    }
}

fn default_directions() -> Vec<Direction> {
    vec![Direction::Forward, Direction::Backward]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(flatten)]
    pub job: DecompositionConfig,

    #[serde(default)]
    pub sweep: SweepSection,
}

impl SweepConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SweepConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.job.validate()?;
        if self.sweep.threads == Some(0) {
            return Err(ConfigError::InvalidSweep("threads must be at least 1".into()));
        }
        if self.sweep.directions.is_empty() {
            return Err(ConfigError::InvalidSweep("directions must not be empty".into()));
        }
        if let Some(range) = &self.sweep.frequencies {
            if range.count == 0 {
                return Err(ConfigError::InvalidSweep("frequencies.count must be at least 1".into()));
            }
            range.to_set()?;
        }
        Ok(())
    }

    /// Thread count to run with.
    pub fn effective_threads(&self) -> usize {
        self.sweep.threads.unwrap_or_else(num_cpus::get_physical).max(1)
    }

    pub fn requested_frequencies(&self) -> Result<Option<FrequencySet>, ConfigError> {
        match &self.sweep.frequencies {
            Some(range) => Ok(Some(range.to_set()?)),
            None => Ok(None),
        }
    }
}

/// Configuration parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid decomposition job: {0}")]
    Job(#[from] ModeError),

    #[error("invalid sweep section: {0}")]
    InvalidSweep(String),
}
