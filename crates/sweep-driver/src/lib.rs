//! Modedecomp Sweep Driver - multi-threaded frequency sweep over monitor recordings.
//!
//! A field solver run leaves one [`MonitorRecording`] per monitor, holding
//! every frequency it actually reached. The driver decomposes those
//! frequencies in parallel against the basis described by a TOML file:
//!
//! - **Reference subtraction**: an optional incident-only dataset is removed
//!   from the recording before projection
//! - **Thread pool management**: fixed worker count, physical cores by default
//! - **Progress tracking**: one progress bar, no per-thread noise
//! - **Output**: ordered CSV rows per mode and direction, plus optional JSONL metrics
//!
//! Frequencies requested in `[sweep]` but absent from the recording are
//! reported as skipped rather than treated as errors.
//!
//! [`MonitorRecording`]: modedecomp_core::recording::MonitorRecording

pub mod config;
pub mod driver;
pub mod output;

pub use config::{ConfigError, FrequencyRange, SweepConfig, SweepSection};
pub use driver::{DriverError, FrequencyFailure, SweepDriver, SweepResult};
pub use output::OutputWriter;
