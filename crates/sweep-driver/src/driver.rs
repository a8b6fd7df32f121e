//! Multi-threaded driver for frequency sweeps.
//!
//! Each recorded frequency is an independent job: resolve the basis at that
//! frequency, project, collect. Jobs run on a dedicated rayon pool and results
//! are reassembled in recording order before anything is written.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;

use modedecomp_core::{
    error::ModeError,
    frequency::FrequencyPoint,
    metrics::{MetricsEvent, MetricsRecorder},
    mode::Direction,
    projection::{Decomposition, decompose_requests},
    provider::BasisSource,
    recording::{FieldSample, MonitorId, MonitorRecording},
    reference::ReferenceDataset,
};

use crate::config::{ConfigError, SweepConfig};
use crate::output::OutputWriter;

// ============================================================================
// Sweep Result
// ============================================================================

/// A frequency whose decomposition was rejected.
#[derive(Debug, Clone)]
pub struct FrequencyFailure {
    pub frequency: FrequencyPoint,
    pub error: ModeError,
}

/// Outcome of one sweep over a monitor recording.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub monitor: MonitorId,

    /// Successful decompositions, in recording order.
    pub decompositions: Vec<Decomposition>,

    pub failures: Vec<FrequencyFailure>,

    /// Requested frequencies the field solver never recorded.
    pub skipped_frequencies: Vec<FrequencyPoint>,

    pub reference_subtracted: bool,

    /// CSV rows written, zero when no output is configured.
    pub rows_written: usize,

    pub duration: Duration,
}

impl SweepResult {
    pub fn completed(&self) -> usize {
        self.decompositions.len()
    }

    /// Coefficients forced to zero across the whole sweep.
    pub fn warning_count(&self) -> usize {
        self.decompositions.iter().map(|d| d.warnings.len()).sum()
    }

    pub fn decomposition_at(&self, frequency: &FrequencyPoint) -> Option<&Decomposition> {
        self.decompositions
            .iter()
            .find(|d| d.frequency.approx_eq(frequency))
    }
}

impl std::fmt::Display for SweepResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sweep Statistics ({})", self.monitor)?;
        writeln!(f, "==================")?;
        writeln!(f, "Completed: {}", self.completed())?;
        writeln!(f, "Failed: {}", self.failures.len())?;
        writeln!(f, "Skipped: {}", self.skipped_frequencies.len())?;
        writeln!(f, "Warnings: {}", self.warning_count())?;
        writeln!(f, "Reference subtracted: {}", self.reference_subtracted)?;
        writeln!(f, "Total time: {:.2?}", self.duration)?;
        if self.completed() > 0 {
            writeln!(
                f,
                "Avg time/frequency: {:.2?}",
                self.duration / self.completed() as u32
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Sweep Driver
// ============================================================================

pub struct SweepDriver {
    config: SweepConfig,
    source: BasisSource,
    threads: usize,
}

impl SweepDriver {
    /// Build the driver and the basis source the configuration describes.
    pub fn new(config: SweepConfig) -> Result<Self, DriverError> {
        let source = config.job.basis_source()?;
        Ok(Self::with_source(config, source))
    }

    /// Use an externally constructed basis source, e.g. a custom eigensolver.
    pub fn with_source(config: SweepConfig, source: BasisSource) -> Self {
        let threads = config.effective_threads();
        Self {
            config,
            source,
            threads,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn source(&self) -> &BasisSource {
        &self.source
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Decompose every recorded frequency of `recording`.
    ///
    /// With a `reference`, incident fields are subtracted first; the dataset is
    /// consumed. Monitor, geometry and reference coverage problems abort the
    /// sweep. A frequency whose basis cannot be built is reported in
    /// [`SweepResult::failures`] and the rest continue.
    pub fn run(
        &self,
        recording: &MonitorRecording,
        reference: Option<ReferenceDataset>,
    ) -> Result<SweepResult, DriverError> {
        let start_time = Instant::now();
        let monitor = self.config.job.monitor_id();
        if recording.id() != &monitor {
            return Err(ModeError::MonitorMismatch {
                expected: monitor,
                found: recording.id().clone(),
            }
            .into());
        }
        self.config.job.grid().check_matches(&recording.grid())?;

        let reference_subtracted = reference.is_some();
        let prepared = match reference {
            Some(dataset) => dataset.subtract(recording)?,
            None => recording.clone(),
        };

        let skipped_frequencies = self.skipped_frequencies(&prepared)?;
        for frequency in &skipped_frequencies {
            warn!(
                "[sweep] monitor {} has no data at ω={:.6}; skipping",
                monitor,
                frequency.omega()
            );
        }

        let recorder = self
            .config
            .job
            .metrics
            .build_recorder()
            .map_err(|e| DriverError::Output(e.to_string()))?;
        if let Some(recorder) = &recorder {
            recorder.emit(MetricsEvent::SweepStart {
                monitor: monitor.as_str(),
                basis: self.source.kind(),
                frequencies: prepared.len(),
                skipped_frequencies: skipped_frequencies.len(),
                threads: self.threads,
                reference_subtracted,
            });
        }

        let samples = prepared.samples();
        if samples.is_empty() {
            warn!("[sweep] monitor {} recorded no frequencies", monitor);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| DriverError::ThreadPool(e.to_string()))?;

        let completed = AtomicUsize::new(0);
        let results = Mutex::new(Vec::with_capacity(samples.len()));
        let failures = Mutex::new(Vec::new());
        let pb = progress_bar(samples.len());

        pool.install(|| {
            samples.par_iter().enumerate().for_each(|(idx, sample)| {
                let job_start = Instant::now();
                match self.decompose_sample(sample) {
                    Ok(decomposition) => {
                        if let Some(recorder) = &recorder {
                            emit_decomposed(recorder, &decomposition, job_start.elapsed());
                        }
                        completed.fetch_add(1, Ordering::Relaxed);
                        results.lock().push((idx, decomposition));
                    }
                    Err(err) => {
                        error!(
                            "[sweep] monitor {} ω={:.6}: {}",
                            monitor,
                            sample.frequency.omega(),
                            err
                        );
                        failures.lock().push((
                            idx,
                            FrequencyFailure {
                                frequency: sample.frequency,
                                error: err,
                            },
                        ));
                    }
                }
                pb.inc(1);
            });
        });
        pb.finish_and_clear();

        let mut results = results.into_inner();
        results.sort_by_key(|(idx, _)| *idx);
        let decompositions: Vec<Decomposition> = results.into_iter().map(|(_, d)| d).collect();
        let mut failures = failures.into_inner();
        failures.sort_by_key(|(idx, _)| *idx);
        let failures: Vec<FrequencyFailure> = failures.into_iter().map(|(_, f)| f).collect();

        let rows_written = match &self.config.sweep.output {
            Some(path) => self.write_output(path, &decompositions)?,
            None => 0,
        };

        let duration = start_time.elapsed();
        if let Some(recorder) = &recorder {
            recorder.emit(MetricsEvent::SweepDone {
                monitor: monitor.as_str(),
                completed: completed.load(Ordering::Relaxed),
                failed: failures.len(),
                duration_ms: duration.as_secs_f64() * 1000.0,
            });
        }
        info!(
            "[sweep] monitor {}: {} decomposed, {} failed, {} skipped in {:.2?}",
            monitor,
            decompositions.len(),
            failures.len(),
            skipped_frequencies.len(),
            duration
        );

        Ok(SweepResult {
            monitor,
            decompositions,
            failures,
            skipped_frequencies,
            reference_subtracted,
            rows_written,
            duration,
        })
    }

    fn decompose_sample(&self, sample: &FieldSample) -> Result<Decomposition, ModeError> {
        let requests = self.config.job.requests_for(sample.frequency, &self.source)?;
        debug!(
            "[sweep] ω={:.6}: {} basis requests",
            sample.frequency.omega(),
            requests.len()
        );
        decompose_requests(sample, &self.source, &requests)
    }

    fn skipped_frequencies(&self, recording: &MonitorRecording) -> Result<Vec<FrequencyPoint>, DriverError> {
        let Some(requested) = self.config.requested_frequencies()? else {
            return Ok(Vec::new());
        };
        let recorded = recording.frequencies();
        Ok(requested
            .iter()
            .filter(|f| !recorded.contains(f))
            .copied()
            .collect())
    }

    fn write_output(&self, path: &Path, decompositions: &[Decomposition]) -> Result<usize, DriverError> {
        let mut writer = OutputWriter::create(path, &self.config.sweep.directions)
            .map_err(|e| DriverError::Output(e.to_string()))?;
        for decomposition in decompositions {
            writer
                .write_decomposition(decomposition)
                .map_err(|e| DriverError::Output(e.to_string()))?;
        }
        let rows = writer.rows_written();
        writer
            .finalize()
            .map_err(|e| DriverError::Output(e.to_string()))?;
        debug!("[sweep] wrote {} rows to {}", rows, path.display());
        Ok(rows)
    }
}

fn emit_decomposed(recorder: &MetricsRecorder, decomposition: &Decomposition, elapsed: Duration) {
    recorder.emit(MetricsEvent::FrequencyDecomposed {
        monitor: decomposition.monitor.as_str(),
        omega: decomposition.frequency.omega(),
        modes: decomposition.len(),
        warnings: decomposition.warnings.len(),
        forward_power: decomposition.total_power(Direction::Forward),
        backward_power: decomposition.total_power(Direction::Backward),
        duration_ms: elapsed.as_secs_f64() * 1000.0,
    });
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        Ok(style) => pb.set_style(style.progress_chars("█▓░")),
        Err(err) => debug!("[sweep] progress template rejected: {err}"),
    }
    pb
}

// ============================================================================
// Errors
// ============================================================================

/// Driver-level errors.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to create thread pool: {0}")]
    ThreadPool(String),

    #[error("output error: {0}")]
    Output(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("decomposition error: {0}")]
    Decomposition(#[from] ModeError),
}
