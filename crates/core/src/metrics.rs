//! JSON-lines event log for decomposition sweeps.
//!
//! Each event becomes one self-contained JSON object tagged with `event` and
//! stamped with wall-clock milliseconds, so a sweep can be replayed or
//! plotted without parsing log text.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// `[metrics]` table of a decomposition job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub output: Option<PathBuf>,
    pub format: MetricsFormat,
}

impl MetricsConfig {
    /// `None` when disabled. Enabling without an output path is an error.
    pub fn build_recorder(&self) -> io::Result<Option<MetricsRecorder>> {
        if !self.enabled {
            return Ok(None);
        }
        match &self.output {
            Some(path) => MetricsRecorder::new(path, self.format).map(Some),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "metrics are enabled but metrics.output is not set",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsFormat {
    #[default]
    JsonLines,
}

/// Shared sink for [`MetricsEvent`]s; safe to use from sweep workers.
pub struct MetricsRecorder {
    sink: Mutex<Box<dyn Write + Send>>,
    format: MetricsFormat,
    written: AtomicUsize,
}

impl MetricsRecorder {
    /// Truncate or create `path`, creating its parent directory as needed.
    pub fn new(path: &Path, format: MetricsFormat) -> io::Result<Self> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
            _ => {}
        }
        let file = BufWriter::new(File::create(path)?);
        Ok(Self::from_writer(Box::new(file), format))
    }

    pub fn from_writer(sink: Box<dyn Write + Send>, format: MetricsFormat) -> Self {
        Self {
            sink: Mutex::new(sink),
            format,
            written: AtomicUsize::new(0),
        }
    }

    /// Record one event. Write failures are logged and otherwise ignored.
    pub fn emit(&self, event: MetricsEvent<'_>) {
        match self.encode(event).and_then(|line| self.append(&line)) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => log::warn!("[metrics] dropped event: {err}"),
        }
    }

    /// Events successfully written so far.
    pub fn events_written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    fn encode(&self, event: MetricsEvent<'_>) -> io::Result<String> {
        match self.format {
            MetricsFormat::JsonLines => {
                let stamped = Stamped {
                    timestamp_ms: unix_millis(),
                    event,
                };
                let mut line = serde_json::to_string(&stamped)?;
                line.push('\n');
                Ok(line)
            }
        }
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| io::Error::other("metrics sink poisoned by a panicking writer"))?;
        sink.write_all(line.as_bytes())?;
        sink.flush()
    }
}

#[derive(Serialize)]
struct Stamped<'a> {
    timestamp_ms: f64,
    #[serde(flatten)]
    event: MetricsEvent<'a>,
}

/// Events emitted by the sweep driver.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MetricsEvent<'a> {
    SweepStart {
        monitor: &'a str,
        basis: &'a str,
        frequencies: usize,
        skipped_frequencies: usize,
        threads: usize,
        reference_subtracted: bool,
    },
    FrequencyDecomposed {
        monitor: &'a str,
        omega: f64,
        modes: usize,
        warnings: usize,
        forward_power: f64,
        backward_power: f64,
        duration_ms: f64,
    },
    SweepDone {
        monitor: &'a str,
        completed: usize,
        failed: usize,
        duration_ms: f64,
    },
}

fn unix_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64() * 1e3)
}
