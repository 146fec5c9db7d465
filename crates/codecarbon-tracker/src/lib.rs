//! Emissions measurement sessions.
//!
//! This crate is the measurement collaborator for the CodeCarbon language
//! server. Callers interact with it only through the session contract:
//! construct a tracker for an output directory, `start()` a session, and
//! `stop()` it to get back an emissions estimate in kg CO2e while a record
//! is appended to the emissions CSV.
//!
//! The estimate uses a constant-power model (average machine draw over the
//! session duration, converted with a world-average grid carbon intensity).
//! There is no per-component sensor sampling.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Default name of the emissions CSV, created in the configured output
/// directory.
pub const OUTPUT_EMISSIONS_FILE: &str = ".codecarbon.emissions.csv";

/// Average whole-machine power draw assumed for a development machine, in
/// watts. Matches the PSU + CPU default the CodeCarbon library falls back to
/// when no sensor is available.
const AVG_POWER_WATTS: f64 = 42.5;

/// World-average grid carbon intensity, in kg CO2e per kWh.
const CARBON_INTENSITY_KG_PER_KWH: f64 = 0.475;

const CSV_HEADER: &str = "timestamp,duration_secs,energy_kwh,emissions_kg\n";

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("output directory {0} is not a directory")]
    InvalidOutputDir(PathBuf),

    #[error("tracking session is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for a tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Directory the emissions CSV is written to.
    pub output_dir: PathBuf,
    /// File name of the emissions CSV within `output_dir`.
    pub output_file: String,
}

impl TrackerConfig {
    /// Create a configuration with the default output file name.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_file: OUTPUT_EMISSIONS_FILE.to_string(),
        }
    }
}

/// A tracked measurement session.
///
/// Construction validates the output directory; a session then runs between
/// `start()` and `stop()`. The tracker holds at most one session at a time,
/// and `stop()` consumes it, so the same tracker can be started again.
#[derive(Debug)]
pub struct EmissionsTracker {
    config: TrackerConfig,
    started_at: Option<Instant>,
}

impl EmissionsTracker {
    /// Create a tracker, creating the output directory if needed.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        if config.output_dir.exists() {
            if !config.output_dir.is_dir() {
                return Err(TrackerError::InvalidOutputDir(config.output_dir.clone()));
            }
        } else {
            std::fs::create_dir_all(&config.output_dir)?;
        }

        Ok(Self {
            config,
            started_at: None,
        })
    }

    /// Full path of the emissions CSV this tracker writes to.
    pub fn output_path(&self) -> PathBuf {
        self.config.output_dir.join(&self.config.output_file)
    }

    /// Whether a session is currently running.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Begin a measurement session. Restarting a running session resets its
    /// starting point.
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// End the session, append a record to the emissions CSV, and return the
    /// estimated emissions in kg CO2e.
    pub fn stop(&mut self) -> Result<f64, TrackerError> {
        let started_at = self.started_at.take().ok_or(TrackerError::NotRunning)?;
        let duration = started_at.elapsed();

        let energy_kwh = estimate_energy_kwh(duration);
        let emissions_kg = energy_kwh * CARBON_INTENSITY_KG_PER_KWH;

        self.append_record(duration, energy_kwh, emissions_kg)?;
        Ok(emissions_kg)
    }

    fn append_record(
        &self,
        duration: Duration,
        energy_kwh: f64,
        emissions_kg: f64,
    ) -> Result<(), TrackerError> {
        let path = self.output_path();
        let write_header = !path.exists();

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if write_header {
            file.write_all(CSV_HEADER.as_bytes())?;
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        writeln!(
            file,
            "{},{:.3},{:.9},{:.9}",
            timestamp,
            duration.as_secs_f64(),
            energy_kwh,
            emissions_kg
        )?;
        Ok(())
    }
}

/// Energy consumed over `duration` under the constant-power model, in kWh.
fn estimate_energy_kwh(duration: Duration) -> f64 {
    let hours = duration.as_secs_f64() / 3600.0;
    AVG_POWER_WATTS * hours / 1000.0
}

/// Read back the emissions column of a CSV written by a tracker.
///
/// Used by the CLI to summarize past sessions; absent files read as empty.
pub fn read_emissions(path: &Path) -> Result<Vec<f64>, TrackerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .skip(1)
        .filter_map(|line| line.rsplit(',').next())
        .filter_map(|field| field.parse::<f64>().ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let tracker = EmissionsTracker::new(TrackerConfig::new(&nested)).unwrap();
        assert!(nested.is_dir());
        assert_eq!(tracker.output_path(), nested.join(OUTPUT_EMISSIONS_FILE));
    }

    #[test]
    fn tracker_rejects_file_as_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let err = EmissionsTracker::new(TrackerConfig::new(&file)).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidOutputDir(_)));
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = EmissionsTracker::new(TrackerConfig::new(dir.path())).unwrap();
        assert!(!tracker.is_running());
        assert!(matches!(tracker.stop(), Err(TrackerError::NotRunning)));
    }

    #[test]
    fn session_lifecycle_appends_csv_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = EmissionsTracker::new(TrackerConfig::new(dir.path())).unwrap();

        tracker.start();
        assert!(tracker.is_running());
        let first = tracker.stop().unwrap();
        assert!(!tracker.is_running());
        assert!(first >= 0.0);

        // The same tracker can run a second session.
        tracker.start();
        let second = tracker.stop().unwrap();
        assert!(second >= 0.0);

        let content = std::fs::read_to_string(tracker.output_path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3, "header plus one record per session");
        assert_eq!(lines[0], CSV_HEADER.trim_end());
    }

    #[test]
    fn read_emissions_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = EmissionsTracker::new(TrackerConfig::new(dir.path())).unwrap();
        tracker.start();
        tracker.stop().unwrap();

        let values = read_emissions(&tracker.output_path()).unwrap();
        assert_eq!(values.len(), 1);
        assert!(values[0] >= 0.0);
    }

    #[test]
    fn read_emissions_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let values = read_emissions(&dir.path().join("missing.csv")).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn energy_model_scales_with_duration() {
        let one_hour = estimate_energy_kwh(Duration::from_secs(3600));
        assert!((one_hour - AVG_POWER_WATTS / 1000.0).abs() < 1e-12);
        assert_eq!(estimate_energy_kwh(Duration::ZERO), 0.0);
    }
}
