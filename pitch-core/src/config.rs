//! Configuration parameters for pitch analysis

use serde::{Deserialize, Serialize};

use crate::bucket::BucketStrategy;
use crate::error::PitchError;
use crate::note::DEFAULT_TUNING;
use crate::range::NoteGrid;

/// Largest note grid accepted by [`AnalysisConfig::validate`].
pub const MAX_GRID_NOTES: usize = 4096;

/// Analysis configuration parameters
///
/// The note grid has no default and must be chosen by the caller; every
/// other field can be left at its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Frequency of A4 in Hz (default: 440.0)
    #[serde(default = "default_tuning")]
    pub tuning: f64,

    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Peak threshold relative to the normalised spectrum maximum (default: 0.55)
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f64,

    /// Minimum separation between peaks, in FFT bins (default: 5)
    #[serde(default = "default_min_peak_distance")]
    pub min_peak_distance: usize,

    /// Notes to bucket spectral energy into
    pub grid: NoteGrid,

    /// Bucketing strategy (default: weighted window)
    #[serde(default)]
    pub strategy: BucketStrategy,

    /// Remove the DC offset and apply a Hann window before the FFT (default: false)
    #[serde(default)]
    pub windowed: bool,
}

fn default_tuning() -> f64 {
    DEFAULT_TUNING
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_peak_threshold() -> f64 {
    0.55
}

fn default_min_peak_distance() -> usize {
    5
}

impl AnalysisConfig {
    /// Default parameters over the given note grid.
    pub fn new(grid: NoteGrid) -> Self {
        Self {
            tuning: default_tuning(),
            sample_rate: default_sample_rate(),
            peak_threshold: default_peak_threshold(),
            min_peak_distance: default_min_peak_distance(),
            grid,
            strategy: BucketStrategy::default(),
            windowed: false,
        }
    }

    /// Loads a configuration from JSON. Grid endpoints are note names.
    ///
    /// ```
    /// use pitch_core::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::from_json(
    ///     r#"{"grid": {"start": "A0", "end": "C10"}, "tuning": 442.0}"#,
    /// ).unwrap();
    /// assert_eq!(config.tuning, 442.0);
    /// assert_eq!(config.sample_rate, 44100);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, PitchError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PitchError::InvalidInput(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every parameter is usable.
    pub fn validate(&self) -> Result<(), PitchError> {
        if !(self.tuning > 0.0) || !self.tuning.is_finite() {
            return Err(PitchError::InvalidInput(format!(
                "tuning must be a positive frequency, got {}",
                self.tuning
            )));
        }
        if self.sample_rate == 0 {
            return Err(PitchError::InvalidInput("Invalid sample rate".to_string()));
        }
        if !(0.0..=1.0).contains(&self.peak_threshold) {
            return Err(PitchError::InvalidInput(format!(
                "peak threshold must be within [0, 1], got {}",
                self.peak_threshold
            )));
        }
        if !self.grid.start.value().is_finite() || !self.grid.end.value().is_finite() {
            return Err(PitchError::InvalidInput("note grid endpoints must be finite".to_string()));
        }
        if self.grid.len() > MAX_GRID_NOTES {
            return Err(PitchError::InvalidInput(format!(
                "note grid {} to {} has {} notes, at most {} allowed",
                self.grid.start,
                self.grid.end,
                self.grid.len(),
                MAX_GRID_NOTES
            )));
        }
        if self.grid.is_empty() {
            return Err(PitchError::InvalidInput(format!(
                "note grid {} to {} is empty",
                self.grid.start, self.grid.end
            )));
        }
        Ok(())
    }
}
