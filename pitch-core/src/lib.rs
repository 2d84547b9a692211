// pitch-core/src/lib.rs

//! The core logic for estimating the musical pitch content of a recording.
//! This crate maps a spectrum onto musical notes, finds its salient peaks and
//! normalises note energies against their surrounding octave. It is completely
//! headless: reading audio files and plotting are left to the caller.
//!
//! ```
//! use pitch_core::{analyze_signal, AnalysisConfig, NoteGrid};
//!
//! let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
//! config.sample_rate = 8000;
//! let samples: Vec<f32> = (0..8000)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8000.0).sin())
//!     .collect();
//!
//! let result = analyze_signal(&samples, &config)?;
//! let summary = result.summary.unwrap();
//! assert_eq!(summary.fundamental.note.to_string(), "A4");
//! # Ok::<(), anyhow::Error>(())
//! ```

use serde::Serialize;

pub mod analysis;
pub mod bucket;
pub mod config;
pub mod error;
pub mod fft;
pub mod note;
pub mod octave;
pub mod peaks;
pub mod range;

pub use analysis::{analyze_signal, analyze_signal_with, analyze_windows};
pub use bucket::BucketStrategy;
pub use config::AnalysisConfig;
pub use error::PitchError;
pub use note::{Note, NoteSpec};
pub use peaks::{PeakSummary, SpectralPeak};
pub use range::NoteGrid;

/// Represents the result of analysing one signal.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// The note grid, one entry per bucket.
    pub notes: Vec<Note>,
    /// Spectral energy per note bucket.
    pub energies: Vec<f64>,
    /// Each bucket's share of its octave window.
    pub ratios: Vec<f64>,
    /// Edge-corrected octave window totals.
    pub window_totals: Vec<f64>,
    /// Spectral peaks in ascending frequency order.
    pub peaks: Vec<SpectralPeak>,
    /// Fundamental and modal tone, if any peak was found.
    pub summary: Option<PeakSummary>,
    /// Length of the analysed signal in seconds.
    pub duration_seconds: f64,
    /// Numeric edge cases absorbed along the way.
    #[serde(skip)]
    pub diagnostics: Vec<PitchError>,
}
