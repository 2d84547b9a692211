//! Error types for the pitch analysis engine

use std::fmt;

/// Errors and numeric edge conditions raised by the analysis stages.
///
/// Only the construction errors (`InvalidNoteName`, `InvalidFrequency`,
/// `InvalidInput`) are ever returned as `Err`. The remaining variants describe
/// degenerate numeric cases which the stages absorb by falling back to zero;
/// they are collected as diagnostics on the stage outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum PitchError {
    /// Pitch-class name missing from both the canonical and alternate tables
    InvalidNoteName(String),

    /// Frequency that cannot be mapped onto the note scale
    InvalidFrequency(f64),

    /// Invalid input parameters
    InvalidInput(String),

    /// A note bucket whose lower and upper edges coincide
    DegenerateBucketWidth {
        /// Grid index of the affected bucket
        note: usize,
        /// Lower edge frequency in Hz
        low: f64,
        /// Upper edge frequency in Hz
        high: f64,
    },

    /// An octave window summing to zero energy
    ZeroOctaveWindow {
        /// Position in the energy vector
        index: usize,
    },

    /// A bucket needed a bin past the end of the one-sided spectrum
    SpectrumExhausted {
        /// First bin that was out of range
        bin: usize,
        /// Number of usable bins
        available: usize,
    },
}

impl fmt::Display for PitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PitchError::InvalidNoteName(name) => write!(f, "Note name {} is not valid", name),
            PitchError::InvalidFrequency(freq) => write!(f, "Invalid frequency: {} Hz", freq),
            PitchError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PitchError::DegenerateBucketWidth { note, low, high } => write!(
                f,
                "Degenerate bucket width at note {}: edges {:.3} Hz and {:.3} Hz",
                note, low, high
            ),
            PitchError::ZeroOctaveWindow { index } => {
                write!(f, "Octave window around index {} has zero energy", index)
            }
            PitchError::SpectrumExhausted { bin, available } => write!(
                f,
                "Spectrum exhausted: bin {} requested but only {} bins available",
                bin, available
            ),
        }
    }
}

impl std::error::Error for PitchError {}
