//! # Octave Normalizer
//!
//! Expresses each note's energy as its share of the energy in the surrounding
//! one-octave window (the note plus six semitones either side).

use serde::{Deserialize, Serialize};

use crate::error::PitchError;

/// Notes on each side of the centre in an octave window.
pub const HALF_WINDOW: usize = 6;

/// Width of the octave window in notes.
pub const WINDOW: usize = 2 * HALF_WINDOW + 1;

/// Energy ratios relative to each note's octave window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OctaveNormalization {
    /// Energy divided by the window total, 0 where the total is 0
    pub ratios: Vec<f64>,
    /// Edge-corrected window totals
    pub window_totals: Vec<f64>,
    /// Positions whose window summed to zero
    #[serde(skip)]
    pub diagnostics: Vec<PitchError>,
}

/// Number of real samples under a window centred at `index`.
fn contributors(index: usize, len: usize) -> usize {
    index.min(HALF_WINDOW) + (len - 1 - index).min(HALF_WINDOW) + 1
}

/// Normalises per-note energies against their octave windows.
///
/// Window totals are box sums over up to [`WINDOW`] notes, rescaled by
/// `WINDOW / contributors` so that windows truncated at either end of the
/// vector count as full windows.
///
/// ```
/// use pitch_core::octave::normalize_octaves;
///
/// let normalized = normalize_octaves(&[2.0; 20]);
/// assert!((normalized.window_totals[0] - 26.0).abs() < 1e-9);
/// assert!((normalized.ratios[10] - 1.0 / 13.0).abs() < 1e-9);
/// ```
pub fn normalize_octaves(energies: &[f64]) -> OctaveNormalization {
    let len = energies.len();
    log::debug!("Normalising {} note energies over {}-note windows", len, WINDOW);

    let mut result = OctaveNormalization {
        ratios: vec![0.0; len],
        window_totals: vec![0.0; len],
        diagnostics: Vec::new(),
    };

    for i in 0..len {
        let lo = i.saturating_sub(HALF_WINDOW);
        let hi = (i + HALF_WINDOW + 1).min(len);
        let raw: f64 = energies[lo..hi].iter().sum();
        let total = raw * (WINDOW as f64 / contributors(i, len) as f64);
        result.window_totals[i] = total;

        if total == 0.0 {
            result.diagnostics.push(PitchError::ZeroOctaveWindow { index: i });
        } else {
            result.ratios[i] = energies[i] / total;
        }
    }

    if !result.diagnostics.is_empty() {
        log::debug!("{} octave windows had zero energy", result.diagnostics.len());
    }

    result
}
