//! # Peak Extraction Module
//!
//! Finds the salient peaks of a one-sided magnitude spectrum and labels each
//! with the nearest note, independently of the note bucket grid.
//!
//! ## Features
//! - [`PeakFinder`] seam for any 1-D peak detector
//! - [`LocalMaxima`], a relative-threshold detector with minimum peak spacing
//! - [`PeakSummary`] of the fundamental and modal tone

use serde::{Deserialize, Serialize};

use crate::error::PitchError;
use crate::note::Note;

/// A 1-D peak detector.
pub trait PeakFinder {
    /// Returns peak indices of `signal` in ascending order.
    ///
    /// # Arguments
    /// * `signal` - Values to search
    /// * `threshold` - Minimum height relative to the signal range (0.0-1.0)
    /// * `min_distance` - Minimum index separation between reported peaks
    fn find_peaks(&self, signal: &[f64], threshold: f64, min_distance: usize) -> Vec<usize>;
}

/// Local-maximum peak detection.
///
/// A peak is a sample (or the middle of a flat run) strictly higher than its
/// left neighbour and strictly higher than the sample following the run, that
/// also lies strictly above `min + threshold * (max - min)`. When peaks are
/// closer than `min_distance`, the tallest is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMaxima;

impl PeakFinder for LocalMaxima {
    fn find_peaks(&self, signal: &[f64], threshold: f64, min_distance: usize) -> Vec<usize> {
        let len = signal.len();
        if len < 3 {
            return vec![];
        }

        let min = signal.iter().copied().fold(f64::INFINITY, f64::min);
        let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(max > min) {
            return vec![];
        }
        let cutoff = min + threshold * (max - min);

        let mut peaks = Vec::new();
        let mut i = 1;
        while i < len - 1 {
            if signal[i] > signal[i - 1] {
                // Walk to the end of a plateau
                let mut j = i;
                while j + 1 < len && signal[j + 1] == signal[i] {
                    j += 1;
                }
                if j + 1 < len && signal[j + 1] < signal[i] && signal[i] > cutoff {
                    peaks.push((i + j) / 2);
                }
                i = j + 1;
            } else {
                i += 1;
            }
        }

        if min_distance > 0 && peaks.len() > 1 {
            let mut by_height = peaks.clone();
            by_height.sort_by(|&a, &b| {
                signal[b]
                    .partial_cmp(&signal[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut suppressed = vec![false; len];
            let mut kept = Vec::with_capacity(by_height.len());
            for peak in by_height {
                if suppressed[peak] {
                    continue;
                }
                kept.push(peak);
                let lo = peak.saturating_sub(min_distance);
                let hi = peak.saturating_add(min_distance).min(len - 1);
                suppressed[lo..=hi].iter_mut().for_each(|s| *s = true);
            }
            kept.sort_unstable();
            peaks = kept;
        }

        peaks
    }
}

/// A spectral peak labelled with its nearest note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    /// FFT bin index
    pub bin: usize,
    /// Bin centre frequency in Hz
    pub frequency: f64,
    /// Spectrum value at the bin
    pub magnitude: f64,
    /// Note built from `frequency`
    pub note: Note,
}

/// Finds the peaks of a one-sided spectrum and labels them with notes.
///
/// # Arguments
/// * `spectrum` - One-sided magnitude spectrum, normalised so its maximum is 1
/// * `signal_len` - Length N of the transformed signal
/// * `sample_rate` - Sampling rate in Hz
/// * `tuning` - Frequency of A4 in Hz
/// * `threshold` - Relative peak threshold handed to `finder`
/// * `min_distance` - Minimum bin separation handed to `finder`
/// * `finder` - Peak detector
///
/// # Returns
/// Peaks in ascending bin order. The DC bin and indices outside the spectrum
/// are skipped.
pub fn extract_peaks(
    spectrum: &[f64],
    signal_len: usize,
    sample_rate: f64,
    tuning: f64,
    threshold: f64,
    min_distance: usize,
    finder: &dyn PeakFinder,
) -> Result<Vec<SpectralPeak>, PitchError> {
    if signal_len == 0 {
        return Err(PitchError::InvalidInput("signal length must be positive".to_string()));
    }
    if !(sample_rate > 0.0) {
        return Err(PitchError::InvalidInput(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }

    let mut bins = finder.find_peaks(spectrum, threshold, min_distance);
    bins.sort_unstable();
    bins.dedup();
    log::debug!(
        "Peak finder returned {} peaks (threshold={:.2}, min_distance={})",
        bins.len(),
        threshold,
        min_distance
    );

    let mut peaks = Vec::with_capacity(bins.len());
    for bin in bins {
        if bin == 0 || bin >= spectrum.len() {
            log::debug!("Skipping peak at bin {}", bin);
            continue;
        }
        let frequency = bin as f64 * sample_rate / signal_len as f64;
        peaks.push(SpectralPeak {
            bin,
            frequency,
            magnitude: spectrum[bin],
            note: Note::from_frequency(frequency, tuning)?,
        });
    }
    Ok(peaks)
}

/// The usual reading of a peak list: the lowest peak is taken as the
/// fundamental, the most frequent pitch class as the modal tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakSummary {
    /// Lowest-frequency peak
    pub fundamental: SpectralPeak,
    /// Most frequent pitch-class name; ties go to the tone heard lowest
    pub modal_tone: &'static str,
}

impl PeakSummary {
    /// `None` when there are no peaks.
    pub fn from_peaks(peaks: &[SpectralPeak]) -> Option<Self> {
        let fundamental = *peaks.iter().min_by(|a, b| {
            a.frequency
                .partial_cmp(&b.frequency)
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        let mut ordered: Vec<&SpectralPeak> = peaks.iter().collect();
        ordered.sort_by_key(|p| p.bin);

        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for peak in ordered {
            let name = peak.note.name();
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }

        let mut modal = counts[0];
        for &(name, count) in &counts[1..] {
            if count > modal.1 {
                modal = (name, count);
            }
        }

        Some(Self {
            fundamental,
            modal_tone: modal.0,
        })
    }
}
