//! # Spectral Bucketer
//!
//! Redistributes the energy of a linear-frequency spectrum into one bucket per
//! note of a [`NoteGrid`]. Note spacing is logarithmic in frequency, so buckets
//! widen geometrically with pitch.
//!
//! Two strategies are available:
//! - [`BucketStrategy::WeightedWindow`] sums every bin between the bucket's
//!   edges, weighted by its distance in Hz from the note, and divides by the
//!   bucket width.
//! - [`BucketStrategy::Interpolated`] reads the spectrum at the note's exact
//!   fractional bin by linear interpolation between the two nearest bins.

use serde::{Deserialize, Serialize};

use crate::error::PitchError;
use crate::note::Note;
use crate::range::NoteGrid;

/// How spectral energy is assigned to note buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStrategy {
    /// Distance-weighted sum over the bucket's bin range, normalised by width
    #[default]
    WeightedWindow,
    /// Linear interpolation at the note's fractional bin
    Interpolated,
}

/// Per-note energies with their labels.
#[derive(Debug, Clone)]
pub struct NoteBuckets {
    /// Energy per bucket, parallel to `notes`
    pub energies: Vec<f64>,
    /// The note each bucket is centred on
    pub notes: Vec<Note>,
    /// Degenerate conditions met while filling (`SpectrumExhausted`,
    /// `DegenerateBucketWidth`); affected buckets are left at zero
    pub diagnostics: Vec<PitchError>,
}

/// Weight given to a bin at `f2` Hz when filling the bucket of a note at `f1` Hz.
///
/// Decays slowly with the linear distance in Hz and is 1 at zero distance.
pub fn similarity(f1: f64, f2: f64) -> f64 {
    1.0 / ((f1 - f2).abs() + 1.0).powf(1.0 / 12.0)
}

/// Buckets a spectrum onto the notes of `grid`.
///
/// # Arguments
/// * `spectrum` - Real part of the full FFT, or a one-sided magnitude spectrum
/// * `signal_len` - Length N of the transformed signal
/// * `sample_rate` - Sampling rate in Hz
/// * `grid` - Notes to bucket into
/// * `tuning` - Frequency of A4 in Hz
/// * `strategy` - Bucketing strategy
///
/// Only the one-sided part of the spectrum (bins up to N/2) is read. Once a
/// bucket needs a bin past it, that bucket and every higher one stay at zero.
///
/// # Errors
/// * `InvalidInput` - zero signal length or non-positive sample rate
/// * `InvalidFrequency` - the tuning is not finite and positive
pub fn bucket_spectrum(
    spectrum: &[f64],
    signal_len: usize,
    sample_rate: f64,
    grid: &NoteGrid,
    tuning: f64,
    strategy: BucketStrategy,
) -> Result<NoteBuckets, PitchError> {
    if signal_len == 0 {
        return Err(PitchError::InvalidInput("signal length must be positive".to_string()));
    }
    if !(sample_rate > 0.0) {
        return Err(PitchError::InvalidInput(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }

    if !tuning.is_finite() || tuning <= 0.0 {
        return Err(PitchError::InvalidFrequency(tuning));
    }

    let notes = grid.notes(tuning);
    let available = spectrum.len().min(signal_len / 2 + 1);
    let bins_per_hz = signal_len as f64 / sample_rate;

    log::debug!(
        "Bucketing {} bins ({} usable) into {} notes with {:?}",
        spectrum.len(),
        available,
        notes.len(),
        strategy
    );

    let mut buckets = NoteBuckets {
        energies: vec![0.0; notes.len()],
        notes,
        diagnostics: Vec::new(),
    };

    match strategy {
        BucketStrategy::WeightedWindow => {
            let edges = grid.edges(tuning);
            fill_weighted(&mut buckets, spectrum, &edges, available, bins_per_hz)
        }
        BucketStrategy::Interpolated => {
            fill_interpolated(&mut buckets, spectrum, available, bins_per_hz)
        }
    }

    Ok(buckets)
}

fn fill_weighted(
    buckets: &mut NoteBuckets,
    spectrum: &[f64],
    edges: &[f64],
    available: usize,
    bins_per_hz: f64,
) {
    for (i, note) in buckets.notes.iter().enumerate() {
        let (low, high) = (edges[i], edges[i + 1]);
        let first = (low * bins_per_hz).floor().max(0.0) as usize;
        let last = (high * bins_per_hz).ceil() as usize;

        if last >= available {
            log::debug!("Spectrum exhausted at {} (bin {} of {})", note, last, available);
            buckets
                .diagnostics
                .push(PitchError::SpectrumExhausted { bin: last, available });
            break;
        }

        let width = high - low;
        if !(width > 0.0) {
            let degenerate = PitchError::DegenerateBucketWidth { note: i, low, high };
            log::warn!("{}", degenerate);
            buckets.diagnostics.push(degenerate);
            continue;
        }

        let centre = note.frequency();
        let sum: f64 = (first..=last)
            .map(|k| spectrum[k].abs() * similarity(centre, k as f64 / bins_per_hz))
            .sum();
        buckets.energies[i] = sum / width;
    }
}

fn fill_interpolated(
    buckets: &mut NoteBuckets,
    spectrum: &[f64],
    available: usize,
    bins_per_hz: f64,
) {
    for (i, note) in buckets.notes.iter().enumerate() {
        let position = note.frequency() * bins_per_hz;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;

        if upper >= available {
            log::debug!("Spectrum exhausted at {} (bin {} of {})", note, upper, available);
            buckets
                .diagnostics
                .push(PitchError::SpectrumExhausted { bin: upper, available });
            break;
        }

        let frac = position - position.floor();
        buckets.energies[i] = spectrum[lower].abs() * (1.0 - frac) + spectrum[upper].abs() * frac;
    }
}
