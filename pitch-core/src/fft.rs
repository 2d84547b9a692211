//! # Fast Fourier Transform (FFT) Module
//!
//! Prepares the spectra consumed by the bucketer and the peak extractor.
//! The transform itself is delegated to RustFFT; this module only shapes its
//! input and output.
//!
//! ## Features
//! - Forward FFT of arbitrary length using RustFFT
//! - Optional DC offset removal and Hann windowing
//! - Real-part and one-sided magnitude views of the spectrum
//! - Peak normalisation

use rustfft::{FftPlanner, num_complex::Complex};

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f64]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f64>() / len as f64;
    if avg.abs() > 1e-9 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window to the buffer to reduce spectral leakage.
fn apply_hann_window(buffer: &mut [f64]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f64;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Performs a forward FFT on a signal and returns the full complex spectrum
/// (same length as the signal).
///
/// # Arguments
/// * `signal` - Time-domain samples
/// * `windowed` - Remove the DC offset and apply a Hann window first
pub fn perform_fft(signal: &[f32], windowed: bool) -> Vec<Complex<f64>> {
    let mut processed: Vec<f64> = signal.iter().map(|&s| s as f64).collect();
    if windowed {
        remove_dc_offset(&mut processed);
        apply_hann_window(&mut processed);
    }

    let mut buffer: Vec<Complex<f64>> = processed
        .into_iter()
        .map(|sample| Complex { re: sample, im: 0.0 })
        .collect();
    if buffer.is_empty() {
        return buffer;
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer
}

/// Real part of each bin.
pub fn real_spectrum(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum.iter().map(|c| c.re).collect()
}

/// Magnitudes of the first half of the spectrum (up to the Nyquist frequency).
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum
        .iter()
        .take(spectrum.len() / 2)
        .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect()
}

/// Scales `values` so the largest becomes 1. Returns the original maximum.
///
/// Left untouched when the maximum is not positive.
pub fn normalize_max(values: &mut [f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 && max.is_finite() {
        for v in values.iter_mut() {
            *v /= max;
        }
    }
    max
}
