//! # Analysis Pipeline
//!
//! Runs the stages end to end: FFT, note bucketing, peak extraction and octave
//! normalisation, followed by the fundamental / modal tone summary.
//! Independent windows can be analysed in parallel with [`analyze_windows`].

use anyhow::{Context, Result, anyhow};
use std::thread;

use crate::bucket::bucket_spectrum;
use crate::config::AnalysisConfig;
use crate::error::PitchError;
use crate::fft;
use crate::octave::normalize_octaves;
use crate::peaks::{LocalMaxima, PeakFinder, PeakSummary, extract_peaks};
use crate::AnalysisResult;

/// Analyses one signal with the default [`LocalMaxima`] peak finder.
///
/// # Arguments
/// * `samples` - Mono time-domain samples
/// * `config` - Analysis parameters
///
/// # Errors
/// Fails on an invalid configuration or an empty signal.
pub fn analyze_signal(samples: &[f32], config: &AnalysisConfig) -> Result<AnalysisResult> {
    analyze_signal_with(samples, config, &LocalMaxima)
}

/// Analyses one signal with a caller-supplied peak finder.
pub fn analyze_signal_with(
    samples: &[f32],
    config: &AnalysisConfig,
    finder: &dyn PeakFinder,
) -> Result<AnalysisResult> {
    config.validate().context("invalid analysis configuration")?;
    if samples.is_empty() {
        return Err(PitchError::InvalidInput("Empty audio samples".to_string()).into());
    }

    let signal_len = samples.len();
    let sample_rate = config.sample_rate as f64;
    log::debug!(
        "Starting pitch analysis: {} samples at {} Hz",
        signal_len,
        config.sample_rate
    );

    let spectrum = fft::perform_fft(samples, config.windowed);
    let mut magnitudes = fft::spectrum_to_magnitudes(&spectrum);

    let buckets = bucket_spectrum(
        &magnitudes,
        signal_len,
        sample_rate,
        &config.grid,
        config.tuning,
        config.strategy,
    )
    .context("bucketing spectrum into notes")?;

    fft::normalize_max(&mut magnitudes);
    let peaks = extract_peaks(
        &magnitudes,
        signal_len,
        sample_rate,
        config.tuning,
        config.peak_threshold,
        config.min_peak_distance,
        finder,
    )
    .context("extracting spectral peaks")?;

    let octaves = normalize_octaves(&buckets.energies);
    let summary = PeakSummary::from_peaks(&peaks);

    match &summary {
        Some(summary) => log::info!(
            "f_0 is {} and modal tone is {} ({} peaks)",
            summary.fundamental.note,
            summary.modal_tone,
            peaks.len()
        ),
        None => log::info!("No spectral peaks found"),
    }

    let mut diagnostics = buckets.diagnostics;
    diagnostics.extend(octaves.diagnostics);

    Ok(AnalysisResult {
        notes: buckets.notes,
        energies: buckets.energies,
        ratios: octaves.ratios,
        window_totals: octaves.window_totals,
        peaks,
        summary,
        duration_seconds: signal_len as f64 / sample_rate,
        diagnostics,
    })
}

/// Analyses independent windows on `workers` threads.
///
/// Workers take windows from a shared job channel and send results back on a
/// second channel. Results are returned in input order; if any window fails,
/// the error of the earliest failing window is returned.
pub fn analyze_windows(
    windows: &[Vec<f32>],
    config: &AnalysisConfig,
    workers: usize,
) -> Result<Vec<AnalysisResult>> {
    if windows.is_empty() {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, windows.len());
    log::debug!("Analysing {} windows on {} workers", windows.len(), workers);

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, &[f32])>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Result<AnalysisResult>)>();

    for (index, window) in windows.iter().enumerate() {
        job_tx
            .send((index, window.as_slice()))
            .map_err(|_| anyhow!("job queue closed before window {} was queued", index))?;
    }
    drop(job_tx);

    thread::scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (index, window) in job_rx.iter() {
                    let result = analyze_signal(window, config)
                        .with_context(|| format!("analysing window {}", index));
                    if result_tx.send((index, result)).is_err() {
                        log::warn!("[WORKER {}] Result channel closed", worker);
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<Result<AnalysisResult>>> = windows.iter().map(|_| None).collect();
    for (index, result) in result_rx.iter() {
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| Err(anyhow!("window {} was never analysed", index))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketStrategy;
    use crate::range::NoteGrid;

    fn tone(freqs: &[f64], sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                freqs
                    .iter()
                    .map(|f| (2.0 * std::f64::consts::PI * f * t).sin())
                    .sum::<f64>() as f32
            })
            .collect()
    }

    #[test]
    fn test_pure_tone_end_to_end() {
        let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        config.sample_rate = 8000;
        let samples = tone(&[440.0], 8000, 8000);

        let result = analyze_signal(&samples, &config).unwrap();
        assert_eq!(result.energies.len(), 123);
        assert_eq!(result.ratios.len(), 123);
        assert_eq!(result.duration_seconds, 1.0);

        let summary = result.summary.unwrap();
        assert_eq!(summary.fundamental.note.to_string(), "A4");
        assert_eq!(summary.modal_tone, "A");

        // Grid runs past Nyquist, so the top buckets are left empty
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| matches!(d, PitchError::SpectrumExhausted { .. }))
        );
    }

    #[test]
    fn test_interpolated_strategy_end_to_end() {
        let mut config = AnalysisConfig::new(NoteGrid::C0_TO_C10);
        config.sample_rate = 8000;
        config.strategy = BucketStrategy::Interpolated;
        let samples = tone(&[261.6255653], 8000, 8000);

        let result = analyze_signal(&samples, &config).unwrap();
        let loudest = result
            .energies
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(result.notes[loudest].to_string(), "C4");
    }

    #[test]
    fn test_empty_signal_rejected() {
        let config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        let err = analyze_signal(&[], &config).unwrap_err();
        assert!(err.to_string().contains("Empty audio samples"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        config.sample_rate = 0;
        let err = analyze_signal(&[0.0; 16], &config).unwrap_err();
        assert!(err.to_string().contains("invalid analysis configuration"));
        assert!(err.downcast_ref::<PitchError>().is_some());
    }

    #[test]
    fn test_silence_has_no_peaks() {
        let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        config.sample_rate = 8000;
        let result = analyze_signal(&vec![0.0; 8000], &config).unwrap();
        assert!(result.peaks.is_empty());
        assert!(result.summary.is_none());
        assert!(result.ratios.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_windows_keep_order() {
        let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        config.sample_rate = 8000;
        let freqs = [220.0, 440.0, 880.0, 330.0, 660.0];
        let windows: Vec<Vec<f32>> = freqs.iter().map(|&f| tone(&[f], 8000, 4000)).collect();

        let results = analyze_windows(&windows, &config, 3).unwrap();
        assert_eq!(results.len(), freqs.len());
        for (result, &freq) in results.iter().zip(&freqs) {
            let fundamental = result.summary.unwrap().fundamental;
            assert!((fundamental.frequency - freq).abs() < 2.0 + 1e-9);
        }
    }

    #[test]
    fn test_windows_report_earliest_failure() {
        let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        config.sample_rate = 8000;
        let windows = vec![tone(&[440.0], 8000, 800), vec![], vec![]];
        let err = analyze_windows(&windows, &config, 2).unwrap_err();
        assert!(format!("{:#}", err).contains("window 1"));
    }

    #[test]
    fn test_windows_empty() {
        let config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
        assert!(analyze_windows(&[], &config, 4).unwrap().is_empty());
    }
}
