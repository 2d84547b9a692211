//! Integration tests for the pitch analysis pipeline

use pitch_core::bucket::{BucketStrategy, bucket_spectrum};
use pitch_core::note::{NOTE_NAMES, Note};
use pitch_core::octave::normalize_octaves;
use pitch_core::peaks::{LocalMaxima, PeakFinder, extract_peaks};
use pitch_core::range::note_range;
use pitch_core::{AnalysisConfig, NoteGrid, analyze_signal, analyze_signal_with, fft};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Harmonic tone: fundamental plus decaying overtones.
fn harmonic_tone(fundamental: f64, harmonics: usize, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (1..=harmonics)
                .map(|h| {
                    let amplitude = 1.0 / h as f64;
                    amplitude * (2.0 * std::f64::consts::PI * fundamental * h as f64 * t).cos()
                })
                .sum::<f64>() as f32
        })
        .collect()
}

#[test]
fn test_grid_notes_round_trip_through_frequency() {
    init_logging();
    for note in NoteGrid::A0_TO_C10.notes(440.0) {
        let back = Note::from_frequency(note.frequency(), 440.0).unwrap();
        assert_eq!(back.name(), note.name());
        assert_eq!(back.octave(), note.octave());
        assert!(back.cents().abs() < 1e-9, "{} came back as {}", note, back);
    }
}

#[test]
fn test_note_range_covers_every_pitch_class() {
    let start: Note = "C3".parse().unwrap();
    let end: Note = "C4".parse().unwrap();
    let notes = note_range(440.0, &start, &end);
    assert_eq!(notes.len(), 12);
    let mut names: Vec<&str> = notes.iter().map(|n| n.name()).collect();
    names.sort_unstable();
    let mut expected = NOTE_NAMES.to_vec();
    expected.sort_unstable();
    assert_eq!(names, expected);
}

#[test]
fn test_harmonic_tone_analysis() {
    init_logging();
    let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
    config.sample_rate = 16000;
    config.peak_threshold = 0.3;
    // 220 Hz fundamental with harmonics at 440, 660, 880
    let samples = harmonic_tone(220.0, 4, 16000, 16000);

    let result = analyze_signal(&samples, &config).unwrap();
    let bins: Vec<usize> = result.peaks.iter().map(|p| p.bin).collect();
    assert_eq!(bins, vec![220, 440, 660]);

    let summary = result.summary.unwrap();
    assert_eq!(summary.fundamental.note.to_string(), "A3");
    assert_eq!(summary.modal_tone, "A");

    // Bucket energy is concentrated on the harmonics
    let a3 = result.notes.iter().position(|n| n.to_string() == "A3").unwrap();
    assert!(result.energies[a3] > result.energies[a3 - 1]);
    assert!(result.energies[a3] > result.energies[a3 + 1]);
    assert!(result.ratios[a3] > 1.0 / 13.0);
}

#[test]
fn test_strategies_agree_on_loudest_note() {
    init_logging();
    let samples = harmonic_tone(440.0, 1, 8000, 8000);
    let spectrum = fft::perform_fft(&samples, false);
    let magnitudes = fft::spectrum_to_magnitudes(&spectrum);

    for strategy in [BucketStrategy::WeightedWindow, BucketStrategy::Interpolated] {
        let buckets =
            bucket_spectrum(&magnitudes, 8000, 8000.0, &NoteGrid::C0_TO_C10, 440.0, strategy)
                .unwrap();
        let loudest = buckets
            .energies
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(buckets.notes[loudest].to_string(), "A4", "{:?}", strategy);
    }
}

#[test]
fn test_real_part_spectrum_buckets_cosine() {
    let samples = harmonic_tone(440.0, 1, 8000, 8000);
    let real = fft::real_spectrum(&fft::perform_fft(&samples, false));
    assert_eq!(real.len(), 8000);

    let buckets = bucket_spectrum(
        &real,
        8000,
        8000.0,
        &NoteGrid::A0_TO_F9,
        440.0,
        BucketStrategy::WeightedWindow,
    )
    .unwrap();
    assert_eq!(buckets.energies.len(), 116);
    assert!(buckets.energies.iter().all(|&e| e >= 0.0));
}

#[test]
fn test_octave_normalization_of_bucket_energies() {
    let samples = harmonic_tone(261.63, 3, 8000, 8000);
    let magnitudes = fft::spectrum_to_magnitudes(&fft::perform_fft(&samples, false));
    let buckets = bucket_spectrum(
        &magnitudes,
        8000,
        8000.0,
        &NoteGrid::A0_TO_C10,
        440.0,
        BucketStrategy::WeightedWindow,
    )
    .unwrap();

    let normalized = normalize_octaves(&buckets.energies);
    assert_eq!(normalized.ratios.len(), buckets.energies.len());
    assert!(normalized.ratios.iter().all(|&r| (0.0..=1.0).contains(&r)));
    assert!(normalized.window_totals.iter().all(|&t| t >= 0.0));
}

struct StrongestOnly;

impl PeakFinder for StrongestOnly {
    fn find_peaks(&self, signal: &[f64], threshold: f64, min_distance: usize) -> Vec<usize> {
        let mut peaks = LocalMaxima.find_peaks(signal, threshold, min_distance);
        peaks.sort_by(|&a, &b| signal[b].partial_cmp(&signal[a]).unwrap());
        peaks.truncate(1);
        peaks
    }
}

#[test]
fn test_custom_peak_finder() {
    let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
    config.sample_rate = 16000;
    config.peak_threshold = 0.3;
    let samples = harmonic_tone(220.0, 4, 16000, 16000);

    let result = analyze_signal_with(&samples, &config, &StrongestOnly).unwrap();
    assert_eq!(result.peaks.len(), 1);
    assert_eq!(result.peaks[0].note.to_string(), "A3");
}

#[test]
fn test_peaks_from_normalized_spectrum() {
    let samples = harmonic_tone(330.0, 1, 8000, 8000);
    let mut magnitudes = fft::spectrum_to_magnitudes(&fft::perform_fft(&samples, true));
    fft::normalize_max(&mut magnitudes);

    let peaks = extract_peaks(&magnitudes, 8000, 8000.0, 440.0, 0.55, 5, &LocalMaxima).unwrap();
    assert_eq!(peaks.len(), 1);
    assert_eq!(peaks[0].magnitude, 1.0);
    let expected = Note::from_frequency(330.0, 440.0).unwrap();
    assert_eq!(peaks[0].note, expected);
}

#[test]
fn test_config_from_json_drives_analysis() {
    init_logging();
    let config = AnalysisConfig::from_json(
        r#"{"grid": {"start": "C0", "end": "C10"}, "sample_rate": 8000, "strategy": "interpolated"}"#,
    )
    .unwrap();
    let samples = harmonic_tone(440.0, 1, 8000, 8000);
    let result = analyze_signal(&samples, &config).unwrap();
    assert_eq!(result.notes.len(), 120);
    assert_eq!(result.notes[0].to_string(), "C0");

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["summary"]["modal_tone"], "A");
    assert_eq!(json["energies"].as_array().unwrap().len(), 120);
}

#[test]
fn test_tuning_shifts_note_labels() {
    let mut config = AnalysisConfig::new(NoteGrid::A0_TO_C10);
    config.sample_rate = 8000;
    config.tuning = 432.0;
    let samples = harmonic_tone(432.0, 1, 8000, 8000);

    let result = analyze_signal(&samples, &config).unwrap();
    let summary = result.summary.unwrap();
    assert_eq!(summary.fundamental.note.to_string(), "A4");
    assert_eq!(summary.fundamental.note.tuning(), 432.0);
    assert!(result.notes.iter().all(|n| n.tuning() == 432.0));
}
