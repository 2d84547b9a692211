//! # Note Model
//!
//! This module represents a musical pitch as a continuous value: the distance in
//! semitones from A0. Integer values are equal-tempered notes, the fractional part
//! is the "cents" deviation (in fractions of a semitone).
//!
//! ## Features
//! - Conversion between (name, octave, cents), value and frequency
//! - Sharp and flat spellings accepted, canonical spelling used internally
//! - Adjustable reference tuning for A4
//! - Textual form such as `A4`, `C#4+0.25`, parsed back with `FromStr`

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PitchError;

/// Canonical pitch-class names, starting at A so that A0 has value 0.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "Bb", "B", "C", "C#", "D", "Eb", "E", "F", "F#", "G", "G#",
];

/// Default reference frequency of A4 in Hz.
pub const DEFAULT_TUNING: f64 = 440.0;

/// Value of the reference note A4 under the A0 = 0 numbering.
pub const A4_VALUE: f64 = 48.0;

/// Alternate spellings mapped to their canonical counterpart in [`NOTE_NAMES`].
static ALTERNATE_NOTE_NAMES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("A#", "Bb"),
        ("Db", "C#"),
        ("D#", "Eb"),
        ("Gb", "F#"),
        ("Ab", "G#"),
    ])
});

/// Returns the canonical spelling of a pitch-class name.
///
/// `"A#"` and `"Bb"` both give `"Bb"`. Canonical names are returned unchanged,
/// so the function is idempotent.
///
/// # Errors
/// * `InvalidNoteName` - the name is in neither table
pub fn standard_name(name: &str) -> Result<&'static str, PitchError> {
    if let Some(canonical) = NOTE_NAMES.iter().find(|&&n| n == name) {
        return Ok(*canonical);
    }
    ALTERNATE_NOTE_NAMES
        .get(name)
        .copied()
        .ok_or_else(|| PitchError::InvalidNoteName(name.to_string()))
}

/// Converts a name, octave and cents offset to a note value, where A0 is 0,
/// Bb0 is 1, and so on.
pub fn note_to_value(name: &str, octave: i32, cents: f64) -> Result<f64, PitchError> {
    let name = standard_name(name)?;
    let name_val = NOTE_NAMES
        .iter()
        .position(|&n| n == name)
        .ok_or_else(|| PitchError::InvalidNoteName(name.to_string()))?;
    let overflow = || PitchError::InvalidInput(format!("octave {} is out of range", octave));
    let value = octave
        .checked_mul(NOTE_NAMES.len() as i32)
        .and_then(|v| v.checked_add(name_val as i32))
        .ok_or_else(overflow)?;

    Ok(value as f64 + cents)
}

/// The ways a [`Note`] can be specified. Resolved once by [`Note::from_spec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteSpec<'a> {
    /// Pitch-class name (either spelling), octave and semitone offset
    ByPitch {
        name: &'a str,
        octave: i32,
        cents: f64,
    },
    /// Raw value, semitones above A0
    ByValue { value: f64 },
    /// Frequency in Hz, interpreted against the tuning passed to
    /// [`Note::from_spec`]
    ByFrequency { frequency: f64 },
}

/// A single pitch.
///
/// Only `value` and `tuning` are stored; name, octave, cents and frequency are
/// derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    value: f64,
    tuning: f64,
}

impl Note {
    /// Creates a note from a pitch-class name, octave and cents offset, tuned to A4 = 440 Hz.
    ///
    /// ```
    /// use pitch_core::note::Note;
    ///
    /// let c4 = Note::new("C", 4, 0.0).unwrap();
    /// assert_eq!(c4.value(), 51.0);
    /// ```
    pub fn new(name: &str, octave: i32, cents: f64) -> Result<Self, PitchError> {
        Ok(Self::from_value(note_to_value(name, octave, cents)?))
    }

    /// Creates a note directly from its value, tuned to A4 = 440 Hz.
    pub const fn from_value(value: f64) -> Self {
        Self {
            value,
            tuning: DEFAULT_TUNING,
        }
    }

    /// Creates the note closest to `frequency` under the given tuning.
    ///
    /// The value is rounded to hundredths of a semitone, so converting back
    /// with [`Note::frequency`] is accurate to within half a cent.
    ///
    /// # Errors
    /// * `InvalidFrequency` - the frequency is not finite and positive
    pub fn from_frequency(frequency: f64, tuning: f64) -> Result<Self, PitchError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(PitchError::InvalidFrequency(frequency));
        }
        if !tuning.is_finite() || tuning <= 0.0 {
            return Err(PitchError::InvalidFrequency(tuning));
        }
        let exact = A4_VALUE + 12.0 * (frequency / tuning).log2();
        Ok(Self {
            value: (exact * 100.0).round_ties_even() / 100.0,
            tuning,
        })
    }

    /// Resolves any [`NoteSpec`] into a note with the given tuning.
    ///
    /// # Errors
    /// * `InvalidFrequency` - the tuning is not finite and positive
    pub fn from_spec(spec: NoteSpec<'_>, tuning: f64) -> Result<Self, PitchError> {
        if !tuning.is_finite() || tuning <= 0.0 {
            return Err(PitchError::InvalidFrequency(tuning));
        }
        match spec {
            NoteSpec::ByValue { value } => Ok(Self::from_value(value).with_tuning(tuning)),
            NoteSpec::ByFrequency { frequency } => Self::from_frequency(frequency, tuning),
            NoteSpec::ByPitch { name, octave, cents } => {
                Ok(Self::new(name, octave, cents)?.with_tuning(tuning))
            }
        }
    }

    /// The same note under a different A4 reference.
    pub fn with_tuning(self, tuning: f64) -> Self {
        Self { tuning, ..self }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn tuning(&self) -> f64 {
        self.tuning
    }

    /// Nearest equal-tempered value (ties to even).
    fn nearest(&self) -> i64 {
        self.value.round_ties_even() as i64
    }

    /// Canonical pitch-class name of the nearest equal-tempered note.
    pub fn name(&self) -> &'static str {
        NOTE_NAMES[self.nearest().rem_euclid(NOTE_NAMES.len() as i64) as usize]
    }

    /// Octave of the nearest equal-tempered note. Octaves start at A.
    pub fn octave(&self) -> i32 {
        self.nearest().div_euclid(NOTE_NAMES.len() as i64) as i32
    }

    /// Deviation from the nearest equal-tempered note, in semitones.
    pub fn cents(&self) -> f64 {
        self.value - self.nearest() as f64
    }

    /// Frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.tuning * 2.0_f64.powf((self.value - A4_VALUE) / 12.0)
    }

    /// Moves the note by `semitones` and returns the new value.
    pub fn shift(&mut self, semitones: f64) -> f64 {
        self.value += semitones;
        self.value
    }

    /// Signed distance from `other` in semitones.
    pub fn semitones_from(&self, other: &Note) -> f64 {
        self.value - other.value
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave())?;
        let cents = self.cents();
        if cents != 0.0 {
            write!(f, "{:+.2}", cents)?;
        }
        Ok(())
    }
}

impl FromStr for Note {
    type Err = PitchError;

    /// Parses `<letter>[#|b]<octave>[±cents]`, e.g. `A4`, `Db3`, `G#-1`, `C4+0.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PitchError::InvalidNoteName(s.to_string());

        let first = s.chars().next().ok_or_else(invalid)?;
        if !first.is_ascii_uppercase() {
            return Err(invalid());
        }
        let split = if s[1..].starts_with('#') || s[1..].starts_with('b') {
            2
        } else {
            1
        };
        let name = standard_name(&s[..split]).map_err(|_| invalid())?;

        let rest = &s[split..];
        let digits_start = usize::from(rest.starts_with('-'));
        let digits = rest[digits_start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits == 0 {
            return Err(PitchError::InvalidInput(format!("missing octave in {:?}", s)));
        }
        let octave_end = digits_start + digits;
        let octave: i32 = rest[..octave_end]
            .parse()
            .map_err(|_| PitchError::InvalidInput(format!("bad octave in {:?}", s)))?;

        let cents_str = &rest[octave_end..];
        let cents = if cents_str.is_empty() {
            0.0
        } else if cents_str.starts_with('+') || cents_str.starts_with('-') {
            cents_str
                .parse::<f64>()
                .map_err(|_| PitchError::InvalidInput(format!("bad cents in {:?}", s)))?
        } else {
            return Err(PitchError::InvalidInput(format!("unexpected suffix in {:?}", s)));
        };

        Note::new(name, octave, cents)
    }
}
