//! # Note Range Module
//!
//! Builds ordered runs of equal-tempered notes, and the grid of note buckets
//! the spectral bucketer fills.

use serde::{Deserialize, Serialize};

use crate::note::Note;

/// Returns the notes from `start` (inclusive) to `end` (exclusive) in steps of
/// one semitone, all sharing `tuning`.
///
/// Empty when `start.value() >= end.value()`.
///
/// # Example
/// ```
/// use pitch_core::note::Note;
/// use pitch_core::range::note_range;
///
/// let start = Note::new("C", 4, 0.0).unwrap();
/// let end = Note::new("C", 5, 0.0).unwrap();
/// assert_eq!(note_range(440.0, &start, &end).len(), 12);
/// ```
pub fn note_range(tuning: f64, start: &Note, end: &Note) -> Vec<Note> {
    let mut notes = Vec::new();
    let mut value = start.value();
    while value < end.value() {
        notes.push(Note::from_value(value).with_tuning(tuning));
        value += 1.0;
    }
    notes
}

/// Edge frequencies of the buckets centred on `note_range(tuning, start, end)`.
///
/// Edges sit half a semitone below each note, plus one more above the last
/// note, so there is always exactly one more edge than there are notes.
pub fn bucket_edges(tuning: f64, start: &Note, end: &Note) -> Vec<f64> {
    if start.value() >= end.value() {
        return Vec::new();
    }
    let mut past_end = *end;
    past_end.shift(1.0);

    note_range(tuning, start, &past_end)
        .into_iter()
        .take(note_range(tuning, start, end).len() + 1)
        .map(|mut edge| {
            edge.shift(-0.5);
            edge.frequency()
        })
        .collect()
}

/// The span of notes to bucket spectral energy into: `start` inclusive,
/// `end` exclusive.
///
/// Different spans have been used historically, so there is no default; pick
/// one of the presets or build your own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteGrid {
    #[serde(with = "note_name")]
    pub start: Note,
    #[serde(with = "note_name")]
    pub end: Note,
}

impl NoteGrid {
    /// A0 up to (not including) F9
    pub const A0_TO_F9: NoteGrid = NoteGrid::new(Note::from_value(0.0), Note::from_value(116.0));
    /// A0 up to (not including) C10
    pub const A0_TO_C10: NoteGrid = NoteGrid::new(Note::from_value(0.0), Note::from_value(123.0));
    /// C0 up to (not including) C10
    pub const C0_TO_C10: NoteGrid = NoteGrid::new(Note::from_value(3.0), Note::from_value(123.0));

    pub const fn new(start: Note, end: Note) -> Self {
        Self { start, end }
    }

    /// The bucket centre notes.
    pub fn notes(&self, tuning: f64) -> Vec<Note> {
        note_range(tuning, &self.start, &self.end)
    }

    /// The bucket edge frequencies, one more than [`NoteGrid::notes`].
    pub fn edges(&self, tuning: f64) -> Vec<f64> {
        bucket_edges(tuning, &self.start, &self.end)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        (self.end.value() - self.start.value()).max(0.0).ceil() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grid endpoints are written as note names, e.g. `"A0"`.
mod note_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::note::Note;

    pub fn serialize<S: Serializer>(note: &Note, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(note)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Note, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
