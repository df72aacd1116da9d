// Copyright (c) 2024 Mike Tsao

use super::FrequencyHz;
use core::fmt::Display;
use serde::{Deserialize, Serialize};

/// A MIDI key number. Key 69 is A4 at 440 Hz, and key 60 is middle C (C4).
///
/// Turning note names like "C#4" into keys is left to the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Note(pub u8);
#[allow(missing_docs)]
impl Note {
    pub const C4: Note = Note(60);
    pub const D4: Note = Note(62);
    pub const E4: Note = Note(64);
    pub const F4: Note = Note(65);
    pub const G4: Note = Note(67);
    pub const A4: Note = Note(69);
    pub const B4: Note = Note(71);
    pub const C5: Note = Note(72);

    /// The highest valid MIDI key.
    pub const MAX_KEY: u8 = 127;

    /// Equal-tempered pitch of this key, tuned to A4 = 440 Hz.
    pub fn frequency(&self) -> FrequencyHz {
        FrequencyHz(440.0 * 2.0f64.powf((self.0 as f64 - 69.0) / 12.0))
    }
}
impl From<u8> for Note {
    fn from(value: u8) -> Self {
        Self(value.min(Self::MAX_KEY))
    }
}
impl Display for Note {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("key {}", self.0))
    }
}

/// Selects the notes that a note operation applies to.
///
/// `note_off()` and `note_stop()` treat [NoteSelector::None] as "every sounding
/// note," while `note_on()` rejects it because it has nothing to play.
/// Collections nest, so a chord of chords is fine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NoteSelector {
    /// No note given.
    #[default]
    None,
    /// A single note.
    One(Note),
    /// Each member is handled in order.
    Many(Vec<NoteSelector>),
}
impl From<Note> for NoteSelector {
    fn from(value: Note) -> Self {
        Self::One(value)
    }
}
impl From<Option<Note>> for NoteSelector {
    fn from(value: Option<Note>) -> Self {
        value.map_or(Self::None, Self::One)
    }
}
impl From<Vec<Note>> for NoteSelector {
    fn from(value: Vec<Note>) -> Self {
        Self::Many(value.into_iter().map(Self::One).collect())
    }
}
impl<const N: usize> From<[Note; N]> for NoteSelector {
    fn from(value: [Note; N]) -> Self {
        Self::Many(value.into_iter().map(Self::One).collect())
    }
}
impl From<Vec<NoteSelector>> for NoteSelector {
    fn from(value: Vec<NoteSelector>) -> Self {
        Self::Many(value)
    }
}
