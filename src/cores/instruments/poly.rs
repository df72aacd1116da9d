// Copyright (c) 2024 Mike Tsao

//! Polyphony from a fixed pool of monophonic voices.
//!
//! Voices are handed out by a rotating cursor. A note goes to the voice under
//! the cursor if it's free, otherwise to the next free voice after it, and if
//! every voice is busy the voice under the cursor is stolen. The cursor moves
//! on by one after every note no matter which voice took it.

use crate::{
    elements::Gain,
    engine::{Engine, FiredTimer, ParamRef},
    error::{Error, Result},
    graph,
    traits::{HandlesTimers, HasInputs, HasOutputs, IsVoice, Port},
    types::{Normal, Note, NoteSelector, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// The largest voice pool a [PolySynth] can have.
pub const MAX_POLYPHONY: usize = 8;

/// How to build a [PolySynth].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct PolySynthConfig {
    /// How many voices to create, 1..=[MAX_POLYPHONY]. Out-of-range values
    /// are clamped. Default 8.
    #[derivative(Default(value = "MAX_POLYPHONY"))]
    pub voices: usize,
    /// Output level. Default 1.0.
    pub volume: Normal,
}

/// Plays overlapping notes on a pool of `V` voices.
#[derive(Debug, Metadata, Params)]
pub struct PolySynth<V: IsVoice> {
    uid: UnitUid,
    voices: Vec<V>,
    polyphony: usize,
    next: usize,
    output: Gain,
    #[param]
    volume: ParamRef,
}
impl<V: IsVoice> PolySynth<V> {
    /// Builds the pool by calling `new_voice` once per voice, and mixes every
    /// voice into the output.
    pub fn new_with(
        engine: &mut dyn Engine,
        config: &PolySynthConfig,
        mut new_voice: impl FnMut(&mut dyn Engine) -> Result<V>,
    ) -> Result<Self> {
        let output = Gain::new_with(engine, config.volume.0);
        let count = config.voices.clamp(1, MAX_POLYPHONY);
        let mut voices = Vec::with_capacity(count);
        for _ in 0..count {
            let voice = new_voice(engine)?;
            graph::connect(engine, &voice, &output, 0, 0)?;
            voices.push(voice);
        }
        Ok(Self {
            uid: UnitUid::mint(),
            volume: output.gain_param(),
            voices,
            polyphony: count,
            next: 0,
            output,
        })
    }

    /// Starts `notes`, returning the index of the voice each one went to.
    /// Every note in the selector must be present; if any is missing, the
    /// call fails with [Error::MissingNote] before any voice changes.
    pub fn note_on(
        &mut self,
        engine: &mut dyn Engine,
        notes: impl Into<NoteSelector>,
    ) -> Result<Vec<usize>> {
        let mut flattened = Vec::default();
        if let Err(e) = flatten(&notes.into(), &mut flattened) {
            log::warn!("note on ignored: {e}");
            return Err(e);
        }
        Ok(flattened
            .into_iter()
            .map(|note| {
                let index = self.allocate();
                self.voices[index].note_on(engine, note);
                index
            })
            .collect())
    }

    /// Releases every voice playing any of `notes`, or every voice holding a
    /// note if `notes` is [NoteSelector::None]. Returns the released voices.
    pub fn note_off(&mut self, engine: &mut dyn Engine, notes: impl Into<NoteSelector>) -> Vec<usize> {
        let mut released = Vec::default();
        self.let_go(engine, &notes.into(), false, &mut released);
        released
    }

    /// Like [Self::note_off()], but silences at once, skipping the release.
    pub fn note_stop(&mut self, engine: &mut dyn Engine, notes: impl Into<NoteSelector>) -> Vec<usize> {
        let mut stopped = Vec::default();
        self.let_go(engine, &notes.into(), true, &mut stopped);
        stopped
    }

    /// How many voices take part in allocation.
    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    /// Limits allocation to the first `polyphony` voices, clamped to
    /// 1..=[Self::pool_size()]. Returns the new polyphony. The pool itself
    /// never changes size, and voices outside the new limit keep playing
    /// until they're let go.
    pub fn set_polyphony(&mut self, polyphony: i32) -> usize {
        let pool = self.voices.len() as i64;
        self.polyphony = i64::from(polyphony).clamp(1, pool) as usize;
        self.next %= self.polyphony;
        self.polyphony
    }

    /// How many voices exist.
    pub fn pool_size(&self) -> usize {
        self.voices.len()
    }

    /// The voice the next note will try first.
    pub fn next_voice(&self) -> usize {
        self.next
    }

    #[allow(missing_docs)]
    pub fn voices(&self) -> &[V] {
        &self.voices
    }

    #[allow(missing_docs)]
    pub fn voices_mut(&mut self) -> &mut [V] {
        &mut self.voices
    }

    /// The gain that all voices are mixed into.
    pub fn output(&self) -> &Gain {
        &self.output
    }

    fn allocate(&mut self) -> usize {
        let start = self.next;
        let index = (0..self.polyphony)
            .map(|offset| (start + offset) % self.polyphony)
            .find(|i| self.voices[*i].current_note().is_none())
            .unwrap_or_else(|| {
                log::debug!("all {} voices busy; stealing voice {start}", self.polyphony);
                start
            });
        self.next = (start + 1) % self.polyphony;
        index
    }

    fn let_go(
        &mut self,
        engine: &mut dyn Engine,
        selector: &NoteSelector,
        stop: bool,
        touched: &mut Vec<usize>,
    ) {
        match selector {
            NoteSelector::Many(selectors) => {
                for selector in selectors {
                    self.let_go(engine, selector, stop, touched);
                }
                return;
            }
            NoteSelector::None | NoteSelector::One(_) => {}
        }
        for (index, voice) in self.voices.iter_mut().enumerate() {
            let matches = match (selector, voice.current_note()) {
                (_, None) => false,
                (NoteSelector::One(note), Some(current)) => *note == current,
                _ => true,
            };
            if matches {
                if stop {
                    voice.note_stop(engine);
                } else {
                    voice.note_off(engine);
                }
                touched.push(index);
            }
        }
    }
}
impl<V: IsVoice> HasInputs for PolySynth<V> {}
impl<V: IsVoice> HasOutputs for PolySynth<V> {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.output)]
    }
}
impl<V: IsVoice> HandlesTimers for PolySynth<V> {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        self.voices
            .iter_mut()
            .any(|voice| voice.handle_timer(engine, timer))
    }
}

fn flatten(selector: &NoteSelector, notes: &mut Vec<Note>) -> Result<()> {
    match selector {
        NoteSelector::None => Err(Error::MissingNote),
        NoteSelector::One(note) => {
            notes.push(*note);
            Ok(())
        }
        NoteSelector::Many(selectors) => selectors.iter().try_for_each(|s| flatten(s, notes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cores::instruments::{Voice, VoiceConfig},
        engine::OfflineEngine,
        traits::PlaysNotes,
    };

    fn synth(e: &mut OfflineEngine, voices: usize) -> PolySynth<Voice> {
        PolySynth::new_with(
            e,
            &PolySynthConfigBuilder::default()
                .voices(voices)
                .build()
                .unwrap(),
            |e| Ok(Voice::new_with(e, &VoiceConfig::default())),
        )
        .unwrap()
    }

    fn held(s: &PolySynth<Voice>) -> Vec<Option<Note>> {
        s.voices().iter().map(|v| v.current_note()).collect()
    }

    #[test]
    fn steals_the_cursor_voice() {
        let mut e = OfflineEngine::default();
        let mut s = synth(&mut e, 8);
        assert_eq!(s.set_polyphony(2), 2);

        assert_eq!(s.note_on(&mut e, Note::C4).unwrap(), vec![0]);
        assert_eq!(s.note_on(&mut e, Note::E4).unwrap(), vec![1]);
        assert_eq!(s.note_on(&mut e, Note::G4).unwrap(), vec![0]);
        assert_eq!(held(&s)[..2], [Some(Note::G4), Some(Note::E4)]);

        assert_eq!(s.note_off(&mut e, Note::G4), vec![0]);
        assert_eq!(held(&s)[..2], [None, Some(Note::E4)]);
    }

    #[test]
    fn scans_forward_for_free_voices() {
        let mut e = OfflineEngine::default();
        let mut s = synth(&mut e, 4);
        assert_eq!(
            s.note_on(&mut e, [Note::C4, Note::E4, Note::G4]).unwrap(),
            vec![0, 1, 2]
        );
        s.note_off(&mut e, Note::C4);

        // Cursor is at 3, which is free.
        assert_eq!(s.note_on(&mut e, Note::A4).unwrap(), vec![3]);
        // Cursor wraps to 0, which was just released.
        assert_eq!(s.note_on(&mut e, Note::B4).unwrap(), vec![0]);
        // Cursor at 1 is busy and so is everything after it; steal 1.
        assert_eq!(s.note_on(&mut e, Note::C5).unwrap(), vec![1]);
        assert_eq!(s.next_voice(), 2);
    }

    #[test]
    fn missing_notes_change_nothing() {
        let mut e = OfflineEngine::default();
        let mut s = synth(&mut e, 8);
        assert_eq!(s.note_on(&mut e, NoteSelector::None), Err(Error::MissingNote));
        assert_eq!(
            s.note_on(
                &mut e,
                vec![NoteSelector::One(Note::C4), NoteSelector::None]
            ),
            Err(Error::MissingNote)
        );
        assert!(held(&s).iter().all(|n| n.is_none()));
        assert_eq!(s.next_voice(), 0);
    }

    #[test]
    fn polyphony_clamps() {
        let mut e = OfflineEngine::default();
        let mut s = synth(&mut e, 8);
        assert_eq!(
            [0, 9, -3].map(|n| s.set_polyphony(n)),
            [1, 8, 1],
            "polyphony should stay within the pool"
        );
        assert_eq!(s.pool_size(), 8);

        let tiny = synth(&mut e, 0);
        assert_eq!(tiny.pool_size(), 1);
        let huge = synth(&mut e, 100);
        assert_eq!(huge.pool_size(), MAX_POLYPHONY);
    }

    #[test]
    fn shrinking_wraps_the_cursor() {
        let mut e = OfflineEngine::default();
        let mut s = synth(&mut e, 8);
        s.note_on(&mut e, [Note::C4, Note::D4, Note::E4, Note::F4, Note::G4])
            .unwrap();
        assert_eq!(s.next_voice(), 5);
        s.set_polyphony(3);
        assert_eq!(s.next_voice(), 2);

        // Voices beyond the limit still respond to note-off.
        assert_eq!(s.note_off(&mut e, Note::G4), vec![4]);
    }

    #[test]
    fn everything_off_and_stop() {
        let mut e = OfflineEngine::default();
        let mut s = synth(&mut e, 4);
        s.note_on(&mut e, [Note::C4, Note::C4, Note::E4]).unwrap();
        assert_eq!(
            s.note_off(&mut e, Note::C4),
            vec![0, 1],
            "every voice on the note should be released"
        );
        assert_eq!(s.note_stop(&mut e, NoteSelector::None), vec![2]);
        assert!(held(&s).iter().all(|n| n.is_none()));
        assert!(s.note_off(&mut e, NoteSelector::None).is_empty());
        assert_eq!(e.pending_timer_count(), 0);
    }

    #[test]
    fn voices_reach_the_output() {
        let mut e = OfflineEngine::default();
        let s = synth(&mut e, 3);
        for v in s.voices() {
            assert!(e.is_connected(
                v.amplitude_envelope().gain().primitive(),
                crate::engine::Sink::Input(s.output().primitive())
            ));
        }
        assert_eq!(s.volume(&e), 1.0);
    }
}
