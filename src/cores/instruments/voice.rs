// Copyright (c) 2024 Mike Tsao

use crate::{
    automation::scheduled_set,
    elements::{
        AmplitudeEnvelope, EnvelopeConfig, Filter, FilterConfig, FrequencyEnvelope,
        FrequencyEnvelopeConfig, Oscillator, OscillatorConfig,
    },
    engine::{Engine, FiredTimer, Sink},
    traits::{HandlesTimers, HasInputs, HasOutputs, PlaysNotes, Port},
    types::{Note, Seconds, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build a [Voice].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct VoiceConfig {
    #[allow(missing_docs)]
    pub oscillator: OscillatorConfig,
    /// The amplitude envelope.
    pub envelope: EnvelopeConfig,
    /// If present, the oscillator passes through a filter before the
    /// amplitude envelope. Default none.
    #[builder(setter(strip_option))]
    pub filter: Option<FilterConfig>,
    /// Sweeps the filter's cutoff. Ignored without a filter. When present,
    /// its base frequency replaces the filter's configured frequency.
    #[builder(setter(strip_option))]
    pub filter_envelope: Option<FrequencyEnvelopeConfig>,
}

#[derive(Debug)]
struct FilterStage {
    filter: Filter,
    envelope: Option<FrequencyEnvelope>,
}

/// One monophonic voice: an oscillator, an optional enveloped filter, and an
/// amplitude envelope.
#[derive(Debug, Metadata, Params)]
pub struct Voice {
    uid: UnitUid,
    oscillator: Oscillator,
    filter: Option<FilterStage>,
    amplitude: AmplitudeEnvelope,
    current_note: Option<Note>,
}
impl Voice {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &VoiceConfig) -> Self {
        let oscillator = Oscillator::new_with(engine, &config.oscillator);
        let amplitude = AmplitudeEnvelope::new_with(engine, &config.envelope);
        let amplitude_in = Sink::Input(amplitude.gain().primitive());

        let filter = config.filter.as_ref().map(|filter_config| {
            let filter = Filter::new_with(engine, filter_config);
            let envelope = config
                .filter_envelope
                .as_ref()
                .map(|c| FrequencyEnvelope::new_with(engine, c, filter.frequency_param()));
            FilterStage { filter, envelope }
        });
        match filter.as_ref() {
            Some(stage) => {
                let filter = stage.filter.primitive();
                engine.primitive_connect(oscillator.primitive(), Sink::Input(filter), 0, 0);
                engine.primitive_connect(filter, amplitude_in, 0, 0);
            }
            None => engine.primitive_connect(oscillator.primitive(), amplitude_in, 0, 0),
        }

        Self {
            uid: UnitUid::mint(),
            oscillator,
            filter,
            amplitude,
            current_note: None,
        }
    }

    #[allow(missing_docs)]
    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    #[allow(missing_docs)]
    pub fn oscillator_mut(&mut self) -> &mut Oscillator {
        &mut self.oscillator
    }

    #[allow(missing_docs)]
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref().map(|s| &s.filter)
    }

    #[allow(missing_docs)]
    pub fn filter_envelope(&self) -> Option<&FrequencyEnvelope> {
        self.filter.as_ref().and_then(|s| s.envelope.as_ref())
    }

    #[allow(missing_docs)]
    pub fn amplitude_envelope(&self) -> &AmplitudeEnvelope {
        &self.amplitude
    }

    /// True while the amplitude envelope is making sound, which includes
    /// the release after the note is let go.
    pub fn is_sounding(&self, now: Seconds) -> bool {
        self.amplitude.envelope().is_active(now)
    }

    fn filter_envelope_mut(&mut self) -> Option<&mut FrequencyEnvelope> {
        self.filter.as_mut().and_then(|s| s.envelope.as_mut())
    }
}
impl HasInputs for Voice {}
impl HasOutputs for Voice {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.amplitude)]
    }
}
impl PlaysNotes for Voice {
    fn current_note(&self) -> Option<Note> {
        self.current_note
    }

    fn note_on(&mut self, engine: &mut dyn Engine, note: Note) {
        self.current_note = Some(note);
        scheduled_set(engine, self.oscillator.frequency_param(), note.frequency().0);
        self.amplitude.trigger_attack(engine);
        if let Some(envelope) = self.filter_envelope_mut() {
            envelope.trigger_attack(engine);
        }
    }

    fn note_off(&mut self, engine: &mut dyn Engine) {
        self.current_note = None;
        self.amplitude.trigger_release(engine);
        if let Some(envelope) = self.filter_envelope_mut() {
            envelope.trigger_release(engine);
        }
    }

    fn note_stop(&mut self, engine: &mut dyn Engine) {
        self.current_note = None;
        self.amplitude.trigger_stop(engine);
        if let Some(envelope) = self.filter_envelope_mut() {
            envelope.trigger_stop(engine);
        }
    }
}
impl HandlesTimers for Voice {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        if self.amplitude.handle_timer(engine, timer) {
            return true;
        }
        self.filter_envelope_mut()
            .is_some_and(|envelope| envelope.handle_timer(engine, timer))
    }
}
