// Copyright (c) 2024 Mike Tsao

//! Four-operator FM synthesis.

use super::{
    algorithms::{algorithm, apply_algorithm},
    PolySynth, PolySynthConfig,
};
use crate::{
    automation::scheduled_set,
    elements::{AmplitudeEnvelope, EnvelopeConfig, Gain, Oscillator, OscillatorConfig},
    engine::{Engine, FiredTimer, ParamRef, Sink, Waveform},
    error::Result,
    traits::{HandlesTimers, HasInputs, HasOutputs, Modulates, PlaysNotes, Port},
    types::{Note, NoteSelector, Seconds, UnitUid},
};
use delegate::delegate;
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build an [Operator].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct OperatorConfig {
    /// Default sine.
    pub waveform: Waveform,
    /// The operator's frequency as a multiple of the note's. Default 1.0.
    #[derivative(Default(value = "1.0"))]
    pub ratio: f64,
    /// Peak output. When the operator is audible this is a gain; when it
    /// modulates another operator it's the deviation in Hz. Default 1.0.
    #[derivative(Default(value = "1.0"))]
    pub level: f64,
    /// The envelope's modifier is replaced by `level`.
    pub envelope: EnvelopeConfig,
}

/// An oscillator with its own amplitude envelope. It's both a modulator and
/// a carrier, depending on the algorithm.
#[derive(Debug, Metadata, Params)]
pub struct Operator {
    uid: UnitUid,
    oscillator: Oscillator,
    amplitude: AmplitudeEnvelope,
    ratio: f64,
}
impl Operator {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &OperatorConfig) -> Self {
        let oscillator = Oscillator::new_with(
            engine,
            &OscillatorConfig {
                waveform: config.waveform,
                ..Default::default()
            },
        );
        let mut amplitude = AmplitudeEnvelope::new_with(engine, &config.envelope);
        amplitude.envelope_mut().set_modifier(config.level);
        engine.primitive_connect(
            oscillator.primitive(),
            Sink::Input(amplitude.gain().primitive()),
            0,
            0,
        );
        Self {
            uid: UnitUid::mint(),
            oscillator,
            amplitude,
            ratio: config.ratio,
        }
    }

    #[allow(missing_docs)]
    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    #[allow(missing_docs)]
    pub fn amplitude_envelope(&self) -> &AmplitudeEnvelope {
        &self.amplitude
    }

    #[allow(missing_docs)]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Takes effect at the next note.
    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio;
    }

    #[allow(missing_docs)]
    pub fn level(&self) -> f64 {
        self.amplitude.envelope().modifier()
    }

    /// Takes effect at the next note.
    pub fn set_level(&mut self, level: f64) {
        self.amplitude.envelope_mut().set_modifier(level);
    }

    fn note_on(&mut self, engine: &mut dyn Engine, note: Note) {
        scheduled_set(
            engine,
            self.oscillator.frequency_param(),
            note.frequency().0 * self.ratio,
        );
        self.amplitude.trigger_attack(engine);
    }
}
impl HasInputs for Operator {}
impl HasOutputs for Operator {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.amplitude)]
    }
}
impl Modulates for Operator {
    fn frequency_param(&self) -> ParamRef {
        self.oscillator.frequency_param()
    }
}
impl HandlesTimers for Operator {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        self.amplitude.handle_timer(engine, timer)
    }
}

/// How to build an [FmVoice].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct FmVoiceConfig {
    /// Operators A through D.
    pub operators: [OperatorConfig; 4],
    /// Index into the algorithm table. Default 0, the serial chain.
    pub algorithm: usize,
}

/// One FM voice: four operators wired by an algorithm into an output.
#[derive(Debug, Metadata, Params)]
pub struct FmVoice {
    uid: UnitUid,
    operators: [Operator; 4],
    output: Gain,
    algorithm: usize,
    current_note: Option<Note>,
}
impl FmVoice {
    /// Fails if the configured algorithm doesn't exist.
    pub fn new_with(engine: &mut dyn Engine, config: &FmVoiceConfig) -> Result<Self> {
        let operators =
            core::array::from_fn(|i| Operator::new_with(engine, &config.operators[i]));
        let output = Gain::new_with(engine, 1.0);
        apply_algorithm(engine, config.algorithm, &operators, &output)?;
        Ok(Self {
            uid: UnitUid::mint(),
            operators,
            output,
            algorithm: config.algorithm,
            current_note: None,
        })
    }

    #[allow(missing_docs)]
    pub fn operators(&self) -> &[Operator; 4] {
        &self.operators
    }

    #[allow(missing_docs)]
    pub fn operators_mut(&mut self) -> &mut [Operator; 4] {
        &mut self.operators
    }

    /// The gain that audible operators are mixed into.
    pub fn output(&self) -> &Gain {
        &self.output
    }

    /// The index of the current algorithm.
    pub fn algorithm(&self) -> usize {
        self.algorithm
    }

    /// Rewires the operators. On failure the old wiring stays.
    pub fn set_algorithm(&mut self, engine: &mut dyn Engine, index: usize) -> Result<&'static str> {
        let topology = apply_algorithm(engine, index, &self.operators, &self.output)?;
        self.algorithm = index;
        Ok(topology)
    }
}
impl HasInputs for FmVoice {}
impl HasOutputs for FmVoice {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.output)]
    }
}
impl PlaysNotes for FmVoice {
    fn current_note(&self) -> Option<Note> {
        self.current_note
    }

    fn note_on(&mut self, engine: &mut dyn Engine, note: Note) {
        self.current_note = Some(note);
        for op in self.operators.iter_mut() {
            op.note_on(engine, note);
        }
    }

    fn note_off(&mut self, engine: &mut dyn Engine) {
        self.current_note = None;
        for op in self.operators.iter_mut() {
            op.amplitude.trigger_release(engine);
        }
    }

    fn note_stop(&mut self, engine: &mut dyn Engine) {
        self.current_note = None;
        for op in self.operators.iter_mut() {
            op.amplitude.trigger_stop(engine);
        }
    }
}
impl HandlesTimers for FmVoice {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        self.operators
            .iter_mut()
            .any(|op| op.handle_timer(engine, timer))
    }
}

/// How to build an [FmSynth].
#[derive(Clone, Debug, Default, Builder, PartialEq, Serialize, Deserialize)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct FmSynthConfig {
    #[allow(missing_docs)]
    pub poly: PolySynthConfig,
    /// Every voice is built from this.
    pub voice: FmVoiceConfig,
}

/// A polyphonic FM instrument.
#[derive(Debug, Metadata, Params)]
pub struct FmSynth {
    uid: UnitUid,
    inner: PolySynth<FmVoice>,
    algorithm: usize,
    #[param(custom)]
    volume: ParamRef,
}
impl FmSynth {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &FmSynthConfig) -> Result<Self> {
        let inner = PolySynth::new_with(engine, &config.poly, |engine| {
            FmVoice::new_with(engine, &config.voice)
        })?;
        Ok(Self {
            uid: UnitUid::mint(),
            volume: inner.volume_param(),
            inner,
            algorithm: config.voice.algorithm,
        })
    }

    delegate! {
        to self.inner {
            /// See [PolySynth::note_on()].
            pub fn note_on(&mut self, engine: &mut dyn Engine, notes: impl Into<NoteSelector>) -> Result<Vec<usize>>;
            /// See [PolySynth::note_off()].
            pub fn note_off(&mut self, engine: &mut dyn Engine, notes: impl Into<NoteSelector>) -> Vec<usize>;
            /// See [PolySynth::note_stop()].
            pub fn note_stop(&mut self, engine: &mut dyn Engine, notes: impl Into<NoteSelector>) -> Vec<usize>;
            /// See [PolySynth::polyphony()].
            pub fn polyphony(&self) -> usize;
            /// See [PolySynth::set_polyphony()].
            pub fn set_polyphony(&mut self, polyphony: i32) -> usize;
            #[allow(missing_docs)]
            pub fn voices(&self) -> &[FmVoice];
            #[allow(missing_docs)]
            pub fn volume_param(&self) -> ParamRef;
            #[allow(missing_docs)]
            pub fn volume(&self, engine: &dyn Engine) -> f64;
            #[allow(missing_docs)]
            pub fn set_volume(&self, engine: &mut dyn Engine, value: f64, time: Seconds);
        }
    }

    /// The index of the algorithm every voice uses.
    pub fn algorithm(&self) -> usize {
        self.algorithm
    }

    /// Rewires every voice. An unknown index is rejected before any voice
    /// is touched.
    pub fn set_algorithm(&mut self, engine: &mut dyn Engine, index: usize) -> Result<&'static str> {
        let topology = algorithm(index)
            .map_err(|e| {
                log::warn!("can't set algorithm: {e}");
                e
            })?
            .topology;
        for voice in self.inner.voices_mut() {
            voice.set_algorithm(engine, index)?;
        }
        self.algorithm = index;
        Ok(topology)
    }
}
impl HasInputs for FmSynth {}
impl HasOutputs for FmSynth {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.inner)]
    }
}
impl HandlesTimers for FmSynth {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        self.inner.handle_timer(engine, timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cores::instruments::{Op, Route, ALGORITHMS},
        engine::OfflineEngine,
        error::Error,
    };
    use float_cmp::approx_eq;
    use strum::IntoEnumIterator;

    fn op(i: usize) -> Op {
        Op::iter().nth(i).unwrap()
    }

    // Reads the voice's wiring back from the engine as routes.
    fn routes(e: &OfflineEngine, voice: &FmVoice) -> Vec<Route> {
        let mut routes = Vec::default();
        for (i, from) in voice.operators().iter().enumerate() {
            for edge in e.edges_from(from.amplitude_envelope().gain().primitive()) {
                if edge.sink == Sink::Input(voice.output().primitive()) {
                    routes.push(Route::Output(op(i)));
                }
                for (j, to) in voice.operators().iter().enumerate() {
                    if edge.sink == Sink::Param(to.frequency_param()) {
                        routes.push(Route::Modulate(op(i), op(j)));
                    }
                }
            }
        }
        routes
    }

    fn sorted(routes: Vec<Route>) -> Vec<String> {
        let mut r: Vec<_> = routes.iter().map(|r| format!("{r:?}")).collect();
        r.sort();
        r
    }

    #[test]
    fn every_algorithm_wires_as_described() {
        let mut e = OfflineEngine::default();
        let mut voice = FmVoice::new_with(&mut e, &FmVoiceConfig::default()).unwrap();
        for (index, a) in ALGORITHMS.iter().enumerate() {
            assert_eq!(voice.set_algorithm(&mut e, index).unwrap(), a.topology);
            assert_eq!(
                sorted(routes(&e, &voice)),
                sorted(a.routes.to_vec()),
                "algorithm {index} ({}) is miswired",
                a.name
            );
        }
    }

    #[test]
    fn switching_removes_old_edges() {
        let mut e = OfflineEngine::default();
        let mut voice = FmVoice::new_with(&mut e, &FmVoiceConfig::default()).unwrap();
        voice.set_algorithm(&mut e, 0).unwrap();
        voice.set_algorithm(&mut e, 3).unwrap();
        assert_eq!(sorted(routes(&e, &voice)), sorted(ALGORITHMS[3].routes.to_vec()));
        assert_eq!(voice.algorithm(), 3);

        let before = e.edges().to_vec();
        assert_eq!(
            voice.set_algorithm(&mut e, 42),
            Err(Error::InvalidAlgorithm {
                index: 42,
                count: 11
            })
        );
        assert_eq!(e.edges(), &before[..], "wiring should be untouched");
        assert_eq!(voice.algorithm(), 3);
    }

    #[test]
    fn operators_follow_their_ratio() {
        let mut e = OfflineEngine::default();
        let mut config = FmVoiceConfig::default();
        config.operators[0] = OperatorConfigBuilder::default()
            .ratio(2.0)
            .level(300.0)
            .build()
            .unwrap();
        let mut voice = FmVoice::new_with(&mut e, &config).unwrap();
        assert_eq!(voice.operators()[0].level(), 300.0);

        voice.note_on(&mut e, Note::A4);
        assert!(approx_eq!(
            f64,
            voice.operators()[0].oscillator().frequency(&e),
            880.0
        ));
        assert!(approx_eq!(
            f64,
            voice.operators()[3].oscillator().frequency(&e),
            440.0
        ));
        assert_eq!(e.pending_timer_count(), 4);

        voice.note_stop(&mut e);
        assert_eq!(voice.current_note(), None);
        assert_eq!(e.pending_timer_count(), 0);
    }

    #[test]
    fn synth_rewires_every_voice() {
        let mut e = OfflineEngine::default();
        let mut synth = FmSynth::new_with(
            &mut e,
            &FmSynthConfigBuilder::default()
                .poly(PolySynthConfig {
                    voices: 3,
                    ..Default::default()
                })
                .build()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(synth.voices().len(), 3);
        assert_eq!(synth.set_algorithm(&mut e, 10).unwrap(), "A + B + C + D > out");
        for voice in synth.voices() {
            assert_eq!(sorted(routes(&e, voice)), sorted(ALGORITHMS[10].routes.to_vec()));
            assert_eq!(voice.algorithm(), 10);
        }
        assert!(synth.set_algorithm(&mut e, 11).is_err());
        assert_eq!(synth.algorithm(), 10);

        assert_eq!(synth.note_on(&mut e, [Note::C4, Note::E4]).unwrap(), vec![0, 1]);
        assert_eq!(synth.note_off(&mut e, NoteSelector::None), vec![0, 1]);
    }

    #[test]
    fn bad_config_is_rejected() {
        let mut e = OfflineEngine::default();
        let config = FmVoiceConfig {
            algorithm: 99,
            ..Default::default()
        };
        assert!(matches!(
            FmVoice::new_with(&mut e, &config),
            Err(Error::InvalidAlgorithm { index: 99, .. })
        ));
    }
}
