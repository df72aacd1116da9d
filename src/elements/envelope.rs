// Copyright (c) 2024 Mike Tsao

//! ADSR envelopes.
//!
//! An [Envelope] drives one control value (the offset of a constant-source
//! primitive) through attack, decay, sustain and release. Every phase is an
//! exponential approach scheduled on the engine. The only deferred step is
//! the switch from attack to decay, which is an engine timer that the
//! envelope owns. Any trigger cancels that timer before it does anything
//! else, so a stale decay can never clobber a later release or stop.

use super::gain::Gain;
use crate::{
    automation::{scheduled_set, timed_approach},
    engine::{
        Engine, FiredTimer, ParamName, ParamRef, PrimitiveKind, Sink, TimerAction, TimerTask,
    },
    traits::{HandlesTimers, HasInputs, HasOutputs, Port},
    types::{FrequencyHz, Normal, PrimitiveUid, Seconds, TimerHandle, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// How to build an [Envelope].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct EnvelopeConfig {
    /// Time constant of the rise to the peak, and also how long before decay
    /// begins. Default 0.01s.
    #[derivative(Default(value = "Seconds(0.01)"))]
    pub attack: Seconds,
    /// Time constant of the fall from the peak to the sustain level. Default
    /// 0.1s.
    #[derivative(Default(value = "Seconds(0.1)"))]
    pub decay: Seconds,
    /// Fraction of the peak held while the note is down. Default 0.5.
    #[derivative(Default(value = "Normal::new_const(0.5)"))]
    pub sustain: Normal,
    /// Time constant of the fall to zero after the note ends. Default 1.0s.
    #[derivative(Default(value = "Seconds(1.0)"))]
    pub release: Seconds,
    /// The peak value. Default 1.0.
    #[derivative(Default(value = "1.0"))]
    pub modifier: f64,
}

/// Where an envelope is in its cycle.
#[derive(Clone, Copy, Debug, Default, Display, IntoStaticStr, Eq, PartialEq)]
#[strum(serialize_all = "kebab-case")]
#[allow(missing_docs)]
pub enum EnvelopeState {
    #[default]
    Idle,
    Attacking,
    Decaying,
    Sustaining,
    Releasing,
}

/// A generator of an ADSR control signal. See the module docs.
#[derive(Debug, Metadata, Params)]
pub struct Envelope {
    uid: UnitUid,
    primitive: PrimitiveUid,
    #[param]
    offset: ParamRef,

    attack: Seconds,
    decay: Seconds,
    sustain: Normal,
    release: Seconds,
    modifier: f64,

    state: EnvelopeState,
    phase_started: Seconds,
    pending: Option<TimerHandle>,
}
impl Envelope {
    /// An exponential approach counts as finished after this many time
    /// constants (within 1% of its target).
    pub const SETTLE_TIME_CONSTANTS: f64 = 5.0;

    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &EnvelopeConfig) -> Self {
        let primitive = engine.create_primitive(PrimitiveKind::ConstantSource, &[]);
        let offset = ParamRef::new_with(primitive, ParamName::Offset);
        scheduled_set(engine, offset, 0.0);
        Self {
            uid: UnitUid::mint(),
            primitive,
            offset,
            attack: config.attack,
            decay: config.decay,
            sustain: config.sustain,
            release: config.release,
            modifier: config.modifier,
            state: EnvelopeState::Idle,
            phase_started: engine.now(),
            pending: None,
        }
    }

    /// Starts a note: rise to the peak, then settle to the sustain level.
    /// Zero-length phases are skipped.
    pub fn trigger_attack(&mut self, engine: &mut dyn Engine) {
        self.cancel_pending(engine);
        let now = engine.now();
        if self.attack.is_positive() {
            scheduled_set(engine, self.offset, 0.0);
            timed_approach(engine, self.offset, self.modifier, self.attack);
            let handle = engine.set_timer(
                self.attack,
                TimerTask {
                    owner: self.uid,
                    action: TimerAction::BeginDecay,
                },
            );
            self.pending = Some(handle);
            self.enter(EnvelopeState::Attacking, now);
        } else if self.decay.is_positive() {
            scheduled_set(engine, self.offset, self.modifier);
            timed_approach(engine, self.offset, self.sustain_target(), self.decay);
            self.enter(EnvelopeState::Decaying, now);
        } else if self.sustain.0 > 0.0 {
            scheduled_set(engine, self.offset, self.sustain_target());
            self.enter(EnvelopeState::Sustaining, now);
        } else {
            // Silent, but still holding a note.
            scheduled_set(engine, self.offset, 0.0);
            self.enter(EnvelopeState::Sustaining, now);
        }
    }

    /// Ends a note: fall to zero with the release time constant.
    pub fn trigger_release(&mut self, engine: &mut dyn Engine) {
        self.cancel_pending(engine);
        let now = engine.now();
        timed_approach(engine, self.offset, 0.0, self.release);
        self.enter(EnvelopeState::Releasing, now);
    }

    /// Silences immediately, skipping the release.
    pub fn trigger_stop(&mut self, engine: &mut dyn Engine) {
        self.cancel_pending(engine);
        let now = engine.now();
        scheduled_set(engine, self.offset, 0.0);
        self.enter(EnvelopeState::Idle, now);
    }

    /// The phase at `now`. Decay and release have no event marking their end,
    /// so they're considered over once [Self::SETTLE_TIME_CONSTANTS] time
    /// constants have passed.
    pub fn state(&self, now: Seconds) -> EnvelopeState {
        let settled = |time_constant: Seconds| {
            now.0 - self.phase_started.0 >= time_constant.0 * Self::SETTLE_TIME_CONSTANTS
        };
        match self.state {
            EnvelopeState::Decaying if settled(self.decay) => EnvelopeState::Sustaining,
            EnvelopeState::Releasing if settled(self.release) => EnvelopeState::Idle,
            state => state,
        }
    }

    /// True unless the envelope is idle at `now`.
    pub fn is_active(&self, now: Seconds) -> bool {
        self.state(now) != EnvelopeState::Idle
    }

    /// The timer that will start the decay, if the attack is underway.
    pub fn pending_transition(&self) -> Option<TimerHandle> {
        self.pending
    }

    /// The engine primitive that carries the control signal.
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }

    #[allow(missing_docs)]
    pub fn attack(&self) -> Seconds {
        self.attack
    }
    #[allow(missing_docs)]
    pub fn set_attack(&mut self, attack: Seconds) {
        self.attack = attack;
    }
    #[allow(missing_docs)]
    pub fn decay(&self) -> Seconds {
        self.decay
    }
    #[allow(missing_docs)]
    pub fn set_decay(&mut self, decay: Seconds) {
        self.decay = decay;
    }
    #[allow(missing_docs)]
    pub fn sustain(&self) -> Normal {
        self.sustain
    }
    #[allow(missing_docs)]
    pub fn set_sustain(&mut self, sustain: Normal) {
        self.sustain = sustain;
    }
    #[allow(missing_docs)]
    pub fn release(&self) -> Seconds {
        self.release
    }
    #[allow(missing_docs)]
    pub fn set_release(&mut self, release: Seconds) {
        self.release = release;
    }
    #[allow(missing_docs)]
    pub fn modifier(&self) -> f64 {
        self.modifier
    }
    /// Scales the whole envelope. Takes effect at the next attack.
    pub fn set_modifier(&mut self, modifier: f64) {
        self.modifier = modifier;
    }

    fn sustain_target(&self) -> f64 {
        self.sustain.0 * self.modifier
    }

    fn begin_decay(&mut self, engine: &mut dyn Engine, time: Seconds) {
        self.pending = None;
        timed_approach(engine, self.offset, self.sustain_target(), self.decay);
        self.enter(EnvelopeState::Decaying, time);
    }

    fn cancel_pending(&mut self, engine: &mut dyn Engine) {
        if let Some(handle) = self.pending.take() {
            engine.cancel_timer(handle);
        }
    }

    fn enter(&mut self, state: EnvelopeState, time: Seconds) {
        log::trace!("envelope {} {} -> {} at {}", self.uid.0, self.state, state, time.0);
        self.state = state;
        self.phase_started = time;
    }
}
impl HasInputs for Envelope {}
impl HasOutputs for Envelope {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl HandlesTimers for Envelope {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        if timer.task.owner != self.uid || self.pending != Some(timer.handle) {
            return false;
        }
        match timer.task.action {
            TimerAction::BeginDecay => self.begin_decay(engine, timer.time),
        }
        true
    }
}

/// An envelope that shapes the volume of whatever passes through it.
///
/// Its gain stage sits at zero, and the envelope's signal is added to the
/// gain parameter, so the envelope alone sets the level.
#[derive(Debug, Metadata, Params)]
pub struct AmplitudeEnvelope {
    uid: UnitUid,
    envelope: Envelope,
    gain: Gain,
}
impl AmplitudeEnvelope {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &EnvelopeConfig) -> Self {
        let envelope = Envelope::new_with(engine, config);
        let gain = Gain::new_with(engine, 0.0);
        engine.primitive_connect(
            envelope.primitive(),
            Sink::Param(gain.gain_param()),
            0,
            0,
        );
        Self {
            uid: UnitUid::mint(),
            envelope,
            gain,
        }
    }

    #[allow(missing_docs)]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[allow(missing_docs)]
    pub fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.envelope
    }

    /// The gain stage the envelope drives.
    pub fn gain(&self) -> &Gain {
        &self.gain
    }

    #[allow(missing_docs)]
    pub fn trigger_attack(&mut self, engine: &mut dyn Engine) {
        self.envelope.trigger_attack(engine)
    }

    #[allow(missing_docs)]
    pub fn trigger_release(&mut self, engine: &mut dyn Engine) {
        self.envelope.trigger_release(engine)
    }

    #[allow(missing_docs)]
    pub fn trigger_stop(&mut self, engine: &mut dyn Engine) {
        self.envelope.trigger_stop(engine)
    }
}
impl HasInputs for AmplitudeEnvelope {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.gain)]
    }
}
impl HasOutputs for AmplitudeEnvelope {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.gain)]
    }
}
impl HandlesTimers for AmplitudeEnvelope {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        self.envelope.handle_timer(engine, timer)
    }
}

/// How to build a [FrequencyEnvelope].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct FrequencyEnvelopeConfig {
    /// Stage times and sustain level. The modifier is ignored; the frequency
    /// range sets it.
    pub envelope: EnvelopeConfig,
    /// Where the sweep starts and ends. Default 200 Hz.
    #[derivative(Default(value = "FrequencyHz(200.0)"))]
    pub base_frequency: FrequencyHz,
    /// How far above the base the sweep peaks. Default 4 octaves.
    #[derivative(Default(value = "4.0"))]
    pub octaves: f64,
}

/// An envelope that sweeps a frequency parameter, typically a filter cutoff,
/// from a base frequency up some number of octaves and back.
#[derive(Debug, Metadata, Params)]
pub struct FrequencyEnvelope {
    uid: UnitUid,
    envelope: Envelope,
    target: ParamRef,
    base_frequency: FrequencyHz,
    octaves: f64,
}
impl FrequencyEnvelope {
    /// Creates the envelope and attaches it to `target`, whose resting value
    /// becomes the base frequency.
    pub fn new_with(
        engine: &mut dyn Engine,
        config: &FrequencyEnvelopeConfig,
        target: ParamRef,
    ) -> Self {
        let envelope = Envelope::new_with(engine, &config.envelope);
        engine.primitive_connect(envelope.primitive(), Sink::Param(target), 0, 0);
        let mut r = Self {
            uid: UnitUid::mint(),
            envelope,
            target,
            base_frequency: config.base_frequency,
            octaves: config.octaves,
        };
        r.update_range(engine);
        r
    }

    #[allow(missing_docs)]
    pub fn base_frequency(&self) -> FrequencyHz {
        self.base_frequency
    }

    #[allow(missing_docs)]
    pub fn set_base_frequency(&mut self, engine: &mut dyn Engine, base_frequency: FrequencyHz) {
        self.base_frequency = base_frequency;
        self.update_range(engine);
    }

    #[allow(missing_docs)]
    pub fn octaves(&self) -> f64 {
        self.octaves
    }

    #[allow(missing_docs)]
    pub fn set_octaves(&mut self, engine: &mut dyn Engine, octaves: f64) {
        self.octaves = octaves;
        self.update_range(engine);
    }

    /// The highest frequency the sweep reaches.
    pub fn peak_frequency(&self) -> FrequencyHz {
        self.base_frequency.transposed(self.octaves)
    }

    #[allow(missing_docs)]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[allow(missing_docs)]
    pub fn trigger_attack(&mut self, engine: &mut dyn Engine) {
        self.envelope.trigger_attack(engine)
    }

    #[allow(missing_docs)]
    pub fn trigger_release(&mut self, engine: &mut dyn Engine) {
        self.envelope.trigger_release(engine)
    }

    #[allow(missing_docs)]
    pub fn trigger_stop(&mut self, engine: &mut dyn Engine) {
        self.envelope.trigger_stop(engine)
    }

    fn update_range(&mut self, engine: &mut dyn Engine) {
        scheduled_set(engine, self.target, self.base_frequency.0);
        self.envelope
            .set_modifier(self.peak_frequency().0 - self.base_frequency.0);
    }
}
impl HasInputs for FrequencyEnvelope {}
impl HasOutputs for FrequencyEnvelope {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.envelope)]
    }
}
impl HandlesTimers for FrequencyEnvelope {
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
        self.envelope.handle_timer(engine, timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OfflineEngine;
    use float_cmp::approx_eq;
    use more_asserts::{assert_gt, assert_le, assert_lt};

    fn adsr(attack: f64, decay: f64, sustain: f64, release: f64) -> EnvelopeConfig {
        EnvelopeConfigBuilder::default()
            .attack(Seconds(attack))
            .decay(Seconds(decay))
            .sustain(Normal::new(sustain))
            .release(Seconds(release))
            .build()
            .unwrap()
    }

    #[test]
    fn attack_then_decay() {
        let mut e = OfflineEngine::default();
        let mut env = Envelope::new_with(&mut e, &adsr(0.1, 0.2, 0.5, 0.3));
        assert_eq!(env.state(e.now()), EnvelopeState::Idle);

        env.trigger_attack(&mut e);
        assert_eq!(env.state(e.now()), EnvelopeState::Attacking);
        assert_eq!(env.offset(&e), 0.0);
        assert!(env.pending_transition().is_some());

        e.advance(Seconds(0.1), &mut env);
        assert_eq!(env.state(e.now()), EnvelopeState::Decaying);
        assert!(env.pending_transition().is_none());
        let peak = env.offset(&e);
        assert_gt!(peak, 0.6, "one time constant of attack should be past 63%");

        e.advance(Seconds(2.0), &mut env);
        assert_eq!(env.state(e.now()), EnvelopeState::Sustaining);
        assert!(approx_eq!(f64, env.offset(&e), 0.5, epsilon = 0.001));
    }

    #[test]
    fn release_before_decay_cancels_decay() {
        let mut e = OfflineEngine::default();
        let mut env = Envelope::new_with(&mut e, &adsr(0.1, 0.2, 0.5, 0.3));
        env.trigger_attack(&mut e);
        e.advance(Seconds(0.05), &mut env);
        env.trigger_release(&mut e);
        assert_eq!(e.pending_timer_count(), 0, "decay timer should be gone");

        let mut last = env.offset(&e);
        for _ in 0..40 {
            e.advance(Seconds(0.05), &mut env);
            let value = env.offset(&e);
            assert_le!(value, last, "value must only fall after release");
            last = value;
        }
        assert_eq!(e.fired_timer_count(), 0);
        assert_lt!(last, 0.001);
        assert_eq!(env.state(e.now()), EnvelopeState::Idle);
    }

    #[test]
    fn new_attack_cancels_old_timer() {
        let mut e = OfflineEngine::default();
        let mut env = Envelope::new_with(&mut e, &adsr(0.1, 0.2, 0.5, 0.3));
        env.trigger_attack(&mut e);
        let first = env.pending_transition();
        e.advance(Seconds(0.05), &mut env);
        env.trigger_attack(&mut e);
        assert_ne!(env.pending_transition(), first);
        assert_eq!(e.pending_timer_count(), 1, "at most one pending transition");

        // The second attack's timer fires at about 0.15, not 0.1.
        e.advance_to(Seconds(0.12), &mut env);
        assert_eq!(env.state(e.now()), EnvelopeState::Attacking);
        e.advance_to(Seconds(0.16), &mut env);
        assert_eq!(env.state(e.now()), EnvelopeState::Decaying);
    }

    #[test]
    fn stale_timers_are_ignored() {
        let mut e = OfflineEngine::default();
        let mut env = Envelope::new_with(&mut e, &adsr(0.1, 0.2, 0.5, 0.3));
        env.trigger_attack(&mut e);
        let stale = FiredTimer {
            handle: TimerHandle(9999),
            task: TimerTask {
                owner: env.uid,
                action: TimerAction::BeginDecay,
            },
            time: Seconds(0.1),
        };
        assert!(!env.handle_timer(&mut e, &stale));
        assert_eq!(env.state(e.now()), EnvelopeState::Attacking);
    }

    #[test]
    fn zero_length_phases_are_skipped() {
        let mut e = OfflineEngine::default();

        let mut no_attack = Envelope::new_with(&mut e, &adsr(0.0, 0.2, 0.5, 0.3));
        no_attack.trigger_attack(&mut e);
        assert_eq!(no_attack.state(e.now()), EnvelopeState::Decaying);
        assert_eq!(no_attack.offset(&e), 1.0);
        assert!(no_attack.pending_transition().is_none());

        let mut sustain_only = Envelope::new_with(&mut e, &adsr(0.0, 0.0, 0.5, 0.3));
        sustain_only.trigger_attack(&mut e);
        assert_eq!(sustain_only.offset(&e), 0.5);
        assert_eq!(sustain_only.state(e.now()), EnvelopeState::Sustaining);

        let mut silent = Envelope::new_with(&mut e, &adsr(0.0, 0.0, 0.0, 0.3));
        silent.trigger_attack(&mut e);
        assert_eq!(silent.offset(&e), 0.0);

        let mut instant_release = Envelope::new_with(&mut e, &adsr(0.0, 0.0, 0.5, 0.0));
        instant_release.trigger_attack(&mut e);
        instant_release.trigger_release(&mut e);
        assert_eq!(instant_release.offset(&e), 0.0);
        assert_eq!(instant_release.state(e.now()), EnvelopeState::Idle);
    }

    #[test]
    fn stop_is_immediate() {
        let mut e = OfflineEngine::default();
        let mut env = Envelope::new_with(&mut e, &adsr(0.1, 0.2, 0.5, 5.0));
        env.trigger_attack(&mut e);
        e.advance(Seconds(0.5), &mut env);
        assert_gt!(env.offset(&e), 0.0);
        env.trigger_stop(&mut e);
        assert_eq!(env.offset(&e), 0.0);
        assert_eq!(env.state(e.now()), EnvelopeState::Idle);
    }

    #[test]
    fn modifier_scales_the_peak_and_sustain() {
        let mut e = OfflineEngine::default();
        let mut config = adsr(0.0, 0.1, 0.5, 0.3);
        config.modifier = 4.0;
        let mut env = Envelope::new_with(&mut e, &config);
        env.trigger_attack(&mut e);
        assert_eq!(env.offset(&e), 4.0);
        e.advance(Seconds(5.0), &mut env);
        assert!(approx_eq!(f64, env.offset(&e), 2.0, epsilon = 0.001));
    }

    #[test]
    fn amplitude_envelope_drives_its_gain() {
        let mut e = OfflineEngine::default();
        let mut amp = AmplitudeEnvelope::new_with(&mut e, &adsr(0.0, 0.0, 0.8, 0.1));
        assert_eq!(amp.gain().gain(&e), 0.0);
        assert!(e.is_connected(
            amp.envelope().primitive(),
            Sink::Param(amp.gain().gain_param())
        ));
        amp.trigger_attack(&mut e);
        assert_eq!(amp.envelope().offset(&e), 0.8);
        amp.trigger_stop(&mut e);
        assert_eq!(amp.envelope().offset(&e), 0.0);
    }

    #[test]
    fn frequency_envelope_range() {
        let mut e = OfflineEngine::default();
        let target = e.create_primitive(PrimitiveKind::Filter, &[]);
        let cutoff = ParamRef::new_with(target, ParamName::Frequency);
        let mut fenv = FrequencyEnvelope::new_with(
            &mut e,
            &FrequencyEnvelopeConfigBuilder::default()
                .base_frequency(FrequencyHz(100.0))
                .octaves(3.0)
                .build()
                .unwrap(),
            cutoff,
        );
        assert_eq!(e.param_value(cutoff), 100.0);
        assert!(approx_eq!(f64, fenv.peak_frequency().0, 800.0));
        assert!(approx_eq!(f64, fenv.envelope().modifier(), 700.0));

        fenv.set_octaves(&mut e, 1.0);
        assert!(approx_eq!(f64, fenv.envelope().modifier(), 100.0));
        fenv.trigger_attack(&mut e);
        assert_eq!(fenv.envelope().state(e.now()), EnvelopeState::Attacking);
    }
}
