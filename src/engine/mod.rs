// Copyright (c) 2024 Mike Tsao

//! The boundary with the rendering engine.
//!
//! Everything in this crate manipulates primitives (oscillators, gain stages,
//! filters, and so on) only through the [Engine] trait. The engine owns the
//! DSP, the clock, and the parameter values; this crate decides what gets
//! wired to what and when parameters move.

use crate::types::{PrimitiveUid, Seconds, TimerHandle, UnitUid};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        offline::OfflineEngine, Engine, FiredTimer, ParamName, ParamRef, PrimitiveKind,
        PrimitiveSetting, Sink, TimerAction, TimerTask,
    };
}

pub use {
    offline::{AutomationEvent, Edge, OfflineEngine},
    param::{AutomatedParam, Schedule},
    settings::{FilterType, NoiseType, Oversample, PrimitiveSetting, Waveform},
};

mod offline;
mod param;
mod settings;

/// The kinds of primitive unit an engine can create.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    IntoStaticStr,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[allow(missing_docs)]
pub enum PrimitiveKind {
    Oscillator,
    Gain,
    Filter,
    DelayLine,
    Compressor,
    Convolver,
    Panner,
    WaveShaper,
    ChannelMerger,
    ChannelSplitter,
    ConstantSource,
    BufferSource,
}
impl PrimitiveKind {
    /// The automatable parameters of this kind, with their initial values.
    pub fn params(&self) -> &'static [(ParamName, f64)] {
        match self {
            PrimitiveKind::Oscillator => &[(ParamName::Frequency, 440.0), (ParamName::Detune, 0.0)],
            PrimitiveKind::Gain => &[(ParamName::Gain, 1.0)],
            PrimitiveKind::Filter => &[
                (ParamName::Frequency, 350.0),
                (ParamName::Q, 1.0),
                (ParamName::Gain, 0.0),
                (ParamName::Detune, 0.0),
            ],
            PrimitiveKind::DelayLine => &[(ParamName::DelayTime, 0.0)],
            PrimitiveKind::Compressor => &[
                (ParamName::Threshold, -24.0),
                (ParamName::Knee, 30.0),
                (ParamName::Ratio, 12.0),
                (ParamName::Attack, 0.003),
                (ParamName::Release, 0.25),
            ],
            PrimitiveKind::Panner => &[(ParamName::Pan, 0.0)],
            PrimitiveKind::ConstantSource => &[(ParamName::Offset, 1.0)],
            PrimitiveKind::BufferSource => {
                &[(ParamName::PlaybackRate, 1.0), (ParamName::Detune, 0.0)]
            }
            PrimitiveKind::Convolver
            | PrimitiveKind::WaveShaper
            | PrimitiveKind::ChannelMerger
            | PrimitiveKind::ChannelSplitter => &[],
        }
    }

    /// True if this kind exposes the named parameter.
    pub fn has_param(&self, name: ParamName) -> bool {
        self.params().iter().any(|(n, _)| *n == name)
    }

    /// Sources generate signal and have nothing to plug into.
    pub fn accepts_input(&self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Oscillator | PrimitiveKind::ConstantSource | PrimitiveKind::BufferSource
        )
    }
}

/// Names of automatable parameters.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    IntoStaticStr,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[allow(missing_docs)]
pub enum ParamName {
    Frequency,
    Detune,
    Gain,
    Q,
    DelayTime,
    Threshold,
    Knee,
    Ratio,
    Attack,
    Release,
    Pan,
    Offset,
    PlaybackRate,
}

/// Identifies one automatable parameter of one primitive. Cheap to copy;
/// composites hand these out instead of the parameters themselves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParamRef {
    /// The primitive that owns the parameter.
    pub unit: PrimitiveUid,
    /// Which of its parameters.
    pub name: ParamName,
}
impl ParamRef {
    #[allow(missing_docs)]
    pub fn new_with(unit: PrimitiveUid, name: ParamName) -> Self {
        Self { unit, name }
    }
}

/// Where a primitive connection lands: a primitive's signal input, or one of
/// its parameters (which then sums the signal into its value).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sink {
    /// Audio input of a primitive.
    Input(PrimitiveUid),
    /// An automatable parameter of a primitive.
    Param(ParamRef),
}
impl Sink {
    /// The primitive this sink belongs to.
    pub fn primitive(&self) -> PrimitiveUid {
        match self {
            Sink::Input(uid) => *uid,
            Sink::Param(param) => param.unit,
        }
    }
}

/// Deferred work that a unit asks the engine to hand back later.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerAction {
    /// An envelope's attack is over and it should start decaying.
    BeginDecay,
}

/// A timer's payload: who scheduled it, and what they wanted done.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimerTask {
    /// The unit that will act on the timer.
    pub owner: UnitUid,
    #[allow(missing_docs)]
    pub action: TimerAction,
}

/// A timer that has come due.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiredTimer {
    /// The handle `set_timer()` returned.
    pub handle: TimerHandle,
    #[allow(missing_docs)]
    pub task: TimerTask,
    /// When the timer was due.
    pub time: Seconds,
}

/// The operations this crate needs from a rendering engine.
///
/// All calls are synchronous and single-threaded. Implementations should
/// treat redundant requests (connecting an existing edge, disconnecting a
/// missing one, cancelling a fired timer) as no-ops.
pub trait Engine {
    /// The engine clock.
    fn now(&self) -> Seconds;

    /// Creates a primitive of the given kind, applying `settings` in order.
    fn create_primitive(&mut self, kind: PrimitiveKind, settings: &[PrimitiveSetting])
        -> PrimitiveUid;

    /// Changes a non-automatable setting, replacing any earlier setting of
    /// the same kind.
    fn configure(&mut self, primitive: PrimitiveUid, setting: PrimitiveSetting);

    /// The kind of a primitive, or None if the engine doesn't know it.
    fn primitive_kind(&self, primitive: PrimitiveUid) -> Option<PrimitiveKind>;

    /// Wires `source`'s `output` channel to `sink`'s `input` channel.
    fn primitive_connect(&mut self, source: PrimitiveUid, sink: Sink, output: usize, input: usize);

    /// Removes one edge.
    fn primitive_disconnect(
        &mut self,
        source: PrimitiveUid,
        sink: Sink,
        output: usize,
        input: usize,
    );

    /// Removes every edge leaving `source`.
    fn primitive_disconnect_all(&mut self, source: PrimitiveUid);

    /// Schedules `param` to jump to `value` at `time`.
    fn schedule_value_at_time(&mut self, param: ParamRef, value: f64, time: Seconds);

    /// Schedules `param` to approach `target` exponentially from `start`.
    fn schedule_approach_at_time(
        &mut self,
        param: ParamRef,
        target: f64,
        start: Seconds,
        time_constant: Seconds,
    );

    /// The value of `param` right now.
    fn param_value(&self, param: ParamRef) -> f64;

    /// Asks the engine to hand `task` back after `delay`.
    fn set_timer(&mut self, delay: Seconds, task: TimerTask) -> TimerHandle;

    /// Forgets a pending timer.
    fn cancel_timer(&mut self, handle: TimerHandle);

    /// True if the engine knows this primitive.
    fn has_primitive(&self, primitive: PrimitiveUid) -> bool {
        self.primitive_kind(primitive).is_some()
    }

    /// True if `param` names a parameter its primitive's kind exposes.
    fn has_param(&self, param: ParamRef) -> bool {
        self.primitive_kind(param.unit)
            .is_some_and(|kind| kind.has_param(param.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn kinds_describe_themselves() {
        assert!(PrimitiveKind::Oscillator.has_param(ParamName::Frequency));
        assert!(!PrimitiveKind::Gain.has_param(ParamName::Frequency));
        assert!(!PrimitiveKind::Oscillator.accepts_input());
        assert!(PrimitiveKind::Gain.accepts_input());
        assert_eq!(PrimitiveKind::DelayLine.to_string(), "delay-line");

        let sources = PrimitiveKind::iter()
            .filter(|k| !k.accepts_input())
            .count();
        assert_eq!(sources, 3);
    }

    #[test]
    fn sinks_know_their_primitive() {
        let p = PrimitiveUid(7);
        assert_eq!(Sink::Input(p).primitive(), p);
        assert_eq!(
            Sink::Param(ParamRef::new_with(p, ParamName::Gain)).primitive(),
            p
        );
    }
}
