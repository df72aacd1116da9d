// Copyright (c) 2024 Mike Tsao

use super::DryWet;
use crate::{
    automation::timed_approach,
    elements::Gain,
    engine::{Engine, ParamName, ParamRef, PrimitiveKind, PrimitiveSetting, Sink},
    traits::{HasInputs, HasOutputs, Port},
    types::{Normal, PrimitiveUid, Seconds, UnitUid},
};
use delegate::delegate;
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build a [FeedbackDelay].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct FeedbackDelayConfig {
    /// Time between echoes. Default 0.25s.
    #[derivative(Default(value = "Seconds(0.25)"))]
    pub delay_time: Seconds,
    /// The longest delay time this instance can be automated to. Default 1s.
    #[derivative(Default(value = "Seconds(1.0)"))]
    pub max_delay: Seconds,
    /// How much of each echo is fed back. Default 0.5.
    #[derivative(Default(value = "Normal::new_const(0.5)"))]
    pub feedback: Normal,
    /// Default 0.5.
    #[derivative(Default(value = "Normal::new_const(0.5)"))]
    pub wet: Normal,
}

/// An echo: a delay line whose output is fed back into itself through a
/// gain.
#[derive(Debug, Metadata, Params)]
pub struct FeedbackDelay {
    uid: UnitUid,
    dry_wet: DryWet,
    delay_line: PrimitiveUid,
    feedback_gain: Gain,
    max_delay: Seconds,
    #[param(custom)]
    delay_time: ParamRef,
    #[param(custom)]
    feedback: ParamRef,
}
impl FeedbackDelay {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &FeedbackDelayConfig) -> Self {
        let dry_wet = DryWet::new_with(engine, config.wet);
        let delay_line = engine.create_primitive(
            PrimitiveKind::DelayLine,
            &[PrimitiveSetting::MaxDelay(config.max_delay)],
        );
        let feedback_gain = Gain::new_with(engine, 0.0);

        let send = dry_wet.effect_send().primitive();
        let feedback = feedback_gain.primitive();
        engine.primitive_connect(send, Sink::Input(delay_line), 0, 0);
        engine.primitive_connect(delay_line, Sink::Input(feedback), 0, 0);
        engine.primitive_connect(feedback, Sink::Input(delay_line), 0, 0);
        engine.primitive_connect(
            delay_line,
            Sink::Input(dry_wet.effect_return().primitive()),
            0,
            0,
        );

        let r = Self {
            uid: UnitUid::mint(),
            dry_wet,
            delay_line,
            feedback: feedback_gain.gain_param(),
            feedback_gain,
            max_delay: config.max_delay,
            delay_time: ParamRef::new_with(delay_line, ParamName::DelayTime),
        };
        r.set_delay_time(engine, config.delay_time, Seconds::zero());
        r.set_feedback(engine, config.feedback, Seconds::zero());
        r
    }

    delegate! {
        to self.dry_wet {
            /// The current mix. 0.0 is dry only and 1.0 is wet only.
            pub fn wet(&self) -> Normal;
            /// Moves the mix, gliding with time constant `time`.
            pub fn set_wet(&mut self, engine: &mut dyn Engine, mix: Normal, time: Seconds);
        }
    }

    #[allow(missing_docs)]
    pub fn delay_time_param(&self) -> ParamRef {
        self.delay_time
    }

    #[allow(missing_docs)]
    pub fn delay_time(&self, engine: &dyn Engine) -> Seconds {
        Seconds(engine.param_value(self.delay_time))
    }

    /// Moves the delay time. It's limited to the configured maximum.
    pub fn set_delay_time(&self, engine: &mut dyn Engine, delay_time: Seconds, time: Seconds) {
        let clamped = delay_time.0.clamp(0.0, self.max_delay.0);
        timed_approach(engine, self.delay_time, clamped, time);
    }

    #[allow(missing_docs)]
    pub fn feedback_param(&self) -> ParamRef {
        self.feedback
    }

    #[allow(missing_docs)]
    pub fn feedback(&self, engine: &dyn Engine) -> Normal {
        Normal::new(engine.param_value(self.feedback))
    }

    /// Feedback is a [Normal] so that echoes can't grow without bound.
    pub fn set_feedback(&self, engine: &mut dyn Engine, feedback: Normal, time: Seconds) {
        timed_approach(engine, self.feedback, feedback.0, time);
    }
}
impl HasInputs for FeedbackDelay {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.dry_wet)]
    }
}
impl HasOutputs for FeedbackDelay {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.dry_wet)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OfflineEngine;

    #[test]
    fn feedback_loop_is_wired() {
        let mut e = OfflineEngine::default();
        let delay = FeedbackDelay::new_with(&mut e, &FeedbackDelayConfig::default());
        let fb = delay.feedback_gain.primitive();
        assert!(e.is_connected(delay.delay_line, Sink::Input(fb)));
        assert!(e.is_connected(fb, Sink::Input(delay.delay_line)));
        assert_eq!(delay.delay_time(&e), Seconds(0.25));
        assert_eq!(delay.feedback(&e), Normal::new(0.5));
        assert!(e
            .settings(delay.delay_line)
            .contains(&PrimitiveSetting::MaxDelay(Seconds(1.0))));
    }

    #[test]
    fn delay_time_is_limited() {
        let mut e = OfflineEngine::default();
        let mut delay = FeedbackDelay::new_with(
            &mut e,
            &FeedbackDelayConfigBuilder::default()
                .max_delay(Seconds(0.5))
                .build()
                .unwrap(),
        );
        delay.set_delay_time(&mut e, Seconds(3.0), Seconds::zero());
        assert_eq!(delay.delay_time(&e), Seconds(0.5));

        delay.set_wet(&mut e, Normal::new(1.0), Seconds::zero());
        assert_eq!(delay.wet(), Normal::maximum());
    }
}
