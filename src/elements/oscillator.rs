// Copyright (c) 2024 Mike Tsao

use crate::{
    engine::{Engine, ParamName, ParamRef, PrimitiveKind, PrimitiveSetting, Waveform},
    error::{parse_setting, Result},
    traits::{HasInputs, HasOutputs, Modulates, Port},
    types::{FrequencyHz, PrimitiveUid, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build an [Oscillator].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct OscillatorConfig {
    /// Default sine.
    pub waveform: Waveform,
    /// Default 440 Hz.
    #[derivative(Default(value = "FrequencyHz(440.0)"))]
    pub frequency: FrequencyHz,
    /// Cents. Default 0.
    pub detune: f64,
}

/// A periodic waveform source.
#[derive(Debug, Metadata, Params)]
pub struct Oscillator {
    uid: UnitUid,
    primitive: PrimitiveUid,
    waveform: Waveform,
    #[param]
    frequency: ParamRef,
    #[param]
    detune: ParamRef,
}
impl Oscillator {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &OscillatorConfig) -> Self {
        let primitive = engine.create_primitive(
            PrimitiveKind::Oscillator,
            &[PrimitiveSetting::Waveform(config.waveform)],
        );
        let frequency = ParamRef::new_with(primitive, ParamName::Frequency);
        let detune = ParamRef::new_with(primitive, ParamName::Detune);
        let now = engine.now();
        engine.schedule_value_at_time(frequency, config.frequency.0, now);
        engine.schedule_value_at_time(detune, config.detune, now);
        Self {
            uid: UnitUid::mint(),
            primitive,
            waveform: config.waveform,
            frequency,
            detune,
        }
    }

    /// The engine primitive behind this unit.
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }

    #[allow(missing_docs)]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[allow(missing_docs)]
    pub fn set_waveform(&mut self, engine: &mut dyn Engine, waveform: Waveform) {
        self.waveform = waveform;
        engine.configure(self.primitive, PrimitiveSetting::Waveform(waveform));
    }

    /// The waveform's name, e.g. "sine".
    pub fn type_(&self) -> &'static str {
        self.waveform.into()
    }

    /// Sets the waveform by name ("sine", "square", "sawtooth", "triangle").
    pub fn set_type(&mut self, engine: &mut dyn Engine, name: &str) -> Result<()> {
        let waveform = parse_setting("waveform", name)?;
        self.set_waveform(engine, waveform);
        Ok(())
    }
}
impl HasInputs for Oscillator {}
impl HasOutputs for Oscillator {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl Modulates for Oscillator {
    fn frequency_param(&self) -> ParamRef {
        self.frequency
    }
}
