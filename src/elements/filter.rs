// Copyright (c) 2024 Mike Tsao

use crate::{
    engine::{Engine, FilterType, ParamName, ParamRef, PrimitiveKind, PrimitiveSetting},
    error::{parse_setting, Result},
    traits::{HasInputs, HasOutputs, Modulates, Port},
    types::{FrequencyHz, PrimitiveUid, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build a [Filter].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Default lowpass.
    pub filter_type: FilterType,
    /// Cutoff or center. Default 350 Hz.
    #[derivative(Default(value = "FrequencyHz(350.0)"))]
    pub frequency: FrequencyHz,
    /// Resonance. Default 1.
    #[derivative(Default(value = "1.0"))]
    pub q: f64,
    /// Boost in dB, for the shelf and peaking types. Default 0.
    pub gain: f64,
}

/// A biquad filter.
#[derive(Debug, Metadata, Params)]
pub struct Filter {
    uid: UnitUid,
    primitive: PrimitiveUid,
    filter_type: FilterType,
    #[param]
    frequency: ParamRef,
    #[param]
    q: ParamRef,
    #[param]
    gain: ParamRef,
    #[param]
    detune: ParamRef,
}
impl Filter {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &FilterConfig) -> Self {
        let primitive = engine.create_primitive(
            PrimitiveKind::Filter,
            &[PrimitiveSetting::FilterType(config.filter_type)],
        );
        let param = |name: ParamName| ParamRef::new_with(primitive, name);
        let r = Self {
            uid: UnitUid::mint(),
            primitive,
            filter_type: config.filter_type,
            frequency: param(ParamName::Frequency),
            q: param(ParamName::Q),
            gain: param(ParamName::Gain),
            detune: param(ParamName::Detune),
        };
        let now = engine.now();
        engine.schedule_value_at_time(r.frequency, config.frequency.0, now);
        engine.schedule_value_at_time(r.q, config.q, now);
        engine.schedule_value_at_time(r.gain, config.gain, now);
        r
    }

    /// The engine primitive behind this unit.
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }

    #[allow(missing_docs)]
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    #[allow(missing_docs)]
    pub fn set_filter_type(&mut self, engine: &mut dyn Engine, filter_type: FilterType) {
        self.filter_type = filter_type;
        engine.configure(self.primitive, PrimitiveSetting::FilterType(filter_type));
    }

    /// The filter type's name, e.g. "lowpass".
    pub fn type_(&self) -> &'static str {
        self.filter_type.into()
    }

    /// Sets the filter type by name. An unknown name fails with
    /// [Error::InvalidEnumValue](crate::Error::InvalidEnumValue) and leaves
    /// the type alone.
    pub fn set_type(&mut self, engine: &mut dyn Engine, name: &str) -> Result<()> {
        let filter_type = parse_setting("filter type", name)?;
        self.set_filter_type(engine, filter_type);
        Ok(())
    }
}
impl HasInputs for Filter {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl HasOutputs for Filter {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl Modulates for Filter {
    fn frequency_param(&self) -> ParamRef {
        self.frequency
    }
}
