// Copyright (c) 2024 Mike Tsao

use crate::{
    engine::{Engine, ParamName, ParamRef, PrimitiveKind},
    traits::{HasInputs, HasOutputs, Port},
    types::{PrimitiveUid, Seconds, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build a [Compressor].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct CompressorConfig {
    /// dB above which compression starts. Default -24.
    #[derivative(Default(value = "-24.0"))]
    pub threshold: f64,
    /// dB range over which the curve eases in. Default 30.
    #[derivative(Default(value = "30.0"))]
    pub knee: f64,
    /// Input dB change per 1 dB of output change. Default 12.
    #[derivative(Default(value = "12.0"))]
    pub ratio: f64,
    /// Default 0.003s.
    #[derivative(Default(value = "Seconds(0.003)"))]
    pub attack: Seconds,
    /// Default 0.25s.
    #[derivative(Default(value = "Seconds(0.25)"))]
    pub release: Seconds,
}

/// A dynamics compressor.
#[derive(Debug, Metadata, Params)]
pub struct Compressor {
    uid: UnitUid,
    primitive: PrimitiveUid,
    #[param]
    threshold: ParamRef,
    #[param]
    knee: ParamRef,
    #[param]
    ratio: ParamRef,
    #[param]
    attack: ParamRef,
    #[param]
    release: ParamRef,
}
impl Compressor {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &CompressorConfig) -> Self {
        let primitive = engine.create_primitive(PrimitiveKind::Compressor, &[]);
        let param = |name: ParamName| ParamRef::new_with(primitive, name);
        let r = Self {
            uid: UnitUid::mint(),
            primitive,
            threshold: param(ParamName::Threshold),
            knee: param(ParamName::Knee),
            ratio: param(ParamName::Ratio),
            attack: param(ParamName::Attack),
            release: param(ParamName::Release),
        };
        let now = engine.now();
        for (param, value) in [
            (r.threshold, config.threshold),
            (r.knee, config.knee),
            (r.ratio, config.ratio),
            (r.attack, config.attack.0),
            (r.release, config.release.0),
        ] {
            engine.schedule_value_at_time(param, value, now);
        }
        r
    }

    /// The engine primitive behind this unit.
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }
}
impl HasInputs for Compressor {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl HasOutputs for Compressor {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
