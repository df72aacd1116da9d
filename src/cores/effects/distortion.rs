// Copyright (c) 2024 Mike Tsao

use super::DryWet;
use crate::{
    engine::{Engine, Oversample, PrimitiveKind, PrimitiveSetting, Sink},
    error::{parse_setting, Result},
    traits::{HasInputs, HasOutputs, Port},
    types::{Normal, PrimitiveUid, Seconds, UnitUid},
};
use core::f64::consts::PI;
use delegate::delegate;
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build a [Distortion].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct DistortionConfig {
    /// How hard the curve bends. Default 0.4.
    #[derivative(Default(value = "Normal::new_const(0.4)"))]
    pub amount: Normal,
    /// Default none.
    #[derivative(Default(value = "Oversample::None"))]
    pub oversample: Oversample,
    /// Default 1.0 (all distorted).
    #[derivative(Default(value = "Normal::new_const(1.0)"))]
    pub wet: Normal,
}

/// Waveshaping distortion.
#[derive(Debug, Metadata, Params)]
pub struct Distortion {
    uid: UnitUid,
    dry_wet: DryWet,
    shaper: PrimitiveUid,
    amount: Normal,
    oversample: Oversample,
}
impl Distortion {
    /// How many points the transfer curve has.
    pub const CURVE_LENGTH: usize = 4096;

    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &DistortionConfig) -> Self {
        let dry_wet = DryWet::new_with(engine, config.wet);
        let shaper = engine.create_primitive(
            PrimitiveKind::WaveShaper,
            &[
                PrimitiveSetting::Curve(Self::curve(config.amount)),
                PrimitiveSetting::Oversample(config.oversample),
            ],
        );
        engine.primitive_connect(
            dry_wet.effect_send().primitive(),
            Sink::Input(shaper),
            0,
            0,
        );
        engine.primitive_connect(
            shaper,
            Sink::Input(dry_wet.effect_return().primitive()),
            0,
            0,
        );
        Self {
            uid: UnitUid::mint(),
            dry_wet,
            shaper,
            amount: config.amount,
            oversample: config.oversample,
        }
    }

    /// The transfer curve for `amount`, sampled evenly over [-1.0, 1.0]. It's
    /// odd-symmetric and passes through the origin, so silence stays silent.
    pub fn curve(amount: Normal) -> Vec<f64> {
        let k = amount.0 * 100.0;
        let degrees = PI / 180.0;
        (0..Self::CURVE_LENGTH)
            .map(|i| {
                let x = i as f64 * 2.0 / Self::CURVE_LENGTH as f64 - 1.0;
                (3.0 + k) * x * 20.0 * degrees / (PI + k * x.abs())
            })
            .collect()
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
    pub fn amount(&self) -> Normal {
        self.amount
    }

    /// Reshapes the curve. This replaces the curve outright; it can't glide.
    pub fn set_amount(&mut self, engine: &mut dyn Engine, amount: Normal) {
        self.amount = amount;
        engine.configure(self.shaper, PrimitiveSetting::Curve(Self::curve(amount)));
    }

    #[allow(missing_docs)]
    pub fn oversample(&self) -> Oversample {
        self.oversample
    }

    /// Sets oversampling by name: "none", "2x" or "4x".
    pub fn set_oversample(&mut self, engine: &mut dyn Engine, name: &str) -> Result<()> {
        let oversample = parse_setting("oversample", name)?;
        self.oversample = oversample;
        engine.configure(self.shaper, PrimitiveSetting::Oversample(oversample));
        Ok(())
    }
}
impl HasInputs for Distortion {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.dry_wet)]
    }
}
impl HasOutputs for Distortion {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.dry_wet)]
    }
}
