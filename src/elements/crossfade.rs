// Copyright (c) 2024 Mike Tsao

use super::gain::Gain;
use crate::{
    automation::FadeCurve,
    engine::{Engine, Sink},
    error::{parse_setting, Result},
    traits::{HasInputs, HasOutputs, Port},
    types::{Normal, Seconds, UnitUid},
};
use derivative::Derivative;
use derive_builder::Builder;
use patchbay_proc_macros::{Metadata, Params};
use serde::{Deserialize, Serialize};

/// How to build a [CrossFade].
#[derive(Clone, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct CrossFadeConfig {
    /// 0.0 is all `a`, 1.0 is all `b`. Default 0.5.
    #[derivative(Default(value = "Normal::new_const(0.5)"))]
    pub fade: Normal,
    /// Default equal-power.
    pub curve: FadeCurve,
}

/// Mixes two signals with one control. Connect sources to [CrossFade::a()]
/// and [CrossFade::b()], and the crossfade itself to the next stage.
#[derive(Debug, Metadata, Params)]
pub struct CrossFade {
    uid: UnitUid,
    a: Gain,
    b: Gain,
    output: Gain,
    fade: Normal,
    curve: FadeCurve,
}
impl CrossFade {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, config: &CrossFadeConfig) -> Self {
        let a = Gain::new_with(engine, 1.0);
        let b = Gain::new_with(engine, 0.0);
        let output = Gain::new_with(engine, 1.0);
        for leg in [&a, &b] {
            engine.primitive_connect(leg.primitive(), Sink::Input(output.primitive()), 0, 0);
        }
        let mut r = Self {
            uid: UnitUid::mint(),
            a,
            b,
            output,
            fade: config.fade,
            curve: config.curve,
        };
        r.set_fade(engine, config.fade, Seconds::zero());
        r
    }

    /// The input that's heard at a fade of 0.0.
    pub fn a(&self) -> &Gain {
        &self.a
    }

    /// The input that's heard at a fade of 1.0.
    pub fn b(&self) -> &Gain {
        &self.b
    }

    #[allow(missing_docs)]
    pub fn fade(&self) -> Normal {
        self.fade
    }

    /// Moves the mix point, gliding with time constant `time`.
    pub fn set_fade(&mut self, engine: &mut dyn Engine, fade: Normal, time: Seconds) {
        self.fade = fade;
        self.curve.apply(
            engine,
            self.a.gain_param(),
            self.b.gain_param(),
            fade,
            time,
        );
    }

    #[allow(missing_docs)]
    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    /// Changes the curve and reapplies the current fade with it.
    pub fn set_curve(&mut self, engine: &mut dyn Engine, curve: FadeCurve) {
        self.curve = curve;
        self.set_fade(engine, self.fade, Seconds::zero());
    }

    /// Sets the curve by name: "linear", "equal-power" or "dry-wet".
    pub fn set_curve_by_name(&mut self, engine: &mut dyn Engine, name: &str) -> Result<()> {
        let curve = parse_setting("fade curve", name)?;
        self.set_curve(engine, curve);
        Ok(())
    }
}
impl HasInputs for CrossFade {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.a), Port::Unit(&self.b)]
    }
}
impl HasOutputs for CrossFade {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.output)]
    }
}
