// Copyright (c) 2024 Mike Tsao

use super::timed_approach;
use crate::{
    engine::{Engine, ParamRef},
    types::{Normal, Seconds},
};
use core::f64::consts::FRAC_PI_2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// How two gains share a single mix control.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FadeCurve {
    /// The gains always sum to 1.
    Linear,
    /// The gains' squares always sum to 1, so perceived loudness holds steady
    /// across the fade.
    #[default]
    EqualPower,
    /// See [dry_wet_blend()].
    DryWet,
}
impl FadeCurve {
    /// The gains for the first and second signals at `mix`, where 0.0 is all
    /// first signal and 1.0 is all second.
    pub fn gains(&self, mix: Normal) -> (f64, f64) {
        let mix = mix.0;
        match self {
            FadeCurve::Linear => (1.0 - mix, mix),
            FadeCurve::EqualPower => ((mix * FRAC_PI_2).cos(), ((1.0 - mix) * FRAC_PI_2).cos()),
            FadeCurve::DryWet => {
                if mix < 0.5 {
                    (1.0, mix * 2.0)
                } else {
                    (1.0 - (mix - 0.5) * 2.0, 1.0)
                }
            }
        }
    }

    /// Moves `a` and `b` toward this curve's gains at `mix`.
    pub fn apply(
        &self,
        engine: &mut dyn Engine,
        a: ParamRef,
        b: ParamRef,
        mix: Normal,
        time_constant: Seconds,
    ) {
        let (a_gain, b_gain) = self.gains(mix);
        timed_approach(engine, a, a_gain, time_constant);
        timed_approach(engine, b, b_gain, time_constant);
    }
}

/// Moves `a` toward `1 - mix` and `b` toward `mix`.
pub fn linear_fade(
    engine: &mut dyn Engine,
    a: ParamRef,
    b: ParamRef,
    mix: Normal,
    time_constant: Seconds,
) {
    FadeCurve::Linear.apply(engine, a, b, mix, time_constant)
}

/// Moves `a` toward `cos(mix * pi/2)` and `b` toward `cos((1 - mix) * pi/2)`.
pub fn equal_power_fade(
    engine: &mut dyn Engine,
    a: ParamRef,
    b: ParamRef,
    mix: Normal,
    time_constant: Seconds,
) {
    FadeCurve::EqualPower.apply(engine, a, b, mix, time_constant)
}

/// Blends a dry and a wet signal.
///
/// This is not a crossfade. Below a mix of 0.5 the dry signal stays at full
/// level while the wet signal rises from 0 to 1. From 0.5 up, the wet signal
/// stays at full level while the dry signal falls from 1 to 0. At exactly 0.5
/// both are at 1. The breakpoint is part of the contract; effects rely on
/// "dry stays full until halfway."
pub fn dry_wet_blend(
    engine: &mut dyn Engine,
    dry: ParamRef,
    wet: ParamRef,
    mix: Normal,
    time_constant: Seconds,
) {
    FadeCurve::DryWet.apply(engine, dry, wet, mix, time_constant)
}
