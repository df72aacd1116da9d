// Copyright (c) 2024 Mike Tsao

//! Non-automatable primitive settings, and the named choices some of them
//! take.

use crate::types::Seconds;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The shape an oscillator primitive repeats.
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
pub enum Waveform {
    /// Sine wave
    #[default]
    Sine,
    /// Square wave
    Square,
    /// Sawtooth wave
    Sawtooth,
    /// Triangle wave
    Triangle,
}

/// The response of a biquad filter primitive.
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
#[allow(missing_docs)]
pub enum FilterType {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Lowshelf,
    Highshelf,
    Peaking,
    Notch,
    Allpass,
}

/// How much a wave-shaper primitive oversamples before applying its curve.
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
pub enum Oversample {
    /// No oversampling
    None,
    /// 2x
    #[strum(serialize = "2x")]
    #[serde(rename = "2x")]
    TwoX,
    /// 4x
    #[default]
    #[strum(serialize = "4x")]
    #[serde(rename = "4x")]
    FourX,
}

/// The color of noise a buffer-source primitive loops. Generating the buffer
/// itself is the engine's business.
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
#[allow(missing_docs)]
pub enum NoiseType {
    #[default]
    White,
    Pink,
    Brown,
}

/// A setting that is fixed (or changed outright) rather than automated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveSetting {
    /// Oscillator shape.
    Waveform(Waveform),
    /// Biquad response.
    FilterType(FilterType),
    /// Wave-shaper oversampling.
    Oversample(Oversample),
    /// Wave-shaper transfer curve, sampled evenly across [-1.0, 1.0].
    Curve(Vec<f64>),
    /// Buffer-source noise color.
    NoiseType(NoiseType),
    /// The longest delay a delay line can be automated to.
    MaxDelay(Seconds),
    /// Channel count of a merger or splitter.
    Channels(usize),
    /// Whether a buffer source wraps around at its end.
    Loop(bool),
}
impl PrimitiveSetting {
    /// True if both settings configure the same thing, so that one replaces
    /// the other.
    pub fn is_same_kind(&self, other: &PrimitiveSetting) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names_are_kebab_case() {
        assert_eq!(FilterType::from_str("lowpass"), Ok(FilterType::Lowpass));
        assert_eq!(FilterType::Highshelf.to_string(), "highshelf");
        assert_eq!(Oversample::from_str("4x"), Ok(Oversample::FourX));
        assert_eq!(Oversample::TwoX.to_string(), "2x");
        assert!(Waveform::from_str("sawtooth").is_ok());
        assert!(NoiseType::from_str("purple").is_err());

        for w in Waveform::iter() {
            let s: &'static str = w.into();
            assert_eq!(Waveform::from_str(s), Ok(w));
        }
    }

    #[test]
    fn settings_replace_their_own_kind() {
        let a = PrimitiveSetting::Waveform(Waveform::Sine);
        let b = PrimitiveSetting::Waveform(Waveform::Square);
        let c = PrimitiveSetting::Curve(vec![0.0, 1.0]);
        assert!(a.is_same_kind(&b));
        assert!(!a.is_same_kind(&c));
    }
}
