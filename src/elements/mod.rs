// Copyright (c) 2024 Mike Tsao

//! Building blocks for other parts of the system, especially musical
//! instruments and effects.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        AmplitudeEnvelope, CrossFade, CrossFadeConfig, CrossFadeConfigBuilder, Envelope,
        EnvelopeConfig, EnvelopeConfigBuilder, EnvelopeState, Filter, FilterConfig,
        FilterConfigBuilder, FrequencyEnvelope, FrequencyEnvelopeConfig,
        FrequencyEnvelopeConfigBuilder, Gain, Noise, Oscillator, OscillatorConfig,
        OscillatorConfigBuilder, Panner, Primitive,
    };
}

pub use {
    crossfade::{CrossFade, CrossFadeConfig, CrossFadeConfigBuilder},
    envelope::{
        AmplitudeEnvelope, Envelope, EnvelopeConfig, EnvelopeConfigBuilder, EnvelopeState,
        FrequencyEnvelope, FrequencyEnvelopeConfig, FrequencyEnvelopeConfigBuilder,
    },
    filter::{Filter, FilterConfig, FilterConfigBuilder},
    gain::Gain,
    noise::Noise,
    oscillator::{Oscillator, OscillatorConfig, OscillatorConfigBuilder},
    panner::Panner,
    primitive::Primitive,
};

mod crossfade;
mod envelope;
mod filter;
mod gain;
mod noise;
mod oscillator;
mod panner;
mod primitive;
