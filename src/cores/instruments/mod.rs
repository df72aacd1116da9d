// Copyright (c) 2024 Mike Tsao

//! Instruments turn notes into sound.

pub use {
    algorithms::{algorithm, apply_algorithm, Algorithm, Op, Route, ALGORITHMS},
    fm::{
        FmSynth, FmSynthConfig, FmSynthConfigBuilder, FmVoice, FmVoiceConfig, FmVoiceConfigBuilder,
        Operator, OperatorConfig, OperatorConfigBuilder,
    },
    poly::{PolySynth, PolySynthConfig, PolySynthConfigBuilder, MAX_POLYPHONY},
    voice::{Voice, VoiceConfig, VoiceConfigBuilder},
};

pub mod algorithms;
mod fm;
mod poly;
mod voice;
