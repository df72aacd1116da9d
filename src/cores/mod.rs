// Copyright (c) 2024 Mike Tsao

//! Ready-made composite units: effects that process a signal, and
//! instruments that play notes.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        effects::{Compressor, DryWet, Distortion, FeedbackDelay},
        instruments::{FmSynth, FmVoice, Operator, PolySynth, Voice},
    };
}

pub use effects::*;
pub use instruments::*;

pub mod effects;
pub mod instruments;
