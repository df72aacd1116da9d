// Copyright (c) 2024 Mike Tsao

//! Effects transform a signal that's connected to them. Most of them sit in
//! a [DryWet] frame so that their mix follows the same contract.

pub use {
    compressor::{Compressor, CompressorConfig, CompressorConfigBuilder},
    delay::{FeedbackDelay, FeedbackDelayConfig, FeedbackDelayConfigBuilder},
    distortion::{Distortion, DistortionConfig, DistortionConfigBuilder},
    dry_wet::DryWet,
};

mod compressor;
mod delay;
mod distortion;
mod dry_wet;
