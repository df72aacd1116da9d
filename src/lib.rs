// Copyright (c) 2024 Mike Tsao

#![warn(missing_docs)]

//! Patchbay builds signal graphs for an audio rendering engine and drives
//! them with time-stamped automation and notes.
//!
//! The engine itself sits behind the [Engine](engine::Engine) trait: it owns
//! the primitives that do the signal processing, the parameter timelines, and
//! the clock. Everything in this crate is composition on top of that.
//!
//! * [elements] are small units: oscillators, filters, gains, envelopes and
//! the like. Some wrap a single primitive, others are composites.
//! * [cores] are complete effects and instruments built from elements.
//! * [graph] connects any unit to any other unit, parameter, or primitive,
//! resolving composites down to the primitives that carry their signal.
//! * [automation] has the shared time-based controls: immediate and gliding
//! parameter changes, crossfades, and dry/wet blending.
//! * [engine::OfflineEngine] is an in-memory engine with a virtual clock,
//! useful for tests and for checking a patch without making sound.

/// A collection of imports that are useful to users of this crate. `use
/// patchbay::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        automation::prelude::*, cores::prelude::*, elements::prelude::*, engine::prelude::*,
        graph::prelude::*, traits::prelude::*, types::prelude::*,
    };
}

pub use error::{Error, Result};

pub mod automation;
pub mod cores;
pub mod elements;
pub mod engine;
pub mod error;
pub mod graph;
pub mod traits;
pub mod types;
