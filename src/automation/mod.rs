// Copyright (c) 2024 Mike Tsao

//! Moving parameters over time.
//!
//! Every setter in this crate funnels through these few functions, so all
//! units share one timing contract: changes start at the engine's current
//! time, and a time of zero means "jump, don't glide."

use crate::{
    engine::{Engine, ParamRef},
    types::Seconds,
};

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        dry_wet_blend, equal_power_fade, linear_fade, scheduled_set, timed_approach, FadeCurve,
    };
}

pub use fades::{dry_wet_blend, equal_power_fade, linear_fade, FadeCurve};

mod fades;

/// Sets `param` to `value` right now.
pub fn scheduled_set(engine: &mut dyn Engine, param: ParamRef, value: f64) {
    let now = engine.now();
    engine.schedule_value_at_time(param, value, now);
}

/// Starts `param` gliding exponentially toward `value` with the given time
/// constant. A zero (or negative) time constant is a [scheduled_set()].
pub fn timed_approach(engine: &mut dyn Engine, param: ParamRef, value: f64, time_constant: Seconds) {
    if time_constant.is_positive() {
        let now = engine.now();
        engine.schedule_approach_at_time(param, value, now, time_constant);
    } else {
        scheduled_set(engine, param, value);
    }
}
