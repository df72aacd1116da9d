// Copyright (c) 2024 Mike Tsao

//! Engine-side state of one automatable parameter.

use crate::types::Seconds;
use serde::{Deserialize, Serialize};

/// What a parameter has been told to do next.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schedule {
    /// Jump to `value` at `time`.
    Set {
        /// The new value.
        value: f64,
        /// When it takes effect.
        time: Seconds,
    },
    /// Starting at `start`, move exponentially toward `target`. After one
    /// time constant the parameter has covered about 63% of the distance.
    Approach {
        /// Where the parameter is heading.
        target: f64,
        /// When the approach begins.
        start: Seconds,
        /// Exponential rate. Zero is treated as an immediate set.
        time_constant: Seconds,
    },
}
impl Schedule {
    /// When this schedule begins to affect the parameter.
    pub fn start(&self) -> Seconds {
        match self {
            Schedule::Set { time, .. } => *time,
            Schedule::Approach { start, .. } => *start,
        }
    }
}

/// A parameter's value plus at most one pending [Schedule].
///
/// Scheduling overwrites rather than queues. Before the new schedule is
/// stored, the old one is settled to whatever it produced at the moment of
/// scheduling, so the new curve starts from where the parameter actually was.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AutomatedParam {
    value: f64,
    schedule: Option<Schedule>,
}
impl AutomatedParam {
    #[allow(missing_docs)]
    pub fn new_with(initial_value: f64) -> Self {
        Self {
            value: initial_value,
            schedule: None,
        }
    }

    /// The value the parameter has at `time`.
    pub fn value_at(&self, time: Seconds) -> f64 {
        match self.schedule {
            None => self.value,
            Some(Schedule::Set { value, time: when }) => {
                if time.0 >= when.0 {
                    value
                } else {
                    self.value
                }
            }
            Some(Schedule::Approach {
                target,
                start,
                time_constant,
            }) => {
                if time.0 < start.0 {
                    self.value
                } else if !time_constant.is_positive() {
                    target
                } else {
                    let elapsed = time.0 - start.0;
                    target + (self.value - target) * (-elapsed / time_constant.0).exp()
                }
            }
        }
    }

    /// Replaces any pending schedule with `schedule`, settling the old one at
    /// `now` first.
    pub fn schedule(&mut self, now: Seconds, schedule: Schedule) {
        self.value = self.value_at(now);
        self.schedule = Some(schedule);
    }

    /// The pending schedule, if any.
    pub fn pending(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }
}
