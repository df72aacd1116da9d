// Copyright (c) 2024 Mike Tsao

//! Wall-clock time and pitch.

use serde::{Deserialize, Serialize};
use synonym::Synonym;

/// Represents the [seconds](https://en.wikipedia.org/wiki/Second) unit of time.
/// Engine timestamps, time constants and envelope stage lengths all use it.
#[derive(Synonym, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Seconds(pub f64);
impl Seconds {
    /// Zero seconds. As a time constant, it means "right now."
    pub const fn zero() -> Seconds {
        Seconds(0.0)
    }

    /// Returns this time offset by `delta` seconds.
    pub fn after(&self, delta: Seconds) -> Seconds {
        Seconds(self.0 + delta.0)
    }

    /// True if this is a usable, nonzero duration.
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }
}
impl From<f32> for Seconds {
    fn from(value: f32) -> Self {
        Self(value as f64)
    }
}

/// Cycles per second.
#[derive(Synonym, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrequencyHz(pub f64);
impl FrequencyHz {
    /// Returns the frequency `octaves` octaves above (or, if negative, below)
    /// this one.
    pub fn transposed(&self, octaves: f64) -> FrequencyHz {
        FrequencyHz(self.0 * 2.0f64.powf(octaves))
    }
}
impl From<f32> for FrequencyHz {
    fn from(value: f32) -> Self {
        Self(value as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn seconds_arithmetic() {
        let t = Seconds::from(1.5);
        assert!(approx_eq!(f64, t.after(Seconds(0.25)).0, 1.75));
        assert!(t.is_positive());
        assert!(!Seconds::zero().is_positive());
        assert!(!Seconds(-1.0).is_positive());
    }

    #[test]
    fn frequency_transposition() {
        let a4 = FrequencyHz(440.0);
        assert!(approx_eq!(f64, a4.transposed(1.0).0, 880.0));
        assert!(approx_eq!(f64, a4.transposed(-2.0).0, 110.0));
        assert!(approx_eq!(f64, a4.transposed(0.0).0, 440.0));
    }
}
