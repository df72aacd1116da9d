// Copyright (c) 2024 Mike Tsao

use core::{
    fmt::Display,
    ops::{Mul, RangeInclusive, Sub},
};
use serde::{Deserialize, Serialize};

/// [RangedF64] clamps its value to the given range whenever it is created,
/// set, or converted from an f64. Clamping is silent.
///
/// Mix amounts, sustain levels and pan positions arrive from users as plain
/// numbers; this type is the gate that keeps them in range before any of
/// them reaches the engine.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RangedF64<const LOWER: i8, const UPPER: i8>(pub f64);
#[allow(missing_docs)]
impl<const LOWER: i8, const UPPER: i8> RangedF64<LOWER, UPPER> {
    /// The highest valid value.
    pub const MAX: f64 = UPPER as f64;
    /// The lowest valid value.
    pub const MIN: f64 = LOWER as f64;

    pub fn new(value: f64) -> Self {
        Self(Self::clamped(value))
    }
    pub const fn maximum() -> Self {
        Self(Self::MAX)
    }
    pub const fn minimum() -> Self {
        Self(Self::MIN)
    }
    pub fn set(&mut self, value: f64) {
        self.0 = Self::clamped(value);
    }
    pub fn to_percentage(&self) -> f64 {
        self.0 * 100.0
    }

    // NaN has no sensible place in a range, so it lands on the minimum.
    fn clamped(value: f64) -> f64 {
        if value.is_nan() {
            Self::MIN
        } else {
            value.clamp(Self::MIN, Self::MAX)
        }
    }
}
impl<const LOWER: i8, const UPPER: i8> Display for RangedF64<LOWER, UPPER> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}
impl<const LOWER: i8, const UPPER: i8> From<RangedF64<LOWER, UPPER>> for f64 {
    fn from(value: RangedF64<LOWER, UPPER>) -> Self {
        value.0
    }
}
impl<const LOWER: i8, const UPPER: i8> From<f64> for RangedF64<LOWER, UPPER> {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}
impl<const LOWER: i8, const UPPER: i8> From<f32> for RangedF64<LOWER, UPPER> {
    fn from(value: f32) -> Self {
        Self::new(value as f64)
    }
}

/// A [Normal] is a RangedF64 whose range is [0.0, 1.0].
pub type Normal = RangedF64<0, 1>;
#[allow(missing_docs)]
impl Normal {
    pub const fn range() -> RangeInclusive<f64> {
        0.0..=1.0
    }
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }
}
impl Default for Normal {
    // A default-constructed Normal shouldn't silently zero out a signal.
    fn default() -> Self {
        Self(1.0)
    }
}
impl From<BipolarNormal> for Normal {
    fn from(value: BipolarNormal) -> Self {
        Self(value.0 * 0.5 + 0.5)
    }
}
impl Mul<Normal> for f64 {
    type Output = Self;

    fn mul(self, rhs: Normal) -> Self::Output {
        self * rhs.0
    }
}
impl Sub<Normal> for f64 {
    type Output = Self;

    fn sub(self, rhs: Normal) -> Self::Output {
        self - rhs.0
    }
}

/// A [BipolarNormal] is a RangedF64 whose range is [-1.0, 1.0].
pub type BipolarNormal = RangedF64<-1, 1>;
#[allow(missing_docs)]
impl BipolarNormal {
    pub const fn range() -> RangeInclusive<f64> {
        -1.0..=1.0
    }
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }
}
impl Default for BipolarNormal {
    fn default() -> Self {
        Self(0.0)
    }
}
impl From<Normal> for BipolarNormal {
    fn from(value: Normal) -> Self {
        Self(value.0 * 2.0 - 1.0)
    }
}
