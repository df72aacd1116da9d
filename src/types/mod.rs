// Copyright (c) 2024 Mike Tsao

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        BipolarNormal, FrequencyHz, IsUid, Normal, Note, NoteSelector, PrimitiveUid, Seconds,
        TimerHandle, UidFactory, UnitUid,
    };
}

pub use {
    note::{Note, NoteSelector},
    ranges::{BipolarNormal, Normal, RangedF64},
    time::{FrequencyHz, Seconds},
    uid::{IsUid, PrimitiveUid, TimerHandle, UidFactory, UnitUid},
};

mod note;
mod ranges;
mod time;
mod uid;
