// Copyright (c) 2024 Mike Tsao

//! Errors returned by graph, automation and instrument operations.

use core::str::FromStr;
use thiserror::Error;

/// Result type alias for patchbay operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong. Every failing operation leaves the graph
/// exactly as it found it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The destination names a primitive the engine doesn't know, a parameter
    /// its kind doesn't have, or an input on a kind that takes none.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// The destination unit declares no inputs, so it can't be connected to.
    #[error("{0} has no inputs")]
    NoInputs(String),

    /// The source unit declares no outputs, so it can't be connected from.
    #[error("{0} has no outputs")]
    NoOutputs(String),

    /// The requested modulation algorithm doesn't exist.
    #[error("algorithm {index} is out of range (there are {count})")]
    InvalidAlgorithm {
        /// The index that was asked for.
        index: usize,
        /// How many algorithms exist.
        count: usize,
    },

    /// A string didn't name any member of a constrained setting.
    #[error("\"{value}\" is not a valid {kind}")]
    InvalidEnumValue {
        /// Which setting was being parsed.
        kind: &'static str,
        /// The offending string.
        value: String,
    },

    /// `note_on()` was called without a note.
    #[error("no note given")]
    MissingNote,

    /// Resolving a composite's inputs led back to a unit already being
    /// resolved.
    #[error("cycle detected while resolving {0}")]
    CyclicGraph(String),
}

/// Parses a constrained setting from its kebab-case name, mapping failure to
/// [Error::InvalidEnumValue] and logging the rejection.
pub(crate) fn parse_setting<T: FromStr>(kind: &'static str, value: &str) -> Result<T> {
    T::from_str(value).map_err(|_| {
        log::warn!("rejected {kind} \"{value}\"");
        Error::InvalidEnumValue {
            kind,
            value: value.to_string(),
        }
    })
}
