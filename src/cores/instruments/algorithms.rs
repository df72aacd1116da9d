// Copyright (c) 2024 Mike Tsao

//! The table of FM modulation topologies.
//!
//! Each algorithm wires four modulators, called A through D, to each other
//! and to an output. A route between two modulators feeds the sender's signal
//! into the receiver's frequency parameter. A route to the output makes the
//! sender audible.

use crate::{
    engine::Engine,
    error::{Error, Result},
    graph::{resolver, Destination},
    traits::{Modulates, SignalUnit},
};
use derive_more::Display;
use strum_macros::EnumIter;

/// One of the four modulators an algorithm wires.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, strum_macros::Display, EnumIter, PartialEq, Eq)]
pub enum Op {
    A,
    B,
    C,
    D,
}
impl Op {
    /// The position of this modulator in the array passed to
    /// [apply_algorithm()].
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// One connection in an algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// The first modulator drives the second's frequency.
    Modulate(Op, Op),
    /// The modulator is mixed into the output.
    Output(Op),
}

/// A fixed modulation topology.
#[derive(Debug, Display, PartialEq, Eq)]
#[display(fmt = "{}: {}", name, topology)]
pub struct Algorithm {
    /// Short kebab-case identifier.
    pub name: &'static str,
    /// Describes the wiring for people. Nothing parses it.
    pub topology: &'static str,
    /// The connections, made in this order.
    pub routes: &'static [Route],
}

use Op::{A, B, C, D};
use Route::{Modulate, Output};

/// All algorithms, by index.
pub static ALGORITHMS: [Algorithm; 11] = [
    Algorithm {
        name: "serial",
        topology: "A > B > C > D > out",
        routes: &[Modulate(A, B), Modulate(B, C), Modulate(C, D), Output(D)],
    },
    Algorithm {
        name: "paired-merge",
        topology: "(A + B) > C > D > out",
        routes: &[Modulate(A, C), Modulate(B, C), Modulate(C, D), Output(D)],
    },
    Algorithm {
        name: "branch-then-merge",
        topology: "A > B > C > out, A > D > out",
        routes: &[
            Modulate(A, B),
            Modulate(B, C),
            Output(C),
            Modulate(A, D),
            Output(D),
        ],
    },
    Algorithm {
        name: "diamond",
        topology: "A > (B + C) > D > out",
        routes: &[
            Modulate(A, B),
            Modulate(A, C),
            Modulate(B, D),
            Modulate(C, D),
            Output(D),
        ],
    },
    Algorithm {
        name: "two-stage-split",
        topology: "A > B > (C + D) > out",
        routes: &[
            Modulate(A, B),
            Modulate(B, C),
            Modulate(B, D),
            Output(C),
            Output(D),
        ],
    },
    Algorithm {
        name: "chain-and-bypass",
        topology: "A > B > C > out, D > out",
        routes: &[Modulate(A, B), Modulate(B, C), Output(C), Output(D)],
    },
    Algorithm {
        name: "triple-merge",
        topology: "(A + B + C) > D > out",
        routes: &[Modulate(A, D), Modulate(B, D), Modulate(C, D), Output(D)],
    },
    Algorithm {
        name: "dual-chains",
        topology: "A > B > out, C > D > out",
        routes: &[Modulate(A, B), Output(B), Modulate(C, D), Output(D)],
    },
    Algorithm {
        name: "fan-out-triad",
        topology: "A > (B + C + D) > out",
        routes: &[
            Modulate(A, B),
            Modulate(A, C),
            Modulate(A, D),
            Output(B),
            Output(C),
            Output(D),
        ],
    },
    Algorithm {
        name: "fan-out-and-bypass",
        topology: "A > (B + C) > out, D > out",
        routes: &[
            Modulate(A, B),
            Modulate(A, C),
            Output(B),
            Output(C),
            Output(D),
        ],
    },
    Algorithm {
        name: "parallel",
        topology: "A + B + C + D > out",
        routes: &[Output(A), Output(B), Output(C), Output(D)],
    },
];

/// Looks up an algorithm by index.
pub fn algorithm(index: usize) -> Result<&'static Algorithm> {
    ALGORITHMS.get(index).ok_or(Error::InvalidAlgorithm {
        index,
        count: ALGORITHMS.len(),
    })
}

/// Rewires `modulators` and `output` according to algorithm `index`, and
/// returns its topology description.
///
/// Everything the modulators' outputs were connected to is disconnected
/// first, so only the new algorithm's edges remain. If anything is wrong,
/// including an unknown index, nothing is disconnected.
pub fn apply_algorithm<M: Modulates>(
    engine: &mut dyn Engine,
    index: usize,
    modulators: &[M; 4],
    output: &dyn SignalUnit,
) -> Result<&'static str> {
    let algorithm = algorithm(index).map_err(|e| {
        log::warn!("can't apply algorithm: {e}");
        e
    })?;

    let planned = || -> Result<_> {
        let resets = modulators
            .iter()
            .map(resolver::resolve_outputs)
            .collect::<Result<Vec<_>>>()?;
        let plans = algorithm
            .routes
            .iter()
            .map(|route| match route {
                Route::Modulate(from, to) => resolver::plan(
                    &*engine,
                    &modulators[from.index()],
                    &Destination::Param(modulators[to.index()].frequency_param()),
                ),
                Route::Output(from) => resolver::plan(
                    &*engine,
                    &modulators[from.index()],
                    &Destination::unit(output),
                ),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((resets, plans))
    };
    let (resets, plans) = planned().map_err(|e| {
        log::warn!("can't apply algorithm {}: {e}", algorithm.name);
        e
    })?;

    for source in resets.into_iter().flatten() {
        engine.primitive_disconnect_all(source);
    }
    for plan in plans {
        for (source, sink) in plan.edges() {
            engine.primitive_connect(source, sink, 0, 0);
        }
    }
    log::debug!("applied algorithm {index}, {algorithm}");
    Ok(algorithm.topology)
}
