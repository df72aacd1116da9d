// Copyright (c) 2024 Mike Tsao

//! Expands connection endpoints into primitives.

use super::Destination;
use crate::{
    engine::{Engine, Sink},
    error::{Error, Result},
    traits::{Port, SignalUnit},
    types::{PrimitiveUid, UnitUid},
};

/// Everything one connect or disconnect call will touch, worked out before
/// the engine sees any of it.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Plan {
    pub(crate) outputs: Vec<PrimitiveUid>,
    pub(crate) sinks: Vec<Sink>,
}
impl Plan {
    /// Pairs every output with every sink.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (PrimitiveUid, Sink)> + '_ {
        self.outputs
            .iter()
            .flat_map(|o| self.sinks.iter().map(move |s| (*o, *s)))
    }
}

/// Resolves both ends of a connection. An empty destination resolves to an
/// empty plan without looking at the source.
pub(crate) fn plan<S: SignalUnit + ?Sized>(
    engine: &dyn Engine,
    source: &S,
    destination: &Destination,
) -> Result<Plan> {
    let mut sinks = Vec::default();
    resolve_destination(engine, destination, &mut sinks)?;
    if sinks.is_empty() {
        return Ok(Plan::default());
    }
    let outputs = resolve_outputs(source)?;
    Ok(Plan { outputs, sinks })
}

/// The primitives that carry a unit's output signal, in declaration order
/// with duplicates removed.
pub(crate) fn resolve_outputs<S: SignalUnit + ?Sized>(source: &S) -> Result<Vec<PrimitiveUid>> {
    let mut outputs = Vec::default();
    let mut path = Vec::default();
    collect_outputs(source, &mut path, &mut outputs)?;
    Ok(outputs)
}

fn collect_outputs<S: SignalUnit + ?Sized>(
    unit: &S,
    path: &mut Vec<UnitUid>,
    outputs: &mut Vec<PrimitiveUid>,
) -> Result<()> {
    enter(unit, path)?;
    let ports = unit.outputs();
    if ports.is_empty() {
        return Err(Error::NoOutputs(describe(unit)));
    }
    for port in ports {
        match port {
            Port::Primitive(uid) => push_unique(outputs, uid),
            Port::Unit(child) => collect_outputs(child, path, outputs)?,
        }
    }
    path.pop();
    Ok(())
}

fn resolve_destination(
    engine: &dyn Engine,
    destination: &Destination,
    sinks: &mut Vec<Sink>,
) -> Result<()> {
    match destination {
        Destination::Unit(unit) => {
            let mut path = Vec::default();
            collect_inputs(engine, *unit, &mut path, sinks)
        }
        Destination::Input(uid) => {
            push_unique(sinks, validated_input(engine, *uid)?);
            Ok(())
        }
        Destination::Param(param) => {
            if engine.has_param(*param) {
                push_unique(sinks, Sink::Param(*param));
                Ok(())
            } else {
                Err(Error::InvalidDestination(format!(
                    "primitive {} has no {} parameter",
                    param.unit.0, param.name
                )))
            }
        }
        Destination::Many(members) => members
            .iter()
            .try_for_each(|d| resolve_destination(engine, d, sinks)),
    }
}

fn collect_inputs(
    engine: &dyn Engine,
    unit: &dyn SignalUnit,
    path: &mut Vec<UnitUid>,
    sinks: &mut Vec<Sink>,
) -> Result<()> {
    enter(unit, path)?;
    let ports = unit.inputs();
    if ports.is_empty() {
        return Err(Error::NoInputs(describe(unit)));
    }
    for port in ports {
        match port {
            Port::Primitive(uid) => push_unique(sinks, validated_input(engine, uid)?),
            Port::Unit(child) => collect_inputs(engine, child, path, sinks)?,
        }
    }
    path.pop();
    Ok(())
}

fn validated_input(engine: &dyn Engine, uid: PrimitiveUid) -> Result<Sink> {
    match engine.primitive_kind(uid) {
        Some(kind) if kind.accepts_input() => Ok(Sink::Input(uid)),
        Some(kind) => Err(Error::InvalidDestination(format!(
            "primitive {} is a {kind}, which has no inputs",
            uid.0
        ))),
        None => Err(Error::InvalidDestination(format!(
            "primitive {} does not exist",
            uid.0
        ))),
    }
}

// Marks `unit` as in progress, failing if it already is.
fn enter<S: SignalUnit + ?Sized>(unit: &S, path: &mut Vec<UnitUid>) -> Result<()> {
    let uid = unit.uid();
    if path.contains(&uid) {
        return Err(Error::CyclicGraph(describe(unit)));
    }
    path.push(uid);
    Ok(())
}

fn describe<S: SignalUnit + ?Sized>(unit: &S) -> String {
    format!("{} {}", unit.name(), unit.uid().0)
}

fn push_unique<T: PartialEq>(v: &mut Vec<T>, item: T) {
    if !v.contains(&item) {
        v.push(item);
    }
}
