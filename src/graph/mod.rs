// Copyright (c) 2024 Mike Tsao

//! Connecting units to each other.
//!
//! A connection always ends up as primitive-to-primitive edges in the engine.
//! The resolver walks composite units down to the primitives that actually
//! carry their signal. Primitive-backed and composite units can therefore be
//! wired the same way. Every call resolves both ends completely before it
//! touches the engine, so a call that fails changes nothing.

use crate::{
    engine::{Engine, ParamRef},
    error::Result,
    traits::SignalUnit,
    types::PrimitiveUid,
};

/// The most commonly used imports.
pub mod prelude {
    pub use super::{chain, Connects, Destination};
}

pub(crate) mod resolver;

/// Where a connection goes.
#[derive(Clone, Debug)]
pub enum Destination<'a> {
    /// A unit, resolved through its declared inputs.
    Unit(&'a dyn SignalUnit),
    /// The signal input of a bare primitive.
    Input(PrimitiveUid),
    /// An automatable parameter. Its value is summed with the signal.
    Param(ParamRef),
    /// Fan-out to each member.
    Many(Vec<Destination<'a>>),
}
impl<'a> Destination<'a> {
    /// A destination for a unit that's already behind a `dyn` reference.
    pub fn unit(unit: &'a dyn SignalUnit) -> Self {
        Destination::Unit(unit)
    }
}
impl<'a, T: SignalUnit> From<&'a T> for Destination<'a> {
    fn from(value: &'a T) -> Self {
        Destination::Unit(value)
    }
}
impl<'a> From<ParamRef> for Destination<'a> {
    fn from(value: ParamRef) -> Self {
        Destination::Param(value)
    }
}
impl<'a> From<PrimitiveUid> for Destination<'a> {
    fn from(value: PrimitiveUid) -> Self {
        Destination::Input(value)
    }
}
impl<'a> From<Vec<Destination<'a>>> for Destination<'a> {
    fn from(value: Vec<Destination<'a>>) -> Self {
        Destination::Many(value)
    }
}

/// Connects `source` to `destination` on the given channels. Returns the
/// number of primitive edges requested.
pub fn connect<'a, S: SignalUnit + ?Sized>(
    engine: &mut dyn Engine,
    source: &S,
    destination: impl Into<Destination<'a>>,
    output: usize,
    input: usize,
) -> Result<usize> {
    let destination = destination.into();
    let plan = resolver::plan(engine, source, &destination).map_err(|e| {
        log::warn!("can't connect {}: {e}", source.name());
        e
    })?;
    let mut count = 0;
    for (o, s) in plan.edges() {
        engine.primitive_connect(o, s, output, input);
        count += 1;
    }
    log::debug!(
        "connected {} {} with {count} edge(s)",
        source.name(),
        source.uid().0
    );
    Ok(count)
}

/// Removes the edges that [connect()] with the same arguments would have
/// made. Edges that don't exist are ignored.
pub fn disconnect<'a, S: SignalUnit + ?Sized>(
    engine: &mut dyn Engine,
    source: &S,
    destination: impl Into<Destination<'a>>,
    output: usize,
    input: usize,
) -> Result<()> {
    let destination = destination.into();
    let plan = resolver::plan(engine, source, &destination).map_err(|e| {
        log::warn!("can't disconnect {}: {e}", source.name());
        e
    })?;
    for (o, s) in plan.edges() {
        engine.primitive_disconnect(o, s, output, input);
    }
    log::debug!("disconnected {} {}", source.name(), source.uid().0);
    Ok(())
}

/// Removes every edge leaving any of `source`'s outputs.
pub fn disconnect_all<S: SignalUnit + ?Sized>(engine: &mut dyn Engine, source: &S) -> Result<()> {
    let outputs = resolver::resolve_outputs(source).map_err(|e| {
        log::warn!("can't disconnect {}: {e}", source.name());
        e
    })?;
    for o in outputs {
        engine.primitive_disconnect_all(o);
    }
    Ok(())
}

/// Connects each unit to the next, on channel 0. All links are checked before
/// any is made. Returns the number of primitive edges requested.
pub fn chain(engine: &mut dyn Engine, units: &[&dyn SignalUnit]) -> Result<usize> {
    let plans = units
        .windows(2)
        .map(|pair| resolver::plan(&*engine, pair[0], &Destination::unit(pair[1])))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| {
            log::warn!("can't chain {} units: {e}", units.len());
            e
        })?;
    let mut count = 0;
    for plan in plans {
        for (o, s) in plan.edges() {
            engine.primitive_connect(o, s, 0, 0);
            count += 1;
        }
    }
    log::debug!("chained {} units with {count} edge(s)", units.len());
    Ok(count)
}

/// The connection methods every unit gets.
pub trait Connects: SignalUnit {
    /// Connects this unit's outputs to `destination`, channel 0 to channel 0.
    /// Returns the number of primitive edges requested.
    fn connect<'a>(
        &self,
        engine: &mut dyn Engine,
        destination: impl Into<Destination<'a>>,
    ) -> Result<usize> {
        self.connect_channels(engine, destination, 0, 0)
    }

    /// Connects this unit's `output` channel to `destination`'s `input`
    /// channel.
    fn connect_channels<'a>(
        &self,
        engine: &mut dyn Engine,
        destination: impl Into<Destination<'a>>,
        output: usize,
        input: usize,
    ) -> Result<usize> {
        connect(engine, self, destination, output, input)
    }

    /// Undoes [Connects::connect()].
    fn disconnect<'a>(
        &self,
        engine: &mut dyn Engine,
        destination: impl Into<Destination<'a>>,
    ) -> Result<()> {
        self.disconnect_channels(engine, destination, 0, 0)
    }

    /// Undoes [Connects::connect_channels()].
    fn disconnect_channels<'a>(
        &self,
        engine: &mut dyn Engine,
        destination: impl Into<Destination<'a>>,
        output: usize,
        input: usize,
    ) -> Result<()> {
        disconnect(engine, self, destination, output, input)
    }

    /// Removes every connection this unit's outputs make.
    fn disconnect_all(&self, engine: &mut dyn Engine) -> Result<()> {
        disconnect_all(engine, self)
    }
}
impl<T: SignalUnit + ?Sized> Connects for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{OfflineEngine, ParamName, PrimitiveKind, Sink},
        error::Error,
        traits::{HasInputs, HasOutputs, Port},
        types::UnitUid,
    };
    use patchbay_proc_macros::{Metadata, Params};

    #[derive(Debug, Metadata, Params)]
    struct Tone {
        uid: UnitUid,
        osc: PrimitiveUid,
        #[param]
        frequency: ParamRef,
    }
    impl Tone {
        fn new_with(engine: &mut dyn Engine) -> Self {
            let osc = engine.create_primitive(PrimitiveKind::Oscillator, &[]);
            Self {
                uid: UnitUid::mint(),
                osc,
                frequency: ParamRef::new_with(osc, ParamName::Frequency),
            }
        }
    }
    impl HasInputs for Tone {}
    impl HasOutputs for Tone {
        fn outputs(&self) -> Vec<Port<'_>> {
            vec![Port::Primitive(self.osc)]
        }
    }

    // Two parallel gains, both fed by its input.
    #[derive(Debug, Metadata, Params)]
    struct Split {
        uid: UnitUid,
        left: PrimitiveUid,
        right: PrimitiveUid,
        #[param]
        gain: ParamRef,
    }
    impl Split {
        fn new_with(engine: &mut dyn Engine) -> Self {
            let left = engine.create_primitive(PrimitiveKind::Gain, &[]);
            let right = engine.create_primitive(PrimitiveKind::Gain, &[]);
            Self {
                uid: UnitUid::mint(),
                left,
                right,
                gain: ParamRef::new_with(left, ParamName::Gain),
            }
        }
    }
    impl HasInputs for Split {
        fn inputs(&self) -> Vec<Port<'_>> {
            vec![Port::Primitive(self.left), Port::Primitive(self.right)]
        }
    }
    impl HasOutputs for Split {
        fn outputs(&self) -> Vec<Port<'_>> {
            vec![Port::Primitive(self.left), Port::Primitive(self.right)]
        }
    }

    // Wraps a Split and also exposes one of its primitives directly.
    #[derive(Debug, Metadata, Params)]
    struct Wrapper {
        uid: UnitUid,
        inner: Split,
    }
    impl HasInputs for Wrapper {
        fn inputs(&self) -> Vec<Port<'_>> {
            vec![Port::Unit(&self.inner), Port::Primitive(self.inner.left)]
        }
    }
    impl HasOutputs for Wrapper {
        fn outputs(&self) -> Vec<Port<'_>> {
            vec![Port::Unit(&self.inner)]
        }
    }

    // Claims itself as its own input.
    #[derive(Debug, Metadata, Params)]
    struct Ouroboros {
        uid: UnitUid,
        out: PrimitiveUid,
    }
    impl HasInputs for Ouroboros {
        fn inputs(&self) -> Vec<Port<'_>> {
            vec![Port::Unit(self)]
        }
    }
    impl HasOutputs for Ouroboros {
        fn outputs(&self) -> Vec<Port<'_>> {
            vec![Port::Primitive(self.out)]
        }
    }

    #[test]
    fn composite_destination_gets_every_pair() {
        let mut e = OfflineEngine::default();
        let a = Split::new_with(&mut e);
        let b = Split::new_with(&mut e);
        assert_eq!(connect(&mut e, &a, &b, 0, 0), Ok(4), "2 outputs x 2 sinks");
        assert_eq!(e.edges().len(), 4);
        for o in [a.left, a.right] {
            for s in [b.left, b.right] {
                assert!(e.is_connected(o, Sink::Input(s)));
            }
        }
    }

    #[test]
    fn nested_sinks_are_wired_once() {
        let mut e = OfflineEngine::default();
        let tone = Tone::new_with(&mut e);
        let w = Wrapper {
            uid: UnitUid::mint(),
            inner: Split::new_with(&mut e),
        };
        assert_eq!(tone.connect(&mut e, &w), Ok(2));
        assert_eq!(
            e.edges().len(),
            2,
            "left is reachable twice but should be wired once"
        );

        assert!(tone.disconnect(&mut e, &w).is_ok());
        assert!(e.edges().is_empty());
    }

    #[test]
    fn pure_sources_are_rejected() {
        let mut e = OfflineEngine::default();
        let a = Tone::new_with(&mut e);
        let b = Tone::new_with(&mut e);
        assert!(matches!(a.connect(&mut e, &b), Err(Error::NoInputs(_))));
        assert!(matches!(
            a.connect(&mut e, b.osc),
            Err(Error::InvalidDestination(_))
        ));
        assert!(e.edges().is_empty());
    }

    #[test]
    fn cycles_are_detected() {
        let mut e = OfflineEngine::default();
        let tone = Tone::new_with(&mut e);
        let o = Ouroboros {
            uid: UnitUid::mint(),
            out: e.create_primitive(PrimitiveKind::Gain, &[]),
        };
        assert!(matches!(
            tone.connect(&mut e, &o),
            Err(Error::CyclicGraph(_))
        ));
        assert!(e.edges().is_empty());
    }

    #[test]
    fn fan_out_is_all_or_nothing() {
        let mut e = OfflineEngine::default();
        let tone = Tone::new_with(&mut e);
        let good = Split::new_with(&mut e);
        let bogus = ParamRef::new_with(good.left, ParamName::Frequency);
        let r = tone.connect(
            &mut e,
            vec![Destination::from(&good), Destination::from(bogus)],
        );
        assert!(matches!(r, Err(Error::InvalidDestination(_))));
        assert!(e.edges().is_empty(), "nothing should be wired");

        assert_eq!(
            tone.connect(&mut e, vec![Destination::from(&good), good.gain_param().into()]),
            Ok(3)
        );
        assert_eq!(e.edges().len(), 3);

        assert_eq!(tone.connect(&mut e, Vec::<Destination>::new()), Ok(0));
        assert_eq!(e.edges().len(), 3, "empty fan-out is a no-op");
    }

    #[test]
    fn params_and_channels() {
        let mut e = OfflineEngine::default();
        let lfo = Tone::new_with(&mut e);
        let carrier = Tone::new_with(&mut e);
        assert_eq!(
            lfo.connect_channels(&mut e, carrier.frequency_param(), 1, 0),
            Ok(1)
        );
        assert_eq!(
            e.edges(),
            &[crate::engine::Edge {
                source: lfo.osc,
                sink: Sink::Param(carrier.frequency_param()),
                output: 1,
                input: 0,
            }]
        );
        assert!(lfo
            .disconnect_channels(&mut e, carrier.frequency_param(), 0, 0)
            .is_ok());
        assert_eq!(e.edges().len(), 1, "different channel, nothing removed");
        assert!(lfo.disconnect_all(&mut e).is_ok());
        assert!(e.edges().is_empty());
    }

    #[test]
    fn chains() {
        let mut e = OfflineEngine::default();
        let tone = Tone::new_with(&mut e);
        let a = Split::new_with(&mut e);
        let b = Split::new_with(&mut e);
        let _ = env_logger::builder().is_test(true).try_init();
        assert_eq!(chain(&mut e, &[&tone, &a, &b]), Ok(2 + 4));
        assert_eq!(e.edges().len(), 2 + 4);

        let c = Tone::new_with(&mut e);
        assert!(chain(&mut e, &[&b, &c]).is_err());
        assert_eq!(e.edges().len(), 6);
    }
}
