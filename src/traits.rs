// Copyright (c) 2024 Mike Tsao

//! The traits that define many characteristics and relationships among parts of
//! the system.

use crate::{
    engine::{Engine, FiredTimer, ParamRef},
    types::{Note, PrimitiveUid, UnitUid},
};

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{
        HandlesTimers, HasInputs, HasMetadata, HasOutputs, HasParams, IsVoice, Modulates,
        PlaysNotes, Port, SignalUnit,
    };
    pub use crate::graph::Connects;
}

/// Provides identity and names of a unit. `#[derive(Metadata)]` implements it
/// for any struct with a `uid: UnitUid` field.
pub trait HasMetadata {
    /// The unit's unique identifier.
    fn uid(&self) -> UnitUid;

    /// A string describing this type, suitable for diagnostics.
    fn name(&self) -> &'static str;

    /// A kebab-case identifier for this type.
    fn key(&self) -> &'static str;
}

/// One declared input or output of a unit. It is either a primitive inside
/// the engine or another unit whose own ports need resolving.
#[derive(Clone, Copy, Debug)]
pub enum Port<'a> {
    /// A primitive: connection ends here.
    Primitive(PrimitiveUid),
    /// A child unit: connection continues through its ports.
    Unit(&'a dyn SignalUnit),
}
impl<'a> From<PrimitiveUid> for Port<'a> {
    fn from(value: PrimitiveUid) -> Self {
        Port::Primitive(value)
    }
}

/// Declares where signal can enter a unit. Units without inputs are pure
/// sources and can't be connection destinations.
pub trait HasInputs {
    #[allow(missing_docs)]
    fn inputs(&self) -> Vec<Port<'_>> {
        Vec::default()
    }
}

/// Declares where signal leaves a unit.
pub trait HasOutputs {
    #[allow(missing_docs)]
    fn outputs(&self) -> Vec<Port<'_>>;
}

/// Lists a unit's automatable parameters by kebab-case name.
/// `#[derive(Params)]` implements it from `#[param]` fields.
pub trait HasParams {
    #[allow(missing_docs)]
    fn params(&self) -> Vec<(&'static str, ParamRef)>;

    /// Looks up a parameter by name.
    fn param(&self, name: &str) -> Option<ParamRef> {
        self.params()
            .into_iter()
            .find_map(|(n, p)| (n == name).then_some(p))
    }
}

/// Anything that can take part in a signal graph, primitive-backed or
/// composite.
pub trait SignalUnit: HasMetadata + HasInputs + HasOutputs + HasParams + core::fmt::Debug {}
impl<T: HasMetadata + HasInputs + HasOutputs + HasParams + core::fmt::Debug> SignalUnit for T {}

/// Receives timers that the engine has fired.
pub trait HandlesTimers {
    /// Acts on `timer` if it belongs to this object. Returns true if it did.
    fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool;
}

/// A monophonic note player.
pub trait PlaysNotes {
    /// The note this voice is holding, if any. A voice without one is idle
    /// and free to take a new note.
    fn current_note(&self) -> Option<Note>;

    /// Takes `note`, tunes to it and starts the attack.
    fn note_on(&mut self, engine: &mut dyn Engine, note: Note);

    /// Lets go of the note and starts the release.
    fn note_off(&mut self, engine: &mut dyn Engine);

    /// Lets go of the note and silences immediately, skipping the release.
    fn note_stop(&mut self, engine: &mut dyn Engine);
}

/// Everything a polyphonic pool needs from its voices.
pub trait IsVoice: SignalUnit + PlaysNotes + HandlesTimers {}
impl<T: SignalUnit + PlaysNotes + HandlesTimers> IsVoice for T {}

/// A unit whose frequency can be modulated by connecting a signal to it.
pub trait Modulates: SignalUnit {
    /// The parameter that modulating signals should be connected to.
    fn frequency_param(&self) -> ParamRef;
}
