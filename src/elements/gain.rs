// Copyright (c) 2024 Mike Tsao

use crate::{
    engine::{Engine, ParamName, ParamRef, PrimitiveKind},
    traits::{HasInputs, HasOutputs, Port},
    types::{PrimitiveUid, UnitUid},
};
use patchbay_proc_macros::{Metadata, Params};

/// Multiplies its input by the `gain` parameter.
///
/// Gains are the glue of most composites: mix points, envelope targets, and
/// the dry and wet legs of effects are all gains.
#[derive(Debug, Metadata, Params)]
pub struct Gain {
    uid: UnitUid,
    primitive: PrimitiveUid,
    #[param]
    gain: ParamRef,
}
impl Gain {
    /// Creates a gain stage starting at `initial_gain`.
    pub fn new_with(engine: &mut dyn Engine, initial_gain: f64) -> Self {
        let primitive = engine.create_primitive(PrimitiveKind::Gain, &[]);
        let gain = ParamRef::new_with(primitive, ParamName::Gain);
        let now = engine.now();
        engine.schedule_value_at_time(gain, initial_gain, now);
        Self {
            uid: UnitUid::mint(),
            primitive,
            gain,
        }
    }

    /// The engine primitive behind this unit.
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }
}
impl HasInputs for Gain {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl HasOutputs for Gain {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
