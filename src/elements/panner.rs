// Copyright (c) 2024 Mike Tsao

use crate::{
    automation::timed_approach,
    engine::{Engine, ParamName, ParamRef, PrimitiveKind},
    traits::{HasInputs, HasOutputs, Port},
    types::{BipolarNormal, PrimitiveUid, Seconds, UnitUid},
};
use patchbay_proc_macros::{Metadata, Params};

/// Places a signal in the stereo field. -1.0 is hard left, 1.0 hard right.
#[derive(Debug, Metadata, Params)]
pub struct Panner {
    uid: UnitUid,
    primitive: PrimitiveUid,
    #[param(custom)]
    pan: ParamRef,
}
impl Panner {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, pan: BipolarNormal) -> Self {
        let primitive = engine.create_primitive(PrimitiveKind::Panner, &[]);
        let r = Self {
            uid: UnitUid::mint(),
            primitive,
            pan: ParamRef::new_with(primitive, ParamName::Pan),
        };
        r.set_pan(engine, pan, Seconds::zero());
        r
    }

    #[allow(missing_docs)]
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }

    #[allow(missing_docs)]
    pub fn pan_param(&self) -> ParamRef {
        self.pan
    }

    #[allow(missing_docs)]
    pub fn pan(&self, engine: &dyn Engine) -> BipolarNormal {
        BipolarNormal::new(engine.param_value(self.pan))
    }

    /// Moves toward `pan`. Out-of-range positions are clamped.
    pub fn set_pan(&self, engine: &mut dyn Engine, pan: BipolarNormal, time: Seconds) {
        timed_approach(engine, self.pan, pan.0, time);
    }
}
impl HasInputs for Panner {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl HasOutputs for Panner {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::OfflineEngine, traits::HasParams};

    #[test]
    fn pan_is_clamped() {
        let mut e = OfflineEngine::default();
        let p = Panner::new_with(&mut e, BipolarNormal::new(-0.5));
        assert_eq!(p.pan(&e).0, -0.5);
        p.set_pan(&mut e, 3.0.into(), Seconds::zero());
        assert_eq!(p.pan(&e), BipolarNormal::maximum());
        assert_eq!(p.params(), vec![("pan", p.pan_param())]);
    }
}
