// Copyright (c) 2024 Mike Tsao

use crate::{
    automation::dry_wet_blend,
    elements::Gain,
    engine::{Engine, Sink},
    traits::{HasInputs, HasOutputs, Port},
    types::{Normal, Seconds, UnitUid},
};
use patchbay_proc_macros::{Metadata, Params};

/// The dry/wet frame every effect sits in.
///
/// Signal enters through one gain and splits. The dry leg goes straight to
/// the output. The other leg leaves through [DryWet::effect_send()], passes
/// through the effect, and comes back through [DryWet::effect_return()] to
/// be mixed in. The mix follows [dry_wet_blend()].
#[derive(Debug, Metadata, Params)]
pub struct DryWet {
    uid: UnitUid,
    input: Gain,
    dry: Gain,
    wet: Gain,
    output: Gain,
    mix: Normal,
}
impl DryWet {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, mix: Normal) -> Self {
        let input = Gain::new_with(engine, 1.0);
        let dry = Gain::new_with(engine, 1.0);
        let wet = Gain::new_with(engine, 1.0);
        let output = Gain::new_with(engine, 1.0);
        engine.primitive_connect(input.primitive(), Sink::Input(dry.primitive()), 0, 0);
        engine.primitive_connect(dry.primitive(), Sink::Input(output.primitive()), 0, 0);
        engine.primitive_connect(wet.primitive(), Sink::Input(output.primitive()), 0, 0);
        let mut r = Self {
            uid: UnitUid::mint(),
            input,
            dry,
            wet,
            output,
            mix,
        };
        r.set_wet(engine, mix, Seconds::zero());
        r
    }

    /// Where the effect's input should be fed from.
    pub fn effect_send(&self) -> &Gain {
        &self.input
    }

    /// Where the effect's output should go.
    pub fn effect_return(&self) -> &Gain {
        &self.wet
    }

    /// The dry leg.
    pub fn dry(&self) -> &Gain {
        &self.dry
    }

    /// The current mix. 0.0 is dry only and 1.0 is wet only.
    pub fn wet(&self) -> Normal {
        self.mix
    }

    /// Moves the mix, gliding with time constant `time`.
    pub fn set_wet(&mut self, engine: &mut dyn Engine, mix: Normal, time: Seconds) {
        self.mix = mix;
        dry_wet_blend(
            engine,
            self.dry.gain_param(),
            self.wet.gain_param(),
            mix,
            time,
        );
    }
}
impl HasInputs for DryWet {
    fn inputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.input)]
    }
}
impl HasOutputs for DryWet {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Unit(&self.output)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OfflineEngine;

    #[test]
    fn mix_follows_the_blend() {
        let mut e = OfflineEngine::default();
        let mut dw = DryWet::new_with(&mut e, Normal::new(0.25));
        assert_eq!(
            (dw.dry().gain(&e), dw.effect_return().gain(&e)),
            (1.0, 0.5)
        );
        dw.set_wet(&mut e, Normal::new(0.75), Seconds::zero());
        assert_eq!(
            (dw.dry().gain(&e), dw.effect_return().gain(&e)),
            (0.5, 1.0)
        );
        assert_eq!(dw.wet(), Normal::new(0.75));
        assert!(e.is_connected(dw.dry().primitive(), Sink::Input(dw.output.primitive())));
    }
}
