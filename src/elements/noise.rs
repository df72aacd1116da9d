// Copyright (c) 2024 Mike Tsao

use crate::{
    engine::{Engine, NoiseType, ParamName, ParamRef, PrimitiveKind, PrimitiveSetting},
    error::{parse_setting, Result},
    traits::{HasInputs, HasOutputs, Port},
    types::{PrimitiveUid, UnitUid},
};
use patchbay_proc_macros::{Metadata, Params};

/// A looping noise source. The engine supplies the buffer for the chosen
/// color.
#[derive(Debug, Metadata, Params)]
pub struct Noise {
    uid: UnitUid,
    primitive: PrimitiveUid,
    noise_type: NoiseType,
    #[param]
    playback_rate: ParamRef,
}
impl Noise {
    #[allow(missing_docs)]
    pub fn new_with(engine: &mut dyn Engine, noise_type: NoiseType) -> Self {
        let primitive = engine.create_primitive(
            PrimitiveKind::BufferSource,
            &[
                PrimitiveSetting::NoiseType(noise_type),
                PrimitiveSetting::Loop(true),
            ],
        );
        Self {
            uid: UnitUid::mint(),
            primitive,
            noise_type,
            playback_rate: ParamRef::new_with(primitive, ParamName::PlaybackRate),
        }
    }

    #[allow(missing_docs)]
    pub fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    #[allow(missing_docs)]
    pub fn set_noise_type(&mut self, engine: &mut dyn Engine, noise_type: NoiseType) {
        self.noise_type = noise_type;
        engine.configure(self.primitive, PrimitiveSetting::NoiseType(noise_type));
    }

    #[allow(missing_docs)]
    pub fn type_(&self) -> &'static str {
        self.noise_type.into()
    }

    /// Sets the color by name: "white", "pink" or "brown".
    pub fn set_type(&mut self, engine: &mut dyn Engine, name: &str) -> Result<()> {
        let noise_type = parse_setting("noise type", name)?;
        self.set_noise_type(engine, noise_type);
        Ok(())
    }
}
impl HasInputs for Noise {}
impl HasOutputs for Noise {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
