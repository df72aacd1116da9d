// Copyright (c) 2024 Mike Tsao

use crate::{
    engine::{Engine, ParamRef, PrimitiveKind, PrimitiveSetting},
    traits::{HasInputs, HasMetadata, HasOutputs, HasParams, Port},
    types::{PrimitiveUid, UnitUid},
};

/// Wraps any single engine primitive as a [SignalUnit](crate::traits::SignalUnit).
///
/// Its inputs, outputs and parameters are whatever the primitive's kind
/// has. It's the quickest way to put a convolver, merger, or anything else
/// without a dedicated unit into a graph.
#[derive(Debug)]
pub struct Primitive {
    uid: UnitUid,
    primitive: PrimitiveUid,
    kind: PrimitiveKind,
}
impl Primitive {
    #[allow(missing_docs)]
    pub fn new_with(
        engine: &mut dyn Engine,
        kind: PrimitiveKind,
        settings: &[PrimitiveSetting],
    ) -> Self {
        Self {
            uid: UnitUid::mint(),
            primitive: engine.create_primitive(kind, settings),
            kind,
        }
    }

    /// The engine primitive behind this unit.
    pub fn primitive(&self) -> PrimitiveUid {
        self.primitive
    }

    #[allow(missing_docs)]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }
}
impl HasMetadata for Primitive {
    fn uid(&self) -> UnitUid {
        self.uid
    }

    fn name(&self) -> &'static str {
        self.kind.into()
    }

    fn key(&self) -> &'static str {
        self.kind.into()
    }
}
impl HasInputs for Primitive {
    fn inputs(&self) -> Vec<Port<'_>> {
        if self.kind.accepts_input() {
            vec![Port::Primitive(self.primitive)]
        } else {
            Vec::default()
        }
    }
}
impl HasOutputs for Primitive {
    fn outputs(&self) -> Vec<Port<'_>> {
        vec![Port::Primitive(self.primitive)]
    }
}
impl HasParams for Primitive {
    fn params(&self) -> Vec<(&'static str, ParamRef)> {
        self.kind
            .params()
            .iter()
            .map(|(name, _)| ((*name).into(), ParamRef::new_with(self.primitive, *name)))
            .collect()
    }
}
