// Copyright (c) 2024 Mike Tsao

//! Unique identifiers for signal units, engine primitives and timers, and the
//! factory that keeps them unique.

use core::sync::atomic::Ordering;
use core::{hash::Hash, marker::PhantomData, sync::atomic::AtomicUsize};
use serde::{Deserialize, Serialize};
use synonym::Synonym;

/// Identifies a signal unit (primitive-backed or composite). The connection
/// resolver uses it to detect cycles, and timers use it to find their owner.
#[derive(Synonym, Serialize, Deserialize, Eq, PartialEq)]
// See
// https://doc.rust-lang.org/stable/std/marker/trait.StructuralPartialEq.html
// for explanation why we derive PartialEq rather than letting Synonym do it.
#[synonym(skip(PartialEq))]
#[serde(rename_all = "kebab-case")]
pub struct UnitUid(pub usize);
impl IsUid for UnitUid {
    fn as_usize(&self) -> usize {
        self.0
    }
}
impl UnitUid {
    /// Mints a process-wide unique [UnitUid].
    pub fn mint() -> Self {
        static FACTORY: UidFactory<UnitUid> = UidFactory::new(1);
        FACTORY.mint_next()
    }
}

/// A handle to a primitive unit that lives inside the rendering engine.
#[derive(Synonym, Serialize, Deserialize, Eq, PartialEq)]
#[synonym(skip(PartialEq))]
#[serde(rename_all = "kebab-case")]
pub struct PrimitiveUid(pub usize);
impl IsUid for PrimitiveUid {
    fn as_usize(&self) -> usize {
        self.0
    }
}

/// A handle to a pending engine timer.
#[derive(Synonym, Serialize, Deserialize, Eq, PartialEq)]
#[synonym(skip(PartialEq))]
#[serde(rename_all = "kebab-case")]
pub struct TimerHandle(pub usize);
impl IsUid for TimerHandle {
    fn as_usize(&self) -> usize {
        self.0
    }
}

/// An optional Uid trait.
pub trait IsUid: Eq + Hash + Clone + From<usize> {
    /// Returns the raw uid.
    fn as_usize(&self) -> usize;
}

/// Generates unique uids.
#[derive(Debug)]
pub struct UidFactory<U: IsUid> {
    next_uid_value: AtomicUsize,
    _phantom: PhantomData<U>,
}
impl<U: IsUid> UidFactory<U> {
    /// Creates a new [UidFactory] starting with the given value.
    pub const fn new(first_uid: usize) -> Self {
        Self {
            next_uid_value: AtomicUsize::new(first_uid),
            _phantom: PhantomData,
        }
    }

    /// Generates the next unique uid.
    pub fn mint_next(&self) -> U {
        let uid_value = self.next_uid_value.fetch_add(1, Ordering::Relaxed);
        U::from(uid_value)
    }

    /// Returns the value the next call to [UidFactory::mint_next()] will use.
    pub fn peek_next(&self) -> usize {
        self.next_uid_value.load(Ordering::Relaxed)
    }
}
impl<U: IsUid> Default for UidFactory<U> {
    fn default() -> Self {
        Self::new(1)
    }
}
