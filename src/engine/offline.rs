// Copyright (c) 2024 Mike Tsao

//! An in-memory [Engine] with a virtual clock. It produces no sound. It keeps
//! the edge set and evaluates parameter schedules, which makes it the engine
//! of choice for tests and for checking a patch before it goes live.

use super::{
    AutomatedParam, Engine, FiredTimer, ParamRef, PrimitiveKind, PrimitiveSetting, Schedule, Sink,
    TimerTask,
};
use crate::{
    traits::HandlesTimers,
    types::{PrimitiveUid, Seconds, TimerHandle, UidFactory},
};
use rustc_hash::FxHashMap;

/// One primitive-to-primitive connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Edge {
    #[allow(missing_docs)]
    pub source: PrimitiveUid,
    #[allow(missing_docs)]
    pub sink: Sink,
    #[allow(missing_docs)]
    pub output: usize,
    #[allow(missing_docs)]
    pub input: usize,
}

/// A record of one call to a scheduling method.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationEvent {
    #[allow(missing_docs)]
    pub param: ParamRef,
    #[allow(missing_docs)]
    pub schedule: Schedule,
    /// The engine clock when the call was made.
    pub requested_at: Seconds,
}

#[derive(Debug)]
struct PrimitiveRecord {
    kind: PrimitiveKind,
    settings: Vec<PrimitiveSetting>,
}

#[derive(Debug)]
struct PendingTimer {
    handle: TimerHandle,
    due: Seconds,
    task: TimerTask,
}

/// See the module docs.
#[derive(Debug, Default)]
pub struct OfflineEngine {
    now: Seconds,
    primitive_uid_factory: UidFactory<PrimitiveUid>,
    timer_handle_factory: UidFactory<TimerHandle>,
    primitives: FxHashMap<PrimitiveUid, PrimitiveRecord>,
    params: FxHashMap<ParamRef, AutomatedParam>,
    edges: Vec<Edge>,
    automation: Vec<AutomationEvent>,
    timers: Vec<PendingTimer>,
    fired_timer_count: usize,
}
impl OfflineEngine {
    /// Moves the clock forward by `delta`, firing due timers along the way.
    pub fn advance<H: HandlesTimers + ?Sized>(&mut self, delta: Seconds, handler: &mut H) {
        let target = self.now.after(delta);
        self.advance_to(target, handler);
    }

    /// Moves the clock to `time`, handing every timer that comes due on the
    /// way to `handler`, earliest first (ties in creation order). While a
    /// handler runs, the clock reads the timer's due time, so whatever it
    /// schedules starts exactly there. Timers set by handlers that fall due
    /// before `time` fire in the same call.
    pub fn advance_to<H: HandlesTimers + ?Sized>(&mut self, time: Seconds, handler: &mut H) {
        while let Some(index) = self.next_due_timer(time) {
            let timer = self.timers.remove(index);
            if timer.due.0 > self.now.0 {
                self.now = timer.due;
            }
            self.fired_timer_count += 1;
            log::trace!("firing timer {} at {}", timer.handle.0, timer.due.0);
            let fired = FiredTimer {
                handle: timer.handle,
                task: timer.task,
                time: timer.due,
            };
            if !handler.handle_timer(self, &fired) {
                log::trace!("timer {} had no taker", fired.handle.0);
            }
        }
        if time.0 > self.now.0 {
            self.now = time;
        }
    }

    fn next_due_timer(&self, limit: Seconds) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due.0 <= limit.0)
            .min_by(|(_, a), (_, b)| {
                a.due
                    .0
                    .total_cmp(&b.due.0)
                    .then(a.handle.0.cmp(&b.handle.0))
            })
            .map(|(i, _)| i)
    }

    /// Every edge, in the order it was made.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving `source`.
    pub fn edges_from(&self, source: PrimitiveUid) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| e.source == source)
            .copied()
            .collect()
    }

    /// True if any edge joins `source` to `sink`, on any channels.
    pub fn is_connected(&self, source: PrimitiveUid, sink: Sink) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.sink == sink)
    }

    /// Every scheduling call ever made against `param`, oldest first.
    pub fn automation_events(&self, param: ParamRef) -> Vec<AutomationEvent> {
        self.automation
            .iter()
            .filter(|e| e.param == param)
            .copied()
            .collect()
    }

    /// The value of `param` at any time, given its current schedule.
    pub fn param_value_at(&self, param: ParamRef, time: Seconds) -> f64 {
        self.params
            .get(&param)
            .map_or(0.0, |p| p.value_at(time))
    }

    /// The settings a primitive was created or configured with.
    pub fn settings(&self, primitive: PrimitiveUid) -> &[PrimitiveSetting] {
        self.primitives
            .get(&primitive)
            .map_or(&[], |r| r.settings.as_slice())
    }

    /// How many primitives of `kind` exist.
    pub fn primitive_count(&self, kind: PrimitiveKind) -> usize {
        self.primitives.values().filter(|r| r.kind == kind).count()
    }

    /// How many timers are waiting to fire.
    pub fn pending_timer_count(&self) -> usize {
        self.timers.len()
    }

    /// How many timers have fired since the engine was created.
    pub fn fired_timer_count(&self) -> usize {
        self.fired_timer_count
    }

    fn record(&mut self, param: ParamRef, schedule: Schedule) {
        let now = self.now;
        if let Some(p) = self.params.get_mut(&param) {
            p.schedule(now, schedule);
            self.automation.push(AutomationEvent {
                param,
                schedule,
                requested_at: now,
            });
        } else {
            log::warn!("ignoring automation of unknown parameter {param:?}");
        }
    }
}
impl Engine for OfflineEngine {
    fn now(&self) -> Seconds {
        self.now
    }

    fn create_primitive(
        &mut self,
        kind: PrimitiveKind,
        settings: &[PrimitiveSetting],
    ) -> PrimitiveUid {
        let uid = self.primitive_uid_factory.mint_next();
        for (name, initial_value) in kind.params() {
            self.params.insert(
                ParamRef::new_with(uid, *name),
                AutomatedParam::new_with(*initial_value),
            );
        }
        self.primitives.insert(
            uid,
            PrimitiveRecord {
                kind,
                settings: Vec::default(),
            },
        );
        for setting in settings {
            self.configure(uid, setting.clone());
        }
        uid
    }

    fn configure(&mut self, primitive: PrimitiveUid, setting: PrimitiveSetting) {
        if let Some(record) = self.primitives.get_mut(&primitive) {
            record.settings.retain(|s| !s.is_same_kind(&setting));
            record.settings.push(setting);
        } else {
            log::warn!("ignoring setting for unknown primitive {}", primitive.0);
        }
    }

    fn primitive_kind(&self, primitive: PrimitiveUid) -> Option<PrimitiveKind> {
        self.primitives.get(&primitive).map(|r| r.kind)
    }

    fn primitive_connect(&mut self, source: PrimitiveUid, sink: Sink, output: usize, input: usize) {
        let edge = Edge {
            source,
            sink,
            output,
            input,
        };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    fn primitive_disconnect(
        &mut self,
        source: PrimitiveUid,
        sink: Sink,
        output: usize,
        input: usize,
    ) {
        self.edges.retain(|e| {
            !(e.source == source && e.sink == sink && e.output == output && e.input == input)
        });
    }

    fn primitive_disconnect_all(&mut self, source: PrimitiveUid) {
        self.edges.retain(|e| e.source != source);
    }

    fn schedule_value_at_time(&mut self, param: ParamRef, value: f64, time: Seconds) {
        self.record(param, Schedule::Set { value, time });
    }

    fn schedule_approach_at_time(
        &mut self,
        param: ParamRef,
        target: f64,
        start: Seconds,
        time_constant: Seconds,
    ) {
        self.record(
            param,
            Schedule::Approach {
                target,
                start,
                time_constant,
            },
        );
    }

    fn param_value(&self, param: ParamRef) -> f64 {
        self.param_value_at(param, self.now)
    }

    fn set_timer(&mut self, delay: Seconds, task: TimerTask) -> TimerHandle {
        let handle = self.timer_handle_factory.mint_next();
        let due = self.now.after(Seconds(delay.0.max(0.0)));
        log::trace!("timer {} set for {} ({:?})", handle.0, due.0, task.action);
        self.timers.push(PendingTimer { handle, due, task });
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        if self.timers.len() != before {
            log::trace!("timer {} cancelled", handle.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{ParamName, TimerAction, Waveform},
        types::UnitUid,
    };
    use float_cmp::approx_eq;

    #[derive(Default)]
    struct TimerLog {
        fired: Vec<(TimerHandle, f64)>,
    }
    impl HandlesTimers for TimerLog {
        fn handle_timer(&mut self, engine: &mut dyn Engine, timer: &FiredTimer) -> bool {
            assert_eq!(engine.now(), timer.time, "clock should read the due time");
            self.fired.push((timer.handle, timer.time.0));
            true
        }
    }

    fn task() -> TimerTask {
        TimerTask {
            owner: UnitUid(1),
            action: TimerAction::BeginDecay,
        }
    }

    #[test]
    fn primitives_and_settings() {
        let mut e = OfflineEngine::default();
        let osc = e.create_primitive(
            PrimitiveKind::Oscillator,
            &[PrimitiveSetting::Waveform(Waveform::Square)],
        );
        assert_eq!(e.primitive_kind(osc), Some(PrimitiveKind::Oscillator));
        assert!(e.has_param(ParamRef::new_with(osc, ParamName::Frequency)));
        assert!(!e.has_param(ParamRef::new_with(osc, ParamName::Gain)));
        assert_eq!(
            e.param_value(ParamRef::new_with(osc, ParamName::Frequency)),
            440.0
        );

        e.configure(osc, PrimitiveSetting::Waveform(Waveform::Triangle));
        assert_eq!(
            e.settings(osc),
            &[PrimitiveSetting::Waveform(Waveform::Triangle)],
            "a setting should replace the earlier one of the same kind"
        );
        assert!(!e.has_primitive(PrimitiveUid(9999)));
    }

    #[test]
    fn edges_are_a_set() {
        let mut e = OfflineEngine::default();
        let a = e.create_primitive(PrimitiveKind::Oscillator, &[]);
        let b = e.create_primitive(PrimitiveKind::Gain, &[]);
        e.primitive_connect(a, Sink::Input(b), 0, 0);
        e.primitive_connect(a, Sink::Input(b), 0, 0);
        assert_eq!(e.edges().len(), 1);
        e.primitive_connect(a, Sink::Param(ParamRef::new_with(b, ParamName::Gain)), 0, 0);
        assert_eq!(e.edges_from(a).len(), 2);

        e.primitive_disconnect(a, Sink::Input(b), 0, 1);
        assert_eq!(e.edges().len(), 2, "wrong channel should be a no-op");
        e.primitive_disconnect(a, Sink::Input(b), 0, 0);
        assert!(!e.is_connected(a, Sink::Input(b)));
        e.primitive_disconnect_all(a);
        assert!(e.edges().is_empty());
    }

    #[test]
    fn timers_fire_in_order() {
        let mut e = OfflineEngine::default();
        let late = e.set_timer(Seconds(2.0), task());
        let early = e.set_timer(Seconds(1.0), task());
        let tied = e.set_timer(Seconds(1.0), task());
        let cancelled = e.set_timer(Seconds(0.5), task());
        e.cancel_timer(cancelled);
        e.cancel_timer(cancelled);

        let mut log = TimerLog::default();
        e.advance(Seconds(1.5), &mut log);
        assert_eq!(log.fired, vec![(early, 1.0), (tied, 1.0)]);
        assert!(approx_eq!(f64, e.now().0, 1.5));
        assert_eq!(e.pending_timer_count(), 1);

        e.advance_to(Seconds(5.0), &mut log);
        assert_eq!(log.fired.last(), Some(&(late, 2.0)));
        assert_eq!(e.fired_timer_count(), 3);
    }

    #[test]
    fn scheduling_is_recorded_and_evaluated() {
        let mut e = OfflineEngine::default();
        let g = e.create_primitive(PrimitiveKind::Gain, &[]);
        let gain = ParamRef::new_with(g, ParamName::Gain);
        e.schedule_value_at_time(gain, 0.0, Seconds(0.0));
        e.schedule_approach_at_time(gain, 1.0, Seconds(0.0), Seconds(1.0));
        assert_eq!(e.automation_events(gain).len(), 2);
        assert_eq!(e.param_value(gain), 0.0);
        assert!(approx_eq!(
            f64,
            e.param_value_at(gain, Seconds(1.0)),
            1.0 - (-1.0f64).exp()
        ));

        let bogus = ParamRef::new_with(PrimitiveUid(4242), ParamName::Gain);
        e.schedule_value_at_time(bogus, 1.0, Seconds(0.0));
        assert!(e.automation_events(bogus).is_empty());
    }
}
