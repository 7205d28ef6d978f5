//! Feeds input samples through the tracker and every registered recognizer.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, Profile};
use crate::event::GestureEvent;
use crate::exclusion::{ExclusionGraph, RecognizerId};
use crate::geometry::Point;
use crate::recognizer::{GestureState, Outbox, Recognize, Recognizer, Tick, TickCause};
use crate::timer::{ScheduledTask, TimerQueue};
use crate::tracker::{ContactTracker, PointerSample, PointerUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub sample: PointerSample,
}

impl PointerInput {
    pub fn new(phase: PointerPhase, id: u64, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            phase,
            sample: PointerSample::new(id, x, y, timestamp_ms),
        }
    }
}

/// Host touch-move notification, forwarded outside pointer-phase processing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTouchMove {
    #[serde(rename = "t")]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub touches: Vec<Point>,
}

#[derive(Debug)]
struct Slot {
    name: String,
    recognizer: Recognizer,
    claim_touch_move: bool,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    tracker: ContactTracker,
    slots: Vec<Slot>,
    exclusions: ExclusionGraph,
    timers: TimerQueue,
    now_ms: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds recognizers in profile order and wires up its block rules.
    pub fn from_profile(profile: &Profile) -> Result<Self, ConfigError> {
        let mut d = Self::new();
        for entry in &profile.recognizers {
            let rec = Recognizer::from_config(entry.config.clone())?;
            let id = d.register(entry.name.clone(), rec)?;
            d.slots[id.0].claim_touch_move = entry.claim_touch_move;
        }
        for rule in &profile.blocks {
            if rule.mutual {
                d.block_mutual(&rule.recognizer, &rule.blocks)?;
            } else {
                d.block(&rule.recognizer, &rule.blocks)?;
            }
        }
        Ok(d)
    }

    /// Appends a recognizer; evaluation follows registration order.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        recognizer: impl Into<Recognizer>,
    ) -> Result<RecognizerId, ConfigError> {
        let name = name.into();
        if self.id(&name).is_some() {
            return Err(ConfigError::DuplicateName(name));
        }
        let id = RecognizerId(self.slots.len());
        debug!("dispatcher: registered '{name}' as #{}", id.0);
        self.slots.push(Slot {
            name,
            recognizer: recognizer.into(),
            claim_touch_move: false,
        });
        Ok(id)
    }

    /// Opt a recognizer in to the raw touch-move stream.
    pub fn claim_touch_move(&mut self, name: &str) -> Result<(), ConfigError> {
        let id = self.require(name)?;
        self.slots[id.0].claim_touch_move = true;
        Ok(())
    }

    pub fn block(&mut self, blocker: &str, blocked: &str) -> Result<(), ConfigError> {
        let (a, b) = self.edge(blocker, blocked)?;
        self.exclusions.block(a, b)
    }

    pub fn block_mutual(&mut self, a: &str, b: &str) -> Result<(), ConfigError> {
        let (a, b) = self.edge(a, b)?;
        self.exclusions.block_mutual(a, b)
    }

    pub fn id(&self, name: &str) -> Option<RecognizerId> {
        self.slots
            .iter()
            .position(|s| s.name == name)
            .map(RecognizerId)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    pub fn state(&self, name: &str) -> Option<GestureState> {
        let id = self.id(name)?;
        Some(self.slots[id.0].recognizer.state())
    }

    pub fn exclusions(&self) -> &ExclusionGraph {
        &self.exclusions
    }

    pub fn tracker(&self) -> &ContactTracker {
        &self.tracker
    }

    pub fn has_pointers_on_surface(&self) -> bool {
        self.tracker.has_pointers_on_surface()
    }

    /// When the host next needs to call [`Dispatcher::advance_to`].
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Processes one pointer sample. Timers due at or before the sample fire
    /// first.
    pub fn handle(&mut self, input: PointerInput) -> Vec<GestureEvent> {
        let PointerInput { phase, sample } = input;
        trace!(
            "dispatch: {phase:?} pointer {} at ({:.1}, {:.1}) t={}",
            sample.id, sample.x, sample.y, sample.timestamp_ms
        );
        let mut events = self.advance_to(sample.timestamp_ms);

        let (cause, moved) = match phase {
            PointerPhase::Down => {
                if !self.tracker.add_pointer(sample) {
                    return events;
                }
                (TickCause::Down, false)
            }
            PointerPhase::Move => match self.tracker.update_pointer(sample) {
                PointerUpdate::Unknown => return events,
                u => (TickCause::Move, u == PointerUpdate::Moved),
            },
            PointerPhase::Up | PointerPhase::Leave => {
                if !self.tracker.contains(sample.id) {
                    debug!("dispatch: release of unknown pointer {}", sample.id);
                    return events;
                }
                let moved = self.tracker.update_pointer(sample) == PointerUpdate::Moved;
                self.tracker.remove_pointer(sample.id);
                (TickCause::Release, moved)
            }
            PointerPhase::Cancel => {
                events.extend(self.cancel());
                return events;
            }
        };

        let tick = Tick {
            tracker: &self.tracker,
            cause,
            sample: Some(sample),
            moved,
            now_ms: self.now_ms,
        };
        let mut pending = Vec::new();
        for i in 0..self.slots.len() {
            run_one(
                &mut self.slots,
                &self.exclusions,
                &mut self.timers,
                RecognizerId(i),
                &tick,
                &mut pending,
            );
        }
        events.extend(pending.into_iter().map(|(_, e)| e));

        if self.tracker.end_tick() {
            self.reset_recognizers();
        }
        events
    }

    /// Fires every timer due at or before `now_ms`, in due order. Timers
    /// scheduled against an earlier contact are dropped without effect.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        for task in self.timers.take_due(now_ms) {
            self.now_ms = self.now_ms.max(task.due_ms);
            if self.tracker.contact().is_none() || task.generation != self.tracker.generation() {
                debug!(
                    "timer: dropping stale task for #{} (generation {})",
                    task.owner.0, task.generation
                );
                continue;
            }
            let tick = Tick {
                tracker: &self.tracker,
                cause: TickCause::Timer,
                sample: None,
                moved: false,
                now_ms: task.due_ms,
            };
            let mut pending = Vec::new();
            run_one(
                &mut self.slots,
                &self.exclusions,
                &mut self.timers,
                task.owner,
                &tick,
                &mut pending,
            );
            events.extend(pending.into_iter().map(|(_, e)| e));
        }
        self.now_ms = self.now_ms.max(now_ms);
        events
    }

    /// Ends every in-flight recognizer with `Cancelled` and drops the
    /// contact, all within one call.
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        let tick = Tick {
            tracker: &self.tracker,
            cause: TickCause::Cancel,
            sample: None,
            moved: false,
            now_ms: self.now_ms,
        };
        let mut events = Vec::new();
        for slot in &mut self.slots {
            if slot.recognizer.state() == GestureState::Blocked {
                continue;
            }
            let mut out = Outbox::new();
            slot.recognizer.cancel(&slot.name, &tick, &mut out);
            events.extend(out.events);
        }
        self.tracker.cancel();
        self.reset_recognizers();
        events
    }

    /// Forwards the host's raw touch-move notification to opted-in
    /// recognizers. True when one of them is mid-gesture, i.e. the host
    /// should suppress its own touch scrolling.
    pub fn raw_touch_move(&self, raw: &RawTouchMove) -> bool {
        trace!(
            "dispatch: raw touch-move with {} touches at t={}",
            raw.touches.len(),
            raw.timestamp_ms
        );
        self.slots
            .iter()
            .filter(|s| s.claim_touch_move)
            .any(|s| s.recognizer.state().is_recognizing())
    }

    fn reset_recognizers(&mut self) {
        for slot in &mut self.slots {
            slot.recognizer.reset();
        }
        self.timers.clear();
    }

    fn require(&self, name: &str) -> Result<RecognizerId, ConfigError> {
        self.id(name)
            .ok_or_else(|| ConfigError::UnknownRecognizer(name.to_string()))
    }

    fn edge(&self, a: &str, b: &str) -> Result<(RecognizerId, RecognizerId), ConfigError> {
        if a == b {
            return Err(ConfigError::SelfBlock(a.to_string()));
        }
        Ok((self.require(a)?, self.require(b)?))
    }
}

/// Evaluates one recognizer and applies its side effects. A recognizer that
/// leaves `Possible` by recognizing blocks its targets, and anything those
/// targets queued earlier in the same tick is withdrawn.
fn run_one(
    slots: &mut [Slot],
    exclusions: &ExclusionGraph,
    timers: &mut TimerQueue,
    id: RecognizerId,
    tick: &Tick<'_>,
    pending: &mut Vec<(RecognizerId, GestureEvent)>,
) {
    let Some(Slot {
        name, recognizer, ..
    }) = slots.get_mut(id.0)
    else {
        return;
    };
    let before = recognizer.state();
    if before == GestureState::Blocked {
        return;
    }

    let mut out = Outbox::new();
    if tick.cause == TickCause::Timer {
        recognizer.on_timer(name, tick, &mut out);
    } else {
        recognizer.evaluate(name, tick, &mut out);
    }
    let after = recognizer.state();
    if before != after {
        debug!("recognizer '{name}': {before:?} -> {after:?}");
    }

    if out.cancel_timers {
        timers.cancel_owner(id);
    }
    for due_ms in out.schedule {
        timers.schedule(ScheduledTask {
            due_ms,
            owner: id,
            generation: tick.tracker.generation(),
        });
    }
    pending.extend(out.events.into_iter().map(|e| (id, e)));

    let recognized = before == GestureState::Possible
        && matches!(after, GestureState::Began | GestureState::Ended);
    if !recognized {
        return;
    }
    for target in exclusions.blocked_by(id) {
        let slot = &mut slots[target.0];
        let state = slot.recognizer.state();
        if state == GestureState::Possible || state.is_recognizing() {
            debug!("recognizer '{}' blocked by #{}", slot.name, id.0);
            slot.recognizer.block();
            timers.cancel_owner(target);
            pending.retain(|(owner, _)| *owner != target);
        }
    }
}
