//! Recognizer state machine contract and the closed set of recognizers.

mod pair;
mod pan;
mod pinch;
mod press;
mod rotate;
mod tap;
mod two_finger_pan;

pub use pan::Pan;
pub use pinch::Pinch;
pub use press::Press;
pub use rotate::Rotate;
pub use tap::Tap;
pub use two_finger_pan::TwoFingerPan;

use serde::Serialize;

use crate::config::{ConfigError, RecognizerConfig};
use crate::event::{ContactTrackerDetail, EventDetail, GestureEvent, Motion, RecognizerDetail};
use crate::tracker::{ContactTracker, PointerSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureState {
    #[default]
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
    Blocked,
}

impl GestureState {
    /// Began or Changed.
    pub fn is_recognizing(self) -> bool {
        matches!(self, GestureState::Began | GestureState::Changed)
    }

    /// Ended, Cancelled, Failed or Blocked: nothing more happens until the
    /// contact resets.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GestureState::Ended
                | GestureState::Cancelled
                | GestureState::Failed
                | GestureState::Blocked
        )
    }
}

/// What caused the current evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCause {
    Down,
    Move,
    /// up or leave
    Release,
    Timer,
    /// host-level cancel of the whole contact
    Cancel,
}

/// Read-only view handed to a recognizer for one evaluation. The tracker
/// already reflects the sample.
#[derive(Debug, Clone, Copy)]
pub struct Tick<'a> {
    pub tracker: &'a ContactTracker,
    pub cause: TickCause,
    pub sample: Option<PointerSample>,
    /// The sample changed a pointer's position.
    pub moved: bool,
    pub now_ms: u64,
}

impl Tick<'_> {
    pub fn active_count(&self) -> usize {
        self.tracker.active_count()
    }

    pub fn global(&self) -> Motion {
        self.tracker.global_motion(self.now_ms)
    }

    pub fn live(&self) -> Motion {
        self.tracker.live_motion()
    }
}

/// Side effects of one evaluation, applied by the dispatcher.
#[derive(Debug, Default)]
pub struct Outbox {
    pub(crate) events: Vec<GestureEvent>,
    pub(crate) schedule: Vec<u64>,
    pub(crate) cancel_timers: bool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: GestureEvent) {
        self.events.push(event);
    }

    /// Requests a timer callback at `due_ms`, bound to the current contact.
    pub fn schedule(&mut self, due_ms: u64) {
        self.schedule.push(due_ms);
    }

    /// Drops this recognizer's pending timers.
    pub fn cancel_timers(&mut self) {
        self.cancel_timers = true;
        self.schedule.clear();
    }

    pub fn events(&self) -> &[GestureEvent] {
        &self.events
    }
}

/// Shared interface of every recognizer.
pub trait Recognize {
    /// Event base name, e.g. `pan` for `panstart` / `pan` / `panend`.
    fn event_base_name(&self) -> &'static str;

    fn state(&self) -> GestureState;

    /// Feed one input tick.
    fn evaluate(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox);

    fn on_timer(&mut self, _name: &str, _tick: &Tick<'_>, _out: &mut Outbox) {}

    /// Host-level cancel: end whatever is in flight with `Cancelled`.
    fn cancel(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox);

    /// Another recognizer claimed the contact. No end event follows, even
    /// for a recognizer that already began: the host sees its `<base>start`
    /// without a matching `<base>end` and should treat the claiming
    /// recognizer's start as the close of it.
    fn block(&mut self);

    /// Contact destroyed; back to `Possible`.
    fn reset(&mut self);
}

/// One of the concrete recognizers.
#[derive(Debug, Clone)]
pub enum Recognizer {
    Tap(Tap),
    Press(Press),
    Pan(Pan),
    Pinch(Pinch),
    Rotate(Rotate),
    TwoFingerPan(TwoFingerPan),
}

macro_rules! delegate {
    ($self:ident, $r:ident => $body:expr) => {
        match $self {
            Recognizer::Tap($r) => $body,
            Recognizer::Press($r) => $body,
            Recognizer::Pan($r) => $body,
            Recognizer::Pinch($r) => $body,
            Recognizer::Rotate($r) => $body,
            Recognizer::TwoFingerPan($r) => $body,
        }
    };
}

impl Recognize for Recognizer {
    fn event_base_name(&self) -> &'static str {
        delegate!(self, r => r.event_base_name())
    }

    fn state(&self) -> GestureState {
        delegate!(self, r => r.state())
    }

    fn evaluate(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        delegate!(self, r => r.evaluate(name, tick, out))
    }

    fn on_timer(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        delegate!(self, r => r.on_timer(name, tick, out))
    }

    fn cancel(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        delegate!(self, r => r.cancel(name, tick, out))
    }

    fn block(&mut self) {
        delegate!(self, r => r.block())
    }

    fn reset(&mut self) {
        delegate!(self, r => r.reset())
    }
}

macro_rules! impl_from {
    ($($variant:ident),*) => {
        $(impl From<$variant> for Recognizer {
            fn from(r: $variant) -> Self {
                Recognizer::$variant(r)
            }
        })*
    };
}

impl_from!(Tap, Press, Pan, Pinch, Rotate, TwoFingerPan);

impl Recognizer {
    /// Validates the thresholds and builds the matching recognizer.
    pub fn from_config(cfg: RecognizerConfig) -> Result<Self, ConfigError> {
        Ok(match cfg {
            RecognizerConfig::Tap(c) => Tap::new(c)?.into(),
            RecognizerConfig::Press(c) => Press::new(c)?.into(),
            RecognizerConfig::Pan(c) => Pan::new(c)?.into(),
            RecognizerConfig::Pinch(c) => Pinch::new(c)?.into(),
            RecognizerConfig::Rotate(c) => Rotate::new(c)?.into(),
            RecognizerConfig::TwoFingerPan(c) => TwoFingerPan::new(c)?.into(),
        })
    }
}

pub(crate) fn detail(
    name: &str,
    base: &'static str,
    state: GestureState,
    is_swipe: bool,
    tick: &Tick<'_>,
    global: Motion,
    live: Motion,
) -> EventDetail {
    EventDetail {
        global,
        live,
        recognizer: RecognizerDetail {
            name: name.to_string(),
            event_base_name: base,
            is_swipe,
            state,
        },
        contact_tracker: ContactTrackerDetail::of(tick.tracker),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drives a single recognizer against a private tracker.

    use super::*;
    use crate::tracker::{ContactTracker, PointerId, PointerUpdate};

    pub struct Rig<R> {
        pub tracker: ContactTracker,
        pub rec: R,
        pub timers: Vec<u64>,
        pub now: u64,
    }

    impl<R: Recognize> Rig<R> {
        pub fn new(rec: R) -> Self {
            Self {
                tracker: ContactTracker::new(),
                rec,
                timers: Vec::new(),
                now: 0,
            }
        }

        fn run(&mut self, cause: TickCause, sample: Option<PointerSample>, moved: bool) -> Vec<GestureEvent> {
            let tick = Tick {
                tracker: &self.tracker,
                cause,
                sample,
                moved,
                now_ms: self.now,
            };
            let mut out = Outbox::new();
            if cause == TickCause::Timer {
                self.rec.on_timer("test", &tick, &mut out);
            } else {
                self.rec.evaluate("test", &tick, &mut out);
            }
            if out.cancel_timers {
                self.timers.clear();
            }
            self.timers.extend(out.schedule.iter().copied());
            if self.tracker.end_tick() {
                self.rec.reset();
                self.timers.clear();
            }
            out.events
        }

        pub fn down(&mut self, id: PointerId, x: f64, y: f64, t: u64) -> Vec<GestureEvent> {
            self.now = t;
            let s = PointerSample::new(id, x, y, t);
            self.tracker.add_pointer(s);
            self.run(TickCause::Down, Some(s), false)
        }

        pub fn mv(&mut self, id: PointerId, x: f64, y: f64, t: u64) -> Vec<GestureEvent> {
            self.now = t;
            let s = PointerSample::new(id, x, y, t);
            let moved = self.tracker.update_pointer(s) == PointerUpdate::Moved;
            self.run(TickCause::Move, Some(s), moved)
        }

        pub fn up(&mut self, id: PointerId, x: f64, y: f64, t: u64) -> Vec<GestureEvent> {
            self.now = t;
            let s = PointerSample::new(id, x, y, t);
            let moved = self.tracker.update_pointer(s) == PointerUpdate::Moved;
            self.tracker.remove_pointer(id);
            self.run(TickCause::Release, Some(s), moved)
        }

        pub fn fire(&mut self, t: u64) -> Vec<GestureEvent> {
            self.now = t;
            self.timers.retain(|due| *due > t);
            self.run(TickCause::Timer, None, false)
        }

        pub fn cancel(&mut self) -> Vec<GestureEvent> {
            let tick = Tick {
                tracker: &self.tracker,
                cause: TickCause::Cancel,
                sample: None,
                moved: false,
                now_ms: self.now,
            };
            let mut out = Outbox::new();
            self.rec.cancel("test", &tick, &mut out);
            self.tracker.cancel();
            self.rec.reset();
            self.timers.clear();
            out.events
        }
    }

    pub fn names(events: &[GestureEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.name()).collect()
    }
}
