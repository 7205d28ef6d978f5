use log::debug;

use super::{GestureState, Outbox, Recognize, Tick, TickCause, detail};
use crate::config::{ConfigError, PanConfig};
use crate::event::{GestureEvent, Motion, Stage};
use crate::tracker::PointerId;

/// Single-pointer drag. A release faster than `swipe_velocity` over the
/// final segment additionally emits `swipe`.
#[derive(Debug, Clone)]
pub struct Pan {
    cfg: PanConfig,
    state: GestureState,
    is_swipe: bool,
    // the pointer being dragged, fixed once the pan begins
    pointer: Option<PointerId>,
}

impl Pan {
    pub fn new(cfg: PanConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GestureState::Possible,
            is_swipe: false,
            pointer: None,
        })
    }

    /// Global and live motion of the dragged pointer alone, so a pointer
    /// landing mid-pan does not skew the reported drag.
    fn motion(&self, tick: &Tick<'_>) -> (Motion, Motion) {
        let own = self.pointer.and_then(|id| {
            Some((
                tick.tracker.pointer_global_motion(id, tick.now_ms)?,
                tick.tracker.pointer_live_motion(id)?,
            ))
        });
        own.unwrap_or_else(|| (tick.global(), tick.live()))
    }

    fn stage(&self, name: &str, stage: Stage, tick: &Tick<'_>, out: &mut Outbox) {
        let (global, live) = self.motion(tick);
        let d = detail(name, "pan", self.state, self.is_swipe, tick, global, live);
        if let Some(ev) = GestureEvent::continuous("pan", stage, d) {
            out.emit(ev);
        }
    }

    fn finish(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox, released: bool) {
        let (global, live) = self.motion(tick);
        self.is_swipe = released && live.velocity > self.cfg.swipe_velocity;
        self.state = GestureState::Ended;
        debug!(
            "pan: ended (velocity {:.3}px/ms, swipe={})",
            live.velocity, self.is_swipe
        );
        self.stage(name, Stage::End, tick, out);
        if self.is_swipe {
            out.emit(GestureEvent::Swipe(detail(
                name,
                "pan",
                self.state,
                true,
                tick,
                global,
                live,
            )));
        }
    }
}

impl Recognize for Pan {
    fn event_base_name(&self) -> &'static str {
        "pan"
    }

    fn state(&self) -> GestureState {
        self.state
    }

    fn evaluate(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        match self.state {
            GestureState::Possible => {
                if tick.cause != TickCause::Move || tick.active_count() != 1 {
                    return;
                }
                let Some(&id) = tick.tracker.active_ids().first() else {
                    return;
                };
                let Some(global) = tick.tracker.pointer_global_motion(id, tick.now_ms) else {
                    return;
                };
                if global.distance >= self.cfg.min_distance
                    && self.cfg.allows(global.direction)
                {
                    self.pointer = Some(id);
                    self.state = GestureState::Began;
                    debug!("pan: began heading {}", global.direction.as_str());
                    self.stage(name, Stage::Start, tick, out);
                }
            }
            GestureState::Began | GestureState::Changed => {
                let count = tick.active_count();
                if tick.cause == TickCause::Release && count == 0 {
                    self.finish(name, tick, out, true);
                } else if count != 1 {
                    self.finish(name, tick, out, false);
                } else if tick.moved {
                    self.state = GestureState::Changed;
                    self.stage(name, Stage::Update, tick, out);
                }
            }
            _ => {}
        }
    }

    fn cancel(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        if self.state.is_recognizing() {
            self.state = GestureState::Cancelled;
            self.stage(name, Stage::End, tick, out);
        } else if self.state == GestureState::Possible {
            self.state = GestureState::Cancelled;
        }
    }

    fn block(&mut self) {
        self.state = GestureState::Blocked;
    }

    fn reset(&mut self) {
        self.state = GestureState::Possible;
        self.is_swipe = false;
        self.pointer = None;
    }
}
