use log::debug;

use super::{GestureState, Outbox, Recognize, Tick, TickCause, detail};
use crate::config::{ConfigError, TapConfig};
use crate::event::GestureEvent;

/// Single-pointer down/up within a distance and duration bound.
#[derive(Debug, Clone)]
pub struct Tap {
    cfg: TapConfig,
    state: GestureState,
}

impl Tap {
    pub fn new(cfg: TapConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GestureState::Possible,
        })
    }

    fn fail(&mut self, why: &str) {
        debug!("tap: failed ({why})");
        self.state = GestureState::Failed;
    }
}

impl Recognize for Tap {
    fn event_base_name(&self) -> &'static str {
        "tap"
    }

    fn state(&self) -> GestureState {
        self.state
    }

    fn evaluate(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        if self.state != GestureState::Possible {
            return;
        }
        let global = tick.global();
        let too_far = global.distance > self.cfg.max_distance;
        let too_long = global.elapsed_ms > self.cfg.max_duration_ms;

        match tick.cause {
            TickCause::Down => {
                if tick.active_count() > 1 {
                    self.fail("second pointer");
                }
            }
            TickCause::Move => {
                if too_far {
                    self.fail("moved too far");
                } else if too_long {
                    self.fail("held too long");
                }
            }
            TickCause::Release => {
                if tick.active_count() > 0 {
                    self.fail("multi-pointer release");
                } else if too_far || too_long {
                    self.fail("release out of bounds");
                } else {
                    self.state = GestureState::Ended;
                    debug!("tap: recognized after {}ms", global.elapsed_ms);
                    out.emit(GestureEvent::Tap(detail(
                        name,
                        "tap",
                        self.state,
                        false,
                        tick,
                        global,
                        tick.live(),
                    )));
                }
            }
            TickCause::Timer | TickCause::Cancel => {}
        }
    }

    fn cancel(&mut self, _name: &str, _tick: &Tick<'_>, _out: &mut Outbox) {
        if self.state == GestureState::Possible {
            self.state = GestureState::Cancelled;
        }
    }

    fn block(&mut self) {
        self.state = GestureState::Blocked;
    }

    fn reset(&mut self) {
        self.state = GestureState::Possible;
    }
}
