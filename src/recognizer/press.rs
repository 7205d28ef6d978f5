use log::debug;

use super::{GestureState, Outbox, Recognize, Tick, TickCause, detail};
use crate::config::{ConfigError, PressConfig};
use crate::event::GestureEvent;

/// Single pointer held still for `duration_ms`. Driven by a timer the
/// dispatcher binds to the contact generation.
#[derive(Debug, Clone)]
pub struct Press {
    cfg: PressConfig,
    state: GestureState,
    armed: bool,
}

impl Press {
    pub fn new(cfg: PressConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GestureState::Possible,
            armed: false,
        })
    }

    fn disarm(&mut self, state: GestureState, out: &mut Outbox) {
        if self.armed {
            out.cancel_timers();
            self.armed = false;
        }
        debug!("press: {state:?}");
        self.state = state;
    }
}

impl Recognize for Press {
    fn event_base_name(&self) -> &'static str {
        "press"
    }

    fn state(&self) -> GestureState {
        self.state
    }

    fn evaluate(&mut self, _name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        if self.state != GestureState::Possible {
            return;
        }
        match tick.cause {
            TickCause::Down => {
                if tick.active_count() > 1 {
                    self.disarm(GestureState::Failed, out);
                } else if !self.armed {
                    out.schedule(tick.now_ms.saturating_add(self.cfg.duration_ms));
                    self.armed = true;
                }
            }
            TickCause::Move => {
                if tick.global().distance > self.cfg.max_move_distance {
                    self.disarm(GestureState::Failed, out);
                }
            }
            TickCause::Release => self.disarm(GestureState::Failed, out),
            TickCause::Timer | TickCause::Cancel => {}
        }
    }

    fn on_timer(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        if self.state != GestureState::Possible || !self.armed {
            return;
        }
        self.armed = false;
        let global = tick.global();
        if tick.active_count() != 1 || global.distance > self.cfg.max_move_distance {
            self.state = GestureState::Failed;
            return;
        }
        self.state = GestureState::Ended;
        debug!("press: recognized after {}ms", global.elapsed_ms);
        out.emit(GestureEvent::Press(detail(
            name,
            "press",
            self.state,
            false,
            tick,
            global,
            tick.live(),
        )));
    }

    fn cancel(&mut self, _name: &str, _tick: &Tick<'_>, out: &mut Outbox) {
        if self.state == GestureState::Possible {
            self.disarm(GestureState::Cancelled, out);
        }
    }

    fn block(&mut self) {
        self.armed = false;
        self.state = GestureState::Blocked;
    }

    fn reset(&mut self) {
        self.armed = false;
        self.state = GestureState::Possible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::testing::{Rig, names};

    fn rig() -> Rig<Press> {
        Rig::new(
            Press::new(PressConfig {
                duration_ms: 500,
                max_move_distance: 10.0,
            })
            .unwrap(),
        )
    }

    #[test]
    fn held_pointer_presses_when_timer_fires() {
        let mut r = rig();
        assert!(r.down(1, 10.0, 10.0, 0).is_empty());
        assert_eq!(r.timers, vec![500]);
        r.mv(1, 12.0, 11.0, 200);

        let ev = r.fire(500);
        assert_eq!(names(&ev), vec!["press"]);
        assert_eq!(ev[0].detail().global.elapsed_ms, 500);
        assert!(ev[0].detail().contact_tracker.has_pointers_on_surface);

        // only once
        assert!(r.fire(900).is_empty());
        assert!(r.up(1, 12.0, 11.0, 1000).is_empty());
    }

    #[test]
    fn moving_away_suppresses_press() {
        let mut r = rig();
        r.down(1, 0.0, 0.0, 0);
        r.mv(1, 20.0, 0.0, 100);
        assert_eq!(r.rec.state(), GestureState::Failed);
        assert!(r.timers.is_empty());
        r.mv(1, 0.0, 0.0, 200);
        assert!(r.fire(500).is_empty());
    }

    #[test]
    fn early_release_suppresses_press() {
        let mut r = rig();
        r.down(1, 0.0, 0.0, 0);
        assert!(r.up(1, 0.0, 0.0, 300).is_empty());
        assert!(r.timers.is_empty());
        assert!(r.fire(500).is_empty());
    }

    #[test]
    fn deadline_clamps_at_the_end_of_time() {
        let mut r = rig();
        let t = u64::MAX - 10;
        assert!(r.down(1, 0.0, 0.0, t).is_empty());
        assert_eq!(r.timers, vec![u64::MAX]);
    }

    #[test]
    fn cancel_disarms() {
        let mut r = rig();
        r.down(1, 0.0, 0.0, 0);
        assert!(r.cancel().is_empty());
        assert!(r.timers.is_empty());
    }
}
