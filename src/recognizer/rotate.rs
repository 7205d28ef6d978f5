use log::debug;

use super::pair::{PairBaseline, PairFrame};
use super::{GestureState, Outbox, Recognize, Tick, detail};
use crate::config::{ConfigError, RotateConfig};
use crate::event::{GestureEvent, Stage};
use crate::geometry::shortest_angular_delta;

/// Two-pointer rotation of the connecting line, in degrees.
#[derive(Debug, Clone)]
pub struct Rotate {
    cfg: RotateConfig,
    state: GestureState,
    pair: PairBaseline,
}

impl Rotate {
    pub fn new(cfg: RotateConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GestureState::Possible,
            pair: PairBaseline::default(),
        })
    }

    fn emit(&self, name: &str, stage: Stage, tick: &Tick<'_>, f: &PairFrame, out: &mut Outbox) {
        let rotation = shortest_angular_delta(f.current.angle, f.start.angle);
        let live_rotation = shortest_angular_delta(f.current.angle, f.last.angle);
        let d = detail(
            name,
            "rotate",
            self.state,
            false,
            tick,
            f.global.with_rotation(rotation),
            f.live.with_rotation(live_rotation),
        );
        if let Some(ev) = GestureEvent::continuous("rotate", stage, d) {
            out.emit(ev);
        }
    }

    fn end(&mut self, name: &str, state: GestureState, tick: &Tick<'_>, out: &mut Outbox) {
        self.state = state;
        debug!("rotate: {state:?}");
        if let Some(f) = self.pair.final_frame(tick.now_ms) {
            self.emit(name, Stage::End, tick, &f, out);
        }
        self.pair.clear();
    }
}

impl Recognize for Rotate {
    fn event_base_name(&self) -> &'static str {
        "rotate"
    }

    fn state(&self) -> GestureState {
        self.state
    }

    fn evaluate(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        match self.state {
            GestureState::Possible => {
                let Some(f) = self.pair.observe(tick) else {
                    return;
                };
                // the angle of coincident pointers is meaningless
                if f.current.is_degenerate() {
                    return;
                }
                let rotation = shortest_angular_delta(f.current.angle, f.start.angle);
                if rotation.abs() > self.cfg.min_rotation {
                    self.state = GestureState::Began;
                    debug!("rotate: began at {rotation:.1}deg");
                    self.emit(name, Stage::Start, tick, &f, out);
                }
                self.pair.commit(tick, &f);
            }
            GestureState::Began | GestureState::Changed => {
                if tick.active_count() != 2 {
                    self.end(name, GestureState::Ended, tick, out);
                    return;
                }
                if !tick.moved {
                    return;
                }
                if let Some(f) = self.pair.observe(tick) {
                    if f.current.is_degenerate() {
                        return;
                    }
                    self.state = GestureState::Changed;
                    self.emit(name, Stage::Update, tick, &f, out);
                    self.pair.commit(tick, &f);
                }
            }
            _ => {}
        }
    }

    fn cancel(&mut self, name: &str, tick: &Tick<'_>, out: &mut Outbox) {
        if self.state.is_recognizing() {
            self.end(name, GestureState::Cancelled, tick, out);
        } else if self.state == GestureState::Possible {
            self.state = GestureState::Cancelled;
        }
    }

    fn block(&mut self) {
        self.state = GestureState::Blocked;
        self.pair.clear();
    }

    fn reset(&mut self) {
        self.state = GestureState::Possible;
        self.pair.clear();
    }
}
