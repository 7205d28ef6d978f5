use log::debug;

use super::pair::{PairBaseline, PairFrame};
use super::{GestureState, Outbox, Recognize, Tick, detail};
use crate::config::{ConfigError, PinchConfig};
use crate::event::{GestureEvent, Stage};
use crate::geometry;

/// Two-pointer scale gesture.
#[derive(Debug, Clone)]
pub struct Pinch {
    cfg: PinchConfig,
    state: GestureState,
    pair: PairBaseline,
}

impl Pinch {
    pub fn new(cfg: PinchConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GestureState::Possible,
            pair: PairBaseline::default(),
        })
    }

    fn emit(&self, name: &str, stage: Stage, tick: &Tick<'_>, f: &PairFrame, out: &mut Outbox) {
        let scale = f.current.distance / f.start.distance;
        let live_scale = geometry::ratio_or(f.current.distance, f.last.distance, 1.0);
        let d = detail(
            name,
            "pinch",
            self.state,
            false,
            tick,
            f.global.with_scale(scale),
            f.live.with_scale(live_scale),
        );
        if let Some(ev) = GestureEvent::continuous("pinch", stage, d) {
            out.emit(ev);
        }
    }

    fn end(&mut self, name: &str, state: GestureState, tick: &Tick<'_>, out: &mut Outbox) {
        self.state = state;
        debug!("pinch: {state:?}");
        if let Some(f) = self.pair.final_frame(tick.now_ms) {
            self.emit(name, Stage::End, tick, &f, out);
        }
        self.pair.clear();
    }
}

impl Recognize for Pinch {
    fn event_base_name(&self) -> &'static str {
        "pinch"
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
                let scale = f.current.distance / f.start.distance;
                if (scale - 1.0).abs() > self.cfg.min_scale_delta {
                    self.state = GestureState::Began;
                    debug!("pinch: began at scale {scale:.3}");
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
