use log::debug;

use super::pair::{PairBaseline, PairFrame};
use super::{GestureState, Outbox, Recognize, Tick, detail};
use crate::config::{ConfigError, TwoFingerPanConfig};
use crate::event::{GestureEvent, Stage};

/// Two pointers dragged together, tracked by their centroid.
#[derive(Debug, Clone)]
pub struct TwoFingerPan {
    cfg: TwoFingerPanConfig,
    state: GestureState,
    pair: PairBaseline,
}

impl TwoFingerPan {
    pub fn new(cfg: TwoFingerPanConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GestureState::Possible,
            pair: PairBaseline::default(),
        })
    }

    fn emit(&self, name: &str, stage: Stage, tick: &Tick<'_>, f: &PairFrame, out: &mut Outbox) {
        let d = detail(name, "twofingerpan", self.state, false, tick, f.global, f.live);
        if let Some(ev) = GestureEvent::continuous("twofingerpan", stage, d) {
            out.emit(ev);
        }
    }

    fn end(&mut self, name: &str, state: GestureState, tick: &Tick<'_>, out: &mut Outbox) {
        self.state = state;
        debug!("twofingerpan: {state:?}");
        if let Some(f) = self.pair.final_frame(tick.now_ms) {
            self.emit(name, Stage::End, tick, &f, out);
        }
        self.pair.clear();
    }
}

impl Recognize for TwoFingerPan {
    fn event_base_name(&self) -> &'static str {
        "twofingerpan"
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
                if f.global.distance > self.cfg.min_distance {
                    self.state = GestureState::Began;
                    debug!("twofingerpan: began heading {}", f.global.direction.as_str());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::recognizer::testing::{Rig, names};

    fn rig() -> Rig<TwoFingerPan> {
        Rig::new(TwoFingerPan::new(TwoFingerPanConfig { min_distance: 20.0 }).unwrap())
    }

    #[test]
    fn dragging_both_fingers_pans_the_centroid() {
        let mut r = rig();
        r.down(1, 0.0, 0.0, 0);
        r.down(2, 50.0, 0.0, 0);
        let mut ev = Vec::new();
        for step in 1..=3u64 {
            let dy = 15.0 * step as f64;
            ev.extend(r.mv(1, 0.0, dy, 20 * step));
            ev.extend(r.mv(2, 50.0, dy, 20 * step + 5));
        }
        assert_eq!(
            names(&ev),
            vec!["twofingerpanstart", "twofingerpan", "twofingerpan", "twofingerpan"]
        );
        let last = ev.last().unwrap().detail();
        assert!((last.global.delta_y - 45.0).abs() < 1e-9);
        assert_eq!(last.global.direction, Direction::Down);
        assert!((last.live.delta_y - 7.5).abs() < 1e-9);

        let end = r.up(2, 50.0, 45.0, 100);
        assert_eq!(names(&end), vec!["twofingerpanend"]);
    }

    #[test]
    fn symmetric_spread_keeps_centroid_still() {
        let mut r = rig();
        r.down(1, 100.0, 100.0, 0);
        r.down(2, 200.0, 100.0, 0);
        for step in 1..=5u64 {
            let d = 10.0 * step as f64;
            assert!(r.mv(1, 100.0 - d, 100.0, 10 * step).is_empty());
            assert!(r.mv(2, 200.0 + d, 100.0, 10 * step + 5).is_empty());
        }
        assert_eq!(r.rec.state(), GestureState::Possible);
    }
}
