//! Baseline bookkeeping shared by the two-pointer recognizers.

use super::Tick;
use crate::event::Motion;
use crate::tracker::PairGeometry;

#[derive(Debug, Clone, Copy)]
struct Snap {
    geom: PairGeometry,
    at_ms: u64,
}

/// One measurable two-pointer frame against the recorded baseline.
#[derive(Debug, Clone, Copy)]
pub(super) struct PairFrame {
    pub start: PairGeometry,
    pub last: PairGeometry,
    pub current: PairGeometry,
    /// Centroid motion since the baseline.
    pub global: Motion,
    /// Centroid motion since the previous frame.
    pub live: Motion,
}

#[derive(Debug, Clone, Default)]
pub(super) struct PairBaseline {
    start: Option<Snap>,
    last: Option<Snap>,
}

impl PairBaseline {
    /// Returns None while fewer or more than two pointers are active, and on
    /// the tick that (re)records the baseline. A coincident baseline is
    /// re-recorded until the pointers separate.
    pub fn observe(&mut self, tick: &Tick<'_>) -> Option<PairFrame> {
        let Some(current) = tick.tracker.pair() else {
            self.clear();
            return None;
        };
        let snap = Snap {
            geom: current,
            at_ms: tick.now_ms,
        };
        let start = match self.start {
            Some(s) if s.geom.ids == current.ids && !s.geom.is_degenerate() => s,
            _ => {
                self.start = Some(snap);
                self.last = Some(snap);
                return None;
            }
        };
        let last = self.last.unwrap_or(start);
        Some(PairFrame {
            start: start.geom,
            last: last.geom,
            current,
            global: Motion::between(
                start.geom.centroid,
                current.centroid,
                tick.now_ms.saturating_sub(start.at_ms),
            ),
            live: Motion::between(
                last.geom.centroid,
                current.centroid,
                tick.now_ms.saturating_sub(last.at_ms),
            ),
        })
    }

    pub fn commit(&mut self, tick: &Tick<'_>, frame: &PairFrame) {
        self.last = Some(Snap {
            geom: frame.current,
            at_ms: tick.now_ms,
        });
    }

    /// Frame ending at the last committed geometry, for end events emitted
    /// after a pointer has gone.
    pub fn final_frame(&self, now_ms: u64) -> Option<PairFrame> {
        let start = self.start?;
        let last = self.last.unwrap_or(start);
        Some(PairFrame {
            start: start.geom,
            last: last.geom,
            current: last.geom,
            global: Motion::between(
                start.geom.centroid,
                last.geom.centroid,
                now_ms.saturating_sub(start.at_ms),
            ),
            live: Motion::between(
                last.geom.centroid,
                last.geom.centroid,
                now_ms.saturating_sub(last.at_ms),
            ),
        })
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.last = None;
    }
}
