//! Per-pointer contact tracking and derived geometry.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::event::Motion;
use crate::geometry::{self, Point};

pub type PointerId = u64;

/// One timestamped observation of a single contact point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub id: PointerId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "t")]
    pub timestamp_ms: u64,
}

impl PointerSample {
    pub fn new(id: PointerId, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            id,
            x,
            y,
            timestamp_ms,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct PointerTrack {
    pub id: PointerId,
    pub start: PointerSample,
    pub previous: PointerSample,
    pub current: PointerSample,
    // false once released; pruned at the end of the tick
    active: bool,
}

impl PointerTrack {
    fn new(sample: PointerSample) -> Self {
        Self {
            id: sample.id,
            start: sample,
            previous: sample,
            current: sample,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// All pointers pressed on the surface, from first down to all up.
#[derive(Debug, Clone)]
pub struct Contact {
    pub generation: u64,
    pub start_time_ms: u64,
    tracks: Vec<PointerTrack>,
}

/// Outcome of feeding a move sample to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerUpdate {
    Unknown,
    Stationary,
    Moved,
}

/// Geometry of exactly two active pointers, in registration order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairGeometry {
    pub ids: (PointerId, PointerId),
    pub distance: f64,
    /// degrees, (-180, 180]
    pub angle: f64,
    pub centroid: Point,
}

impl PairGeometry {
    pub fn is_degenerate(&self) -> bool {
        self.distance <= geometry::EPSILON
    }
}

#[derive(Debug, Default)]
pub struct ContactTracker {
    contact: Option<Contact>,
    generation: u64,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pointer. Returns false (no-op) for an id that is
    /// already registered.
    pub fn add_pointer(&mut self, sample: PointerSample) -> bool {
        if let Some(c) = &self.contact {
            if c.tracks.iter().any(|t| t.id == sample.id) {
                debug!("tracker: duplicate down for pointer {}", sample.id);
                return false;
            }
        }
        if self.contact.is_none() {
            self.generation += 1;
            debug!(
                "tracker: contact #{} started at {}ms",
                self.generation, sample.timestamp_ms
            );
            self.contact = Some(Contact {
                generation: self.generation,
                start_time_ms: sample.timestamp_ms,
                tracks: Vec::new(),
            });
        }
        if let Some(c) = &mut self.contact {
            c.tracks.push(PointerTrack::new(sample));
        }
        trace!("tracker: pointer {} down", sample.id);
        true
    }

    /// A sample at the current position only refreshes the timestamp, so
    /// `previous` keeps spanning the last segment that actually moved.
    pub fn update_pointer(&mut self, sample: PointerSample) -> PointerUpdate {
        let Some(track) = self.track_mut(sample.id) else {
            debug!("tracker: ignoring sample for unknown pointer {}", sample.id);
            return PointerUpdate::Unknown;
        };
        if !track.active {
            return PointerUpdate::Unknown;
        }
        if track.current.x == sample.x && track.current.y == sample.y {
            track.current.timestamp_ms = track.current.timestamp_ms.max(sample.timestamp_ms);
            return PointerUpdate::Stationary;
        }
        track.previous = track.current;
        track.current = sample;
        PointerUpdate::Moved
    }

    pub fn remove_pointer(&mut self, id: PointerId) -> bool {
        match self.track_mut(id) {
            Some(t) if t.active => {
                t.active = false;
                trace!("tracker: pointer {id} up");
                true
            }
            _ => {
                debug!("tracker: ignoring release of unknown pointer {id}");
                false
            }
        }
    }

    /// Drops every pointer at once.
    pub fn cancel(&mut self) {
        if let Some(c) = self.contact.take() {
            debug!("tracker: contact #{} cancelled", c.generation);
        }
    }

    /// Prunes released pointers. Returns true when this destroyed the contact.
    pub fn end_tick(&mut self) -> bool {
        let Some(c) = &mut self.contact else {
            return false;
        };
        c.tracks.retain(|t| t.active);
        if c.tracks.is_empty() {
            debug!("tracker: contact #{} ended", c.generation);
            self.contact = None;
            return true;
        }
        false
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    /// Bumped each time a new contact starts.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.active_tracks().any(|t| t.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.active_tracks().count()
    }

    pub fn active_ids(&self) -> Vec<PointerId> {
        self.active_tracks().map(|t| t.id).collect()
    }

    pub fn has_pointers_on_surface(&self) -> bool {
        self.active_count() > 0
    }

    pub fn track(&self, id: PointerId) -> Option<&PointerTrack> {
        self.tracks().iter().find(|t| t.id == id)
    }

    pub fn distance_between(&self, a: PointerId, b: PointerId) -> Option<f64> {
        let (pa, pb) = self.active_pair_points(a, b)?;
        Some(geometry::distance(pa, pb))
    }

    pub fn angle_between(&self, a: PointerId, b: PointerId) -> Option<f64> {
        let (pa, pb) = self.active_pair_points(a, b)?;
        Some(geometry::angle(pa, pb))
    }

    /// Centroid of the active pointers' current positions.
    pub fn centroid(&self) -> Option<Point> {
        geometry::centroid(self.active_tracks().map(|t| t.current.point()))
    }

    /// Present only while exactly two pointers are active.
    pub fn pair(&self) -> Option<PairGeometry> {
        let mut it = self.active_tracks();
        let a = it.next()?;
        let b = it.next()?;
        if it.next().is_some() {
            return None;
        }
        let (pa, pb) = (a.current.point(), b.current.point());
        Some(PairGeometry {
            ids: (a.id, b.id),
            distance: geometry::distance(pa, pb),
            angle: geometry::angle(pa, pb),
            centroid: geometry::centroid([pa, pb]).unwrap_or(pa),
        })
    }

    /// Centroid motion since the contact started. Pointers released during
    /// the current tick still take part.
    pub fn global_motion(&self, now_ms: u64) -> Motion {
        let Some(c) = &self.contact else {
            return Motion::default();
        };
        let from = geometry::centroid(c.tracks.iter().map(|t| t.start.point()));
        let to = geometry::centroid(c.tracks.iter().map(|t| t.current.point()));
        match (from, to) {
            (Some(from), Some(to)) => {
                Motion::between(from, to, now_ms.saturating_sub(c.start_time_ms))
            }
            _ => Motion::default(),
        }
    }

    /// Centroid motion over the most recently updated pointer's last segment.
    pub fn live_motion(&self) -> Motion {
        let tracks = self.tracks();
        let from = geometry::centroid(tracks.iter().map(|t| t.previous.point()));
        let to = geometry::centroid(tracks.iter().map(|t| t.current.point()));
        let elapsed = tracks
            .iter()
            .max_by_key(|t| t.current.timestamp_ms)
            .map(|t| t.current.timestamp_ms.saturating_sub(t.previous.timestamp_ms))
            .unwrap_or(0);
        match (from, to) {
            (Some(from), Some(to)) => Motion::between(from, to, elapsed),
            _ => Motion::default(),
        }
    }

    /// Motion of one pointer since its own down sample. Still available for
    /// a pointer released during the current tick.
    pub fn pointer_global_motion(&self, id: PointerId, now_ms: u64) -> Option<Motion> {
        let t = self.track(id)?;
        Some(Motion::between(
            t.start.point(),
            t.current.point(),
            now_ms.saturating_sub(t.start.timestamp_ms),
        ))
    }

    /// Motion of one pointer over its last moving segment.
    pub fn pointer_live_motion(&self, id: PointerId) -> Option<Motion> {
        let t = self.track(id)?;
        Some(Motion::between(
            t.previous.point(),
            t.current.point(),
            t.current.timestamp_ms.saturating_sub(t.previous.timestamp_ms),
        ))
    }

    fn tracks(&self) -> &[PointerTrack] {
        match &self.contact {
            Some(c) => &c.tracks,
            None => &[],
        }
    }

    fn active_tracks(&self) -> impl Iterator<Item = &PointerTrack> {
        self.tracks().iter().filter(|t| t.active)
    }

    fn track_mut(&mut self, id: PointerId) -> Option<&mut PointerTrack> {
        self.contact
            .as_mut()
            .and_then(|c| c.tracks.iter_mut().find(|t| t.id == id))
    }

    fn active_pair_points(&self, a: PointerId, b: PointerId) -> Option<(Point, Point)> {
        if a == b || self.active_count() < 2 {
            return None;
        }
        let ta = self.active_tracks().find(|t| t.id == a)?;
        let tb = self.active_tracks().find(|t| t.id == b)?;
        Some((ta.current.point(), tb.current.point()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(id: PointerId, x: f64, y: f64, t: u64) -> PointerSample {
        PointerSample::new(id, x, y, t)
    }

    #[test]
    fn contact_lives_while_pointers_are_down() {
        let mut tr = ContactTracker::new();
        assert!(!tr.has_pointers_on_surface());
        assert!(tr.add_pointer(s(1, 0.0, 0.0, 0)));
        assert_eq!(tr.generation(), 1);
        assert!(tr.add_pointer(s(2, 10.0, 0.0, 5)));
        assert_eq!(tr.active_ids(), vec![1, 2]);

        assert!(tr.remove_pointer(1));
        assert!(!tr.end_tick());
        assert!(tr.has_pointers_on_surface());

        assert!(tr.remove_pointer(2));
        assert!(!tr.has_pointers_on_surface());
        assert!(tr.end_tick());
        assert!(tr.contact().is_none());

        tr.add_pointer(s(3, 0.0, 0.0, 100));
        assert_eq!(tr.generation(), 2);
    }

    #[test]
    fn duplicate_and_unknown_ids_are_ignored() {
        let mut tr = ContactTracker::new();
        tr.add_pointer(s(1, 0.0, 0.0, 0));
        assert!(!tr.add_pointer(s(1, 5.0, 5.0, 1)));
        assert_eq!(tr.update_pointer(s(9, 1.0, 1.0, 2)), PointerUpdate::Unknown);
        assert!(!tr.remove_pointer(9));
        assert_eq!(tr.active_count(), 1);
        assert_eq!(tr.track(1).unwrap().current.x, 0.0);
    }

    #[test]
    fn update_keeps_previous_sample() {
        let mut tr = ContactTracker::new();
        tr.add_pointer(s(1, 0.0, 0.0, 0));
        assert_eq!(tr.update_pointer(s(1, 10.0, 0.0, 10)), PointerUpdate::Moved);
        assert_eq!(tr.update_pointer(s(1, 25.0, 0.0, 20)), PointerUpdate::Moved);
        let t = tr.track(1).unwrap();
        assert_eq!(t.start.x, 0.0);
        assert_eq!(t.previous.x, 10.0);
        assert_eq!(t.current.x, 25.0);

        let live = tr.live_motion();
        assert_eq!(live.delta_x, 15.0);
        assert_eq!(live.elapsed_ms, 10);
        assert!((live.velocity - 1.5).abs() < 1e-9);

        let global = tr.global_motion(20);
        assert_eq!(global.distance, 25.0);
        assert_eq!(global.elapsed_ms, 20);
    }

    #[test]
    fn stationary_sample_stretches_last_segment() {
        let mut tr = ContactTracker::new();
        tr.add_pointer(s(1, 0.0, 0.0, 0));
        tr.update_pointer(s(1, 30.0, 0.0, 50));
        assert_eq!(
            tr.update_pointer(s(1, 30.0, 0.0, 300)),
            PointerUpdate::Stationary
        );
        let live = tr.live_motion();
        assert_eq!(live.distance, 30.0);
        assert_eq!(live.elapsed_ms, 300);
    }

    #[test]
    fn pointer_motion_ignores_other_pointers() {
        let mut tr = ContactTracker::new();
        tr.add_pointer(s(1, 0.0, 0.0, 0));
        tr.update_pointer(s(1, 40.0, 0.0, 20));
        tr.add_pointer(s(2, 300.0, 300.0, 30));

        let g = tr.pointer_global_motion(1, 30).unwrap();
        assert_eq!(g.delta_x, 40.0);
        assert_eq!(g.delta_y, 0.0);
        assert_eq!(g.elapsed_ms, 30);
        let live = tr.pointer_live_motion(1).unwrap();
        assert_eq!(live.delta_x, 40.0);
        assert_eq!(live.elapsed_ms, 20);

        // the contact-wide centroid is pulled toward the newcomer
        assert!(tr.global_motion(30).delta_x != 40.0);

        tr.remove_pointer(1);
        assert!(tr.pointer_global_motion(1, 40).is_some());
        assert!(tr.pointer_global_motion(9, 40).is_none());
    }

    #[test]
    fn pairwise_geometry_needs_two_pointers() {
        let mut tr = ContactTracker::new();
        tr.add_pointer(s(1, 0.0, 0.0, 0));
        assert!(tr.distance_between(1, 2).is_none());
        assert!(tr.pair().is_none());

        tr.add_pointer(s(2, 0.0, 100.0, 0));
        assert_eq!(tr.distance_between(1, 2), Some(100.0));
        assert!((tr.angle_between(1, 2).unwrap() - 90.0).abs() < 1e-9);
        assert!(tr.distance_between(1, 1).is_none());
        assert_eq!(tr.centroid(), Some(Point::new(0.0, 50.0)));

        let pair = tr.pair().unwrap();
        assert_eq!(pair.ids, (1, 2));
        assert!(!pair.is_degenerate());

        tr.add_pointer(s(3, 5.0, 5.0, 0));
        assert!(tr.pair().is_none());
    }

    #[test]
    fn cancel_drops_everything() {
        let mut tr = ContactTracker::new();
        tr.add_pointer(s(1, 0.0, 0.0, 0));
        tr.add_pointer(s(2, 1.0, 0.0, 0));
        tr.cancel();
        assert!(!tr.has_pointers_on_surface());
        assert_eq!(tr.update_pointer(s(1, 3.0, 0.0, 1)), PointerUpdate::Unknown);
        assert!(!tr.end_tick());
    }
}
