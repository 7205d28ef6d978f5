//! Gesture events handed to the host and their payloads.

use serde::Serialize;

use crate::geometry::{self, Direction, Point};
use crate::recognizer::GestureState;
use crate::tracker::{ContactTracker, PointerId};

/// Displacement, scale and rotation between two observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    pub delta_x: f64,
    pub delta_y: f64,
    pub distance: f64,
    pub direction: Direction,
    pub scale: f64,
    pub rotation: f64,
    pub center: Point,
    pub elapsed_ms: u64,
    /// px/ms over `elapsed_ms`; 0 when no time has passed.
    pub velocity: f64,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            delta_x: 0.0,
            delta_y: 0.0,
            distance: 0.0,
            direction: Direction::None,
            scale: 1.0,
            rotation: 0.0,
            center: Point::default(),
            elapsed_ms: 0,
            velocity: 0.0,
        }
    }
}

impl Motion {
    pub fn between(from: Point, to: Point, elapsed_ms: u64) -> Self {
        let delta_x = to.x - from.x;
        let delta_y = to.y - from.y;
        let distance = geometry::distance(from, to);
        Self {
            delta_x,
            delta_y,
            distance,
            direction: Direction::from_vector(delta_x, delta_y),
            scale: 1.0,
            rotation: 0.0,
            center: to,
            elapsed_ms,
            velocity: geometry::ratio_or(distance, elapsed_ms as f64, 0.0),
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerDetail {
    pub name: String,
    pub event_base_name: &'static str,
    pub is_swipe: bool,
    pub state: GestureState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactTrackerDetail {
    pub active_pointer_input: Vec<PointerId>,
    pub has_pointers_on_surface: bool,
}

impl ContactTrackerDetail {
    pub fn of(tracker: &ContactTracker) -> Self {
        Self {
            active_pointer_input: tracker.active_ids(),
            has_pointers_on_surface: tracker.has_pointers_on_surface(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub global: Motion,
    pub live: Motion,
    pub recognizer: RecognizerDetail,
    pub contact_tracker: ContactTrackerDetail,
}

/// Where in a recognizer's lifecycle an event sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Update,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "lowercase")]
pub enum GestureEvent {
    Tap(EventDetail),
    Press(EventDetail),
    PanStart(EventDetail),
    Pan(EventDetail),
    PanEnd(EventDetail),
    Swipe(EventDetail),
    PinchStart(EventDetail),
    Pinch(EventDetail),
    PinchEnd(EventDetail),
    RotateStart(EventDetail),
    Rotate(EventDetail),
    RotateEnd(EventDetail),
    TwoFingerPanStart(EventDetail),
    TwoFingerPan(EventDetail),
    TwoFingerPanEnd(EventDetail),
}

impl GestureEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GestureEvent::Tap(_) => "tap",
            GestureEvent::Press(_) => "press",
            GestureEvent::PanStart(_) => "panstart",
            GestureEvent::Pan(_) => "pan",
            GestureEvent::PanEnd(_) => "panend",
            GestureEvent::Swipe(_) => "swipe",
            GestureEvent::PinchStart(_) => "pinchstart",
            GestureEvent::Pinch(_) => "pinch",
            GestureEvent::PinchEnd(_) => "pinchend",
            GestureEvent::RotateStart(_) => "rotatestart",
            GestureEvent::Rotate(_) => "rotate",
            GestureEvent::RotateEnd(_) => "rotateend",
            GestureEvent::TwoFingerPanStart(_) => "twofingerpanstart",
            GestureEvent::TwoFingerPan(_) => "twofingerpan",
            GestureEvent::TwoFingerPanEnd(_) => "twofingerpanend",
        }
    }

    pub fn detail(&self) -> &EventDetail {
        match self {
            GestureEvent::Tap(d)
            | GestureEvent::Press(d)
            | GestureEvent::PanStart(d)
            | GestureEvent::Pan(d)
            | GestureEvent::PanEnd(d)
            | GestureEvent::Swipe(d)
            | GestureEvent::PinchStart(d)
            | GestureEvent::Pinch(d)
            | GestureEvent::PinchEnd(d)
            | GestureEvent::RotateStart(d)
            | GestureEvent::Rotate(d)
            | GestureEvent::RotateEnd(d)
            | GestureEvent::TwoFingerPanStart(d)
            | GestureEvent::TwoFingerPan(d)
            | GestureEvent::TwoFingerPanEnd(d) => d,
        }
    }

    /// Picks the variant for a continuous gesture's lifecycle stage.
    pub(crate) fn continuous(base: &str, stage: Stage, detail: EventDetail) -> Option<Self> {
        let ev = match (base, stage) {
            ("pan", Stage::Start) => GestureEvent::PanStart(detail),
            ("pan", Stage::Update) => GestureEvent::Pan(detail),
            ("pan", Stage::End) => GestureEvent::PanEnd(detail),
            ("pinch", Stage::Start) => GestureEvent::PinchStart(detail),
            ("pinch", Stage::Update) => GestureEvent::Pinch(detail),
            ("pinch", Stage::End) => GestureEvent::PinchEnd(detail),
            ("rotate", Stage::Start) => GestureEvent::RotateStart(detail),
            ("rotate", Stage::Update) => GestureEvent::Rotate(detail),
            ("rotate", Stage::End) => GestureEvent::RotateEnd(detail),
            ("twofingerpan", Stage::Start) => GestureEvent::TwoFingerPanStart(detail),
            ("twofingerpan", Stage::Update) => GestureEvent::TwoFingerPan(detail),
            ("twofingerpan", Stage::End) => GestureEvent::TwoFingerPanEnd(detail),
            _ => return None,
        };
        Some(ev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> EventDetail {
        EventDetail {
            global: Motion::default(),
            live: Motion::default(),
            recognizer: RecognizerDetail {
                name: "pan".into(),
                event_base_name: "pan",
                is_swipe: false,
                state: GestureState::Began,
            },
            contact_tracker: ContactTrackerDetail {
                active_pointer_input: vec![1],
                has_pointers_on_surface: true,
            },
        }
    }

    #[test]
    fn motion_between_never_divides_by_zero() {
        let m = Motion::between(Point::new(0.0, 0.0), Point::new(3.0, 4.0), 0);
        assert_eq!(m.distance, 5.0);
        assert_eq!(m.velocity, 0.0);
        assert_eq!(m.direction, Direction::Down);
    }

    #[test]
    fn continuous_names_line_up() {
        let ev = GestureEvent::continuous("twofingerpan", Stage::End, detail()).unwrap();
        assert_eq!(ev.name(), "twofingerpanend");
        assert!(GestureEvent::continuous("tap", Stage::Start, detail()).is_none());
    }

    #[test]
    fn serializes_with_type_tag_and_camel_case() {
        let ev = GestureEvent::PanStart(detail());
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "panstart");
        assert_eq!(v["detail"]["recognizer"]["eventBaseName"], "pan");
        assert_eq!(v["detail"]["recognizer"]["state"], "began");
        assert_eq!(v["detail"]["contactTracker"]["hasPointersOnSurface"], true);
        assert_eq!(v["detail"]["global"]["direction"], "none");
    }
}
