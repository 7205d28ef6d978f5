//! Multi-pointer gesture recognition: tap, press, pan/swipe, pinch, rotate
//! and two-finger pan over a raw stream of pointer samples.

pub mod config;
pub mod dispatcher;
pub mod event;
pub mod exclusion;
pub mod geometry;
pub mod recognizer;
pub mod timer;
pub mod trace;
pub mod tracker;

pub use config::{ConfigError, Profile};
pub use dispatcher::{Dispatcher, PointerInput, PointerPhase, RawTouchMove};
pub use event::{EventDetail, GestureEvent, Motion};
pub use recognizer::{GestureState, Recognizer};
pub use tracker::{ContactTracker, PointerId, PointerSample};
