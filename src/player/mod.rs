//! Playback engine and the external widget boundary.

pub mod engine;
pub mod widget;

pub use engine::{EngineState, PlaybackEngine, PlayerEvent, ResolveError};
pub use widget::{MediaWidget, WidgetEvent};
