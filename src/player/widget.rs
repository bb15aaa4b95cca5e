//! External playback widget boundary.

/// Commands the engine issues to the embedding player widget.
///
/// The widget is supplied by the environment (an embedded video player, a
/// headless test double); the engine only ever drives it through this trait
/// and mirrors its reported state.
pub trait MediaWidget {
    /// Load a playable handle and start playback.
    fn load_by_id(&mut self, id: &str);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek_to(&mut self, seconds: f64);

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Total duration in seconds, 0 when unknown.
    fn duration(&self) -> f64;

    /// Volume in the 0..=100 range.
    fn set_volume(&mut self, volume: u8);
}

/// State changes reported by the widget's event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Ready,
    Playing,
    Paused,
    Ended,
    Error(String),
}
