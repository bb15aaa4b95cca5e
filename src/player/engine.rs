//! Playback engine state machine.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::{ApiClientError, CatalogApi};
use crate::queue::{PlaybackQueue, RepeatMode};

use super::widget::{MediaWidget, WidgetEvent};

/// Consecutive failures without a successful play before the engine
/// reports a persistent failure instead of skipping further.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Engine states.
///
/// `Idle -> Resolving -> Playing <-> Paused -> Ended`; any state falls back
/// to `Idle` on hard failure without moving the queue position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Resolving,
    Playing,
    Paused,
    Ended,
}

/// Errors while obtaining a playable handle.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no playable handle found for track")]
    NoHandle,

    #[error("handle lookup failed: {0}")]
    Api(#[from] ApiClientError),
}

/// Events emitted by the engine toward the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(EngineState),
    /// A track successfully transitioned into `Playing`.
    TrackStarted(crate::client::models::Track),
    /// Repeat is off and the final track of the pass finished.
    QueueFinished,
    /// The failure circuit breaker tripped; stop skipping forward.
    PersistentFailure,
}

/// Drives the external widget and tracks playback state.
pub struct PlaybackEngine<C, W> {
    catalog: Arc<C>,
    widget: W,
    state: EngineState,
    failures: u32,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl<C: CatalogApi, W: MediaWidget> PlaybackEngine<C, W> {
    pub fn new(catalog: Arc<C>, widget: W) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                catalog,
                widget,
                state: EngineState::Idle,
                failures: 0,
                events,
            },
            event_rx,
        )
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the failure circuit breaker has tripped.
    pub fn failed_persistently(&self) -> bool {
        self.failures >= MAX_CONSECUTIVE_FAILURES
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Current position and duration, in seconds.
    pub fn progress(&self) -> (f64, f64) {
        (self.widget.current_time(), self.widget.duration())
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            self.state = state;
            let _ = self.events.send(PlayerEvent::StateChanged(state));
        }
    }

    fn record_failure(&mut self) {
        self.failures += 1;
        self.set_state(EngineState::Idle);
        if self.failures == MAX_CONSECUTIVE_FAILURES {
            tracing::error!("{} consecutive playback failures", self.failures);
            let _ = self.events.send(PlayerEvent::PersistentFailure);
        }
    }

    /// Resolve the queue's current track and start it.
    ///
    /// On failure the engine returns to `Idle` and the queue position is
    /// left untouched; the caller decides whether to skip forward.
    pub async fn play_current(&mut self, queue: &mut PlaybackQueue) -> Result<(), ResolveError> {
        let Some(track) = queue.current_track().cloned() else {
            return Ok(());
        };

        self.set_state(EngineState::Resolving);

        let handle = match track.cached_handle() {
            Some(handle) => handle.to_string(),
            None => {
                let resolved = self.catalog.resolve_video(&track.resolve_query()).await;
                match resolved {
                    Ok(Some(id)) => {
                        queue.cache_handle(&track.id, &id);
                        id
                    }
                    Ok(None) => {
                        tracing::error!("No playable handle for {:?}", track.title);
                        self.record_failure();
                        return Err(ResolveError::NoHandle);
                    }
                    Err(e) => {
                        tracing::error!("Handle lookup failed for {:?}: {}", track.title, e);
                        self.record_failure();
                        return Err(ResolveError::Api(e));
                    }
                }
            }
        };

        self.widget.load_by_id(&handle);
        self.widget.play();
        self.failures = 0;
        self.set_state(EngineState::Playing);
        tracing::info!("Playing {:?} by {}", track.title, track.display_artist());
        let _ = self.events.send(PlayerEvent::TrackStarted(track));
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) {
        match self.state {
            EngineState::Playing => {
                self.widget.pause();
                self.set_state(EngineState::Paused);
            }
            EngineState::Paused => {
                self.widget.play();
                self.set_state(EngineState::Playing);
            }
            _ => {}
        }
    }

    pub fn seek_to(&mut self, seconds: f64) {
        self.widget.seek_to(seconds);
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.widget.set_volume(volume.min(100));
    }

    /// Stop playback and return to `Idle`.
    pub fn stop(&mut self) {
        self.widget.pause();
        self.set_state(EngineState::Idle);
    }

    /// Apply a widget state-change event.
    ///
    /// Track end is decided by the repeat mode: `one` replays, `all`
    /// advances with wrap, `off` advances until the final index and then
    /// stops rather than wrapping into a new pass.
    pub async fn handle_widget_event(
        &mut self,
        event: WidgetEvent,
        queue: &mut PlaybackQueue,
    ) -> Result<(), ResolveError> {
        match event {
            WidgetEvent::Ready => Ok(()),
            WidgetEvent::Playing => {
                if matches!(self.state, EngineState::Playing | EngineState::Paused) {
                    self.set_state(EngineState::Playing);
                }
                Ok(())
            }
            WidgetEvent::Paused => {
                if self.state == EngineState::Playing {
                    self.set_state(EngineState::Paused);
                }
                Ok(())
            }
            WidgetEvent::Ended => {
                self.set_state(EngineState::Ended);
                self.on_track_ended(queue).await
            }
            WidgetEvent::Error(message) => {
                tracing::error!("Widget playback error: {}", message);
                self.record_failure();
                Ok(())
            }
        }
    }

    async fn on_track_ended(&mut self, queue: &mut PlaybackQueue) -> Result<(), ResolveError> {
        match queue.repeat() {
            RepeatMode::One => self.play_current(queue).await,
            RepeatMode::All => {
                queue.next();
                self.play_current(queue).await
            }
            RepeatMode::Off => {
                if queue.at_end() || queue.is_empty() {
                    self.set_state(EngineState::Idle);
                    let _ = self.events.send(PlayerEvent::QueueFinished);
                    Ok(())
                } else {
                    queue.next();
                    self.play_current(queue).await
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_tracks, FakeWidget, MockCatalog, WidgetCommand};

    fn engine_with(
        catalog: MockCatalog,
    ) -> (
        PlaybackEngine<MockCatalog, FakeWidget>,
        mpsc::UnboundedReceiver<PlayerEvent>,
    ) {
        PlaybackEngine::new(Arc::new(catalog), FakeWidget::new())
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PlayerEvent>) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn resolves_and_plays_current_track() {
        let (mut engine, mut rx) = engine_with(MockCatalog::new());
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(2), 0);

        engine.play_current(&mut queue).await.unwrap();

        assert_eq!(engine.state(), EngineState::Playing);
        assert_eq!(
            engine.widget().commands(),
            vec![
                WidgetCommand::Load(String::from("video-0")),
                WidgetCommand::Play,
            ]
        );
        // The handle is cached back onto the queue's track.
        assert_eq!(queue.tracks()[0].video_id.as_deref(), Some("video-0"));

        let events = drain(&mut rx);
        assert!(events.contains(&PlayerEvent::StateChanged(EngineState::Playing)));
        assert!(matches!(events.last(), Some(PlayerEvent::TrackStarted(t)) if t.id == "t0"));
    }

    #[tokio::test]
    async fn cached_handle_skips_resolution() {
        let catalog = MockCatalog::new();
        let (mut engine, _rx) = engine_with(catalog);
        let mut queue = PlaybackQueue::new();
        let mut tracks = make_tracks(1);
        tracks[0].video_id = Some(String::from("cached-id"));
        queue.load(tracks, 0);

        engine.play_current(&mut queue).await.unwrap();

        assert_eq!(
            engine.widget().commands()[0],
            WidgetCommand::Load(String::from("cached-id"))
        );
        assert_eq!(engine.catalog.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn resolution_failure_returns_to_idle_without_moving_queue() {
        let catalog = MockCatalog::new().with_video(None);
        let (mut engine, _rx) = engine_with(catalog);
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(3), 1);

        let result = engine.play_current(&mut queue).await;

        assert!(matches!(result, Err(ResolveError::NoHandle)));
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(queue.current_index(), 1);
    }

    #[tokio::test]
    async fn three_failures_trip_the_breaker() {
        let catalog = MockCatalog::new().with_video(None);
        let (mut engine, mut rx) = engine_with(catalog);
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(5), 0);

        for _ in 0..3 {
            let _ = engine.play_current(&mut queue).await;
            queue.next();
        }

        assert!(engine.failed_persistently());
        assert!(drain(&mut rx).contains(&PlayerEvent::PersistentFailure));
    }

    #[tokio::test]
    async fn repeat_one_replays_same_track() {
        let (mut engine, _rx) = engine_with(MockCatalog::new());
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(3), 1);
        queue.cycle_repeat();
        queue.cycle_repeat(); // one

        engine.play_current(&mut queue).await.unwrap();
        engine
            .handle_widget_event(WidgetEvent::Ended, &mut queue)
            .await
            .unwrap();

        assert_eq!(queue.current_index(), 1);
        assert_eq!(engine.state(), EngineState::Playing);
    }

    #[tokio::test]
    async fn repeat_all_wraps_past_the_end() {
        let (mut engine, _rx) = engine_with(MockCatalog::new());
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(2), 1);
        queue.cycle_repeat(); // all

        engine.play_current(&mut queue).await.unwrap();
        engine
            .handle_widget_event(WidgetEvent::Ended, &mut queue)
            .await
            .unwrap();

        assert_eq!(queue.current_index(), 0);
        assert_eq!(engine.state(), EngineState::Playing);
    }

    #[tokio::test]
    async fn repeat_off_stops_at_the_final_track() {
        let (mut engine, mut rx) = engine_with(MockCatalog::new());
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(2), 1);

        engine.play_current(&mut queue).await.unwrap();
        engine
            .handle_widget_event(WidgetEvent::Ended, &mut queue)
            .await
            .unwrap();

        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(queue.current_index(), 1);
        assert!(drain(&mut rx).contains(&PlayerEvent::QueueFinished));
    }

    #[tokio::test]
    async fn pause_resume_round_trip() {
        let (mut engine, _rx) = engine_with(MockCatalog::new());
        let mut queue = PlaybackQueue::new();
        queue.load(make_tracks(1), 0);
        engine.play_current(&mut queue).await.unwrap();

        engine.toggle_play_pause();
        assert_eq!(engine.state(), EngineState::Paused);
        engine.toggle_play_pause();
        assert_eq!(engine.state(), EngineState::Playing);
    }
}
