//! Orchestration layer tying the queue, engine, library, search, and
//! lyrics together behind one facade.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use crate::client::models::{AlbumDetail, ArtistDetail, Suggestion, Track};
use crate::client::{ApiClientError, CatalogApi};
use crate::config::Config;
use crate::library::LibraryStore;
use crate::lyrics::{LyricsEngine, SYNC_POLL_MILLIS};
use crate::player::{MediaWidget, PlaybackEngine, PlayerEvent, WidgetEvent};
use crate::poll::{Poller, PROGRESS_POLL_MILLIS};
use crate::queue::{PlaybackQueue, PreviousOutcome, RepeatMode};
use crate::search::{SearchCategory, SearchOutcome, SearchSession};
use crate::storage::StorageBackend;

const VOLUME_KEY: &str = "volume";

/// Internal tick messages delivered by the pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMessage {
    ProgressTick,
    LyricsTick,
}

/// One user session: playback, library, search, and lyrics state.
///
/// All mutation goes through `&mut self`, so the session is driven from a
/// single task; pollers only post tick messages back onto its channel.
pub struct Session<C, W, S> {
    catalog: Arc<C>,
    pub config: Config,
    pub queue: PlaybackQueue,
    pub library: LibraryStore<S>,
    pub search: SearchSession<C>,
    pub lyrics: LyricsEngine<C>,
    engine: PlaybackEngine<C, W>,
    engine_events: mpsc::UnboundedReceiver<PlayerEvent>,
    msg_tx: mpsc::UnboundedSender<SessionMessage>,
    msg_rx: mpsc::UnboundedReceiver<SessionMessage>,
    progress_poller: Poller,
    lyrics_poller: Poller,
    /// Last sampled (position, duration) in seconds.
    progress: (f64, f64),
}

impl<C: CatalogApi, W: MediaWidget, S: StorageBackend> Session<C, W, S> {
    pub fn new(catalog: Arc<C>, widget: W, store: S, config: Config) -> Self {
        let library = LibraryStore::new(store);
        let (mut engine, engine_events) = PlaybackEngine::new(Arc::clone(&catalog), widget);
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let volume = library
            .store()
            .get(VOLUME_KEY)
            .and_then(|v| v.as_u64())
            .map(|v| v.min(100) as u8)
            .unwrap_or(config.player.volume);
        engine.set_volume(volume);

        let mut queue = PlaybackQueue::new();
        if config.player.restore_queue && !library.now_playing().is_empty() {
            queue.load(library.now_playing().to_vec(), 0);
        }

        Self {
            search: SearchSession::new(Arc::clone(&catalog)),
            lyrics: LyricsEngine::new(Arc::clone(&catalog)),
            catalog,
            config,
            queue,
            library,
            engine,
            engine_events,
            msg_tx,
            msg_rx,
            progress_poller: Poller::new(),
            lyrics_poller: Poller::new(),
            progress: (0.0, 0.0),
        }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn progress(&self) -> (f64, f64) {
        self.progress
    }

    pub fn engine(&self) -> &PlaybackEngine<C, W> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine<C, W> {
        &mut self.engine
    }

    // ---- playback -------------------------------------------------------

    /// Load `tracks` as the new playback queue, persist it for the next
    /// session, and start playing at `index`.
    ///
    /// The user's "up next" sidecar is left alone; only the add/remove/clear
    /// queue operations touch it.
    pub async fn play_from(&mut self, tracks: Vec<Track>, index: usize) {
        if tracks.is_empty() {
            return;
        }
        self.library.set_now_playing(tracks.clone());
        self.queue.load(tracks, index);
        self.start_playback().await;
    }

    /// Try to start the current track, skipping forward past unplayable
    /// tracks until one starts or the failure breaker trips.
    async fn start_playback(&mut self) {
        while self.engine.play_current(&mut self.queue).await.is_err() {
            if self.engine.failed_persistently() || self.queue.len() <= 1 {
                break;
            }
            self.queue.next();
        }
        self.drain_engine_events().await;
    }

    pub async fn next_track(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.queue.next();
        self.start_playback().await;
    }

    /// Go back a track, or restart the current one when it has played for
    /// more than the rewind threshold.
    pub async fn previous_track(&mut self) {
        let elapsed = self.engine.progress().0;
        match self.queue.previous(elapsed) {
            PreviousOutcome::Restart => self.engine.seek_to(0.0),
            PreviousOutcome::Moved(_) => self.start_playback().await,
            PreviousOutcome::Empty => {}
        }
    }

    pub fn toggle_play_pause(&mut self) {
        self.engine.toggle_play_pause();
    }

    pub fn seek_to(&mut self, seconds: f64) {
        self.engine.seek_to(seconds);
    }

    /// Set the volume and persist it for the next session.
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.engine.set_volume(volume);
        self.config.player.volume = volume;
        if let Err(e) = self.library.store().set(VOLUME_KEY, json!(volume)) {
            tracing::warn!("Failed to persist volume: {}", e);
        }
    }

    /// Returns whether shuffle is now enabled.
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = !self.queue.shuffle_enabled();
        self.queue.set_shuffle(enabled);
        enabled
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.queue.cycle_repeat()
    }

    /// Forward a widget state change into the engine.
    pub async fn on_widget_event(&mut self, event: WidgetEvent) {
        if self
            .engine
            .handle_widget_event(event, &mut self.queue)
            .await
            .is_err()
        {
            // The engine already moved the queue; keep skipping forward.
            if !self.engine.failed_persistently() && self.queue.len() > 1 {
                self.queue.next();
                self.start_playback().await;
                return;
            }
        }
        self.drain_engine_events().await;
    }

    // ---- search ---------------------------------------------------------

    pub async fn search(
        &mut self,
        query: &str,
        active: SearchCategory,
    ) -> Result<SearchOutcome, ApiClientError> {
        self.search.search(query, active).await
    }

    pub async fn load_more(
        &mut self,
        category: SearchCategory,
    ) -> Result<SearchOutcome, ApiClientError> {
        self.search.load_more(category).await
    }

    pub async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ApiClientError> {
        self.search.suggestions(query).await
    }

    // ---- browsing -------------------------------------------------------

    pub async fn album(&self, id: &str) -> Result<AlbumDetail, ApiClientError> {
        self.catalog.album(id).await
    }

    pub async fn artist(&self, id: &str) -> Result<ArtistDetail, ApiClientError> {
        self.catalog.artist(id).await
    }

    /// Fetch an album and play it from the top.
    pub async fn play_album(&mut self, id: &str) -> Result<(), ApiClientError> {
        let album = self.catalog.album(id).await?;
        self.play_from(album.tracks, 0).await;
        Ok(())
    }

    /// Fetch an artist and play their top tracks.
    pub async fn play_artist_top(&mut self, id: &str) -> Result<(), ApiClientError> {
        let artist = self.catalog.artist(id).await?;
        self.play_from(artist.top_tracks, 0).await;
        Ok(())
    }

    // ---- up next --------------------------------------------------------

    pub fn add_to_queue(&mut self, track: &Track) -> bool {
        self.library.add_to_up_next(track)
    }

    pub fn remove_from_queue(&mut self, track_id: &str) -> bool {
        self.library.remove_from_up_next(track_id)
    }

    pub fn clear_queue(&mut self) {
        self.library.clear_up_next();
    }

    // ---- library --------------------------------------------------------

    /// Returns whether the track is now liked.
    pub fn toggle_like(&mut self, track: &Track) -> bool {
        self.library.toggle_favorite(track)
    }

    pub fn create_playlist(&mut self, name: &str, description: Option<&str>) -> String {
        self.library.create_playlist(name, description)
    }

    pub fn add_to_playlist(&mut self, playlist_id: &str, track: &Track) -> bool {
        self.library.add_to_playlist(playlist_id, track)
    }

    // ---- lyrics ---------------------------------------------------------

    /// Open the lyrics panel for the current track and start line syncing
    /// when a synced document is available.
    pub async fn open_lyrics(&mut self) {
        self.lyrics.panel_open = true;
        if let Some(track) = self.queue.current_track().cloned() {
            self.lyrics.load(&track).await;
        }
        self.restart_lyrics_poller();
    }

    pub fn close_lyrics(&mut self) {
        self.lyrics.panel_open = false;
        self.lyrics_poller.stop();
    }

    pub fn lyrics_polling(&self) -> bool {
        self.lyrics_poller.is_running()
    }

    // ---- ticks and events ----------------------------------------------

    /// Drain pending tick messages and engine events. Call once per
    /// iteration of the embedding event loop.
    pub async fn pump(&mut self) {
        while let Ok(message) = self.msg_rx.try_recv() {
            match message {
                SessionMessage::ProgressTick => self.progress = self.engine.progress(),
                SessionMessage::LyricsTick => {
                    let position = self.engine.progress().0;
                    self.lyrics.sync_tick(position);
                }
            }
        }
        self.drain_engine_events().await;
    }

    async fn drain_engine_events(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.engine_events.try_recv() {
            events.push(event);
        }

        for event in events {
            match event {
                PlayerEvent::StateChanged(_) => {}
                PlayerEvent::TrackStarted(track) => {
                    self.library.record_played(&track);
                    self.progress = self.engine.progress();
                    self.progress_poller.start(
                        Duration::from_millis(PROGRESS_POLL_MILLIS),
                        self.msg_tx.clone(),
                        SessionMessage::ProgressTick,
                    );
                    if self.lyrics.panel_open && self.lyrics.subject() != Some(track.id.as_str()) {
                        self.lyrics.load(&track).await;
                        self.restart_lyrics_poller();
                    }
                }
                PlayerEvent::QueueFinished => {
                    self.progress_poller.stop();
                    self.lyrics_poller.stop();
                }
                PlayerEvent::PersistentFailure => {
                    tracing::error!("Playback halted after repeated failures");
                    self.progress_poller.stop();
                    self.lyrics_poller.stop();
                }
            }
        }
    }

    fn restart_lyrics_poller(&mut self) {
        if self.lyrics.panel_open && self.lyrics.has_synced() {
            self.lyrics_poller.start(
                Duration::from_millis(SYNC_POLL_MILLIS),
                self.msg_tx.clone(),
                SessionMessage::LyricsTick,
            );
        } else {
            self.lyrics_poller.stop();
        }
    }
}
