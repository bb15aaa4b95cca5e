//! Shared test doubles: an in-memory catalog and a scripted media widget.

use std::cell::{Cell, RefCell};

use crate::client::models::{
    Album, AlbumDetail, Artist, ArtistDetail, LyricsPayload, SearchResults, Suggestion, Track,
};
use crate::client::{ApiClientError, CatalogApi};
use crate::player::MediaWidget;

/// Install a test-writer tracing subscriber once per process.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build `n` distinct tracks with ids `t0..tN`.
pub fn make_tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            id: format!("t{i}"),
            title: format!("Track {i}"),
            artist_name: Some(format!("Artist {i}")),
            artist_id: Some(format!("a{i}")),
            duration: Some(180_000 + i as u64 * 1000),
            artwork_url: None,
            video_id: None,
            video_query: None,
        })
        .collect()
}

fn make_albums(n: usize, offset: u32) -> Vec<Album> {
    (0..n)
        .map(|i| Album {
            id: format!("al{}", offset as usize + i),
            name: format!("Album {}", offset as usize + i),
            artist_name: None,
            release_year: Some(2020),
            artwork_url: None,
        })
        .collect()
}

fn make_artists(n: usize, offset: u32) -> Vec<Artist> {
    (0..n)
        .map(|i| Artist {
            id: format!("ar{}", offset as usize + i),
            name: format!("Artist {}", offset as usize + i),
            image_url: None,
            followers: None,
        })
        .collect()
}

/// Scriptable [`CatalogApi`] double.
///
/// Call counts and page sizes use interior mutability so tests can inspect
/// and reconfigure the catalog through the shared handle they hand to the
/// component under test.
pub struct MockCatalog {
    track_page: Cell<usize>,
    album_page: Cell<usize>,
    artist_page: Cell<usize>,
    search_calls: Cell<usize>,
    resolve_calls: Cell<usize>,
    /// When set, overrides the auto-generated handle sequence.
    video_override: RefCell<Option<Option<String>>>,
    synced_lyrics: RefCell<Option<String>>,
    plain_lyrics: RefCell<Option<String>>,
    lyrics_failure: Cell<bool>,
    fallback_failure: Cell<bool>,
    suggestions: RefCell<Vec<Suggestion>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            track_page: Cell::new(0),
            album_page: Cell::new(0),
            artist_page: Cell::new(0),
            search_calls: Cell::new(0),
            resolve_calls: Cell::new(0),
            video_override: RefCell::new(None),
            synced_lyrics: RefCell::new(None),
            plain_lyrics: RefCell::new(None),
            lyrics_failure: Cell::new(false),
            fallback_failure: Cell::new(false),
            suggestions: RefCell::new(Vec::new()),
        }
    }

    pub fn with_page_sizes(self, tracks: usize, albums: usize, artists: usize) -> Self {
        self.set_page_sizes(tracks, albums, artists);
        self
    }

    pub fn set_page_sizes(&self, tracks: usize, albums: usize, artists: usize) {
        self.track_page.set(tracks);
        self.album_page.set(albums);
        self.artist_page.set(artists);
    }

    /// Pin the handle resolution result; `None` means "nothing found".
    pub fn with_video(self, video: Option<String>) -> Self {
        *self.video_override.borrow_mut() = Some(video);
        self
    }

    pub fn with_synced_lyrics(self, lrc: &str) -> Self {
        *self.synced_lyrics.borrow_mut() = Some(lrc.to_string());
        self
    }

    pub fn with_plain_lyrics(self, text: &str) -> Self {
        *self.plain_lyrics.borrow_mut() = Some(text.to_string());
        self
    }

    pub fn with_lyrics_failure(self) -> Self {
        self.lyrics_failure.set(true);
        self
    }

    pub fn with_fallback_failure(self) -> Self {
        self.fallback_failure.set(true);
        self
    }

    pub fn with_suggestions(self, suggestions: Vec<Suggestion>) -> Self {
        *self.suggestions.borrow_mut() = suggestions;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.get()
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.get()
    }
}

impl CatalogApi for MockCatalog {
    async fn search(&self, _query: &str, offset: u32) -> Result<SearchResults, ApiClientError> {
        self.search_calls.set(self.search_calls.get() + 1);

        let mut tracks = make_tracks(self.track_page.get());
        for (i, track) in tracks.iter_mut().enumerate() {
            track.id = format!("t{}", offset as usize + i);
        }

        Ok(SearchResults {
            tracks,
            albums: make_albums(self.album_page.get(), offset),
            artists: make_artists(self.artist_page.get(), offset),
        })
    }

    async fn album(&self, id: &str) -> Result<AlbumDetail, ApiClientError> {
        Ok(AlbumDetail {
            name: format!("Album {id}"),
            artists: Vec::new(),
            release_year: Some(2020),
            artwork_url: None,
            tracks: make_tracks(3),
        })
    }

    async fn artist(&self, id: &str) -> Result<ArtistDetail, ApiClientError> {
        Ok(ArtistDetail {
            name: format!("Artist {id}"),
            followers: Some(1000),
            image_url: None,
            top_tracks: make_tracks(5),
            albums: make_albums(2, 0),
        })
    }

    async fn resolve_video(&self, _query: &str) -> Result<Option<String>, ApiClientError> {
        let n = self.resolve_calls.get();
        self.resolve_calls.set(n + 1);

        if let Some(pinned) = self.video_override.borrow().as_ref() {
            return Ok(pinned.clone());
        }
        Ok(Some(format!("video-{n}")))
    }

    async fn suggestions(&self, _query: &str) -> Result<Vec<Suggestion>, ApiClientError> {
        Ok(self.suggestions.borrow().clone())
    }

    async fn lyrics_synced(
        &self,
        _artist: &str,
        _title: &str,
    ) -> Result<LyricsPayload, ApiClientError> {
        if self.lyrics_failure.get() {
            return Err(ApiClientError::Status { status: 500 });
        }
        Ok(LyricsPayload {
            synced: self.synced_lyrics.borrow().clone(),
            plain: None,
            duration: 0.0,
        })
    }

    async fn lyrics_plain(
        &self,
        _artist: &str,
        _title: &str,
    ) -> Result<Option<String>, ApiClientError> {
        if self.fallback_failure.get() {
            return Err(ApiClientError::Status { status: 404 });
        }
        Ok(self.plain_lyrics.borrow().clone())
    }
}

/// Commands recorded by [`FakeWidget`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(u8),
}

/// [`MediaWidget`] double that records every command and reports a
/// test-controlled position and duration.
pub struct FakeWidget {
    commands: Vec<WidgetCommand>,
    position: f64,
    length: f64,
    volume: u8,
}

impl FakeWidget {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            position: 0.0,
            length: 0.0,
            volume: 100,
        }
    }

    pub fn commands(&self) -> Vec<WidgetCommand> {
        self.commands.clone()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn set_progress(&mut self, position: f64, length: f64) {
        self.position = position;
        self.length = length;
    }
}

impl MediaWidget for FakeWidget {
    fn load_by_id(&mut self, id: &str) {
        self.commands.push(WidgetCommand::Load(id.to_string()));
        self.position = 0.0;
    }

    fn play(&mut self) {
        self.commands.push(WidgetCommand::Play);
    }

    fn pause(&mut self) {
        self.commands.push(WidgetCommand::Pause);
    }

    fn seek_to(&mut self, seconds: f64) {
        self.commands.push(WidgetCommand::Seek(seconds));
        self.position = seconds;
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.length
    }

    fn set_volume(&mut self, volume: u8) {
        self.commands.push(WidgetCommand::SetVolume(volume));
        self.volume = volume;
    }
}
