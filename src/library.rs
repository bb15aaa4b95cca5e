//! User library: favorites, playlists, recents, and listening history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::models::Track;
use crate::storage::StorageBackend;

/// Most recent plays kept in the listening history.
pub const HISTORY_LIMIT: usize = 50;

/// Distinct tracks kept in the recently-played shelf.
pub const RECENT_LIMIT: usize = 20;

const FAVORITES_KEY: &str = "favorites";
const PLAYLISTS_KEY: &str = "playlists";
const RECENT_KEY: &str = "recent";
const HISTORY_KEY: &str = "history";
const QUEUE_KEY: &str = "queue";
const PLAYBACK_KEY: &str = "playback";

/// A user-created playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub created_at: DateTime<Utc>,
}

/// In-memory library mirrored to a persistent store.
///
/// Memory is authoritative: every mutation applies in memory first and is
/// then written through. A failed write is logged and swallowed, never
/// surfaced to the caller or rolled back.
pub struct LibraryStore<S> {
    store: S,
    favorites: Vec<Track>,
    playlists: Vec<Playlist>,
    recent: Vec<Track>,
    history: Vec<Track>,
    up_next: Vec<Track>,
    now_playing: Vec<Track>,
}

impl<S: StorageBackend> LibraryStore<S> {
    /// Load the library from `store`, defaulting each missing or unreadable
    /// section to empty.
    pub fn new(store: S) -> Self {
        let favorites = read_list(&store, FAVORITES_KEY);
        let playlists = read_list(&store, PLAYLISTS_KEY);
        let recent = read_list(&store, RECENT_KEY);
        let history = read_list(&store, HISTORY_KEY);
        let up_next = read_list(&store, QUEUE_KEY);
        let now_playing = read_list(&store, PLAYBACK_KEY);

        Self {
            store,
            favorites,
            playlists,
            recent,
            history,
            up_next,
            now_playing,
        }
    }

    /// Hand the backing store back, e.g. for snapshot export.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn favorites(&self) -> &[Track] {
        &self.favorites
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn recent(&self) -> &[Track] {
        &self.recent
    }

    pub fn history(&self) -> &[Track] {
        &self.history
    }

    pub fn up_next(&self) -> &[Track] {
        &self.up_next
    }

    pub fn is_favorite(&self, track_id: &str) -> bool {
        self.favorites.iter().any(|t| t.id == track_id)
    }

    /// Add or remove a favorite. Returns whether the track is now liked.
    pub fn toggle_favorite(&mut self, track: &Track) -> bool {
        let liked = if let Some(pos) = self.favorites.iter().position(|t| t.id == track.id) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.insert(0, track.clone());
            true
        };
        self.persist(FAVORITES_KEY, &self.favorites);
        liked
    }

    /// Create an empty playlist and return its id.
    pub fn create_playlist(&mut self, name: &str, description: Option<&str>) -> String {
        let now = Utc::now();
        let playlist = Playlist {
            id: now.timestamp_millis().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            tracks: Vec::new(),
            created_at: now,
        };
        let id = playlist.id.clone();
        self.playlists.push(playlist);
        self.persist(PLAYLISTS_KEY, &self.playlists);
        id
    }

    pub fn playlist(&self, id: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    /// Append a track to a playlist. Duplicate track ids are dropped.
    ///
    /// Returns whether the track was actually added.
    pub fn add_to_playlist(&mut self, playlist_id: &str, track: &Track) -> bool {
        let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) else {
            return false;
        };
        if playlist.tracks.iter().any(|t| t.id == track.id) {
            return false;
        }

        playlist.tracks.push(track.clone());
        self.persist(PLAYLISTS_KEY, &self.playlists);
        true
    }

    /// Remove a track from a playlist. Returns whether anything was removed.
    pub fn remove_from_playlist(&mut self, playlist_id: &str, track_id: &str) -> bool {
        let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) else {
            return false;
        };
        let Some(pos) = playlist.tracks.iter().position(|t| t.id == track_id) else {
            return false;
        };

        playlist.tracks.remove(pos);
        self.persist(PLAYLISTS_KEY, &self.playlists);
        true
    }

    /// Delete a playlist. Returns whether it existed.
    pub fn delete_playlist(&mut self, playlist_id: &str) -> bool {
        let before = self.playlists.len();
        self.playlists.retain(|p| p.id != playlist_id);
        let deleted = self.playlists.len() != before;
        if deleted {
            self.persist(PLAYLISTS_KEY, &self.playlists);
        }
        deleted
    }

    /// Record a play: the track moves to the front of both the recents and
    /// the history, deduplicated by id, with each list capped.
    pub fn record_played(&mut self, track: &Track) {
        move_to_front(&mut self.recent, track, RECENT_LIMIT);
        move_to_front(&mut self.history, track, HISTORY_LIMIT);
        self.persist(RECENT_KEY, &self.recent);
        self.persist(HISTORY_KEY, &self.history);
    }

    /// Replace the persisted "up next" sidecar queue.
    ///
    /// The sidecar is user-curated and independent of whatever is actually
    /// playing; starting playback must never overwrite it.
    pub fn set_up_next(&mut self, tracks: Vec<Track>) {
        self.up_next = tracks;
        self.persist(QUEUE_KEY, &self.up_next);
    }

    pub fn now_playing(&self) -> &[Track] {
        &self.now_playing
    }

    /// Replace the persisted active playback queue, kept under its own key
    /// so it never collides with the "up next" sidecar.
    pub fn set_now_playing(&mut self, tracks: Vec<Track>) {
        self.now_playing = tracks;
        self.persist(PLAYBACK_KEY, &self.now_playing);
    }

    /// Append a track to "up next", deduplicated by id.
    ///
    /// Returns whether the track was actually added.
    pub fn add_to_up_next(&mut self, track: &Track) -> bool {
        if self.up_next.iter().any(|t| t.id == track.id) {
            return false;
        }
        self.up_next.push(track.clone());
        self.persist(QUEUE_KEY, &self.up_next);
        true
    }

    /// Remove a track from "up next". Returns whether anything was removed.
    pub fn remove_from_up_next(&mut self, track_id: &str) -> bool {
        let before = self.up_next.len();
        self.up_next.retain(|t| t.id != track_id);
        let removed = self.up_next.len() != before;
        if removed {
            self.persist(QUEUE_KEY, &self.up_next);
        }
        removed
    }

    pub fn clear_up_next(&mut self) {
        self.up_next.clear();
        self.store.remove(QUEUE_KEY);
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to serialize {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }
}

fn read_list<T: serde::de::DeserializeOwned>(store: &dyn StorageBackend, key: &str) -> Vec<T> {
    let Some(value) = store.get(key) else {
        return Vec::new();
    };
    match serde_json::from_value(value) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("Unreadable {} entry, starting empty: {}", key, e);
            Vec::new()
        }
    }
}

fn move_to_front(list: &mut Vec<Track>, track: &Track, limit: usize) {
    list.retain(|t| t.id != track.id);
    list.insert(0, track.clone());
    list.truncate(limit);
}
