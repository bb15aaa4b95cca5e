//! Catalog service response models.

use serde::{Deserialize, Serialize};

/// A playable track.
///
/// Immutable except for `video_id`, the resolved playable handle, which is
/// populated at most once after a successful lookup and cached on the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    /// Resolved playable handle (external video id).
    #[serde(default)]
    pub video_id: Option<String>,
    /// Free-form query override used when resolving a handle.
    #[serde(default)]
    pub video_query: Option<String>,
}

/// Handles longer than this are junk ids from upstream and get re-resolved.
const MAX_HANDLE_LEN: usize = 22;

impl Track {
    /// Get display artist, falling back to "Unknown Artist".
    pub fn display_artist(&self) -> &str {
        self.artist_name.as_deref().unwrap_or("Unknown Artist")
    }

    /// Get a display-friendly duration string (e.g., "3:45").
    pub fn duration_string(&self) -> String {
        match self.duration {
            Some(ms) => {
                let secs = ms / 1000;
                let mins = secs / 60;
                let secs = secs % 60;
                format!("{mins}:{secs:02}")
            }
            None => String::from("--:--"),
        }
    }

    /// The cached playable handle, if it looks valid.
    pub fn cached_handle(&self) -> Option<&str> {
        self.video_id
            .as_deref()
            .filter(|id| !id.is_empty() && id.len() <= MAX_HANDLE_LEN)
    }

    /// The search text used to resolve a playable handle.
    pub fn resolve_query(&self) -> String {
        match &self.video_query {
            Some(q) => q.clone(),
            None => format!("{} {}", self.title, self.artist_name.as_deref().unwrap_or("")),
        }
    }
}

/// An album summary as returned by search and artist endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub artwork_url: Option<String>,
}

/// An artist summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub followers: Option<u64>,
}

/// Response for the combined search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

/// A named artist reference inside an album detail.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Response for the album detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumDetail {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Response for the artist detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistDetail {
    pub name: String,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub top_tracks: Vec<Track>,
    #[serde(default)]
    pub albums: Vec<Album>,
}

/// Response for the playable-handle resolution endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResolution {
    #[serde(default)]
    pub video_id: Option<String>,
}

/// A single search suggestion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Response for the suggestions endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// Response from the primary (time-synced) lyrics source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedLyricsResponse {
    #[serde(default)]
    pub synced_lyrics: Option<String>,
    #[serde(default)]
    pub plain_lyrics: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub duration: f64,
}

/// Response from the plain-text fallback lyrics source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlainLyricsResponse {
    #[serde(default)]
    pub lyrics: Option<String>,
}

/// Lyrics as fetched, before parsing.
#[derive(Debug, Clone, Default)]
pub struct LyricsPayload {
    /// Raw LRC text with per-line timestamps, when the source has it.
    pub synced: Option<String>,
    /// Unsynchronized lyric text.
    pub plain: Option<String>,
    /// Track duration reported by the source, in seconds.
    pub duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.into(),
            title: String::from("Song"),
            artist_name: Some(String::from("Artist")),
            artist_id: None,
            duration: Some(225_000),
            artwork_url: None,
            video_id: None,
            video_query: None,
        }
    }

    #[test]
    fn duration_string_formats_ms() {
        assert_eq!(track("t1").duration_string(), "3:45");

        let mut t = track("t2");
        t.duration = None;
        assert_eq!(t.duration_string(), "--:--");
    }

    #[test]
    fn cached_handle_rejects_junk_ids() {
        let mut t = track("t1");
        assert_eq!(t.cached_handle(), None);

        t.video_id = Some(String::from("dQw4w9WgXcQ"));
        assert_eq!(t.cached_handle(), Some("dQw4w9WgXcQ"));

        t.video_id = Some("x".repeat(40));
        assert_eq!(t.cached_handle(), None);
    }

    #[test]
    fn resolve_query_prefers_override() {
        let mut t = track("t1");
        assert_eq!(t.resolve_query(), "Song Artist");

        t.video_query = Some(String::from("Song official audio"));
        assert_eq!(t.resolve_query(), "Song official audio");
    }

    #[test]
    fn search_results_tolerate_missing_sections() {
        let results: SearchResults = serde_json::from_str(r#"{"tracks": []}"#).unwrap();
        assert!(results.albums.is_empty());
        assert!(results.artists.is_empty());
    }
}
