//! Catalog service HTTP client.

use reqwest::Client;
use thiserror::Error;

use super::models::*;

/// Results per category per search page.
pub const PAGE_SIZE: usize = 20;

/// Minimum query length before suggestions are requested.
const MIN_SUGGESTION_QUERY: usize = 2;

/// API client errors.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Server returned status {status}")]
    Status { status: u16 },
}

/// The remote catalog boundary: search, album/artist detail, playable-handle
/// resolution, and the two lyrics sources.
///
/// Implemented by [`CatalogClient`] for the real service and by test doubles
/// in unit tests.
#[allow(async_fn_in_trait)]
pub trait CatalogApi {
    async fn search(&self, query: &str, offset: u32) -> Result<SearchResults, ApiClientError>;

    async fn album(&self, id: &str) -> Result<AlbumDetail, ApiClientError>;

    async fn artist(&self, id: &str) -> Result<ArtistDetail, ApiClientError>;

    /// Resolve a playable handle for a track lacking one.
    async fn resolve_video(&self, query: &str) -> Result<Option<String>, ApiClientError>;

    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ApiClientError>;

    /// Primary lyrics source; may carry synced and/or plain text.
    async fn lyrics_synced(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<LyricsPayload, ApiClientError>;

    /// Fallback lyrics source; plain text only.
    async fn lyrics_plain(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<String>, ApiClientError>;
}

/// HTTP catalog client.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    /// HTTP client
    client: Client,

    /// Base catalog URL
    base_url: String,

    /// Primary (time-synced) lyrics endpoint
    lyrics_url: String,

    /// Fallback (plain text) lyrics endpoint
    lyrics_fallback_url: String,
}

impl CatalogClient {
    /// Create a new API client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            lyrics_url: String::from("https://lrclib.net/api/get"),
            lyrics_fallback_url: String::from("https://api.lyrics.ovh/v1"),
        }
    }

    /// Build the URL for an API endpoint with query parameters.
    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}", self.base_url, endpoint);

        let query_parts: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();

        if !query_parts.is_empty() {
            url.push('?');
            url.push_str(&query_parts.join("&"));
        }
        url
    }

    /// Make a GET request and deserialize the JSON body.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiClientError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiClientError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiClientError::InvalidResponse(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                &text[..text.len().min(500)]
            ))
        })
    }
}

impl CatalogApi for CatalogClient {
    async fn search(&self, query: &str, offset: u32) -> Result<SearchResults, ApiClientError> {
        let offset_str = offset.to_string();
        let url = self.build_url("search", &[("q", query), ("offset", &offset_str)]);
        self.get(&url).await
    }

    async fn album(&self, id: &str) -> Result<AlbumDetail, ApiClientError> {
        let url = self.build_url(&format!("album/{id}"), &[]);
        self.get(&url).await
    }

    async fn artist(&self, id: &str) -> Result<ArtistDetail, ApiClientError> {
        let url = self.build_url(&format!("artist/{id}"), &[]);
        self.get(&url).await
    }

    async fn resolve_video(&self, query: &str) -> Result<Option<String>, ApiClientError> {
        let url = self.build_url("youtube-search", &[("q", query)]);
        let resolution: VideoResolution = self.get(&url).await?;
        Ok(resolution.video_id)
    }

    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ApiClientError> {
        if query.trim().len() < MIN_SUGGESTION_QUERY {
            return Ok(Vec::new());
        }

        let url = self.build_url("suggestions", &[("q", query)]);
        let response: SuggestionsResponse = self.get(&url).await?;
        Ok(response.suggestions)
    }

    async fn lyrics_synced(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<LyricsPayload, ApiClientError> {
        let url = format!(
            "{}?artist_name={}&track_name={}",
            self.lyrics_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        );

        let response: SyncedLyricsResponse = self.get(&url).await?;
        Ok(LyricsPayload {
            synced: response.synced_lyrics,
            plain: response.plain_lyrics.or(response.lyrics),
            duration: response.duration,
        })
    }

    async fn lyrics_plain(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<String>, ApiClientError> {
        let url = format!(
            "{}/{}/{}",
            self.lyrics_fallback_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        );

        let response: PlainLyricsResponse = self.get(&url).await?;
        Ok(response.lyrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_encodes_params() {
        let client = CatalogClient::new("https://example.com/music-api/");
        let url = client.build_url("search", &[("q", "AC/DC"), ("offset", "20")]);
        assert_eq!(url, "https://example.com/music-api/search?q=AC%2FDC&offset=20");
    }

    #[test]
    fn build_url_without_params() {
        let client = CatalogClient::new("https://example.com");
        assert_eq!(client.build_url("album/42", &[]), "https://example.com/album/42");
    }
}
