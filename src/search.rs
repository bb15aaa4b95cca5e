//! Search session: per-category paginated query state.

use std::sync::Arc;

use crate::client::models::{Album, Artist, Suggestion, Track};
use crate::client::{CatalogApi, PAGE_SIZE};

/// Search result categories, each paged independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    Tracks,
    Albums,
    Artists,
}

/// Pagination state for one category.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub offset: u32,
    pub has_more: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            offset: 0,
            has_more: true,
        }
    }
}

/// What a search call did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query was empty; the session was cleared.
    Cleared,
    /// Fresh results replaced the session contents.
    Updated,
    /// Results were appended to one category; carries the appended count.
    Appended(usize),
    /// The call was dropped (stale response, in-flight fetch, exhausted page).
    Ignored,
}

/// Paginated multi-category search over the catalog.
///
/// One session holds one query. Changing the query resets every cursor;
/// paging advances only the cursor of the category being paged. At most one
/// outstanding fetch is allowed, and a response is applied only if the
/// session's query still matches the one it was issued for.
pub struct SearchSession<C> {
    catalog: Arc<C>,
    query: String,
    tracks_cursor: Cursor,
    albums_cursor: Cursor,
    artists_cursor: Cursor,
    loading: bool,

    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
}

impl<C: CatalogApi> SearchSession<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            query: String::new(),
            tracks_cursor: Cursor::default(),
            albums_cursor: Cursor::default(),
            artists_cursor: Cursor::default(),
            loading: false,
            tracks: Vec::new(),
            albums: Vec::new(),
            artists: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn cursor(&self, category: SearchCategory) -> Cursor {
        match category {
            SearchCategory::Tracks => self.tracks_cursor,
            SearchCategory::Albums => self.albums_cursor,
            SearchCategory::Artists => self.artists_cursor,
        }
    }

    fn cursor_mut(&mut self, category: SearchCategory) -> &mut Cursor {
        match category {
            SearchCategory::Tracks => &mut self.tracks_cursor,
            SearchCategory::Albums => &mut self.albums_cursor,
            SearchCategory::Artists => &mut self.artists_cursor,
        }
    }

    fn reset(&mut self, query: &str) {
        self.query = query.to_string();
        self.tracks_cursor = Cursor::default();
        self.albums_cursor = Cursor::default();
        self.artists_cursor = Cursor::default();
        self.tracks.clear();
        self.albums.clear();
        self.artists.clear();
    }

    /// Run a fresh search for `query`, paged from the cursor of the active
    /// category. An empty query clears the session.
    ///
    /// All three categories are replaced from the single response; each
    /// cursor advances by the count returned for its category.
    pub async fn search(
        &mut self,
        query: &str,
        active: SearchCategory,
    ) -> Result<SearchOutcome, crate::client::ApiClientError> {
        let query = query.trim();
        if query.is_empty() {
            self.reset("");
            return Ok(SearchOutcome::Cleared);
        }

        if query != self.query {
            self.reset(query);
        }

        if self.loading {
            return Ok(SearchOutcome::Ignored);
        }
        self.loading = true;

        let issued_for = self.query.clone();
        let offset = self.cursor(active).offset;
        let result = self.catalog.search(&issued_for, offset).await;
        self.loading = false;

        // A newer search may have superseded this one while it was in
        // flight; the stale response must not touch session state.
        if self.query != issued_for {
            return Ok(SearchOutcome::Ignored);
        }

        let results = result?;

        self.tracks = results.tracks;
        self.albums = results.albums;
        self.artists = results.artists;

        self.advance_cursor(SearchCategory::Tracks, self.tracks.len());
        self.advance_cursor(SearchCategory::Albums, self.albums.len());
        self.advance_cursor(SearchCategory::Artists, self.artists.len());

        Ok(SearchOutcome::Updated)
    }

    /// Fetch and append the next page for one category.
    ///
    /// Dropped (not queued) while another fetch is in flight, and a no-op
    /// once the category is exhausted.
    pub async fn load_more(
        &mut self,
        category: SearchCategory,
    ) -> Result<SearchOutcome, crate::client::ApiClientError> {
        if self.query.is_empty() || self.loading || !self.cursor(category).has_more {
            return Ok(SearchOutcome::Ignored);
        }
        self.loading = true;

        let issued_for = self.query.clone();
        let offset = self.cursor(category).offset;
        let result = self.catalog.search(&issued_for, offset).await;
        self.loading = false;

        if self.query != issued_for {
            return Ok(SearchOutcome::Ignored);
        }

        let results = result?;

        let appended = match category {
            SearchCategory::Tracks => {
                let n = results.tracks.len();
                self.tracks.extend(results.tracks);
                n
            }
            SearchCategory::Albums => {
                let n = results.albums.len();
                self.albums.extend(results.albums);
                n
            }
            SearchCategory::Artists => {
                let n = results.artists.len();
                self.artists.extend(results.artists);
                n
            }
        };

        self.advance_cursor(category, appended);
        Ok(SearchOutcome::Appended(appended))
    }

    /// Fetch completion suggestions for a partial query.
    pub async fn suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<Suggestion>, crate::client::ApiClientError> {
        self.catalog.suggestions(query).await
    }

    fn advance_cursor(&mut self, category: SearchCategory, returned: usize) {
        let cursor = self.cursor_mut(category);
        cursor.offset += returned as u32;
        if returned < PAGE_SIZE {
            cursor.has_more = false;
        }
    }
}
