//! Lyrics fetching, LRC parsing, and time indexing.

use std::sync::Arc;

use crate::client::models::Track;
use crate::client::CatalogApi;

/// How often the active line is recomputed while playback is running.
pub const SYNC_POLL_MILLIS: u64 = 100;

/// One timestamped lyric line.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Line start in seconds from track start.
    pub time: f64,
    pub text: String,
}

/// Parsed lyrics for one track.
#[derive(Debug, Clone, PartialEq)]
pub enum LyricsDocument {
    /// Lines sorted ascending by time.
    Synced(Vec<LyricLine>),
    /// A single opaque text block.
    Plain(String),
}

/// Displayable lyrics state, including the degraded outcomes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LyricsStatus {
    #[default]
    Empty,
    Loading,
    Loaded(LyricsDocument),
    /// Both sources answered but had nothing for this track.
    NotFound,
    /// Both sources failed.
    Failed,
}

/// Parse one LRC line of the form `[MM:SS.ff]text`.
///
/// The fraction is 1-3 digits, right-padded to milliseconds. Lines that do
/// not match are skipped by the caller.
fn parse_lrc_line(line: &str) -> Option<LyricLine> {
    let rest = line.strip_prefix('[')?;
    let (minutes, rest) = rest.split_once(':')?;
    let (seconds, rest) = rest.split_once('.')?;
    let (fraction, text) = rest.split_once(']')?;

    if minutes.len() != 2 || seconds.len() != 2 || fraction.is_empty() || fraction.len() > 3 {
        return None;
    }

    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    let millis: u32 = format!("{fraction:0<3}").parse().ok()?;

    Some(LyricLine {
        time: f64::from(minutes * 60 + seconds) + f64::from(millis) / 1000.0,
        text: text.trim().to_string(),
    })
}

/// Parse an LRC document into lines sorted ascending by time.
///
/// Input order is not trusted; malformed lines are skipped, not fatal.
pub fn parse_synced(lrc: &str) -> Vec<LyricLine> {
    let mut lines: Vec<LyricLine> = lrc.lines().filter_map(parse_lrc_line).collect();
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// Index of the last line whose time is `<= position`, or -1 before the
/// first line.
pub fn active_line_index(lines: &[LyricLine], position_secs: f64) -> isize {
    let mut active = -1;
    for (i, line) in lines.iter().enumerate() {
        if line.time <= position_secs {
            active = i as isize;
        } else {
            break;
        }
    }
    active
}

/// Fetches and time-indexes lyrics for the active track.
///
/// There is no cancellation of in-flight fetches; a completed fetch is
/// applied only if the track it was issued for is still the active subject
/// (last-assigned-wins).
pub struct LyricsEngine<C> {
    catalog: Arc<C>,
    /// Track id the panel is currently showing (or loading) lyrics for.
    subject: Option<String>,
    status: LyricsStatus,
    active_line: isize,
    pub panel_open: bool,
}

impl<C: CatalogApi> LyricsEngine<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            subject: None,
            status: LyricsStatus::Empty,
            active_line: -1,
            panel_open: false,
        }
    }

    pub fn status(&self) -> &LyricsStatus {
        &self.status
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn active_line(&self) -> isize {
        self.active_line
    }

    /// Whether a synced document is loaded, i.e. sync polling is useful.
    pub fn has_synced(&self) -> bool {
        matches!(self.status, LyricsStatus::Loaded(LyricsDocument::Synced(_)))
    }

    pub fn clear(&mut self) {
        self.subject = None;
        self.status = LyricsStatus::Empty;
        self.active_line = -1;
    }

    /// Mark `track` as the active lyrics subject and enter the loading state.
    pub fn begin(&mut self, track: &Track) {
        self.subject = Some(track.id.clone());
        self.status = LyricsStatus::Loading;
        self.active_line = -1;
    }

    /// Fetch lyrics, primary (synced) source first, plain fallback on
    /// primary failure. Never errors; degraded outcomes are statuses.
    pub async fn fetch(&self, track: &Track) -> LyricsStatus {
        let artist = track.display_artist();

        match self.catalog.lyrics_synced(artist, &track.title).await {
            Ok(payload) => {
                let synced = payload.synced.as_deref().map(parse_synced);
                match synced {
                    Some(lines) if !lines.is_empty() => {
                        LyricsStatus::Loaded(LyricsDocument::Synced(lines))
                    }
                    _ => match payload.plain {
                        Some(text) if !text.is_empty() => {
                            LyricsStatus::Loaded(LyricsDocument::Plain(text))
                        }
                        _ => LyricsStatus::NotFound,
                    },
                }
            }
            Err(e) => {
                tracing::warn!("Primary lyrics source failed: {}", e);
                match self.catalog.lyrics_plain(artist, &track.title).await {
                    Ok(Some(text)) if !text.is_empty() => {
                        LyricsStatus::Loaded(LyricsDocument::Plain(text))
                    }
                    Ok(_) => LyricsStatus::NotFound,
                    Err(e) => {
                        tracing::warn!("Fallback lyrics source failed: {}", e);
                        LyricsStatus::Failed
                    }
                }
            }
        }
    }

    /// Apply a completed fetch, unless the subject moved on in the meantime.
    ///
    /// Returns whether the result was applied.
    pub fn apply(&mut self, track_id: &str, status: LyricsStatus) -> bool {
        if self.subject.as_deref() != Some(track_id) {
            return false;
        }
        self.status = status;
        true
    }

    /// Fetch and apply lyrics for `track` in one step.
    pub async fn load(&mut self, track: &Track) {
        self.begin(track);
        let status = self.fetch(track).await;
        self.apply(&track.id, status);
    }

    /// Recompute the active line for the given playback position.
    pub fn sync_tick(&mut self, position_secs: f64) {
        if let LyricsStatus::Loaded(LyricsDocument::Synced(lines)) = &self.status {
            self.active_line = active_line_index(lines, position_secs);
        }
    }
}
