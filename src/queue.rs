//! Playback queue: track order, shuffle, and repeat policy.

use rand::seq::SliceRandom;

use crate::client::models::Track;

/// Seconds of playback after which "previous" restarts the current track
/// instead of moving to the one before it.
pub const REWIND_THRESHOLD_SECS: f64 = 3.0;

/// Repeat mode for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Result of a "previous" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousOutcome {
    /// More than the rewind threshold elapsed; restart the current track.
    Restart,
    /// The index moved back (with wrap) to this position.
    Moved(usize),
    /// The queue is empty; nothing to do.
    Empty,
}

/// Ordered track list with a parallel canonical order and a current index.
///
/// The canonical order is the sequence as loaded, before any shuffle.
/// Shuffling never drops or duplicates tracks, and disabling shuffle
/// restores exactly the canonical order.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    canonical: Vec<Track>,
    current: usize,
    shuffle: bool,
    repeat: RepeatMode,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents and jump to `start_index` (clamped).
    ///
    /// No-op when `tracks` is empty.
    pub fn load(&mut self, tracks: Vec<Track>, start_index: usize) {
        if tracks.is_empty() {
            return;
        }
        self.current = start_index.min(tracks.len() - 1);
        self.canonical = tracks.clone();
        self.tracks = tracks;
        self.shuffle = false;
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    /// Whether the current index is the final position of this pass.
    pub fn at_end(&self) -> bool {
        !self.tracks.is_empty() && self.current + 1 == self.tracks.len()
    }

    /// Advance to the next track, wrapping at the end.
    pub fn next(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.tracks.len();
        self.current_track()
    }

    /// Retreat to the previous track, wrapping at the start.
    ///
    /// When more than [`REWIND_THRESHOLD_SECS`] of the current track have
    /// elapsed the index stays put and the caller should seek to zero.
    pub fn previous(&mut self, elapsed_secs: f64) -> PreviousOutcome {
        if self.tracks.is_empty() {
            return PreviousOutcome::Empty;
        }
        if elapsed_secs > REWIND_THRESHOLD_SECS {
            return PreviousOutcome::Restart;
        }

        self.current = if self.current > 0 {
            self.current - 1
        } else {
            self.tracks.len() - 1
        };
        PreviousOutcome::Moved(self.current)
    }

    /// Enable or disable shuffle.
    ///
    /// Enabling produces a Fisher-Yates permutation of everything except the
    /// current track, which is forced to position 0. Disabling restores the
    /// canonical order and re-locates the current track there (0 if missing).
    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled == self.shuffle {
            return;
        }
        self.shuffle = enabled;

        if enabled {
            if self.tracks.len() <= 1 {
                return;
            }
            let mut rng = rand::thread_rng();
            let current = self.tracks.remove(self.current);
            self.tracks.shuffle(&mut rng);
            self.tracks.insert(0, current);
            self.current = 0;
        } else {
            let playing_id = self.current_track().map(|t| t.id.clone());
            self.tracks = self.canonical.clone();
            self.current = playing_id
                .and_then(|id| self.tracks.iter().position(|t| t.id == id))
                .unwrap_or(0);
        }
    }

    /// Advance repeat mode: off -> all -> one -> off.
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    /// Cache a resolved playable handle on every copy of the track.
    ///
    /// The handle is set at most once per track instance.
    pub fn cache_handle(&mut self, track_id: &str, handle: &str) {
        for track in self
            .tracks
            .iter_mut()
            .chain(self.canonical.iter_mut())
            .filter(|t| t.id == track_id)
        {
            if track.video_id.is_none() {
                track.video_id = Some(handle.to_string());
            }
        }
    }
}
