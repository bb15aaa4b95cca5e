//! Playback, search, and library orchestration for a streaming music client.
//!
//! The crate is the logic layer behind a music player UI: it owns the
//! playback queue, the engine state machine, paginated search, synced
//! lyrics, and the persisted user library, and drives an embedder-supplied
//! media widget through the [`player::MediaWidget`] trait. Rendering,
//! audio output, and the catalog HTTP service itself live outside.
//!
//! [`session::Session`] is the top-level entry point; the individual
//! modules are usable on their own.

pub mod client;
pub mod config;
pub mod library;
pub mod lyrics;
pub mod player;
pub mod poll;
pub mod queue;
pub mod search;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testutil;

pub use client::{ApiClientError, CatalogApi, CatalogClient};
pub use config::Config;
pub use library::{LibraryStore, Playlist};
pub use lyrics::{LyricsEngine, LyricsStatus};
pub use player::{EngineState, MediaWidget, PlaybackEngine, PlayerEvent, WidgetEvent};
pub use queue::{PlaybackQueue, RepeatMode};
pub use search::{SearchCategory, SearchOutcome, SearchSession};
pub use session::{Session, SessionMessage};
pub use storage::{JsonFileStore, MemoryStore, StorageBackend};
