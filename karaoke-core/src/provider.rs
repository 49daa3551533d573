use crate::error::CoreError;
use crate::lrc::parse_synchronized_lyrics;
use crate::lyrics::{LyricsDocument, Provenance, TimedLine};
use crate::synth::synthesize_timings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Artist used when the file name carries no `" - "` separator
pub const UNKNOWN_ARTIST: &str = "Unknown";

const TITLE_SEPARATOR: &str = " - ";

/// Query parameters for fetching lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
    /// Album name (optional)
    pub album_name: Option<String>,
    /// Track duration in seconds (for matching)
    pub duration_secs: Option<u32>,
    /// Local audio file, for providers that recognize audio
    pub audio_path: Option<PathBuf>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: None,
            duration_secs: None,
            audio_path: None,
        }
    }

    /// Build a query from an audio file named `Track - Artist.ext`.
    ///
    /// The last `" - "` separated part is taken as the artist. Without a
    /// separator the whole stem is the track and the artist is unknown.
    pub fn from_audio_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut query = match stem.rsplit_once(TITLE_SEPARATOR) {
            Some((track, artist)) => Self::new(track.trim(), artist.trim()),
            None => Self::new(stem, UNKNOWN_ARTIST),
        };
        query.audio_path = Some(path);
        query
    }

    /// Set album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_name = Some(album.into());
        self
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    #[must_use]
    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }
}

/// Lyrics as returned by a provider, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsPayload {
    /// LRC text with line markers
    Synced(String),
    /// Plain text lyrics without timing
    Unsynced(String),
    /// Lines the service already paired with `HH:MM:SS.fff` timestamps
    Timed(Vec<TimedLine>),
    /// No lyrics found
    NotFound,
}

impl LyricsPayload {
    /// Check if the payload carries real timing
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_) | Self::Timed(_))
    }

    /// Turn the payload into timed lines.
    ///
    /// Plain text is split into trimmed, non-blank lines and given synthetic
    /// timing. Returns `None` when nothing usable remains.
    #[must_use]
    pub fn normalize(&self) -> Option<LyricsDocument> {
        let document = match self {
            Self::Synced(raw) => parse_synchronized_lyrics(raw),
            Self::Unsynced(text) => {
                let lines: Vec<&str> = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                synthesize_timings(&lines)
            }
            Self::Timed(lines) => LyricsDocument::new(lines.clone()),
            Self::NotFound => return None,
        };

        (!document.is_empty()).then_some(document)
    }
}

/// Lyrics with provider metadata
#[derive(Debug, Clone)]
pub struct FetchedLyrics {
    /// The lyrics payload
    pub payload: LyricsPayload,
    /// Provider-specific ID (e.g., LRCLIB's numeric ID as string)
    pub provider_id: String,
}

impl FetchedLyrics {
    #[must_use]
    pub fn not_found(provider_id: impl Into<String>) -> Self {
        Self {
            payload: LyricsPayload::NotFound,
            provider_id: provider_id.into(),
        }
    }
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Kind of backend, attached to every document this provider produces
    fn provenance(&self) -> Provenance;

    /// Fetch lyrics for a query
    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError>;
}
