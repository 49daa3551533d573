pub mod api_log;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod library;
pub mod lrc;
pub mod lyrics;
pub mod paths;
pub mod provider;
pub mod synth;
pub mod timestamp;

pub use api_log::{ApiLog, LogStatus};
pub use config::{
    AuddConfig, KaraokeConfig, LibraryConfig, LoggingConfig, LyricsConfig, LyricsProviderType,
    PlaybackConfig,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::CoreError;
pub use fetcher::LyricsFetcher;
pub use library::{LibraryScan, SongLibrary};
pub use lrc::{parse_synchronized_lyrics, LrcMarker};
pub use lyrics::{AcquiredLyrics, LyricsDocument, Provenance, TimedLine};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use provider::{FetchedLyrics, LyricsPayload, LyricsProvider, LyricsQuery};
pub use synth::synthesize_timings;
