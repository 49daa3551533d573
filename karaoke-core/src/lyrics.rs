use crate::error::Result;
use crate::timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lyric fragment paired with its playback offset (`HH:MM:SS.fff`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedLine {
    pub text: String,
    pub timestamp: String,
}

impl TimedLine {
    pub fn new(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Playback offset of this line in seconds.
    ///
    /// # Errors
    ///
    /// Returns `MalformedTimestamp` if the timestamp does not decode.
    pub fn seconds(&self) -> Result<f64> {
        timestamp::decode(&self.timestamp)
    }

    /// Whether the line is a bracketed section title such as `[Chorus]`.
    #[must_use]
    pub fn is_section_marker(&self) -> bool {
        is_section_marker(&self.text)
    }
}

pub(crate) fn is_section_marker(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

/// Timed lines in playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricsDocument {
    pub lines: Vec<TimedLine>,
}

impl LyricsDocument {
    #[must_use]
    pub const fn new(lines: Vec<TimedLine>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedLine> {
        self.lines.iter()
    }
}

impl From<Vec<TimedLine>> for LyricsDocument {
    fn from(lines: Vec<TimedLine>) -> Self {
        Self::new(lines)
    }
}

impl<'a> IntoIterator for &'a LyricsDocument {
    type Item = &'a TimedLine;
    type IntoIter = std::slice::Iter<'a, TimedLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Which kind of backend produced a [`LyricsDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Real timestamps from a synchronized-lyrics lookup service
    SyncedLookup,
    /// Audio recognition service, usually with synthetic timing
    RecognitionFallback,
    Unknown,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SyncedLookup => "synced_lookup",
            Self::RecognitionFallback => "recognition_fallback",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document together with where it came from.
#[derive(Debug, Clone)]
pub struct AcquiredLyrics {
    pub document: LyricsDocument,
    pub provenance: Provenance,
    /// Name of the provider that produced the document
    pub provider: &'static str,
    /// Timestamps came from the service rather than the synthesizer
    pub synced: bool,
}

impl AcquiredLyrics {
    /// Real timing from a synchronized-lyrics lookup
    #[must_use]
    pub fn is_synced_lookup(&self) -> bool {
        self.synced && self.provenance == Provenance::SyncedLookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_line_seconds() {
        let line = TimedLine::new("Hello", "00:00:12.500");
        assert_eq!(line.seconds().unwrap(), 12.5);
    }

    #[test]
    fn test_timed_line_seconds_malformed() {
        let line = TimedLine::new("Hello", "soon");
        assert!(line.seconds().is_err());
    }

    #[test]
    fn test_section_marker() {
        assert!(TimedLine::new("[Chorus]", "00:00:00.000").is_section_marker());
        assert!(!TimedLine::new("[Chorus] sing", "00:00:00.000").is_section_marker());
    }

    #[test]
    fn test_is_synced_lookup() {
        let mut acquired = AcquiredLyrics {
            document: LyricsDocument::default(),
            provenance: Provenance::SyncedLookup,
            provider: "lrclib",
            synced: true,
        };
        assert!(acquired.is_synced_lookup());

        acquired.synced = false;
        assert!(!acquired.is_synced_lookup());

        acquired.synced = true;
        acquired.provenance = Provenance::RecognitionFallback;
        assert!(!acquired.is_synced_lookup());
    }

    #[test]
    fn test_provenance_display() {
        assert_eq!(Provenance::SyncedLookup.to_string(), "synced_lookup");
        assert_eq!(Provenance::RecognitionFallback.to_string(), "recognition_fallback");
    }
}
