//! Response shapes returned by the AudD API.
//!
//! The `lyrics` field of a recognition result arrives as plain text, a list
//! of timed entries, or an object wrapping the text, so it is decoded into
//! [`AuddLyrics`] and then normalized into a [`LyricsPayload`].

use karaoke_core::{timestamp, LyricsPayload, TimedLine};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

pub(crate) const STATUS_SUCCESS: &str = "success";

/// Envelope shared by every AudD endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub status: String,
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Recognized song from the audio upload endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct RecognitionResult {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub song_link: Option<String>,
    #[serde(default)]
    pub lyrics: Option<Value>,
}

/// Lyrics in any of the shapes AudD has been seen to return
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AuddLyrics {
    Text(String),
    Lines(Vec<AuddLine>),
    Nested { lyrics: Value },
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuddLine {
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A match from the text search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LyricsMatch {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub lyrics: String,
}

/// Normalize the raw `lyrics` value of a recognition result
pub(crate) fn payload_from_lyrics(value: Value) -> LyricsPayload {
    let lyrics = match serde_json::from_value::<AuddLyrics>(value) {
        Ok(lyrics) => lyrics,
        Err(e) => {
            warn!("Unrecognized AudD lyrics format: {}", e);
            return LyricsPayload::NotFound;
        }
    };

    match lyrics {
        AuddLyrics::Text(text) => {
            debug!("AudD lyrics arrived as plain text");
            LyricsPayload::Unsynced(text)
        }
        AuddLyrics::Lines(lines) => payload_from_lines(lines),
        AuddLyrics::Nested {
            lyrics: Value::String(text),
        } => {
            debug!("AudD lyrics arrived wrapped in an object");
            LyricsPayload::Unsynced(text)
        }
        AuddLyrics::Nested { lyrics } => {
            warn!("Unrecognized nested AudD lyrics format: {}", lyrics);
            LyricsPayload::NotFound
        }
    }
}

/// Keep the service's timing only when every entry carries a valid timestamp
fn payload_from_lines(lines: Vec<AuddLine>) -> LyricsPayload {
    let all_timed = lines.iter().all(|line| {
        line.timestamp
            .as_deref()
            .is_some_and(|ts| timestamp::decode(ts).is_ok())
    });

    if all_timed {
        debug!("AudD lyrics arrived as {} timed entries", lines.len());
        let timed = lines
            .into_iter()
            .filter_map(|line| {
                let text = line.text.trim();
                let ts = line.timestamp?;
                (!text.is_empty()).then(|| TimedLine::new(text, ts))
            })
            .collect();
        return LyricsPayload::Timed(timed);
    }

    debug!("AudD lyric entries lack usable timestamps, treating them as plain text");
    let text = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    LyricsPayload::Unsynced(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string() {
        assert_eq!(
            payload_from_lyrics(json!("Line one\nLine two")),
            LyricsPayload::Unsynced("Line one\nLine two".into())
        );
    }

    #[test]
    fn test_nested_object() {
        let value = json!({"song_id": "1", "title": "Song", "lyrics": "Nested words"});
        assert_eq!(
            payload_from_lyrics(value),
            LyricsPayload::Unsynced("Nested words".into())
        );
    }

    #[test]
    fn test_nested_non_string_is_not_found() {
        assert_eq!(
            payload_from_lyrics(json!({"lyrics": {"deeper": true}})),
            LyricsPayload::NotFound
        );
    }

    #[test]
    fn test_timed_list() {
        let value = json!([
            {"text": "First", "timestamp": "00:00:01.000"},
            {"text": "  ", "timestamp": "00:00:02.000"},
            {"text": "Second", "timestamp": "00:03.500"}
        ]);
        assert_eq!(
            payload_from_lyrics(value),
            LyricsPayload::Timed(vec![
                TimedLine::new("First", "00:00:01.000"),
                TimedLine::new("Second", "00:03.500"),
            ])
        );
    }

    #[test]
    fn test_list_with_bad_timestamp_becomes_plain() {
        let value = json!([
            {"text": "First", "timestamp": "00:00:01.000"},
            {"text": "Second", "timestamp": "later"},
            {"text": "Third"}
        ]);
        assert_eq!(
            payload_from_lyrics(value),
            LyricsPayload::Unsynced("First\nSecond\nThird".into())
        );
    }

    #[test]
    fn test_unrecognized_shape() {
        assert_eq!(payload_from_lyrics(json!(42)), LyricsPayload::NotFound);
        assert_eq!(payload_from_lyrics(json!([1, 2])), LyricsPayload::NotFound);
    }

    #[test]
    fn test_recognition_envelope() {
        let envelope: Envelope<RecognitionResult> = serde_json::from_value(json!({
            "status": "success",
            "result": {"artist": "Queen", "title": "Bohemian Rhapsody", "lyrics": "Is this"}
        }))
        .unwrap();
        assert!(envelope.is_success());
        let result = envelope.result.unwrap();
        assert_eq!(result.title.as_deref(), Some("Bohemian Rhapsody"));
        assert!(result.lyrics.is_some());
    }

    #[test]
    fn test_envelope_without_result() {
        let envelope: Envelope<RecognitionResult> =
            serde_json::from_value(json!({"status": "success", "result": null})).unwrap();
        assert!(envelope.result.is_none());
    }

    #[test]
    fn test_search_matches() {
        let envelope: Envelope<Vec<LyricsMatch>> = serde_json::from_value(json!({
            "status": "success",
            "result": [{"title": "Song", "artist": "Band", "lyrics": "La la", "song_id": 5}]
        }))
        .unwrap();
        assert_eq!(
            envelope.result.unwrap(),
            vec![LyricsMatch {
                title: "Song".into(),
                artist: "Band".into(),
                lyrics: "La la".into(),
            }]
        );
    }
}
