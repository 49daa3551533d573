//! Parser for synchronized lyrics in LRC form.
//!
//! Only the `[mm:ss]` and `[mm:ss.cc]` line markers are understood. Lines
//! without a leading marker (ID tags, comments, stray text) and markers
//! without lyric text are dropped rather than reported.

use crate::lyrics::{LyricsDocument, TimedLine};

/// A leading `[mm:ss]` or `[mm:ss.cc]` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LrcMarker {
    pub minutes: u8,
    pub seconds: u8,
    pub centiseconds: u8,
}

impl LrcMarker {
    /// Offset of the marker in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.centiseconds) / 100.0
    }

    /// `HH:MM:SS.fff` form with hours fixed at zero.
    ///
    /// Centiseconds become milliseconds by appending a zero digit.
    #[must_use]
    pub fn timestamp(&self) -> String {
        format!(
            "00:{:02}:{:02}.{:02}0",
            self.minutes, self.seconds, self.centiseconds
        )
    }
}

/// Parse LRC text into timed lines, keeping input order.
#[must_use]
pub fn parse_synchronized_lyrics(raw: &str) -> LyricsDocument {
    let lines = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let (marker, rest) = parse_marker(line)?;
            let text = rest.trim();
            if text.is_empty() {
                return None;
            }
            Some(TimedLine::new(text, marker.timestamp()))
        })
        .collect();

    LyricsDocument::new(lines)
}

/// Split a leading marker from the rest of the line.
#[must_use]
pub fn parse_marker(line: &str) -> Option<(LrcMarker, &str)> {
    let rest = line.strip_prefix('[')?;
    let (minutes, rest) = take_two_digits(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (seconds, rest) = take_two_digits(rest)?;

    let (centiseconds, rest) = match rest.strip_prefix('.') {
        Some(fraction) => take_two_digits(fraction)?,
        None => (0, rest),
    };
    let rest = rest.strip_prefix(']')?;

    Some((
        LrcMarker {
            minutes,
            seconds,
            centiseconds,
        },
        rest,
    ))
}

fn take_two_digits(s: &str) -> Option<(u8, &str)> {
    match s.as_bytes() {
        [tens @ b'0'..=b'9', ones @ b'0'..=b'9', ..] => {
            Some(((tens - b'0') * 10 + (ones - b'0'), &s[2..]))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp;

    #[test]
    fn test_parse_mixed_input() {
        let doc = parse_synchronized_lyrics("[00:12.50]Hello\n[00:15]World\nNotALine\n[00:20.00]");
        assert_eq!(
            doc.lines,
            vec![
                TimedLine::new("Hello", "00:00:12.500"),
                TimedLine::new("World", "00:00:15.000"),
            ]
        );
    }

    #[test]
    fn test_parse_multiple_lines() {
        let input = r"
[00:05.00]First line
[00:10.00]Second line
[00:15.00]Third line
";
        let doc = parse_synchronized_lyrics(input);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.lines[0].text, "First line");
        assert_eq!(doc.lines[1].text, "Second line");
        assert_eq!(doc.lines[2].text, "Third line");
    }

    #[test]
    fn test_id_tags_are_dropped() {
        let input = r"
[ti:Song Title]
[ar:Artist Name]
[offset:500]
[00:05.00]Lyrics here
";
        let doc = parse_synchronized_lyrics(input);
        assert_eq!(doc.lines, vec![TimedLine::new("Lyrics here", "00:00:05.000")]);
    }

    #[test]
    fn test_text_is_trimmed() {
        let doc = parse_synchronized_lyrics("[01:02.03]   spaced out   \r\n");
        assert_eq!(doc.lines, vec![TimedLine::new("spaced out", "00:01:02.030")]);
    }

    #[test]
    fn test_keeps_input_order() {
        let doc = parse_synchronized_lyrics("[00:30.00]Later\n[00:10.00]Earlier");
        assert_eq!(doc.lines[0].text, "Later");
        assert_eq!(doc.lines[1].text, "Earlier");
    }

    #[test]
    fn test_rejects_non_two_digit_markers() {
        let input = "[0:05.00]one digit minute\n[00:5.00]one digit second\n[00:05.5]one digit centis\n[00:05.000]three digit fraction\n[00:05:00]colon fraction";
        assert!(parse_synchronized_lyrics(input).is_empty());
    }

    #[test]
    fn test_marker_must_start_the_line() {
        assert!(parse_synchronized_lyrics("  [00:05.00]indented").is_empty());
        assert!(parse_synchronized_lyrics("lead [00:05.00]text").is_empty());
    }

    #[test]
    fn test_only_first_marker_is_consumed() {
        let doc = parse_synchronized_lyrics("[00:05.00][00:15.00]Repeated lyric");
        assert_eq!(
            doc.lines,
            vec![TimedLine::new("[00:15.00]Repeated lyric", "00:00:05.000")]
        );
    }

    #[test]
    fn test_cjk_lyrics() {
        let doc = parse_synchronized_lyrics("[00:05.00]你好世界");
        assert_eq!(doc.lines[0].text, "你好世界");
    }

    #[test]
    fn test_timestamp_encodes_marker_offset() {
        let (marker, rest) = parse_marker("[03:07.42]text").unwrap();
        assert_eq!(rest, "text");
        let decoded = timestamp::decode(&marker.timestamp()).unwrap();
        assert!((decoded - marker.total_seconds()).abs() < 1e-9);
        assert_eq!(marker.timestamp(), "00:03:07.420");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_synchronized_lyrics("").is_empty());
        assert!(parse_synchronized_lyrics("\n  \n\t\n").is_empty());
    }
}
