//! Synthetic timing for lyrics that arrive without synchronization data.
//!
//! Every line gets a display duration estimated from its content, and the
//! running total of those durations positions the following line. A line's
//! own duration never affects its own timestamp.

use crate::lyrics::{is_section_marker, LyricsDocument, TimedLine};
use crate::timestamp;
use std::time::Duration;

const BASE: Duration = Duration::from_secs(4);
const SECTION_MARKER: Duration = Duration::from_secs(1);
const CHORUS_BONUS: Duration = Duration::from_secs(3);
const LONG_LINE_BONUS: Duration = Duration::from_secs(2);
const SHORT_LINE_PENALTY: Duration = Duration::from_secs(1);

/// Lines with more spaces than this count as long.
const LONG_LINE_SPACES: usize = 8;
/// Lines with fewer spaces than this count as short.
const SHORT_LINE_SPACES: usize = 3;

const CHORUS_WORDS: [&str; 4] = ["chorus", "refrain", "coro", "estribillo"];
const VERSE_WORDS: [&str; 4] = ["verse", "verso", "strophe", "estrofa"];

/// Assign synthetic timestamps to already-filtered, non-empty lines.
///
/// The first line always starts at `00:00:00.000`.
#[must_use]
pub fn synthesize_timings<S: AsRef<str>>(lines: &[S]) -> LyricsDocument {
    let mut clock = Duration::ZERO;
    let lines = lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            let timed = TimedLine::new(line, timestamp::encode_duration(clock));
            clock += line_duration(line);
            timed
        })
        .collect();

    LyricsDocument::new(lines)
}

/// Estimated time a line stays on screen before the next one.
#[must_use]
pub fn line_duration(line: &str) -> Duration {
    if is_section_marker(line) {
        return SECTION_MARKER;
    }

    let base = BASE + length_bonus(line.chars().count());
    let lower = line.to_lowercase();

    if CHORUS_WORDS.iter().any(|word| lower.contains(word)) {
        return base + CHORUS_BONUS;
    }
    if VERSE_WORDS.iter().any(|word| lower.contains(word)) {
        return base;
    }

    let spaces = line.chars().filter(|&c| c == ' ').count();
    if spaces > LONG_LINE_SPACES {
        base + LONG_LINE_BONUS
    } else if spaces < SHORT_LINE_SPACES {
        base - SHORT_LINE_PENALTY
    } else {
        base
    }
}

const fn length_bonus(chars: usize) -> Duration {
    match chars {
        0..=19 => Duration::from_secs(2),
        20..=39 => Duration::from_secs(4),
        40..=59 => Duration::from_secs(6),
        _ => Duration::from_secs(8),
    }
}
