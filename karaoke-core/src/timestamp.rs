//! Conversion between `HH:MM:SS.fff` timestamps and playback offsets.
//!
//! Both the LRC parser and the timing synthesizer emit this form, and the
//! renderer decodes it back into seconds to compute inter-line delays.

use crate::error::{CoreError, Result};
use std::time::Duration;

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// Widest hour field accepted by [`decode`].
const MAX_HOUR_DIGITS: usize = 2;

/// Encode an offset in seconds as `HH:MM:SS.fff`.
///
/// Sub-millisecond precision is truncated, not rounded. Negative and
/// non-finite offsets encode as `00:00:00.000`.
#[must_use]
pub fn encode(total_seconds: f64) -> String {
    encode_millis(seconds_to_millis(total_seconds))
}

/// Encode a [`Duration`] offset as `HH:MM:SS.fff`.
#[must_use]
pub fn encode_duration(offset: Duration) -> String {
    encode_millis(u64::try_from(offset.as_millis()).unwrap_or(u64::MAX))
}

/// Encode a whole number of milliseconds as `HH:MM:SS.fff`.
#[must_use]
pub fn encode_millis(total_millis: u64) -> String {
    let hours = total_millis / MILLIS_PER_HOUR;
    let minutes = (total_millis / MILLIS_PER_MINUTE) % 60;
    let seconds = (total_millis / MILLIS_PER_SECOND) % 60;
    let millis = total_millis % MILLIS_PER_SECOND;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Decode `H:MM:SS.fff`, `HH:MM:SS.fff` or `MM:SS.fff` into seconds.
///
/// The digits after the decimal point count milliseconds.
///
/// # Errors
///
/// Returns [`CoreError::MalformedTimestamp`] when the text has the wrong
/// number of fields, lacks the fractional part, or contains a field that is
/// not a non-negative integer.
pub fn decode(text: &str) -> Result<f64> {
    let millis = decode_millis(text)?;
    #[allow(clippy::cast_precision_loss)]
    Ok(millis as f64 / 1000.0)
}

/// Decode a timestamp into a [`Duration`].
///
/// # Errors
///
/// Same failure modes as [`decode`].
pub fn decode_duration(text: &str) -> Result<Duration> {
    decode_millis(text).map(Duration::from_millis)
}

/// Decode a timestamp into whole milliseconds.
///
/// # Errors
///
/// Same failure modes as [`decode`].
pub fn decode_millis(text: &str) -> Result<u64> {
    let fields: Vec<&str> = text.split(':').collect();

    let (hours, minutes, seconds_field) = match fields.as_slice() {
        [hours, minutes, seconds] => {
            if hours.len() > MAX_HOUR_DIGITS {
                return Err(CoreError::malformed(text, "hour field wider than two digits"));
            }
            (
                parse_field(text, hours, "hours")?,
                parse_field(text, minutes, "minutes")?,
                *seconds,
            )
        }
        [minutes, seconds] => (0, parse_field(text, minutes, "minutes")?, *seconds),
        _ => {
            return Err(CoreError::malformed(
                text,
                format!("expected 2 or 3 colon-separated fields, found {}", fields.len()),
            ))
        }
    };

    let Some((seconds, fraction)) = seconds_field.split_once('.') else {
        return Err(CoreError::malformed(text, "missing fractional seconds"));
    };
    let seconds = parse_field(text, seconds, "seconds")?;
    let fraction = parse_field(text, fraction, "fraction")?;

    hours
        .checked_mul(MILLIS_PER_HOUR)
        .and_then(|total| total.checked_add(minutes.checked_mul(MILLIS_PER_MINUTE)?))
        .and_then(|total| total.checked_add(seconds.checked_mul(MILLIS_PER_SECOND)?))
        .and_then(|total| total.checked_add(fraction))
        .ok_or_else(|| CoreError::malformed(text, "offset out of range"))
}

fn parse_field(text: &str, field: &str, name: &str) -> Result<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::malformed(
            text,
            format!("{name} field {field:?} is not a non-negative integer"),
        ));
    }
    field
        .parse()
        .map_err(|_| CoreError::malformed(text, format!("{name} field {field:?} out of range")))
}

/// Truncate seconds to whole milliseconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_millis(total_seconds: f64) -> u64 {
    if !total_seconds.is_finite() || total_seconds <= 0.0 {
        return 0;
    }
    // Nudge absorbs binary representation error, e.g. 0.29 * 1000 = 289.999...
    (total_seconds * 1000.0 + 1e-6).floor() as u64
}
