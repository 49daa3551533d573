//! Terminal karaoke display driven by line timestamps.
//!
//! Playback of the audio itself is manual; the renderer only paces the text.

use crossterm::cursor::MoveTo;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use karaoke_core::{AcquiredLyrics, CoreError, PlaybackConfig, Provenance, TimedLine};
use std::io::{self, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const BANNER_WIDTH: usize = 70;

/// Typewriter pauses after each character
const TYPE_DELAY_SPACE: Duration = Duration::from_millis(20);
const TYPE_DELAY_PUNCTUATION: Duration = Duration::from_millis(50);
const TYPE_DELAY_DEFAULT: Duration = Duration::from_millis(10);

/// Pause after the closing banner
const OUTRO_PAUSE: Duration = Duration::from_secs(3);

/// How long to wait between two displayed lines
#[derive(Debug)]
pub enum LineDelay {
    /// Gap between the two timestamps, clamped
    Timed(Duration),
    /// A timestamp failed to decode and the fixed fallback applies
    Fallback { delay: Duration, error: CoreError },
}

impl LineDelay {
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Timed(delay) | Self::Fallback { delay, .. } => *delay,
        }
    }
}

/// Clamp range and fallback for inter-line delays
#[derive(Debug, Clone, Copy)]
pub struct DelayPolicy {
    min_secs: f64,
    max_secs: f64,
    fallback_secs: f64,
}

impl DelayPolicy {
    pub const fn new(min_secs: f64, max_secs: f64, fallback_secs: f64) -> Self {
        Self {
            min_secs,
            max_secs,
            fallback_secs,
        }
    }

    pub const fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(
            config.min_line_delay_secs,
            config.max_line_delay_secs,
            config.fallback_line_delay_secs,
        )
    }

    pub fn line_delay(&self, current: &TimedLine, next: &TimedLine) -> LineDelay {
        match current.seconds().and_then(|start| Ok(next.seconds()? - start)) {
            Ok(gap) => LineDelay::Timed(Duration::from_secs_f64(
                gap.clamp(self.min_secs, self.max_secs),
            )),
            Err(error) => LineDelay::Fallback {
                delay: Duration::from_secs_f64(self.fallback_secs),
                error,
            },
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Cancelled,
}

/// Writes timed lyrics to a terminal
pub struct KaraokeRenderer<W: Write> {
    out: W,
    policy: DelayPolicy,
    countdown: Duration,
    typewriter: bool,
    cancel_token: CancellationToken,
}

impl<W: Write> KaraokeRenderer<W> {
    pub fn new(out: W, config: &PlaybackConfig, cancel_token: CancellationToken) -> Self {
        Self {
            out,
            policy: DelayPolicy::from_config(config),
            countdown: config.countdown(),
            typewriter: config.typewriter,
            cancel_token,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Show every line of the document, pacing by timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub async fn play(
        &mut self,
        title: &str,
        lyrics: &AcquiredLyrics,
    ) -> io::Result<PlaybackOutcome> {
        let lines = &lyrics.document.lines;
        if lines.is_empty() {
            writeln!(self.out, "{}", "No synchronized lyrics to show.".red())?;
            return Ok(PlaybackOutcome::Finished);
        }

        info!(
            "Starting karaoke for {} ({} lines from {}, {})",
            title,
            lines.len(),
            lyrics.provider,
            lyrics.provenance
        );

        writeln!(
            self.out,
            "\n{}\n",
            format!("Karaoke starts in {} seconds!", self.countdown.as_secs()).bold()
        )?;
        self.out.flush()?;
        if !self.pause(self.countdown).await {
            return Ok(PlaybackOutcome::Cancelled);
        }

        self.write_header(title, lyrics)?;

        let typewriter = self.typewriter && lyrics.is_synced_lookup();

        for (i, line) in lines.iter().enumerate() {
            if line.is_section_marker() {
                continue;
            }

            writeln!(self.out)?;
            if typewriter {
                if !self.type_out(&line.text).await? {
                    return Ok(PlaybackOutcome::Cancelled);
                }
            } else {
                writeln!(self.out, "{}", line.text.as_str().white().bold())?;
            }
            self.out.flush()?;

            if let Some(next) = lines.get(i + 1) {
                let delay = self.policy.line_delay(line, next);
                if let LineDelay::Fallback { error, delay } = &delay {
                    warn!("Bad timestamp, waiting a fixed {:?}: {}", delay, error);
                    writeln!(
                        self.out,
                        "{}",
                        format!("Timestamp error, using fixed delay: {error}").dark_grey()
                    )?;
                    self.out.flush()?;
                }
                if !self.pause(delay.duration()).await {
                    return Ok(PlaybackOutcome::Cancelled);
                }
            }
        }

        self.write_footer()?;
        if !self.pause(OUTRO_PAUSE).await {
            return Ok(PlaybackOutcome::Cancelled);
        }
        Ok(PlaybackOutcome::Finished)
    }

    fn write_header(&mut self, title: &str, lyrics: &AcquiredLyrics) -> io::Result<()> {
        let rule = "=".repeat(BANNER_WIDTH);
        let thin_rule = "-".repeat(BANNER_WIDTH);

        self.out.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
        writeln!(self.out, "{}", rule.as_str().cyan())?;
        writeln!(self.out, "{}", format!("KARAOKE - {title}").yellow().bold())?;
        writeln!(self.out, "{}", rule.as_str().cyan())?;

        match (lyrics.provenance, lyrics.synced) {
            (Provenance::SyncedLookup, true) => {
                writeln!(
                    self.out,
                    "{}",
                    format!("Source: {} - real synchronized lyrics", lyrics.provider).green()
                )?;
                writeln!(self.out, "{}", "Timestamps follow the recording".green())?;
            }
            (Provenance::RecognitionFallback, synced) => {
                writeln!(
                    self.out,
                    "{}",
                    format!("Source: {} - audio recognition", lyrics.provider).yellow()
                )?;
                let timing = if synced {
                    "Timestamps supplied by the recognition service"
                } else {
                    "Timing is estimated from the lyrics"
                };
                writeln!(self.out, "{}", timing.yellow())?;
            }
            (_, false) => {
                writeln!(
                    self.out,
                    "{}",
                    format!("Source: {} - plain lyrics", lyrics.provider).yellow()
                )?;
                writeln!(self.out, "{}", "Timing is estimated from the lyrics".yellow())?;
            }
            (Provenance::Unknown, true) => {
                writeln!(
                    self.out,
                    "{}",
                    format!("Source: {}", lyrics.provider).white()
                )?;
            }
        }

        writeln!(self.out, "{}", thin_rule.as_str().cyan())?;
        writeln!(self.out, "{}", "Sing along!".green())?;
        writeln!(self.out, "{}", thin_rule.as_str().cyan())?;
        self.out.flush()
    }

    fn write_footer(&mut self) -> io::Result<()> {
        let rule = "=".repeat(BANNER_WIDTH);
        writeln!(self.out, "\n{}", rule.as_str().cyan())?;
        writeln!(self.out, "{}", "SONG FINISHED!".green().bold())?;
        writeln!(self.out, "{}", "Thanks for singing along!".yellow())?;
        writeln!(self.out, "{}", rule.as_str().cyan())?;
        self.out.flush()
    }

    /// Print a line character by character. Returns `false` if cancelled.
    async fn type_out(&mut self, text: &str) -> io::Result<bool> {
        for c in text.chars() {
            write!(self.out, "{c}")?;
            self.out.flush()?;
            if !self.pause(typing_delay(c)).await {
                writeln!(self.out)?;
                return Ok(false);
            }
        }
        writeln!(self.out)?;
        Ok(true)
    }

    /// Sleep unless cancelled first. Returns `false` if cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel_token.cancelled() => {
                info!("Karaoke playback cancelled");
                false
            }
            () = tokio::time::sleep(duration) => true,
        }
    }
}

const fn typing_delay(c: char) -> Duration {
    match c {
        ' ' => TYPE_DELAY_SPACE,
        '.' | ',' | '!' | '?' => TYPE_DELAY_PUNCTUATION,
        _ => TYPE_DELAY_DEFAULT,
    }
}
