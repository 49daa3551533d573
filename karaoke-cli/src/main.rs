mod app;
mod console;
mod interrupts;
mod renderer;

use crate::app::App;
use crate::interrupts::Interrupts;
use clap::{Parser, Subcommand};
use karaoke_core::{CoreError, KaraokeConfig, TomlParseError};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Terminal karaoke: synchronized lyrics lookup with an audio recognition fallback
#[derive(Parser, Debug)]
#[command(name = "karaoke", version, about)]
struct Cli {
    /// Path to the config file (defaults to ~/.config/karaoke/config.toml)
    #[arg(short, long, env = "KARAOKE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search plain lyrics by song and artist name
    Search {
        /// Song name
        track: String,
        /// Artist name
        artist: String,
    },
    /// Show timed lyrics for an audio file
    Play {
        /// Audio file, ideally named "Title - Artist.ext"
        file: PathBuf,
        /// Track length in seconds, narrows the synchronized lookup
        #[arg(short, long)]
        duration: Option<u32>,
        /// Album name, narrows the synchronized lookup
        #[arg(short, long)]
        album: Option<String>,
    },
    /// List the audio files in the songs folder
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(KaraokeConfig::config_path);

    // Check config for logging.enabled before full config load
    init_tracing(check_file_logging_enabled(&config_path));

    let config = match KaraokeConfig::load_or_create(&config_path) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            println!("Created a new config file at {}", path.display());
            println!("Add your AudD API token to it, then run karaoke again.");
            std::process::exit(0);
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            report_parse_error(&parse_error, &config_path);
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            console::error(&e.to_string());
            std::process::exit(1);
        }
    };

    let interrupts = Interrupts::default();
    if let Err(e) = interrupts.install() {
        error!("Failed to set Ctrl+C handler: {e}");
    }

    let app = match App::new(config, config_path, interrupts) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize lyrics providers: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        None => app.run_interactive().await,
        Some(Command::Search { track, artist }) => {
            app.search(&track, &artist).await;
            Ok(())
        }
        Some(Command::Play {
            file,
            duration,
            album,
        }) => app.play(&file, duration, album).await,
        Some(Command::List) => app.list_songs().map(|_| ()),
    };

    if let Err(e) = result {
        error!("Terminal I/O failed: {e}");
        std::process::exit(1);
    }

    info!("Goodbye");
}

fn report_parse_error(parse_error: &TomlParseError, config_path: &Path) {
    error!("Invalid config {}: {parse_error}", config_path.display());
    console::error(&format!(
        "The config file {} could not be parsed:",
        config_path.display()
    ));
    eprintln!("{parse_error}");
    eprintln!("Fix the file, or delete it to have a fresh template generated.");
}

/// Read only `logging.enabled` so tracing can start before the full config load
fn check_file_logging_enabled(config_path: &Path) -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging.
///
/// The console defaults to `warn`; the file always records `info` and above.
fn init_tracing(file_logging_enabled: bool) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    if file_logging_enabled {
        let log_path = karaoke_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_filter(EnvFilter::new("info"));

                tracing_subscriber::registry()
                    .with(console_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry().with(console_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_file_logging_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(!check_file_logging_enabled(&path));

        std::fs::write(&path, "[logging]\nenabled = true\n").unwrap();
        assert!(check_file_logging_enabled(&path));

        std::fs::write(&path, "[logging\nenabled = true\n").unwrap();
        assert!(!check_file_logging_enabled(&path));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["karaoke", "search", "Yesterday", "The Beatles"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Search { ref track, ref artist })
                if track == "Yesterday" && artist == "The Beatles"
        ));

        let cli = Cli::try_parse_from(["karaoke", "--config", "/tmp/k.toml", "list"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));
        assert!(matches!(cli.command, Some(Command::List)));

        let cli = Cli::try_parse_from(["karaoke"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_play_lookup_hints() {
        let cli = Cli::try_parse_from([
            "karaoke",
            "play",
            "sounds/Help! - The Beatles.mp3",
            "--duration",
            "139",
            "--album",
            "Help!",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Play { duration: Some(139), album: Some(ref album), .. }) if album == "Help!"
        ));

        let cli = Cli::try_parse_from(["karaoke", "play", "song.mp3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Play {
                duration: None,
                album: None,
                ..
            })
        ));
    }
}
