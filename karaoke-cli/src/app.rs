//! Command flows shared by the interactive menu and the subcommands.

use crate::console;
use crate::interrupts::Interrupts;
use crate::renderer::{KaraokeRenderer, PlaybackOutcome};
use crossterm::style::Stylize;
use karaoke_core::{
    CoreError, KaraokeConfig, LibraryScan, LyricsFetcher, LyricsProvider, LyricsProviderType,
    LyricsQuery, SongLibrary,
};
use karaoke_lyrics_audd::AuddProvider;
use karaoke_lyrics_lrclib::LrclibProvider;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const MENU_WIDTH: usize = 50;
const BACK_CHOICE: usize = 0;
const EXIT_CHOICE: usize = 9;

pub struct App {
    config: KaraokeConfig,
    /// File the config was loaded from
    config_path: PathBuf,
    fetcher: LyricsFetcher,
    /// Text search client, present only when an API token is configured
    search: Option<AuddProvider>,
    library: SongLibrary,
    interrupts: Interrupts,
}

/// What the user asked for after a karaoke session
enum Next {
    Menu,
    Exit,
}

impl App {
    /// Build providers in the configured priority order.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created.
    pub fn new(
        config: KaraokeConfig,
        config_path: PathBuf,
        interrupts: Interrupts,
    ) -> Result<Self, CoreError> {
        let api_log = config.api_log();
        let mut providers: Vec<Box<dyn LyricsProvider>> = Vec::new();

        for provider_type in &config.lyrics.providers {
            match provider_type {
                LyricsProviderType::Lrclib => {
                    providers.push(Box::new(LrclibProvider::new(api_log.clone())?));
                }
                LyricsProviderType::Audd => match config.audd.token() {
                    Some(token) => {
                        providers.push(Box::new(AuddProvider::new(token, api_log.clone())?));
                    }
                    None => warn!("AudD is listed as a provider but no API token is configured"),
                },
            }
        }

        let search = config
            .audd
            .token()
            .map(|token| AuddProvider::new(token, api_log.clone()))
            .transpose()?;

        let fetcher = LyricsFetcher::new(providers);
        info!("Lyrics providers: {:?}", fetcher.provider_names());

        let library = SongLibrary::new(config.library.songs_dir.clone());

        Ok(Self {
            config,
            config_path,
            fetcher,
            search,
            library,
            interrupts,
        })
    }

    /// Main menu loop
    pub async fn run_interactive(&self) -> io::Result<()> {
        loop {
            println!("\n{}", console::rule(MENU_WIDTH).magenta());
            println!("{}", "KARAOKE".magenta().bold());
            println!("{}", console::rule(MENU_WIDTH).magenta());
            println!("1. Search lyrics by song and artist");
            println!("2. Karaoke from an audio file");
            println!("3. Quit");

            let Some(choice) = console::prompt("\nChoose an option (1-3): ")? else {
                return Ok(());
            };

            match choice.as_str() {
                "1" => {
                    let Some(track) = console::prompt("Song name: ")? else {
                        return Ok(());
                    };
                    let Some(artist) = console::prompt("Artist: ")? else {
                        return Ok(());
                    };
                    if track.is_empty() || artist.is_empty() {
                        console::error("Song name and artist are both required.");
                        continue;
                    }
                    self.search(&track, &artist).await;
                }
                "2" => {
                    if let Next::Exit = self.karaoke_menu().await? {
                        return Ok(());
                    }
                }
                "3" => return Ok(()),
                _ => console::error("Invalid option, please choose 1, 2 or 3."),
            }
        }
    }

    /// Song picker: 0 returns to the main menu, 9 exits the program
    async fn karaoke_menu(&self) -> io::Result<Next> {
        loop {
            let Some(songs) = self.list_songs()? else {
                console::pause("Press Enter to return to the menu...")?;
                return Ok(Next::Menu);
            };

            println!("\n{BACK_CHOICE}. Back to the main menu");
            println!("{EXIT_CHOICE}. Exit");

            let Some(answer) = console::prompt("\nChoose a song: ")? else {
                return Ok(Next::Exit);
            };
            let Some(index) = parse_song_choice(&answer, songs.len()) else {
                match answer.trim().parse::<usize>() {
                    Ok(BACK_CHOICE) => return Ok(Next::Menu),
                    Ok(EXIT_CHOICE) => return Ok(Next::Exit),
                    _ => console::error("Invalid selection."),
                }
                continue;
            };

            let path = self.library.song_path(&songs[index]);
            self.play(&path, None, None).await?;

            let again = console::prompt("\nPlay another song? (y/n): ")?.unwrap_or_default();
            if !console::is_affirmative(&again) {
                return Ok(Next::Menu);
            }
        }
    }

    /// Print the songs folder contents. `None` when there is nothing to play.
    pub fn list_songs(&self) -> io::Result<Option<Vec<String>>> {
        let root = self.library.root().display().to_string();
        match self.library.scan() {
            Ok(LibraryScan::Created) => {
                console::notice(&format!(
                    "Created the songs folder '{root}'. Add .mp3, .wav, .flac or .ogg files to it."
                ));
                Ok(None)
            }
            Ok(LibraryScan::Songs(songs)) if songs.is_empty() => {
                console::notice(&format!("No audio files found in '{root}'."));
                Ok(None)
            }
            Ok(LibraryScan::Songs(songs)) => {
                println!("\n{}", format!("Songs in '{root}':").cyan());
                for (i, song) in songs.iter().enumerate() {
                    println!("{}. {song}", i + 1);
                }
                Ok(Some(songs))
            }
            Err(CoreError::IoError(e)) => Err(e),
            Err(e) => Err(io::Error::other(e.to_string())),
        }
    }

    /// Look up plain lyrics by text and print the best match
    pub async fn search(&self, track: &str, artist: &str) {
        let Some(search) = &self.search else {
            console::error(&self.missing_token_message());
            return;
        };

        console::notice(&format!("Searching lyrics for '{track}' by '{artist}'..."));

        match search.find_lyrics(track, artist).await {
            Ok(matches) => match matches.first() {
                Some(found) => {
                    println!("\n{}", console::rule(MENU_WIDTH).cyan());
                    println!("{}", found.title.as_str().cyan().bold());
                    println!("{}", found.artist.as_str().cyan());
                    println!("{}\n", console::thin_rule(MENU_WIDTH).cyan());
                    println!("{}", found.lyrics);
                    println!("{}", console::rule(MENU_WIDTH).cyan());
                }
                None => console::error("No lyrics found for that search."),
            },
            Err(e) => {
                error!("Lyrics search failed: {}", e);
                console::error(&format!("Lyrics search failed: {e}"));
            }
        }
    }

    fn missing_token_message(&self) -> String {
        format!(
            "Lyrics search needs an AudD API token. Set [audd] api_token in {}",
            self.config_path.display()
        )
    }

    /// Acquire lyrics for an audio file and run the karaoke display.
    ///
    /// `duration_secs` and `album` narrow the synchronized lookup when known.
    pub async fn play(
        &self,
        path: &Path,
        duration_secs: Option<u32>,
        album: Option<String>,
    ) -> io::Result<()> {
        if !path.is_file() {
            console::error(&format!("Audio file not found: {}", path.display()));
            return Ok(());
        }

        let query = track_query(path, duration_secs, album);
        console::notice(&format!(
            "Looking for lyrics: {} - {}",
            query.artist_name, query.track_name
        ));

        let Some(lyrics) = self.fetcher.acquire(&query).await else {
            console::error("No lyrics could be found for this song.");
            return Ok(());
        };

        console::success(&format!(
            "Lyrics ready ({} lines, source: {}).",
            lyrics.document.len(),
            lyrics.provenance
        ));
        println!(
            "Start playing {} in your audio player.",
            path.display().to_string().bold()
        );
        console::pause("Press Enter to start the lyrics...")?;

        let guard = self.interrupts.begin_playback();
        let mut renderer =
            KaraokeRenderer::new(io::stdout(), &self.config.playback, guard.token());
        let title = path
            .file_stem()
            .map_or_else(|| query.track_name.clone(), |s| s.to_string_lossy().into_owned());

        if renderer.play(&title, &lyrics).await? == PlaybackOutcome::Cancelled {
            console::notice("Playback stopped.");
        }
        Ok(())
    }
}

/// Query for an audio file plus any lookup hints given on the command line
fn track_query(path: &Path, duration_secs: Option<u32>, album: Option<String>) -> LyricsQuery {
    let mut query = LyricsQuery::from_audio_path(path);
    if let Some(album) = album {
        query = query.with_album(album);
    }
    if let Some(duration_secs) = duration_secs {
        query = query.with_duration(duration_secs);
    }
    query
}

/// Map a 1-based menu answer to an index into the song list
fn parse_song_choice(answer: &str, song_count: usize) -> Option<usize> {
    let choice = answer.trim().parse::<usize>().ok()?;
    (1..=song_count).contains(&choice).then(|| choice - 1)
}
