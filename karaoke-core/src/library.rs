//! Local folder of audio files offered for karaoke.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Audio file extensions offered for karaoke (compared case-insensitively)
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "flac", "ogg"];

/// Result of scanning the songs folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryScan {
    /// The folder did not exist and has just been created
    Created,
    /// File names of the audio files found, sorted
    Songs(Vec<String>),
}

/// A folder of audio files
#[derive(Debug, Clone)]
pub struct SongLibrary {
    root: PathBuf,
}

impl SongLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a song file name returned by [`SongLibrary::scan`]
    #[must_use]
    pub fn song_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// List audio files, creating the folder when it is missing.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the folder cannot be created or read.
    pub fn scan(&self) -> Result<LibraryScan> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
            info!("Created songs folder at {}", self.root.display());
            return Ok(LibraryScan::Created);
        }

        let mut songs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_audio_file(Path::new(&name)) {
                songs.push(name);
            }
        }
        songs.sort();
        Ok(LibraryScan::Songs(songs))
    }
}

/// Whether the path has one of the supported audio extensions
#[must_use]
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("song.mp3")));
        assert!(is_audio_file(Path::new("Song - Artist.FLAC")));
        assert!(!is_audio_file(Path::new("notes.txt")));
        assert!(!is_audio_file(Path::new("mp3")));
    }

    #[test]
    fn test_scan_creates_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let library = SongLibrary::new(dir.path().join("sounds"));
        assert_eq!(library.scan().unwrap(), LibraryScan::Created);
        assert!(library.root().is_dir());
        assert_eq!(library.scan().unwrap(), LibraryScan::Songs(vec![]));
    }

    #[test]
    fn test_scan_lists_sorted_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b - artist.wav", "a - artist.mp3", "cover.jpg", "c.ogg"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("folder.mp3")).unwrap();

        let library = SongLibrary::new(dir.path());
        assert_eq!(
            library.scan().unwrap(),
            LibraryScan::Songs(vec![
                "a - artist.mp3".to_string(),
                "b - artist.wav".to_string(),
                "c.ogg".to_string(),
            ])
        );
        assert_eq!(library.song_path("c.ogg"), dir.path().join("c.ogg"));
    }
}
