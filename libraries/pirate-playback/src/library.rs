//! Music library scanning
//!
//! The library is flat: every directory directly under the music directory
//! is an album, and its `*.mp3` files are the album's songs.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Artist shown for every album (files are not tag-parsed)
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Supported song extension
const SONG_EXTENSION: &str = "mp3";

/// File name endings recognised as album art, in priority order
const ART_SUFFIXES: [&str; 4] = ["art.jpg", "art.png", "folder.jpg", "folder.png"];

/// One album directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Directory name
    #[serde(rename = "album")]
    pub name: String,

    pub artist: String,

    /// Album art image, if the directory has one
    #[serde(rename = "art_path")]
    pub art: Option<PathBuf>,

    /// Song files, sorted by file name
    pub songs: Vec<PathBuf>,
}

/// Display title of a song file (file name without `.mp3`)
pub fn song_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ordered set of albums
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicLibrary {
    albums: Vec<Album>,
}

impl MusicLibrary {
    pub fn new(albums: Vec<Album>) -> Self {
        Self { albums }
    }

    /// Scan `music_dir` for album directories
    ///
    /// Albums are sorted by directory name. Directories without songs are
    /// skipped. Fails with `NotFound` if `music_dir` does not exist.
    pub fn scan(music_dir: &Path) -> Result<Self> {
        if !music_dir.is_dir() {
            return Err(PlaybackError::NotFound(music_dir.to_path_buf()));
        }
        info!(dir = %music_dir.display(), "Scanning music directory");

        let mut albums = Vec::new();
        for entry in WalkDir::new(music_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_dir() {
                continue;
            }
            match scan_album(entry.path()) {
                Ok(Some(album)) => albums.push(album),
                Ok(None) => debug!(dir = %entry.path().display(), "Skipping directory without songs"),
                Err(e) => warn!(dir = %entry.path().display(), error = %e, "Skipping unreadable album"),
            }
        }

        info!(albums = albums.len(), "Music scan complete");
        Ok(Self { albums })
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn album(&self, index: usize) -> Option<&Album> {
        self.albums.get(index)
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    /// Number of songs in album `index` (0 if out of range)
    pub fn song_count(&self, album: usize) -> usize {
        self.album(album).map_or(0, |a| a.songs.len())
    }

    /// Song file at (`album`, `song`)
    pub fn song(&self, album: usize, song: usize) -> Option<&Path> {
        self.album(album)
            .and_then(|a| a.songs.get(song))
            .map(PathBuf::as_path)
    }

    /// Whether (`album`, `song`) points at an existing entry
    pub fn contains(&self, album: usize, song: usize) -> bool {
        self.song(album, song).is_some()
    }
}

fn scan_album(dir: &Path) -> Result<Option<Album>> {
    let mut songs = Vec::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PlaybackError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let is_song = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SONG_EXTENSION));
        if is_song {
            songs.push(path);
        } else {
            files.push(path);
        }
    }

    if songs.is_empty() {
        return Ok(None);
    }

    let art = find_art(&files);
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(Album {
        name,
        artist: UNKNOWN_ARTIST.to_string(),
        art,
        songs,
    }))
}

fn find_art(files: &[PathBuf]) -> Option<PathBuf> {
    ART_SUFFIXES.iter().find_map(|suffix| {
        files
            .iter()
            .find(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .is_some_and(|n| n.ends_with(suffix))
            })
            .cloned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_extension() {
        assert_eq!(song_title(Path::new("/m/A/01 - Intro.mp3")), "01 - Intro");
    }

    #[test]
    fn art_priority_follows_suffix_order() {
        let files = vec![
            PathBuf::from("/m/A/Folder.PNG"),
            PathBuf::from("/m/A/cover_art.jpg"),
        ];
        assert_eq!(find_art(&files), Some(PathBuf::from("/m/A/cover_art.jpg")));
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let library = MusicLibrary::default();
        assert!(library.song(0, 0).is_none());
        assert_eq!(library.song_count(3), 0);
    }
}
