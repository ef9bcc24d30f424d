//! Library scanning and cache persistence against real directories

use pirate_playback::{LastState, LibraryCache, MusicLibrary, PlaybackError, UNKNOWN_ARTIST};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ===== Helpers =====

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

fn music_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("Zeta/02 b.mp3"));
    touch(&root.join("Zeta/01 a.mp3"));
    touch(&root.join("Zeta/notes.txt"));
    touch(&root.join("Alpha/track.MP3"));
    touch(&root.join("Alpha/Folder.jpg"));
    touch(&root.join("Empty/readme.md"));
    touch(&root.join("loose.mp3"));
    dir
}

// ===== Tests =====

#[test]
fn scan_sorts_albums_and_songs() {
    let dir = music_dir();
    let library = MusicLibrary::scan(dir.path()).unwrap();

    let names: Vec<&str> = library.albums().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);

    let zeta = library.album(1).unwrap();
    assert_eq!(zeta.songs.len(), 2);
    assert!(zeta.songs[0].ends_with("01 a.mp3"));
    assert!(zeta.songs[1].ends_with("02 b.mp3"));
    assert_eq!(zeta.artist, UNKNOWN_ARTIST);
    assert!(zeta.art.is_none());
}

#[test]
fn scan_detects_art_case_insensitively() {
    let dir = music_dir();
    let library = MusicLibrary::scan(dir.path()).unwrap();
    let alpha = library.album(0).unwrap();
    assert!(alpha.art.as_ref().unwrap().ends_with("Folder.jpg"));
}

#[test]
fn scan_of_missing_directory_is_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        MusicLibrary::scan(&missing),
        Err(PlaybackError::NotFound(_))
    ));
}

#[test]
fn empty_directory_gives_empty_library() {
    let dir = TempDir::new().unwrap();
    let library = MusicLibrary::scan(dir.path()).unwrap();
    assert!(library.is_empty());
}

#[test]
fn cache_round_trips_state() {
    let music = music_dir();
    let out = TempDir::new().unwrap();
    let path = out.path().join("state/player_library.json");

    let library = MusicLibrary::scan(music.path()).unwrap();
    let state = LastState {
        album_index: 1,
        song_index: 1,
        volume: 0.42,
    };
    LibraryCache::new(&library, state).save(&path).unwrap();

    let loaded = LibraryCache::load(&path).unwrap().unwrap();
    assert_eq!(loaded.last_state, state);
    assert_eq!(loaded.library(), library);
}

#[test]
fn cache_tolerates_missing_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("player_library.json");
    fs::write(
        &path,
        r#"{"database":[{"album":"A","artist":"Unknown Artist","art_path":null,"songs":["/m/A/x.mp3"]}],"last_state":{"song_index":0}}"#,
    )
    .unwrap();

    let cache = LibraryCache::load(&path).unwrap().unwrap();
    assert_eq!(cache.database.len(), 1);
    assert_eq!(cache.last_state.volume, 1.0);
}

#[test]
fn missing_cache_is_none_and_corrupt_cache_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("player_library.json");
    assert!(LibraryCache::load(&path).unwrap().is_none());

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        LibraryCache::load(&path),
        Err(PlaybackError::Serialization(_))
    ));
}
