//! SoundFont discovery and cache against real directories

use pirate_synth::{scan_soundfonts, soundfont_name, SoundFontCache, SynthError};
use std::fs;
use tempfile::TempDir;

#[test]
fn scan_lists_only_sf2_sorted() {
    let dir = TempDir::new().unwrap();
    for name in ["b.sf2", "A.SF2", "readme.txt", "c.sf3"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    fs::create_dir(dir.path().join("nested.sf2")).unwrap();

    let found = scan_soundfonts(dir.path()).unwrap();
    let names: Vec<String> = found.iter().map(|p| soundfont_name(p)).collect();
    assert_eq!(names, vec!["A.SF2", "b.sf2"]);
}

#[test]
fn empty_directory_has_no_soundfonts() {
    let dir = TempDir::new().unwrap();
    assert!(scan_soundfonts(dir.path()).unwrap().is_empty());
}

#[test]
fn missing_directory_is_not_found() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        scan_soundfonts(&dir.path().join("missing")),
        Err(SynthError::NotFound(_))
    ));
}

#[test]
fn cache_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("synth_library.json");
    let cache = SoundFontCache {
        soundfonts: vec![dir.path().join("piano.sf2")],
        last_selection: 0,
        last_gain: Some(0.9),
    };
    cache.save(&path).unwrap();
    assert_eq!(SoundFontCache::load(&path).unwrap(), Some(cache));
}
