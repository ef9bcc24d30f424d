//! SoundFont discovery

use crate::error::{Result, SynthError};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const SOUNDFONT_EXTENSION: &str = "sf2";

/// List the `*.sf2` files directly inside `dir`, sorted by file name
pub fn scan_soundfonts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SynthError::NotFound(dir.to_path_buf()));
    }

    let soundfonts: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(SOUNDFONT_EXTENSION))
        })
        .collect();

    info!(dir = %dir.display(), count = soundfonts.len(), "Scanned SoundFonts");
    Ok(soundfonts)
}

/// File name shown in the list
pub fn soundfont_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
