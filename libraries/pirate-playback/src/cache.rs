//! Library cache file
//!
//! JSON document holding the scanned album list and where playback left off:
//!
//! ```json
//! { "database": [ { "album": "...", "artist": "...", "art_path": null, "songs": ["..."] } ],
//!   "last_state": { "album_index": 0, "song_index": 3, "volume": 0.8 } }
//! ```

use crate::error::Result;
use crate::library::{Album, MusicLibrary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Where playback left off
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastState {
    #[serde(default)]
    pub album_index: usize,
    #[serde(default)]
    pub song_index: usize,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

impl Default for LastState {
    fn default() -> Self {
        Self {
            album_index: 0,
            song_index: 0,
            volume: default_volume(),
        }
    }
}

/// Persisted library and playback state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryCache {
    #[serde(default)]
    pub database: Vec<Album>,
    #[serde(default)]
    pub last_state: LastState,
}

impl LibraryCache {
    pub fn new(library: &MusicLibrary, last_state: LastState) -> Self {
        Self {
            database: library.albums().to_vec(),
            last_state,
        }
    }

    /// Read the cache at `path`
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        let cache = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded library cache");
        Ok(Some(cache))
    }

    /// Write the cache to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        debug!(path = %path.display(), "Saved library cache");
        Ok(())
    }

    pub fn library(&self) -> MusicLibrary {
        MusicLibrary::new(self.database.clone())
    }
}
