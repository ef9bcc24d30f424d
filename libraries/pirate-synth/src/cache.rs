//! SoundFont library cache file

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted SoundFont list, selection and gain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundFontCache {
    #[serde(default)]
    pub soundfonts: Vec<PathBuf>,
    #[serde(default)]
    pub last_selection: usize,
    #[serde(default)]
    pub last_gain: Option<f32>,
}

impl SoundFontCache {
    /// Read the cache at `path`; `Ok(None)` if it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let cache = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "Loaded SoundFont cache");
        Ok(Some(cache))
    }

    /// Write the cache to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        debug!(path = %path.display(), "Saved SoundFont cache");
        Ok(())
    }

    /// The remembered selection, if it still names an entry of `soundfonts`
    pub fn selected_in(&self, soundfonts: &[PathBuf]) -> Option<usize> {
        let remembered = self.soundfonts.get(self.last_selection)?;
        soundfonts.iter().position(|p| p == remembered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_path_not_index() {
        let cache = SoundFontCache {
            soundfonts: vec![PathBuf::from("/sf/a.sf2"), PathBuf::from("/sf/b.sf2")],
            last_selection: 1,
            last_gain: Some(0.8),
        };
        let rescanned = vec![
            PathBuf::from("/sf/0.sf2"),
            PathBuf::from("/sf/a.sf2"),
            PathBuf::from("/sf/b.sf2"),
        ];
        assert_eq!(cache.selected_in(&rescanned), Some(2));
        assert_eq!(cache.selected_in(&rescanned[..2]), None);
    }

    #[test]
    fn accepts_legacy_document() {
        let cache: SoundFontCache =
            serde_json::from_str(r#"{"soundfonts": ["/sf/x.sf2"], "last_selection": 0, "last_gain": 0.3}"#)
                .unwrap();
        assert_eq!(cache.last_gain, Some(0.3));
    }
}
