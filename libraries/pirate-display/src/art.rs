//! Album art loading
//!
//! JPEG decoding and scaling take far longer than a frame, so [`ArtLoader`]
//! runs them on a worker thread and hands finished bitmaps back through a
//! channel that the frame loop drains.

use crate::error::{DisplayError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use image::imageops::FilterType;
use pirate_core::{Bitmap, Rgb};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

/// Decode a JPEG/PNG file and scale it to exactly `width` x `height`
pub fn load_bitmap(path: &Path, width: u32, height: u32) -> Result<Bitmap> {
    let decoded = image::open(path)?;
    debug!(
        path = %path.display(),
        source_width = decoded.width(),
        source_height = decoded.height(),
        "Decoded image"
    );

    let scaled = decoded
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();
    let pixels = scaled
        .pixels()
        .map(|p| Rgb::new(p.0[0], p.0[1], p.0[2]))
        .collect();

    Bitmap::new(width, height, pixels)
        .ok_or_else(|| {
            DisplayError::Format(format!(
                "{} did not scale to {width}x{height}",
                path.display()
            ))
        })
}

struct ArtRequest {
    tag: usize,
    path: PathBuf,
    width: u32,
    height: u32,
}

/// Result of one background decode
#[derive(Debug)]
pub struct LoadedArt {
    /// Caller-chosen tag passed to [`ArtLoader::request`]
    pub tag: usize,
    pub path: PathBuf,
    pub bitmap: Result<Bitmap>,
}

/// Decodes album art on a worker thread
///
/// Only the newest queued request is decoded; older ones are skipped. The
/// worker exits once the loader is dropped.
pub struct ArtLoader {
    requests: Sender<ArtRequest>,
    results: Receiver<LoadedArt>,
}

impl ArtLoader {
    pub fn spawn() -> std::io::Result<Self> {
        let (requests, request_rx) = unbounded::<ArtRequest>();
        let (result_tx, results) = unbounded();

        thread::Builder::new()
            .name("pirate-art".into())
            .spawn(move || run_worker(request_rx, result_tx))?;

        Ok(Self { requests, results })
    }

    /// Queue `path` for decoding at `width` x `height`
    pub fn request(&self, tag: usize, path: &Path, width: u32, height: u32) {
        let request = ArtRequest {
            tag,
            path: path.to_path_buf(),
            width,
            height,
        };
        if self.requests.send(request).is_err() {
            warn!(path = %path.display(), "Art worker has stopped");
        }
    }

    /// Results finished since the last call
    pub fn poll(&self) -> Vec<LoadedArt> {
        self.results.try_iter().collect()
    }
}

fn run_worker(requests: Receiver<ArtRequest>, results: Sender<LoadedArt>) {
    while let Ok(mut request) = requests.recv() {
        while let Ok(newer) = requests.try_recv() {
            request = newer;
        }
        let bitmap = load_bitmap(&request.path, request.width, request.height);
        let loaded = LoadedArt {
            tag: request.tag,
            path: request.path,
            bitmap,
        };
        if results.send(loaded).is_err() {
            return;
        }
    }
    debug!("Art worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait_for(loader: &ArtLoader) -> LoadedArt {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(loaded) = loader.poll().pop() {
                return loaded;
            }
            assert!(Instant::now() < deadline, "art worker produced nothing");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn scales_png_to_requested_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder.png");
        image::RgbImage::from_pixel(8, 4, image::Rgb([255, 0, 0]))
            .save(&path)
            .unwrap();

        let bitmap = load_bitmap(&path, 3, 3).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (3, 3));
        assert!(bitmap
            .pixels()
            .iter()
            .all(|p| p.r >= 250 && p.g <= 5 && p.b <= 5));
    }

    #[test]
    fn garbage_is_an_image_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("art.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            load_bitmap(&path, 10, 10),
            Err(DisplayError::Image(_))
        ));
    }

    #[test]
    fn loader_decodes_off_thread() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("art.png");
        image::RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 255]))
            .save(&path)
            .unwrap();

        let loader = ArtLoader::spawn().unwrap();
        loader.request(7, &path, 2, 2);
        let loaded = wait_for(&loader);

        assert_eq!(loaded.tag, 7);
        assert_eq!(loaded.path, path);
        let bitmap = loaded.bitmap.unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (2, 2));
    }

    #[test]
    fn loader_reports_decode_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let loader = ArtLoader::spawn().unwrap();
        loader.request(0, &path, 8, 8);
        assert!(wait_for(&loader).bitmap.is_err());
    }
}
