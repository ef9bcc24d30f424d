//! Symphonia file decoding
//!
//! Opening a track probes the container and builds the codec synchronously so
//! that unreadable files fail at load time. Packet decoding then runs on the
//! mixer's decoder thread and yields interleaved stereo `f32` chunks.

use pirate_playback::{PlaybackError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Result of probing a track
pub struct DecodedTrack {
    pub sample_rate: u32,
    pub duration: Option<Duration>,
    pub decoder: TrackDecoder,
}

/// Streaming packet decoder for one track
pub struct TrackDecoder {
    path: PathBuf,
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_buffer: Option<SampleBuffer<f32>>,
}

impl TrackDecoder {
    /// Probe `path` and prepare its default track for decoding
    pub fn open(path: &Path) -> Result<DecodedTrack> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlaybackError::NotFound(path.to_path_buf())
            } else {
                PlaybackError::Io(e)
            }
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::decode(path, format!("Failed to probe file: {e}")))?;

        let format_reader = probed.format;
        let track = format_reader
            .default_track()
            .ok_or_else(|| PlaybackError::decode(path, "No audio tracks found"))?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / f64::from(sample_rate)));
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::decode(path, format!("Failed to create decoder: {e}")))?;

        debug!(
            path = %path.display(),
            sample_rate,
            duration = ?duration,
            "Opened track"
        );

        Ok(DecodedTrack {
            sample_rate,
            duration,
            decoder: TrackDecoder {
                path: path.to_path_buf(),
                format_reader,
                decoder,
                track_id,
                sample_buffer: None,
            },
        })
    }

    /// Decode the next packet into interleaved stereo samples
    ///
    /// Returns `Ok(None)` at end of stream. Corrupt packets are skipped.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => {
                    return Err(PlaybackError::decode(
                        &self.path,
                        format!("Error reading packet: {e}"),
                    ));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(path = %self.path.display(), error = %e, "Skipping corrupt packet");
                    continue;
                }
                Err(e) => {
                    return Err(PlaybackError::decode(&self.path, format!("Decode error: {e}")));
                }
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);
            let needed = decoded.capacity() as u64;
            let fits = self
                .sample_buffer
                .as_ref()
                .is_some_and(|b| b.capacity() as u64 >= needed * channels as u64);
            if !fits {
                self.sample_buffer = Some(SampleBuffer::new(needed, spec));
            }
            let Some(buffer) = self.sample_buffer.as_mut() else {
                continue;
            };
            buffer.copy_interleaved_ref(decoded);

            return Ok(Some(to_stereo(buffer.samples(), channels)));
        }
    }
}

/// Interleaved samples with any channel count to interleaved stereo
///
/// Mono is duplicated; channels beyond the first two are dropped.
pub(crate) fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        2 => samples.to_vec(),
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        n => samples
            .chunks_exact(n)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_is_duplicated() {
        assert_eq!(to_stereo(&[0.1, 0.2], 1), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn surround_keeps_front_pair() {
        let frame = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        assert_eq!(to_stereo(&frame, 6), vec![0.1, 0.2]);
    }

    #[test]
    fn missing_file_is_not_found() {
        assert!(matches!(
            TrackDecoder::open(Path::new("/nonexistent/song.mp3")),
            Err(PlaybackError::NotFound(_))
        ));
    }

    #[test]
    fn non_audio_file_is_decode_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"this is plain text, not an mp3 stream").unwrap();
        assert!(matches!(
            TrackDecoder::open(&path),
            Err(PlaybackError::Decode { .. })
        ));
    }
}
