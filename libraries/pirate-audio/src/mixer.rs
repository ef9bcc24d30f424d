//! CPAL output with a Symphonia decoder thread
//!
//! One output stream per track, opened at the track's sample rate so no
//! resampling is needed. The decoder thread pushes stereo chunks through a
//! bounded channel; the audio callback pulls them, applies the volume and
//! flags the end of the track once the channel is drained and closed.

use crate::decoder::TrackDecoder;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender, TryRecvError};
use pirate_playback::{AudioEngine, EngineEvent, PlaybackError, Result, Volume};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Decoded chunks buffered ahead of the callback
const CHUNK_QUEUE: usize = 32;

/// How often a blocked decoder thread re-checks for stop
const SEND_POLL: Duration = Duration::from_millis(100);

const OUTPUT_CHANNELS: u16 = 2;

/// State shared between the mixer, its decoder thread and the audio callback
struct TrackState {
    paused: AtomicBool,
    gain_bits: AtomicU32,
    frames_played: AtomicU64,
    finished: AtomicBool,
    stop: AtomicBool,
}

impl TrackState {
    fn new(gain: f32) -> Self {
        Self {
            paused: AtomicBool::new(true),
            gain_bits: AtomicU32::new(gain.to_bits()),
            frames_played: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        }
    }
}

/// Callback side of the chunk channel
struct SampleFeed {
    rx: Receiver<Vec<f32>>,
    state: Arc<TrackState>,
    current: Vec<f32>,
    offset: usize,
    drained: bool,
}

impl SampleFeed {
    fn new(rx: Receiver<Vec<f32>>, state: Arc<TrackState>) -> Self {
        Self {
            rx,
            state,
            current: Vec::new(),
            offset: 0,
            drained: false,
        }
    }

    /// Fill one output buffer; underruns and pauses produce silence
    fn fill(&mut self, data: &mut [f32]) {
        if self.state.paused.load(Ordering::Relaxed) {
            data.fill(0.0);
            return;
        }

        let gain = f32::from_bits(self.state.gain_bits.load(Ordering::Relaxed));
        let mut written = 0;

        while written < data.len() {
            if self.offset >= self.current.len() {
                match self.rx.try_recv() {
                    Ok(chunk) => {
                        self.current = chunk;
                        self.offset = 0;
                        continue;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if !self.drained {
                            self.drained = true;
                            self.state.finished.store(true, Ordering::Release);
                        }
                        break;
                    }
                }
            }

            let n = (data.len() - written).min(self.current.len() - self.offset);
            let source = &self.current[self.offset..self.offset + n];
            for (out, sample) in data[written..written + n].iter_mut().zip(source) {
                *out = sample * gain;
            }
            written += n;
            self.offset += n;
        }

        data[written..].fill(0.0);
        self.state
            .frames_played
            .fetch_add((written / OUTPUT_CHANNELS as usize) as u64, Ordering::Relaxed);
    }
}

fn run_decoder(
    mut decoder: TrackDecoder,
    tx: Sender<Vec<f32>>,
    state: Arc<TrackState>,
    events: Sender<EngineEvent>,
) {
    loop {
        if state.stop.load(Ordering::Acquire) {
            return;
        }
        match decoder.next_chunk() {
            Ok(Some(mut chunk)) => loop {
                match tx.send_timeout(chunk, SEND_POLL) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Timeout(pending)) => {
                        if state.stop.load(Ordering::Acquire) {
                            return;
                        }
                        chunk = pending;
                    }
                    Err(SendTimeoutError::Disconnected(_)) => return,
                }
            },
            Ok(None) => {
                debug!("Decoder reached end of track");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Decoder stopped");
                let _ = events.send(EngineEvent::Error(e.to_string()));
                return;
            }
        }
    }
}

/// [`AudioEngine`] playing files through the default CPAL output device
pub struct CpalMixer {
    volume: Volume,
    track: Option<Arc<TrackState>>,
    stream: Option<Stream>,
    decoder_thread: Option<JoinHandle<()>>,
    sample_rate: u32,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
}

impl CpalMixer {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            volume: Volume::default(),
            track: None,
            stream: None,
            decoder_thread: None,
            sample_rate: 44100,
            events_tx,
            events_rx,
        }
    }

    fn open_stream(&self, sample_rate: u32, feed: SampleFeed) -> Result<Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlaybackError::device("No audio output device"))?;

        let config = StreamConfig {
            channels: OUTPUT_CHANNELS,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let mut feed = feed;
        let err_tx = self.events_tx.clone();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| feed.fill(data),
                move |err| {
                    error!(error = %err, "Audio stream error");
                    let _ = err_tx.send(EngineEvent::Error(err.to_string()));
                },
                None,
            )
            .map_err(|e| PlaybackError::device(format!("Failed to build output stream: {e}")))?;

        stream
            .play()
            .map_err(|e| PlaybackError::device(format!("Failed to start stream: {e}")))?;

        Ok(stream)
    }
}

impl Default for CpalMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for CpalMixer {
    fn load(&mut self, path: &Path) -> Result<Option<Duration>> {
        self.stop();

        let opened = TrackDecoder::open(path)?;
        let state = Arc::new(TrackState::new(self.volume.gain()));
        let (chunk_tx, chunk_rx) = bounded(CHUNK_QUEUE);

        let stream = self.open_stream(
            opened.sample_rate,
            SampleFeed::new(chunk_rx, Arc::clone(&state)),
        )?;

        let thread_state = Arc::clone(&state);
        let events = self.events_tx.clone();
        let decoder = opened.decoder;
        let handle = thread::Builder::new()
            .name("pirate-decoder".into())
            .spawn(move || run_decoder(decoder, chunk_tx, thread_state, events))?;

        info!(path = %path.display(), sample_rate = opened.sample_rate, "Track loaded");

        self.sample_rate = opened.sample_rate;
        self.track = Some(state);
        self.stream = Some(stream);
        self.decoder_thread = Some(handle);
        Ok(opened.duration)
    }

    fn play(&mut self) {
        if let Some(track) = &self.track {
            track.paused.store(false, Ordering::Relaxed);
        }
    }

    fn pause(&mut self) {
        if let Some(track) = &self.track {
            track.paused.store(true, Ordering::Relaxed);
        }
    }

    fn stop(&mut self) {
        if let Some(track) = self.track.take() {
            track.stop.store(true, Ordering::Release);
        }
        // Dropping the stream drops the callback and with it the receiver
        self.stream = None;
        if let Some(handle) = self.decoder_thread.take() {
            if handle.join().is_err() {
                warn!("Decoder thread panicked");
            }
        }
    }

    fn set_volume(&mut self, level: f32) {
        self.volume.set_level(level);
        if let Some(track) = &self.track {
            track
                .gain_bits
                .store(self.volume.gain().to_bits(), Ordering::Relaxed);
        }
    }

    fn position(&self) -> Duration {
        self.track.as_ref().map_or(Duration::ZERO, |track| {
            let frames = track.frames_played.load(Ordering::Relaxed);
            Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate.max(1)))
        })
    }

    fn is_playing(&self) -> bool {
        self.track.as_ref().is_some_and(|track| {
            !track.paused.load(Ordering::Relaxed) && !track.finished.load(Ordering::Acquire)
        })
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        let mut events: Vec<EngineEvent> = self.events_rx.try_iter().collect();
        if let Some(track) = &self.track {
            if track.finished.swap(false, Ordering::AcqRel) {
                track.paused.store(true, Ordering::Relaxed);
                events.push(EngineEvent::TrackEnded);
            }
        }
        events
    }
}

impl Drop for CpalMixer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_with(chunks: Vec<Vec<f32>>, gain: f32) -> (SampleFeed, Arc<TrackState>) {
        let (tx, rx) = bounded(8);
        for chunk in chunks {
            tx.send(chunk).unwrap();
        }
        drop(tx);
        let state = Arc::new(TrackState::new(gain));
        state.paused.store(false, Ordering::Relaxed);
        (SampleFeed::new(rx, Arc::clone(&state)), state)
    }

    #[test]
    fn paused_feed_is_silent() {
        let (mut feed, state) = feed_with(vec![vec![0.5; 4]], 1.0);
        state.paused.store(true, Ordering::Relaxed);
        let mut out = [1.0f32; 4];
        feed.fill(&mut out);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(state.frames_played.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn chunks_span_buffers_with_gain() {
        let (mut feed, state) = feed_with(vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0]], 0.5);
        let mut out = [0.0f32; 4];
        feed.fill(&mut out);
        assert_eq!(out, [0.5; 4]);
        assert_eq!(state.frames_played.load(Ordering::Relaxed), 2);
        assert!(!state.finished.load(Ordering::Acquire));

        let mut out = [9.0f32; 4];
        feed.fill(&mut out);
        assert_eq!(out, [0.5, 0.5, 0.0, 0.0]);
        assert!(state.finished.load(Ordering::Acquire));
    }

    #[test]
    fn underrun_is_not_end_of_track() {
        let (tx, rx) = bounded::<Vec<f32>>(8);
        let state = Arc::new(TrackState::new(1.0));
        state.paused.store(false, Ordering::Relaxed);
        let mut feed = SampleFeed::new(rx, Arc::clone(&state));

        let mut out = [1.0f32; 4];
        feed.fill(&mut out);
        assert_eq!(out, [0.0; 4]);
        assert!(!state.finished.load(Ordering::Acquire));
        drop(tx);
    }

    #[test]
    fn mixer_without_track_is_idle() {
        let mut mixer = CpalMixer::new();
        mixer.play();
        mixer.set_volume(0.3);
        assert!(!mixer.is_playing());
        assert_eq!(mixer.position(), Duration::ZERO);
        assert!(mixer.poll_events().is_empty());
    }

    #[test]
    fn load_of_missing_file_fails_before_touching_the_device() {
        let mut mixer = CpalMixer::new();
        let err = mixer.load(Path::new("/nonexistent/a.mp3")).unwrap_err();
        assert!(matches!(err, PlaybackError::NotFound(_)));
    }
}
