//! FluidSynth wrapper
//!
//! FluidSynth runs as a child process with its MIDI driver disabled; notes,
//! SoundFont loads and gain changes are written to its command shell on
//! stdin. Shell replies on stdout are read by a helper thread so the frame
//! loop never waits on the process.

use crossbeam_channel::{unbounded, Receiver, Sender};
use pirate_synth::{SynthEngine, SynthError, Result};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long `quit` may take before the process is killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Channel every note and preset goes to
const CHANNEL: u8 = 0;

/// How to start the synthesizer process
#[derive(Debug, Clone)]
pub struct FluidSynthSettings {
    /// Executable (default: `fluidsynth` from `PATH`)
    pub program: PathBuf,
    /// Audio driver passed with `-a`
    pub audio_driver: String,
}

impl Default for FluidSynthSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("fluidsynth"),
            audio_driver: "alsa".to_string(),
        }
    }
}

/// Reply printed after a successful `load`
const LOADED_REPLY: &str = "loaded SoundFont has ID ";

/// Reply printed when `load` rejects a file
const FAILED_REPLY: &str = "failed to load the SoundFont";

/// Formats engine calls as FluidSynth shell commands
///
/// FluidSynth assigns a SoundFont id only when a load succeeds, so ids are
/// taken from the shell's replies rather than counted locally. Loads that a
/// newer load replaced before their reply arrived are unloaded as soon as
/// their id is known. Write failures mark the shell dead; later calls are
/// dropped.
pub struct FluidSynthShell<W: Write> {
    writer: W,
    replies: Receiver<String>,
    loaded_font: Option<u32>,
    /// Loads sent whose reply has not been read yet
    in_flight: usize,
    /// How many of the in-flight loads are no longer wanted
    superseded: usize,
    alive: bool,
}

impl<W: Write> FluidSynthShell<W> {
    /// Shell writing commands to `writer` and reading reply lines from `replies`
    pub fn new(writer: W, replies: Receiver<String>) -> Self {
        Self {
            writer,
            replies,
            loaded_font: None,
            in_flight: 0,
            superseded: 0,
            alive: true,
        }
    }

    /// Id FluidSynth gave the SoundFont currently loaded
    pub fn loaded_font(&self) -> Option<u32> {
        self.loaded_font
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Apply the replies read so far
    pub fn read_replies(&mut self) {
        let lines: Vec<String> = self.replies.try_iter().collect();
        for line in lines {
            if let Some(id) = parse_loaded_id(&line) {
                self.in_flight = self.in_flight.saturating_sub(1);
                if self.superseded > 0 {
                    self.superseded -= 1;
                    debug!(font_id = id, "Unloading replaced SoundFont");
                    self.send_quiet(&format!("unload {id}"));
                } else {
                    debug!(font_id = id, "SoundFont id assigned");
                    self.loaded_font = Some(id);
                }
            } else if line.contains(FAILED_REPLY) {
                self.in_flight = self.in_flight.saturating_sub(1);
                if self.superseded > 0 {
                    self.superseded -= 1;
                } else {
                    warn!("fluidsynth rejected the SoundFont");
                }
            }
        }
    }

    fn send(&mut self, command: &str) -> Result<()> {
        if !self.alive {
            return Err(SynthError::device("fluidsynth shell is closed"));
        }
        let written = writeln!(self.writer, "{command}").and_then(|()| self.writer.flush());
        if let Err(e) = written {
            self.alive = false;
            warn!(error = %e, "fluidsynth shell write failed");
            return Err(SynthError::device(format!("fluidsynth shell write failed: {e}")));
        }
        Ok(())
    }

    fn send_quiet(&mut self, command: &str) {
        let _ = self.send(command);
    }
}

/// Font id from a `load` reply; the line may start with the shell prompt
fn parse_loaded_id(line: &str) -> Option<u32> {
    let start = line.find(LOADED_REPLY)? + LOADED_REPLY.len();
    line[start..].trim().parse().ok()
}

impl<W: Write> SynthEngine for FluidSynthShell<W> {
    fn load_soundfont(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(SynthError::NotFound(path.to_path_buf()));
        }
        let quoted = path.to_string_lossy().replace('"', "\\\"");

        self.read_replies();
        if let Some(previous) = self.loaded_font.take() {
            self.send(&format!("unload {previous}"))?;
        }
        self.superseded = self.in_flight;
        self.send(&format!("load \"{quoted}\""))?;
        self.in_flight += 1;
        self.send(&format!("prog {CHANNEL} 0"))?;

        info!(path = %path.display(), "SoundFont load sent");
        Ok(())
    }

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8) {
        self.send_quiet(&format!("noteon {channel} {key} {velocity}"));
    }

    fn note_off(&mut self, channel: u8, key: u8) {
        self.send_quiet(&format!("noteoff {channel} {key}"));
    }

    fn set_gain(&mut self, gain: f32) {
        self.send_quiet(&format!("gain {gain:.2}"));
    }

    fn all_notes_off(&mut self) {
        self.send_quiet("reset");
    }

    fn is_alive(&mut self) -> bool {
        self.read_replies();
        self.alive
    }

    fn shutdown(&mut self) {
        if self.alive {
            self.send_quiet("reset");
            self.send_quiet("quit");
            self.alive = false;
        }
    }
}

fn forward_lines(output: impl Read, lines: Sender<String>) {
    for line in BufReader::new(output).lines() {
        let Ok(line) = line else {
            break;
        };
        if lines.send(line).is_err() {
            break;
        }
    }
    debug!("fluidsynth output closed");
}

/// [`SynthEngine`] backed by a `fluidsynth` child process
pub struct FluidSynthProcess {
    child: Child,
    shell: FluidSynthShell<ChildStdin>,
}

impl FluidSynthProcess {
    /// Start FluidSynth with the given master gain
    pub fn spawn(settings: &FluidSynthSettings, gain: f32) -> Result<Self> {
        let mut child = Command::new(&settings.program)
            .arg("-a")
            .arg(&settings.audio_driver)
            .arg("-n") // No MIDI driver, notes come through the shell
            .arg("-q")
            .arg("-g")
            .arg(format!("{gain:.2}"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                SynthError::device(format!(
                    "Failed to start {}: {e}",
                    settings.program.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SynthError::device("fluidsynth stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SynthError::device("fluidsynth stdout unavailable"))?;

        let (reply_tx, replies) = unbounded();
        thread::Builder::new()
            .name("pirate-fluidsynth-out".into())
            .spawn(move || forward_lines(stdout, reply_tx))
            .map_err(|e| SynthError::device(format!("Cannot read fluidsynth output: {e}")))?;

        info!(pid = child.id(), driver = %settings.audio_driver, "fluidsynth started");
        Ok(Self {
            child,
            shell: FluidSynthShell::new(stdin, replies),
        })
    }

    /// Whether the child process is still running
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn reap(&mut self) {
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "fluidsynth exited");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(20)),
                Ok(None) | Err(_) => {
                    warn!("fluidsynth did not quit, killing it");
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    return;
                }
            }
        }
    }
}

impl SynthEngine for FluidSynthProcess {
    fn load_soundfont(&mut self, path: &Path) -> Result<()> {
        if !self.is_running() {
            return Err(SynthError::device("fluidsynth is not running"));
        }
        self.shell.load_soundfont(path)
    }

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8) {
        self.shell.note_on(channel, key, velocity);
    }

    fn note_off(&mut self, channel: u8, key: u8) {
        self.shell.note_off(channel, key);
    }

    fn set_gain(&mut self, gain: f32) {
        self.shell.set_gain(gain);
    }

    fn all_notes_off(&mut self) {
        self.shell.all_notes_off();
    }

    fn is_alive(&mut self) -> bool {
        self.shell.is_alive() && self.is_running()
    }

    fn shutdown(&mut self) {
        if self.shell.is_alive() {
            self.shell.shutdown();
        }
        self.reap();
    }
}

impl Drop for FluidSynthProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}
