/// Wiring of the real devices
///
/// Everything here touches the operating system: power commands, the
/// audio output, the FluidSynth process and the MIDI ports. The launcher and
/// applications only see the traits these types implement.
use crate::app::{AppFactory, Application};
use crate::apps::{EngineStarter, MusicPlayerApp, SynthApp};
use crate::config::{ConfigDir, EngineSettings, PowerSettings};
use pirate_audio::{CpalMixer, FluidSynthProcess, FluidSynthSettings, MidirInput};
use pirate_core::{AppId, PirateError, PowerAction, PowerControl, Result};
use pirate_synth::SynthEngine;
use std::process::{Command, Stdio};
use tracing::info;

/// Runs the configured reboot / shutdown commands
#[derive(Debug, Clone)]
pub struct SystemPower {
    settings: PowerSettings,
}

impl SystemPower {
    pub fn new(settings: PowerSettings) -> Self {
        Self { settings }
    }

    fn command(&self, action: PowerAction) -> &[String] {
        match action {
            PowerAction::Reboot => &self.settings.reboot_command,
            PowerAction::Shutdown => &self.settings.shutdown_command,
        }
    }
}

impl PowerControl for SystemPower {
    fn execute(&mut self, action: PowerAction) -> Result<()> {
        let command = self.command(action);
        let (program, args) = command
            .split_first()
            .ok_or_else(|| PirateError::power_action(format!("No command configured for {action:?}")))?;

        info!(?action, command = ?command, "Running power command");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| PirateError::power_action(format!("{program}: {e}")))?;

        if !status.success() {
            return Err(PirateError::power_action(format!("{program} exited with {status}")));
        }
        Ok(())
    }
}

/// Builds applications on top of the real audio and MIDI devices
///
/// Configuration is re-read on every launch.
#[derive(Debug, Clone)]
pub struct HardwareFactory {
    config_dir: ConfigDir,
}

impl HardwareFactory {
    pub fn new(config_dir: ConfigDir) -> Self {
        Self { config_dir }
    }
}

impl AppFactory for HardwareFactory {
    fn create(&mut self, id: AppId) -> Result<Box<dyn Application>> {
        match id {
            AppId::MusicPlayer => {
                let config = self.config_dir.player();
                let app = MusicPlayerApp::new(config, Box::new(CpalMixer::new()))?;
                Ok(Box::new(app))
            }
            AppId::Synth => {
                let config = self.config_dir.synth();
                let starter = fluidsynth_starter(&config.engine);
                let app = SynthApp::new(config, starter, Box::new(MidirInput::new()))?;
                Ok(Box::new(app))
            }
        }
    }
}

fn fluidsynth_starter(engine: &EngineSettings) -> EngineStarter {
    let settings = FluidSynthSettings {
        program: engine.program.clone(),
        audio_driver: engine.audio_driver.clone(),
    };
    Box::new(move |gain| {
        let process = FluidSynthProcess::spawn(&settings, gain)?;
        Ok(Box::new(process) as Box<dyn SynthEngine>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(reboot: &[&str]) -> SystemPower {
        SystemPower::new(PowerSettings {
            reboot_command: reboot.iter().map(|s| (*s).to_string()).collect(),
            shutdown_command: Vec::new(),
        })
    }

    #[test]
    fn successful_command_is_ok() {
        assert!(power(&["true"]).execute(PowerAction::Reboot).is_ok());
    }

    #[test]
    fn failing_command_is_power_error() {
        let err = power(&["false"]).execute(PowerAction::Reboot).unwrap_err();
        assert!(matches!(err, PirateError::PowerAction(_)));
    }

    #[test]
    fn missing_program_is_power_error() {
        let err = power(&["/nonexistent/pirate-reboot"])
            .execute(PowerAction::Reboot)
            .unwrap_err();
        assert!(matches!(err, PirateError::PowerAction(_)));
    }

    #[test]
    fn empty_command_is_power_error() {
        let err = power(&["true"]).execute(PowerAction::Shutdown).unwrap_err();
        assert!(matches!(err, PirateError::PowerAction(_)));
    }

    #[test]
    fn factory_reports_missing_music_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("player.toml"),
            "music_dir = \"/nonexistent/pirate-music\"\n",
        )
        .unwrap();
        let mut factory = HardwareFactory::new(ConfigDir::new(dir.path()));
        let err = factory.create(AppId::MusicPlayer).err().unwrap();
        assert!(matches!(err, PirateError::ResourceLoad { .. }));
    }
}
