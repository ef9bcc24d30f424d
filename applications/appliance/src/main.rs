/// Pirate OS - boot-time launcher for the display HAT
use anyhow::Context;
use clap::Parser;
use pirate_core::DisplaySink;
use pirate_display::{BufferedDisplay, LinuxFramebuffer};
use pirate_input::{ButtonInput, SysfsGpio};
use pirate_os::{
    config::ConfigDir,
    hardware::{HardwareFactory, SystemPower},
    FrameLoop, Launcher, SystemClock,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pirate-os")]
#[command(about = "Pirate OS launcher for the 240x240 button display", long_about = None)]
struct Cli {
    /// Directory holding launcher.toml, player.toml and synth.toml
    #[arg(long, env = "PIRATE_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Frame rate override
    #[arg(long)]
    fps: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pirate_os=info,pirate_audio=info,pirate_playback=info,pirate_synth=info,pirate_input=info,pirate_display=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_dir = ConfigDir::new(&cli.config_dir);
    let mut config = config_dir.launcher();
    if let Some(fps) = cli.fps {
        config.frame.fps = fps;
    }
    info!(config_dir = %cli.config_dir.display(), fps = config.frame.fps, "Starting Pirate OS");

    let panel = LinuxFramebuffer::open(&config.display.device, config.display.backlight.clone())
        .with_context(|| format!("Failed to open display {}", config.display.device.display()))?;
    let mut display = BufferedDisplay::new(panel, config.display.width, config.display.height);
    if let Err(e) = display.set_backlight(true) {
        warn!(error = %e, "Failed to switch backlight on");
    }

    let pins = SysfsGpio::open(&config.buttons.sysfs_root, config.buttons.pins())
        .with_context(|| format!("Failed to open buttons under {}", config.buttons.sysfs_root.display()))?;
    let mut input = ButtonInput::new(pins, config.buttons.input_config());

    let factory = HardwareFactory::new(config_dir);
    let power = SystemPower::new(config.power.clone());
    let mut launcher = Launcher::new(factory, power);

    let mut frames = FrameLoop::new(SystemClock::new(), config.frame.period());
    let mode = frames.run(&mut launcher, &mut input, &mut display);

    warn!(?mode, "Launcher stopped, waiting for the system to go down");
    Ok(())
}
