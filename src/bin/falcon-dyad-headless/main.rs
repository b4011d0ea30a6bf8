//! # Falcon Dyad, headless
//!
//! Runs one end of the dyad without a window. Presentation is a periodic log
//! line; pass `--ticks N` to stop after N ticks, or interrupt (Ctrl-C) to
//! stop after the current one. Without the `falcon` feature
//! the device is simulated by a sweep along X, with host and client half a
//! period apart so that their cursors regularly collide.
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use falcon_dyad::device::DeviceAdapter;
use falcon_dyad::dyad_config::load_config_from_file;
use falcon_dyad::role::Role;
use falcon_dyad::session::{FrameClock, LogPresenter, QuitSignal, Session};
use falcon_dyad::settings::Cli;

#[cfg(feature = "falcon")]
fn open_driver(_role: Role) -> falcon_dyad::device::falcon::FalconDriver {
    falcon_dyad::device::falcon::FalconDriver::new()
}

#[cfg(not(feature = "falcon"))]
fn open_driver(role: Role) -> falcon_dyad::device::simulated::SweepDriver {
    const SWEEP_AMPLITUDE: f64 = 0.015;
    const SWEEP_PERIOD_TICKS: u64 = 480;
    let phase = match role {
        Role::Host => 0.,
        Role::Client => std::f64::consts::PI,
    };
    falcon_dyad::device::simulated::SweepDriver::new(SWEEP_AMPLITUDE, SWEEP_PERIOD_TICKS, phase)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path).context("failed to load config")?;
    let role = cli.role();

    let quit = QuitSignal::on_interrupt().context("failed to install interrupt handler")?;

    let device = DeviceAdapter::init(open_driver(role), cli.device, role, &config)
        .context("failed to initialise haptic device")?;

    let mut session = Session::connect(role, device, cli.socket_addr(), &config)
        .context("failed to establish link")?;

    // Report roughly once per second
    let mut presenter =
        LogPresenter::new(cli.ticks, config.target_fps.round() as u64).with_quit_signal(quit);
    let mut clock = FrameClock::new(config.target_fps)?;

    let ticks = session
        .run(&mut presenter, &mut clock)
        .context("session ended abnormally")?;

    info!("Session finished after {} ticks", ticks);
    Ok(())
}
