//! # Falcon Dyad
//!
//! The windowed dyad task: two translucent cursors (host red, client blue)
//! in a shared workspace, one tick per frame. The link is established before
//! the window opens, exactly like the headless binary; after that, every
//! eframe update runs one session tick on the UI thread.
//!
//! Without the `falcon` feature, the local cursor follows the mouse pointer.
use std::{cell::RefCell, rc::Rc};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use falcon_dyad::device::DeviceAdapter;
use falcon_dyad::dyad_config::load_config_from_file;
use falcon_dyad::session::{QuitSignal, Session};
use falcon_dyad::settings::Cli;
use model::{Model, open_driver};

mod model;
mod ui;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level))
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("eframe", log::LevelFilter::Warn)
        .init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path).context("failed to load config")?;
    let role = cli.role();

    let quit = QuitSignal::on_interrupt().context("failed to install interrupt handler")?;

    let (driver, pointer) = open_driver();
    let device = DeviceAdapter::init(driver, cli.device, role, &config)
        .context("failed to initialise haptic device")?;

    let session = Session::connect(role, device, cli.socket_addr(), &config)
        .context("failed to establish link")?;

    let failure = Rc::new(RefCell::new(None));
    let model = Model::new(session, pointer, &config, quit, failure.clone())?;

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(config.window_size, config.window_size)),
        resizable: false,
        ..Default::default()
    };
    eframe::run_native(role.caption(), options, Box::new(|_cc| Box::new(model)))
        .map_err(|e| anyhow!("window failed: {}", e))?;

    match failure.borrow_mut().take() {
        Some(e) => Err(e).context("session ended abnormally"),
        None => {
            info!("Window closed; session finished");
            Ok(())
        }
    }
}
