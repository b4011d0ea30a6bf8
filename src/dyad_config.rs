use std::{fs, io::ErrorKind, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    device::{DeviceAxes, PumpFailurePolicy},
    dyad::ForceModel,
    error::{DyadError, Result},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct DyadConfig {
    // -------- WORKSPACE / FORCE MODEL
    /// Pixels per workspace unit
    pub workspace_scale: f64,

    /// Radius (in pixels) of each cursor disk
    pub cursor_radius: f64,

    /// Spring constant applied to the penetration depth
    pub stiffness: f64,

    // -------- TICK LOOP
    /// Desired ticks per second; best effort only
    pub target_fps: f64,

    /// Optional bound (ms) on each send/receive. Absent means block forever,
    /// so a hung peer also hangs this side.
    pub link_timeout_ms: Option<u64>,

    // -------- DEVICE
    pub firmware_path: String,

    pub device_axes: DeviceAxes,

    /// What to do when the device I/O loop reports a failure
    pub pump_failure_policy: PumpFailurePolicy,

    // -------- PRESENTATION
    /// Width and height of the (square) window in pixels
    pub window_size: f32,
}

impl Default for DyadConfig {
    fn default() -> Self {
        DyadConfig {
            workspace_scale: 250.,
            cursor_radius: 40.,
            stiffness: 10.,
            target_fps: 120.,
            link_timeout_ms: None,
            firmware_path: String::from("falcon_c/firmware/test_firmware.bin"),
            device_axes: DeviceAxes::default(),
            pump_failure_policy: PumpFailurePolicy::Warn,
            window_size: 640.,
        }
    }
}

impl DyadConfig {
    pub fn force_model(&self) -> ForceModel {
        ForceModel {
            workspace_scale: self.workspace_scale,
            cursor_radius: self.cursor_radius,
            stiffness: self.stiffness,
        }
    }

    pub fn link_timeout(&self) -> Option<Duration> {
        self.link_timeout_ms.map(Duration::from_millis)
    }

    /// Time budget of one tick at `target_fps`
    pub fn frame_period(&self) -> Result<Duration> {
        frame_period(self.target_fps)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workspace_scale <= 0. {
            return Err(DyadError::Config(format!(
                "workspaceScale must be positive, got {}",
                self.workspace_scale
            )));
        }
        if self.cursor_radius <= 0. {
            return Err(DyadError::Config(format!(
                "cursorRadius must be positive, got {}",
                self.cursor_radius
            )));
        }
        if !self.target_fps.is_finite() || self.target_fps <= 0. {
            return Err(DyadError::Config(format!(
                "targetFps must be positive, got {}",
                self.target_fps
            )));
        }
        self.frame_period()?;
        if self.link_timeout_ms == Some(0) {
            return Err(DyadError::Config(
                "linkTimeoutMs of 0 is not allowed; omit it to block without a timeout".into(),
            ));
        }
        self.device_axes.validate()
    }
}

pub(crate) fn frame_period(target_fps: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(1. / target_fps).map_err(|e| {
        DyadError::Config(format!("targetFps of {} gives no usable frame period: {}", target_fps, e))
    })
}

/// Load config from disk, falling back to defaults if the file does not exist
pub fn load_config_from_file(config_file_path: &str) -> Result<DyadConfig> {
    let config = match fs::read_to_string(config_file_path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Config file not found at \"{}\", using defaults",
                config_file_path
            );
            DyadConfig::default()
        }
        Err(e) => {
            return Err(DyadError::Config(format!(
                "failed to read \"{}\": {}",
                config_file_path, e
            )));
        }
        Ok(s) => {
            info!("Loaded config OK from \"{}\"", config_file_path);
            serde_json::from_str::<DyadConfig>(&s).map_err(|e| {
                DyadError::Config(format!("failed to parse \"{}\": {}", config_file_path, e))
            })?
        }
    };
    debug!("Config: {:?}", config);
    config.validate()?;
    Ok(config)
}
