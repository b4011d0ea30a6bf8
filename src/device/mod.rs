#[cfg(feature = "falcon")]
pub mod falcon;
pub mod simulated;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    Force, Position,
    dyad_config::DyadConfig,
    error::{DyadError, Result},
    role::Role,
};

/// The haptic device driver, as the dyad sees it.
///
/// Implementations wrap a single device handle. `position` is in
/// device-native units; `set_force` takes device-axis force components.
pub trait HapticDriver {
    fn init(&mut self, index: usize) -> Result<()>;
    fn load_firmware(&mut self, path: &str) -> Result<()>;
    fn set_leds(&mut self, red: bool, green: bool, blue: bool);
    /// Service the device I/O; position reads are stale until this runs
    fn run_io_loop(&mut self) -> Result<()>;
    fn position(&self) -> [f64; 3];
    fn set_force(&mut self, force: [f64; 3]);
    fn shutdown(&mut self);
}

/// Device coordinate-frame conventions. These are properties of the
/// physical device, not calibration data.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceAxes {
    /// Device position (X, Y) is divided by these to get workspace units.
    /// A negative divisor inverts the axis.
    pub position_divisors: [f64; 2],

    /// Workspace force (X, Y) is multiplied by these before being sent
    pub force_signs: [f64; 2],
}

impl Default for DeviceAxes {
    fn default() -> Self {
        DeviceAxes {
            position_divisors: [0.05, -0.05],
            force_signs: [-1., 1.],
        }
    }
}

impl DeviceAxes {
    pub fn to_workspace(&self, device: [f64; 3]) -> Position {
        let [dx, dy] = self.position_divisors;
        Position::new(device[0] / dx, device[1] / dy)
    }

    /// Inverse of `to_workspace`; Z is left at 0
    pub fn to_device(&self, workspace: &Position) -> [f64; 3] {
        let [dx, dy] = self.position_divisors;
        [workspace.x * dx, workspace.y * dy, 0.]
    }

    pub fn force_to_device(&self, force: &Force) -> [f64; 3] {
        let [sx, sy] = self.force_signs;
        [force.x * sx, force.y * sy, 0.]
    }

    pub fn validate(&self) -> Result<()> {
        if self.position_divisors.iter().any(|d| *d == 0. || !d.is_finite()) {
            return Err(DyadError::Config(format!(
                "deviceAxes.positionDivisors must be finite and non-zero, got {:?}",
                self.position_divisors
            )));
        }
        Ok(())
    }
}

/// How a failing device I/O loop is treated
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PumpFailurePolicy {
    /// Log and carry on with whatever position the device last reported
    #[default]
    Warn,
    /// End the session
    FailFast,
}

/// Owns one initialised haptic device for the lifetime of a session.
pub struct DeviceAdapter<D: HapticDriver> {
    driver: D,
    index: usize,
    axes: DeviceAxes,
    pump_policy: PumpFailurePolicy,
    pump_failures: u64,
    is_shut_down: bool,
}

impl<D: HapticDriver> DeviceAdapter<D> {
    /// Open device `index` (or the role's default), load firmware, and light
    /// the role-coloured indicator.
    pub fn init(
        mut driver: D,
        index: Option<usize>,
        role: Role,
        config: &DyadConfig,
    ) -> Result<Self> {
        let index = index.unwrap_or_else(|| role.default_device_index());
        info!("Opening haptic device #{} for {}", index, role);
        driver.init(index)?;

        if let Err(e) = driver.load_firmware(&config.firmware_path) {
            driver.shutdown();
            return Err(e);
        }
        debug!("Firmware loaded from \"{}\"", config.firmware_path);

        let (r, g, b) = role.led_colour();
        driver.set_leds(r, g, b);

        Ok(DeviceAdapter {
            driver,
            index,
            axes: config.device_axes,
            pump_policy: config.pump_failure_policy,
            pump_failures: 0,
            is_shut_down: false,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn axes(&self) -> &DeviceAxes {
        &self.axes
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn pump_failures(&self) -> u64 {
        self.pump_failures
    }

    pub fn pump(&mut self) -> Result<()> {
        match self.driver.run_io_loop() {
            Ok(()) => Ok(()),
            Err(e) => match self.pump_policy {
                PumpFailurePolicy::FailFast => Err(e),
                PumpFailurePolicy::Warn => {
                    self.pump_failures += 1;
                    warn!(
                        "Device I/O loop failed ({} so far), continuing: {}",
                        self.pump_failures, e
                    );
                    Ok(())
                }
            },
        }
    }

    pub fn read_position(&self) -> Position {
        self.axes.to_workspace(self.driver.position())
    }

    /// Always sent, zero included: the device holds the last force it was given
    pub fn apply_force(&mut self, force: &Force) {
        self.driver.set_force(self.axes.force_to_device(force));
    }

    /// Release the device. Runs at most once, whatever the number of calls.
    pub fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }
        info!("Shutting down haptic device #{}", self.index);
        self.driver.set_force([0., 0., 0.]);
        self.driver.shutdown();
        self.is_shut_down = true;
    }
}

impl<D: HapticDriver> Drop for DeviceAdapter<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
