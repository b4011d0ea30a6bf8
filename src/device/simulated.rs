//! Stand-in drivers for running a dyad without Falcon hardware attached.

use std::{cell::Cell, f64::consts::TAU, rc::Rc};

use log::debug;

use super::HapticDriver;
use crate::error::Result;

/// Sweeps the end-effector back and forth along the device X axis, one step
/// per I/O loop. Two sweeps started half a period apart cross each other,
/// so a pair of headless peers collide regularly.
pub struct SweepDriver {
    amplitude: f64,
    period_ticks: u64,
    phase: f64,
    ticks: u64,
    position: [f64; 3],
    last_force: [f64; 3],
}

impl SweepDriver {
    /// `amplitude` is in device units (the Falcon reports metres)
    pub fn new(amplitude: f64, period_ticks: u64, phase: f64) -> Self {
        SweepDriver {
            amplitude,
            period_ticks: period_ticks.max(1),
            phase,
            ticks: 0,
            position: [amplitude * phase.sin(), 0., 0.],
            last_force: [0.; 3],
        }
    }

    pub fn last_force(&self) -> [f64; 3] {
        self.last_force
    }
}

impl HapticDriver for SweepDriver {
    fn init(&mut self, index: usize) -> Result<()> {
        debug!("Simulated sweep device #{} ready", index);
        Ok(())
    }

    fn load_firmware(&mut self, path: &str) -> Result<()> {
        debug!("Simulated device ignores firmware \"{}\"", path);
        Ok(())
    }

    fn set_leds(&mut self, _red: bool, _green: bool, _blue: bool) {}

    fn run_io_loop(&mut self) -> Result<()> {
        self.ticks += 1;
        let angle = TAU * self.ticks as f64 / self.period_ticks as f64 + self.phase;
        self.position = [self.amplitude * angle.sin(), 0., 0.];
        Ok(())
    }

    fn position(&self) -> [f64; 3] {
        self.position
    }

    fn set_force(&mut self, force: [f64; 3]) {
        self.last_force = force;
    }

    fn shutdown(&mut self) {
        debug!("Simulated sweep device released after {} ticks", self.ticks);
    }
}

/// Where the window wants the simulated end-effector to be, in device units
#[derive(Clone, Default)]
pub struct PointerHandle {
    target: Rc<Cell<[f64; 3]>>,
}

impl PointerHandle {
    pub fn set(&self, device_position: [f64; 3]) {
        self.target.set(device_position);
    }
}

/// An end-effector that follows the mouse pointer. The window updates the
/// target through a `PointerHandle`; the device picks it up on its next I/O
/// loop, just like real hardware would.
pub struct PointerDriver {
    target: Rc<Cell<[f64; 3]>>,
    position: [f64; 3],
    last_force: [f64; 3],
}

impl PointerDriver {
    pub fn new() -> (Self, PointerHandle) {
        let handle = PointerHandle::default();
        (
            PointerDriver {
                target: handle.target.clone(),
                position: [0.; 3],
                last_force: [0.; 3],
            },
            handle,
        )
    }

    /// Force last commanded, in device axes
    pub fn last_force(&self) -> [f64; 3] {
        self.last_force
    }
}

impl HapticDriver for PointerDriver {
    fn init(&mut self, index: usize) -> Result<()> {
        debug!("Pointer-driven device #{} ready", index);
        Ok(())
    }

    fn load_firmware(&mut self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn set_leds(&mut self, _red: bool, _green: bool, _blue: bool) {}

    fn run_io_loop(&mut self) -> Result<()> {
        self.position = self.target.get();
        Ok(())
    }

    fn position(&self) -> [f64; 3] {
        self.position
    }

    fn set_force(&mut self, force: [f64; 3]) {
        self.last_force = force;
    }

    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_stays_within_amplitude_and_moves() {
        let mut driver = SweepDriver::new(0.02, 8, 0.);
        let mut seen = Vec::new();
        for _ in 0..16 {
            driver.run_io_loop().unwrap();
            let [x, y, z] = driver.position();
            assert!(x.abs() <= 0.02 + 1e-12);
            assert_eq!((y, z), (0., 0.));
            seen.push(x);
        }
        assert!(seen.iter().any(|x| *x > 0.019));
        assert!(seen.iter().any(|x| *x < -0.019));
    }

    #[test]
    fn opposite_phases_mirror() {
        let mut a = SweepDriver::new(0.02, 10, 0.);
        let mut b = SweepDriver::new(0.02, 10, std::f64::consts::PI);
        for _ in 0..10 {
            a.run_io_loop().unwrap();
            b.run_io_loop().unwrap();
            assert!((a.position()[0] + b.position()[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn pointer_is_picked_up_on_io_loop() {
        let (mut driver, handle) = PointerDriver::new();
        handle.set([0.01, -0.02, 0.]);
        assert_eq!(driver.position(), [0.; 3]);
        driver.run_io_loop().unwrap();
        assert_eq!(driver.position(), [0.01, -0.02, 0.]);

        driver.set_force([-0.5, 0.25, 0.]);
        assert_eq!(driver.last_force(), [-0.5, 0.25, 0.]);
    }
}
