//! Novint Falcon, through the `falcon_c` wrapper around libnifalcon.
//!
//! The native library keeps process-global state, so at most one
//! `FalconDriver` may hold an open handle at a time.
//!
//! `falcon_load_firmware` and `falcon_run_io_loop` are declared without a
//! return value: nothing about their result is known, so it is never read.
//! The only failures this driver can report are a null handle from
//! `falcon_init` and calls made without an open handle.

use std::{
    ffi::{CString, c_char, c_int, c_void},
    ptr,
    sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, warn};

use super::HapticDriver;
use crate::error::{DyadError, Result};

#[link(name = "falcon_c")]
unsafe extern "C" {
    fn falcon_init(device_num: c_int) -> *mut c_void;
    fn falcon_load_firmware(falcon: *mut c_void, path: *const c_char);
    fn falcon_set_leds(falcon: *mut c_void, red: bool, green: bool, blue: bool);
    fn falcon_run_io_loop(falcon: *mut c_void);
    fn falcon_get_pos_x(falcon: *mut c_void) -> f64;
    fn falcon_get_pos_y(falcon: *mut c_void) -> f64;
    fn falcon_get_pos_z(falcon: *mut c_void) -> f64;
    fn falcon_set_force(falcon: *mut c_void, x: f64, y: f64, z: f64);
    fn falcon_exit(falcon: *mut c_void);
}

static HANDLE_LIVE: AtomicBool = AtomicBool::new(false);

pub struct FalconDriver {
    handle: *mut c_void,
}

impl FalconDriver {
    pub fn new() -> Self {
        FalconDriver {
            handle: ptr::null_mut(),
        }
    }

    fn is_open(&self) -> bool {
        !self.handle.is_null()
    }
}

impl Default for FalconDriver {
    fn default() -> Self {
        FalconDriver::new()
    }
}

impl HapticDriver for FalconDriver {
    fn init(&mut self, index: usize) -> Result<()> {
        if self.is_open() || HANDLE_LIVE.swap(true, Ordering::SeqCst) {
            return Err(DyadError::DeviceInit {
                index,
                reason: "a Falcon handle is already open in this process".into(),
            });
        }
        let device_num = c_int::try_from(index).map_err(|_| DyadError::DeviceInit {
            index,
            reason: "device index out of range".into(),
        });
        let handle = match device_num {
            // SAFETY: plain value argument; null is returned on failure
            Ok(n) => unsafe { falcon_init(n) },
            Err(e) => {
                HANDLE_LIVE.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        if handle.is_null() {
            HANDLE_LIVE.store(false, Ordering::SeqCst);
            return Err(DyadError::DeviceInit {
                index,
                reason: "falcon_init returned no handle".into(),
            });
        }
        debug!("Falcon #{} opened", index);
        self.handle = handle;
        Ok(())
    }

    fn load_firmware(&mut self, path: &str) -> Result<()> {
        let c_path = CString::new(path).map_err(|e| DyadError::FirmwareLoad {
            path: path.into(),
            reason: e.to_string(),
        })?;
        if !self.is_open() {
            return Err(DyadError::FirmwareLoad {
                path: path.into(),
                reason: "no open Falcon handle".into(),
            });
        }
        // SAFETY: handle came from falcon_init and c_path outlives the call
        unsafe { falcon_load_firmware(self.handle, c_path.as_ptr()) };
        Ok(())
    }

    fn set_leds(&mut self, red: bool, green: bool, blue: bool) {
        if self.is_open() {
            // SAFETY: handle came from falcon_init
            unsafe { falcon_set_leds(self.handle, red, green, blue) }
        }
    }

    fn run_io_loop(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(DyadError::DevicePump("no open Falcon handle".into()));
        }
        // SAFETY: handle came from falcon_init
        unsafe { falcon_run_io_loop(self.handle) };
        Ok(())
    }

    fn position(&self) -> [f64; 3] {
        if !self.is_open() {
            return [0.; 3];
        }
        // SAFETY: handle came from falcon_init
        unsafe {
            [
                falcon_get_pos_x(self.handle),
                falcon_get_pos_y(self.handle),
                falcon_get_pos_z(self.handle),
            ]
        }
    }

    fn set_force(&mut self, force: [f64; 3]) {
        if self.is_open() {
            let [x, y, z] = force;
            // SAFETY: handle came from falcon_init
            unsafe { falcon_set_force(self.handle, x, y, z) }
        }
    }

    fn shutdown(&mut self) {
        if !self.is_open() {
            warn!("Falcon shutdown requested without an open handle");
            return;
        }
        // SAFETY: handle came from falcon_init and is released exactly once
        unsafe { falcon_exit(self.handle) };
        self.handle = ptr::null_mut();
        HANDLE_LIVE.store(false, Ordering::SeqCst);
    }
}
