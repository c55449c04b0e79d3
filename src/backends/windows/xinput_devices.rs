#![cfg(target_os = "windows")]

//! Windows XInput backend.
//!
//! Exposes the four XInput slots as a [`PadBackend`]. XInput already labels
//! every control, so frames only need range rescaling.
//!
//! # Why XInput exists alongside HID
//! Many Xbox-style controllers show up as both:
//! - a HID interface (visible via `hidapi`, with "IG_" in its path), and
//! - an XInput slot (0–3) via `XInputGetState`.
//!
//! XInput is preferred for those devices: it reports triggers independently and
//! supports vibration. The raw-report side skips the HID twin by default.

use crate::backends::{PadBackend, PadError, PadFrame, PAD_SLOT_COUNT};
use tracing::trace;

use windows_sys::Win32::Foundation::{ERROR_DEVICE_NOT_CONNECTED, ERROR_SUCCESS};
use windows_sys::Win32::UI::Input::XboxController::*;

/// XInput-backed pad slots.
#[derive(Debug, Default)]
pub struct XInputBackend {
    _private: (),
}

impl XInputBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(slot: u32) -> Result<XINPUT_STATE, PadError> {
        // FFI struct: must be manually zeroed
        let mut state: XINPUT_STATE = unsafe { std::mem::zeroed() };
        let res = unsafe { XInputGetState(slot, &mut state) };
        status(res).map(|()| state)
    }
}

fn status(code: u32) -> Result<(), PadError> {
    match code {
        ERROR_SUCCESS => Ok(()),
        ERROR_DEVICE_NOT_CONNECTED => Err(PadError::NotConnected),
        other => Err(PadError::Other(format!("XInput error {other}"))),
    }
}

impl PadBackend for XInputBackend {
    fn slot_count(&self) -> u32 {
        PAD_SLOT_COUNT
    }

    fn slot_name(&self, slot: u32) -> String {
        format!("XInput Controller {slot}")
    }

    fn is_connected(&mut self, slot: u32) -> bool {
        Self::read(slot).is_ok()
    }

    fn poll(&mut self, slot: u32) -> Result<PadFrame, PadError> {
        let gp = Self::read(slot)?.Gamepad;
        // wButtons already uses the PadFrame bit layout.
        Ok(PadFrame {
            buttons: gp.wButtons,
            left_stick: [gp.sThumbLX, gp.sThumbLY],
            right_stick: [gp.sThumbRX, gp.sThumbRY],
            left_trigger: gp.bLeftTrigger,
            right_trigger: gp.bRightTrigger,
        })
    }

    fn set_vibration(&mut self, slot: u32, low: u16, high: u16) -> Result<(), PadError> {
        let vibration = XINPUT_VIBRATION {
            wLeftMotorSpeed: low,
            wRightMotorSpeed: high,
        };
        let res = unsafe { XInputSetState(slot, &vibration) };
        trace!(slot, low, high, res, "XInputSetState");
        status(res)
    }
}
