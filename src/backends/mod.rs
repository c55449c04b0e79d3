//! Input backends for `padmap`.
//!
//! Two kinds of backend feed the normalization engine:
//!
//! - **Raw-report** ([`RawReportBackend`]): legacy joystick hardware with an
//!   arbitrary layout of axes, buttons and hats. Frames are meaningless without a
//!   [`Mapping`](crate::mapping::Mapping).
//! - **Pre-normalized** ([`PadBackend`]): console-style pads with a fixed,
//!   already-labelled layout addressed by a small slot index.
//!
//! Both are synchronous: enumeration and polling run to completion on the
//! caller's thread.
//!
//! # Feature flags
//! - **`hid`**: enables the Windows HID + XInput backends (default).
//!
//! [`virtual_input`] implements both traits in memory for tests and demos.

pub mod virtual_input;

#[cfg(all(feature = "hid", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
pub mod windows;

use crate::guid::ProductGuid;

/// Raw axes per frame, in legacy joystick order: X, Y, Z, Rx, Ry, Rz, Slider, Dial.
pub const RAW_AXIS_COUNT: usize = 8;

/// Raw button bytes per frame.
pub const RAW_BUTTON_COUNT: usize = 128;

/// Hats per frame.
pub const RAW_HAT_COUNT: usize = 4;

/// A raw button byte with this bit set is pressed.
pub const RAW_BUTTON_DOWN: u8 = 0x80;

/// Midpoint of the unsigned 16-bit raw axis range.
pub const RAW_AXIS_CENTER: i32 = 32768;

/// Hat value reported when the hat is centered.
pub const HAT_CENTERED: u32 = u32::MAX;

/// One poll's worth of raw joystick state.
///
/// Axes use the unsigned-biased 16-bit range `0..=65535`. Hats report the
/// pressed direction in hundredths of a degree clockwise from up (`0..36000`),
/// or [`HAT_CENTERED`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub axes: [i32; RAW_AXIS_COUNT],
    pub buttons: [u8; RAW_BUTTON_COUNT],
    pub hats: [u32; RAW_HAT_COUNT],
}

impl Default for RawFrame {
    fn default() -> Self {
        Self {
            axes: [RAW_AXIS_CENTER; RAW_AXIS_COUNT],
            buttons: [0; RAW_BUTTON_COUNT],
            hats: [HAT_CENTERED; RAW_HAT_COUNT],
        }
    }
}

impl RawFrame {
    /// Set or clear a raw button; out-of-range indices are ignored.
    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if let Some(b) = self.buttons.get_mut(index) {
            *b = if pressed { RAW_BUTTON_DOWN } else { 0 };
        }
    }

    #[inline]
    pub fn button_down(&self, index: usize) -> bool {
        self.buttons
            .get(index)
            .is_some_and(|b| b & RAW_BUTTON_DOWN != 0)
    }
}

/// What a raw-report device says about itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawCapabilities {
    pub buttons: u32,
    pub hats: u32,
}

/// Backend-assigned key for one raw-report device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawDeviceKey(pub u64);

/// One raw-report device found during enumeration.
#[derive(Clone, Debug)]
pub struct RawDeviceDescriptor {
    pub key: RawDeviceKey,
    pub product: ProductGuid,
    /// Display name as reported by the driver.
    pub name: String,
    pub caps: RawCapabilities,
    /// The device is an XInput compatibility endpoint (also served by the pad backend).
    pub xinput_compatible: bool,
}

/// Raw-report poll failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RawPollError {
    /// The device lost acquisition; re-acquire and try again.
    #[error("device needs to be re-acquired")]
    NeedsReacquire,
    /// The device is gone.
    #[error("device is no longer connected")]
    Disconnected,
    #[error("{0}")]
    Other(String),
}

/// Legacy joystick source.
pub trait RawReportBackend: Send {
    /// Enumerate the currently attached devices.
    fn enumerate(&mut self) -> Vec<RawDeviceDescriptor>;

    /// Read the current frame of a device.
    fn poll(&mut self, key: RawDeviceKey) -> Result<RawFrame, RawPollError>;

    /// Re-acquire a device after [`RawPollError::NeedsReacquire`].
    fn reacquire(&mut self, key: RawDeviceKey) -> Result<(), RawPollError>;
}

/// Slots exposed by the pre-normalized backend.
pub const PAD_SLOT_COUNT: u32 = 4;

/// Full-scale vibration intensity of the pre-normalized backend.
pub const PAD_VIBRATION_MAX: u16 = u16::MAX;

/// Button bits of [`PadFrame::buttons`] (XInput layout).
pub mod pad_buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// One poll's worth of pre-normalized pad state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PadFrame {
    pub buttons: u16,
    /// `[x, y]`, up is positive.
    pub left_stick: [i16; 2],
    pub right_stick: [i16; 2],
    pub left_trigger: u8,
    pub right_trigger: u8,
}

/// Pre-normalized pad failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PadError {
    #[error("pad slot is not connected")]
    NotConnected,
    #[error("{0}")]
    Other(String),
}

/// Console-style pad source with a fixed number of slots.
pub trait PadBackend: Send {
    fn slot_count(&self) -> u32 {
        PAD_SLOT_COUNT
    }

    /// Display name of the pad in `slot`.
    fn slot_name(&self, slot: u32) -> String {
        format!("Gamepad {slot}")
    }

    fn is_connected(&mut self, slot: u32) -> bool;

    fn poll(&mut self, slot: u32) -> Result<PadFrame, PadError>;

    /// Drive the low- and high-frequency motors at native intensity.
    fn set_vibration(&mut self, slot: u32, low: u16, high: u16) -> Result<(), PadError>;
}
