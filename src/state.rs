//! Canonical per-frame device state.
//!
//! [`DeviceState`] is what every successful poll returns, whichever backend
//! produced the raw signal.
//!
//! # Invariants
//! - every axis value lies in `[-1.0, 1.0]`
//! - unmapped axes (and idle triggers) rest at `-1.0`
//! - only the low [`BUTTON_COUNT`] bits of `buttons` are ever set

use crate::control::{Axis, Button, AXIS_COUNT, BUTTON_COUNT};
use serde::Serialize;

/// Lowest axis value; also the rest value of unmapped axes.
pub const AXIS_MIN: f32 = -1.0;

/// Highest axis value.
pub const AXIS_MAX: f32 = 1.0;

/// Snapshot of one device's logical buttons and axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DeviceState {
    /// Bitmask over [`Button`] ordinals.
    pub buttons: u16,
    /// One value per [`Axis`] ordinal.
    pub axes: [f32; AXIS_COUNT],
}

impl DeviceState {
    /// All buttons released, all axes at [`AXIS_MIN`].
    pub const fn rest() -> Self {
        Self {
            buttons: 0,
            axes: [AXIS_MIN; AXIS_COUNT],
        }
    }

    #[inline]
    pub fn pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis.index()]
    }

    #[inline]
    pub(crate) fn set_pressed(&mut self, button: Button) {
        self.buttons |= button.mask();
    }

    #[inline]
    pub(crate) fn set_axis(&mut self, axis: Axis, value: f32) {
        self.axes[axis.index()] = value.clamp(AXIS_MIN, AXIS_MAX);
    }

    /// Iterate the currently pressed buttons in ordinal order.
    pub fn pressed_buttons(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(|b| self.pressed(*b))
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::rest()
    }
}

/// Ordinal-based button query that never fails.
///
/// Returns `false` for a missing state or a button ordinal outside
/// `0..BUTTON_COUNT`.
pub fn button_pressed(state: Option<&DeviceState>, button: u8) -> bool {
    match state {
        Some(s) if (button as usize) < BUTTON_COUNT => s.buttons & (1 << button) != 0,
        _ => false,
    }
}
