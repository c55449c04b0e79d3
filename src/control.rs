//! Logical controls.
//!
//! The canonical vocabulary every backend is normalized into: a fixed set of
//! [`Button`]s and [`Axis`]es. Ordinal values are part of the public contract
//! (they index the button bitmask and the axis array of
//! [`DeviceState`](crate::state::DeviceState)) and never change.
//!
//! ## Value conventions
//! - **Buttons:** one bit each, `1` = pressed.
//! - **Axes:** `[-1.0, 1.0]`. Sticks rest near `0.0` with up/right positive;
//!   triggers and unmapped axes rest at `-1.0`.

use serde::Serialize;

/// Number of logical buttons.
pub const BUTTON_COUNT: usize = 15;

/// Number of logical axes.
pub const AXIS_COUNT: usize = 6;

/// Display string for out-of-range ordinals.
pub const INVALID_NAME: &str = "<Invalid>";

/// Logical button. Discriminants are stable bit positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    LeftShoulder = 4,
    RightShoulder = 5,
    Back = 6,
    Start = 7,
    Guide = 8,
    LeftThumb = 9,
    RightThumb = 10,
    DpadUp = 11,
    DpadRight = 12,
    DpadDown = 13,
    DpadLeft = 14,
}

impl Button {
    /// All buttons in ordinal order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Back,
        Button::Start,
        Button::Guide,
        Button::LeftThumb,
        Button::RightThumb,
        Button::DpadUp,
        Button::DpadRight,
        Button::DpadDown,
        Button::DpadLeft,
    ];

    // PlayStation face-button names.
    pub const CROSS: Button = Button::A;
    pub const CIRCLE: Button = Button::B;
    pub const SQUARE: Button = Button::X;
    pub const TRIANGLE: Button = Button::Y;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit of this button inside [`DeviceState::buttons`](crate::state::DeviceState::buttons).
    #[inline]
    pub const fn mask(self) -> u16 {
        1 << (self as u16)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::LeftShoulder => "Left_Shoulder",
            Button::RightShoulder => "Right_Shoulder",
            Button::Back => "Back",
            Button::Start => "Start",
            Button::Guide => "Guide",
            Button::LeftThumb => "Left_Thumb",
            Button::RightThumb => "Right_Thumb",
            Button::DpadUp => "Dpad_Up",
            Button::DpadRight => "Dpad_Right",
            Button::DpadDown => "Dpad_Down",
            Button::DpadLeft => "Dpad_Left",
        }
    }

    /// Field name used by controller-database mapping strings (`a`, `leftshoulder`, `dpup`, ...).
    pub fn from_db_name(name: &str) -> Option<Self> {
        let b = match name {
            "a" => Button::A,
            "b" => Button::B,
            "x" => Button::X,
            "y" => Button::Y,
            "leftshoulder" => Button::LeftShoulder,
            "rightshoulder" => Button::RightShoulder,
            "back" => Button::Back,
            "start" => Button::Start,
            "guide" => Button::Guide,
            "leftstick" => Button::LeftThumb,
            "rightstick" => Button::RightThumb,
            "dpup" => Button::DpadUp,
            "dpright" => Button::DpadRight,
            "dpdown" => Button::DpadDown,
            "dpleft" => Button::DpadLeft,
            _ => return None,
        };
        Some(b)
    }
}

impl TryFrom<u8> for Button {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        Button::ALL.get(v as usize).copied().ok_or(v)
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical axis. Discriminants are stable array indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl Axis {
    /// All axes in ordinal order.
    pub const ALL: [Axis; AXIS_COUNT] = [
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::LeftTrigger,
        Axis::RightTrigger,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stick Y axes are flipped on the raw-report path so "up" is positive.
    #[inline]
    pub const fn is_stick_y(self) -> bool {
        matches!(self, Axis::LeftY | Axis::RightY)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Axis::LeftX => "Left_X",
            Axis::LeftY => "Left_Y",
            Axis::RightX => "Right_X",
            Axis::RightY => "Right_Y",
            Axis::LeftTrigger => "Left_Trigger",
            Axis::RightTrigger => "Right_Trigger",
        }
    }

    pub fn from_db_name(name: &str) -> Option<Self> {
        let a = match name {
            "leftx" => Axis::LeftX,
            "lefty" => Axis::LeftY,
            "rightx" => Axis::RightX,
            "righty" => Axis::RightY,
            "lefttrigger" => Axis::LeftTrigger,
            "righttrigger" => Axis::RightTrigger,
            _ => return None,
        };
        Some(a)
    }
}

impl TryFrom<u8> for Axis {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        Axis::ALL.get(v as usize).copied().ok_or(v)
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a raw button ordinal; [`INVALID_NAME`] when out of range.
pub fn button_name(button: u8) -> &'static str {
    Button::try_from(button).map_or(INVALID_NAME, Button::name)
}

/// Display name for a raw axis ordinal; [`INVALID_NAME`] when out of range.
pub fn axis_name(axis: u8) -> &'static str {
    Axis::try_from(axis).map_or(INVALID_NAME, Axis::name)
}
