//! State normalization engine.
//!
//! Turns one raw backend frame into a [`DeviceState`]. Raw-report frames go
//! through a [`Mapping`]; pre-normalized frames use fixed formulas.
//!
//! ## Formulas
//! - raw-report axis: `((raw - 32768) + 0.5) / 32767.5`
//! - pre-normalized stick: `(raw + 0.5) / 32767.5`
//! - pre-normalized trigger: `raw / 127.5 - 1`
//!
//! Stick Y axes coming from raw-report axes are negated so that up is positive;
//! the pre-normalized backend already reports up as positive.

use crate::backends::{pad_buttons, PadFrame, RawFrame, RAW_AXIS_CENTER, RAW_HAT_COUNT};
use crate::control::{Axis, Button};
use crate::mapping::{Mapping, MappingElement, MappingKind};
use crate::state::DeviceState;

pub const HAT_UP: u8 = 0x01;
pub const HAT_RIGHT: u8 = 0x02;
pub const HAT_DOWN: u8 = 0x04;
pub const HAT_LEFT: u8 = 0x08;

/// Direction bits per 45° octant, clockwise from up.
pub const HAT_OCTANTS: [u8; 8] = [
    HAT_UP,
    HAT_UP | HAT_RIGHT,
    HAT_RIGHT,
    HAT_RIGHT | HAT_DOWN,
    HAT_DOWN,
    HAT_DOWN | HAT_LEFT,
    HAT_LEFT,
    HAT_UP | HAT_LEFT,
];

/// Hundredths of a degree per octant.
const HAT_OCTANT_SPAN: u32 = 4500;

/// Hat values at or above this are centered.
const HAT_RANGE: u32 = 36000;

#[inline]
pub fn raw_axis_value(raw: i32) -> f32 {
    // Backends may report values outside 0..=65535; f64 holds any i32 exactly.
    ((f64::from(raw) - f64::from(RAW_AXIS_CENTER) + 0.5) / 32767.5) as f32
}

#[inline]
pub fn stick_value(raw: i16) -> f32 {
    (f32::from(raw) + 0.5) / 32767.5
}

#[inline]
pub fn trigger_value(raw: u8) -> f32 {
    f32::from(raw) / 127.5 - 1.0
}

/// Decode a hat reading (hundredths of a degree) into direction bits.
#[inline]
pub fn decode_hat(raw: u32) -> u8 {
    if raw >= HAT_RANGE {
        return 0;
    }
    HAT_OCTANTS[(raw / HAT_OCTANT_SPAN) as usize]
}

/// Pressed-polarity of an axis element driving a button.
#[inline]
fn axis_button_pressed(e: &MappingElement, value: f32) -> bool {
    if e.axis_offset < 0 || (e.axis_offset == 0 && e.axis_scale > 0) {
        value >= 0.0
    } else {
        value <= 0.0
    }
}

struct RawView<'a> {
    frame: &'a RawFrame,
    hats: [u8; RAW_HAT_COUNT],
}

impl<'a> RawView<'a> {
    fn new(frame: &'a RawFrame, hat_count: u32) -> Self {
        let mut hats = [0u8; RAW_HAT_COUNT];
        for (dst, raw) in hats.iter_mut().zip(frame.hats).take(hat_count as usize) {
            *dst = decode_hat(raw);
        }
        Self { frame, hats }
    }

    fn axis(&self, index: u8) -> Option<f32> {
        self.frame
            .axes
            .get(index as usize)
            .map(|&raw| raw_axis_value(raw))
    }

    fn button(&self, index: u8) -> bool {
        self.frame.button_down(index as usize)
    }

    fn hat_bit(&self, e: &MappingElement) -> bool {
        let (hat, bit) = e.hat_parts();
        self.hats.get(hat).is_some_and(|h| h & bit != 0)
    }
}

/// Apply `mapping` to a raw-report frame. `hat_count` is the number of hats the
/// device advertises; readings of the others are ignored.
pub fn normalize_raw(frame: &RawFrame, mapping: &Mapping, hat_count: u32) -> DeviceState {
    let view = RawView::new(frame, hat_count);
    let mut state = DeviceState::rest();

    for button in Button::ALL {
        let e = mapping.button(button);
        if !e.is_mapped() {
            continue;
        }
        let pressed = match e.kind {
            MappingKind::Axis => view
                .axis(e.index)
                .is_some_and(|v| axis_button_pressed(&e, v)),
            MappingKind::Button => view.button(e.index),
            MappingKind::HatBit => view.hat_bit(&e),
        };
        if pressed {
            state.set_pressed(button);
        }
    }

    for axis in Axis::ALL {
        let e = mapping.axis(axis);
        if !e.is_mapped() {
            continue;
        }
        let value = match e.kind {
            MappingKind::Axis => match view.axis(e.index) {
                Some(v) if axis.is_stick_y() => -v,
                Some(v) => v,
                None => continue,
            },
            MappingKind::Button => digital(view.button(e.index)),
            MappingKind::HatBit => digital(view.hat_bit(&e)),
        };
        state.set_axis(axis, value);
    }

    state
}

#[inline]
fn digital(on: bool) -> f32 {
    if on {
        1.0
    } else {
        -1.0
    }
}

const PAD_BUTTONS: [(u16, Button); 14] = [
    (pad_buttons::A, Button::A),
    (pad_buttons::B, Button::B),
    (pad_buttons::X, Button::X),
    (pad_buttons::Y, Button::Y),
    (pad_buttons::LEFT_SHOULDER, Button::LeftShoulder),
    (pad_buttons::RIGHT_SHOULDER, Button::RightShoulder),
    (pad_buttons::BACK, Button::Back),
    (pad_buttons::START, Button::Start),
    (pad_buttons::LEFT_THUMB, Button::LeftThumb),
    (pad_buttons::RIGHT_THUMB, Button::RightThumb),
    (pad_buttons::DPAD_UP, Button::DpadUp),
    (pad_buttons::DPAD_RIGHT, Button::DpadRight),
    (pad_buttons::DPAD_DOWN, Button::DpadDown),
    (pad_buttons::DPAD_LEFT, Button::DpadLeft),
];

/// Rescale a pre-normalized frame.
pub fn normalize_pad(frame: &PadFrame) -> DeviceState {
    let mut state = DeviceState::rest();

    for (mask, button) in PAD_BUTTONS {
        if frame.buttons & mask != 0 {
            state.set_pressed(button);
        }
    }

    state.set_axis(Axis::LeftX, stick_value(frame.left_stick[0]));
    state.set_axis(Axis::LeftY, stick_value(frame.left_stick[1]));
    state.set_axis(Axis::RightX, stick_value(frame.right_stick[0]));
    state.set_axis(Axis::RightY, stick_value(frame.right_stick[1]));
    state.set_axis(Axis::LeftTrigger, trigger_value(frame.left_trigger));
    state.set_axis(Axis::RightTrigger, trigger_value(frame.right_trigger));

    state
}
