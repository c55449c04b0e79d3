//! In-memory backends.
//!
//! [`VirtualRawBackend`] and [`VirtualPadBackend`] implement the backend traits
//! without touching any hardware. Both are cheap handles over shared state: clone
//! one, hand the original to a [`Context`](crate::Context), and keep driving the
//! clone from the test or demo.
//!
//! ```
//! use padmap::backends::virtual_input::VirtualRawBackend;
//! use padmap::guid::ProductGuid;
//! use padmap::Context;
//!
//! let raw = VirtualRawBackend::new();
//! let pad = raw.plug(ProductGuid::from_vid_pid(0x045e, 0x028e), "Controller (XBOX 360 For Windows)");
//!
//! let mut ctx = Context::new().with_raw_backend(raw.clone());
//! ctx.initialize().unwrap();
//!
//! raw.press_button(pad, 0, true);
//! let handle = ctx.devices()[0];
//! assert!(ctx.poll(handle).unwrap().pressed(padmap::Button::A));
//! ```

use crate::backends::{
    PadBackend, PadError, PadFrame, RawCapabilities, RawDeviceDescriptor, RawDeviceKey, RawFrame,
    RawPollError, RawReportBackend, PAD_SLOT_COUNT, RAW_HAT_COUNT,
};
use crate::guid::ProductGuid;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Buttons advertised by devices plugged with [`VirtualRawBackend::plug`].
pub const VIRTUAL_BUTTONS: u32 = 32;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct VirtualRawDevice {
    descriptor: RawDeviceDescriptor,
    frame: RawFrame,
    failures: VecDeque<RawPollError>,
}

#[derive(Default)]
struct RawInner {
    next_key: u64,
    devices: Vec<VirtualRawDevice>,
    reacquires: usize,
}

impl RawInner {
    fn device_mut(&mut self, key: RawDeviceKey) -> Option<&mut VirtualRawDevice> {
        self.devices.iter_mut().find(|d| d.descriptor.key == key)
    }
}

/// Scriptable raw-report backend.
#[derive(Clone, Default)]
pub struct VirtualRawBackend {
    inner: Arc<Mutex<RawInner>>,
}

impl VirtualRawBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device. It shows up on the next enumeration.
    pub fn plug(&self, product: ProductGuid, name: &str) -> RawDeviceKey {
        self.plug_with(product, name, false)
    }

    /// Attach a device, optionally flagged as an XInput compatibility endpoint.
    pub fn plug_with(&self, product: ProductGuid, name: &str, xinput_compatible: bool) -> RawDeviceKey {
        let mut inner = lock(&self.inner);
        let key = RawDeviceKey(inner.next_key);
        inner.next_key += 1;
        inner.devices.push(VirtualRawDevice {
            descriptor: RawDeviceDescriptor {
                key,
                product,
                name: name.to_string(),
                caps: RawCapabilities {
                    buttons: VIRTUAL_BUTTONS,
                    hats: RAW_HAT_COUNT as u32,
                },
                xinput_compatible,
            },
            frame: RawFrame::default(),
            failures: VecDeque::new(),
        });
        key
    }

    /// Detach a device. Polling it afterwards reports a disconnect.
    pub fn unplug(&self, key: RawDeviceKey) {
        lock(&self.inner).devices.retain(|d| d.descriptor.key != key);
    }

    pub fn set_frame(&self, key: RawDeviceKey, frame: RawFrame) {
        self.update(key, |f| *f = frame);
    }

    /// Mutate the current frame of a device in place.
    pub fn update(&self, key: RawDeviceKey, f: impl FnOnce(&mut RawFrame)) {
        if let Some(dev) = lock(&self.inner).device_mut(key) {
            f(&mut dev.frame);
        }
    }

    pub fn press_button(&self, key: RawDeviceKey, index: usize, pressed: bool) {
        self.update(key, |f| f.set_button(index, pressed));
    }

    /// Set a raw axis (`0..=65535`).
    pub fn set_axis(&self, key: RawDeviceKey, index: usize, value: i32) {
        self.update(key, |f| {
            if let Some(a) = f.axes.get_mut(index) {
                *a = value;
            }
        });
    }

    /// Set a hat in hundredths of a degree, or [`HAT_CENTERED`](crate::backends::HAT_CENTERED).
    pub fn set_hat(&self, key: RawDeviceKey, hat: usize, value: u32) {
        self.update(key, |f| {
            if let Some(h) = f.hats.get_mut(hat) {
                *h = value;
            }
        });
    }

    /// Make the next poll of `key` fail with `error`. Failures queue up.
    pub fn fail_next(&self, key: RawDeviceKey, error: RawPollError) {
        if let Some(dev) = lock(&self.inner).device_mut(key) {
            dev.failures.push_back(error);
        }
    }

    /// How many times the engine asked for a re-acquire.
    pub fn reacquire_count(&self) -> usize {
        lock(&self.inner).reacquires
    }
}

impl RawReportBackend for VirtualRawBackend {
    fn enumerate(&mut self) -> Vec<RawDeviceDescriptor> {
        lock(&self.inner)
            .devices
            .iter()
            .map(|d| d.descriptor.clone())
            .collect()
    }

    fn poll(&mut self, key: RawDeviceKey) -> Result<RawFrame, RawPollError> {
        let mut inner = lock(&self.inner);
        let dev = inner.device_mut(key).ok_or(RawPollError::Disconnected)?;
        match dev.failures.pop_front() {
            Some(e) => Err(e),
            None => Ok(dev.frame.clone()),
        }
    }

    fn reacquire(&mut self, key: RawDeviceKey) -> Result<(), RawPollError> {
        let mut inner = lock(&self.inner);
        inner.reacquires += 1;
        match inner.device_mut(key) {
            Some(_) => Ok(()),
            None => Err(RawPollError::Disconnected),
        }
    }
}

#[derive(Default)]
struct PadSlot {
    frame: Option<PadFrame>,
    vibration: Option<(u16, u16)>,
}

/// Scriptable pre-normalized backend with [`PAD_SLOT_COUNT`] slots.
#[derive(Clone, Default)]
pub struct VirtualPadBackend {
    slots: Arc<Mutex<[PadSlot; PAD_SLOT_COUNT as usize]>>,
}

impl VirtualPadBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a pad at rest in `slot`.
    pub fn connect(&self, slot: u32) {
        self.set_frame(slot, PadFrame::default());
    }

    pub fn disconnect(&self, slot: u32) {
        if let Some(s) = lock(&self.slots).get_mut(slot as usize) {
            s.frame = None;
        }
    }

    /// Replace the frame of `slot`, connecting it if needed.
    pub fn set_frame(&self, slot: u32, frame: PadFrame) {
        if let Some(s) = lock(&self.slots).get_mut(slot as usize) {
            s.frame = Some(frame);
        }
    }

    /// Last `(low, high)` motor command sent to `slot`.
    pub fn last_vibration(&self, slot: u32) -> Option<(u16, u16)> {
        lock(&self.slots).get(slot as usize).and_then(|s| s.vibration)
    }
}

impl PadBackend for VirtualPadBackend {
    fn is_connected(&mut self, slot: u32) -> bool {
        lock(&self.slots)
            .get(slot as usize)
            .is_some_and(|s| s.frame.is_some())
    }

    fn poll(&mut self, slot: u32) -> Result<PadFrame, PadError> {
        lock(&self.slots)
            .get(slot as usize)
            .and_then(|s| s.frame)
            .ok_or(PadError::NotConnected)
    }

    fn set_vibration(&mut self, slot: u32, low: u16, high: u16) -> Result<(), PadError> {
        let mut slots = lock(&self.slots);
        match slots.get_mut(slot as usize) {
            Some(s) if s.frame.is_some() => {
                s.vibration = Some((low, high));
                Ok(())
            }
            _ => Err(PadError::NotConnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::RAW_BUTTON_DOWN;

    #[test]
    fn clones_share_state() {
        let raw = VirtualRawBackend::new();
        let mut backend = raw.clone();
        let key = raw.plug(ProductGuid::from_vid_pid(1, 2), "Stick");
        raw.press_button(key, 3, true);

        let found = backend.enumerate();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Stick");
        assert_eq!(backend.poll(key).unwrap().buttons[3], RAW_BUTTON_DOWN);
    }

    #[test]
    fn scripted_failures_are_consumed_in_order() {
        let raw = VirtualRawBackend::new();
        let mut backend = raw.clone();
        let key = raw.plug(ProductGuid::default(), "Stick");
        raw.fail_next(key, RawPollError::NeedsReacquire);

        assert_eq!(backend.poll(key), Err(RawPollError::NeedsReacquire));
        assert!(backend.poll(key).is_ok());

        raw.unplug(key);
        assert_eq!(backend.poll(key), Err(RawPollError::Disconnected));
        assert_eq!(backend.reacquire(key), Err(RawPollError::Disconnected));
        assert_eq!(raw.reacquire_count(), 1);
    }

    #[test]
    fn pad_slots() {
        let pads = VirtualPadBackend::new();
        let mut backend = pads.clone();
        assert!(!backend.is_connected(0));
        pads.connect(2);
        assert!(backend.is_connected(2));
        assert_eq!(backend.poll(2), Ok(PadFrame::default()));
        assert_eq!(backend.set_vibration(2, 10, 20), Ok(()));
        assert_eq!(pads.last_vibration(2), Some((10, 20)));
        assert_eq!(backend.set_vibration(1, 1, 1), Err(PadError::NotConnected));
        assert!(!backend.is_connected(PAD_SLOT_COUNT));
    }
}
