#![cfg(target_os = "windows")]

//! Windows input backends.
//!
//! - [`HidBackend`]: raw-report devices through `hidapi`, decoded with the HID
//!   parser (HIDP) into the legacy joystick frame layout
//! - [`XInputBackend`]: the four XInput pad slots
//!
//! Most users should not touch these directly; [`Context::system`](crate::Context::system)
//! wires both.

pub mod hid_device;
pub mod hid_discovery;
pub mod hidp_parser;
pub mod xinput_devices;

pub use xinput_devices::XInputBackend;

use crate::backends::{RawDeviceDescriptor, RawDeviceKey, RawFrame, RawPollError, RawReportBackend};
use crate::error::{Error, Result};
use crate::guid::ProductGuid;
use hid_device::HidDevice;
use hid_discovery::{accept_device, display_name, is_xinput_compatible, product_guid};
use hidapi::HidApi;
use std::ffi::CString;
use tracing::{debug, warn};

struct OpenDevice {
    key: RawDeviceKey,
    path: CString,
    product: ProductGuid,
    name: String,
    xinput_compatible: bool,
    device: Option<HidDevice>,
}

/// Raw-report backend over `hidapi`.
///
/// Keys stay stable for as long as an interface path keeps showing up in
/// enumeration.
pub struct HidBackend {
    api: HidApi,
    devices: Vec<OpenDevice>,
    next_key: u64,
}

impl HidBackend {
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(|e| Error::Backend(format!("hidapi init failed: {e}")))?;
        Ok(Self {
            api,
            devices: Vec::new(),
            next_key: 0,
        })
    }

    fn open_by_path(&self, path: &CString) -> Option<HidDevice> {
        self.api
            .device_list()
            .find(|info| info.path() == path.as_c_str())
            .and_then(|info| HidDevice::open(info, &self.api))
    }
}

impl RawReportBackend for HidBackend {
    fn enumerate(&mut self) -> Vec<RawDeviceDescriptor> {
        if let Err(e) = self.api.refresh_devices() {
            warn!(error = %e, "hidapi device refresh failed");
        }

        let mut kept = Vec::new();
        for info in self.api.device_list() {
            if !accept_device(info) {
                continue;
            }
            let path = info.path().to_owned();

            let existing = self
                .devices
                .iter()
                .position(|d| d.path == path)
                .map(|i| self.devices.swap_remove(i));
            let entry = match existing {
                Some(d) if d.device.is_some() => d,
                _ => {
                    let Some(device) = HidDevice::open(info, &self.api) else {
                        continue;
                    };
                    let key = RawDeviceKey(self.next_key);
                    self.next_key += 1;
                    debug!(key = key.0, path = %path.to_string_lossy(), "HID device opened");
                    OpenDevice {
                        key,
                        path,
                        product: product_guid(info),
                        name: display_name(info),
                        xinput_compatible: is_xinput_compatible(info),
                        device: Some(device),
                    }
                }
            };
            kept.push(entry);
        }
        self.devices = kept;

        self.devices
            .iter()
            .filter_map(|d| {
                let device = d.device.as_ref()?;
                Some(RawDeviceDescriptor {
                    key: d.key,
                    product: d.product,
                    name: d.name.clone(),
                    caps: device.capabilities(),
                    xinput_compatible: d.xinput_compatible,
                })
            })
            .collect()
    }

    fn poll(&mut self, key: RawDeviceKey) -> std::result::Result<RawFrame, RawPollError> {
        let entry = self
            .devices
            .iter_mut()
            .find(|d| d.key == key)
            .ok_or(RawPollError::Disconnected)?;
        match entry.device.as_mut() {
            Some(device) => device.drain(),
            None => Err(RawPollError::NeedsReacquire),
        }
    }

    fn reacquire(&mut self, key: RawDeviceKey) -> std::result::Result<(), RawPollError> {
        if let Err(e) = self.api.refresh_devices() {
            warn!(error = %e, "hidapi device refresh failed");
        }
        let index = self
            .devices
            .iter()
            .position(|d| d.key == key)
            .ok_or(RawPollError::Disconnected)?;

        // Release the old handles before opening new ones.
        self.devices[index].device = None;
        match self.open_by_path(&self.devices[index].path) {
            Some(device) => {
                self.devices[index].device = Some(device);
                Ok(())
            }
            None => {
                self.devices.swap_remove(index);
                Err(RawPollError::Disconnected)
            }
        }
    }
}
