#![cfg(target_os = "windows")]

//! Windows HID device wrapper.
//!
//! [`HidDevice`] wraps a `hidapi::HidDevice` and its [`HidpParser`]. It is
//! responsible for:
//! - opening the HID handle in non-blocking mode
//! - draining a bounded number of reports per poll
//! - splitting `[report_id][payload...]` vs `[payload...]` depending on the descriptor
//! - keeping the accumulated [`RawFrame`] between polls
//!
//! This module does **not** interpret the frame; that needs a mapping.

use crate::backends::windows::hidp_parser::HidpParser;
use crate::backends::{RawCapabilities, RawFrame, RawPollError};
use hidapi::{DeviceInfo, HidApi};
use tracing::{debug, warn};

/// Maximum number of HID reports drained per poll.
///
/// Prevents a single device from starving the rest of the system if it is
/// producing data faster than the host is polling.
const MAX_REPORTS_PER_TICK: usize = 32;

pub struct HidDevice {
    raw: hidapi::HidDevice,
    parser: HidpParser,
    buf: Vec<u8>,
    frame: RawFrame,
}

impl HidDevice {
    /// Open a HID interface and build its decoder. `None` if either step fails.
    pub fn open(info: &DeviceInfo, api: &HidApi) -> Option<Self> {
        let parser = HidpParser::new(info)?;
        let raw = match info.open_device(api) {
            Ok(d) => d,
            Err(e) => {
                debug!(path = %info.path().to_string_lossy(), error = %e, "cannot open HID device");
                return None;
            }
        };
        // Polled from the host loop, so reads must not block.
        if let Err(e) = raw.set_blocking_mode(false) {
            debug!(error = %e, "cannot switch HID device to non-blocking mode");
        }

        Some(Self {
            buf: vec![0u8; parser.input_report_len()],
            raw,
            parser,
            frame: RawFrame::default(),
        })
    }

    pub fn capabilities(&self) -> RawCapabilities {
        self.parser.capabilities()
    }

    /// Drain pending reports and return the resulting frame.
    ///
    /// A read error means the handle is no longer usable; the caller should
    /// re-acquire the device.
    pub fn drain(&mut self) -> Result<RawFrame, RawPollError> {
        for _ in 0..MAX_REPORTS_PER_TICK {
            match self.raw.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    let data = &self.buf[..n];
                    let (report_id, payload) = if self.parser.expects_report_id_prefix() {
                        split_report(data)
                    } else {
                        (0, data)
                    };
                    self.parser.decode(report_id, payload, &mut self.frame);
                }
                Err(e) => {
                    warn!(error = %e, "HID read failed");
                    return Err(RawPollError::NeedsReacquire);
                }
            }
        }
        Ok(self.frame.clone())
    }
}

/// Treat the first byte as a report ID.
#[inline]
fn split_report(data: &[u8]) -> (u8, &[u8]) {
    match data.split_first() {
        Some((&id, rest)) => (id, rest),
        None => (0, &[]),
    }
}
