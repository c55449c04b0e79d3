//! Windows HID discovery filters.
//!
//! Decides which `hidapi` entries are game controls and derives the
//! identity fields the registry needs from each.

#![cfg(target_os = "windows")]

use crate::guid::ProductGuid;
use hidapi::DeviceInfo;

/// Decide whether a `hidapi` device entry should be considered at all.
///
/// Rules:
/// - Accept usage pages commonly used for game controls:
///   - `0x01` Generic Desktop
///   - `0x02` Simulation Controls
///   - `0x0F` Physical Interface
///   - `0xFFxx` Vendor-defined
/// - Reject plain mouse/keyboard endpoints on Generic Desktop.
pub fn accept_device(info: &DeviceInfo) -> bool {
    let up = info.usage_page();
    let u = info.usage();

    let is_generic_desktop = up == 0x01;
    let is_simulation = up == 0x02;
    let is_physical_iface = up == 0x0F;
    let is_vendor_defined = (up & 0xFF00) == 0xFF00;

    if !(is_generic_desktop || is_simulation || is_physical_iface || is_vendor_defined) {
        return false;
    }

    // Mouse = 0x02, Keyboard = 0x06 on Usage Page 0x01.
    !(is_generic_desktop && matches!(u, 0x02 | 0x06))
}

/// XInput HID compatibility endpoint ("IG_" interface group). The same pad is
/// also served by the XInput backend.
pub fn is_xinput_compatible(info: &DeviceInfo) -> bool {
    is_xinput_path(&info.path().to_string_lossy())
}

/// Interface paths come back in either case depending on the API that built them.
fn is_xinput_path(path: &str) -> bool {
    path.to_ascii_lowercase().contains("ig_")
}

/// Product GUID in the shape the legacy joystick API reports it.
pub fn product_guid(info: &DeviceInfo) -> ProductGuid {
    match (info.vendor_id(), info.product_id()) {
        (0, 0) => ProductGuid::default(),
        (vid, pid) => ProductGuid::from_vid_pid(vid, pid),
    }
}

pub fn display_name(info: &DeviceInfo) -> String {
    match info.product_string() {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => format!("HID {:04x}:{:04x}", info.vendor_id(), info.product_id()),
    }
}
