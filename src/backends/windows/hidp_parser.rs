#![cfg(target_os = "windows")]
//! Windows HIDP descriptor-driven report decoder.
//!
//! Builds a per-device field map using the Windows HID Parser (HIDP) APIs and
//! decodes input reports into [`RawFrame`]s in the legacy joystick convention:
//!
//! - **Axes** are rescaled from their logical range to `0..=65535`. Generic
//!   Desktop axes take slots in the order X, Y, Z, Rx, Ry, Rz, Slider, Dial,
//!   skipping the ones the device lacks; other value usages (simulation
//!   controls, vendor pages) fill the remaining slots in descriptor order.
//! - **Buttons** are numbered in descriptor order and reported as `0x80`/`0`.
//! - **Hats** (usage 0x39) become hundredths of a degree clockwise from up, or
//!   [`HAT_CENTERED`].
//!
//! Catalog mappings written for the legacy joystick API index into exactly this
//! layout.
//!
//! ## Notes
//! - We open an OS handle from the HID path and keep it alive alongside the
//!   `PreparsedData` handle for the decoder lifetime.
//! - Requires `windows-sys` with HID + FileSystem features (see Cargo.toml).

use core::mem::MaybeUninit;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use hidapi::DeviceInfo;
use tracing::{debug, trace};

use crate::backends::{
    RawCapabilities, RawFrame, HAT_CENTERED, RAW_AXIS_CENTER, RAW_AXIS_COUNT, RAW_HAT_COUNT,
};

use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE, NTSTATUS,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

const STATUS_SUCCESS: NTSTATUS = HIDP_STATUS_SUCCESS;
const STATUS_BUFFER_TOO_SMALL: NTSTATUS = HIDP_STATUS_BUFFER_TOO_SMALL;

const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
const USAGE_X: u16 = 0x30;
const USAGE_DIAL: u16 = 0x37;
const USAGE_HAT_SWITCH: u16 = 0x39;

/// One button cap, expanded per usage.
#[derive(Clone, Debug)]
struct ButtonField {
    report_id: u8,
    usage_page: u16,
    link_collection: u16,
    usages: Vec<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueSlot {
    Axis(usize),
    Hat { index: usize, degrees: bool },
    /// More axes or hats than a frame can carry.
    Unused,
}

/// One value (axis/hat) field.
#[derive(Clone, Debug)]
struct ValueField {
    report_id: u8,
    usage_page: u16,
    usage: u16,
    link_collection: u16,
    logical_min: i32,
    logical_max: i32,
    bit_size: u16,
    slot: ValueSlot,
}

impl ValueField {
    fn is_hat(&self) -> bool {
        self.usage_page == USAGE_PAGE_GENERIC_DESKTOP && self.usage == USAGE_HAT_SWITCH
    }
}

/// Descriptor-driven HIDP decoder (Windows).
pub struct HidpParser {
    handle: HANDLE,
    ppd: PHIDP_PREPARSED_DATA,
    input_report_len: usize,
    /// Scratch report handed to HIDP, `input_report_len()` bytes.
    report: Vec<u8>,
    buttons: Vec<ButtonField>,
    // (report_id, usage_page, usage, link_collection) → raw button index
    button_index_by_usage: HashMap<(u8, u16, u16, u16), usize>,
    values: Vec<ValueField>,
    only_rid0: bool,
    caps: RawCapabilities,
}

impl Drop for HidpParser {
    fn drop(&mut self) {
        unsafe {
            if self.ppd != 0 {
                HidD_FreePreparsedData(self.ppd);
                self.ppd = 0;
            }
            if !self.handle.is_null() {
                CloseHandle(self.handle);
                self.handle = std::ptr::null_mut();
            }
        }
    }
}

// The decoder is only ever used by the thread that owns the context; the raw OS
// handles are opaque and never shared.
unsafe impl Send for HidpParser {}

impl HidpParser {
    /// Construct from a `hidapi::DeviceInfo`.
    ///
    /// Returns `None` if the device cannot be opened, its preparsed data cannot
    /// be obtained, or it exposes neither buttons nor values.
    pub fn new(info: &DeviceInfo) -> Option<Self> {
        let path = info.path().to_string_lossy().to_string();
        let handle = match open_device_handle(&path) {
            Ok(h) => h,
            Err(code) => {
                debug!(%path, code, "cannot open HID interface");
                return None;
            }
        };

        let mut ppd: PHIDP_PREPARSED_DATA = 0;
        let ok = unsafe { HidD_GetPreparsedData(handle, &mut ppd) };
        if ok == 0 || ppd == 0 {
            unsafe { CloseHandle(handle) };
            return None;
        }

        let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
        let status = unsafe { HidP_GetCaps(ppd, caps.as_mut_ptr()) };
        if status != STATUS_SUCCESS {
            unsafe {
                HidD_FreePreparsedData(ppd);
                CloseHandle(handle);
            }
            return None;
        }
        let caps = unsafe { caps.assume_init() };

        // A device may legally have only buttons or only values.
        let btn_caps = button_caps(ppd).unwrap_or_default();
        let val_caps = value_caps(ppd).unwrap_or_default();
        if btn_caps.is_empty() && val_caps.is_empty() {
            unsafe {
                HidD_FreePreparsedData(ppd);
                CloseHandle(handle);
            }
            return None;
        }

        let report_ids: BTreeSet<u8> = btn_caps
            .iter()
            .map(|c| c.ReportID)
            .chain(val_caps.iter().map(|c| c.ReportID))
            .collect();
        let only_rid0 = report_ids.len() == 1 && report_ids.contains(&0);

        let buttons = expand_buttons(&btn_caps);
        let mut values = expand_values(&val_caps);

        // VKB T-Rudder only answers on LinkCollection 0.
        if info.vendor_id() == 0x231d && info.product_id() == 0x011f {
            for v in &mut values {
                v.link_collection = 0;
            }
        }

        let hats = assign_value_slots(&mut values);

        let mut button_index_by_usage = HashMap::new();
        for bf in &buttons {
            for &u in &bf.usages {
                let next = button_index_by_usage.len();
                button_index_by_usage
                    .entry((bf.report_id, bf.usage_page, u, bf.link_collection))
                    .or_insert(next);
            }
        }

        debug!(
            vid = info.vendor_id(),
            pid = info.product_id(),
            buttons = button_index_by_usage.len(),
            values = values.len(),
            hats,
            ?report_ids,
            "HIDP field map built"
        );

        let input_report_len = usize::from(caps.InputReportByteLength);
        Some(Self {
            handle,
            ppd,
            input_report_len,
            report: vec![0u8; input_report_len.max(1)],
            caps: RawCapabilities {
                buttons: button_index_by_usage.len() as u32,
                hats,
            },
            buttons,
            button_index_by_usage,
            values,
            only_rid0,
        })
    }

    pub fn capabilities(&self) -> RawCapabilities {
        self.caps
    }

    /// Size of the read buffer, report ID byte included.
    pub fn input_report_len(&self) -> usize {
        self.input_report_len.max(1)
    }

    /// Whether reads carry a leading report ID byte.
    pub fn expects_report_id_prefix(&self) -> bool {
        !self.only_rid0
    }

    /// Fold one input report into `frame`. Fields belonging to other reports keep
    /// their previous values.
    ///
    /// `payload` excludes the report ID byte; devices without numbered reports
    /// pass `report_id == 0`.
    pub fn decode(&mut self, report_id: u8, payload: &[u8], frame: &mut RawFrame) {
        let mut report = std::mem::take(&mut self.report);
        fill_report(&mut report, report_id, payload);
        let report_len = report.len() as u32;

        self.decode_buttons(report_id, &mut report, report_len, frame);
        self.decode_values(report_id, &mut report, report_len, frame);
        self.report = report;
    }

    fn decode_buttons(&self, rid: u8, report: &mut [u8], report_len: u32, frame: &mut RawFrame) {
        for bf in &self.buttons {
            if bf.report_id != 0 && bf.report_id != rid {
                continue;
            }

            let index_of = |usage: u16| {
                self.button_index_by_usage
                    .get(&(rid, bf.usage_page, usage, bf.link_collection))
                    .or_else(|| {
                        self.button_index_by_usage
                            .get(&(0, bf.usage_page, usage, bf.link_collection))
                    })
                    .copied()
            };

            for &u in &bf.usages {
                if let Some(i) = index_of(u) {
                    frame.set_button(i, false);
                }
            }

            let mut usage_buf = [0u16; 128];
            let mut usage_len = usage_buf.len() as u32;
            let status = unsafe {
                HidP_GetUsages(
                    HidP_Input,
                    bf.usage_page,
                    bf.link_collection,
                    usage_buf.as_mut_ptr(),
                    &mut usage_len,
                    self.ppd,
                    report.as_mut_ptr(),
                    report_len,
                )
            };
            if status != STATUS_SUCCESS {
                trace!(status, rid, usage_page = bf.usage_page, "HidP_GetUsages failed");
                continue;
            }

            for &u in &usage_buf[..usage_len as usize] {
                if let Some(i) = index_of(u) {
                    frame.set_button(i, true);
                }
            }
        }
    }

    fn decode_values(&mut self, rid: u8, report: &mut [u8], report_len: u32, frame: &mut RawFrame) {
        for vf in self.values.iter_mut() {
            if vf.slot == ValueSlot::Unused || (vf.report_id != 0 && vf.report_id != rid) {
                continue;
            }

            let mut value: u32 = 0;
            let mut read = |lc: u16, value: &mut u32| unsafe {
                HidP_GetUsageValue(
                    HidP_Input,
                    vf.usage_page,
                    lc,
                    vf.usage,
                    value,
                    self.ppd,
                    report.as_mut_ptr(),
                    report_len,
                )
            };

            let mut status = read(vf.link_collection, &mut value);
            if status != STATUS_SUCCESS && vf.link_collection != 0 {
                status = read(0, &mut value);
                if status == STATUS_SUCCESS {
                    trace!(rid, usage = vf.usage, "value only readable on LinkCollection 0");
                    vf.link_collection = 0;
                }
            }
            if status != STATUS_SUCCESS {
                trace!(status, rid, usage = vf.usage, "HidP_GetUsageValue failed");
                continue;
            }

            let raw = if vf.logical_min < 0 {
                sign_extend(value, vf.bit_size)
            } else {
                value as i32
            };

            match vf.slot {
                ValueSlot::Axis(i) => {
                    frame.axes[i] = rescale_axis(raw, vf.logical_min, vf.logical_max);
                }
                ValueSlot::Hat { index, degrees } => {
                    frame.hats[index] = hat_hundredths(raw, vf.logical_min, vf.logical_max, degrees);
                }
                ValueSlot::Unused => {}
            }
        }
    }
}

// --------------------- descriptor helpers ---------------------

/// Fetch caps with one retry when HIDP reports the buffer too small.
unsafe fn fetch_caps<T>(
    ppd: PHIDP_PREPARSED_DATA,
    get: unsafe fn(HIDP_REPORT_TYPE, *mut T, *mut u16, PHIDP_PREPARSED_DATA) -> NTSTATUS,
) -> Option<Vec<T>> {
    let mut len: u16 = 64;
    for _ in 0..2 {
        let mut caps: Vec<T> = (0..len).map(|_| core::mem::zeroed()).collect();
        let mut needed = len;
        let status = get(HidP_Input, caps.as_mut_ptr(), &mut needed, ppd);
        if status == STATUS_SUCCESS {
            caps.truncate(needed as usize);
            return Some(caps);
        }
        if status != STATUS_BUFFER_TOO_SMALL || needed == 0 {
            break;
        }
        len = needed;
    }
    None
}

fn button_caps(ppd: PHIDP_PREPARSED_DATA) -> Option<Vec<HIDP_BUTTON_CAPS>> {
    unsafe fn get(
        t: HIDP_REPORT_TYPE,
        caps: *mut HIDP_BUTTON_CAPS,
        len: *mut u16,
        ppd: PHIDP_PREPARSED_DATA,
    ) -> NTSTATUS {
        HidP_GetButtonCaps(t, caps, len, ppd)
    }
    unsafe { fetch_caps(ppd, get) }
}

fn value_caps(ppd: PHIDP_PREPARSED_DATA) -> Option<Vec<HIDP_VALUE_CAPS>> {
    unsafe fn get(
        t: HIDP_REPORT_TYPE,
        caps: *mut HIDP_VALUE_CAPS,
        len: *mut u16,
        ppd: PHIDP_PREPARSED_DATA,
    ) -> NTSTATUS {
        HidP_GetValueCaps(t, caps, len, ppd)
    }
    unsafe { fetch_caps(ppd, get) }
}

fn expand_buttons(caps: &[HIDP_BUTTON_CAPS]) -> Vec<ButtonField> {
    caps.iter()
        .map(|c| {
            let usages = unsafe {
                if c.IsRange != 0 {
                    let r = c.Anonymous.Range;
                    (r.UsageMin..=r.UsageMax).collect()
                } else {
                    vec![c.Anonymous.NotRange.Usage]
                }
            };
            ButtonField {
                report_id: c.ReportID,
                usage_page: c.UsagePage,
                link_collection: c.LinkCollection,
                usages,
            }
        })
        .collect()
}

fn expand_values(caps: &[HIDP_VALUE_CAPS]) -> Vec<ValueField> {
    let mut out = Vec::new();
    for c in caps {
        // Usage 0 is valid on Simulation Controls and vendor pages; page 0 is not.
        if c.UsagePage == 0 {
            continue;
        }
        let usages: Vec<u16> = unsafe {
            if c.IsRange != 0 {
                let r = c.Anonymous.Range;
                (r.UsageMin..=r.UsageMax).collect()
            } else {
                vec![c.Anonymous.NotRange.Usage]
            }
        };
        for usage in usages {
            out.push(ValueField {
                report_id: c.ReportID,
                usage_page: c.UsagePage,
                usage,
                link_collection: c.LinkCollection,
                logical_min: c.LogicalMin,
                logical_max: c.LogicalMax,
                bit_size: c.BitSize,
                slot: ValueSlot::Unused,
            });
        }
    }
    out
}

/// Legacy joystick order of a value field; non-standard axes sort last.
fn axis_rank(usage_page: u16, usage: u16) -> u16 {
    if usage_page == USAGE_PAGE_GENERIC_DESKTOP && (USAGE_X..=USAGE_DIAL).contains(&usage) {
        usage - USAGE_X
    } else {
        u16::MAX
    }
}

/// Give every value field its frame slot. Returns the number of hats.
fn assign_value_slots(values: &mut [ValueField]) -> u32 {
    let mut axes: Vec<usize> = (0..values.len()).filter(|&i| !values[i].is_hat()).collect();
    axes.sort_by_key(|&i| axis_rank(values[i].usage_page, values[i].usage));
    for (slot, i) in axes.into_iter().enumerate().take(RAW_AXIS_COUNT) {
        values[i].slot = ValueSlot::Axis(slot);
    }

    let mut hats = 0;
    for v in values.iter_mut().filter(|v| v.is_hat()).take(RAW_HAT_COUNT) {
        // Exactly 8 logical positions means octant slots; anything else is an angle.
        let slots = (v.logical_min == 0 && v.logical_max == 7)
            || (v.logical_min == 1 && v.logical_max == 8);
        v.slot = ValueSlot::Hat {
            index: hats,
            degrees: !slots,
        };
        hats += 1;
    }
    hats as u32
}

// --------------------- decoding helpers ---------------------

/// Lay out `[report_id][payload...]` in `report`, truncating or zero-padding
/// the payload to fit.
fn fill_report(report: &mut [u8], report_id: u8, payload: &[u8]) {
    let Some((id, body)) = report.split_first_mut() else {
        return;
    };
    *id = report_id;
    let copy_len = payload.len().min(body.len());
    body[..copy_len].copy_from_slice(&payload[..copy_len]);
    body[copy_len..].fill(0);
}

fn sign_extend(value: u32, bits: u16) -> i32 {
    if bits == 0 || bits >= 32 {
        return value as i32;
    }
    let shift = 32 - u32::from(bits);
    ((value << shift) as i32) >> shift
}

/// Map `[lo, hi]` onto `0..=65535`.
fn rescale_axis(v: i32, lo: i32, hi: i32) -> i32 {
    if hi <= lo {
        return RAW_AXIS_CENTER;
    }
    let t = (i64::from(v) - i64::from(lo)) * 65535 / (i64::from(hi) - i64::from(lo));
    t.clamp(0, 65535) as i32
}

/// Hat reading in hundredths of a degree clockwise from up.
fn hat_hundredths(raw: i32, lo: i32, hi: i32, degrees: bool) -> u32 {
    if raw < lo || raw > hi {
        return HAT_CENTERED;
    }
    let pos = i64::from(raw) - i64::from(lo);
    if !degrees {
        return (pos * 4500) as u32;
    }
    let span = i64::from(hi) - i64::from(lo) + 1;
    (pos * 36000 / span) as u32
}

// --------------------- OS handle helpers ---------------------

/// Open a Windows file handle for a HID interface path.
///
/// The returned `HANDLE` must be closed with `CloseHandle`.
fn open_device_handle(path: &str) -> Result<HANDLE, u32> {
    use std::ptr::{null, null_mut};

    let wide: Vec<u16> = OsStr::new(path)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let try_open = |access: u32| unsafe {
        CreateFileW(
            wide.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            null_mut(),
        )
    };

    let mut handle = try_open(GENERIC_READ | GENERIC_WRITE);
    if handle == INVALID_HANDLE_VALUE {
        handle = try_open(GENERIC_READ);
    }

    if handle == INVALID_HANDLE_VALUE {
        Err(unsafe { GetLastError() })
    } else {
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_buffer_is_reused_without_stale_bytes() {
        let mut report = vec![0u8; 5];
        fill_report(&mut report, 3, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(report, [3, 1, 2, 3, 4]);

        fill_report(&mut report, 0, &[9]);
        assert_eq!(report, [0, 9, 0, 0, 0]);

        let mut empty: [u8; 0] = [];
        fill_report(&mut empty, 1, &[1]);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(sign_extend(0xff, 8), -1);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(0x800, 12), -2048);
        assert_eq!(sign_extend(5, 0), 5);
    }

    #[test]
    fn axes_rescale_to_unsigned_16_bit() {
        assert_eq!(rescale_axis(0, 0, 255), 0);
        assert_eq!(rescale_axis(255, 0, 255), 65535);
        assert_eq!(rescale_axis(-32768, -32768, 32767), 0);
        assert_eq!(rescale_axis(32767, -32768, 32767), 65535);
        assert_eq!(rescale_axis(400, 0, 255), 65535);
        assert_eq!(rescale_axis(3, 5, 5), RAW_AXIS_CENTER);
    }

    #[test]
    fn hats_in_hundredths() {
        assert_eq!(hat_hundredths(0, 0, 7, false), 0);
        assert_eq!(hat_hundredths(1, 0, 7, false), 4500);
        assert_eq!(hat_hundredths(8, 1, 8, false), 31500);
        assert_eq!(hat_hundredths(8, 0, 7, false), HAT_CENTERED);
        assert_eq!(hat_hundredths(90, 0, 359, true), 9000);
        assert_eq!(hat_hundredths(-1, 0, 359, true), HAT_CENTERED);
    }

    #[test]
    fn legacy_axis_order() {
        let field = |usage_page, usage| ValueField {
            report_id: 0,
            usage_page,
            usage,
            link_collection: 0,
            logical_min: 0,
            logical_max: 255,
            bit_size: 8,
            slot: ValueSlot::Unused,
        };
        // Descriptor order: hat, Rz, throttle (sim page), Y, X.
        let mut values = vec![
            field(0x01, USAGE_HAT_SWITCH),
            field(0x01, 0x35),
            field(0x02, 0xbb),
            field(0x01, 0x31),
            field(0x01, 0x30),
        ];
        values[0].logical_max = 7;

        assert_eq!(assign_value_slots(&mut values), 1);
        assert_eq!(values[4].slot, ValueSlot::Axis(0));
        assert_eq!(values[3].slot, ValueSlot::Axis(1));
        assert_eq!(values[1].slot, ValueSlot::Axis(2));
        assert_eq!(values[2].slot, ValueSlot::Axis(3));
        assert_eq!(
            values[0].slot,
            ValueSlot::Hat {
                index: 0,
                degrees: false
            }
        );
    }
}
