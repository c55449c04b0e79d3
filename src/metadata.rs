//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a registered
//! device suitable for UI display, logging, and catalog authoring. Backends
//! populate what they know; unknown fields remain `None`.
//!
//! ## Catalog authoring
//! An unmapped raw-report device still has a `guid`. Pasting that identifier into
//! a controller-database line is how a new model gets a mapping.
//!
//! # Example
//! ```
//! use padmap::backends::virtual_input::VirtualPadBackend;
//! use padmap::Context;
//!
//! let pads = VirtualPadBackend::new();
//! pads.connect(0);
//!
//! let mut ctx = Context::new().with_pad_backend(pads);
//! ctx.initialize().unwrap();
//! for handle in ctx.devices() {
//!     let meta = ctx.device_meta(handle).unwrap();
//!     println!("{handle}: {} ({:?})", meta.name, meta.backend);
//! }
//! ```

use crate::device::{BackendKind, DeviceHandle};
use crate::guid::Guid;
use serde::Serialize;

/// Snapshot of metadata describing a single registered device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceMeta {
    pub handle: DeviceHandle,

    /// Backend that owns the device.
    pub backend: BackendKind,

    /// Display name as reported by the driver.
    pub name: String,

    /// Catalog identifier. `None` for pre-normalized pads, which need no mapping.
    pub guid: Option<Guid>,

    /// USB Vendor ID (VID), if the OS reported one.
    pub vid: Option<u16>,

    /// USB Product ID (PID), if the OS reported one.
    pub pid: Option<u16>,

    /// Name of the catalog entry in use, if any.
    pub mapping: Option<String>,

    /// Raw buttons advertised by the device (raw-report devices only).
    pub buttons: u32,

    /// Hats advertised by the device (raw-report devices only).
    pub hats: u32,
}
