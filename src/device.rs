//! Device handles and registry entries.
//!
//! A [`DeviceHandle`] is a small slot index into the
//! [`Registry`](crate::registry::Registry). Handles are reused once a slot is
//! cleared, so callers must not hold on to one across a refresh.

use crate::backends::{RawCapabilities, RawDeviceKey};
use crate::guid::{Guid, ProductGuid};
use serde::Serialize;
use std::fmt;

/// Index of a registry slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceHandle(pub u8);

impl DeviceHandle {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which backend a device belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    RawReport,
    PreNormalized,
}

/// Backend-specific address of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendHandle {
    RawReport(RawDeviceKey),
    /// Slot index of the pre-normalized backend.
    PreNormalized(u32),
}

impl BackendHandle {
    pub const fn kind(&self) -> BackendKind {
        match self {
            BackendHandle::RawReport(_) => BackendKind::RawReport,
            BackendHandle::PreNormalized(_) => BackendKind::PreNormalized,
        }
    }
}

/// How a device's raw frames are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingBinding {
    /// Tracked, but no catalog entry matched; never listed or polled.
    Unmapped,
    /// Index into the context's [`MappingTable`](crate::mapping::MappingTable).
    Mapped(usize),
    /// Backend output is already in canonical form.
    SelfNormalized,
}

impl MappingBinding {
    #[inline]
    pub const fn is_usable(&self) -> bool {
        !matches!(self, MappingBinding::Unmapped)
    }
}

/// Occupant of one registry slot.
#[derive(Clone, Debug)]
pub struct DeviceEntry {
    pub mapping: MappingBinding,
    pub backend: BackendHandle,
    /// Catalog identifier (raw-report devices only).
    pub guid: Option<Guid>,
    pub product: Option<ProductGuid>,
    pub name: String,
    pub caps: RawCapabilities,
}

impl DeviceEntry {
    #[inline]
    pub const fn kind(&self) -> BackendKind {
        self.backend.kind()
    }
}
