//! The device context.
//!
//! [`Context`] owns the backends, the mapping catalog and the [`Registry`], and
//! exposes the public operations: lifecycle, refresh, listing, polling and
//! vibration. It is an ordinary value; create one per input consumer.
//!
//! # Cost model
//! - [`Context::refresh`] re-enumerates hardware. Call it on startup or when the
//!   user asks for a rescan, never once per frame.
//! - [`Context::poll`] is the per-frame call. It may clear the slot of a device
//!   that reports a disconnect.
//!
//! # Threading
//! `Context` is `Send` but every operation takes `&mut self`. Wrap it in a
//! `Mutex` to share it between threads.

use crate::backends::{
    PadBackend, PadError, RawCapabilities, RawDeviceKey, RawFrame, RawPollError, RawReportBackend,
    PAD_VIBRATION_MAX,
};
use crate::catalog;
use crate::config::Config;
use crate::device::{BackendHandle, DeviceEntry, DeviceHandle, MappingBinding};
use crate::error::{Error, Result};
use crate::guid::Guid;
use crate::mapping::{Mapping, MappingTable};
use crate::metadata::DeviceMeta;
use crate::normalize::{normalize_pad, normalize_raw};
use crate::registry::{Registry, MAX_DEVICES};
use crate::snapshot::Snapshot;
use crate::state::DeviceState;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

pub struct Context {
    config: Config,
    catalog: Arc<MappingTable>,
    raw: Option<Box<dyn RawReportBackend>>,
    pad: Option<Box<dyn PadBackend>>,
    registry: Registry,
    initialized: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`Context::refresh`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Devices that can be polled.
    pub listed: usize,
    /// Raw-report devices tracked without a mapping.
    pub unmapped: usize,
    /// Devices that did not fit in the registry.
    pub dropped: usize,
}

impl Context {
    /// A context with the builtin catalog, default config and no backends.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            catalog: catalog::builtin(),
            raw: None,
            pad: None,
            registry: Registry::new(),
            initialized: false,
        }
    }

    /// A context wired to this platform's backends.
    #[cfg(all(feature = "hid", target_os = "windows"))]
    #[cfg_attr(docsrs, doc(cfg(all(feature = "hid", target_os = "windows"))))]
    pub fn system() -> Result<Self> {
        use crate::backends::windows::{HidBackend, XInputBackend};

        Ok(Self::new()
            .with_raw_backend(HidBackend::new()?)
            .with_pad_backend(XInputBackend::new()))
    }

    pub fn with_raw_backend(mut self, backend: impl RawReportBackend + 'static) -> Self {
        self.raw = Some(Box::new(backend));
        self
    }

    pub fn with_pad_backend(mut self, backend: impl PadBackend + 'static) -> Self {
        self.pad = Some(Box::new(backend));
        self
    }

    /// Replace the mapping catalog.
    pub fn with_catalog(mut self, catalog: impl Into<Arc<MappingTable>>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &MappingTable {
        &self.catalog
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ---------------- lifecycle ----------------

    /// Start the context and run a first [`refresh`](Self::refresh).
    ///
    /// Fails with [`Error::AlreadyInitialized`] when called twice without an
    /// intervening [`shutdown`](Self::shutdown).
    pub fn initialize(&mut self) -> Result<RefreshSummary> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.registry.clear_all();
        self.initialized = true;
        info!(mappings = self.catalog.len(), "context initialized");
        self.refresh()
    }

    /// Forget every device. Safe to call at any time.
    pub fn shutdown(&mut self) {
        if self.initialized {
            debug!("context shut down");
        }
        self.registry.clear_all();
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    // ---------------- refresh ----------------

    /// Rebuild the registry from a full enumeration of both backends.
    ///
    /// Handles are assigned from scratch: a device is not guaranteed to keep its
    /// handle across refreshes.
    pub fn refresh(&mut self) -> Result<RefreshSummary> {
        self.ensure_initialized()?;
        self.registry.clear_all();

        let mut summary = RefreshSummary::default();

        let found = match self.raw.as_mut() {
            Some(raw) if self.config.raw_report => raw.enumerate(),
            _ => Vec::new(),
        };

        for desc in found {
            if desc.xinput_compatible && self.config.skip_xinput_compatible {
                trace!(name = %desc.name, "skipping XInput-compatible raw device");
                continue;
            }

            let backend = BackendHandle::RawReport(desc.key);
            if let Some(existing) = self.registry.find_same_device(&backend) {
                trace!(handle = %existing, name = %desc.name, "device already registered");
                continue;
            }
            let Some(handle) = self.registry.find_unused_slot() else {
                warn!(name = %desc.name, "registry full, dropping device");
                summary.dropped += 1;
                continue;
            };

            let guid = Guid::synthesize(&desc.product, &desc.name);
            let mapping = match self.catalog.lookup(&guid) {
                Some(index) => MappingBinding::Mapped(index),
                None => {
                    warn!(%guid, name = %desc.name, "no mapping for device");
                    summary.unmapped += 1;
                    MappingBinding::Unmapped
                }
            };

            self.registry.insert(
                handle,
                DeviceEntry {
                    mapping,
                    backend,
                    guid: Some(guid),
                    product: Some(desc.product),
                    name: desc.name,
                    caps: desc.caps,
                },
            );
        }

        if let Some(pad) = self.pad.as_mut().filter(|_| self.config.pre_normalized) {
            for slot in 0..pad.slot_count() {
                if !pad.is_connected(slot) {
                    continue;
                }
                let Some(handle) = self.registry.find_unused_slot() else {
                    warn!(slot, "registry full, dropping pad");
                    summary.dropped += 1;
                    continue;
                };
                self.registry.insert(
                    handle,
                    DeviceEntry {
                        mapping: MappingBinding::SelfNormalized,
                        backend: BackendHandle::PreNormalized(slot),
                        guid: None,
                        product: None,
                        name: pad.slot_name(slot),
                        caps: RawCapabilities::default(),
                    },
                );
            }
        }

        summary.listed = self.registry.list(MAX_DEVICES).len();
        info!(
            listed = summary.listed,
            unmapped = summary.unmapped,
            dropped = summary.dropped,
            "device refresh complete"
        );
        Ok(summary)
    }

    // ---------------- queries ----------------

    /// Valid handles in ascending order, at most `max` of them.
    pub fn list_devices(&self, max: usize) -> Vec<DeviceHandle> {
        if !self.initialized {
            return Vec::new();
        }
        self.registry.list(max)
    }

    /// Every valid handle.
    pub fn devices(&self) -> Vec<DeviceHandle> {
        self.list_devices(MAX_DEVICES)
    }

    pub fn device_valid(&self, handle: DeviceHandle) -> bool {
        self.initialized && self.registry.is_valid(handle)
    }

    fn mapping_of(&self, entry: &DeviceEntry) -> Option<&Mapping> {
        match entry.mapping {
            MappingBinding::Mapped(index) => self.catalog.get(index),
            _ => None,
        }
    }

    /// Describe the device in `handle`, including unmapped raw-report devices.
    pub fn device_meta(&self, handle: DeviceHandle) -> Option<DeviceMeta> {
        if !self.initialized {
            return None;
        }
        let entry = self.registry.get(handle)?;
        let (vid, pid) = entry
            .product
            .and_then(|p| p.vid_pid())
            .map_or((None, None), |(v, p)| (Some(v), Some(p)));

        Some(DeviceMeta {
            handle,
            backend: entry.kind(),
            name: entry.name.clone(),
            guid: entry.guid,
            vid,
            pid,
            mapping: self.mapping_of(entry).map(|m| m.name.clone()),
            buttons: entry.caps.buttons,
            hats: entry.caps.hats,
        })
    }

    /// Catalog name when mapped, otherwise the display name.
    pub fn device_name(&self, handle: DeviceHandle) -> Option<&str> {
        if !self.initialized {
            return None;
        }
        let entry = self.registry.get(handle)?;
        Some(
            self.mapping_of(entry)
                .map_or(entry.name.as_str(), |m| m.name.as_str()),
        )
    }

    // ---------------- per-frame ----------------

    /// Read and normalize the current state of one device.
    ///
    /// A [`Error::Disconnected`] result means the slot has been cleared.
    pub fn poll(&mut self, handle: DeviceHandle) -> Result<DeviceState> {
        self.ensure_initialized()?;
        let entry = self
            .registry
            .get(handle)
            .ok_or(Error::InvalidHandle(handle.0))?;
        let (backend, binding, hats) = (entry.backend, entry.mapping, entry.caps.hats);

        match (backend, binding) {
            (_, MappingBinding::Unmapped) => Err(Error::Unmapped(handle)),
            (BackendHandle::RawReport(key), MappingBinding::Mapped(index)) => {
                let frame = self.read_raw(handle, key)?;
                let mapping = self.catalog.get(index).ok_or(Error::Unmapped(handle))?;
                Ok(normalize_raw(&frame, mapping, hats))
            }
            (BackendHandle::RawReport(_), MappingBinding::SelfNormalized) => {
                Err(Error::Unmapped(handle))
            }
            (BackendHandle::PreNormalized(slot), _) => {
                let pad = self
                    .pad
                    .as_mut()
                    .ok_or(Error::Unsupported("no pre-normalized backend"))?;
                match pad.poll(slot) {
                    Ok(frame) => Ok(normalize_pad(&frame)),
                    Err(e) => Err(self.pad_failed(handle, e)),
                }
            }
        }
    }

    fn read_raw(&mut self, handle: DeviceHandle, key: RawDeviceKey) -> Result<RawFrame> {
        let raw = self
            .raw
            .as_mut()
            .ok_or(Error::Unsupported("no raw-report backend"))?;

        match raw.poll(key) {
            Ok(frame) => Ok(frame),
            Err(RawPollError::NeedsReacquire) if self.config.retry_transient => {
                debug!(%handle, "re-acquiring device");
                match raw.reacquire(key).and_then(|()| raw.poll(key)) {
                    Ok(frame) => Ok(frame),
                    Err(e) => Err(self.raw_failed(handle, e)),
                }
            }
            Err(e) => Err(self.raw_failed(handle, e)),
        }
    }

    fn raw_failed(&mut self, handle: DeviceHandle, error: RawPollError) -> Error {
        match error {
            RawPollError::Disconnected => {
                self.registry.remove(handle);
                info!(%handle, "device disconnected");
                Error::Disconnected(handle)
            }
            RawPollError::NeedsReacquire => {
                debug!(%handle, "device still unavailable");
                Error::Transient(handle)
            }
            RawPollError::Other(msg) => {
                warn!(%handle, error = %msg, "raw poll failed");
                Error::Backend(msg)
            }
        }
    }

    fn pad_failed(&mut self, handle: DeviceHandle, error: PadError) -> Error {
        match error {
            PadError::NotConnected => {
                self.registry.remove(handle);
                info!(%handle, "pad disconnected");
                Error::Disconnected(handle)
            }
            PadError::Other(msg) => {
                warn!(%handle, error = %msg, "pad request failed");
                Error::Backend(msg)
            }
        }
    }

    /// Poll every valid device. Devices that fail this frame are left out.
    pub fn snapshot(&mut self) -> Snapshot {
        let mut snap = Snapshot::default();
        for handle in self.devices() {
            match self.poll(handle) {
                Ok(state) => {
                    snap.0.insert(handle, state);
                }
                Err(e) => trace!(%handle, error = %e, "left out of snapshot"),
            }
        }
        snap
    }

    /// Drive both vibration motors. Intensities are clamped to `[0, 1]`.
    ///
    /// Raw-report devices have no vibration support and return
    /// [`Error::Unsupported`].
    pub fn rumble(&mut self, handle: DeviceHandle, low_freq: f32, high_freq: f32) -> Result<()> {
        self.ensure_initialized()?;
        let entry = self
            .registry
            .get(handle)
            .ok_or(Error::InvalidHandle(handle.0))?;

        let slot = match entry.backend {
            BackendHandle::RawReport(_) => {
                return Err(Error::Unsupported("vibration on raw-report devices"))
            }
            BackendHandle::PreNormalized(slot) => slot,
        };
        let pad = self
            .pad
            .as_mut()
            .ok_or(Error::Unsupported("no pre-normalized backend"))?;
        if slot >= pad.slot_count() {
            return Err(Error::InvalidHandle(handle.0));
        }

        match pad.set_vibration(slot, intensity(low_freq), intensity(high_freq)) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.pad_failed(handle, e)),
        }
    }
}

/// Clamp to `[0, 1]` (NaN reads as 0) and scale to the native motor range.
fn intensity(v: f32) -> u16 {
    let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    (v * f32::from(PAD_VIBRATION_MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn intensity_clamps() {
        assert_eq!(intensity(0.0), 0);
        assert_eq!(intensity(1.0), PAD_VIBRATION_MAX);
        assert_eq!(intensity(2.0), PAD_VIBRATION_MAX);
        assert_eq!(intensity(-3.0), 0);
        assert_eq!(intensity(f32::NAN), 0);
        assert_eq!(intensity(0.5), 32767);
    }

    #[test]
    fn uninitialized_context_rejects_operations() {
        let mut ctx = Context::new();
        assert!(!ctx.is_initialized());
        assert!(matches!(ctx.refresh(), Err(Error::NotInitialized)));
        assert!(matches!(ctx.poll(DeviceHandle(0)), Err(Error::NotInitialized)));
        assert!(matches!(ctx.rumble(DeviceHandle(0), 1.0, 1.0), Err(Error::NotInitialized)));
        assert!(ctx.devices().is_empty());
        assert!(!ctx.device_valid(DeviceHandle(0)));
        assert!(ctx.device_meta(DeviceHandle(0)).is_none());
    }

    proptest! {
        #[test]
        fn intensity_above_one_matches_one(v in 1.0f32..1.0e6) {
            prop_assert_eq!(intensity(v), intensity(1.0));
        }
    }
}
