//! Fixed-capacity device registry.
//!
//! Slots are indexed by [`DeviceHandle`]. A slot is either empty or holds a
//! [`DeviceEntry`]; entries whose identifier had no catalog match stay in their
//! slot as [`MappingBinding::Unmapped`] so the device is tracked, but they are
//! never reported as valid.

use crate::device::{BackendHandle, DeviceEntry, DeviceHandle, MappingBinding};

/// Number of registry slots.
pub const MAX_DEVICES: usize = 8;

#[derive(Debug, Default)]
pub struct Registry {
    slots: [Option<DeviceEntry>; MAX_DEVICES],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every slot.
    pub fn clear_all(&mut self) {
        self.slots = Default::default();
    }

    /// First empty slot, or `None` when the registry is full.
    pub fn find_unused_slot(&self) -> Option<DeviceHandle> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|i| DeviceHandle(i as u8))
    }

    /// Clear one slot. Out-of-range or already-empty handles are ignored.
    pub fn remove(&mut self, handle: DeviceHandle) -> Option<DeviceEntry> {
        self.slots.get_mut(handle.index()).and_then(Option::take)
    }

    /// The slot is occupied by a device that can be polled.
    pub fn is_valid(&self, handle: DeviceHandle) -> bool {
        self.get(handle).is_some_and(|e| e.mapping.is_usable())
    }

    /// Valid handles in ascending order, at most `max` of them.
    pub fn list(&self, max: usize) -> Vec<DeviceHandle> {
        self.iter()
            .filter(|(_, e)| e.mapping.is_usable())
            .map(|(h, _)| h)
            .take(max)
            .collect()
    }

    pub fn get(&self, handle: DeviceHandle) -> Option<&DeviceEntry> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Occupy `handle`. Returns `false` if the handle is out of range or taken.
    pub fn insert(&mut self, handle: DeviceHandle, entry: DeviceEntry) -> bool {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.is_none() => {
                *slot = Some(entry);
                true
            }
            _ => false,
        }
    }

    /// Slot already holding the device behind `backend`.
    pub fn find_same_device(&self, backend: &BackendHandle) -> Option<DeviceHandle> {
        self.iter()
            .find(|(_, e)| e.backend == *backend)
            .map(|(h, _)| h)
    }

    /// Occupied slots, valid or not.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceHandle, &DeviceEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (DeviceHandle(i as u8), e)))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn binding(&self, handle: DeviceHandle) -> Option<MappingBinding> {
        self.get(handle).map(|e| e.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{RawCapabilities, RawDeviceKey};

    fn entry(key: u64, mapping: MappingBinding) -> DeviceEntry {
        DeviceEntry {
            mapping,
            backend: BackendHandle::RawReport(RawDeviceKey(key)),
            guid: None,
            product: None,
            name: format!("dev{key}"),
            caps: RawCapabilities::default(),
        }
    }

    #[test]
    fn cleared_registry_lists_nothing() {
        let mut reg = Registry::new();
        reg.insert(DeviceHandle(0), entry(0, MappingBinding::Mapped(0)));
        reg.clear_all();
        for max in 0..=MAX_DEVICES + 1 {
            assert!(reg.list(max).is_empty());
        }
        assert_eq!(reg.find_unused_slot(), Some(DeviceHandle(0)));
    }

    #[test]
    fn full_registry_has_no_unused_slot() {
        let mut reg = Registry::new();
        for i in 0..MAX_DEVICES as u64 {
            let h = reg.find_unused_slot().unwrap();
            assert!(reg.insert(h, entry(i, MappingBinding::Mapped(0))));
        }
        assert_eq!(reg.find_unused_slot(), None);
        assert_eq!(reg.list(MAX_DEVICES + 4).len(), MAX_DEVICES);
        assert_eq!(reg.list(3), vec![DeviceHandle(0), DeviceHandle(1), DeviceHandle(2)]);
    }

    #[test]
    fn unmapped_entries_are_tracked_but_invalid() {
        let mut reg = Registry::new();
        reg.insert(DeviceHandle(0), entry(0, MappingBinding::Unmapped));
        reg.insert(DeviceHandle(1), entry(1, MappingBinding::SelfNormalized));
        assert!(!reg.is_valid(DeviceHandle(0)));
        assert!(reg.is_valid(DeviceHandle(1)));
        assert_eq!(reg.list(8), vec![DeviceHandle(1)]);
        assert_eq!(reg.occupied(), 2);
        assert_eq!(reg.find_unused_slot(), Some(DeviceHandle(2)));
    }

    #[test]
    fn remove_is_idempotent_and_frees_the_slot() {
        let mut reg = Registry::new();
        reg.insert(DeviceHandle(0), entry(0, MappingBinding::Mapped(0)));
        reg.insert(DeviceHandle(1), entry(1, MappingBinding::Mapped(0)));
        assert!(reg.remove(DeviceHandle(0)).is_some());
        assert!(reg.remove(DeviceHandle(0)).is_none());
        assert!(reg.remove(DeviceHandle(200)).is_none());
        assert!(!reg.is_valid(DeviceHandle(0)));
        assert_eq!(reg.find_unused_slot(), Some(DeviceHandle(0)));
    }

    #[test]
    fn insert_refuses_taken_or_out_of_range_slots() {
        let mut reg = Registry::new();
        assert!(reg.insert(DeviceHandle(3), entry(0, MappingBinding::Mapped(0))));
        assert!(!reg.insert(DeviceHandle(3), entry(1, MappingBinding::Mapped(0))));
        assert!(!reg.insert(DeviceHandle(MAX_DEVICES as u8), entry(2, MappingBinding::Mapped(0))));
        assert_eq!(
            reg.find_same_device(&BackendHandle::RawReport(RawDeviceKey(0))),
            Some(DeviceHandle(3))
        );
    }
}
