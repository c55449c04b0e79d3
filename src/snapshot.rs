//! Per-frame snapshot of device states.
//!
//! [`Snapshot`] is an **owned**, read-only view of all device states at a point
//! in time (typically “this frame”). It’s produced by
//! [`Context::snapshot`](crate::Context::snapshot) and is cheap to clone for
//! fan-out to multiple consumers.
//!
//! # Semantics
//! - Keys are [`DeviceHandle`]s, in ascending order.
//! - Devices whose poll failed this frame are absent.
//! - A snapshot is **immutable**. To refresh, request a new one.
//!
//! # Example
//! ```no_run
//! use padmap::{Axis, Button, Snapshot};
//!
//! fn print_sticks(snap: &Snapshot) {
//!     for (handle, state) in snap.iter() {
//!         println!("{handle}: LX={:.2} LY={:.2} A={}",
//!                  state.axis(Axis::LeftX),
//!                  state.axis(Axis::LeftY),
//!                  state.pressed(Button::A));
//!     }
//! }
//! ```

use crate::device::DeviceHandle;
use crate::state::DeviceState;
use serde::Serialize;
use std::collections::BTreeMap;

/// Owned snapshot of current device states (`handle → DeviceState`).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<DeviceHandle, DeviceState>);

impl Snapshot {
    #[inline]
    pub fn get(&self, handle: DeviceHandle) -> Option<&DeviceState> {
        self.0.get(&handle)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&DeviceHandle, &DeviceState)> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the snapshot and return the inner map.
    #[inline]
    pub fn into_inner(self) -> BTreeMap<DeviceHandle, DeviceState> {
        self.0
    }
}
