//! # padmap
//!
//! Normalizes heterogeneous game controllers into one canonical gamepad: a fixed
//! set of [`Button`]s and [`Axis`]es with fixed ranges, whatever backend the raw
//! signal came from.
//!
//! - Legacy joysticks (raw-report backend) are identified by a synthesized
//!   [`Guid`](guid::Guid), looked up in a mapping catalog written in the public
//!   controller-database format, and normalized through their [`Mapping`](mapping::Mapping).
//! - Console-style pads (pre-normalized backend) only need range rescaling.
//!
//! ```
//! use padmap::backends::virtual_input::VirtualPadBackend;
//! use padmap::backends::{pad_buttons, PadFrame};
//! use padmap::{Button, Context};
//!
//! let pads = VirtualPadBackend::new();
//! pads.set_frame(0, PadFrame { buttons: pad_buttons::A, ..PadFrame::default() });
//!
//! let mut ctx = Context::new().with_pad_backend(pads.clone());
//! ctx.initialize()?;
//!
//! let handle = ctx.devices()[0];
//! let state = ctx.poll(handle)?;
//! assert!(state.pressed(Button::A));
//! # Ok::<(), padmap::Error>(())
//! ```
//!
//! The crate logs through [`tracing`]; install a subscriber in the host to see it.

pub mod backends;
pub mod catalog;
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod guid;
pub mod manager;
pub mod mapping;
pub mod metadata;
pub mod normalize;
pub mod registry;
pub mod snapshot;
pub mod state;

pub use config::Config;
pub use control::{axis_name, button_name, Axis, Button};
pub use device::{BackendKind, DeviceHandle};
pub use error::{Error, Result};
pub use manager::{Context, RefreshSummary};
pub use metadata::DeviceMeta;
pub use snapshot::Snapshot;
pub use state::{button_pressed, DeviceState};
