//! Device identifiers.
//!
//! A [`Guid`] is the 32-character lowercase hex key used to look a device up in
//! the mapping catalog. It is synthesized from what the OS reports about the
//! device so that it matches the identifiers used by the public SDL
//! `gamecontrollerdb` catalog on Windows:
//!
//! - devices with a vendor/product id: `03000000` + vid (LE hex) + `0000`
//!   + pid (LE hex) + `000000000000`
//! - devices without one: `05000000` + the first 11 bytes of the display name
//!   (hex, zero padded) + `00`
//!
//! Synthesis is a pure function of its inputs; the same device yields the same
//! identifier on every refresh.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of characters in an identifier.
pub const GUID_LEN: usize = 32;

/// Marker stored in the tail of a product GUID that carries a VID/PID pair.
pub const PIDVID_MARKER: [u8; 6] = *b"PIDVID";

const NAME_BYTES: usize = 11;

/// Catalog lookup key. Always 32 lowercase ASCII hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid([u8; GUID_LEN]);

/// Returned when a string is not a valid identifier.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid device identifier {0:?} (expected {GUID_LEN} hex digits)")]
pub struct InvalidGuid(pub String);

impl Guid {
    /// Parse a 32-digit hex identifier. Upper-case digits are folded to lower case.
    pub fn parse(s: &str) -> Result<Self, InvalidGuid> {
        let bytes = s.as_bytes();
        if bytes.len() != GUID_LEN || !bytes.iter().all(u8::is_ascii_hexdigit) {
            return Err(InvalidGuid(s.to_string()));
        }
        let mut out = [0u8; GUID_LEN];
        for (dst, src) in out.iter_mut().zip(bytes) {
            *dst = src.to_ascii_lowercase();
        }
        Ok(Self(out))
    }

    /// Derive the identifier for a device from its product GUID and display name.
    pub fn synthesize(product: &ProductGuid, name: &str) -> Self {
        let text = match product.vid_pid() {
            Some(_) => {
                let d = product.data1.to_le_bytes();
                format!(
                    "03000000{:02x}{:02x}0000{:02x}{:02x}000000000000",
                    d[0], d[1], d[2], d[3]
                )
            }
            None => {
                let mut raw = [0u8; NAME_BYTES];
                for (dst, src) in raw.iter_mut().zip(name.as_bytes()) {
                    *dst = *src;
                }
                format!("05000000{}00", hex::encode(raw))
            }
        };

        let mut out = [0u8; GUID_LEN];
        out.copy_from_slice(text.as_bytes());
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        // Constructors only ever store ASCII hex digits.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8; GUID_LEN] {
        &self.0
    }
}

impl FromStr for Guid {
    type Err = InvalidGuid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.as_str())
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Product GUID as reported by the legacy joystick API.
///
/// When the device exposes a USB vendor/product pair, `data1` holds
/// `vid | pid << 16` and `data4[2..8]` holds [`PIDVID_MARKER`]. Anything else is
/// treated as "no VID/PID available".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProductGuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl ProductGuid {
    /// Build the product GUID the OS would report for a USB/Bluetooth HID device.
    pub fn from_vid_pid(vendor_id: u16, product_id: u16) -> Self {
        let mut data4 = [0u8; 8];
        data4[2..].copy_from_slice(&PIDVID_MARKER);
        Self {
            data1: u32::from(vendor_id) | (u32::from(product_id) << 16),
            data2: 0,
            data3: 0,
            data4,
        }
    }

    /// `(vendor_id, product_id)` when the VID/PID marker is present.
    pub fn vid_pid(&self) -> Option<(u16, u16)> {
        if self.data4[2..] == PIDVID_MARKER {
            Some((self.data1 as u16, (self.data1 >> 16) as u16))
        } else {
            None
        }
    }
}
