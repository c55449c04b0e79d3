//! Mapping descriptors and the mapping table.
//!
//! A [`Mapping`] tells the normalization engine where each logical button and
//! axis comes from on one hardware model. Mappings are authored as
//! controller-database lines:
//!
//! ```text
//! 030000005e0400008e02000000000000,Xbox 360 Controller,a:b0,b:b1,...,lefttrigger:+a2,leftx:a0,dpup:h0.1,platform:Windows,
//! ```
//!
//! ## Element sources
//! | source  | kind       | index              | scale | offset |
//! |---------|------------|--------------------|-------|--------|
//! | `bN`    | `Button`   | `N`                | 1     | 0      |
//! | `hH.B`  | `HatBit`   | `(H << 4) \| B`    | 1     | 0      |
//! | `aN`    | `Axis`     | `N`                | 1     | 0      |
//! | `+aN`   | `Axis`     | `N`                | 2     | -1     |
//! | `-aN`   | `Axis`     | `N`                | 2     | 1      |
//!
//! A trailing `~` on an axis source negates scale and offset. An element whose
//! scale and offset are both zero is unmapped.

use crate::control::{Axis, Button, AXIS_COUNT, BUTTON_COUNT};
use crate::guid::{Guid, InvalidGuid};
use tracing::{trace, warn};

/// Where a mapping element reads from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MappingKind {
    #[default]
    Axis,
    Button,
    HatBit,
}

impl MappingKind {
    pub const fn name(self) -> &'static str {
        match self {
            MappingKind::Axis => "Axis",
            MappingKind::Button => "Button",
            MappingKind::HatBit => "Hatbit",
        }
    }
}

/// One raw source feeding one logical button or axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MappingElement {
    pub kind: MappingKind,
    /// Raw axis/button index, or `(hat << 4) | direction_bit` for hat bits.
    pub index: u8,
    pub axis_scale: i8,
    pub axis_offset: i8,
}

impl MappingElement {
    pub const UNMAPPED: Self = Self {
        kind: MappingKind::Axis,
        index: 0,
        axis_scale: 0,
        axis_offset: 0,
    };

    /// Full-range axis.
    pub const fn axis(index: u8) -> Self {
        Self::axis_with(index, 1, 0)
    }

    pub const fn axis_with(index: u8, axis_scale: i8, axis_offset: i8) -> Self {
        Self {
            kind: MappingKind::Axis,
            index,
            axis_scale,
            axis_offset,
        }
    }

    pub const fn button(index: u8) -> Self {
        Self {
            kind: MappingKind::Button,
            index,
            axis_scale: 1,
            axis_offset: 0,
        }
    }

    /// `bit` is one of the hat direction bits (1 = up, 2 = right, 4 = down, 8 = left).
    pub const fn hat_bit(hat: u8, bit: u8) -> Self {
        Self {
            kind: MappingKind::HatBit,
            index: (hat << 4) | (bit & 0x0f),
            axis_scale: 1,
            axis_offset: 0,
        }
    }

    #[inline]
    pub const fn is_mapped(&self) -> bool {
        !(self.axis_scale == 0 && self.axis_offset == 0)
    }

    /// Hat number and direction bit of a `HatBit` element.
    #[inline]
    pub const fn hat_parts(&self) -> (usize, u8) {
        ((self.index >> 4) as usize, self.index & 0x0f)
    }
}

/// Per-model mapping descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Mapping {
    pub name: String,
    pub buttons: [MappingElement; BUTTON_COUNT],
    pub axes: [MappingElement; AXIS_COUNT],
}

/// Errors raised while parsing controller-database lines or building a table.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MappingParseError {
    #[error("mapping line is empty")]
    Empty,
    #[error(transparent)]
    Guid(#[from] InvalidGuid),
    #[error("mapping for {0} has no name")]
    MissingName(Guid),
    #[error("invalid source {source_text:?} for {target:?}")]
    InvalidElement { target: String, source_text: String },
    #[error("duplicate mapping identifier {0}")]
    DuplicateGuid(Guid),
}

impl Mapping {
    /// A mapping with every element unmapped.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buttons: [MappingElement::UNMAPPED; BUTTON_COUNT],
            axes: [MappingElement::UNMAPPED; AXIS_COUNT],
        }
    }

    pub fn with_button(mut self, button: Button, element: MappingElement) -> Self {
        self.buttons[button.index()] = element;
        self
    }

    pub fn with_axis(mut self, axis: Axis, element: MappingElement) -> Self {
        self.axes[axis.index()] = element;
        self
    }

    #[inline]
    pub fn button(&self, button: Button) -> MappingElement {
        self.buttons[button.index()]
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> MappingElement {
        self.axes[axis.index()]
    }

    /// Parse one controller-database line into its identifier and mapping.
    ///
    /// Fields naming controls outside the logical vocabulary (`platform`,
    /// `touchpad`, `misc1`, paddles, output-range modifiers) are ignored.
    pub fn from_db_line(line: &str) -> Result<(Guid, Mapping), MappingParseError> {
        let mut fields = line.trim().split(',');

        let guid_text = fields.next().map(str::trim).unwrap_or_default();
        if guid_text.is_empty() {
            return Err(MappingParseError::Empty);
        }
        let guid = Guid::parse(guid_text)?;

        let name = fields.next().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(MappingParseError::MissingName(guid));
        }

        let mut mapping = Mapping::empty(name);

        for field in fields {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let Some((target, source)) = field.split_once(':') else {
                trace!(%guid, field = field, "ignoring mapping field without a source");
                continue;
            };

            if let Some(button) = Button::from_db_name(target) {
                mapping.buttons[button.index()] = parse_source(target, source)?;
            } else if let Some(axis) = Axis::from_db_name(target) {
                mapping.axes[axis.index()] = parse_source(target, source)?;
            } else {
                trace!(%guid, control = target, "ignoring mapping field outside the logical vocabulary");
            }
        }

        Ok((guid, mapping))
    }
}

fn parse_source(target: &str, source: &str) -> Result<MappingElement, MappingParseError> {
    let invalid = || MappingParseError::InvalidElement {
        target: target.to_string(),
        source_text: source.to_string(),
    };

    if let Some(n) = source.strip_prefix('b') {
        return n.parse::<u8>().map(MappingElement::button).map_err(|_| invalid());
    }

    if let Some(rest) = source.strip_prefix('h') {
        let (hat, bit) = rest.split_once('.').ok_or_else(invalid)?;
        let hat: u8 = hat.parse().map_err(|_| invalid())?;
        let bit: u8 = bit.parse().map_err(|_| invalid())?;
        if hat > 0x0f || !matches!(bit, 1 | 2 | 4 | 8) {
            return Err(invalid());
        }
        return Ok(MappingElement::hat_bit(hat, bit));
    }

    let (scale, offset, rest) = match source.as_bytes().first() {
        Some(b'+') => (2i8, -1i8, &source[1..]),
        Some(b'-') => (2, 1, &source[1..]),
        _ => (1, 0, source),
    };
    let (rest, inverted) = match rest.strip_suffix('~') {
        Some(r) => (r, true),
        None => (rest, false),
    };
    let n = rest.strip_prefix('a').ok_or_else(invalid)?;
    let index: u8 = n.parse().map_err(|_| invalid())?;

    Ok(if inverted {
        MappingElement::axis_with(index, -scale, -offset)
    } else {
        MappingElement::axis_with(index, scale, offset)
    })
}

/// Read-only catalog of mappings keyed by device identifier.
///
/// Lookup is a first-match linear scan. Construction rejects duplicate
/// identifiers so the scan order never decides which mapping wins.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    entries: Vec<(Guid, Mapping)>,
}

impl MappingTable {
    pub fn from_entries(entries: Vec<(Guid, Mapping)>) -> Result<Self, MappingParseError> {
        for (i, (guid, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(g, _)| g == guid) {
                return Err(MappingParseError::DuplicateGuid(*guid));
            }
        }
        Ok(Self { entries })
    }

    /// Parse a block of controller-database lines. Blank lines and `#` comments
    /// are skipped; any malformed line fails the whole table.
    pub fn from_db_lines(text: &str) -> Result<Self, MappingParseError> {
        let entries = db_lines(text)
            .map(Mapping::from_db_line)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Like [`from_db_lines`](Self::from_db_lines) but logs and skips malformed
    /// or duplicate lines instead of failing.
    pub fn from_db_lines_lenient(text: &str) -> Self {
        let mut entries: Vec<(Guid, Mapping)> = Vec::new();
        for line in db_lines(text) {
            match Mapping::from_db_line(line) {
                Ok((guid, _)) if entries.iter().any(|(g, _)| *g == guid) => {
                    warn!(%guid, "skipping duplicate mapping");
                }
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "skipping malformed mapping line"),
            }
        }
        Self { entries }
    }

    /// Index of the mapping registered for `guid`.
    pub fn lookup(&self, guid: &Guid) -> Option<usize> {
        self.entries.iter().position(|(g, _)| g == guid)
    }

    pub fn get(&self, index: usize) -> Option<&Mapping> {
        self.entries.get(index).map(|(_, m)| m)
    }

    pub fn find(&self, guid: &Guid) -> Option<&Mapping> {
        self.lookup(guid).and_then(|i| self.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Guid, &Mapping)> {
        self.entries.iter().map(|(g, m)| (g, m))
    }
}

fn db_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}
