//! Qualified Address codec.
//!
//! Every entity in a [`ProgramModel`](crate::model::ProgramModel) is targeted
//! by a root-to-leaf path of local ids: `[2, 5]` is entity 5 inside
//! declaration 2. The string wire form joins the segments with `:` (`"2:5"`)
//! and doubles as the Visual Node id on the canvas. Command payloads carry the
//! integer-array form.
//!
//! Port handles (`"input-2:5-0"`) live here as well: they are built from an
//! address and a port index but are never addressable entities on their own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{AddressError, HandleError};

/// Separator between address segments in the string form.
pub const SEPARATOR: char = ':';

/// Separator between an address and the suffix of a synthetic sub-element.
pub const SYNTHETIC_SEPARATOR: &str = "__";

/// Suffix of the synthetic header element emitted for a function.
pub const HEADER_SUFFIX: &str = "header";

/// A local id within the owning container.
pub type LocalId = u32;

/// Root-to-leaf path uniquely identifying one Program Model entity.
///
/// Serializes as a plain integer array. Most addresses are one or two levels
/// deep, so the segments are stored inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedAddress(SmallVec<[LocalId; 4]>);

impl QualifiedAddress {
    /// Address of a top-level entity.
    pub fn root(id: LocalId) -> Self {
        let mut segments = SmallVec::new();
        segments.push(id);
        QualifiedAddress(segments)
    }

    /// Builds an address from explicit segments.
    pub fn from_segments(segments: &[LocalId]) -> Self {
        QualifiedAddress(SmallVec::from_slice(segments))
    }

    /// Returns the address of `id` qualified by `self`.
    pub fn child(&self, id: LocalId) -> Self {
        let mut segments = self.0.clone();
        segments.push(id);
        QualifiedAddress(segments)
    }

    /// Address of the owning container, `None` for top-level entities.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() < 2 {
            return None;
        }
        Some(QualifiedAddress(SmallVec::from_slice(
            &self.0[..self.0.len() - 1],
        )))
    }

    /// The entity's id inside its container.
    pub fn local_id(&self) -> Option<LocalId> {
        self.0.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[LocalId] {
        &self.0
    }

    /// `true` when `self` is `other` followed by at least one more segment.
    pub fn is_strict_extension_of(&self, other: &QualifiedAddress) -> bool {
        self.0.len() > other.0.len() && self.0.starts_with(&other.0)
    }
}

impl fmt::Display for QualifiedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for QualifiedAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl From<Vec<LocalId>> for QualifiedAddress {
    fn from(segments: Vec<LocalId>) -> Self {
        QualifiedAddress(SmallVec::from_vec(segments))
    }
}

/// Appends `local` to `parent`, or returns `local` alone when there is no
/// (or an empty) parent.
pub fn encode(parent: Option<&str>, local: LocalId) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}{}{}", parent, SEPARATOR, local),
        _ => local.to_string(),
    }
}

/// Strictly decodes the string form of an address.
///
/// Surrounding whitespace of each segment is ignored. Any segment that is not
/// a non-negative integer fails the whole decode.
pub fn decode(address: &str) -> Result<QualifiedAddress, AddressError> {
    if address.trim().is_empty() {
        return Err(AddressError::Empty);
    }

    let mut segments = SmallVec::new();
    for (position, segment) in address.split(SEPARATOR).enumerate() {
        let value = segment
            .trim()
            .parse::<LocalId>()
            .map_err(|_| AddressError::InvalidSegment {
                address: address.to_string(),
                position,
                segment: segment.to_string(),
            })?;
        segments.push(value);
    }
    Ok(QualifiedAddress(segments))
}

/// Legacy per-segment decoding.
///
/// Each segment decodes on its own using integer-prefix rules: leading
/// whitespace is skipped, an optional sign and the leading run of digits are
/// read, anything after them is ignored (`"1e2"` reads as 1). A segment with
/// no digits, a negative value or an overflow decodes to the `None` sentinel
/// instead of failing the whole address.
pub fn decode_lossy(address: &str) -> Vec<Option<LocalId>> {
    address.split(SEPARATOR).map(parse_prefix).collect()
}

fn parse_prefix(segment: &str) -> Option<LocalId> {
    let trimmed = segment.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let value = rest[..digits_len].parse::<LocalId>().ok()?;
    if negative && value != 0 {
        return None;
    }
    Some(value)
}

// ---------------------------------------------------------------------------
// Visual ids
// ---------------------------------------------------------------------------

/// A parsed Visual Node id: the entity address plus an optional synthetic
/// sub-element suffix (`"4__header"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualId {
    pub address: QualifiedAddress,
    pub suffix: Option<String>,
}

impl VisualId {
    pub fn parse(id: &str) -> Result<Self, AddressError> {
        match id.split_once(SYNTHETIC_SEPARATOR) {
            Some((address, suffix)) => Ok(VisualId {
                address: decode(address)?,
                suffix: Some(suffix.to_string()),
            }),
            None => Ok(VisualId {
                address: decode(id)?,
                suffix: None,
            }),
        }
    }

    /// Id of a synthetic sub-element of `address`.
    pub fn synthetic(address: &QualifiedAddress, suffix: &str) -> String {
        format!("{}{}{}", address, SYNTHETIC_SEPARATOR, suffix)
    }
}

// ---------------------------------------------------------------------------
// Port handles
// ---------------------------------------------------------------------------

/// Which side of a conduit a port handle sits on.
///
/// Producer ports are spelled `input` and consumer ports `output`, matching
/// the strings the edit service parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specific port of a Visual Node: `"<direction>-<address>-<index>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortHandle {
    pub direction: PortDirection,
    pub address: QualifiedAddress,
    pub index: u32,
}

impl PortHandle {
    /// Handle of a producer port.
    pub fn producer(address: QualifiedAddress, index: u32) -> Self {
        PortHandle {
            direction: PortDirection::Input,
            address,
            index,
        }
    }

    /// Handle of a consumer port.
    pub fn consumer(address: QualifiedAddress, index: u32) -> Self {
        PortHandle {
            direction: PortDirection::Output,
            address,
            index,
        }
    }

    /// Visual Node id of the node owning this port.
    pub fn node_id(&self) -> String {
        self.address.to_string()
    }
}

impl fmt::Display for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.direction, self.address, self.index)
    }
}

impl FromStr for PortHandle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(HandleError::WrongShape {
                handle: s.to_string(),
            });
        }

        let direction = match parts[0] {
            "input" => PortDirection::Input,
            "output" => PortDirection::Output,
            other => {
                return Err(HandleError::UnknownDirection {
                    handle: s.to_string(),
                    direction: other.to_string(),
                })
            }
        };
        let address = decode(parts[1])?;
        let index = parts[2]
            .parse::<u32>()
            .map_err(|_| HandleError::InvalidIndex {
                handle: s.to_string(),
            })?;

        Ok(PortHandle {
            direction,
            address,
            index,
        })
    }
}
