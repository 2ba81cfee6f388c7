// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/types.rs
//!
//! Core type definitions for event mask management
//!
//! This module defines the value types shared by every layer:
//! - `FormatKind`: The schema generation a definition was written in (mk1, mk2)
//! - `BitRange`: A contiguous run of bits inside a 32-bit register
//! - `Register`, `Field`, `Group`: The arena entries of a schema model
//! - `BitState` / `TriState`: Stored leaf state and derived group state
//! - `MaskMode`: Whether a selection describes the event or the capture mask
//!
//! Arena entries refer to each other through the index newtypes
//! (`FieldIdx`, `GroupIdx`, `RegisterIdx`) rather than references, so a
//! group never owns or borrows its children.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema generation of an event mask definition
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Flat register/field layout with explicit offset+width pairs
    Mk1,
    /// Adds nested groups and reserves bits 28-31
    Mk2,
}

impl FormatKind {
    /// Marker value written in the `format:` key of a document
    pub fn marker(self) -> &'static str {
        match self {
            FormatKind::Mk1 => "mk1",
            FormatKind::Mk2 => "mk2",
        }
    }

    /// Maximum number of registers a definition may declare
    pub fn max_registers(self) -> usize {
        match self {
            FormatKind::Mk1 => 12,
            FormatKind::Mk2 => 16,
        }
    }

    /// Mask of the bits events may occupy in a register word
    ///
    /// mk2 hardware ignores bits 28-31, so they are never assignable.
    pub fn usable_bits(self) -> u32 {
        match self {
            FormatKind::Mk1 => u32::MAX,
            FormatKind::Mk2 => 0x0FFF_FFFF,
        }
    }

    /// Whether the generation can express groups at all
    pub fn supports_groups(self) -> bool {
        matches!(self, FormatKind::Mk2)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// Which hardware mask a selection is destined for
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Events that are raised
    #[default]
    EventMask,
    /// Events that are captured/logged
    CaptureMask,
}

impl MaskMode {
    /// Register block offset used when rendering address/value lines
    pub fn address_offset(self) -> u32 {
        match self {
            MaskMode::EventMask => 0x40,
            MaskMode::CaptureMask => 0x100,
        }
    }
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskMode::EventMask => write!(f, "event_mask"),
            MaskMode::CaptureMask => write!(f, "capture_mask"),
        }
    }
}

/// Stored state of a leaf field
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BitState {
    #[default]
    Unset,
    Set,
}

impl BitState {
    pub fn toggled(self) -> Self {
        match self {
            BitState::Unset => BitState::Set,
            BitState::Set => BitState::Unset,
        }
    }

    pub fn is_set(self) -> bool {
        self == BitState::Set
    }
}

impl From<bool> for BitState {
    fn from(value: bool) -> Self {
        if value {
            BitState::Set
        } else {
            BitState::Unset
        }
    }
}

impl fmt::Display for BitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitState::Unset => write!(f, "unset"),
            BitState::Set => write!(f, "set"),
        }
    }
}

/// Derived display state of a field or group
///
/// Computed from leaf states on demand; never stored or mutated directly.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TriState {
    Unset,
    Set,
    /// Some, but not all, descendant leaves are set
    Mixed,
}

impl From<BitState> for TriState {
    fn from(state: BitState) -> Self {
        match state {
            BitState::Unset => TriState::Unset,
            BitState::Set => TriState::Set,
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriState::Unset => write!(f, "[ ]"),
            TriState::Set => write!(f, "[x]"),
            TriState::Mixed => write!(f, "[-]"),
        }
    }
}

/// A contiguous run of bits: `width` bits starting at `offset`
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct BitRange {
    pub offset: u32,
    pub width: u32,
}

impl BitRange {
    pub fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    /// Range covering the inclusive bit interval `low..=high`
    pub fn inclusive(low: u32, high: u32) -> Option<Self> {
        if high < low {
            return None;
        }
        Some(Self::new(low, high - low + 1))
    }

    /// One past the highest bit (computed wide to avoid overflow)
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    pub fn overlaps(&self, other: &BitRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && u64::from(self.offset) < other.end()
            && u64::from(other.offset) < self.end()
    }

    /// True if `other` lies entirely inside this range
    pub fn contains(&self, other: &BitRange) -> bool {
        other.offset >= self.offset && other.end() <= self.end()
    }

    /// Smallest range covering both
    pub fn union(&self, other: &BitRange) -> BitRange {
        let offset = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        BitRange::new(offset, u32::try_from(end - u64::from(offset)).unwrap_or(u32::MAX))
    }

    /// Register word with every bit of this range set
    ///
    /// Bits falling outside a 32-bit word are dropped.
    pub fn mask(&self) -> u32 {
        let ones = if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        };
        ones.checked_shl(self.offset).unwrap_or(0)
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width <= 1 {
            write!(f, "{}", self.offset)
        } else {
            write!(f, "{}-{}", self.offset, self.end() - 1)
        }
    }
}

/// Arena handle of a register
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RegisterIdx(pub(crate) usize);

/// Arena handle of a leaf field
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldIdx(pub(crate) usize);

/// Arena handle of a group
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GroupIdx(pub(crate) usize);

impl RegisterIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

impl FieldIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

impl GroupIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Either kind of addressable node in the hierarchy
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeRef {
    Field(FieldIdx),
    Group(GroupIdx),
}

/// Format-specific attributes carried by a field
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldAttrs {
    /// Selecting a deprecated field is allowed but reported
    pub deprecated: bool,
    /// Longer free-form text shown next to the label
    pub description: Option<String>,
    /// Name of the event source that raises this event
    pub source: Option<String>,
}

/// A hardware register holding up to 32 event bits
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Register {
    pub id: String,
    pub width: u32,
    /// Leaf fields declared in this register, in declaration order
    pub fields: Vec<FieldIdx>,
    /// Groups declared in this register, in declaration order
    pub groups: Vec<GroupIdx>,
}

/// A selectable event: one leaf of the hierarchy
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    pub id: String,
    pub label: String,
    pub register: RegisterIdx,
    pub range: BitRange,
    pub parent: Option<GroupIdx>,
    pub attrs: FieldAttrs,
}

/// A named collection of fields and nested groups (mk2)
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Group {
    pub id: String,
    pub label: String,
    pub register: RegisterIdx,
    /// Span as declared in the definition; must cover every child
    pub span: BitRange,
    pub parent: Option<GroupIdx>,
    /// At most one child may be selected at a time
    pub exclusive: bool,
    /// Child groups in declaration order, then child fields in declaration order
    pub children: Vec<NodeRef>,
}
