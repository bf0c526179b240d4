//! Core types shared across the engine, layout and host bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

// =============================================================================
// Cell Kind
// =============================================================================

/// What occupies a coordinate of a grid template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Decorative spacer, receives no content.
    #[default]
    Empty,
    /// Slot that is filled from the content distributor.
    Content,
}

impl CellKind {
    /// Parse the single-character template notation.
    ///
    /// `_` and `.` are empty cells, `X` and `#` are content cells.
    pub fn from_tag(tag: char) -> Result<Self, GridError> {
        match tag {
            '_' | '.' => Ok(Self::Empty),
            'X' | 'x' | '#' => Ok(Self::Content),
            other => Err(GridError::UnknownCellTag(other)),
        }
    }

    /// Character used when printing templates.
    pub fn tag(self) -> char {
        match self {
            Self::Empty => '_',
            Self::Content => 'X',
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Content => f.write_str("content"),
        }
    }
}

impl FromStr for CellKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(Self::Empty),
            "content" => Ok(Self::Content),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(tag), None) => Self::from_tag(tag),
                    _ => Err(GridError::Config(format!("unknown cell kind {other:?}"))),
                }
            }
        }
    }
}

// =============================================================================
// Visual Elements
// =============================================================================

/// Opaque handle to a visual element owned by a [`Surface`](crate::layout::Surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Vertical extent of an element in content coordinates.
///
/// Content coordinates put the top of the first forward page at
/// `leading_offset`; pages inserted backwards sit at negative offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Shift by a scroll offset, giving viewport-relative bounds.
    pub fn scrolled(&self, offset: f64) -> Self {
        Self {
            top: self.top - offset,
            height: self.height,
        }
    }
}

/// Which scroll container a page is mounted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Grows downwards from the origin. New pages go below the last one.
    Forward,
    /// Grows upwards from the origin. New pages go above the topmost one.
    Backward,
}

impl Region {
    pub fn is_backward(self) -> bool {
        self == Self::Backward
    }
}

// =============================================================================
// Input Capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Input capabilities reported by the host at startup.
    ///
    /// Combine with bitwise OR: `InputCapabilities::WHEEL | InputCapabilities::FINE_POINTER`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputCapabilities: u8 {
        const NONE = 0;
        const TOUCH = 1 << 0;
        const FINE_POINTER = 1 << 1;
        const WHEEL = 1 << 2;
    }
}

impl InputCapabilities {
    /// Whether the engine should start in native (touch) scroll mode.
    pub fn prefers_touch(self) -> bool {
        self.contains(Self::TOUCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_kind_tags() {
        assert_eq!(CellKind::from_tag('_').unwrap(), CellKind::Empty);
        assert_eq!(CellKind::from_tag('.').unwrap(), CellKind::Empty);
        assert_eq!(CellKind::from_tag('X').unwrap(), CellKind::Content);
        assert_eq!(CellKind::from_tag('#').unwrap(), CellKind::Content);
        assert!(matches!(
            CellKind::from_tag('?'),
            Err(GridError::UnknownCellTag('?'))
        ));
    }

    #[test]
    fn test_cell_kind_from_str() {
        assert_eq!("content".parse::<CellKind>().unwrap(), CellKind::Content);
        assert_eq!("empty".parse::<CellKind>().unwrap(), CellKind::Empty);
        assert_eq!("X".parse::<CellKind>().unwrap(), CellKind::Content);
        assert!("project".parse::<CellKind>().is_err());
    }

    #[test]
    fn test_bounds_scrolled() {
        let bounds = Bounds::new(100.0, 50.0);
        assert_eq!(bounds.bottom(), 150.0);

        let scrolled = bounds.scrolled(120.0);
        assert_eq!(scrolled.top, -20.0);
        assert_eq!(scrolled.bottom(), 30.0);
    }

    #[test]
    fn test_capabilities_prefer_touch() {
        assert!(InputCapabilities::TOUCH.prefers_touch());
        assert!((InputCapabilities::TOUCH | InputCapabilities::WHEEL).prefers_touch());
        assert!(!(InputCapabilities::WHEEL | InputCapabilities::FINE_POINTER).prefers_touch());
        assert!(!InputCapabilities::NONE.prefers_touch());
    }
}
