//! Table edges and their pixel ranges

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TableError};

/// A half-open pixel range `[start, end)` on the strip.
///
/// Any range can be expressed, but only the four returned by [`Side::direction`]
/// are accepted by the animation; see [`Direction::side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub start: usize,
    pub end: usize,
}

impl Direction {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of pixels covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve this range to one of the four table edges.
    ///
    /// Both `start` and `end` must match exactly.
    pub fn side(&self) -> Result<Side> {
        Side::ALL
            .into_iter()
            .find(|side| side.direction() == *self)
            .ok_or_else(|| {
                TableError::validation(format!("unknown direction {}..{}", self.start, self.end))
            })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One of the four physical edges of the table.
///
/// The declaration order is the order in which the highlighted player advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Right,
    Bottom,
    Left,
    Top,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Right, Side::Bottom, Side::Left, Side::Top];

    /// Pixel range of this edge on the strip.
    pub const fn direction(self) -> Direction {
        match self {
            Side::Right => Direction::new(0, 40),
            Side::Bottom => Direction::new(45, 115),
            Side::Left => Direction::new(120, 156),
            Side::Top => Direction::new(165, 236),
        }
    }

    /// The next edge clockwise: right, bottom, left, top, right.
    pub const fn next(self) -> Side {
        match self {
            Side::Right => Side::Bottom,
            Side::Bottom => Side::Left,
            Side::Left => Side::Top,
            Side::Top => Side::Right,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Top => "top",
        }
    }
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        side.direction()
    }
}

impl FromStr for Side {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        Side::ALL
            .into_iter()
            .find(|side| side.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TableError::validation(format!("unknown direction '{s}'")))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
