//! Textual colormap encoding
//!
//! A colormap is a `-`-separated list of `start,end,RR,GG,BB` entries, where
//! the range is decimal and the channels are hex:
//! `0,40,ff,00,00-45,115,00,ff,00` paints pixels 0..40 red and 45..115 green.
//! The format does not escape this module; everything else works with
//! [`Direction`] and [`Color`].

use crate::types::{Color, Direction, parse_channel};
use crate::{Result, TableError};

/// One decoded colormap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColormapEntry {
    pub direction: Direction,
    pub color: Color,
}

/// Split an encoded colormap into its raw entries, skipping blank ones.
pub(crate) fn split_entries(encoded: &str) -> impl Iterator<Item = &str> {
    encoded.split('-').map(str::trim).filter(|entry| !entry.is_empty())
}

/// Decode a single `start,end,RR,GG,BB` entry.
pub fn parse_colormap_entry(entry: &str) -> Result<ColormapEntry> {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    let &[start, end, r, g, b] = fields.as_slice() else {
        return Err(TableError::validation(format!(
            "colormap entry '{entry}' must have 5 fields, found {}",
            fields.len()
        )));
    };

    let pixel = |field: &str| {
        field.parse::<usize>().map_err(|e| {
            TableError::validation(format!("invalid pixel index '{field}' in '{entry}': {e}"))
        })
    };

    Ok(ColormapEntry {
        direction: Direction::new(pixel(start)?, pixel(end)?),
        color: Color::new(parse_channel(r)?, parse_channel(g)?, parse_channel(b)?),
    })
}
