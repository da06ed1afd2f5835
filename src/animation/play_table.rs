//! Play-table animation: four colored edges and a pulsing active player

use std::any::Any;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use tracing::debug;

use super::Animation;
use super::colormap::{parse_colormap_entry, split_entries};
use crate::types::{Color, Direction, FrameBuffer, SharedFrame, Side, lock_frame};
use crate::{Result, TableError};

/// Fade counter value after a wrap, in degrees.
pub const FADE_START: u8 = 20;

/// Fade counter value at which the pulse restarts, in degrees.
pub const FADE_MAX: u8 = 160;

/// Degrees added to the fade counter per tick.
pub const FADE_INCREMENT: u8 = 3;

/// Brightness factor for a fade counter value: `sin(step°)`.
pub fn fade_intensity(step: u8) -> f64 {
    (f64::from(step) * PI / 180.0).sin()
}

/// Each player's edge shows a static color; the active player's edge breathes.
///
/// Pixels outside the four edges are never written, so whatever was in the
/// frame before stays there.
pub struct PlayTableAnimation {
    frame: SharedFrame,
    players: BTreeMap<Side, Color>,
    active: Option<Side>,
    fade_step: u8,
}

impl PlayTableAnimation {
    pub fn new(frame: SharedFrame) -> Self {
        Self { frame, players: BTreeMap::new(), active: None, fade_step: FADE_START }
    }

    /// Assign `color` to a table edge and repaint.
    ///
    /// `direction` must be exactly one of the four edges. On error neither the
    /// mapping nor the frame is changed.
    pub fn set_player_color(&mut self, direction: Direction, color: Color) -> Result<()> {
        let side = direction.side()?;
        lock_frame(&self.frame).check_bounds(direction)?;

        debug!(%side, %color, "Setting player color");
        self.players.insert(side, color);
        self.repaint()
    }

    pub fn set_side_color(&mut self, side: Side, color: Color) -> Result<()> {
        self.set_player_color(side.direction(), color)
    }

    /// Apply an encoded colormap (`start,end,RR,GG,BB[-…]`) entry by entry.
    ///
    /// Entries are applied left to right; the first bad entry stops the call
    /// and is reported, leaving the entries before it applied.
    pub fn set_player_color_from_string(&mut self, encoded: &str) -> Result<()> {
        let mut applied = 0;
        for raw in split_entries(encoded) {
            let entry = parse_colormap_entry(raw)?;
            self.set_player_color(entry.direction, entry.color)?;
            applied += 1;
        }
        if applied == 0 {
            return Err(TableError::validation("colormap is empty"));
        }
        Ok(())
    }

    /// Make `direction` the pulsing edge, replacing any previous one.
    pub fn set_active_direction(&mut self, direction: Direction) -> Result<()> {
        let side = direction.side()?;
        self.set_active_side(side);
        Ok(())
    }

    pub fn set_active_side(&mut self, side: Side) {
        debug!(%side, "Active direction set");
        self.active = Some(side);
    }

    /// Move the highlight to the next edge (right, bottom, left, top).
    pub fn active_direction_next(&mut self) -> Result<Side> {
        let current = self.active.ok_or_else(|| TableError::state("no active direction"))?;
        let next = current.next();
        self.set_active_side(next);
        // The previous edge may still carry a partial fade.
        self.repaint()?;
        Ok(next)
    }

    /// Clear the highlight and restore the static colors.
    pub fn active_direction_off(&mut self) -> Result<()> {
        if self.active.take().is_none() {
            return Err(TableError::state("no active direction"));
        }
        debug!("Active direction cleared");
        self.repaint()
    }

    pub fn active_side(&self) -> Option<Side> {
        self.active
    }

    pub fn active_direction(&self) -> Option<Direction> {
        self.active.map(Side::direction)
    }

    pub fn player_color(&self, side: Side) -> Option<Color> {
        self.players.get(&side).copied()
    }

    pub fn fade_step(&self) -> u8 {
        self.fade_step
    }

    /// Overwrite every configured edge with its static color.
    pub fn repaint(&self) -> Result<()> {
        let mut frame = lock_frame(&self.frame);
        self.paint_players(&mut frame)
    }

    fn paint_players(&self, frame: &mut FrameBuffer) -> Result<()> {
        for (side, color) in &self.players {
            frame.fill(side.direction(), *color)?;
        }
        Ok(())
    }

    fn advance_fade(&mut self) {
        self.fade_step = if self.fade_step >= FADE_MAX {
            FADE_START
        } else {
            self.fade_step.saturating_add(FADE_INCREMENT)
        };
    }
}

impl Animation for PlayTableAnimation {
    fn name(&self) -> &'static str {
        "play-table"
    }

    fn step(&mut self) -> Result<()> {
        let Some(active) = self.active else {
            return Ok(());
        };

        self.advance_fade();
        let intensity = fade_intensity(self.fade_step);

        let mut frame = lock_frame(&self.frame);
        self.paint_players(&mut frame)?;
        frame.scale(active.direction(), intensity)
    }

    fn set_frame_buffer(&mut self, frame: SharedFrame) {
        self.frame = frame;
    }

    fn frame_buffer(&self) -> &SharedFrame {
        &self.frame
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
