//! Control surface used by the CLI and the HTTP API

use tokio::sync::Mutex;
use tracing::info;

use crate::animation::{PlayTableAnimation, lock_animation, share};
use crate::config::TableColors;
use crate::link::Sp108e;
use crate::types::{Direction, Side};
use crate::{Result, TableError};

/// High-level table operations on top of an [`Sp108e`] link.
///
/// Operations are serialized: one caller's start sequence (stop, brightness,
/// paint, start) never interleaves with another caller's.
pub struct TableController {
    link: Sp108e,
    serial: Mutex<()>,
}

impl TableController {
    pub fn new(link: Sp108e) -> Self {
        Self { link, serial: Mutex::new(()) }
    }

    pub fn link(&self) -> &Sp108e {
        &self.link
    }

    pub async fn set_brightness(&self, value: u8) -> Result<()> {
        let _serial = self.serial.lock().await;
        self.link.set_brightness(value).await
    }

    /// Replace the current animation with a play table painted from an
    /// encoded colormap (`start,end,RR,GG,BB[-…]`).
    pub async fn start_colormap(&self, encoded: &str, brightness: Option<u8>) -> Result<()> {
        info!(colormap = encoded, "Starting colormap");
        self.start_play_table(brightness, |table| table.set_player_color_from_string(encoded)).await
    }

    /// Replace the current animation with a play table using one color per edge.
    pub async fn start_table_colors(&self, colors: TableColors, brightness: Option<u8>) -> Result<()> {
        info!(?colors, "Starting table colors");
        self.start_play_table(brightness, |table| {
            table.set_side_color(Side::Right, colors.right)?;
            table.set_side_color(Side::Bottom, colors.bottom)?;
            table.set_side_color(Side::Left, colors.left)?;
            table.set_side_color(Side::Top, colors.top)
        })
        .await
    }

    /// Stop and uninstall the current animation.
    pub async fn stop(&self) {
        let _serial = self.serial.lock().await;
        self.link.stop_animation().await;
    }

    /// Highlight the edge `direction`.
    pub async fn set_active(&self, direction: Direction) -> Result<()> {
        let _serial = self.serial.lock().await;
        self.with_play_table(|table| table.set_active_direction(direction)).await
    }

    /// Move the highlight to the next edge and return it.
    pub async fn next_active(&self) -> Result<Side> {
        let _serial = self.serial.lock().await;
        self.with_play_table(PlayTableAnimation::active_direction_next).await
    }

    pub async fn active_off(&self) -> Result<()> {
        let _serial = self.serial.lock().await;
        self.with_play_table(PlayTableAnimation::active_direction_off).await
    }

    /// Recreate the connection, then restart the animation that was running.
    pub async fn reconnect(&self) -> Result<()> {
        let _serial = self.serial.lock().await;
        let previous =
            if self.link.is_running().await { self.link.current_animation().await } else { None };

        self.link.reconnect().await?;

        if let Some(animation) = previous {
            info!("Restoring animation after reconnect");
            self.link.start_animation(animation).await?;
        }
        Ok(())
    }

    async fn start_play_table<F>(&self, brightness: Option<u8>, paint: F) -> Result<()>
    where
        F: FnOnce(&mut PlayTableAnimation) -> Result<()>,
    {
        let _serial = self.serial.lock().await;
        self.link.stop_animation().await;
        if let Some(value) = brightness {
            self.link.set_brightness(value).await?;
        }

        let mut table = PlayTableAnimation::new(self.link.frame_buffer());
        paint(&mut table)?;
        self.link.start_animation(share(table)).await
    }

    async fn with_play_table<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut PlayTableAnimation) -> Result<R>,
    {
        let animation =
            self.link.current_animation().await.ok_or_else(|| TableError::state("no current animation"))?;

        let mut guard = lock_animation(&animation);
        let name = guard.name();
        let table = guard.as_any_mut().downcast_mut::<PlayTableAnimation>().ok_or_else(|| {
            TableError::state(format!("current animation '{name}' has no player directions"))
        })?;
        f(table)
    }
}
