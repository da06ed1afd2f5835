//! Animations rendered into the shared frame buffer.
//!
//! An [`Animation`] is bound to a [`SharedFrame`] and advanced one tick at a
//! time by the render loop (private `engine` module). The link only ever sees
//! `dyn Animation`; callers that need variant-specific operations downcast via
//! [`Animation::as_any_mut`].
//!
//! [`PlayTableAnimation`] is the only variant today: four colored table edges,
//! one of which can pulse to mark the active player.

mod colormap;
mod play_table;

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Result;
use crate::types::SharedFrame;

pub use colormap::{ColormapEntry, parse_colormap_entry};
pub use play_table::{
    FADE_INCREMENT, FADE_MAX, FADE_START, PlayTableAnimation, fade_intensity,
};

/// Something that paints frames, one tick at a time.
pub trait Animation: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Advance one tick, writing the result into the bound frame buffer.
    fn step(&mut self) -> Result<()>;

    /// Bind the frame buffer this animation paints into.
    fn set_frame_buffer(&mut self, frame: SharedFrame);

    /// The frame buffer this animation paints into.
    fn frame_buffer(&self) -> &SharedFrame;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// An animation shared between the render loop and the control surface.
pub type SharedAnimation = Arc<Mutex<dyn Animation>>;

/// Wrap an animation for installation on a link.
pub fn share<A: Animation>(animation: A) -> SharedAnimation {
    Arc::new(Mutex::new(animation))
}

/// Lock a shared animation, recovering it if a previous holder panicked.
pub fn lock_animation(animation: &SharedAnimation) -> MutexGuard<'_, dyn Animation> {
    animation.lock().unwrap_or_else(PoisonError::into_inner)
}
