//! Fixed-size RGB frame buffer

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Color, Direction};
use crate::{Result, TableError};

/// Bytes per pixel on the wire (R, G, B).
pub const BYTES_PER_PIXEL: usize = 3;

/// Pixels the controller is driven with by default.
pub const DEFAULT_PIXELS: usize = 300;

/// Largest strip the SP108E drives.
pub const MAX_PIXELS: usize = 2048;

/// Frame buffer shared between the link's transmit path and the animation.
pub type SharedFrame = Arc<Mutex<FrameBuffer>>;

/// Ordered RGB triples, one per pixel, sent verbatim as a custom-preview frame.
///
/// The length never changes after construction. All writes go through
/// range-checked methods, so a write never touches a partial triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Create a black frame of `pixels` pixels.
    ///
    /// Sizes above [`MAX_PIXELS`] are clamped; use [`FrameBuffer::try_new`]
    /// to reject them instead.
    pub fn new(pixels: usize) -> Self {
        Self { data: vec![0; pixels.min(MAX_PIXELS) * BYTES_PER_PIXEL] }
    }

    /// Create a black frame, failing when `pixels` exceeds [`MAX_PIXELS`].
    pub fn try_new(pixels: usize) -> Result<Self> {
        if pixels > MAX_PIXELS {
            return Err(TableError::validation(format!(
                "{pixels} pixels requested, the controller drives at most {MAX_PIXELS}"
            )));
        }
        Ok(Self::new(pixels))
    }

    /// Wrap the buffer for sharing.
    pub fn shared(self) -> SharedFrame {
        Arc::new(Mutex::new(self))
    }

    pub fn pixels(&self) -> usize {
        self.data.len() / BYTES_PER_PIXEL
    }

    /// Raw bytes in transmit order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, index: usize) -> Option<Color> {
        let offset = index.checked_mul(BYTES_PER_PIXEL)?;
        let triple = self.data.get(offset..offset + BYTES_PER_PIXEL)?;
        Some(Color::new(triple[0], triple[1], triple[2]))
    }

    /// Overwrite every pixel in `direction` with `color`.
    pub fn fill(&mut self, direction: Direction, color: Color) -> Result<()> {
        for triple in self.range_mut(direction)?.chunks_exact_mut(BYTES_PER_PIXEL) {
            triple.copy_from_slice(&[color.r, color.g, color.b]);
        }
        Ok(())
    }

    /// Multiply every channel in `direction` by `factor`, truncating to a byte.
    pub fn scale(&mut self, direction: Direction, factor: f64) -> Result<()> {
        for channel in self.range_mut(direction)? {
            *channel = (f64::from(*channel) * factor) as u8;
        }
        Ok(())
    }

    /// Check that `direction` lies inside the frame.
    pub fn check_bounds(&self, direction: Direction) -> Result<()> {
        let pixels = self.pixels();
        if direction.end > pixels {
            return Err(TableError::buffer_bounds(direction.start.max(pixels), pixels));
        }
        Ok(())
    }

    fn range_mut(&mut self, direction: Direction) -> Result<&mut [u8]> {
        self.check_bounds(direction)?;
        if direction.is_empty() {
            return Ok(&mut []);
        }
        Ok(&mut self.data[direction.start * BYTES_PER_PIXEL..direction.end * BYTES_PER_PIXEL])
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELS)
    }
}

/// Lock a shared frame, recovering the data if a previous holder panicked.
///
/// The buffer holds plain bytes, so a panic mid-write leaves at worst a
/// half-painted frame that the next repaint fixes.
pub fn lock_frame(frame: &SharedFrame) -> MutexGuard<'_, FrameBuffer> {
    frame.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_frames_are_refused() {
        assert_eq!(FrameBuffer::try_new(MAX_PIXELS).unwrap().pixels(), MAX_PIXELS);
        let err = FrameBuffer::try_new(usize::MAX).unwrap_err();
        assert!(matches!(err, TableError::Validation { .. }), "{err:?}");
        assert_eq!(FrameBuffer::new(usize::MAX).pixels(), MAX_PIXELS);
    }

    #[test]
    fn new_frame_is_black_and_sized() {
        let frame = FrameBuffer::new(300);
        assert_eq!(frame.pixels(), 300);
        assert_eq!(frame.as_bytes().len(), 900);
        assert!(frame.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn fill_touches_only_the_range() {
        let mut frame = FrameBuffer::new(10);
        frame.fill(Direction::new(2, 4), Color::new(1, 2, 3)).unwrap();

        assert_eq!(frame.pixel(1), Some(Color::default()));
        assert_eq!(frame.pixel(2), Some(Color::new(1, 2, 3)));
        assert_eq!(frame.pixel(3), Some(Color::new(1, 2, 3)));
        assert_eq!(frame.pixel(4), Some(Color::default()));
    }

    #[test]
    fn last_pixel_is_writable() {
        let mut frame = FrameBuffer::new(10);
        frame.fill(Direction::new(9, 10), Color::new(9, 9, 9)).unwrap();
        assert_eq!(frame.pixel(9), Some(Color::new(9, 9, 9)));
        assert_eq!(frame.pixel(10), None);
    }

    #[test]
    fn out_of_bounds_fails_without_writing() {
        let mut frame = FrameBuffer::new(10);
        let before = frame.clone();

        let err = frame.fill(Direction::new(5, 11), Color::new(255, 255, 255)).unwrap_err();
        assert!(matches!(err, TableError::BufferBounds { pixels: 10, .. }));
        assert_eq!(frame, before);

        let err = frame.scale(Direction::new(20, 30), 0.5).unwrap_err();
        assert!(matches!(err, TableError::BufferBounds { pixel: 10, pixels: 10 }));
    }

    #[test]
    fn scale_truncates_each_channel() {
        let mut frame = FrameBuffer::new(2);
        frame.fill(Direction::new(0, 2), Color::new(255, 3, 200)).unwrap();
        frame.scale(Direction::new(1, 2), 0.5).unwrap();

        assert_eq!(frame.pixel(0), Some(Color::new(255, 3, 200)));
        assert_eq!(frame.pixel(1), Some(Color::new(127, 1, 100)));
    }
}
