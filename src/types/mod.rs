//! Core value types: colors, table edges and the frame buffer.
//!
//! - [`Color`] is an RGB triple with a small named [`PALETTE`]
//! - [`Direction`] is a pixel range; [`Side`] names the four table edges that
//!   are the only ranges the animation accepts
//! - [`FrameBuffer`] is the fixed-size byte image streamed to the controller
//!
//! ```rust
//! use sp108e_table::types::{Color, Direction, FrameBuffer, Side};
//!
//! let mut frame = FrameBuffer::new(300);
//! frame.fill(Side::Bottom.direction(), Color::named("green").unwrap()).unwrap();
//! assert_eq!(frame.pixel(45), Some(Color::new(0, 255, 0)));
//! assert_eq!(Direction::new(45, 115).side().unwrap(), Side::Bottom);
//! ```

mod color;
mod direction;
mod frame;

pub use color::{Color, PALETTE};
pub(crate) use color::parse_channel;
pub use direction::{Direction, Side};
pub use frame::{BYTES_PER_PIXEL, DEFAULT_PIXELS, FrameBuffer, MAX_PIXELS, SharedFrame, lock_frame};
