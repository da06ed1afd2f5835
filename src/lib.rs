//! Drive an SP108E LED-strip controller around a boardgame table.
//!
//! The strip runs along the four edges of a table. Each player's edge gets a
//! static color, and the active player's edge can pulse. Frames are rendered
//! every 10 ms and streamed to the controller over its raw TCP protocol.
//!
//! # Architecture
//!
//! - [`Sp108e`] (the link) owns the TCP session, the frame buffer and the
//!   installed animation, and spawns the render loop when it connects
//! - the render loop (private `engine` module) steps: step the animation, send the frame, sleep
//! - [`PlayTableAnimation`] paints the edges and drives the pulse
//! - [`TableController`] is the serialized control surface the CLI and the
//!   [`http`] API call into
//!
//! # Example
//!
//! ```rust,no_run
//! use sp108e_table::{LinkConfig, Side, Sp108e, TableController};
//!
//! #[tokio::main]
//! async fn main() -> sp108e_table::Result<()> {
//!     let link = Sp108e::connect(LinkConfig::new("192.168.178.83", 8189)).await?;
//!     let table = TableController::new(link);
//!
//!     table.start_colormap("0,40,ff,00,00-45,115,00,ff,00", Some(128)).await?;
//!     table.set_active(Side::Right.direction()).await?;
//!     table.next_active().await?;
//!     Ok(())
//! }
//! ```

pub mod animation;
pub mod config;
pub mod controller;
mod engine;
mod error;
pub mod http;
pub mod link;
pub mod protocol;
pub mod types;

pub use animation::{Animation, PlayTableAnimation, SharedAnimation};
pub use config::{Cli, LinkConfig, LinkTiming, TableColors};
pub use controller::TableController;
pub use error::*;
pub use link::Sp108e;
pub use types::{Color, Direction, FrameBuffer, SharedFrame, Side};
