//! Render loop that streams animation frames to the controller

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::Result;
use crate::animation::lock_animation;
use crate::link::LinkShared;
use crate::types::lock_frame;

/// The perpetual per-link render task.
///
/// Spawned once when the link connects, independent of any animation. Each
/// tick it checks the running flag; when set, it steps the installed
/// animation and sends the frame with an acknowledgement expected. Failures
/// are logged and the loop carries on, relying on the link's connection probe
/// to heal the socket. Stopping an animation only clears the flag.
pub(crate) struct RenderLoop;

impl RenderLoop {
    pub(crate) fn spawn(shared: Arc<LinkShared>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            Self::run(shared, cancel).await;
        })
    }

    async fn run(shared: Arc<LinkShared>, cancel: CancellationToken) {
        info!("Render loop started ({:?} tick)", shared.timing.tick);
        let mut frame_count = 0u64;
        let mut error_count = 0u32;

        loop {
            match Self::tick(&shared).await {
                Ok(true) => {
                    frame_count += 1;
                    if error_count > 0 {
                        info!("Frame streaming recovered after {error_count} failed frames");
                        error_count = 0;
                    }
                    trace!("Frame {frame_count} sent");
                }
                Ok(false) => {}
                Err(e) => {
                    error_count += 1;
                    if error_count == 1 {
                        warn!("Error rendering animation frame: {e}");
                    } else {
                        debug!("Error rendering animation frame ({error_count} in a row): {e}");
                    }
                }
            }

            // Sleep after every tick, sent or not: the controller needs the gap.
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(shared.timing.tick) => {}
            }
        }

        info!("Render loop ended ({frame_count} frames sent)");
    }

    /// Render and send one frame. Returns whether a frame was sent.
    pub(crate) async fn tick(shared: &LinkShared) -> Result<bool> {
        let mut state = shared.state.lock().await;
        if !state.running {
            return Ok(false);
        }
        let Some(animation) = state.animation.clone() else {
            return Ok(false);
        };

        let bytes = {
            let mut guard = lock_animation(&animation);
            guard.step()?;
            lock_frame(guard.frame_buffer()).as_bytes().to_vec()
        };

        shared.send(&mut state, &bytes, true).await?;
        Ok(true)
    }
}
