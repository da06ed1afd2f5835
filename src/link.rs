//! TCP link to an SP108E controller
//!
//! [`Sp108e`] owns the socket, the frame buffer and the currently installed
//! animation. Creating it dials the controller and spawns the render loop
//! (private `engine` module), which keeps running until the link is dropped.
//!
//! Every socket operation happens while holding the link's state lock, so a
//! brightness command can never interleave with a frame that is being
//! streamed.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::animation::{SharedAnimation, lock_animation};
use crate::config::{LinkConfig, LinkTiming};
use crate::engine::RenderLoop;
use crate::protocol::{self, ACK_LEN};
use crate::types::{FrameBuffer, SharedFrame, lock_frame};
use crate::{Result, TableError};

/// Mutable link state, guarded by one lock.
pub(crate) struct LinkState {
    pub(crate) stream: Option<TcpStream>,
    pub(crate) running: bool,
    pub(crate) animation: Option<SharedAnimation>,
}

/// State shared between the link handle and its render loop.
pub(crate) struct LinkShared {
    address: String,
    pub(crate) timing: LinkTiming,
    frame: SharedFrame,
    pub(crate) state: Mutex<LinkState>,
}

/// Connection to one SP108E controller.
pub struct Sp108e {
    shared: Arc<LinkShared>,

    /// Cancels the render loop when the link goes away.
    cancel: CancellationToken,
}

impl Sp108e {
    /// Dial the controller, allocate the frame buffer and start the render loop.
    pub async fn connect(config: LinkConfig) -> Result<Self> {
        let address = config.address();
        info!(%address, pixels = config.pixels, "Connecting to SP108E");

        let frame = FrameBuffer::try_new(config.pixels)?.shared();
        let stream = dial(&address).await?;
        let shared = Arc::new(LinkShared {
            address,
            timing: config.timing,
            frame,
            state: Mutex::new(LinkState { stream: Some(stream), running: false, animation: None }),
        });

        let cancel = CancellationToken::new();
        RenderLoop::spawn(Arc::clone(&shared), cancel.clone());

        Ok(Self { shared, cancel })
    }

    /// Address of the controller as dialed.
    pub fn address(&self) -> &str {
        &self.shared.address
    }

    pub fn timing(&self) -> &LinkTiming {
        &self.shared.timing
    }

    /// The frame buffer animations should paint into.
    pub fn frame_buffer(&self) -> SharedFrame {
        Arc::clone(&self.shared.frame)
    }

    /// Close the current connection.
    ///
    /// Fails if there is no open connection.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        self.shared.close(&mut state).await
    }

    /// Drop the running animation, close the connection and dial again.
    ///
    /// The animation is not re-armed; callers that want it back must start it
    /// again. A failed close (for example because the connection was already
    /// gone) does not prevent the new dial; it is only reported when the dial
    /// fails too.
    pub async fn reconnect(&self) -> Result<()> {
        let close_result = {
            let mut state = self.shared.state.lock().await;
            if state.running {
                info!("Stopping animation for reconnect");
            }
            state.running = false;
            state.animation = None;
            self.shared.close(&mut state).await
        };
        if let Err(e) = &close_result {
            warn!("Close before reconnect failed: {e}");
        }

        tokio::time::sleep(self.shared.timing.reconnect_settle).await;

        let mut state = self.shared.state.lock().await;
        match dial(&self.shared.address).await {
            Ok(stream) => {
                state.stream = Some(stream);
                info!("Reconnected to {}", self.shared.address);
                Ok(())
            }
            Err(dial_err) => match close_result {
                Ok(()) => Err(dial_err),
                Err(close_err) => Err(TableError::connection_failed(format!(
                    "reconnect failed: close: {close_err}; connect: {dial_err}"
                ))),
            },
        }
    }

    /// Probe the connection, transparently redialing a dead one.
    ///
    /// This only detects a peer that already closed the connection; it is not
    /// a liveness guarantee.
    pub async fn is_connected(&self) -> bool {
        let mut state = self.shared.state.lock().await;
        self.shared.probe(&mut state).await
    }

    /// Write raw bytes to the controller, optionally waiting for an acknowledgement.
    pub async fn send_command(&self, bytes: &[u8], expect_ack: bool) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        self.shared.send(&mut state, bytes, expect_ack).await
    }

    /// Set the controller brightness.
    ///
    /// A running animation is paused around the command and resumed
    /// afterwards, so the same animation is installed when this returns. If
    /// another caller stops or replaces the animation while it is paused, the
    /// paused one is not resumed.
    pub async fn set_brightness(&self, value: u8) -> Result<()> {
        info!(value, "Setting brightness");
        let packet = protocol::brightness_packet(value)?;

        let paused = self.pause().await;
        let sent = self.send_command(&packet, false).await;

        let Some(animation) = paused else {
            return sent;
        };
        tokio::time::sleep(self.shared.timing.brightness_settle).await;
        let resumed = self.resume(&animation).await;
        sent.and(resumed)
    }

    /// Switch the controller to streaming mode and install `animation`.
    pub async fn start_animation(&self, animation: SharedAnimation) -> Result<()> {
        let name = check_frame(&animation)?;
        let mut state = self.shared.state.lock().await;
        self.shared.arm(&mut state, animation, name).await
    }

    /// Stop streaming and uninstall the current animation.
    ///
    /// Waits for an in-flight frame to finish when an animation was running.
    /// Does nothing when nothing is installed.
    pub async fn stop_animation(&self) {
        let was_running = {
            let mut state = self.shared.state.lock().await;
            let was_running = std::mem::replace(&mut state.running, false);
            state.animation = None;
            was_running
        };
        if was_running {
            info!("Animation stopped");
            tokio::time::sleep(self.shared.timing.stop_settle).await;
        }
    }

    /// The installed animation, if any.
    pub async fn current_animation(&self) -> Option<SharedAnimation> {
        self.shared.state.lock().await.animation.clone()
    }

    /// Whether the render loop is currently streaming frames.
    pub async fn is_running(&self) -> bool {
        self.shared.state.lock().await.running
    }

    /// Clear the running flag but keep the animation installed.
    async fn pause(&self) -> Option<SharedAnimation> {
        let paused = {
            let mut state = self.shared.state.lock().await;
            if !state.running {
                return None;
            }
            state.running = false;
            state.animation.clone()
        };
        debug!("Animation paused");
        tokio::time::sleep(self.shared.timing.stop_settle).await;
        paused
    }

    /// Restart `animation` if it is still the installed, paused one.
    async fn resume(&self, animation: &SharedAnimation) -> Result<()> {
        let name = check_frame(animation)?;
        let mut state = self.shared.state.lock().await;
        let untouched = !state.running
            && state.animation.as_ref().is_some_and(|current| Arc::ptr_eq(current, animation));
        if !untouched {
            debug!(animation = name, "Animation changed while paused, not resuming");
            return Ok(());
        }
        self.shared.arm(&mut state, Arc::clone(animation), name).await
    }
}

impl Drop for Sp108e {
    fn drop(&mut self) {
        debug!("Dropping SP108E link");
        self.cancel.cancel();
    }
}

impl LinkShared {
    /// Enter streaming mode and install `animation` as running.
    async fn arm(
        &self,
        state: &mut LinkState,
        animation: SharedAnimation,
        name: &'static str,
    ) -> Result<()> {
        self.send(state, &protocol::custom_preview_packet()?, true).await?;
        state.animation = Some(animation);
        state.running = true;
        info!(animation = name, "Animation started");
        Ok(())
    }

    pub(crate) async fn close(&self, state: &mut LinkState) -> Result<()> {
        let mut stream =
            state.stream.take().ok_or_else(|| TableError::connection_failed("connection already closed"))?;
        info!("Closing connection to {}", self.address);
        stream.shutdown().await.map_err(|e| {
            TableError::connection_failed_with_source("failed to close connection", Box::new(e))
        })
    }

    /// Zero-cost liveness probe; redials when the peer has hung up.
    pub(crate) async fn probe(&self, state: &mut LinkState) -> bool {
        if let Some(stream) = &state.stream {
            let mut scratch = [0u8; ACK_LEN];
            match stream.try_read(&mut scratch) {
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return true,
                Ok(0) => warn!("Detected closed connection"),
                Ok(n) => {
                    // Late acknowledgement bytes; dropping them keeps replies aligned.
                    trace!("Discarded {n} stray bytes: {:02x?}", &scratch[..n]);
                    return true;
                }
                Err(e) => warn!("Connection probe failed: {e}"),
            }
            state.stream = None;
        }

        match dial(&self.address).await {
            Ok(stream) => {
                state.stream = Some(stream);
                true
            }
            Err(e) => {
                warn!("Redial failed: {e}");
                false
            }
        }
    }

    pub(crate) async fn send(&self, state: &mut LinkState, bytes: &[u8], expect_ack: bool) -> Result<()> {
        if !self.probe(state).await {
            return Err(TableError::connection_failed(format!(
                "not connected to {}, command not sent",
                self.address
            )));
        }
        let Some(stream) = state.stream.as_mut() else {
            return Err(TableError::connection_failed("connection lost before send"));
        };

        let result = exchange(stream, bytes, expect_ack, self.timing.ack_timeout).await;
        if let Err(TableError::Connection { .. } | TableError::Timeout { .. }) = &result {
            // The next send dials a fresh connection.
            state.stream = None;
        }
        result
    }
}

/// Name of `animation`, failing when it has no pixels to stream.
fn check_frame(animation: &SharedAnimation) -> Result<&'static str> {
    let guard = lock_animation(animation);
    if lock_frame(guard.frame_buffer()).pixels() == 0 {
        return Err(TableError::state("no frame buffer set for animation"));
    }
    Ok(guard.name())
}

async fn exchange(
    stream: &mut TcpStream,
    bytes: &[u8],
    expect_ack: bool,
    ack_timeout: Option<std::time::Duration>,
) -> Result<()> {
    trace!("Sending {} bytes (ack expected: {expect_ack})", bytes.len());
    stream.write_all(bytes).await?;
    if !expect_ack {
        return Ok(());
    }

    let mut reply = [0u8; ACK_LEN];
    let read = stream.read(&mut reply);
    let n = match ack_timeout {
        Some(duration) => tokio::time::timeout(duration, read)
            .await
            .map_err(|_| TableError::Timeout { duration })??,
        None => read.await?,
    };
    if n == 0 {
        return Err(TableError::connection_failed("connection closed while waiting for acknowledgement"));
    }
    protocol::check_ack(&reply[..n])
}

async fn dial(address: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(address).await.map_err(|e| {
        TableError::connection_failed_with_source(format!("failed to connect to {address}"), Box::new(e))
    })?;
    stream.set_nodelay(true)?;
    debug!("Connection established to {address}");
    Ok(stream)
}
