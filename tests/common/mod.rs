//! In-process stand-in for an SP108E controller.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use sp108e_table::protocol::{ACK, ACK_LEN, CMD_CUSTOM_PREVIEW, COMMAND_LEN, FRAME_END, FRAME_START};
use sp108e_table::{LinkConfig, LinkTiming};

/// Strip size used by the tests; just large enough for all four edges.
pub const PIXELS: usize = 240;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Short settle delays so tests don't sit through the production ones.
pub fn fast_timing() -> LinkTiming {
    LinkTiming {
        tick: Duration::from_millis(5),
        stop_settle: Duration::from_millis(20),
        brightness_settle: Duration::from_millis(10),
        reconnect_settle: Duration::from_millis(10),
        ack_timeout: Some(Duration::from_secs(1)),
    }
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub commands: Vec<[u8; COMMAND_LEN]>,
    pub frames: Vec<Vec<u8>>,
}

/// Fake controller that acknowledges preview commands and frames.
///
/// Incoming bytes are split into 6-byte command frames and raw frames of
/// `PIXELS * 3` bytes. Test colors must not produce a frame that starts
/// like a command.
pub struct MockController {
    addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
    wrong_ack: Arc<AtomicBool>,
    connections: Arc<AtomicUsize>,
    hang_up: Arc<watch::Sender<u64>>,
}

impl MockController {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock controller");
        let addr = listener.local_addr().expect("mock address");
        let mock = Self {
            addr,
            recorded: Arc::default(),
            wrong_ack: Arc::default(),
            connections: Arc::default(),
            hang_up: Arc::new(watch::channel(0).0),
        };

        let recorded = Arc::clone(&mock.recorded);
        let wrong_ack = Arc::clone(&mock.wrong_ack);
        let connections = Arc::clone(&mock.connections);
        let hang_up = Arc::clone(&mock.hang_up);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                connections.fetch_add(1, Ordering::SeqCst);
                let hung_up = hang_up.subscribe();
                tokio::spawn(serve(socket, Arc::clone(&recorded), Arc::clone(&wrong_ack), hung_up));
            }
        });
        mock
    }

    pub fn config(&self) -> LinkConfig {
        LinkConfig::new(self.addr.ip().to_string(), self.addr.port())
            .with_pixels(PIXELS)
            .with_timing(fast_timing())
    }

    /// Answer acknowledged commands with a negative reply from now on.
    pub fn set_wrong_ack(&self, wrong: bool) {
        self.wrong_ack.store(wrong, Ordering::SeqCst);
    }

    /// Close every open connection from the controller side.
    pub fn hang_up(&self) {
        self.hang_up.send_modify(|generation| *generation += 1);
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<[u8; COMMAND_LEN]> {
        self.recorded.lock().unwrap().commands.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.recorded.lock().unwrap().frames.len()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.recorded.lock().unwrap().frames.last().cloned()
    }

    pub fn clear(&self) {
        *self.recorded.lock().unwrap() = Recorded::default();
    }
}

async fn serve(
    mut socket: TcpStream,
    recorded: Arc<Mutex<Recorded>>,
    wrong_ack: Arc<AtomicBool>,
    mut hung_up: watch::Receiver<u64>,
) {
    let frame_len = PIXELS * 3;
    let mut pending = Vec::new();
    let mut chunk = vec![0u8; 4096];

    loop {
        let n = tokio::select! {
            _ = hung_up.changed() => return,
            read = socket.read(&mut chunk) => match read {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            },
        };
        pending.extend_from_slice(&chunk[..n]);

        loop {
            let is_command = pending.len() >= COMMAND_LEN
                && pending[0] == FRAME_START
                && pending[COMMAND_LEN - 1] == FRAME_END;
            let needs_ack = if is_command {
                let command: [u8; COMMAND_LEN] = pending[..COMMAND_LEN].try_into().unwrap();
                pending.drain(..COMMAND_LEN);
                recorded.lock().unwrap().commands.push(command);
                command[4] == CMD_CUSTOM_PREVIEW
            } else if pending.len() >= frame_len {
                let frame: Vec<u8> = pending.drain(..frame_len).collect();
                recorded.lock().unwrap().frames.push(frame);
                true
            } else {
                break;
            };

            if needs_ack {
                let mut reply = [0u8; ACK_LEN];
                reply[0] = if wrong_ack.load(Ordering::SeqCst) { 0x00 } else { ACK };
                if socket.write_all(&reply).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
