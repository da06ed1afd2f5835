//! Command-line flags and link configuration

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::types::{Color, DEFAULT_PIXELS, MAX_PIXELS};

/// Controller address used when `--host` is not given.
pub const DEFAULT_HOST: &str = "192.168.178.83";

/// Controller port used when `--port` is not given.
pub const DEFAULT_PORT: u16 = 8189;

/// Colormap used by a bare `--colormap`: right edge red, bottom edge green.
pub const DEFAULT_COLORMAP: &str = "0,40,ff,00,00-45,115,00,ff,00";

/// Delays the link waits on around state changes.
///
/// The defaults are tuned for a Raspberry Pi driving a real SP108E; the
/// render tick in particular is the fastest rate the controller ingests
/// frames at reliably. Tests shrink the settle delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTiming {
    /// Pause between two rendered frames.
    pub tick: Duration,

    /// Wait after clearing the running flag so an in-flight frame can finish.
    pub stop_settle: Duration,

    /// Wait after a brightness command before streaming resumes.
    pub brightness_settle: Duration,

    /// Wait between closing and reopening the connection.
    pub reconnect_settle: Duration,

    /// Deadline for a controller acknowledgement; `None` waits forever.
    pub ack_timeout: Option<Duration>,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            stop_settle: Duration::from_millis(100),
            brightness_settle: Duration::from_millis(100),
            reconnect_settle: Duration::from_secs(1),
            ack_timeout: None,
        }
    }
}

/// Where the controller lives and how the link talks to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,

    /// Frame buffer size in pixels.
    pub pixels: usize,

    pub timing: LinkTiming,
}

impl LinkConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, pixels: DEFAULT_PIXELS, timing: LinkTiming::default() }
    }

    pub fn with_pixels(mut self, pixels: usize) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn with_timing(mut self, timing: LinkTiming) -> Self {
        self.timing = timing;
        self
    }

    /// `host:port` as dialed.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Boardgame table control for SP108E LED controllers.
#[derive(Parser, Debug, Clone)]
#[command(name = "sp108e-table", version, about)]
pub struct Cli {
    /// Run the HTTP control server instead of a one-shot command
    #[arg(long)]
    pub server: bool,

    /// Controller host
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Controller port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Brightness to apply once (0-255)
    #[arg(long)]
    pub brightness: Option<u8>,

    /// Encoded colormap `start,end,RR,GG,BB[-...]`; a bare flag uses a red/green split
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_COLORMAP, value_name = "MAP")]
    pub colormap: Option<String>,

    /// Color of the right edge (palette name or hex)
    #[arg(long)]
    pub right: Option<Color>,

    /// Color of the left edge (palette name or hex)
    #[arg(long)]
    pub left: Option<Color>,

    /// Color of the top edge (palette name or hex)
    #[arg(long)]
    pub top: Option<Color>,

    /// Color of the bottom edge (palette name or hex)
    #[arg(long)]
    pub bottom: Option<Color>,

    /// Seconds between background reconnects; 0 disables them
    #[arg(long, default_value_t = 300, value_name = "SECONDS")]
    pub reconnect: u64,

    /// Address the HTTP server binds to
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Number of pixels on the strip
    #[arg(long, default_value_t = DEFAULT_PIXELS, value_parser = parse_pixels)]
    pub pixels: usize,

    /// Give up on a controller acknowledgement after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub ack_timeout_ms: Option<u64>,
}

/// Colors for all four edges, as given on the command line or via `tablecolors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableColors {
    pub right: Color,
    pub bottom: Color,
    pub left: Color,
    pub top: Color,
}

impl Cli {
    pub fn link_config(&self) -> LinkConfig {
        let timing = LinkTiming {
            ack_timeout: self.ack_timeout_ms.map(Duration::from_millis),
            ..LinkTiming::default()
        };
        LinkConfig::new(self.host.clone(), self.port).with_pixels(self.pixels).with_timing(timing)
    }

    /// Per-edge colors, only when all four were given.
    pub fn table_colors(&self) -> Option<TableColors> {
        Some(TableColors { right: self.right?, bottom: self.bottom?, left: self.left?, top: self.top? })
    }

    pub fn reconnect_interval(&self) -> Option<Duration> {
        (self.reconnect > 0).then(|| Duration::from_secs(self.reconnect))
    }

    /// Whether the process outlives its one-shot commands: the server, or a
    /// table animation that streams until Ctrl-C.
    pub fn keeps_running(&self) -> bool {
        self.server || self.table_colors().is_some() || self.colormap.is_some()
    }
}

fn parse_pixels(value: &str) -> Result<usize, String> {
    let pixels: usize = value.parse().map_err(|e| format!("{e}"))?;
    if !(1..=MAX_PIXELS).contains(&pixels) {
        return Err(format!("must be between 1 and {MAX_PIXELS}"));
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["sp108e-table"]).unwrap();
        assert!(!cli.server);
        assert_eq!(cli.link_config().address(), "192.168.178.83:8189");
        assert_eq!(cli.link_config().timing, LinkTiming::default());
        assert_eq!(cli.colormap, None);
        assert_eq!(cli.reconnect_interval(), Some(Duration::from_secs(300)));
        assert_eq!(cli.listen.port(), 8080);
    }

    #[test]
    fn bare_colormap_flag_uses_default_split() {
        let cli = Cli::try_parse_from(["sp108e-table", "--colormap"]).unwrap();
        assert_eq!(cli.colormap.as_deref(), Some(DEFAULT_COLORMAP));

        let cli = Cli::try_parse_from(["sp108e-table", "--colormap", "0,40,00,00,ff"]).unwrap();
        assert_eq!(cli.colormap.as_deref(), Some("0,40,00,00,ff"));
    }

    #[test]
    fn table_colors_need_all_four_edges() {
        let cli =
            Cli::try_parse_from(["sp108e-table", "--right", "red", "--left", "blue", "--top", "white"])
                .unwrap();
        assert_eq!(cli.table_colors(), None);

        let cli = Cli::try_parse_from([
            "sp108e-table", "--right", "red", "--left", "blue", "--top", "white", "--bottom", "#00ff00",
        ])
        .unwrap();
        let colors = cli.table_colors().unwrap();
        assert_eq!(colors.right, Color::new(255, 0, 0));
        assert_eq!(colors.bottom, Color::new(0, 255, 0));
    }

    #[test]
    fn rejects_unknown_palette_names_and_bad_brightness() {
        assert!(Cli::try_parse_from(["sp108e-table", "--right", "mauve"]).is_err());
        assert!(Cli::try_parse_from(["sp108e-table", "--brightness", "256"]).is_err());
    }

    #[test]
    fn pixels_are_bounded() {
        let cli = Cli::try_parse_from(["sp108e-table", "--pixels", "2048"]).unwrap();
        assert_eq!(cli.link_config().pixels, MAX_PIXELS);
        assert!(Cli::try_parse_from(["sp108e-table", "--pixels", "0"]).is_err());
        assert!(Cli::try_parse_from(["sp108e-table", "--pixels", "2049"]).is_err());
        assert!(Cli::try_parse_from(["sp108e-table", "--pixels", "18446744073709551615"]).is_err());
    }

    #[test]
    fn only_animations_and_the_server_keep_running() {
        let keeps_running = |args: &[&str]| {
            let mut argv = vec!["sp108e-table"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv).unwrap().keeps_running()
        };
        assert!(!keeps_running(&[]));
        assert!(!keeps_running(&["--brightness", "50"]));
        assert!(!keeps_running(&["--right", "red", "--left", "blue"]));
        assert!(keeps_running(&["--colormap"]));
        assert!(keeps_running(&["--right", "red", "--left", "blue", "--top", "white", "--bottom", "green"]));
        assert!(keeps_running(&["--server"]));
    }

    #[test]
    fn ack_timeout_and_reconnect_flags() {
        let cli =
            Cli::try_parse_from(["sp108e-table", "--ack-timeout-ms", "250", "--reconnect", "0"])
                .unwrap();
        assert_eq!(cli.link_config().timing.ack_timeout, Some(Duration::from_millis(250)));
        assert_eq!(cli.reconnect_interval(), None);
    }
}
