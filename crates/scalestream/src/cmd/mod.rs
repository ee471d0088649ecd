use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use scalestream_frame::{FrameConfig, Tag};
use scalestream_ingest::{IngestConfig, DEFAULT_CAPACITY, DEFAULT_CHANNEL_COUNT};
use scalestream_transport::DEFAULT_BAUD_RATE;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod monitor;
pub mod replay;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch a live serial feed and print per-channel summaries.
    Monitor(MonitorArgs),
    /// Run a capture file through the ingest pipeline.
    Replay(ReplayArgs),
    /// Encode sample frames and write them to a file or serial port.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Channel layout and decoder limits shared by `monitor` and `replay`.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Number of channels; readings past the last channel are ignored.
    #[arg(long, default_value_t = DEFAULT_CHANNEL_COUNT)]
    pub channels: usize,
    /// Readings kept per channel.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,
    /// Give up a resync after discarding this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_resync: Option<usize>,
    /// Drop frames whose declared payload exceeds this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

impl IngestArgs {
    pub fn to_config(&self) -> IngestConfig {
        let defaults = FrameConfig::default();
        IngestConfig {
            channel_count: self.channels,
            capacity: self.capacity,
            frame: FrameConfig {
                max_payload_size: self.max_payload.unwrap_or(defaults.max_payload_size),
                max_resync_bytes: self.max_resync,
            },
            ..IngestConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device path (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "SCALESTREAM_PORT")]
    pub port: String,
    /// Line rate in baud.
    #[arg(long, env = "SCALESTREAM_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    #[command(flatten)]
    pub ingest: IngestArgs,
    /// Time between summaries (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Per-read timeout on the serial port.
    #[arg(long, default_value = "1s")]
    pub read_timeout: String,
    /// Exit after printing N summaries.
    #[arg(long)]
    pub count: Option<usize>,
    /// Include the N most recent readings per channel.
    #[arg(long, default_value_t = 0)]
    pub points: usize,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file holding raw serial bytes.
    pub file: PathBuf,
    #[command(flatten)]
    pub ingest: IngestArgs,
    /// Include the N most recent readings per channel.
    #[arg(long, default_value_t = 0)]
    pub points: usize,
    /// Maximum time to wait for the whole file to be ingested.
    #[arg(long, default_value = "30s")]
    pub timeout: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Encoding {
    /// MessagePack, tag 'M'.
    Binary,
    /// JSON text, tag 'J'.
    Text,
}

impl Encoding {
    pub fn tag(self) -> Tag {
        match self {
            Encoding::Binary => Tag::Binary,
            Encoding::Text => Tag::Text,
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// File to write to, or serial device with --serial.
    pub path: PathBuf,
    /// JSON object to send as the payload.
    #[arg(long, conflicts_with = "weights")]
    pub json: Option<String>,
    /// Channel readings (comma-separated); sent as {"t": ..., "w": [...]}.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub weights: Option<Vec<f64>>,
    /// Timestamp for --weights frames. Default: current time per frame.
    #[arg(long, requires = "weights")]
    pub timestamp: Option<u64>,
    /// Payload encoding.
    #[arg(long, value_enum, default_value = "binary")]
    pub encoding: Encoding,
    /// Number of frames to write.
    #[arg(long, default_value_t = 1)]
    pub repeat: usize,
    /// Pause between frames (e.g. 100ms).
    #[arg(long)]
    pub interval: Option<String>,
    /// Text line written before each frame, like firmware debug output.
    #[arg(long, value_name = "TEXT")]
    pub noise: Option<String>,
    /// Append to the file instead of truncating it.
    #[arg(long, conflicts_with = "serial")]
    pub append: bool,
    /// Treat PATH as a serial device.
    #[arg(long)]
    pub serial: bool,
    /// Line rate in baud when --serial is set.
    #[arg(long, env = "SCALESTREAM_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
