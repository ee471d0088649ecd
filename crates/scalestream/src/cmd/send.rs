use std::fs::OpenOptions;
use std::io::Write;
use std::thread;

use scalestream_frame::{FrameWriter, Tag};
use scalestream_payload::{now_millis, PayloadCodec, Value, READINGS_KEY, TIMESTAMP_KEY};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_send_report, OutputFormat, SendReport};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = args.interval.as_deref().map(parse_duration).transpose()?;
    let source = PayloadSource::from_args(&args)?;
    check_noise(args.noise.as_deref())?;
    let tag = args.encoding.tag();
    let target = args.path.display().to_string();

    let mut writer = FrameWriter::new(open_sink(&args)?);
    let mut bytes = 0usize;

    for index in 0..args.repeat {
        if index > 0 {
            if let Some(interval) = interval {
                thread::sleep(interval);
            }
        }

        if let Some(noise) = &args.noise {
            bytes += writer
                .send_line(noise)
                .map_err(|err| frame_error("write failed", err))?;
        }

        let payload = PayloadCodec::encode(tag, &source.value())
            .map_err(|err| CliError::new(DATA_INVALID, format!("encode failed: {err}")))?;
        bytes += writer
            .send(tag, &payload)
            .map_err(|err| frame_error("write failed", err))?;
    }

    print_send_report(
        &SendReport {
            target: &target,
            encoding: tag.name(),
            frames: args.repeat,
            bytes,
        },
        format,
    );
    Ok(SUCCESS)
}

enum PayloadSource {
    Fixed(Value),
    Weights {
        readings: Vec<f64>,
        timestamp: Option<u64>,
    },
}

impl PayloadSource {
    fn from_args(args: &SendArgs) -> CliResult<Self> {
        if let Some(json) = &args.json {
            let value = PayloadCodec::new()
                .decode(Tag::Text, json.as_bytes())
                .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
            return Ok(Self::Fixed(value));
        }
        if let Some(readings) = &args.weights {
            return Ok(Self::Weights {
                readings: readings.clone(),
                timestamp: args.timestamp,
            });
        }
        Err(CliError::new(USAGE, "one of --json or --weights is required"))
    }

    /// The payload for the next frame. Weight frames without a fixed
    /// timestamp are stamped when built.
    fn value(&self) -> Value {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Weights {
                readings,
                timestamp,
            } => [
                (
                    TIMESTAMP_KEY.to_string(),
                    Value::from(timestamp.unwrap_or_else(now_millis)),
                ),
                (READINGS_KEY.to_string(), Value::from(readings.clone())),
            ]
            .into_iter()
            .collect(),
        }
    }
}

fn open_sink(args: &SendArgs) -> CliResult<Box<dyn Write>> {
    if args.serial {
        return open_serial(args);
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(args.append)
        .truncate(!args.append)
        .open(&args.path)
        .map_err(|err| io_error(&format!("failed opening {}", args.path.display()), err))?;
    Ok(Box::new(file))
}

#[cfg(feature = "serial")]
fn open_serial(args: &SendArgs) -> CliResult<Box<dyn Write>> {
    use scalestream_transport::{SerialConfig, DEFAULT_TIMEOUT};

    let config = SerialConfig {
        path: args.path.to_string_lossy().into_owned(),
        baud_rate: args.baud,
        timeout: DEFAULT_TIMEOUT,
    };
    let port = config
        .open_port()
        .map_err(|err| crate::exit::transport_error("open failed", err))?;
    Ok(Box::new(port))
}

#[cfg(not(feature = "serial"))]
fn open_serial(args: &SendArgs) -> CliResult<Box<dyn Write>> {
    Err(CliError::new(
        USAGE,
        format!(
            "cannot open {}: built without serial support (enable the `serial` feature)",
            args.path.display()
        ),
    ))
}

fn check_noise(noise: Option<&str>) -> CliResult<()> {
    match noise {
        Some(text) if text.contains('\n') => {
            Err(CliError::new(USAGE, "--noise must be a single line"))
        }
        _ => Ok(()),
    }
}
