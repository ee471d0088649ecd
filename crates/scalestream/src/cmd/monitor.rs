use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use scalestream_ingest::IngestHandle;

use crate::cmd::{parse_duration, MonitorArgs};
use crate::exit::{ingest_error, CliError, CliResult, SUCCESS};
use crate::output::{print_channels, summarize, OutputFormat};

/// Upper bound on how long a Ctrl-C waits for the next summary tick.
const POLL: Duration = Duration::from_millis(100);

#[cfg(feature = "serial")]
pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    use scalestream_transport::{SerialConfig, SerialTransport};

    use crate::exit::transport_error;

    let interval = parse_duration(&args.interval)?;
    let read_timeout = parse_duration(&args.read_timeout)?;
    let serial = SerialConfig {
        path: args.port.clone(),
        baud_rate: args.baud,
        timeout: read_timeout,
    };

    let transport =
        SerialTransport::open(&serial).map_err(|err| transport_error("open failed", err))?;
    let handle = scalestream_ingest::spawn(transport, args.ingest.to_config())
        .map_err(|err| ingest_error("ingest failed to start", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    watch(
        handle,
        &running,
        interval,
        read_timeout + Duration::from_secs(1),
        args.count,
        args.points,
        format,
    )
}

#[cfg(not(feature = "serial"))]
pub fn run(args: MonitorArgs, _format: OutputFormat) -> CliResult<i32> {
    parse_duration(&args.interval)?;
    Err(CliError::new(
        crate::exit::USAGE,
        format!(
            "cannot open {}: built without serial support (enable the `serial` feature)",
            args.port
        ),
    ))
}

/// Print a summary every `interval` until Ctrl-C, `count` summaries, or the
/// ingest thread ends. Then shut the thread down.
#[cfg_attr(not(feature = "serial"), allow(dead_code))]
pub fn watch(
    mut handle: IngestHandle,
    running: &AtomicBool,
    interval: Duration,
    shutdown_timeout: Duration,
    count: Option<usize>,
    points: usize,
    format: OutputFormat,
) -> CliResult<i32> {
    let channels = handle.channels();
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let next = Instant::now() + interval;
        while running.load(Ordering::SeqCst) && handle.is_running() && Instant::now() < next {
            thread::sleep(POLL.min(interval));
        }

        let alive = handle.is_running();
        let summaries = summarize(&channels.snapshot_all(), channels.capacity(), points);
        print_channels(&summaries, &handle.stats(), alive, format);
        printed = printed.saturating_add(1);

        if !alive {
            // The thread only ends on its own after a fatal transport error.
            return handle
                .join_timeout(shutdown_timeout)
                .map(|()| SUCCESS)
                .map_err(|err| ingest_error("ingest stopped", err));
        }
        if count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    handle.stop();
    handle
        .join_timeout(shutdown_timeout)
        .map_err(|err| ingest_error("shutdown failed", err))?;
    Ok(SUCCESS)
}

#[cfg_attr(not(feature = "serial"), allow(dead_code))]
fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
