use std::fs::File;
use std::io::BufReader;

use scalestream_ingest::IngestError;
use scalestream_transport::{ReadTransport, TransportError};
use tracing::info;

use crate::cmd::{parse_duration, ReplayArgs};
use crate::exit::{ingest_error, io_error, CliResult, SUCCESS};
use crate::output::{print_channels, print_stats, summarize, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("failed opening {}", args.file.display()), err))?;
    let transport = ReadTransport::new(BufReader::new(file)).closed_on_eof();

    let mut handle = scalestream_ingest::spawn(transport, args.ingest.to_config())
        .map_err(|err| ingest_error("ingest failed to start", err))?;
    let channels = handle.channels();

    match handle.join_timeout(timeout) {
        // End of file is how a replay finishes.
        Ok(()) | Err(IngestError::Transport(TransportError::Closed)) => {}
        Err(err) => return Err(ingest_error("replay failed", err)),
    }

    let stats = handle.stats();
    info!(
        file = %args.file.display(),
        samples = stats.samples,
        dropped = stats.dropped(),
        "replay complete"
    );

    let summaries = summarize(&channels.snapshot_all(), channels.capacity(), args.points);
    print_channels(&summaries, &stats, false, format);
    print_stats(&stats, format);
    Ok(SUCCESS)
}
