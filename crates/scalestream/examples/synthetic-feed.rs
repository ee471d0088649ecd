//! Synthetic feed example: drives the ingest thread from an in-memory
//! byte stream that mixes MessagePack frames, JSON frames and debug text.
//!
//! Run with:
//!   cargo run --example synthetic-feed

use std::thread;
use std::time::{Duration, Instant};

use scalestream::frame::{FrameWriter, Tag};
use scalestream::ingest::{spawn, IngestConfig};
use scalestream::payload::{PayloadCodec, Value};
use scalestream::transport::{ScriptedTransport, Step};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = FrameWriter::new(Vec::new());
    for t in 0..20u64 {
        if t % 5 == 0 {
            // Firmware prints plain text lines between frames.
            writer.send_line("Pong Activated!")?;
        }
        let readings: Vec<f64> = (0..4).map(|ch| (t * 10 + ch) as f64).collect();
        let sample: Value = [
            ("t".to_string(), Value::from(1_000 + t)),
            ("w".to_string(), Value::from(readings)),
        ]
        .into_iter()
        .collect();
        let tag = if t % 2 == 0 { Tag::Binary } else { Tag::Text };
        writer.send(tag, &PayloadCodec::encode(tag, &sample)?)?;
    }

    // Deliver the stream in uneven chunks, like a serial port would.
    let bytes = writer.into_inner();
    let steps: Vec<Step> = bytes.chunks(7).map(|c| Step::Data(c.to_vec())).collect();
    let transport = ScriptedTransport::new(steps).with_idle_delay(Duration::from_millis(10));

    let config = IngestConfig {
        capacity: 8,
        ..IngestConfig::default()
    };
    let handle = spawn(transport, config)?;
    let channels = handle.channels();

    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.stats().samples < 20 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    for (index, readings) in channels.snapshot_all().iter().enumerate() {
        let values: Vec<String> = readings.iter().map(|r| r.value.to_string()).collect();
        eprintln!("[ch{index}] {}", values.join(" "));
    }
    eprintln!("[stats] {:?}", handle.stats());

    handle.shutdown(Duration::from_secs(2))?;
    Ok(())
}
