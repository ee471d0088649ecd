use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scalestream_ingest::{Reading, StatsSnapshot};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Summary of one channel's snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: usize,
    pub len: usize,
    pub capacity: usize,
    pub latest: Option<Reading>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Up to the requested number of most recent readings, oldest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent: Vec<Reading>,
}

impl ChannelSummary {
    pub fn from_snapshot(
        channel: usize,
        capacity: usize,
        readings: &[Reading],
        points: usize,
    ) -> Self {
        let values = readings.iter().map(|r| r.value);
        let min = values.clone().reduce(f64::min);
        let max = values.clone().reduce(f64::max);
        let mean = if readings.is_empty() {
            None
        } else {
            Some(values.sum::<f64>() / readings.len() as f64)
        };
        let skip = readings.len().saturating_sub(points);

        Self {
            channel,
            len: readings.len(),
            capacity,
            latest: readings.last().copied(),
            min,
            max,
            mean,
            recent: readings[skip..].to_vec(),
        }
    }
}

pub fn summarize(
    snapshots: &[Vec<Reading>],
    capacity: usize,
    points: usize,
) -> Vec<ChannelSummary> {
    snapshots
        .iter()
        .enumerate()
        .map(|(channel, readings)| {
            ChannelSummary::from_snapshot(channel, capacity, readings, points)
        })
        .collect()
}

#[derive(Serialize)]
struct ChannelReport<'a> {
    running: bool,
    channels: &'a [ChannelSummary],
    stats: &'a StatsSnapshot,
}

pub fn print_channels(
    summaries: &[ChannelSummary],
    stats: &StatsSnapshot,
    running: bool,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ChannelReport {
                running,
                channels: summaries,
                stats,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "FILL", "LATEST", "T (ms)", "MIN", "MAX", "MEAN"]);
            for summary in summaries {
                table.add_row(vec![
                    summary.channel.to_string(),
                    format!("{}/{}", summary.len, summary.capacity),
                    fmt_value(summary.latest.map(|r| r.value)),
                    summary
                        .latest
                        .map(|r| r.timestamp_ms.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    fmt_value(summary.min),
                    fmt_value(summary.max),
                    fmt_value(summary.mean),
                ]);
            }
            println!("{table}");
            println!(
                "samples={} frames={} dropped={} ingest={}",
                stats.samples,
                stats.frames,
                stats.dropped(),
                if running { "running" } else { "stopped" }
            );
        }
        OutputFormat::Pretty => {
            for summary in summaries {
                println!(
                    "ch{} fill={}/{} latest={} min={} max={} mean={}",
                    summary.channel,
                    summary.len,
                    summary.capacity,
                    fmt_value(summary.latest.map(|r| r.value)),
                    fmt_value(summary.min),
                    fmt_value(summary.max),
                    fmt_value(summary.mean),
                );
                if !summary.recent.is_empty() {
                    let recent: Vec<String> = summary
                        .recent
                        .iter()
                        .map(|r| format!("{}@{}", fmt_value(Some(r.value)), r.timestamp_ms))
                        .collect();
                    println!("  {}", recent.join(" "));
                }
            }
        }
    }
}

pub fn print_stats(stats: &StatsSnapshot, format: OutputFormat) {
    match format {
        // Already part of the channel report.
        OutputFormat::Json => {}
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stat_rows(stats) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = stat_rows(stats)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("{}", line.join(" "));
        }
    }
}

#[derive(Serialize)]
pub struct SendReport<'a> {
    pub target: &'a str,
    pub encoding: &'a str,
    pub frames: usize,
    pub bytes: usize,
}

pub fn print_send_report(report: &SendReport<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TARGET", "ENCODING", "FRAMES", "BYTES"])
                .add_row(vec![
                    report.target.to_string(),
                    report.encoding.to_string(),
                    report.frames.to_string(),
                    report.bytes.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "sent {} {} frame(s), {} bytes, to {}",
                report.frames, report.encoding, report.bytes, report.target
            );
        }
    }
}

fn stat_rows(stats: &StatsSnapshot) -> [(&'static str, u64); 12] {
    [
        ("frames", stats.frames),
        ("samples", stats.samples),
        ("idle_reads", stats.idle_reads),
        ("truncated_frames", stats.truncated_frames),
        ("oversized_frames", stats.oversized_frames),
        ("unrecognized_tags", stats.unrecognized_tags),
        ("resync_bytes", stats.resync_bytes),
        ("decode_failures", stats.decode_failures),
        ("extraction_failures", stats.extraction_failures),
        ("readings_routed", stats.readings_routed),
        ("readings_ignored", stats.readings_ignored),
        ("readings_evicted", stats.readings_evicted),
    ]
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "-".to_string(),
    }
}
