//! Result output and summary rendering.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::OutputFormat;
use crate::metrics::{MetricsCollector, RunSummary};
use crate::probe::{ProbeOutcome, ProbeResult};

/// Consumes completed probe results, exactly once each, in completion
/// order.
pub trait ResultSink {
    fn report(&mut self, result: ProbeResult) -> anyhow::Result<()>;
}

enum Target {
    Stdout(io::Stdout),
    File(BufWriter<File>),
}

impl Target {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Target::Stdout(out) => {
                writeln!(out, "{}", line)?;
                out.flush()
            }
            Target::File(writer) => {
                writeln!(writer, "{}", line)?;
                writer.flush()
            }
        }
    }
}

/// Writes one line per probe result to stdout or a file, collecting latency
/// statistics along the way. Owns its output handle; buffered and flushed
/// per line.
pub struct LineSink {
    target: Target,
    format: OutputFormat,
    csv_separator: String,
    metrics: MetricsCollector,
    progress: Option<ProgressBar>,
}

impl LineSink {
    pub fn to_stdout(format: OutputFormat, csv_separator: &str) -> Self {
        Self {
            target: Target::Stdout(io::stdout()),
            format,
            csv_separator: csv_separator.to_string(),
            metrics: MetricsCollector::new(),
            progress: None,
        }
    }

    /// Open an output file; failing here is a fatal setup error reported
    /// before any dispatch.
    pub fn to_file(
        path: impl AsRef<Path>,
        format: OutputFormat,
        csv_separator: &str,
    ) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            target: Target::File(BufWriter::new(file)),
            format,
            csv_separator: csv_separator.to_string(),
            metrics: MetricsCollector::new(),
            progress: None,
        })
    }

    /// Attach a progress bar advanced once per reported result.
    pub fn with_progress(mut self, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:60}] {percent}% {pos}/{len}")
                .expect("Invalid progress bar template")
                .progress_chars("=-"),
        );
        self.progress = Some(bar);
        self
    }

    fn format_line(&self, result: &ProbeResult) -> String {
        match self.format {
            OutputFormat::Bboxes => result.bbox.to_wms_string(),
            OutputFormat::Csv => {
                let sep = &self.csv_separator;
                let mut line = format!("{}{sep}{}{sep}{}", result.label, result.layer, result.url);
                match &result.outcome {
                    ProbeOutcome::Success {
                        status,
                        content_type,
                        elapsed,
                    } => {
                        line.push_str(&format!(
                            "{sep}{}{sep}{}{sep}{}",
                            status,
                            content_type,
                            elapsed.as_secs_f64()
                        ));
                    }
                    ProbeOutcome::Failed { reason } => {
                        line.push_str(&format!("{sep}{sep}{sep}{}", reason));
                    }
                    ProbeOutcome::DryRun => {}
                }
                line
            }
            OutputFormat::Plain => match &result.outcome {
                ProbeOutcome::Success { elapsed, .. } => format!(
                    "{}({} + {}): {} sec",
                    result.label,
                    result.layer,
                    result.bbox,
                    elapsed.as_secs_f64()
                ),
                ProbeOutcome::DryRun => {
                    format!("{}({} + {})", result.label, result.layer, result.bbox)
                }
                ProbeOutcome::Failed { reason } => format!(
                    "{}({} + {}): failed: {}",
                    result.label, result.layer, result.bbox, reason
                ),
            },
        }
    }

    /// Finish the progress bar and produce the run summary.
    pub fn finish(self, layers: Vec<String>, concurrency: u32) -> RunSummary {
        if let Some(bar) = &self.progress {
            bar.finish();
        }
        self.metrics.summary(layers, concurrency)
    }
}

impl ResultSink for LineSink {
    fn report(&mut self, result: ProbeResult) -> anyhow::Result<()> {
        let line = self.format_line(&result);
        self.target.write_line(&line)?;
        self.metrics.record(&result);
        if let Some(bar) = &self.progress {
            bar.inc(1);
        }
        Ok(())
    }
}

/// Formats a run summary for the console.
pub struct SummaryReport;

impl SummaryReport {
    pub fn format_table(summary: &RunSummary) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![format!("Probe run: {}", summary.layers.join(", "))]);

        table.add_row(vec!["Probes:", &format!("{}", summary.total_probes)]);
        table.add_row(vec!["Succeeded:", &format!("{}", summary.succeeded)]);
        table.add_row(vec!["Failed:", &format!("{}", summary.failed)]);
        table.add_row(vec!["Concurrency:", &format!("{}", summary.concurrency)]);

        table.add_row(vec!["", ""]);
        table.add_row(vec!["Latency (ms)", "p50 / p90 / p99 / max"]);
        table.add_row(vec![
            "",
            &format!(
                "{:.1} / {:.1} / {:.1} / {:.1}",
                summary.latency_p50_ms,
                summary.latency_p90_ms,
                summary.latency_p99_ms,
                summary.latency_max_ms
            ),
        ]);

        table.to_string()
    }

    pub fn format_json(summary: &RunSummary) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wms_common::BoundingBox;

    fn success_result() -> ProbeResult {
        ProbeResult {
            label: "RandomBbox",
            layer: "osm:roads".to_string(),
            url: "http://localhost:7600/wms?layers=osm:roads".to_string(),
            bbox: BoundingBox::new(-10.0, -5.0, 10.0, 5.0),
            outcome: ProbeOutcome::Success {
                status: 200,
                content_type: "image/png".to_string(),
                elapsed: Duration::from_millis(1500),
            },
        }
    }

    #[test]
    fn test_csv_line() {
        let sink = LineSink::to_stdout(OutputFormat::Csv, ";");
        assert_eq!(
            sink.format_line(&success_result()),
            "RandomBbox;osm:roads;http://localhost:7600/wms?layers=osm:roads;200;image/png;1.5"
        );
    }

    #[test]
    fn test_csv_dry_run_line_has_no_response_columns() {
        let sink = LineSink::to_stdout(OutputFormat::Csv, ",");
        let mut result = success_result();
        result.outcome = ProbeOutcome::DryRun;
        assert_eq!(
            sink.format_line(&result),
            "RandomBbox,osm:roads,http://localhost:7600/wms?layers=osm:roads"
        );
    }

    #[test]
    fn test_bboxes_line() {
        let sink = LineSink::to_stdout(OutputFormat::Bboxes, ";");
        assert_eq!(sink.format_line(&success_result()), "-10,-5,10,5");
    }

    #[test]
    fn test_plain_line() {
        let sink = LineSink::to_stdout(OutputFormat::Plain, ";");
        assert_eq!(
            sink.format_line(&success_result()),
            "RandomBbox(osm:roads + -10,-5,10,5): 1.5 sec"
        );
    }

    #[test]
    fn test_file_sink_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut sink = LineSink::to_file(&path, OutputFormat::Csv, ";").unwrap();
        sink.report(success_result()).unwrap();
        sink.report(success_result()).unwrap();
        let summary = sink.finish(vec!["osm:roads".to_string()], 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(summary.total_probes, 2);
        assert_eq!(summary.succeeded, 2);
    }

    #[test]
    fn test_missing_output_directory_is_a_setup_error() {
        assert!(LineSink::to_file("/no/such/dir/results.csv", OutputFormat::Csv, ";").is_err());
    }
}
