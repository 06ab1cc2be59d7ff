//! Report presentation and output formatting

use crate::config::ReportFormat;
use crate::errors::Result;
use crate::metrics::aggregate::Report;
use crate::metrics::result::StatusOutcome;

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

/// Everything a presenter needs once a run has finished
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: String,
    pub requested: u64,
    pub concurrency: u32,
    pub report: Report,
    pub wall_time: Duration,
    pub interrupted: bool,
}

impl RunSummary {
    /// Completed attempts per second of wall-clock time
    pub fn requests_per_second(&self) -> f64 {
        let seconds = self.wall_time.as_secs_f64();
        if seconds > 0.0 {
            self.report.total_results() as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Renders a finished run
pub trait Presenter {
    fn present(&self, summary: &RunSummary, out: &mut dyn Write) -> Result<()>;
}

/// Pick the presenter matching the configured output format
pub fn presenter_for(format: ReportFormat) -> Box<dyn Presenter> {
    match format {
        ReportFormat::Text => Box::new(TextPresenter),
        ReportFormat::Json => Box::new(JsonPresenter),
    }
}

/// Human-readable report
pub struct TextPresenter;

impl TextPresenter {
    fn status_text(status_code: u16) -> &'static str {
        match status_code {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }

    fn write_latency(report: &Report, out: &mut dyn Write) -> std::io::Result<()> {
        let (Some(min), Some(mean), Some(max)) = (
            report.min_elapsed(),
            report.mean_elapsed(),
            report.max_elapsed(),
        ) else {
            return Ok(());
        };

        writeln!(out, "\n⏱️  Latency:")?;
        writeln!(out, "   Min:              {:.2}ms", millis(min))?;
        writeln!(out, "   Mean:             {:.2}ms", millis(mean))?;
        writeln!(out, "   Max:              {:.2}ms", millis(max))?;
        Ok(())
    }

    fn write_breakdown(report: &Report, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "\n📋 All HTTP Codes:")?;
        for (outcome, count) in report.histogram() {
            match outcome {
                StatusOutcome::Status(code) => writeln!(
                    out,
                    "   Quantity of {} ({}): {}",
                    code,
                    Self::status_text(*code),
                    count
                )?,
                StatusOutcome::TransportError => writeln!(out, "   Errors:           {}", count)?,
            }
        }
        Ok(())
    }
}

impl Presenter for TextPresenter {
    fn present(&self, summary: &RunSummary, out: &mut dyn Write) -> Result<()> {
        let report = &summary.report;

        writeln!(out, "\n📊 Volley Load Test Results").map_err(io_error)?;
        writeln!(
            out,
            "═══════════════════════════════════════════════════════════════"
        )
        .map_err(io_error)?;

        writeln!(
            out,
            "   Execution time in seconds: {:.3}",
            report.total_elapsed().as_secs_f64()
        )
        .map_err(io_error)?;
        writeln!(
            out,
            "   Wall clock time:  {:.3}s",
            summary.wall_time.as_secs_f64()
        )
        .map_err(io_error)?;
        writeln!(out, "   Total of requests: {}", summary.requested).map_err(io_error)?;
        writeln!(out, "   Total of http code 200: {}", report.status_count(200))
            .map_err(io_error)?;
        writeln!(out, "   Successful (2xx): {}", report.successes()).map_err(io_error)?;
        writeln!(out, "   Requests/sec:     {:.2}", summary.requests_per_second())
            .map_err(io_error)?;

        Self::write_latency(report, out).map_err(io_error)?;
        Self::write_breakdown(report, out).map_err(io_error)?;

        if summary.interrupted {
            writeln!(
                out,
                "\n⚠️  Run interrupted: {} of {} requests completed",
                report.total_results(),
                summary.requested
            )
            .map_err(io_error)?;
        }

        writeln!(
            out,
            "═══════════════════════════════════════════════════════════════"
        )
        .map_err(io_error)?;
        out.flush().map_err(io_error)
    }
}

/// Machine-readable report, one JSON document
pub struct JsonPresenter;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    requested: u64,
    concurrency: u32,
    completed: u64,
    interrupted: bool,
    status_codes: BTreeMap<u16, u64>,
    successes: u64,
    errors: u64,
    total_elapsed_secs: f64,
    wall_time_secs: f64,
    requests_per_second: f64,
    min_latency_ms: Option<f64>,
    mean_latency_ms: Option<f64>,
    max_latency_ms: Option<f64>,
}

impl<'a> From<&'a RunSummary> for JsonReport<'a> {
    fn from(summary: &'a RunSummary) -> Self {
        let report = &summary.report;
        let status_codes = report
            .histogram()
            .iter()
            .filter_map(|(outcome, count)| outcome.code().map(|code| (code, *count)))
            .collect();

        Self {
            target: &summary.target,
            requested: summary.requested,
            concurrency: summary.concurrency,
            completed: report.total_results(),
            interrupted: summary.interrupted,
            status_codes,
            successes: report.successes(),
            errors: report.errors(),
            total_elapsed_secs: report.total_elapsed().as_secs_f64(),
            wall_time_secs: summary.wall_time.as_secs_f64(),
            requests_per_second: summary.requests_per_second(),
            min_latency_ms: report.min_elapsed().map(millis),
            mean_latency_ms: report.mean_elapsed().map(millis),
            max_latency_ms: report.max_elapsed().map(millis),
        }
    }
}

impl Presenter for JsonPresenter {
    fn present(&self, summary: &RunSummary, out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, &JsonReport::from(summary))?;
        writeln!(out).map_err(io_error)?;
        out.flush().map_err(io_error)
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

fn io_error(e: std::io::Error) -> crate::errors::VolleyError {
    crate::errors::VolleyError::execution(format!("Failed to write report: {}", e))
}
