//! Output formatting for a day of speed-test results.
//!
//! Supports pretty-printing to the debug log and JSON on stdout.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::stats::ResultSet;

/// Serializable snapshot of a [`ResultSet`].
#[derive(Debug, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub samples: usize,
    pub average_latency_ms: f64,
    pub average_download_mbps: f64,
    pub average_upload_mbps: f64,
    pub display: String,
}

impl Summary {
    pub fn from_results(results: &ResultSet) -> Self {
        Summary {
            generated_at: Utc::now(),
            samples: results.number_of_results(),
            average_latency_ms: results.average_latency(),
            average_download_mbps: results.average_download_speed(),
            average_upload_mbps: results.average_upload_speed(),
            display: results.to_display(),
        }
    }
}

/// Logs the summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &Summary) {
    debug!("{:#?}", summary);
}

/// Prints the summary to stdout as pretty JSON.
pub fn print_json(summary: &Summary) -> Result<()> {
    println!("{}", to_json(summary)?);
    Ok(())
}

fn to_json(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
