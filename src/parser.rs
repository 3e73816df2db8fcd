//! Parser for the semicolon-delimited speed-test results log.
//!
//! Each line is `latency;download;upload`. A measurement that failed is
//! written as a placeholder (an empty field, dashes, an error word) and is
//! read back as `0.0` so that outages still weigh on the averages.

use std::io::Read;

use csv::{Reader, ReaderBuilder};

use crate::stats::Sample;

/// Fields per row: latency, download, upload.
pub const FIELDS_PER_ROW: usize = 3;

/// Converts a single field to a number, falling back to `0.0`.
///
/// This never fails. Anything that does not parse as a float is a failed
/// measurement and counts as zero throughput and zero latency.
pub fn parse_value(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => 0.0,
    }
}

/// Builds a [`Sample`] from one row of fields.
///
/// Returns `None` when the row does not have exactly three fields or when a
/// field parses to something other than a finite number (`nan`, `inf`).
pub fn parse_row<S: AsRef<str>>(fields: &[S]) -> Option<Sample> {
    let [latency, download, upload] = fields else {
        return None;
    };

    let sample = Sample::new(
        parse_value(latency.as_ref()),
        parse_value(download.as_ref()),
        parse_value(upload.as_ref()),
    );

    sample.is_well_defined().then_some(sample)
}

/// Returns a CSV reader configured for the results log: `;` separated, no
/// header row, rows of any length.
pub fn results_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}
