use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::parser::{parse_row, results_reader};

/// One speed-test measurement: latency in milliseconds, download and upload
/// in Mbit/s.
///
/// Only built through [`parse_row`], so every stored value is finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    latency_ms: f64,
    download_mbps: f64,
    upload_mbps: f64,
}

impl Sample {
    pub(crate) fn new(latency_ms: f64, download_mbps: f64, upload_mbps: f64) -> Self {
        Self {
            latency_ms,
            download_mbps,
            upload_mbps,
        }
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn download_mbps(&self) -> f64 {
        self.download_mbps
    }

    pub fn upload_mbps(&self) -> f64 {
        self.upload_mbps
    }

    pub(crate) fn is_well_defined(&self) -> bool {
        self.latency_ms.is_finite() && self.download_mbps.is_finite() && self.upload_mbps.is_finite()
    }
}

/// Accepts rows during a single ingestion pass and produces a [`ResultSet`].
#[derive(Debug, Default)]
pub struct ResultSetBuilder {
    samples: Vec<Sample>,
}

impl ResultSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `latency;download;upload` row and keeps it if it is well formed.
    ///
    /// `None` is ignored. Rows without exactly three fields, or with a value
    /// that is not a finite number, are dropped without error.
    pub fn add_row<S: AsRef<str>>(&mut self, row: Option<&[S]>) {
        let Some(fields) = row else {
            return;
        };

        match parse_row(fields) {
            Some(sample) => self.samples.push(sample),
            None => debug!(fields = fields.len(), "Skipping malformed row"),
        }
    }

    /// Number of samples accepted so far.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn build(self) -> ResultSet {
        ResultSet {
            samples: self.samples,
        }
    }
}

/// Aggregated speed-test samples from one results file.
#[derive(Debug, Default)]
pub struct ResultSet {
    samples: Vec<Sample>,
}

impl ResultSet {
    pub fn builder() -> ResultSetBuilder {
        ResultSetBuilder::new()
    }

    /// Reads a semicolon-delimited results file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read. Malformed rows
    /// are skipped, not reported.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_source(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open results file {}", path.display()))?;

        let results = Self::from_reader(file)
            .with_context(|| format!("Failed to read results file {}", path.display()))?;

        info!(samples = results.number_of_results(), "Results loaded");
        Ok(results)
    }

    /// Reads semicolon-delimited rows from any reader. The reader is dropped
    /// before returning, on success or failure.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = results_reader(reader);
        let mut builder = Self::builder();

        for record in rdr.byte_records() {
            let record = record?;
            let fields: Vec<_> = record.iter().map(String::from_utf8_lossy).collect();
            builder.add_row(Some(fields.as_slice()));
        }

        Ok(builder.build())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn average_latency(&self) -> f64 {
        self.mean_of(Sample::latency_ms)
    }

    pub fn average_download_speed(&self) -> f64 {
        self.mean_of(Sample::download_mbps)
    }

    pub fn average_upload_speed(&self) -> f64 {
        self.mean_of(Sample::upload_mbps)
    }

    pub fn number_of_results(&self) -> usize {
        self.samples.len()
    }

    /// Whether there is anything worth publishing.
    pub fn is_valid(&self) -> bool {
        self.number_of_results() > 0
    }

    pub fn to_display(&self) -> String {
        format!(
            "download={:.2} Mbit/s upload={:.2} Mbit/s latency={:.1} ms",
            self.average_download_speed(),
            self.average_upload_speed(),
            self.average_latency()
        )
    }

    fn mean_of(&self, field: fn(&Sample) -> f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(field).sum::<f64>() / self.samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    fn from_lines(lines: &[&str]) -> ResultSet {
        let mut builder = ResultSet::builder();
        for line in lines {
            let fields: Vec<&str> = line.split(';').collect();
            builder.add_row(Some(fields.as_slice()));
        }
        builder.build()
    }

    #[test]
    fn test_empty_result_set() {
        let results = ResultSet::builder().build();

        assert_eq!(results.average_latency(), 0.0);
        assert_eq!(results.average_download_speed(), 0.0);
        assert_eq!(results.average_upload_speed(), 0.0);
        assert_eq!(results.number_of_results(), 0);
        assert!(!results.is_valid());
    }

    #[test]
    fn test_averages_and_display() {
        let results = from_lines(&["10;50;5", "20;40;4", "30;60;6"]);

        assert_eq!(results.number_of_results(), 3);
        assert!(results.is_valid());
        assert_eq!(results.average_latency(), 20.0);
        assert_eq!(results.average_download_speed(), 50.0);
        assert_eq!(results.average_upload_speed(), 5.0);
        assert_eq!(
            results.to_display(),
            "download=50.00 Mbit/s upload=5.00 Mbit/s latency=20.0 ms"
        );
    }

    #[test]
    fn test_display_rounds_each_field() {
        let results = from_lines(&["15.456;33.333;2.222"]);

        assert_eq!(
            results.to_display(),
            "download=33.33 Mbit/s upload=2.22 Mbit/s latency=15.5 ms"
        );
    }

    #[test]
    fn test_display_rounds_up() {
        let results = from_lines(&["9.96;99.997;0.005001"]);

        assert_eq!(
            results.to_display(),
            "download=100.00 Mbit/s upload=0.01 Mbit/s latency=10.0 ms"
        );
    }

    #[test]
    fn test_error_sentinel_counts_as_zero() {
        let results = from_lines(&["error;12.5;3.1"]);

        assert_eq!(results.samples(), &[Sample::new(0.0, 12.5, 3.1)]);
    }

    #[test]
    fn test_failed_measurements_pull_down_averages() {
        let results = from_lines(&["20;100;10", ";;", "---;---;---"]);

        assert_eq!(results.number_of_results(), 3);
        assert!((results.average_download_speed() - 100.0 / 3.0).abs() < 1e-9);
        assert!((results.average_latency() - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_row_is_ignored() {
        let mut builder = ResultSet::builder();
        builder.add_row(Some(&["1", "2", "3"][..]));
        builder.add_row::<&str>(None);

        assert_eq!(builder.len(), 1);
        assert_eq!(builder.build().number_of_results(), 1);
    }

    #[test]
    fn test_wrong_field_count_is_rejected() {
        let results = from_lines(&["10;50", "10;50;5;1", "10;50;5"]);

        assert_eq!(results.number_of_results(), 1);
        assert_eq!(results.average_download_speed(), 50.0);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let results = from_lines(&["nan;50;5", "10;inf;5", "10;50;5"]);

        assert_eq!(results.number_of_results(), 1);
    }

    #[test]
    fn test_from_reader_semicolon_rows() {
        let input = "10;50;5\n\n20;40;4\nbroken\n30;60;6\n";
        let results = ResultSet::from_reader(input.as_bytes()).unwrap();

        assert_eq!(results.number_of_results(), 3);
        assert_eq!(results.average_upload_speed(), 5.0);
    }

    #[test]
    fn test_from_reader_invalid_utf8_field_is_zero() {
        let input: &[u8] = b"10;\xff\xfe;5\n";
        let results = ResultSet::from_reader(input).unwrap();

        assert_eq!(results.samples(), &[Sample::new(10.0, 0.0, 5.0)]);
    }

    #[test]
    fn test_from_source_missing_file() {
        let path = std::env::temp_dir().join("speedtest_bot_test_missing.csv");
        let _ = std::fs::remove_file(&path);

        let err = ResultSet::from_source(&path).unwrap_err();
        let io_err = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io_err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_from_source_reads_file() {
        let path = std::env::temp_dir().join("speedtest_bot_test_read.csv");
        std::fs::write(&path, "10;50;5\n20;40;4\n").unwrap();

        let results = ResultSet::from_source(&path).unwrap();
        assert_eq!(results.number_of_results(), 2);
        assert_eq!(results.average_latency(), 15.0);

        std::fs::remove_file(&path).unwrap();
    }
}
