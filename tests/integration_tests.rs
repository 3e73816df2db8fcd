use speedtest_bot::announce::{Announcement, IspConfig};
use speedtest_bot::output::Summary;
use speedtest_bot::stats::ResultSet;

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/daily_results.csv");
    let results = ResultSet::from_reader(&bytes[..]).expect("Failed to read results");

    // The two-field row is dropped; the outage rows count as zeros.
    assert_eq!(results.number_of_results(), 5);
    assert!(results.is_valid());
    assert_eq!(
        results.to_display(),
        "download=32.50 Mbit/s upload=3.62 Mbit/s latency=6.9 ms"
    );

    let summary = Summary::from_results(&results);
    assert_eq!(summary.samples, 5);

    let isp = IspConfig {
        twitter_account: Some("myisp".to_string()),
        advertised_download_speed: Some(60.0),
        ..Default::default()
    };
    let announcement = Announcement::compose(&isp, &results);
    assert_eq!(announcement.kind(), "slow_service");
    assert!(announcement.is_postable());
}

#[test]
fn test_quoted_sentinel_is_zero() {
    let results = ResultSet::from_reader("\"error\";12.5;3.1\n".as_bytes()).unwrap();

    let sample = results.samples()[0];
    assert_eq!(sample.latency_ms(), 0.0);
    assert_eq!(sample.download_mbps(), 12.5);
    assert_eq!(sample.upload_mbps(), 3.1);
}

#[test]
fn test_missing_source_is_an_error() {
    let path = std::env::temp_dir().join("speedtest_bot_it_does_not_exist.csv");
    let _ = std::fs::remove_file(&path);

    assert!(ResultSet::from_source(&path).is_err());
}
