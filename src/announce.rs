//! Composes the status update posted for a day of results.

use std::fmt;

use crate::stats::ResultSet;

/// Posts must be shorter than this many characters.
pub const MAX_POST_LEN: usize = 280;

/// Default percentage below the advertised speed that counts as slow.
pub const DEFAULT_SLOW_THRESHOLD_PC: f64 = 20.0;

/// What the ISP promises, used to decide whether to call them out.
#[derive(Debug, Clone)]
pub struct IspConfig {
    pub twitter_account: Option<String>,
    pub advertised_download_speed: Option<f64>,
    pub slow_threshold_percentage: f64,
}

impl Default for IspConfig {
    fn default() -> Self {
        Self {
            twitter_account: None,
            advertised_download_speed: None,
            slow_threshold_percentage: DEFAULT_SLOW_THRESHOLD_PC,
        }
    }
}

impl IspConfig {
    pub fn all_details_present(&self) -> bool {
        self.twitter_account.as_deref().is_some_and(|acc| !acc.is_empty())
            && self.advertised_download_speed.is_some_and(|speed| speed > 0.0)
    }

    /// Download speed under which the ISP gets mentioned, if configured.
    pub fn minimum_download_speed(&self) -> Option<f64> {
        if !self.all_details_present() {
            return None;
        }
        let advertised = self.advertised_download_speed?;
        Some(advertised - advertised * (self.slow_threshold_percentage / 100.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Announcement {
    /// Plain daily summary.
    Summary { display: String },
    /// Summary addressed to the ISP because download speed was too low.
    SlowService {
        account: String,
        advertised_download_speed: f64,
        display: String,
    },
}

impl Announcement {
    pub fn compose(isp: &IspConfig, results: &ResultSet) -> Self {
        let display = results.to_display();

        match (isp.minimum_download_speed(), &isp.twitter_account, isp.advertised_download_speed) {
            (Some(minimum), Some(account), Some(advertised))
                if results.average_download_speed() < minimum =>
            {
                Announcement::SlowService {
                    account: account.clone(),
                    advertised_download_speed: advertised,
                    display,
                }
            }
            _ => Announcement::Summary { display },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Announcement::Summary { .. } => "summary",
            Announcement::SlowService { .. } => "slow_service",
        }
    }

    /// Whether the rendered text fits in a single post.
    pub fn is_postable(&self) -> bool {
        self.to_string().chars().count() < MAX_POST_LEN
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Announcement::Summary { display } => write!(
                f,
                "My avg broadband speeds over the past 24 hrs are {display}. From SpeedTestBot"
            ),
            Announcement::SlowService {
                account,
                advertised_download_speed,
                display,
            } => {
                writeln!(
                    f,
                    "My @{account} average broadband speeds over the past 24 hrs are {display}."
                )?;
                writeln!(
                    f,
                    "I pay for a {} Mbit/s download speed - something isn't right here.",
                    advertised_download_speed.round() as i64
                )?;
                write!(f, "From SpeedTestBot")
            }
        }
    }
}
