use std::path::PathBuf;
use time::{Duration, OffsetDateTime};

use crate::types::push::VapidConfig;

#[derive(Clone)]
pub struct AppConfig {
    /// The instant the countdown targets.
    pub target: OffsetDateTime,
    /// Notification title and display name.
    pub app_name: String,
    /// Directory holding the subscription store file.
    pub data_dir: PathBuf,
    pub vapid: VapidConfig,
    /// Shared secret the external scheduler must present on each tick.
    pub cron_secret: String,
    /// Minimum time between two broadcasts of the same milestone key.
    pub suppress_window: Duration,
    /// Matching window around each milestone threshold; must exceed the
    /// scheduler cadence so a missed tick cannot skip a milestone.
    pub tolerance: Duration,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target: OffsetDateTime::now_utc() + Duration::days(30),
            app_name: "T-Minus".to_string(),
            data_dir: std::env::temp_dir(),
            vapid: VapidConfig {
                private_key: "test-private-key".to_string(),
                public_key: "test-public-key".to_string(),
                subject: "mailto:dev@example.com".to_string(),
            },
            cron_secret: "test-cron-secret".to_string(),
            suppress_window: Duration::hours(1),
            tolerance: Duration::minutes(1),
        }
    }
}
