//! Environment configuration.
//!
//! Read once at startup. A missing ops-channel credential is reported here
//! and nowhere else, so the tracking path never has to deal with it.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::geofence::GEOFENCE_RADIUS_KM;

pub const SLACK_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
pub const ALERT_CHANNEL_VAR: &str = "FIELDTRACK_ALERT_CHANNEL";
pub const GEOCODING_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";
pub const DB_PATH_VAR: &str = "FIELDTRACK_DB_PATH";
pub const INTERVAL_VAR: &str = "FIELDTRACK_TRACKING_INTERVAL_SECS";
pub const RADIUS_VAR: &str = "FIELDTRACK_GEOFENCE_RADIUS_KM";
pub const DEBUG_VAR: &str = "FIELDTRACK_DEBUG";

pub const DEFAULT_ALERT_CHANNEL: &str = "#test-alerts";
pub const DEFAULT_DB_PATH: &str = "fieldtrack.sqlite3";
pub const DEFAULT_TRACKING_INTERVAL: Duration = Duration::from_secs(30 * 60);
const DEBUG_TRACKING_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),
    #[error("{var} has invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub slack_bot_token: String,
    pub alert_channel: String,
    /// `None` disables reverse geocoding.
    pub geocoding_api_key: Option<String>,
    pub database_path: PathBuf,
    pub tracking_interval: Duration,
    pub geofence_radius_km: f64,
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let slack_bot_token =
            non_blank(SLACK_TOKEN_VAR).ok_or(ConfigError::MissingCredential(SLACK_TOKEN_VAR))?;

        let debug_mode = non_blank(DEBUG_VAR)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let tracking_interval = match non_blank(INTERVAL_VAR) {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidValue {
                        var: INTERVAL_VAR,
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None if debug_mode => DEBUG_TRACKING_INTERVAL,
            None => DEFAULT_TRACKING_INTERVAL,
        };

        let geofence_radius_km = match non_blank(RADIUS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|km| km.is_finite() && *km > 0.0)
                .ok_or(ConfigError::InvalidValue {
                    var: RADIUS_VAR,
                    value: raw.clone(),
                })?,
            None => GEOFENCE_RADIUS_KM,
        };

        Ok(Self {
            slack_bot_token,
            alert_channel: non_blank(ALERT_CHANNEL_VAR)
                .unwrap_or_else(|| DEFAULT_ALERT_CHANNEL.to_string()),
            geocoding_api_key: non_blank(GEOCODING_KEY_VAR),
            database_path: non_blank(DB_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            tracking_interval,
            geofence_radius_km,
        })
    }
}
