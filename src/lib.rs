//! Location tracking, geofence alerting and path playback for field workers.
//!
//! The host app supplies the platform pieces (device location, alert overlay
//! UI, map surface); [`FieldOps::bootstrap`] wires them to the store, the ops
//! channel and the tracking loop.

pub mod alerts;
pub mod config;
pub mod db;
pub mod geofence;
pub mod geometry;
pub mod playback;
pub mod sensing;
pub mod settings;
pub mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use alerts::{AlertDispatcher, AlertOverlay, AlertSoundMode, OverlaySurface, SlackChannel};
use config::TrackerConfig;
use db::{Database, LivePosition, LocationSample, RecordStore};
use geofence::GeofenceEvaluator;
use playback::{load_session_route, MapSurface, PathPlayer, PlaybackError, PlaybackSpeed};
use sensing::{
    AreaNamer, GoogleGeocoder, LocationProvider, LocationSampler, TrackingController, TrackingDeps,
};
use settings::SettingsStore;

/// Installs the `env_logger` backend. `RUST_LOG` wins; otherwise `info`.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Platform capabilities the host app provides.
pub struct Platform {
    pub location: Arc<dyn LocationProvider>,
    pub overlay_surface: Arc<dyn OverlaySurface>,
    pub settings_path: PathBuf,
}

pub struct FieldOps {
    config: TrackerConfig,
    db: Database,
    settings: SettingsStore,
    overlay: AlertOverlay,
    dispatcher: Arc<AlertDispatcher>,
    tracking: TrackingController,
}

impl FieldOps {
    /// Reads configuration from the environment. A missing Slack token stops
    /// startup here.
    pub fn from_env(platform: Platform) -> Result<Self> {
        let config = TrackerConfig::from_env().context("invalid tracker configuration")?;
        Self::bootstrap(config, platform)
    }

    pub fn bootstrap(config: TrackerConfig, platform: Platform) -> Result<Self> {
        let db = Database::new(config.database_path.clone())?;
        let store: Arc<dyn RecordStore> = Arc::new(db.clone());

        let settings = SettingsStore::new(platform.settings_path)?;
        let overlay = AlertOverlay::new(platform.overlay_surface, settings.alert_sound());

        let channel = SlackChannel::new(config.slack_bot_token.clone())?;

        let namer = match &config.geocoding_api_key {
            Some(key) => AreaNamer::new(Arc::new(GoogleGeocoder::new(key.clone()))),
            None => {
                warn!("no geocoding key configured; area labels will be unknown");
                AreaNamer::disabled()
            }
        };

        let evaluator = Arc::new(GeofenceEvaluator::with_radius(
            store.clone(),
            config.geofence_radius_km,
        ));
        let dispatcher = Arc::new(
            AlertDispatcher::new(
                store.clone(),
                Arc::new(channel),
                config.alert_channel.clone(),
                Arc::new(overlay.clone()),
            )
            .with_radius(config.geofence_radius_km),
        );

        let deps = TrackingDeps::new(
            LocationSampler::new(platform.location),
            Arc::new(namer),
            store,
            evaluator,
            dispatcher.clone(),
        );
        let tracking = TrackingController::new(deps, config.tracking_interval);

        info!(
            "field tracking ready: interval {:?}, radius {} km, alerts to {}",
            config.tracking_interval, config.geofence_radius_km, config.alert_channel
        );

        Ok(Self {
            config,
            db,
            settings,
            overlay,
            dispatcher,
            tracking,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn tracking(&self) -> &TrackingController {
        &self.tracking
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn overlay(&self) -> &AlertOverlay {
        &self.overlay
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn set_alert_sound(&self, mode: AlertSoundMode) -> Result<()> {
        self.settings.update_alert_sound(mode.clone())?;
        self.overlay.set_sound_mode(mode);
        Ok(())
    }

    pub fn set_playback_speed(&self, speed: PlaybackSpeed) -> Result<()> {
        self.settings.update_playback_speed(speed)
    }

    pub async fn session_route(&self, session_id: &str) -> Result<Vec<LocationSample>> {
        load_session_route(&self.db, session_id, Utc::now()).await
    }

    /// Signed-in workers' latest positions for the live map. Covers sessions
    /// opened since the start of the current UTC day.
    pub async fn live_positions(&self) -> Result<Vec<LivePosition>> {
        let start_of_day = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .context("invalid start of day")?
            .and_utc();
        self.db.latest_locations_for_active_workers(start_of_day).await
    }

    /// A player on `surface` at the saved playback speed.
    pub async fn attach_player(&self, surface: Arc<dyn MapSurface>) -> Result<PathPlayer, PlaybackError> {
        let player = PathPlayer::attach(surface).await?;
        player.set_speed(self.settings.playback_speed());
        Ok(player)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.tracking.stop().await
    }
}
