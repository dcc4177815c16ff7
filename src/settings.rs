use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::{
    alerts::AlertSoundMode,
    playback::PlaybackSpeed,
    utils::sync::{read, write},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub alert_sound: AlertSoundMode,
    pub playback_speed: PlaybackSpeed,
}

/// User preferences persisted as pretty JSON. A missing or unreadable file
/// means defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> UserSettings {
        read(&self.data).clone()
    }

    pub fn alert_sound(&self) -> AlertSoundMode {
        read(&self.data).alert_sound.clone()
    }

    pub fn update_alert_sound(&self, mode: AlertSoundMode) -> Result<()> {
        let mut guard = write(&self.data);
        guard.alert_sound = mode;
        self.persist(&guard)
    }

    pub fn playback_speed(&self) -> PlaybackSpeed {
        read(&self.data).playback_speed
    }

    pub fn update_playback_speed(&self, speed: PlaybackSpeed) -> Result<()> {
        let mut guard = write(&self.data);
        guard.playback_speed = speed;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        *write(&self.data) = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
