use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::AlertNotification;

/// Whatever raises the in-app alert. The core only ever shows and dismisses;
/// sound, layout and countdown belong to the implementation.
#[async_trait]
pub trait AlertPresentation: Send + Sync {
    async fn show(&self, notification: AlertNotification);
    async fn dismiss(&self);
}

/// Audible cue played while an alert is on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "path", rename_all = "camelCase")]
pub enum AlertSoundMode {
    Siren,
    Clip(PathBuf),
    Mute,
}

impl Default for AlertSoundMode {
    fn default() -> Self {
        AlertSoundMode::Siren
    }
}

impl AlertSoundMode {
    /// Maps the settings-screen choices (`siren`, `alert1`, `alert2`, `mute`).
    pub fn from_preset(preset: &str) -> Option<Self> {
        match preset {
            "siren" => Some(AlertSoundMode::Siren),
            "alert1" => Some(AlertSoundMode::Clip(PathBuf::from("sounds/alert-sound-1.mp3"))),
            "alert2" => Some(AlertSoundMode::Clip(PathBuf::from("sounds/alert-sound-2.mp3"))),
            "mute" => Some(AlertSoundMode::Mute),
            _ => None,
        }
    }

    pub fn is_audible(&self) -> bool {
        !matches!(self, AlertSoundMode::Mute)
    }
}

/// Two-tone siren: the tone flips every `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirenPattern {
    pub high_hz: f32,
    pub low_hz: f32,
    pub step: Duration,
}

impl Default for SirenPattern {
    fn default() -> Self {
        Self {
            high_hz: 800.0,
            low_hz: 600.0,
            step: Duration::from_millis(500),
        }
    }
}

impl SirenPattern {
    pub fn frequency_at(&self, elapsed: Duration) -> f32 {
        let step_ms = self.step.as_millis().max(1);
        if (elapsed.as_millis() / step_ms) % 2 == 0 {
            self.high_hz
        } else {
            self.low_hz
        }
    }
}
