use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use fieldtrack::{
    alerts::{AlertPresentation, AlertSoundMode, DismissReason, MessageChannel, OverlaySurface, OverlayView},
    db::AlertNotification,
};

#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    async fn send(&self, channel_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        if self.fail {
            bail!("slack unreachable");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPresentation {
    shown: Mutex<Vec<AlertNotification>>,
}

impl RecordingPresentation {
    pub fn shown(&self) -> Vec<AlertNotification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertPresentation for RecordingPresentation {
    async fn show(&self, notification: AlertNotification) {
        self.shown.lock().unwrap().push(notification);
    }

    async fn dismiss(&self) {}
}

/// Overlay surface that only counts what it was asked to do.
#[derive(Default)]
pub struct NullOverlaySurface {
    renders: Mutex<usize>,
    clears: Mutex<Vec<DismissReason>>,
}

impl NullOverlaySurface {
    pub fn clears(&self) -> Vec<DismissReason> {
        self.clears.lock().unwrap().clone()
    }
}

impl OverlaySurface for NullOverlaySurface {
    fn render(&self, _view: &OverlayView) {
        *self.renders.lock().unwrap() += 1;
    }

    fn clear(&self, _notification_id: &str, reason: DismissReason) {
        self.clears.lock().unwrap().push(reason);
    }

    fn start_sound(&self, _mode: &AlertSoundMode) {}

    fn stop_sound(&self) {}
}
