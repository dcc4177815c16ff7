//! Reference in-app alert: a modal with a countdown that closes itself.
//!
//! Rendering and audio are delegated to an [`OverlaySurface`]; this type owns
//! the lifecycle. The modal cannot be dismissed from the backdrop, shows a
//! pulsing warning icon, plays the configured sound until it closes or the
//! sound ceiling passes, and closes through the same path whether the user
//! dismissed it or the countdown ran out.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{db::AlertNotification, utils::sync::lock};

use super::presentation::{AlertPresentation, AlertSoundMode};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

pub const COUNTDOWN_SECS: u32 = 30;
pub const SOUND_CEILING: Duration = Duration::from_secs(30);
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub notification_id: String,
    pub title: String,
    pub body: String,
    pub seconds_remaining: u32,
    pub dismiss_on_backdrop: bool,
    pub pulsing_icon: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DismissReason {
    Manual,
    Timeout,
    Replaced,
}

/// UI side of the overlay. Calls arrive from the countdown task as well as
/// from `show`/`dismiss`, so implementations must be cheap and non-blocking.
pub trait OverlaySurface: Send + Sync {
    fn render(&self, view: &OverlayView);
    fn clear(&self, notification_id: &str, reason: DismissReason);
    fn start_sound(&self, mode: &AlertSoundMode);
    fn stop_sound(&self);
}

struct ActiveAlert {
    generation: u64,
    view: OverlayView,
    sound_playing: bool,
    cancel: CancellationToken,
}

#[derive(Default)]
struct OverlayState {
    generation: u64,
    active: Option<ActiveAlert>,
}

struct Shared {
    surface: Arc<dyn OverlaySurface>,
    sound_mode: Mutex<AlertSoundMode>,
    countdown_secs: u32,
    sound_ceiling: Duration,
    state: Mutex<OverlayState>,
}

impl Shared {
    fn close(&self, generation: Option<u64>, reason: DismissReason) {
        let mut state = lock(&self.state);
        let matches = match (&state.active, generation) {
            (Some(active), Some(expected)) => active.generation == expected,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !matches {
            return;
        }
        if let Some(active) = state.active.take() {
            self.tear_down(active, reason);
        }
    }

    fn tear_down(&self, active: ActiveAlert, reason: DismissReason) {
        active.cancel.cancel();
        if active.sound_playing {
            self.surface.stop_sound();
        }
        log_debug!("alert {} closed: {reason:?}", active.view.notification_id);
        self.surface.clear(&active.view.notification_id, reason);
    }

    /// Returns false once the countdown for `generation` is over.
    fn tick(&self, generation: u64, elapsed_secs: u32) -> bool {
        let mut state = lock(&self.state);
        let Some(active) = state.active.as_mut().filter(|a| a.generation == generation) else {
            return false;
        };

        if active.sound_playing && Duration::from_secs(u64::from(elapsed_secs)) >= self.sound_ceiling {
            self.surface.stop_sound();
            active.sound_playing = false;
        }

        let remaining = self.countdown_secs.saturating_sub(elapsed_secs);
        if remaining == 0 {
            drop(state);
            self.close(Some(generation), DismissReason::Timeout);
            return false;
        }

        active.view.seconds_remaining = remaining;
        self.surface.render(&active.view);
        true
    }
}

#[derive(Clone)]
pub struct AlertOverlay {
    shared: Arc<Shared>,
}

impl AlertOverlay {
    pub fn new(surface: Arc<dyn OverlaySurface>, sound_mode: AlertSoundMode) -> Self {
        Self::with_timing(surface, sound_mode, COUNTDOWN_SECS, SOUND_CEILING)
    }

    pub fn with_timing(
        surface: Arc<dyn OverlaySurface>,
        sound_mode: AlertSoundMode,
        countdown_secs: u32,
        sound_ceiling: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                surface,
                sound_mode: Mutex::new(sound_mode),
                countdown_secs: countdown_secs.max(1),
                sound_ceiling,
                state: Mutex::new(OverlayState::default()),
            }),
        }
    }

    /// Applies from the next alert on.
    pub fn set_sound_mode(&self, mode: AlertSoundMode) {
        *lock(&self.shared.sound_mode) = mode;
    }

    pub fn sound_mode(&self) -> AlertSoundMode {
        lock(&self.shared.sound_mode).clone()
    }

    pub fn current(&self) -> Option<OverlayView> {
        lock(&self.shared.state)
            .active
            .as_ref()
            .map(|active| active.view.clone())
    }

    fn open(&self, notification: AlertNotification) {
        let shared = &self.shared;
        let sound_mode = self.sound_mode();
        let cancel = CancellationToken::new();

        let generation = {
            let mut state = lock(&shared.state);
            if let Some(previous) = state.active.take() {
                shared.tear_down(previous, DismissReason::Replaced);
            }
            state.generation += 1;

            let view = OverlayView {
                notification_id: notification.id.clone(),
                title: display_title(&notification.title),
                body: notification.body.clone(),
                seconds_remaining: shared.countdown_secs,
                dismiss_on_backdrop: false,
                pulsing_icon: true,
            };
            shared.surface.render(&view);

            let sound_playing = sound_mode.is_audible() && !shared.sound_ceiling.is_zero();
            if sound_playing {
                shared.surface.start_sound(&sound_mode);
            }

            state.active = Some(ActiveAlert {
                generation: state.generation,
                view,
                sound_playing,
                cancel: cancel.clone(),
            });
            state.generation
        };

        tokio::spawn(run_countdown(self.shared.clone(), generation, cancel));
    }
}

#[async_trait]
impl AlertPresentation for AlertOverlay {
    async fn show(&self, notification: AlertNotification) {
        self.open(notification);
    }

    async fn dismiss(&self) {
        self.shared.close(None, DismissReason::Manual);
    }
}

async fn run_countdown(shared: Arc<Shared>, generation: u64, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut elapsed_secs = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                elapsed_secs += 1;
                if !shared.tick(generation, elapsed_secs) {
                    break;
                }
            }
        }
    }
}

/// The modal draws its own warning icon.
fn display_title(title: &str) -> String {
    title.trim_start_matches('🚨').trim().to_string()
}
