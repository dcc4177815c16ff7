use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{db::LocationSample, geometry::Coordinate, utils::sync::lock};

use super::{
    plan::{PlaybackError, PlaybackPlan, PlaybackSpeed},
    route::{RouteOverview, RoutePoint},
    surface::{MapSurface, MarkerId, MarkerSpec, MarkerStyle},
};

// Set to true to trace playback frames
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PlaybackStatus {
    Idle,
    #[serde(rename_all = "camelCase")]
    Playing {
        progress_percent: u8,
    },
    Completed,
}

struct Animation {
    cancel_token: CancellationToken,
    /// Held by a tick while it draws; `false` once the animation is halted.
    live: Arc<Mutex<bool>>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PlayerState {
    speed: PlaybackSpeed,
    route: Option<RouteOverview>,
    stop_markers: Vec<MarkerId>,
    mover: Option<MarkerId>,
    animation: Option<Animation>,
}

/// Draws a session's route on a map and replays it with a moving marker.
pub struct PathPlayer {
    surface: Arc<dyn MapSurface>,
    utc_offset: FixedOffset,
    state: Mutex<PlayerState>,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl PathPlayer {
    /// Waits for the surface once; every later call draws straight away.
    pub async fn attach(surface: Arc<dyn MapSurface>) -> Result<Self, PlaybackError> {
        surface
            .ready()
            .await
            .map_err(|err| PlaybackError::SurfaceUnavailable(format!("{err:#}")))?;

        let (status_tx, _) = watch::channel(PlaybackStatus::Idle);
        Ok(Self {
            surface,
            utc_offset: Utc.fix(),
            state: Mutex::new(PlayerState::default()),
            status_tx,
        })
    }

    /// Offset used for the stop time labels.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    pub fn speed(&self) -> PlaybackSpeed {
        lock(&self.state).speed
    }

    /// Takes effect on the next `start`; a running animation keeps its pace.
    pub fn set_speed(&self, speed: PlaybackSpeed) {
        lock(&self.state).speed = speed;
    }

    pub fn is_animating(&self) -> bool {
        lock(&self.state)
            .animation
            .as_ref()
            .is_some_and(|animation| !animation.handle.is_finished())
    }

    /// One numbered marker per sample, the connecting polyline, and a view
    /// fitted to all of it. Replaces whatever route was drawn before.
    pub fn render_route(&self, samples: &[LocationSample]) -> RouteOverview {
        let route = RouteOverview::from_samples(samples, self.utc_offset);
        let mut state = lock(&self.state);

        for marker in state.stop_markers.drain(..) {
            self.surface.remove_marker(marker);
        }

        state.stop_markers = route
            .points
            .iter()
            .map(|point| {
                self.surface.add_marker(&MarkerSpec {
                    position: point.coordinate,
                    label: Some(point.sequence.to_string()),
                    title: Some(point.area_label.clone()),
                    style: MarkerStyle::Stop {
                        sequence: point.sequence,
                    },
                })
            })
            .collect();

        let path = route.path();
        if path.len() >= 2 {
            self.surface.draw_polyline(&path);
        }
        if let Some(bounds) = &route.bounds {
            self.surface.fit_bounds(bounds);
        }

        log_info!(
            "rendered route with {} stops over {:.2} km",
            route.points.len(),
            route.total_distance_km
        );
        state.route = Some(route.clone());
        route
    }

    /// Centres the map on a stop and opens its info window.
    pub fn focus_point(&self, sequence: usize) -> Option<RoutePoint> {
        let point = lock(&self.state)
            .route
            .as_ref()
            .and_then(|route| route.point(sequence))
            .cloned()?;

        self.surface.pan_to(point.coordinate);
        self.surface.show_info(point.coordinate, &point.info_text());
        Some(point)
    }

    /// Replays `samples` at the current speed. Any earlier animation is
    /// stopped first.
    pub fn start(&self, samples: &[LocationSample]) -> Result<(), PlaybackError> {
        let path: Vec<Coordinate> = samples.iter().map(|sample| sample.coordinate).collect();
        let plan = PlaybackPlan::new(path)?;

        let mut state = lock(&self.state);
        self.halt(&mut state);

        let mover = self.surface.add_marker(&MarkerSpec {
            position: plan.start_position(),
            label: None,
            title: None,
            style: MarkerStyle::Mover,
        });
        state.mover = Some(mover);

        let step_interval = state.speed.step_interval();
        let cancel_token = CancellationToken::new();
        let live = Arc::new(Mutex::new(true));
        self.status_tx
            .send_replace(PlaybackStatus::Playing { progress_percent: 0 });

        log_info!(
            "playback started: {} points, {:.2} km, {:?} per step",
            samples.len(),
            plan.total_km(),
            step_interval
        );

        let handle = tokio::spawn(animate(
            plan,
            step_interval,
            self.surface.clone(),
            mover,
            self.status_tx.clone(),
            cancel_token.clone(),
            live.clone(),
        ));
        state.animation = Some(Animation {
            cancel_token,
            live,
            handle,
        });
        Ok(())
    }

    /// Cancels the animation and removes the moving marker.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        self.halt(&mut state);
        self.status_tx.send_replace(PlaybackStatus::Idle);
    }

    /// Waits out a tick that is mid-draw, so nothing moves or reports
    /// progress once this returns.
    fn halt(&self, state: &mut PlayerState) {
        if let Some(animation) = state.animation.take() {
            *lock(&animation.live) = false;
            animation.cancel_token.cancel();
        }
        if let Some(mover) = state.mover.take() {
            self.surface.remove_marker(mover);
        }
    }
}

impl Drop for PathPlayer {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        self.halt(&mut state);
    }
}

async fn animate(
    plan: PlaybackPlan,
    step_interval: Duration,
    surface: Arc<dyn MapSurface>,
    mover: MarkerId,
    status_tx: watch::Sender<PlaybackStatus>,
    cancel_token: CancellationToken,
    live: Arc<Mutex<bool>>,
) {
    let mut ticker = interval_at(Instant::now() + step_interval, step_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut step = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let gate = lock(&live);
                if !*gate {
                    break;
                }
                step += 1;
                let frame = plan.frame(step);
                log_debug!("playback step {step}: {:?} heading {:.1}", frame.position, frame.heading);
                surface.move_marker(mover, frame.position, frame.heading);

                if frame.complete {
                    status_tx.send_replace(PlaybackStatus::Completed);
                    log_info!("playback completed after {step} steps");
                    break;
                }
                status_tx.send_replace(PlaybackStatus::Playing {
                    progress_percent: frame.progress_percent,
                });
            }
        }
    }
}
