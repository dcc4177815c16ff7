//! Frame computation for animated path playback.
//!
//! Playback runs a fixed number of steps over a duration chosen by speed.
//! Step `k` of `N` places the marker at `k / N` of the path length, found by
//! walking cumulative great-circle segment lengths and interpolating inside
//! the segment it lands in; the heading is that segment's initial bearing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{bearing_degrees, locate_along, segment_lengths_km, Coordinate};

pub const ANIMATION_STEPS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("not enough data to play back: need at least 2 samples, found {found}")]
    NotEnoughData { found: usize },
    #[error("map surface unavailable: {0}")]
    SurfaceUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl PlaybackSpeed {
    pub fn total_duration(self) -> Duration {
        match self {
            PlaybackSpeed::Slow => Duration::from_secs(60),
            PlaybackSpeed::Normal => Duration::from_secs(30),
            PlaybackSpeed::Fast => Duration::from_secs(15),
        }
    }

    pub fn step_interval(self) -> Duration {
        self.total_duration() / ANIMATION_STEPS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackFrame {
    pub step: u32,
    pub position: Coordinate,
    pub heading: f64,
    pub progress_percent: u8,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct PlaybackPlan {
    path: Vec<Coordinate>,
    segments: Vec<f64>,
    total_km: f64,
    steps: u32,
}

impl PlaybackPlan {
    pub fn new(path: Vec<Coordinate>) -> Result<Self, PlaybackError> {
        Self::with_steps(path, ANIMATION_STEPS)
    }

    pub fn with_steps(path: Vec<Coordinate>, steps: u32) -> Result<Self, PlaybackError> {
        if path.len() < 2 {
            return Err(PlaybackError::NotEnoughData { found: path.len() });
        }
        let segments = segment_lengths_km(&path);
        let total_km = segments.iter().sum();
        Ok(Self {
            path,
            segments,
            total_km,
            steps: steps.max(1),
        })
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    pub fn start_position(&self) -> Coordinate {
        self.path[0]
    }

    /// Frame for step `step` (1-based). Steps past the end clamp to the
    /// final frame, which sits exactly on the last point.
    pub fn frame(&self, step: u32) -> PlaybackFrame {
        let step = step.min(self.steps);
        let progress = f64::from(step) / f64::from(self.steps);
        let last_segment = self.segments.len() - 1;

        let (segment, position) = if step == self.steps {
            (last_segment, self.path[last_segment + 1])
        } else {
            match locate_along(&self.path, &self.segments, progress * self.total_km) {
                Some(found) => (found.segment, found.coordinate),
                None => (last_segment, self.path[last_segment + 1]),
            }
        };

        PlaybackFrame {
            step,
            position,
            heading: bearing_degrees(&self.path[segment], &self.path[segment + 1]),
            progress_percent: (progress * 100.0).round() as u8,
            complete: step == self.steps,
        }
    }
}
