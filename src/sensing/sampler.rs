//! Position fixes with a high-accuracy first attempt and a single
//! reduced-accuracy retry.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Coordinate;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location fix timed out after {0:?}")]
    Timeout(Duration),
    #[error("location provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned out-of-range coordinate ({latitude}, {longitude})")]
    InvalidFix { latitude: f64, longitude: f64 },
}

impl LocationError {
    /// A denial ends the cycle; retrying with lower accuracy cannot help.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LocationError::PermissionDenied)
    }
}

/// Device positioning capability.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Prompts the user if needed and reports the resulting state.
    async fn request_permission(&self) -> PermissionState;

    async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, LocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FixQuality {
    High,
    Reduced,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub quality: FixQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    pub primary: PositionOptions,
    pub fallback: PositionOptions,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            primary: PositionOptions {
                high_accuracy: true,
                timeout: PRIMARY_TIMEOUT,
            },
            fallback: PositionOptions {
                high_accuracy: false,
                timeout: FALLBACK_TIMEOUT,
            },
        }
    }
}

#[derive(Clone)]
pub struct LocationSampler {
    provider: Arc<dyn LocationProvider>,
    policy: SamplingPolicy,
}

impl LocationSampler {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self::with_policy(provider, SamplingPolicy::default())
    }

    pub fn with_policy(provider: Arc<dyn LocationProvider>, policy: SamplingPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn ensure_permission(&self) -> Result<(), LocationError> {
        match self.provider.request_permission().await {
            PermissionState::Granted => Ok(()),
            state => {
                log_warn!("location permission not granted: {state:?}");
                Err(LocationError::PermissionDenied)
            }
        }
    }

    /// One attempt. The timeout is enforced here as well, since providers do
    /// not always honour the one they are given.
    pub async fn get_current_location(
        &self,
        high_accuracy: bool,
        timeout: Duration,
    ) -> Result<Coordinate, LocationError> {
        let options = PositionOptions {
            high_accuracy,
            timeout,
        };

        let coordinate =
            match tokio::time::timeout(timeout, self.provider.current_position(options)).await {
                Ok(result) => result?,
                Err(_) => return Err(LocationError::Timeout(timeout)),
            };

        if !coordinate.is_valid() {
            return Err(LocationError::InvalidFix {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }

        Ok(coordinate)
    }

    /// Permission check, primary attempt, then at most one fallback attempt.
    pub async fn sample(&self) -> Result<Fix, LocationError> {
        self.ensure_permission().await?;

        let primary = self.policy.primary;
        match self
            .get_current_location(primary.high_accuracy, primary.timeout)
            .await
        {
            Ok(coordinate) => Ok(Fix {
                coordinate,
                quality: quality_of(primary),
            }),
            Err(err) if err.is_terminal() => Err(err),
            Err(err) => {
                log_warn!("primary location fix failed: {err}; retrying with reduced accuracy");
                let fallback = self.policy.fallback;
                let coordinate = self
                    .get_current_location(fallback.high_accuracy, fallback.timeout)
                    .await?;
                log_debug!("fallback fix obtained at ({}, {})", coordinate.latitude, coordinate.longitude);
                Ok(Fix {
                    coordinate,
                    quality: quality_of(fallback),
                })
            }
        }
    }
}

fn quality_of(options: PositionOptions) -> FixQuality {
    if options.high_accuracy {
        FixQuality::High
    } else {
        FixQuality::Reduced
    }
}
