//! Classifies a location sample against the worker's assignment for the day.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    db::{LocationSample, RecordStore},
    geometry::{distance_km, Coordinate},
};

pub const GEOFENCE_RADIUS_KM: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FenceReading {
    pub within_fence: bool,
    pub distance_km: f64,
    pub assigned_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeofenceOutcome {
    /// No assignment today, or one without coordinates. Nothing to alert on.
    NoAssignment,
    Evaluated(FenceReading),
}

impl GeofenceOutcome {
    pub fn is_breach(&self) -> bool {
        matches!(self, GeofenceOutcome::Evaluated(reading) if !reading.within_fence)
    }
}

/// The boundary is inclusive.
pub fn is_within_fence(distance_km: f64, radius_km: f64) -> bool {
    distance_km <= radius_km
}

pub struct GeofenceEvaluator {
    store: Arc<dyn RecordStore>,
    radius_km: f64,
}

impl GeofenceEvaluator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_radius(store, GEOFENCE_RADIUS_KM)
    }

    pub fn with_radius(store: Arc<dyn RecordStore>, radius_km: f64) -> Self {
        Self { store, radius_km }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// "Today" is the UTC calendar day the sample was recorded on.
    pub async fn evaluate(&self, worker_id: &str, sample: &LocationSample) -> Result<GeofenceOutcome> {
        let day = sample.recorded_at.date_naive();
        let assignment = self
            .store
            .get_assignment(worker_id, day)
            .await
            .with_context(|| format!("failed to load assignment for worker {worker_id} on {day}"))?;

        let Some(assignment) = assignment else {
            return Ok(GeofenceOutcome::NoAssignment);
        };
        let Some(assigned) = assignment.coordinate else {
            return Ok(GeofenceOutcome::NoAssignment);
        };

        Ok(GeofenceOutcome::Evaluated(self.reading(
            &assignment.location_label,
            &assigned,
            &sample.coordinate,
        )))
    }

    pub fn reading(&self, assigned_label: &str, assigned: &Coordinate, current: &Coordinate) -> FenceReading {
        let distance = distance_km(current, assigned);
        FenceReading {
            within_fence: is_within_fence(distance, self.radius_km),
            distance_km: distance,
            assigned_label: assigned_label.to_string(),
        }
    }
}
