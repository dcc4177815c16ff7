//! A single position fix recorded by the tracking loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Coordinate;

/// Immutable once persisted. The tracking loop creates these; nothing in this
/// crate updates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub id: String,
    pub worker_id: String,
    pub session_id: Option<String>,
    pub coordinate: Coordinate,
    pub area_label: String,
    pub recorded_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(
        worker_id: impl Into<String>,
        session_id: Option<String>,
        coordinate: Coordinate,
        area_label: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            worker_id: worker_id.into(),
            session_id,
            coordinate,
            area_label: area_label.into(),
            recorded_at,
        }
    }
}
