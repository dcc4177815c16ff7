use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;

/// Name shown on the live map for a worker without a usable profile name.
pub const UNNAMED_WORKER: &str = "Unknown";

/// Latest known position of a worker who is currently signed in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LivePosition {
    pub worker_id: String,
    pub worker_name: String,
    pub coordinate: Coordinate,
    pub area_label: String,
    pub recorded_at: DateTime<Utc>,
}
