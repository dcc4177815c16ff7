use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;

/// Where a worker is expected to be on a given day. At most one per worker
/// per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkAssignment {
    pub worker_id: String,
    pub date: NaiveDate,
    pub location_label: String,
    /// Planners may assign a place by name before it has been geocoded.
    pub coordinate: Option<Coordinate>,
}
