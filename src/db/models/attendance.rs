//! Attendance session boundaries.
//!
//! Sessions are opened and closed by the attendance flow, not by this crate;
//! the tracking and history code only read them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    pub id: String,
    pub worker_id: String,
    pub sign_in_at: DateTime<Utc>,
    pub sign_out_at: Option<DateTime<Utc>>,
}

impl AttendanceSession {
    pub fn is_open(&self) -> bool {
        self.sign_out_at.is_none()
    }

    /// Inclusive `[sign_in, sign_out]`, with `now` standing in for an open
    /// session's end. Range queries over it include both ends.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.sign_in_at, self.sign_out_at.unwrap_or(now))
    }
}
