//! Text for ops-channel messages and in-app notifications.

use chrono::{DateTime, Utc};

use crate::{db::AlertNotification, geofence::FenceReading};

pub const ALERT_TITLE: &str = "🚨 Geo-fence Alert";
pub const TEST_ALERT_TITLE: &str = "🚨 Test Geo-fence Alert";

/// Everything that goes into one breach alert.
#[derive(Debug, Clone, PartialEq)]
pub struct BreachDetails {
    pub worker_name: String,
    pub assigned_label: String,
    pub current_label: String,
    pub distance_km: f64,
    pub radius_km: f64,
}

impl BreachDetails {
    pub fn new(
        worker_name: impl Into<String>,
        reading: &FenceReading,
        current_label: impl Into<String>,
        radius_km: f64,
    ) -> Self {
        Self {
            worker_name: worker_name.into(),
            assigned_label: reading.assigned_label.clone(),
            current_label: current_label.into(),
            distance_km: reading.distance_km,
            radius_km,
        }
    }
}

pub fn compose_ops_message(details: &BreachDetails) -> String {
    format!(
        "🚨 *Geo-fence Alert*\n\n\
         *Field Recruiter:* {}\n\
         *Assigned Location:* {}\n\
         *Current Location:* {}\n\
         *Distance from assigned area:* {:.2} km\n\n\
         The recruiter has moved outside the {} radius of their assigned location.",
        details.worker_name,
        details.assigned_label,
        details.current_label,
        details.distance_km,
        format_radius(details.radius_km),
    )
}

pub fn breach_notification(details: &BreachDetails, created_at: DateTime<Utc>) -> AlertNotification {
    AlertNotification::new(
        ALERT_TITLE,
        format!(
            "{} is {:.2} km from {} (currently at {}).",
            details.worker_name, details.distance_km, details.assigned_label, details.current_label
        ),
        created_at,
    )
}

pub fn compose_test_message(triggered_by: &str) -> String {
    format!(
        "🚨 *Test Geo-fence Alert*\n\n\
         *Triggered by:* {triggered_by}\n\n\
         This is a test of the geo-fence alert pipeline. No action is needed."
    )
}

pub fn test_notification(
    triggered_by: &str,
    channel_id: &str,
    created_at: DateTime<Utc>,
) -> AlertNotification {
    AlertNotification::new(
        TEST_ALERT_TITLE,
        format!(
            "This is a test alert triggered by {triggered_by}. \
             The Slack notification has also been sent to {channel_id} channel."
        ),
        created_at,
    )
}

/// "1km", "1.5km".
fn format_radius(radius_km: f64) -> String {
    if radius_km.fract() == 0.0 {
        format!("{radius_km:.0}km")
    } else {
        format!("{radius_km}km")
    }
}
