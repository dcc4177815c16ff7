#![allow(dead_code)]

pub mod http_stub;
pub mod memory_store;
pub mod mock_location;
pub mod mock_map;
pub mod recording;

use chrono::{DateTime, TimeZone, Utc};
use fieldtrack::{db::LocationSample, geometry::Coordinate};

/// Parrys Corner, Chennai.
pub const ASSIGNED: Coordinate = Coordinate {
    latitude: 13.0827,
    longitude: 80.2707,
};

/// About 1.11 km north of [`ASSIGNED`].
pub const NORTH_OF_ASSIGNED: Coordinate = Coordinate {
    latitude: 13.0927,
    longitude: 80.2707,
};

pub fn morning(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 4, minute, 0).unwrap()
}

pub fn sample_at(coordinate: Coordinate, label: &str, minute: u32) -> LocationSample {
    LocationSample::new("w1", Some("s1".into()), coordinate, label, morning(minute))
}
