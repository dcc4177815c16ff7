pub mod assignments;
pub mod attendance;
pub mod live_positions;
pub mod location_samples;
pub mod notifications;
pub mod workers;
