pub mod assignment;
pub mod attendance;
pub mod live_position;
pub mod location_sample;
pub mod notification;
pub mod worker;

pub use assignment::WorkAssignment;
pub use attendance::AttendanceSession;
pub use live_position::{LivePosition, UNNAMED_WORKER};
pub use location_sample::LocationSample;
pub use notification::AlertNotification;
pub use worker::{display_name_or_unknown, WorkerProfile, UNKNOWN_WORKER_NAME};
