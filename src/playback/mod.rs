//! Session route rendering and animated replay.

pub mod history;
pub mod plan;
pub mod player;
pub mod route;
pub mod surface;

pub use history::load_session_route;
pub use plan::{PlaybackError, PlaybackFrame, PlaybackPlan, PlaybackSpeed, ANIMATION_STEPS};
pub use player::{PathPlayer, PlaybackStatus};
pub use route::{RouteOverview, RoutePoint};
pub use surface::{MapSurface, MarkerId, MarkerSpec, MarkerStyle};
