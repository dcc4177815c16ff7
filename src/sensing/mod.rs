pub mod area_namer;
pub mod controller;
pub mod loop_worker;
pub mod sampler;

pub use area_namer::{AreaNamer, GoogleGeocoder, PlaceNameService, UNKNOWN_LOCATION};
pub use controller::{StartOutcome, TrackingController};
pub use loop_worker::{TrackingDeps, TrackingEvent, TrackingTarget};
pub use sampler::{
    Fix, FixQuality, LocationError, LocationProvider, LocationSampler, PermissionState,
    PositionOptions, SamplingPolicy,
};
