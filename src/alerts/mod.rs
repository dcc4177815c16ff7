//! Breach alerting: ops-channel message, notifications feed and in-app alert,
//! with per-worker deduplication.

pub mod channel;
pub mod dispatcher;
pub mod ledger;
pub mod message;
pub mod overlay;
pub mod presentation;

pub use channel::{MessageChannel, SlackChannel};
pub use dispatcher::{AlertDispatcher, BreachEvent, DispatchOutcome};
pub use ledger::{AlertLedger, EpisodeState};
pub use overlay::{AlertOverlay, DismissReason, OverlaySurface, OverlayView};
pub use presentation::{AlertPresentation, AlertSoundMode, SirenPattern};
