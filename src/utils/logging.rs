//! Logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! The tracking loop and the path player run on timers and can get chatty.
//! Each module that uses these macros declares the flag, and flipping it to
//! `false` silences that module without touching `RUST_LOG`:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("sample recorded for session {}", session_id);
//! ```

/// Conditional `log::debug!`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Conditional `log::info!`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional `log::warn!`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional `log::error!`. Errors in the tracking path are never fatal, so
/// they are logged here instead of being propagated.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
