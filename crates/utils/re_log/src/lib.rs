//! Text logging for the transform crates.
//!
//! * `trace`: spammy things, like every stale update that got discarded
//! * `debug`: things that might be useful when debugging
//! * `info`: things that we want to show to users
//! * `warn`: problems that we can recover from
//! * `error`: problems that lead to loss of functionality or data
//!
//! The `warn_once` etc macros are for when you want to suppress repeated
//! logging of the exact same message, e.g. when the same bad update arrives every frame.

#[cfg(feature = "setup")]
mod setup;

pub use log::{Level, LevelFilter, debug, error, info, log, log_enabled, trace, warn};

// The `re_log::*_once!` macros dedupe on the exact message, per call site.
pub use log_once::{debug_once, error_once, info_once, log_once, trace_once, warn_once};

#[cfg(feature = "setup")]
pub use setup::{default_log_filter, setup_logging, setup_test_logging};
