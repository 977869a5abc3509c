//! Functions to set up logging in binaries and tests.

/// The log filter to use: `RUST_LOG` if set, else `info`.
///
/// Crates that are too loud on `debug` are capped at `warn` unless `RUST_LOG` mentions them.
pub fn default_log_filter() -> String {
    let mut rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());

    const LOUD_CRATES: [&str; 1] = [
        // Emits a line per frame when profiling is on:
        "puffin",
    ];
    for loud_crate in LOUD_CRATES {
        if !rust_log.contains(&format!("{loud_crate}=")) {
            rust_log += &format!(",{loud_crate}=warn");
        }
    }

    rust_log
}

/// Installs an `env_logger` backend writing to stderr.
///
/// Calling this more than once is harmless.
pub fn setup_logging() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&default_log_filter());
    if builder.try_init().is_err() {
        log::debug!("Logging was already set up");
    }
}

/// Like [`setup_logging`], but captured by the test harness.
pub fn setup_test_logging() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&default_log_filter()).is_test(true);
    if builder.try_init().is_err() {
        log::trace!("Logging was already set up");
    }
}
