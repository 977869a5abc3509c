use std::time::Duration;

/// Environment variable overriding [`TransformHistoryConfig::buffer_window`], in (fractional) seconds.
pub const ENV_TF_HISTORY_WINDOW_SECS: &str = "RERUN_TF_HISTORY_WINDOW_SECS";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse `{value}` as a history window in seconds")]
    InvalidWindow { value: String },

    #[error("the history buffer window must be larger than zero")]
    ZeroWindow,
}

/// Configures how much past a [`crate::TimeWindowedHistory`] retains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformHistoryConfig {
    /// Batches older than this, relative to the newest retained batch, get evicted.
    ///
    /// A larger window allows queries further into the past, at the cost of memory
    /// and of longer walks for time-travel queries.
    ///
    /// See [`Self::DEFAULT_BUFFER_WINDOW`] for defaults.
    pub buffer_window: Duration,
}

impl Default for TransformHistoryConfig {
    #[inline]
    fn default() -> Self {
        Self::const_default()
    }
}

impl TransformHistoryConfig {
    pub const DEFAULT_BUFFER_WINDOW: Duration = Duration::from_secs(10);

    #[inline]
    pub const fn const_default() -> Self {
        Self {
            buffer_window: Self::DEFAULT_BUFFER_WINDOW,
        }
    }

    #[inline]
    pub const fn with_buffer_window(buffer_window: Duration) -> Self {
        Self { buffer_window }
    }

    /// Default config, with [`ENV_TF_HISTORY_WINDOW_SECS`] applied if set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::const_default();
        if let Ok(value) = std::env::var(ENV_TF_HISTORY_WINDOW_SECS) {
            config.buffer_window = parse_buffer_window(&value)?;
            re_log::debug!("Transform history window set to {:?}", config.buffer_window);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }

    /// The window in nanoseconds, in the units [`crate::Timestamp::nanos_since`] uses.
    #[inline]
    pub(crate) fn buffer_window_nanos(&self) -> i128 {
        i128::try_from(self.buffer_window.as_nanos()).unwrap_or(i128::MAX)
    }
}

fn parse_buffer_window(value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::InvalidWindow {
            value: value.to_owned(),
        })
}
