use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Change notification delivery parameters
///
/// # Example (TOML)
/// ```toml
/// [fanout]
/// subscriber_buffer_size = 16
/// enable_metrics = false
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FanoutConfig {
    /// Buffer size of each subscriber's channel
    ///
    /// When a subscriber falls this many events behind, further events for
    /// that subscriber are dropped (drop-newest) until it drains. Other
    /// subscribers and the mutating caller are never blocked.
    ///
    /// **Default**: 16
    #[serde(default = "default_subscriber_buffer_size")]
    pub subscriber_buffer_size: usize,

    /// Log a warning every time an event is dropped for a slow subscriber
    ///
    /// **Default**: false
    #[serde(default = "default_enable_metrics")]
    pub enable_metrics: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer_size: default_subscriber_buffer_size(),
            enable_metrics: default_enable_metrics(),
        }
    }
}

impl FanoutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.subscriber_buffer_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "fanout.subscriber_buffer_size must be greater than 0".into(),
            )));
        }

        if self.subscriber_buffer_size > 10_000 {
            warn!(
                "fanout.subscriber_buffer_size ({}) is very large; a stalled subscriber may hold a lot of memory",
                self.subscriber_buffer_size
            );
        }

        Ok(())
    }
}

const fn default_subscriber_buffer_size() -> usize {
    16
}

const fn default_enable_metrics() -> bool {
    false
}
