//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync passes.
///
/// An explicit object handed to the engine constructor; nothing is read from
/// the process environment, so behavior is deterministic and testable.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base address of the remote authority,
    /// e.g. `https://sync.example.com`.
    pub base_url: String,
    /// Maximum number of queue items per batch round-trip. Default 10.
    pub batch_size: usize,
    /// Failed attempts after which a queue entry is marked permanently
    /// failed. Default 3.
    pub max_retries: u32,
    /// Bound on the connectivity probe. Default 5 seconds.
    pub connect_timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the documented defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            batch_size: 10,
            max_retries: 3,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the batch size. Values below 1 are treated as 1.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the retry maximum.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the connectivity probe timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_defaults() {
        let config = SyncConfig::new("https://sync.example.com");
        assert_eq!(config.base_url, "https://sync.example.com");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn builder_setters() {
        let config = SyncConfig::new("https://sync.example.com")
            .with_batch_size(25)
            .with_max_retries(5)
            .with_connect_timeout(Duration::from_secs(1));

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn batch_size_floor_is_one() {
        let config = SyncConfig::new("").with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }
}
