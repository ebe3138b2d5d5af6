use std::time::Duration;

use crate::error::NotificationError;

/// Tuning for the polling loop, the HTTP backend and the dedup window.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Time between polling cycles (default: 15 seconds).
    pub poll_interval: Duration,

    /// Per-request HTTP timeout (default: 10 seconds).
    pub request_timeout: Duration,

    /// Maximum number of delivered ids remembered (default: 10 000).
    pub dedup_capacity: u64,

    /// How long a delivered id is remembered (default: 12 hours).
    /// `None` keeps ids until evicted by capacity.
    pub dedup_ttl: Option<Duration>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            request_timeout: Duration::from_secs(10),
            dedup_capacity: 10_000,
            dedup_ttl: Some(Duration::from_secs(12 * 3600)),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_dedup_capacity(mut self, capacity: u64) -> Self {
        self.dedup_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_dedup_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.dedup_ttl = ttl;
        self
    }

    pub fn validate(&self) -> Result<(), NotificationError> {
        if self.poll_interval.is_zero() {
            return Err(NotificationError::InvalidConfig(
                "poll_interval must be > 0".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(NotificationError::InvalidConfig(
                "request_timeout must be > 0".into(),
            ));
        }
        if self.dedup_capacity == 0 {
            return Err(NotificationError::InvalidConfig(
                "dedup_capacity must be > 0".into(),
            ));
        }
        if self.dedup_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(NotificationError::InvalidConfig(
                "dedup_ttl must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}
