//! Pagination settings.

use super::throttle::PageThrottle;
use std::time::Duration;

/// Largest page the klines endpoint serves.
pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Candles per page (default: 1000)
    pub limit: u32,
    /// Pause before every N-th page, starting with the first (default: 3)
    pub pause_every: u32,
    /// Length of each pause (default: 1s)
    pub pause: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            limit: MAX_PAGE_LIMIT,
            pause_every: 3,
            pause: Duration::from_secs(1),
        }
    }
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }

    /// No pauses at all. For mocked sources and tests.
    pub fn unthrottled() -> Self {
        Self {
            pause_every: 0,
            pause: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn throttle(&self) -> PageThrottle {
        PageThrottle::new(self.pause_every, self.pause)
    }
}

#[derive(Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Set the page size. Clamped to `1..=1000`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.config.limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    pub fn pause_every(mut self, pages: u32) -> Self {
        self.config.pause_every = pages;
        self
    }

    pub fn pause(mut self, pause: Duration) -> Self {
        self.config.pause = pause;
        self
    }

    pub fn unthrottled(mut self) -> Self {
        self.config.pause_every = 0;
        self.config.pause = Duration::ZERO;
        self
    }

    pub fn build(self) -> FetchConfig {
        self.config
    }
}
