//! Fixed-cadence pause between page requests.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Sleeps for `pause` before every `every`-th page, starting with the first.
///
/// This is a plain wall-clock delay, not a token bucket: the caller bounds
/// the number of pages, so a fixed cadence keeps the request rate under the
/// exchange budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageThrottle {
    every: u32,
    pause: Duration,
}

impl PageThrottle {
    pub const fn new(every: u32, pause: Duration) -> Self {
        Self { every, pause }
    }

    /// Never pauses.
    pub const fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    #[inline]
    pub const fn is_disabled(&self) -> bool {
        self.every == 0 || self.pause.is_zero()
    }

    /// Whether the page with zero-based `index` is preceded by a pause.
    #[inline]
    pub const fn pauses_before(&self, index: u32) -> bool {
        !self.is_disabled() && index % self.every == 0
    }

    pub async fn before_page(&self, index: u32) {
        if self.pauses_before(index) {
            debug!(page = index, pause_ms = self.pause.as_millis() as u64, "throttling");
            sleep(self.pause).await;
        }
    }
}

impl Default for PageThrottle {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
