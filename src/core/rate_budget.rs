use std::time::Duration;

/// Request spacing derived from one rate window shared by the whole fleet.
///
/// Each account waits `per_account_delay` between its own requests; account
/// startups are spaced by `request_lapse` so that the fleet's requests land
/// evenly across the window instead of bursting together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    window: Duration,
    rate_limit: u32,
    account_count: u32,
}

impl RateBudget {
    /// `rate_limit` and `account_count` are clamped to at least 1.
    pub fn new(window: Duration, rate_limit: u32, account_count: usize) -> Self {
        Self {
            window,
            rate_limit: rate_limit.max(1),
            account_count: u32::try_from(account_count).unwrap_or(u32::MAX).max(1),
        }
    }

    pub fn from_millis(window_ms: u64, rate_limit: u32, account_count: usize) -> Self {
        Self::new(Duration::from_millis(window_ms), rate_limit, account_count)
    }

    pub fn per_account_delay(&self) -> Duration {
        self.window / self.rate_limit
    }

    pub fn request_lapse(&self) -> Duration {
        self.per_account_delay() / self.account_count
    }

    /// Initial delay for the worker at `index` (0-based).
    pub fn stagger_for(&self, index: usize) -> Duration {
        self.request_lapse()
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub fn account_count(&self) -> usize {
        self.account_count as usize
    }
}
