use core::fmt;
use core::time::Duration;

/// Maps a 1-based attempt index to the wait before the next attempt.
pub type WaitFn = Box<dyn Fn(u32) -> Duration + Send + Sync>;

/// Wait schedule governing how often a failed operation is re-invoked.
pub enum RetryPolicy {
    /// Ordered waits; attempt count = waits + 1. Once the waits are
    /// exhausted the last outcome is surfaced even if it still fails the
    /// predicate.
    Fixed(Vec<Duration>),

    /// Retries forever, waiting `wait_fn(attempt)` between attempts, until
    /// the predicate reports success or the execution is cancelled.
    Infinite(WaitFn),
}

impl RetryPolicy {
    /// A fixed schedule from an explicit list of waits.
    pub fn fixed(waits: impl IntoIterator<Item = Duration>) -> Self {
        Self::Fixed(waits.into_iter().collect())
    }

    /// A fixed schedule of `retries` identical waits.
    pub fn fixed_backoff(wait: Duration, retries: usize) -> Self {
        Self::Fixed(vec![wait; retries])
    }

    /// A fixed schedule of `retries` doubling waits: `initial`, `2 * initial`,
    /// `4 * initial`, ...
    pub fn exponential_backoff(initial: Duration, retries: usize) -> Self {
        let mut wait = initial;
        let mut waits = Vec::with_capacity(retries);
        for _ in 0..retries {
            waits.push(wait);
            wait = wait.saturating_mul(2);
        }
        Self::Fixed(waits)
    }

    /// An unbounded schedule whose wait is computed from the attempt index.
    pub fn infinite(wait_fn: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self::Infinite(Box::new(wait_fn))
    }

    /// An unbounded schedule with a constant wait.
    pub fn infinite_fixed(wait: Duration) -> Self {
        Self::infinite(move |_| wait)
    }

    /// Wait to observe after the retryable failure of `attempt` (1-based), or
    /// `None` when a fixed schedule has nothing left to offer.
    pub fn wait_before(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::Fixed(waits) => waits.get(attempt.checked_sub(1)? as usize).copied(),
            Self::Infinite(wait_fn) => Some(wait_fn(attempt)),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(waits) => f.debug_tuple("Fixed").field(waits).finish(),
            Self::Infinite(_) => f.debug_tuple("Infinite").field(&"<wait fn>").finish(),
        }
    }
}

/// One retryable failure inside an execution, handed to the `on_retry`
/// observer right before the wait is served. Never persisted.
#[derive(Debug)]
pub struct Attempt<'a, T> {
    /// 1-based invocation index within this execution.
    pub index: u32,
    /// The failing outcome produced by this invocation.
    pub outcome: &'a T,
    /// Wait that will be served before the next invocation.
    pub wait: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_schedule_serves_waits_in_order_then_runs_out() {
        let policy = RetryPolicy::fixed([Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(policy.wait_before(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.wait_before(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.wait_before(3), None);
    }

    #[test]
    fn empty_fixed_schedule_never_waits() {
        let policy = RetryPolicy::fixed([]);
        assert_eq!(policy.wait_before(1), None);
    }

    #[test]
    fn exponential_backoff_doubles() {
        let policy = RetryPolicy::exponential_backoff(Duration::from_secs(1), 4);
        let RetryPolicy::Fixed(waits) = policy else {
            panic!("expected a fixed schedule");
        };
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn infinite_schedule_always_has_a_wait() {
        let policy = RetryPolicy::infinite(|attempt| Duration::from_secs(u64::from(attempt)));
        assert_eq!(policy.wait_before(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.wait_before(1000), Some(Duration::from_secs(1000)));
    }
}
