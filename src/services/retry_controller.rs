//! Retry decisions and backoff computation.

use std::time::Duration;

use crate::domain::models::{ProcessorConfig, RetryStrategy};

/// What to do with a task whose attempt just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Requeue after `delay`; `attempt` is the new retry count (1-based).
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted: the task fails terminally.
    Fail,
}

/// Backoff policy derived from the processor configuration.
///
/// Delays grow with the attempt number and are capped at `max_delay`:
///
/// - linear: `base * attempt`
/// - exponential: `base * 2^(attempt - 1)`
#[derive(Debug, Clone)]
pub struct RetryController {
    strategy: RetryStrategy,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryController {
    pub const fn new(strategy: RetryStrategy, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            strategy,
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub const fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(
            config.retry_strategy,
            config.retry_delay_ms,
            config.max_retry_delay_ms,
        )
    }

    /// Decide the fate of a failed attempt.
    ///
    /// `retry_count` is the number of retries already consumed.
    pub fn decide(&self, retry_count: u32, max_retries: u32) -> RetryDecision {
        if retry_count >= max_retries {
            return RetryDecision::Fail;
        }

        let attempt = retry_count + 1;
        RetryDecision::Retry {
            attempt,
            delay: self.delay_for(attempt),
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay_ms = match self.strategy {
            RetryStrategy::Linear => self.base_delay_ms.saturating_mul(u64::from(attempt)),
            RetryStrategy::Exponential => self
                .base_delay_ms
                .saturating_mul(2_u64.saturating_pow(attempt - 1)),
        };

        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

impl Default for RetryController {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let controller = RetryController::new(RetryStrategy::Exponential, 1000, 60_000);

        assert_eq!(controller.delay_for(1), Duration::from_millis(1000));
        assert_eq!(controller.delay_for(2), Duration::from_millis(2000));
        assert_eq!(controller.delay_for(3), Duration::from_millis(4000));
        assert_eq!(controller.delay_for(4), Duration::from_millis(8000));
        assert_eq!(controller.delay_for(6), Duration::from_millis(32000));
        assert_eq!(controller.delay_for(7), Duration::from_millis(60000)); // capped
        assert_eq!(controller.delay_for(200), Duration::from_millis(60000));
    }

    #[test]
    fn test_linear_backoff() {
        let controller = RetryController::new(RetryStrategy::Linear, 250, 1000);

        assert_eq!(controller.delay_for(1), Duration::from_millis(250));
        assert_eq!(controller.delay_for(2), Duration::from_millis(500));
        assert_eq!(controller.delay_for(3), Duration::from_millis(750));
        assert_eq!(controller.delay_for(5), Duration::from_millis(1000)); // capped
    }

    #[test]
    fn test_backoff_is_monotonic() {
        for strategy in [RetryStrategy::Linear, RetryStrategy::Exponential] {
            let controller = RetryController::new(strategy, 10, 100_000);
            let delays: Vec<_> = (1..=12).map(|a| controller.delay_for(a)).collect();
            assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{strategy:?}");
        }
    }

    #[test]
    fn test_decide_respects_budget() {
        let controller = RetryController::new(RetryStrategy::Linear, 100, 1000);

        assert_eq!(
            controller.decide(0, 2),
            RetryDecision::Retry {
                attempt: 1,
                delay: Duration::from_millis(100)
            }
        );
        assert_eq!(
            controller.decide(1, 2),
            RetryDecision::Retry {
                attempt: 2,
                delay: Duration::from_millis(200)
            }
        );
        assert_eq!(controller.decide(2, 2), RetryDecision::Fail);
        assert_eq!(controller.decide(0, 0), RetryDecision::Fail);
    }

    #[test]
    fn test_total_attempts_for_always_failing_task() {
        let controller = RetryController::default();
        for max_retries in 0..5 {
            let mut retry_count = 0;
            let mut invocations = 1;
            while let RetryDecision::Retry { attempt, .. } =
                controller.decide(retry_count, max_retries)
            {
                retry_count = attempt;
                invocations += 1;
            }
            assert_eq!(invocations, max_retries + 1);
        }
    }
}
