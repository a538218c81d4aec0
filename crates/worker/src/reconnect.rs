//! Retry policy with jittered exponential back-off, shared by the two
//! "keep trying until it works or give up" loops in this worker: the
//! broker consume loop reconnecting a dropped AMQP channel
//! (`BrokerConfig::reconnect_*`), and the reply sender retrying a failed
//! `PUT` to the dispatcher (`WorkerConfig::reply_*`). Both ceilings are
//! config-driven, so the policy carries its own attempt counter instead of
//! pushing that bookkeeping onto each call site's loop.

use std::time::Duration;

use authscope_domain::config::{BrokerConfig, WorkerConfig};

/// One in-progress retry sequence: the delay schedule plus how many
/// consecutive failures have been recorded against it so far.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    /// Maximum number of consecutive failures before giving up.
    /// `0` means unlimited retries.
    max_attempts: u32,
    attempt: u32,
}

impl ReconnectBackoff {
    fn new(initial_delay: Duration, max_delay: Duration, backoff_factor: f64, max_attempts: u32) -> Self {
        Self { initial_delay, max_delay, backoff_factor, max_attempts, attempt: 0 }
    }

    /// Backoff schedule for the broker consume loop's AMQP reconnects.
    pub fn for_broker(cfg: &BrokerConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.reconnect_initial_delay_ms),
            Duration::from_millis(cfg.reconnect_max_delay_ms),
            2.0,
            cfg.reconnect_attempts,
        )
    }

    /// Backoff schedule for the dispatcher reply `PUT`'s retries.
    pub fn for_reply(cfg: &WorkerConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.reply_initial_delay_ms),
            Duration::from_millis(cfg.reply_max_delay_ms),
            2.0,
            cfg.reply_max_attempts,
        )
    }

    /// How many consecutive failures have been recorded so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next attempt, given the failures recorded so far.
    pub fn delay(&self) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.backoff_factor.powi(self.attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        // Add ~25% jitter to prevent thundering herd.
        let jitter = capped_ms * 0.25 * pseudo_random_fraction(self.attempt);
        Duration::from_millis((capped_ms + jitter) as u64)
    }

    /// Whether the failures recorded so far exceed the max.
    pub fn should_give_up(&self) -> bool {
        self.max_attempts > 0 && self.attempt >= self.max_attempts
    }

    /// Records one more consecutive failure.
    pub fn record_failure(&mut self) {
        self.attempt += 1;
    }
}

/// Cheap deterministic "random" fraction [0, 1) based on attempt number.
/// Not cryptographically secure — just enough to spread reconnect storms.
fn pseudo_random_fraction(attempt: u32) -> f64 {
    let hash = attempt.wrapping_mul(2654435761); // Knuth multiplicative hash
    (hash as f64) / (u32::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_broker_reads_the_broker_reconnect_ceiling() {
        let cfg = BrokerConfig { reconnect_attempts: 3, reconnect_initial_delay_ms: 500, reconnect_max_delay_ms: 30_000, ..BrokerConfig::default() };
        let p = ReconnectBackoff::for_broker(&cfg);
        assert_eq!(p.initial_delay, Duration::from_millis(500));
        assert_eq!(p.max_delay, Duration::from_millis(30_000));
        assert!(!p.should_give_up());
    }

    #[test]
    fn for_reply_reads_the_reply_retry_ceiling() {
        let cfg = WorkerConfig::default();
        let p = ReconnectBackoff::for_reply(&cfg);
        assert_eq!(p.max_attempts, cfg.reply_max_attempts);
    }

    #[test]
    fn delay_grows_with_recorded_failures() {
        let mut p = ReconnectBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0, 0);
        let d0 = p.delay();
        p.record_failure();
        let d1 = p.delay();
        p.record_failure();
        let d2 = p.delay();
        assert!(d1 > d0);
        assert!(d2 > d1);
    }

    #[test]
    fn delay_capped_at_max() {
        let mut p = ReconnectBackoff::new(Duration::from_secs(10), Duration::from_secs(30), 10.0, 0);
        for _ in 0..10 {
            p.record_failure();
        }
        // Should not exceed max_delay + 25% jitter.
        assert!(p.delay() <= Duration::from_millis(37_500));
    }

    #[test]
    fn should_give_up_once_failures_reach_the_ceiling() {
        let mut p = ReconnectBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0, 5);
        for _ in 0..4 {
            assert!(!p.should_give_up());
            p.record_failure();
        }
        assert!(p.should_give_up());
    }

    #[test]
    fn unlimited_never_gives_up() {
        let mut p = ReconnectBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0, 0);
        for _ in 0..1_000 {
            p.record_failure();
        }
        assert!(!p.should_give_up());
    }
}
