//! Exponential backoff policy for transient delivery failures.

use std::time::Duration;

use rand::Rng;
use slotline_domain::DispatchConfig;

/// Delay before retry number `attempt` (1-based), exponentially grown from
/// the configured initial delay, capped, with up to 20% random jitter added
/// to de-synchronize retries that fail together.
pub fn backoff_delay(attempt: u32, cfg: &DispatchConfig) -> Duration {
    let exp = attempt.saturating_sub(1).min(31);
    let base = cfg
        .initial_backoff_ms
        .saturating_mul(1u64 << exp)
        .min(cfg.max_backoff_ms);
    let jitter = rand::thread_rng().gen_range(0..=base / 5);
    Duration::from_millis(base + jitter)
}
