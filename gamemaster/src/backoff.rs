//! Retry delay for failed ticks.

use rand::RngCore;
use std::time::Duration;

/// Equal-jitter backoff: the delay lands in [base/2, base], so retries
/// neither stampede nor drift unboundedly late.
pub(crate) fn jittered_backoff(rng: &mut impl RngCore, base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    if base_ms <= 1 {
        return base;
    }
    let half_ms = base_ms / 2;
    let jitter_ms = rng.next_u64() % (half_ms + 1);
    Duration::from_millis(half_ms.saturating_add(jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn stays_within_the_jitter_band() {
        let mut rng = StdRng::seed_from_u64(1);
        let base = Duration::from_millis(1_000);
        for _ in 0..100 {
            let delay = jittered_backoff(&mut rng, base);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= base);
        }
    }

    #[test]
    fn tiny_bases_pass_through() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            jittered_backoff(&mut rng, Duration::from_millis(1)),
            Duration::from_millis(1)
        );
    }
}
