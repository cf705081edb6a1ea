use rand::Rng;
use std::time::Duration;

const BASE_DELAY_MS: u64 = 250;
const MAX_DELAY_MS: u64 = 10_000;

/// Exponential backoff with full jitter. `attempt` is 1-based: the delay
/// before the *second* try.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(6));
    let capped = exp.min(MAX_DELAY_MS);
    let jittered = rand::thread_rng().gen_range(0..=capped);
    Duration::from_millis(jittered.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_with_attempt_on_average() {
        let small: u64 = (0..50).map(|_| backoff_delay(1).as_millis() as u64).sum::<u64>() / 50;
        let large: u64 = (0..50).map(|_| backoff_delay(5).as_millis() as u64).sum::<u64>() / 50;
        assert!(large >= small);
    }

    #[test]
    fn delay_is_capped() {
        for _ in 0..50 {
            assert!(backoff_delay(10) <= Duration::from_millis(MAX_DELAY_MS));
        }
    }
}
