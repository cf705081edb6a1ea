use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::request::HostCategory;

/// A simple token bucket: refills continuously at `qps` tokens/sec, caps at
/// `qps` tokens of burst. One bucket per [`HostCategory`].
struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(qps: f64) -> Self {
        Self {
            tokens: qps,
            capacity: qps,
            refill_per_sec: qps,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Returns `None` if a token was available now, or `Some(wait)` for how
    /// long the caller must sleep before retrying.
    fn try_acquire(&mut self) -> Option<Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let deficit = 1.0 - self.tokens;
            Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
        }
    }
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<&'static str, Bucket>>,
}

impl RateLimiter {
    pub fn new(registry_qps: f64, repo_api_qps: f64, doc_site_qps: f64, generic_qps: f64) -> Self {
        let mut buckets = HashMap::new();
        buckets.insert("registry", Bucket::new(registry_qps));
        buckets.insert("repo_api", Bucket::new(repo_api_qps));
        buckets.insert("doc_site", Bucket::new(doc_site_qps));
        buckets.insert("generic", Bucket::new(generic_qps));
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// Blocks (async) until a token for `category` is available, or returns
    /// immediately. Loops because the bucket may still be contended after
    /// one wait if other callers raced in first.
    pub async fn acquire(&self, category: HostCategory) {
        loop {
            let wait = {
                let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
                let bucket = buckets
                    .get_mut(category.as_str())
                    .expect("all host categories have a bucket");
                bucket.try_acquire()
            };
            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_never_waits() {
        let limiter = RateLimiter::new(2.0, 2.0, 1.0, 1.0);
        let start = Instant::now();
        limiter.acquire(HostCategory::DocSite).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn bucket_denies_when_drained() {
        let mut bucket = Bucket::new(1.0);
        assert!(bucket.try_acquire().is_none());
        assert!(bucket.try_acquire().is_some());
    }
}
