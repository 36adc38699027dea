use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key throttle for WebSocket connection attempts, keyed by client IP.
///
/// Each key gets a bucket of `burst` tokens; one token returns every
/// `period`. Connection storms from one address are refused at the HTTP
/// layer before they ever reach the relay engine.
pub struct ConnectionThrottle {
    buckets: Mutex<HashMap<String, Bucket>>,
    burst: u32,
    period: Duration,
}

struct Bucket {
    available: u32,
    last_refill: Instant,
}

impl ConnectionThrottle {
    pub fn new(burst: u32, period: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            burst,
            period,
        }
    }

    /// Take a token for `key`. Returns false when the bucket is empty.
    pub fn allow(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().unwrap();
        let now = Instant::now();

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            available: self.burst,
            last_refill: now,
        });

        // Whole tokens only; the remainder of the elapsed time is kept by
        // advancing last_refill in period-sized steps.
        if !self.period.is_zero() {
            let elapsed = now.duration_since(bucket.last_refill);
            let refilled = (elapsed.as_nanos() / self.period.as_nanos()) as u32;
            if refilled > 0 {
                bucket.available = bucket.available.saturating_add(refilled).min(self.burst);
                if bucket.available == self.burst {
                    bucket.last_refill = now;
                } else {
                    bucket.last_refill += self.period * refilled;
                }
            }
        }

        if bucket.available > 0 {
            bucket.available -= 1;
            true
        } else {
            false
        }
    }

    /// Drop buckets that have been idle longer than `idle_for`.
    pub fn sweep(&self, idle_for: Duration) {
        let cutoff = Instant::now() - idle_for;
        self.buckets
            .lock()
            .unwrap()
            .retain(|_, b| b.last_refill > cutoff);
    }
}
