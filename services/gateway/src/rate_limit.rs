use crate::error::AppError;
use dashmap::DashMap;
use std::time::Instant;
use types::ids::ParticipantId;

/// Token bucket refilled continuously
#[derive(Clone)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

impl Bucket {
    fn full(capacity: u32) -> Self {
        Self {
            tokens: capacity as f64,
            last_update: Instant::now(),
        }
    }

    fn try_take(&mut self, capacity: u32, refill_per_sec: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = f64::min(capacity as f64, self.tokens + elapsed * refill_per_sec);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-participant command limiter
///
/// A participant may burst up to `per_minute` commands, then gets one more
/// each `60 / per_minute` seconds.
pub struct RateLimiter {
    buckets: DashMap<ParticipantId, Bucket>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            per_minute: per_minute.max(1),
        }
    }

    pub fn check(&self, participant: &ParticipantId) -> Result<(), AppError> {
        let mut bucket = self
            .buckets
            .entry(participant.clone())
            .or_insert_with(|| Bucket::full(self.per_minute));

        if bucket.try_take(self.per_minute, self.per_minute as f64 / 60.0) {
            Ok(())
        } else {
            Err(AppError::RateLimitExceeded(format!(
                "{} exceeded {} commands per minute",
                participant, self.per_minute
            )))
        }
    }
}
