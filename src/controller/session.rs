use std::time::{Duration, Instant};

/// Last resolved audio session handle and when it was resolved.
#[derive(Debug)]
pub struct SessionCache<H> {
    entry: Option<(H, Instant)>,
    ttl: Duration,
}

impl<H> SessionCache<H> {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// The cached handle, if it is younger than the TTL at `now`.
    pub fn get(&self, now: Instant) -> Option<&H> {
        self.entry
            .as_ref()
            .filter(|(_, cached_at)| now.saturating_duration_since(*cached_at) < self.ttl)
            .map(|(handle, _)| handle)
    }

    pub fn store(&mut self, handle: H, now: Instant) {
        self.entry = Some((handle, now));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
