//! Network-idle detection from request lifecycle events.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Tracks in-flight requests and how long the count has stayed low.
#[derive(Debug)]
pub struct InflightTracker {
    inflight: HashSet<String>,
    max_inflight: usize,
    idle_window: Duration,
    /// When the count last dropped to `max_inflight` or below.
    quiet_since: Option<Instant>,
    peak: usize,
}

impl InflightTracker {
    /// Start tracking at `now`, with nothing in flight.
    pub fn new(max_inflight: usize, idle_window: Duration, now: Instant) -> Self {
        Self {
            inflight: HashSet::new(),
            max_inflight,
            idle_window,
            quiet_since: Some(now),
            peak: 0,
        }
    }

    pub fn request_started(&mut self, request_id: &str, now: Instant) {
        self.inflight.insert(request_id.to_string());
        self.peak = self.peak.max(self.inflight.len());
        if self.inflight.len() > self.max_inflight {
            self.quiet_since = None;
        } else if self.quiet_since.is_none() {
            self.quiet_since = Some(now);
        }
    }

    /// A request finished or failed. Unknown ids are ignored.
    pub fn request_settled(&mut self, request_id: &str, now: Instant) {
        if !self.inflight.remove(request_id) {
            return;
        }
        if self.inflight.len() <= self.max_inflight && self.quiet_since.is_none() {
            self.quiet_since = Some(now);
        }
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    /// True once the count has stayed at or below the limit for the whole window.
    pub fn is_idle(&self, now: Instant) -> bool {
        self.quiet_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.idle_window)
    }
}
