// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timer coalescing for bursty events.
//!
//! Resize events arrive every frame while a window edge is dragged. A
//! [`Debouncer`] keeps only the latest value and releases it once the
//! configured quiet period has elapsed, so a burst collapses into one pass.

use std::time::{Duration, Instant};

/// Coalesces rapid updates into a single delayed value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new value, replacing any pending one and restarting the timer.
    pub fn submit(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Rejects events that follow the previous accepted one too closely.
#[derive(Debug, Clone)]
pub struct MinInterval {
    interval: Duration,
    last: Option<Instant>,
}

impl MinInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether an event at `now` would be accepted.
    pub fn ready(&self, now: Instant) -> bool {
        self.last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Mark an event at `now` as accepted.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_collapses_to_last_value() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(150));

        for i in 0..10u64 {
            d.submit(i, start + Duration::from_millis(i * 10));
        }

        assert_eq!(d.poll(start + Duration::from_millis(200)), None);
        assert_eq!(d.poll(start + Duration::from_millis(240)), Some(9));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + Duration::from_millis(1000)), None);
    }

    #[test]
    fn test_min_interval() {
        let start = Instant::now();
        let mut gate = MinInterval::new(Duration::from_millis(300));
        assert!(gate.ready(start));
        gate.mark(start);
        assert!(!gate.ready(start + Duration::from_millis(299)));
        assert!(gate.ready(start + Duration::from_millis(300)));
    }
}
