//! Per-connection rate limiting for WebSocket commands.
//!
//! Two sliding windows guard each connection: a short burst window and a
//! longer sustained one. A command must fit in both.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Sliding window counter.
#[derive(Debug)]
pub struct SlidingWindow {
    /// Timestamps of accepted requests, oldest first
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindow {
    /// ```
    /// use std::time::Duration;
    /// use truco_server::api::rate_limiter::SlidingWindow;
    ///
    /// let mut window = SlidingWindow::new(2, Duration::from_secs(1));
    /// assert!(window.check());
    /// assert!(window.check());
    /// assert!(!window.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_room(&mut self, now: Instant) -> bool {
        self.evict(now);
        self.timestamps.len() < self.max_requests
    }

    fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Record a request if the window has room for it.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if !self.has_room(now) {
            return false;
        }
        self.record(now);
        true
    }

    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }
}

/// Which window turned a command away.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Limit {
    Burst,
    Sustained,
}

impl Limit {
    /// Text of the `error` event sent back.
    pub fn message(self) -> &'static str {
        match self {
            Limit::Burst => "Rate limit exceeded. Please slow down.",
            Limit::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Limits applied to one WebSocket connection.
#[derive(Debug)]
pub struct RateLimiter {
    burst: SlidingWindow,
    sustained: SlidingWindow,
}

impl Default for RateLimiter {
    /// 10 commands per second, 100 per minute.
    fn default() -> Self {
        Self::new(
            SlidingWindow::new(10, Duration::from_secs(1)),
            SlidingWindow::new(100, Duration::from_secs(60)),
        )
    }
}

impl RateLimiter {
    pub fn new(burst: SlidingWindow, sustained: SlidingWindow) -> Self {
        Self { burst, sustained }
    }

    /// Admit a command. A rejected command is not counted against either
    /// window.
    pub fn check(&mut self) -> Result<(), Limit> {
        let now = Instant::now();
        if !self.burst.has_room(now) {
            return Err(Limit::Burst);
        }
        if !self.sustained.has_room(now) {
            return Err(Limit::Sustained);
        }
        self.burst.record(now);
        self.sustained.record(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_window_blocks_over_limit_and_recovers() {
        let mut window = SlidingWindow::new(2, Duration::from_millis(100));
        assert!(window.check());
        assert!(window.check());
        assert!(!window.check());
        assert_eq!(window.remaining(), 0);

        thread::sleep(Duration::from_millis(150));
        assert!(window.check(), "Should allow after window expires");
        assert_eq!(window.remaining(), 1);
    }

    #[test]
    fn test_default_limiter_trips_burst_first() {
        let mut limiter = RateLimiter::default();
        for _ in 0..10 {
            assert_eq!(limiter.check(), Ok(()));
        }
        assert_eq!(limiter.check(), Err(Limit::Burst));
    }

    #[test]
    fn test_sustained_window_trips_after_bursts() {
        let mut limiter = RateLimiter::new(
            SlidingWindow::new(100, Duration::from_secs(1)),
            SlidingWindow::new(3, Duration::from_secs(60)),
        );
        for _ in 0..3 {
            limiter.check().unwrap();
        }
        assert_eq!(limiter.check(), Err(Limit::Sustained));
    }

    #[test]
    fn test_rejected_commands_are_not_counted() {
        let mut limiter = RateLimiter::new(
            SlidingWindow::new(1, Duration::from_secs(60)),
            SlidingWindow::new(5, Duration::from_secs(60)),
        );
        limiter.check().unwrap();
        for _ in 0..10 {
            assert_eq!(limiter.check(), Err(Limit::Burst));
        }
        assert_eq!(limiter.sustained.remaining(), 4);
    }
}
