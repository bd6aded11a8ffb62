//! Global prompt throttle.
//!
//! One process-wide limiter admitting at most one prompt per window, not
//! a per-caller quota. A rejected prompt does not consume the window.

use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub(crate) struct PromptThrottle {
    limiter: Option<DirectLimiter>,
    clock: DefaultClock,
}

impl PromptThrottle {
    /// A zero window disables throttling entirely.
    pub(crate) fn new(window: Duration) -> Self {
        let limiter: Option<DirectLimiter> = Quota::with_period(window).map(RateLimiter::direct);
        Self {
            limiter,
            clock: DefaultClock::default(),
        }
    }

    /// `Ok` to admit the prompt, or the wait until the next one would be
    /// admitted.
    pub(crate) fn check(&self) -> Result<(), Duration> {
        match &self.limiter {
            None => Ok(()),
            Some(limiter) => limiter
                .check()
                .map_err(|not_until| not_until.wait_time_from(self.clock.now())),
        }
    }
}
