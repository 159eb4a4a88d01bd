//! Server-driven cooldown: when the API says the request budget is spent,
//! hold the next request until the advertised reset.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Cooldown {
    until: Option<Instant>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the cooldown to at least `secs` from now; never shortens it.
    pub fn set_secs(&mut self, secs: f64) {
        if !(secs > 0.0 && secs.is_finite()) {
            return;
        }
        let until = Instant::now() + Duration::from_secs_f64(secs);
        if self.until.map_or(true, |prev| until > prev) {
            self.until = Some(until);
        }
    }

    /// Time left before the next request may go out.
    pub fn remaining(&self) -> Option<Duration> {
        let until = self.until?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    /// Record the `x-ratelimit-*` pair from a response.
    pub fn observe(&mut self, remaining: Option<f64>, reset_secs: Option<f64>) {
        if let (Some(left), Some(reset)) = (remaining, reset_secs) {
            if left < 1.0 {
                tracing::info!(reset_secs = reset, "Request budget exhausted, cooling down");
                self.set_secs(reset);
            }
        }
    }

    /// Block until the cooldown (if any) has elapsed.
    pub fn wait(&mut self) {
        if let Some(left) = self.remaining() {
            std::thread::sleep(left);
        }
        self.until = None;
    }
}
