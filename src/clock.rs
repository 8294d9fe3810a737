use std::time::{Duration, Instant};

/// What a tick did to the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; carries the whole seconds left
    Running(u64),
    /// Reached zero on this tick
    Expired,
    /// Already at zero before this tick
    Idle,
}

/// Countdown for one session.
///
/// Remaining time is derived from the start instant, so it drops by exactly
/// one for every whole second that passes no matter how often it is ticked.
#[derive(Clone, Debug)]
pub struct SessionClock {
    configured_secs: u64,
    remaining_secs: u64,
    started_at: Instant,
}

impl SessionClock {
    pub fn start(configured_secs: u64) -> Self {
        Self::start_at(configured_secs, Instant::now())
    }

    pub fn start_at(configured_secs: u64, started_at: Instant) -> Self {
        Self {
            configured_secs,
            remaining_secs: configured_secs,
            started_at,
        }
    }

    pub fn configured_secs(&self) -> u64 {
        self.configured_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.configured_secs - self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Tick {
        if self.is_expired() {
            return Tick::Idle;
        }

        let elapsed = now
            .checked_duration_since(self.started_at)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        self.remaining_secs = self.configured_secs.saturating_sub(elapsed);

        if self.is_expired() {
            Tick::Expired
        } else {
            Tick::Running(self.remaining_secs)
        }
    }
}
