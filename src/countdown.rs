//! Advisory pre-game countdown.
//!
//! The countdown is purely cosmetic: the game starts when the server sends
//! `game-started`, never when the countdown runs out. It is polled as one
//! branch of the transport loop's `select!`, so cancelling it is just dropping
//! the value. The loop drops it as soon as the session leaves
//! [`Phase::Countdown`](crate::session::Phase::Countdown).

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// One step of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Seconds still to go.
    Remaining(u32),
    /// The countdown reached zero.
    Elapsed,
}

/// A countdown from `seconds` to zero, one step per `tick`.
#[derive(Debug)]
pub struct Countdown {
    remaining: u32,
    interval: Interval,
}

impl Countdown {
    /// Arm a countdown. The first step fires one `tick` from now.
    pub fn start(seconds: u32, tick: Duration) -> Self {
        // `interval_at` panics on a zero period.
        let tick = tick.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + tick, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            remaining: seconds,
            interval,
        }
    }

    /// Wait for the next step.
    ///
    /// Cancel-safe. Once [`CountdownStep::Elapsed`] was returned the caller
    /// should drop the countdown; further calls keep returning `Elapsed`.
    pub async fn next_step(&mut self) -> CountdownStep {
        if self.remaining == 0 {
            return CountdownStep::Elapsed;
        }
        self.interval.tick().await;
        self.remaining -= 1;
        if self.remaining == 0 {
            CountdownStep::Elapsed
        } else {
            CountdownStep::Remaining(self.remaining)
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// Await the next step of `countdown`, or never resolve when there is none.
pub(crate) async fn next_step(countdown: &mut Option<Countdown>) -> CountdownStep {
    match countdown {
        Some(countdown) => countdown.next_step().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_elapsed() {
        let mut countdown = Countdown::start(3, Duration::from_secs(1));
        assert_eq!(countdown.remaining(), 3);
        assert_eq!(countdown.next_step().await, CountdownStep::Remaining(2));
        assert_eq!(countdown.next_step().await, CountdownStep::Remaining(1));
        assert_eq!(countdown.next_step().await, CountdownStep::Elapsed);
        assert_eq!(countdown.next_step().await, CountdownStep::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn first_step_waits_one_tick() {
        let start = Instant::now();
        let mut countdown = Countdown::start(5, Duration::from_secs(1));
        countdown.next_step().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_seconds_elapses_immediately() {
        let mut countdown = Countdown::start(0, Duration::from_secs(1));
        assert_eq!(countdown.next_step().await, CountdownStep::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_countdown_never_resolves() {
        let mut none: Option<Countdown> = None;
        let result = tokio::time::timeout(Duration::from_secs(60), next_step(&mut none)).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tick_does_not_panic() {
        let mut countdown = Countdown::start(1, Duration::ZERO);
        assert_eq!(countdown.next_step().await, CountdownStep::Elapsed);
    }
}
