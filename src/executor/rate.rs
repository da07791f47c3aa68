use std::time::Duration;
use tokio::time::Instant;

use super::stop::StopSignal;

/// Splits `target_rps` across `workers` so the shares sum to the target
/// exactly: the first `target_rps % workers` workers get one extra request
/// per second.
pub fn split_rate(target_rps: u32, workers: usize) -> Vec<u32> {
    if workers == 0 {
        return Vec::new();
    }
    let workers_u32 = u32::try_from(workers).unwrap_or(u32::MAX);
    let base = target_rps / workers_u32;
    let remainder = (target_rps % workers_u32) as usize;

    (0..workers)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Fixed-interval pacer for one worker. Late dispatches are not compensated:
/// when a request takes longer than the interval the next one goes out
/// immediately and the achieved rate drops below target.
#[derive(Debug)]
pub struct RateController {
    rate: u32,
    interval: Duration,
    last_dispatch: Option<Instant>,
}

impl RateController {
    pub fn new(rate: u32) -> Self {
        let interval = if rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(rate))
        };
        Self {
            rate,
            interval,
            last_dispatch: None,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left to wait at `now` before the next dispatch is allowed.
    pub fn delay_at(&self, now: Instant) -> Duration {
        match self.last_dispatch {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// Sleeps until the next dispatch slot. Returns `false` if the stop signal
    /// fired while waiting.
    pub async fn pace(&self, stop: &StopSignal) -> bool {
        let delay = self.delay_at(Instant::now());
        if delay.is_zero() {
            return !stop.is_stopped();
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => !stop.is_stopped(),
            _ = stop.stopped() => false,
        }
    }

    pub fn mark_dispatch(&mut self, at: Instant) {
        self.last_dispatch = Some(at);
    }
}
