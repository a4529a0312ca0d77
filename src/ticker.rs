use std::time::{Duration, Instant};

/// Owned handle for a repeating, deadline-driven timer.
///
/// The event loop asks [`PollTimer::fire_if_due`] on every turn; starting an
/// active timer or stopping an idle one is a no-op.
#[derive(Debug, Clone)]
pub struct PollTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl PollTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Arms the timer; the first tick is one period from `now`.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        self.next_due = Some(now + self.period);
        true
    }

    pub fn stop(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                // Missed ticks collapse into one.
                let mut next = due + self.period;
                if next <= now {
                    next = now + self.period;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::PollTimer;

    #[test]
    fn start_is_idempotent_and_stop_cancels() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(5));
        assert!(timer.start(now));
        let due = timer.next_due();
        assert!(!timer.start(now + Duration::from_secs(1)));
        assert_eq!(timer.next_due(), due, "second start must not re-arm");

        assert!(timer.stop());
        assert!(!timer.is_active());
        assert!(!timer.stop());
    }

    #[test]
    fn fires_once_per_period() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(2));
        timer.start(now);

        assert!(!timer.fire_if_due(now + Duration::from_millis(1_999)));
        assert!(timer.fire_if_due(now + Duration::from_secs(2)));
        assert!(!timer.fire_if_due(now + Duration::from_secs(3)));
        assert!(timer.fire_if_due(now + Duration::from_secs(4)));
    }

    #[test]
    fn missed_ticks_collapse() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(1));
        timer.start(now);

        assert!(timer.fire_if_due(now + Duration::from_secs(10)));
        assert!(!timer.fire_if_due(now + Duration::from_millis(10_500)));
        assert_eq!(timer.next_due(), Some(now + Duration::from_secs(11)));
    }

    #[test]
    fn stopped_timer_never_fires() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_millis(10));
        assert!(!timer.fire_if_due(now + Duration::from_secs(1)));
    }
}
