//! Quiz clock, counting up for untimed tests and down for timed ones.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerDirection {
    CountUp,
    CountDown { limit_secs: u64 },
}

/// Result of advancing the clock by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    /// The countdown is at zero. Returned by the tick that reaches zero and
    /// by every tick after it; the clock does not move past the limit.
    Expired,
}

/// A one-second resolution clock. Stores elapsed seconds only; remaining
/// time is derived, so it can never go below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizTimer {
    direction: TimerDirection,
    elapsed_secs: u64,
}

impl QuizTimer {
    pub fn count_up() -> Self {
        Self {
            direction: TimerDirection::CountUp,
            elapsed_secs: 0,
        }
    }

    pub fn countdown(limit_secs: u64) -> Self {
        Self {
            direction: TimerDirection::CountDown { limit_secs },
            elapsed_secs: 0,
        }
    }

    /// Countdown when a limit is given, count-up otherwise.
    pub fn from_limit(limit_secs: Option<u64>) -> Self {
        limit_secs.map_or_else(Self::count_up, Self::countdown)
    }

    pub fn direction(&self) -> TimerDirection {
        self.direction
    }

    pub fn tick(&mut self) -> TickOutcome {
        match self.direction {
            TimerDirection::CountUp => {
                self.elapsed_secs += 1;
                TickOutcome::Advanced
            }
            TimerDirection::CountDown { limit_secs } => {
                if self.elapsed_secs >= limit_secs {
                    return TickOutcome::Expired;
                }
                self.elapsed_secs += 1;
                if self.elapsed_secs == limit_secs {
                    TickOutcome::Expired
                } else {
                    TickOutcome::Advanced
                }
            }
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Seconds left on a countdown, `None` when counting up.
    pub fn remaining_secs(&self) -> Option<u64> {
        match self.direction {
            TimerDirection::CountUp => None,
            TimerDirection::CountDown { limit_secs } => {
                Some(limit_secs.saturating_sub(self.elapsed_secs))
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs() == Some(0)
    }
}

/// `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Inverse of [`format_clock`]: `MM:SS` or `HH:MM:SS` to seconds.
pub fn parse_clock(clock: &str) -> Option<u64> {
    let parts = clock
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    match parts.as_slice() {
        [minutes, seconds] if *seconds < 60 => Some(minutes * 60 + seconds),
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => {
            Some(hours * 3600 + minutes * 60 + seconds)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_up_never_expires() {
        let mut timer = QuizTimer::count_up();
        for _ in 0..5000 {
            assert_eq!(timer.tick(), TickOutcome::Advanced);
        }
        assert_eq!(timer.elapsed_secs(), 5000);
        assert_eq!(timer.remaining_secs(), None);
        assert!(!timer.is_expired());
    }

    #[test]
    fn countdown_expires_on_the_last_second() {
        let mut timer = QuizTimer::countdown(3);
        assert_eq!(timer.tick(), TickOutcome::Advanced);
        assert_eq!(timer.tick(), TickOutcome::Advanced);
        assert_eq!(timer.remaining_secs(), Some(1));
        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert_eq!(timer.remaining_secs(), Some(0));
        assert!(timer.is_expired());
    }

    #[test]
    fn countdown_stays_at_zero() {
        let mut timer = QuizTimer::countdown(1);
        assert_eq!(timer.tick(), TickOutcome::Expired);
        for _ in 0..10 {
            assert_eq!(timer.tick(), TickOutcome::Expired);
        }
        assert_eq!(timer.elapsed_secs(), 1);
        assert_eq!(timer.remaining_secs(), Some(0));
    }

    #[test]
    fn zero_limit_expires_on_first_tick() {
        let mut timer = QuizTimer::from_limit(Some(0));
        assert!(timer.is_expired());
        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert_eq!(timer.elapsed_secs(), 0);
    }

    #[test]
    fn from_limit_picks_direction() {
        assert_eq!(
            QuizTimer::from_limit(None).direction(),
            TimerDirection::CountUp
        );
        assert_eq!(
            QuizTimer::from_limit(Some(600)).direction(),
            TimerDirection::CountDown { limit_secs: 600 }
        );
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(20 * 60), "20:00");
        assert_eq!(format_clock(3725), "01:02:05");
    }

    #[test]
    fn clock_parsing() {
        assert_eq!(parse_clock("01:05"), Some(65));
        assert_eq!(parse_clock(" 20:00 "), Some(1200));
        assert_eq!(parse_clock("01:02:05"), Some(3725));
        assert_eq!(parse_clock(&format_clock(4000)), Some(4000));
        assert_eq!(parse_clock("1:75"), None);
        assert_eq!(parse_clock("abc"), None);
        assert_eq!(parse_clock("65"), None);
    }
}
