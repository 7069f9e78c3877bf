use std::sync::{Arc, Mutex};
use chrono::{Duration, NaiveDateTime, Utc};

// Clock supplies wall-clock timestamps to the engine so tests can control time.
pub trait Clock: Sync + Send {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        match self.current.lock() {
            Ok(mut current) => *current = at,
            Err(poisoned) => *poisoned.into_inner() = at,
        }
    }

    pub fn advance(&self, by: Duration) {
        match self.current.lock() {
            Ok(mut current) => *current += by,
            Err(poisoned) => *poisoned.into_inner() += by,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.current.lock() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime};
    use crate::core::clock::{Clock, ManualClock, SystemClock};
    use crate::utils::date::DATE_FMT;

    #[tokio::test]
    async fn test_should_advance_manual_clock() {
        let start = NaiveDateTime::parse_from_str("2023-04-11T11:11:11", DATE_FMT).expect("should parse date");
        let clock = ManualClock::new(start);
        let shared = clock.clone();
        clock.advance(Duration::minutes(5));
        assert_eq!(start + Duration::minutes(5), shared.now());
        shared.set(start);
        assert_eq!(start, clock.now());
    }

    #[tokio::test]
    async fn test_should_read_system_clock() {
        let first = SystemClock.now();
        let second = SystemClock.now();
        assert!(second >= first);
    }
}
