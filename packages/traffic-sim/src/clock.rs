//! Injectable wall-clock source.
//!
//! CoT timestamps and `lastUpdated` fields need `DateTime<Utc>::now()` in
//! production but a fixed, steppable clock in tests — otherwise assertions on
//! generated XML/JSON would be timing-dependent. Grounded on the same
//! dependency-injection shape the teacher uses for its scenario step function
//! (an explicit `dt` rather than a hidden wall-clock read).

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

pub trait SimClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl SimClock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only advances when told to. `millis` is stored atomically so
/// the clock can be shared (`Arc<FixedClock>`) across the tick worker and
/// test assertions without a lock.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { millis: AtomicI64::new(start.timestamp_millis()) }
    }

    pub fn advance(&self, delta: std::time::Duration) {
        self.millis.fetch_add(delta.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl SimClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_only_moves_on_advance() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::at(start);
        assert_eq!(clock.now(), start);
        clock.advance(std::time::Duration::from_secs(5));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
    }
}
