// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Sources of the current time.
//!
//! Drivers receive a `Clock` instead of querying the system time so that tests can pin "now",
//! which rental fees and session expiration both depend on.

use time::OffsetDateTime;

/// A source of the current time.
pub trait Clock {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Drops the sub-microsecond part of `ts`.
///
/// PostgreSQL stores timestamps with microsecond resolution, so anything finer would not survive
/// a round trip through the database.
fn truncate_to_micros(ts: OffsetDateTime) -> OffsetDateTime {
    ts - time::Duration::nanoseconds(i64::from(ts.nanosecond() % 1000))
}

/// Clock backed by the system time.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        truncate_to_micros(OffsetDateTime::now_utc())
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use time::{Date, Month, PrimitiveDateTime, Time};

    /// Builds a UTC timestamp from its components.  Panics on invalid input.
    pub fn utc_datetime(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> OffsetDateTime {
        let month = Month::try_from(month).unwrap();
        let date = Date::from_calendar_date(year, month, day).unwrap();
        let time = Time::from_hms(hour, minute, second).unwrap();
        PrimitiveDateTime::new(date, time).assume_utc()
    }

    /// Panics if `ts` has sub-microsecond precision, which the system clock never produces.
    fn check_micros(ts: OffsetDateTime) -> OffsetDateTime {
        assert_eq!(0, ts.nanosecond() % 1000, "Nanosecond precision not supported");
        ts
    }

    /// Clock that stays at a given time until told otherwise.
    #[derive(Debug)]
    pub struct SettableClock {
        now: Mutex<OffsetDateTime>,
    }

    impl SettableClock {
        /// Creates a clock stopped at `now`.
        pub fn new(now: OffsetDateTime) -> Self {
            Self { now: Mutex::new(check_micros(now)) }
        }

        /// Moves the clock to `now`, which can be in the past.
        pub fn set(&self, now: OffsetDateTime) {
            *self.now.lock().unwrap() = check_micros(now);
        }

        /// Moves the clock forward by `delta`.
        pub fn advance(&self, delta: Duration) {
            assert_eq!(0, delta.subsec_nanos() % 1000, "Nanosecond precision not supported");
            *self.now.lock().unwrap() += delta;
        }
    }

    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::panic::catch_unwind;
        use time::macros::datetime;

        #[test]
        fn test_utc_datetime() {
            assert_eq!(datetime!(2024-03-05 18:45:09 UTC), utc_datetime(2024, 3, 5, 18, 45, 9));
        }

        #[test]
        fn test_settable_clock_is_stopped() {
            let clock = SettableClock::new(datetime!(2024-03-05 18:45:09.250000 UTC));
            assert_eq!(clock.now_utc(), clock.now_utc());
            assert_eq!(datetime!(2024-03-05 18:45:09.250000 UTC), clock.now_utc());
        }

        #[test]
        fn test_settable_clock_set_and_advance() {
            let clock = SettableClock::new(datetime!(2024-03-05 18:45:00 UTC));

            clock.set(datetime!(2024-01-01 00:00:00.000001 UTC));
            assert_eq!(datetime!(2024-01-01 00:00:00.000001 UTC), clock.now_utc());

            clock.advance(Duration::from_secs(3 * 24 * 60 * 60));
            assert_eq!(datetime!(2024-01-04 00:00:00.000001 UTC), clock.now_utc());

            clock.advance(Duration::from_micros(999_999));
            assert_eq!(datetime!(2024-01-04 00:00:01 UTC), clock.now_utc());
        }

        #[test]
        fn test_settable_clock_rejects_nanoseconds() {
            catch_unwind(|| SettableClock::new(datetime!(2024-03-05 18:45:00.000000001 UTC)))
                .unwrap_err();

            let clock = SettableClock::new(datetime!(2024-03-05 18:45:00 UTC));
            catch_unwind(|| clock.set(datetime!(2024-03-05 18:45:00.123456789 UTC))).unwrap_err();

            let clock = SettableClock::new(datetime!(2024-03-05 18:45:00 UTC));
            catch_unwind(|| clock.advance(Duration::from_nanos(1))).unwrap_err();
        }
    }
}
