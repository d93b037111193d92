use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

use crate::snapshot::month_name;

/// Source of "now" for period defaults and import stamps.
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;

    fn current_year(&self) -> i32 {
        self.today().year()
    }

    fn current_month_name(&self) -> &'static str {
        month_name(self.today().month()).unwrap_or("January")
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Pins the calendar date. `now()` still advances within that day so import
/// stamps keep their insertion order.
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(Utc::now().time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_configured_period() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2026, 3, 10).expect("date"));
        assert_eq!(clock.current_year(), 2026);
        assert_eq!(clock.current_month_name(), "March");
        assert_eq!(clock.now().date_naive(), clock.today());
    }
}
