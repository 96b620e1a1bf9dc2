//! Time source abstraction.
//!
//! Every "today" in the engine comes from a [`Clock`], so MIT staleness,
//! streaks and weekly challenges can be pinned to a fixed date in tests.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveTime, Utc};
use std::cell::Cell;

/// Source of the current instant and calendar date.
pub trait Clock {
    /// Current wall-clock instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock backed by the host's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    /// Pin the clock to noon UTC on `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            now: Cell::new(noon_utc(date)),
        }
    }

    /// Move the clock to noon UTC on `date`.
    pub fn set_date(&self, date: NaiveDate) {
        self.now.set(noon_utc(date));
    }

    /// Advance the clock by whole days.
    pub fn advance_days(&self, days: u64) {
        let next = self
            .now
            .get()
            .checked_add_days(Days::new(days))
            .unwrap_or_else(|| self.now.get());
        self.now.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// The calendar day before `date`.
#[must_use]
pub fn yesterday_of(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::default()))
        .and_utc()
}
