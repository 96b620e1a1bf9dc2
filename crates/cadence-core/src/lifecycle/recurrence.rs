//! Recurrence expansion.

use chrono::{Days, Months, NaiveDate};

use crate::model::task::{Recurrence, RecurrenceKind};

/// Date of the next occurrence after `current` under `rule`.
///
/// - daily: `interval` days later
/// - weekly: `7 × interval` days later
/// - monthly: `interval` calendar months later, clamped to the last day of
///   a shorter target month (Jan 31 + 1 month = Feb 28/29)
///
/// Returns `None` for an unknown rule kind, a zero interval, or a result
/// outside chrono's date range.
#[must_use]
pub fn next_occurrence(current: NaiveDate, rule: Recurrence) -> Option<NaiveDate> {
    if rule.interval == 0 {
        return None;
    }
    match rule.kind {
        RecurrenceKind::Daily => current.checked_add_days(Days::new(u64::from(rule.interval))),
        RecurrenceKind::Weekly => {
            current.checked_add_days(Days::new(u64::from(rule.interval) * 7))
        }
        RecurrenceKind::Monthly => current.checked_add_months(Months::new(rule.interval)),
        RecurrenceKind::Unknown => None,
    }
}
