//! Overdue calculation
//!
//! Pure date arithmetic used for display and reporting. Nothing here
//! mutates state or triggers an automatic return.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Due date for a loan starting on `loan_date` with a return window of
/// `days_to_return` days.
pub fn due_date(loan_date: NaiveDate, days_to_return: i64) -> NaiveDate {
    loan_date + Duration::days(days_to_return)
}

/// Whole days remaining until midnight of the due date, rounded up.
/// Negative once the due date has passed.
pub fn days_remaining(due_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let due_midnight = due_date.and_time(NaiveTime::MIN).and_utc();
    let seconds = (due_midnight - now).num_seconds();
    (seconds + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY)
}

/// A loan is overdue when its due date lies strictly in the past.
pub fn is_overdue(due_date: NaiveDate, now: DateTime<Utc>) -> bool {
    days_remaining(due_date, now) < 0
}
