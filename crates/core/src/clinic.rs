//! Clinic calendar rules.
//!
//! Pure chrono arithmetic shared by the handlers, the slot store and the
//! window maintainer: the cancellation notice window, the bounds of a
//! clinic-local calendar day, and the grid of bookable slot starts.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

/// Minimum lead time, in hours, a patient must give to cancel a visit.
/// Staff cancellations are exempt.
pub const CANCEL_NOTICE_HOURS: i64 = 72;

/// First bookable hour of a working day, clinic-local.
pub const OPENING_HOUR: i64 = 10;

/// Hour the clinic closes; the last slot starts half an hour before.
pub const CLOSING_HOUR: i64 = 18;

/// Length of one slot in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Whether a patient may still cancel a visit starting at `slot_start`.
///
/// The boundary is inclusive: exactly 72 hours of notice is enough.
pub fn patient_may_cancel(slot_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    slot_start - now >= Duration::hours(CANCEL_NOTICE_HOURS)
}

/// Inclusive UTC bounds `[00:00:00, 23:59:59]` of the calendar day `date`
/// in the clinic's timezone.
pub fn day_bounds(date: NaiveDate, clinic_offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let start = midnight - Duration::seconds(clinic_offset.local_minus_utc() as i64);
    let end = start + Duration::days(1) - Duration::seconds(1);
    (start, end)
}

fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// All bookable slot starts in `[from, to)`, as UTC instants.
///
/// The grid is the clinic's working week: Monday through Friday,
/// half-hour starts from `OPENING_HOUR` up to (excluding) `CLOSING_HOUR`,
/// clinic-local time.
pub fn grid_starts(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    clinic_offset: FixedOffset,
) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    let mut day = from.with_timezone(&clinic_offset).date_naive();
    let last = to.with_timezone(&clinic_offset).date_naive();

    while day <= last {
        if is_working_day(day) {
            let mut minutes = OPENING_HOUR * 60;
            while minutes < CLOSING_HOUR * 60 {
                let local = day.and_time(NaiveTime::MIN) + Duration::minutes(minutes);
                let start = Utc.from_utc_datetime(&local)
                    - Duration::seconds(clinic_offset.local_minus_utc() as i64);
                if start >= from && start < to {
                    starts.push(start);
                }
                minutes += SLOT_MINUTES;
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    starts
}
