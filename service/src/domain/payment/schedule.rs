//! Monthly payment schedule of a [`Lease`].
//!
//! Billing periods are anchored to the [`Lease`] start date: period `i` starts
//! exactly `i` calendar months after it (clamped to the last day of shorter
//! months), so periods never drift. A period ends one day before the next one
//! starts. Periods are emitted while their start doesn't exceed the [`Lease`]
//! end date.
//!
//! A payment is due on the [`DueDay`] of the month its period starts in if
//! the period starts before that day, or on the [`DueDay`] of the next month
//! otherwise. Due days beyond the length of a month fall onto its last day.

use common::Date;

use crate::domain::lease::DueDay;
#[cfg(doc)]
use crate::domain::Lease;

use super::Sequence;

/// Billing period of a scheduled payment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// 1-based [`Sequence`] number of this [`Period`] in its [`Lease`].
    pub sequence: Sequence,

    /// First day of this [`Period`].
    pub start: Date,

    /// Last day of this [`Period`].
    pub end: Date,

    /// [`Date`] the payment for this [`Period`] is due.
    pub due_date: Date,
}

/// Generates billing [`Period`]s of a [`Lease`] running from `start` to `end`
/// (inclusive).
#[must_use]
pub fn periods(start: Date, end: Date, due_day: DueDay) -> Vec<Period> {
    let mut periods = vec![];

    for i in 0u32.. {
        let Some(period_start) = start.checked_add_months(i) else {
            break;
        };
        if period_start > end {
            break;
        }
        let Some(period_end) = start
            .checked_add_months(i + 1)
            .and_then(|next| next.checked_add_days(-1))
        else {
            break;
        };
        let Some(due_date) = due_date(period_start, due_day) else {
            break;
        };
        let Ok(sequence) = Sequence::try_from(i + 1) else {
            break;
        };

        periods.push(Period {
            sequence,
            start: period_start,
            end: period_end,
            due_date,
        });
    }

    periods
}

/// Calculates the due [`Date`] of a period starting on `period_start`.
///
/// [`None`] is returned on overflow.
#[must_use]
pub fn due_date(period_start: Date, due_day: DueDay) -> Option<Date> {
    if period_start.day() < due_day.day() {
        Some(period_start.with_day_clamped(due_day.day()))
    } else {
        period_start
            .checked_add_months(1)
            .map(|next| next.with_day_clamped(due_day.day()))
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Date;

    use crate::domain::lease::DueDay;

    use super::{due_date, periods, Period};

    fn date(s: &str) -> Date {
        Date::from_str(s).unwrap()
    }

    fn day(d: i16) -> DueDay {
        DueDay::new(d).unwrap()
    }

    #[test]
    fn generates_periods_until_end_date() {
        let actual = periods(date("2024-01-10"), date("2024-04-10"), day(5));

        assert_eq!(
            actual,
            [
                ("2024-01-10", "2024-02-09", "2024-02-05"),
                ("2024-02-10", "2024-03-09", "2024-03-05"),
                ("2024-03-10", "2024-04-09", "2024-04-05"),
                ("2024-04-10", "2024-05-09", "2024-05-05"),
            ]
            .into_iter()
            .zip(1..)
            .map(|((start, end, due), sequence)| Period {
                sequence,
                start: date(start),
                end: date(end),
                due_date: date(due),
            })
            .collect::<Vec<_>>(),
        );
    }

    #[test]
    fn counts_partial_months() {
        let count = |start, end| periods(date(start), date(end), day(5)).len();

        assert_eq!(count("2024-01-01", "2024-12-31"), 12);
        assert_eq!(count("2024-01-01", "2025-01-01"), 13);
        assert_eq!(count("2024-01-10", "2024-01-10"), 1);
        assert_eq!(count("2024-01-10", "2025-01-09"), 12);
        assert_eq!(count("2024-01-10", "2024-01-09"), 0);
    }

    #[test]
    fn anchors_periods_to_start_date() {
        let actual = periods(date("2024-01-31"), date("2024-04-30"), day(5))
            .into_iter()
            .map(|p| (p.start, p.end))
            .collect::<Vec<_>>();

        assert_eq!(
            actual,
            [
                (date("2024-01-31"), date("2024-02-28")),
                (date("2024-02-29"), date("2024-03-30")),
                (date("2024-03-31"), date("2024-04-29")),
                (date("2024-04-30"), date("2024-05-30")),
            ],
        );
    }

    #[test]
    fn due_date_rules() {
        for (start, due_day, expected) in [
            // Period starts before the due day: due in the same month.
            ("2024-01-01", 5, "2024-01-05"),
            ("2024-01-04", 5, "2024-01-05"),
            // Period starts on or after the due day: due in the next month.
            ("2024-01-05", 5, "2024-02-05"),
            ("2024-01-10", 5, "2024-02-05"),
            ("2024-12-20", 5, "2025-01-05"),
            // Month-end due days clamp to the last day of shorter months.
            ("2024-01-01", 31, "2024-01-31"),
            ("2024-02-01", 31, "2024-02-29"),
            ("2023-02-01", 29, "2023-02-28"),
            ("2024-04-01", 31, "2024-04-30"),
            ("2024-02-01", 30, "2024-02-29"),
            ("2024-01-31", 29, "2024-02-29"),
            ("2024-01-31", 30, "2024-02-29"),
            ("2024-01-31", 31, "2024-02-29"),
            ("2024-03-30", 30, "2024-04-30"),
            ("2024-03-30", 31, "2024-03-31"),
            ("2024-01-30", 31, "2024-01-31"),
        ] {
            assert_eq!(
                due_date(date(start), day(due_day)),
                Some(date(expected)),
                "period start: {start}, due day: {due_day}",
            );
        }
    }

    #[test]
    fn due_dates_follow_month_end_through_year() {
        let dues = periods(date("2024-01-01"), date("2024-06-01"), day(31))
            .into_iter()
            .map(|p| p.due_date.to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            dues,
            [
                "2024-01-31",
                "2024-02-29",
                "2024-03-31",
                "2024-04-30",
                "2024-05-31",
                "2024-06-30",
            ],
        );
    }
}
