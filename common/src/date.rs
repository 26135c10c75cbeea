//! Calendar [`Date`] utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{macros::format_description, Month};

/// Calendar date without a time zone.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Date(time::Date);

impl Date {
    /// Returns the current UTC [`Date`].
    #[must_use]
    pub fn today() -> Self {
        Self(time::OffsetDateTime::now_utc().date())
    }

    /// Creates a new [`Date`] out of the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Returns the month of this [`Date`] in `1..=12` range.
    #[must_use]
    pub fn month(self) -> u8 {
        self.0.month().into()
    }

    /// Returns the day of month of this [`Date`] in `1..=31` range.
    #[must_use]
    pub fn day(self) -> u8 {
        self.0.day()
    }

    /// Returns the number of days in the month of this [`Date`].
    #[must_use]
    pub fn days_in_month(self) -> u8 {
        time::util::days_in_year_month(self.0.year(), self.0.month())
    }

    /// Returns this [`Date`] with its day replaced by the provided one,
    /// clamped to the last day of the month.
    #[expect(clippy::missing_panics_doc, reason = "day is clamped")]
    #[must_use]
    pub fn with_day_clamped(self, day: u8) -> Self {
        let day = day.clamp(1, self.days_in_month());
        Self(self.0.replace_day(day).expect("day is clamped"))
    }

    /// Adds the provided number of calendar months to this [`Date`].
    ///
    /// The day of month is kept, unless the resulting month is shorter, in
    /// which case the last day of that month is used.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_add_months(self, months: u32) -> Option<Self> {
        let index = i64::from(self.0.year()) * 12
            + i64::from(self.month() - 1)
            + i64::from(months);
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u8::try_from(index.rem_euclid(12) + 1).ok()?;

        Self::from_ymd(year, month, 1).map(|d| d.with_day_clamped(self.day()))
    }

    /// Adds the provided (possibly negative) number of days to this [`Date`].
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.0.checked_add(time::Duration::days(days)).map(Self)
    }

    /// Returns the number of days passed from the `earlier` [`Date`] to this
    /// one.
    ///
    /// The result is negative if `earlier` is actually after this [`Date`].
    #[must_use]
    pub fn days_since(self, earlier: Self) -> i64 {
        (self.0 - earlier.0).whole_days()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

impl FromStr for Date {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| "invalid `Date`, expected `YYYY-MM-DD`")
    }
}

impl From<time::Date> for Date {
    fn from(d: time::Date) -> Self {
        Self(d)
    }
}

impl From<Date> for time::Date {
    fn from(d: Date) -> Self {
        d.0
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Date {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Date {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, w)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in a `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = super::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Date;

    fn date(s: &str) -> Date {
        Date::from_str(s).unwrap()
    }

    #[test]
    fn parses_and_formats() {
        let d = date("2024-02-29");
        assert_eq!((d.year(), d.month(), d.day()), (2024, 2, 29));
        assert_eq!(d.to_string(), "2024-02-29");

        assert!(Date::from_str("2023-02-29").is_err());
        assert!(Date::from_str("2024-13-01").is_err());
        assert!(Date::from_str("10.01.2024").is_err());
    }

    #[test]
    fn adds_months_clamping_to_month_end() {
        assert_eq!(
            date("2024-01-10").checked_add_months(1),
            Some(date("2024-02-10")),
        );
        assert_eq!(
            date("2024-01-31").checked_add_months(1),
            Some(date("2024-02-29")),
        );
        assert_eq!(
            date("2023-01-31").checked_add_months(1),
            Some(date("2023-02-28")),
        );
        assert_eq!(
            date("2024-01-31").checked_add_months(3),
            Some(date("2024-04-30")),
        );
        assert_eq!(
            date("2024-11-15").checked_add_months(2),
            Some(date("2025-01-15")),
        );
        assert_eq!(
            date("2024-05-20").checked_add_months(0),
            Some(date("2024-05-20")),
        );
    }

    #[test]
    fn anchored_months_do_not_drift() {
        let start = date("2024-01-31");

        assert_eq!(start.checked_add_months(1), Some(date("2024-02-29")));
        assert_eq!(start.checked_add_months(2), Some(date("2024-03-31")));
    }

    #[test]
    fn clamps_day() {
        assert_eq!(date("2024-02-01").with_day_clamped(31), date("2024-02-29"));
        assert_eq!(date("2024-04-01").with_day_clamped(31), date("2024-04-30"));
        assert_eq!(date("2024-04-01").with_day_clamped(5), date("2024-04-05"));
    }

    #[test]
    fn counts_days() {
        assert_eq!(date("2024-03-01").days_since(date("2024-02-28")), 2);
        assert_eq!(date("2024-02-28").days_since(date("2024-03-01")), -2);
        assert_eq!(
            date("2024-02-28").checked_add_days(2),
            Some(date("2024-03-01")),
        );
        assert_eq!(
            date("2024-03-01").checked_add_days(-1),
            Some(date("2024-02-29")),
        );
    }
}
