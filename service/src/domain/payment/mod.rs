//! [`Payment`] definitions.

pub mod schedule;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, Date, DateTimeOf, Money, Percent};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{lease, user};
#[cfg(doc)]
use crate::domain::{Lease, User};

/// Payment due under a [`Lease`] for one billing period.
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// Human-readable [`Number`] of this [`Payment`].
    pub number: Number,

    /// ID of the [`Lease`] this [`Payment`] is due under.
    pub lease_id: lease::Id,

    /// [`Sequence`] number of this [`Payment`] in its [`Lease`].
    pub sequence: Sequence,

    /// [`Concept`] of this [`Payment`].
    pub concept: Concept,

    /// [`Description`] of this [`Payment`], if any.
    pub description: Option<Description>,

    /// First day of the billing period.
    pub period_start: Date,

    /// Last day of the billing period.
    pub period_end: Date,

    /// [`Date`] this [`Payment`] is due.
    pub due_date: Date,

    /// Amount owed.
    pub amount: Money,

    /// Amount paid so far.
    pub amount_paid: Money,

    /// Late fee accrued.
    pub late_fee: Money,

    /// [`Date`] this [`Payment`] was paid first, if it was.
    pub paid_on: Option<Date>,

    /// [`Method`] of the last registered payment, if any.
    pub method: Option<Method>,

    /// [`Reference`] of the last registered payment, if any.
    pub reference: Option<Reference>,

    /// [`DateTime`] when an invoice was generated for this [`Payment`].
    pub invoiced_at: Option<InvoiceDateTime>,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,
}

impl Payment {
    /// Creates a new pending [`Payment`] for the provided
    /// [`schedule::Period`] of a [`Lease`].
    #[must_use]
    pub fn scheduled(
        number: Number,
        lease_id: lease::Id,
        amount: Money,
        period: schedule::Period,
    ) -> Self {
        let schedule::Period {
            sequence,
            start,
            end,
            due_date,
        } = period;

        Self {
            id: Id::new(),
            number,
            lease_id,
            sequence,
            concept: Concept(format!("Rent for month {sequence}")),
            description: None,
            period_start: start,
            period_end: end,
            due_date,
            amount,
            amount_paid: Money::zero(amount.currency),
            late_fee: Money::zero(amount.currency),
            paid_on: None,
            method: None,
            reference: None,
            invoiced_at: None,
            created_at: CreationDateTime::now(),
        }
    }

    /// Returns the total amount owed: the amount plus the late fee.
    #[must_use]
    pub fn total(&self) -> Money {
        Money {
            amount: self.amount.amount + self.late_fee.amount,
            currency: self.amount.currency,
        }
    }

    /// Returns the amount left to pay.
    #[must_use]
    pub fn balance(&self) -> Money {
        Money {
            amount: self.total().amount - self.amount_paid.amount,
            currency: self.amount.currency,
        }
    }

    /// Indicates whether this [`Payment`] is fully paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.amount_paid.amount >= self.total().amount
    }

    /// Indicates whether this [`Payment`] is past its due date without being
    /// fully paid.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        today > self.due_date && !self.is_paid()
    }

    /// Returns the number of days this [`Payment`] is overdue.
    #[must_use]
    pub fn overdue_days(&self, today: Date) -> i64 {
        if self.is_overdue(today) {
            today.days_since(self.due_date)
        } else {
            0
        }
    }

    /// Returns [`Status`] of this [`Payment`] as of the provided [`Date`].
    #[must_use]
    pub fn status(&self, today: Date) -> Status {
        if self.is_paid() {
            Status::Paid
        } else if self.amount_paid.is_positive() {
            Status::Partial
        } else if self.due_date < today {
            Status::Overdue
        } else {
            Status::Pending
        }
    }

    /// Recomputes the late fee of this [`Payment`] as of the provided
    /// [`Date`] with the provided daily rate.
    ///
    /// Fully paid [`Payment`]s keep their late fee.
    ///
    /// Returns `false` if the late fee didn't change.
    pub fn accrue_late_fee(&mut self, today: Date, daily_rate: Percent) -> bool {
        if !self.is_overdue(today) {
            return false;
        }
        let fee =
            late_fee(self.amount, daily_rate, self.overdue_days(today));
        if fee == self.late_fee {
            return false;
        }
        self.late_fee = fee;
        true
    }

    /// Applies the provided [`Registration`] to this [`Payment`].
    pub fn register(&mut self, registration: &Registration) {
        self.amount_paid.amount += registration.amount.amount;
        if self.paid_on.is_none() {
            self.paid_on = Some(registration.registered_at.date());
        }
        self.method = Some(registration.method);
        self.reference.clone_from(&registration.reference);
    }
}

/// Calculates the late fee of the `owed` amount being overdue for the
/// provided number of days.
///
/// The fee is simple (non-compounding) and rounded to cents.
#[must_use]
pub fn late_fee(owed: Money, daily_rate: Percent, overdue_days: i64) -> Money {
    let days = Decimal::from(overdue_days.max(0));
    Money {
        amount: (owed.amount * daily_rate.fraction() * days).round_dp(2),
        currency: owed.currency,
    }
}

/// Payment registered against a [`Payment`].
///
/// [`Registration`]s are immutable once created.
#[derive(Clone, Debug)]
pub struct Registration {
    /// ID of this [`Registration`].
    pub id: RegistrationId,

    /// ID of the [`Payment`] this [`Registration`] is made against.
    pub payment_id: Id,

    /// Amount paid.
    pub amount: Money,

    /// [`Method`] of paying.
    pub method: Method,

    /// [`Reference`] of the transaction, if any.
    pub reference: Option<Reference>,

    /// [`Notes`] of the registrar, if any.
    pub notes: Option<Notes>,

    /// ID of the [`User`] who registered this [`Registration`].
    pub registrar_id: user::Id,

    /// [`DateTime`] when this [`Registration`] was made.
    pub registered_at: RegistrationDateTime,
}

/// ID of a [`Payment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new time-ordered [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// ID of a [`Registration`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new time-ordered [`RegistrationId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Human-readable number of a [`Payment`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Formats a new [`Number`] out of the provided year and serial number.
    #[must_use]
    pub fn new(year: i32, serial: i64) -> Self {
        Self(format!("PAG-{year}-{serial:06}"))
    }
}

/// Sequence number of a [`Payment`] in its [`Lease`], starting from `1`.
pub type Sequence = i32;

define_text! {
    #[doc = "Concept a [`Payment`] is charged for."]
    struct Concept(..= 200);
}

define_text! {
    #[doc = "Description of a [`Payment`]."]
    struct Description(..= 2000);
}

define_text! {
    #[doc = "Reference of a payment transaction."]
    struct Reference(..= 100);
}

define_text! {
    #[doc = "Notes attached to a [`Registration`]."]
    struct Notes(..= 2000);
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "[`Payment`] is not due yet and nothing is paid."]
        Pending = 1,

        #[doc = "[`Payment`] is fully paid."]
        Paid = 2,

        #[doc = "[`Payment`] is past its due date and nothing is paid."]
        Overdue = 3,

        #[doc = "[`Payment`] is paid partially."]
        Partial = 4,
    }
}

define_kind! {
    #[doc = "Method of paying a [`Payment`]."]
    enum Method {
        #[doc = "Cash."]
        Cash = 1,

        #[doc = "Bank transfer."]
        Transfer = 2,

        #[doc = "Debit or credit card."]
        Card = 3,

        #[doc = "Check."]
        Check = 4,

        #[doc = "Any other method."]
        Other = 5,
    }
}

/// Marker type describing invoicing of a [`Payment`].
#[derive(Clone, Copy, Debug)]
pub struct Invoicing;

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when an invoice was generated for a [`Payment`].
pub type InvoiceDateTime = DateTimeOf<(Payment, Invoicing)>;

/// [`DateTime`] when a [`Registration`] was made.
pub type RegistrationDateTime = DateTimeOf<(Registration, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, DateTime, Money, Percent};

    use crate::domain::{lease, user};

    use super::{
        late_fee, schedule, Method, Number, Payment, Registration,
        RegistrationId, Status,
    };

    fn date(s: &str) -> Date {
        Date::from_str(s).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn rate() -> Percent {
        Percent::from_str("0.1").unwrap()
    }

    fn payment(due: &str) -> Payment {
        Payment::scheduled(
            Number::new(2024, 1),
            lease::Id::new(),
            money("1700000COP"),
            schedule::Period {
                sequence: 1,
                start: date("2024-01-10"),
                end: date("2024-02-09"),
                due_date: date(due),
            },
        )
    }

    fn registration(p: &Payment, amount: &str) -> Registration {
        Registration {
            id: RegistrationId::new(),
            payment_id: p.id,
            amount: money(amount),
            method: Method::Transfer,
            reference: None,
            notes: None,
            registrar_id: user::Id::new(),
            registered_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn scheduled_payment_is_pending() {
        let p = payment("2024-02-05");

        assert_eq!(p.concept.as_ref(), "Rent for month 1");
        assert_eq!(p.number.to_string(), "PAG-2024-000001");
        assert_eq!(p.status(date("2024-02-01")), Status::Pending);
        assert_eq!(p.status(date("2024-02-05")), Status::Pending);
        assert_eq!(p.balance(), money("1700000COP"));
    }

    #[test]
    fn status_depends_on_paid_amount_and_due_date() {
        let mut p = payment("2024-02-05");
        assert_eq!(p.status(date("2024-02-06")), Status::Overdue);

        p.register(&registration(&p, "700000COP"));
        assert_eq!(p.status(date("2024-02-01")), Status::Partial);
        assert_eq!(p.status(date("2024-03-01")), Status::Partial);

        p.register(&registration(&p, "1000000COP"));
        assert_eq!(p.status(date("2024-03-01")), Status::Paid);
        assert!(!p.is_overdue(date("2024-03-01")));
    }

    #[test]
    fn late_fee_is_part_of_total() {
        let mut p = payment("2024-02-05");
        p.late_fee = money("1700COP");

        p.register(&registration(&p, "1700000COP"));
        assert_eq!(p.status(date("2024-02-01")), Status::Partial);
        assert_eq!(p.balance(), money("1700COP"));

        p.register(&registration(&p, "1700COP"));
        assert_eq!(p.status(date("2024-02-01")), Status::Paid);
    }

    #[test]
    fn first_registration_sets_paid_date_and_method() {
        let mut p = payment("2024-02-05");
        let first = registration(&p, "100COP");
        p.register(&first);

        assert_eq!(p.paid_on, Some(first.registered_at.date()));
        assert_eq!(p.method, Some(Method::Transfer));
        assert_eq!(p.amount_paid, money("100COP"));
    }

    #[test]
    fn calculates_late_fee() {
        assert_eq!(late_fee(money("1700000COP"), rate(), 10), money("17000COP"));
        assert_eq!(late_fee(money("1000COP"), rate(), 0), money("0COP"));
        assert_eq!(late_fee(money("1000COP"), rate(), -3), money("0COP"));
        assert_eq!(late_fee(money("333.33USD"), rate(), 1), money("0.33USD"));
    }

    #[test]
    fn late_fee_is_recomputed_from_owed_amount() {
        let mut p = payment("2024-02-05");

        assert!(!p.accrue_late_fee(date("2024-02-05"), rate()));
        assert!(p.accrue_late_fee(date("2024-02-15"), rate()));
        assert_eq!(p.late_fee, money("17000COP"));

        assert!(!p.accrue_late_fee(date("2024-02-15"), rate()));
        assert!(p.accrue_late_fee(date("2024-02-25"), rate()));
        assert_eq!(p.late_fee, money("34000COP"));
        assert_eq!(p.overdue_days(date("2024-02-25")), 20);
    }

    #[test]
    fn paid_payment_keeps_late_fee() {
        let mut p = payment("2024-02-05");
        assert!(p.accrue_late_fee(date("2024-02-15"), rate()));

        p.register(&registration(&p, "1717000COP"));
        assert!(!p.accrue_late_fee(date("2024-03-15"), rate()));
        assert_eq!(p.late_fee, money("17000COP"));
        assert_eq!(p.status(date("2024-03-15")), Status::Paid);
    }
}
