//! [`Lease`] definitions.

pub mod signature;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    payment::schedule, property, rental_request, user, Property,
};
#[cfg(doc)]
use crate::domain::{RentalRequest, User};

pub use self::signature::Signature;

/// Lease contract of a [`Property`] between its owner and a tenant.
#[derive(Clone, Debug)]
pub struct Lease {
    /// ID of this [`Lease`].
    pub id: Id,

    /// Human-readable [`Number`] of this [`Lease`].
    pub number: Number,

    /// ID of the leased [`Property`].
    pub property_id: property::Id,

    /// ID of the [`User`] owning the leased [`Property`].
    pub owner_id: user::Id,

    /// ID of the [`User`] renting the [`Property`].
    pub tenant_id: user::Id,

    /// ID of the [`RentalRequest`] this [`Lease`] was created from, if any.
    pub rental_request_id: Option<rental_request::Id>,

    /// [`Status`] of this [`Lease`].
    pub status: Status,

    /// First day of this [`Lease`].
    pub start_date: Date,

    /// Last day of this [`Lease`].
    pub end_date: Date,

    /// Monetary [`Terms`] of this [`Lease`].
    pub terms: Terms,

    /// [`Signature`] of the owner, once signed.
    pub owner_signature: Option<Signature>,

    /// [`Signature`] of the tenant, once signed.
    pub tenant_signature: Option<Signature>,

    /// [`Conditions`] of this [`Lease`].
    pub conditions: Conditions,

    /// Special [`Clauses`] of this [`Lease`], if any.
    pub special_clauses: Option<Clauses>,

    /// [`DateTime`] when this [`Lease`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Lease`] was last updated.
    pub updated_at: ModificationDateTime,
}

impl Lease {
    /// Creates a new draft [`Lease`] of the provided [`Property`] with the
    /// provided tenant, under the standard [`Conditions`].
    #[must_use]
    pub fn draft(
        number: Number,
        property: &Property,
        tenant_id: user::Id,
        (start_date, end_date): (Date, Date),
        terms: Terms,
    ) -> Self {
        Self {
            id: Id::new(),
            number,
            property_id: property.id,
            owner_id: property.owner_id,
            tenant_id,
            rental_request_id: None,
            status: Status::Draft,
            start_date,
            end_date,
            terms,
            owner_signature: None,
            tenant_signature: None,
            conditions: Conditions::standard(),
            special_clauses: None,
            created_at: CreationDateTime::now(),
            updated_at: ModificationDateTime::now(),
        }
    }

    /// Returns the [`Party`] the provided [`User`] takes in this [`Lease`], if
    /// any.
    #[must_use]
    pub fn party_of(&self, user_id: user::Id) -> Option<Party> {
        if user_id == self.owner_id {
            Some(Party::Owner)
        } else if user_id == self.tenant_id {
            Some(Party::Tenant)
        } else {
            None
        }
    }

    /// Returns ID of the [`User`] taking the provided [`Party`].
    #[must_use]
    pub fn user_of(&self, party: Party) -> user::Id {
        match party {
            Party::Owner => self.owner_id,
            Party::Tenant => self.tenant_id,
        }
    }

    /// Returns the [`Signature`] of the provided [`Party`], if it signed.
    #[must_use]
    pub fn signature_of(&self, party: Party) -> Option<&Signature> {
        match party {
            Party::Owner => self.owner_signature.as_ref(),
            Party::Tenant => self.tenant_signature.as_ref(),
        }
    }

    /// Indicates whether the provided [`User`] still has to sign this
    /// [`Lease`].
    #[must_use]
    pub fn requires_signature_of(&self, user_id: user::Id) -> bool {
        self.party_of(user_id)
            .is_some_and(|p| self.signature_of(p).is_none())
    }

    /// Indicates whether both parties signed this [`Lease`].
    #[must_use]
    pub fn is_fully_signed(&self) -> bool {
        self.owner_signature.is_some() && self.tenant_signature.is_some()
    }

    /// Indicates whether this [`Lease`] is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Indicates whether this [`Lease`] is active and covers the provided
    /// [`Date`].
    #[must_use]
    pub fn is_current(&self, today: Date) -> bool {
        self.is_active() && self.start_date <= today && today <= self.end_date
    }

    /// Returns number of days left until this [`Lease`] ends.
    ///
    /// [`None`] is returned if this [`Lease`] is not active.
    #[must_use]
    pub fn days_to_expire(&self, today: Date) -> Option<i64> {
        self.is_active().then(|| self.end_date.days_since(today))
    }

    /// Returns the duration of this [`Lease`] in billing months.
    #[must_use]
    pub fn duration_months(&self) -> usize {
        schedule::periods(self.start_date, self.end_date, self.terms.due_day)
            .len()
    }

    /// Returns the amount due every month under this [`Lease`].
    #[must_use]
    pub fn monthly_total(&self) -> Money {
        self.terms.monthly_total()
    }

    /// Indicates whether the [`Terms`] of this [`Lease`] may still be edited.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.status == Status::Draft
    }

    /// Submits this [`Lease`] for signing once its owner has finished editing
    /// it.
    ///
    /// Returns `false` if this [`Lease`] is not a draft.
    pub fn submit(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.status = Status::PendingSignature;
        self.updated_at = ModificationDateTime::now();
        true
    }

    /// Puts the provided [`Signature`] of the [`Party`] onto this [`Lease`].
    ///
    /// Once both parties have signed, this [`Lease`] becomes active.
    ///
    /// A [`Party`] that has signed already gets [`Signing::AlreadySigned`]
    /// whatever the [`Status`] of this [`Lease`] is.
    ///
    /// [`None`] is returned if this [`Lease`] cannot be signed anymore.
    pub fn sign(
        &mut self,
        party: Party,
        signature: Signature,
    ) -> Option<Signing> {
        if self.signature_of(party).is_some() {
            return Some(Signing::AlreadySigned);
        }
        if !matches!(self.status, Status::Draft | Status::PendingSignature) {
            return None;
        }

        match party {
            Party::Owner => self.owner_signature = Some(signature),
            Party::Tenant => self.tenant_signature = Some(signature),
        }
        self.updated_at = ModificationDateTime::now();

        if self.is_fully_signed() {
            self.status = Status::Active;
            Some(Signing::Activated)
        } else {
            self.status = Status::PendingSignature;
            Some(Signing::Signed)
        }
    }

    /// Terminates this [`Lease`] in the provided way.
    ///
    /// Returns `false` if this [`Lease`] cannot be terminated this way.
    pub fn terminate(&mut self, termination: Termination) -> bool {
        let status = match (termination, self.status) {
            (
                Termination::Cancellation,
                Status::Draft | Status::PendingSignature | Status::Active,
            ) => Status::Cancelled,
            (Termination::Finalization, Status::Active) => Status::Finalized,
            (
                Termination::Cancellation | Termination::Finalization,
                Status::Draft
                | Status::PendingSignature
                | Status::Active
                | Status::Expired
                | Status::Finalized
                | Status::Cancelled,
            ) => return false,
        };
        self.status = status;
        self.updated_at = ModificationDateTime::now();
        true
    }

    /// Expires this [`Lease`] if it's active and has ended before the
    /// provided [`Date`].
    ///
    /// Returns `false` if this [`Lease`] didn't expire.
    pub fn expire(&mut self, today: Date) -> bool {
        if !self.is_active() || self.end_date >= today {
            return false;
        }
        self.status = Status::Expired;
        self.updated_at = ModificationDateTime::now();
        true
    }
}

/// Monetary terms of a [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Terms {
    /// Monthly rent.
    pub rent: Money,

    /// Monthly administration fee.
    pub administration_fee: Money,

    /// Security deposit.
    pub deposit: Money,

    /// [`DueDay`] of monthly payments.
    pub due_day: DueDay,
}

impl Terms {
    /// Returns the amount due every month: rent plus administration fee.
    #[must_use]
    pub fn monthly_total(&self) -> Money {
        Money {
            amount: self.rent.amount + self.administration_fee.amount,
            currency: self.rent.currency,
        }
    }

    /// Indicates whether all the amounts of these [`Terms`] share one
    /// currency.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        property::same_currency(
            self.rent,
            &[self.administration_fee, self.deposit],
        )
    }
}

/// Day of month monthly payments of a [`Lease`] are due.
///
/// Days beyond the length of a month fall onto its last day.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct DueDay(i16);

impl DueDay {
    /// Default [`DueDay`] of a [`Lease`].
    pub const DEFAULT: Self = Self(5);

    /// Creates a new [`DueDay`] if the provided `day` is in `1..=31` range.
    #[must_use]
    pub fn new(day: i16) -> Option<Self> {
        (1..=31).contains(&day).then_some(Self(day))
    }

    /// Returns the day of month.
    #[must_use]
    pub fn day(self) -> u8 {
        u8::try_from(self.0).unwrap_or(1)
    }
}

/// ID of a [`Lease`].
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

/// Human-readable number of a [`Lease`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Formats a new [`Number`] out of the provided year and serial number.
    #[must_use]
    pub fn new(year: i32, serial: i64) -> Self {
        Self(format!("CTR-{year}-{serial:05}"))
    }
}

define_text! {
    #[doc = "General terms and conditions of a [`Lease`]."]
    struct Conditions(..= 20000);
}

define_text! {
    #[doc = "Special clauses of a [`Lease`]."]
    struct Clauses(..= 10000);
}

impl Conditions {
    /// Returns the standard [`Conditions`] applied to leases created out of
    /// accepted rental requests.
    #[must_use]
    pub fn standard() -> Self {
        Self("Standard lease terms and conditions apply.".to_owned())
    }
}

define_kind! {
    #[doc = "Status of a [`Lease`]."]
    enum Status {
        #[doc = "[`Lease`] is being drafted by its owner."]
        Draft = 1,

        #[doc = "[`Lease`] awaits signatures of its parties."]
        PendingSignature = 2,

        #[doc = "[`Lease`] is signed by both parties and in force."]
        Active = 3,

        #[doc = "[`Lease`] has reached its end date."]
        Expired = 4,

        #[doc = "[`Lease`] was finalized by its owner."]
        Finalized = 5,

        #[doc = "[`Lease`] was cancelled by its owner."]
        Cancelled = 6,
    }
}

define_kind! {
    #[doc = "Party of a [`Lease`]."]
    enum Party {
        #[doc = "Owner of the leased [`Property`]."]
        Owner = 1,

        #[doc = "Tenant renting the [`Property`]."]
        Tenant = 2,
    }
}

impl Party {
    /// Returns the counter-[`Party`] of this one.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Owner => Self::Tenant,
            Self::Tenant => Self::Owner,
        }
    }
}

/// Outcome of signing a [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Signing {
    /// [`Lease`] is signed and awaits the signature of the other [`Party`].
    Signed,

    /// [`Lease`] is signed by both parties and became active.
    Activated,

    /// The [`Party`] has already signed the [`Lease`] before.
    AlreadySigned,
}

/// Way of terminating a [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    /// [`Lease`] is cancelled before or during its term.
    Cancellation,

    /// [`Lease`] is finalized after fulfilling it.
    Finalization,
}

/// [`DateTime`] when a [`Lease`] was created.
pub type CreationDateTime = DateTimeOf<(Lease, unit::Creation)>;

/// [`DateTime`] when a [`Lease`] was last updated.
pub type ModificationDateTime = DateTimeOf<(Lease, unit::Modification)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, DateTime, Money};

    use crate::domain::{property, user};

    use super::{
        signature, Conditions, DueDay, Id, Lease, Number, Party, Signature,
        Signing, Status, Termination, Terms,
    };

    fn date(s: &str) -> Date {
        Date::from_str(s).unwrap()
    }

    fn lease(status: Status) -> Lease {
        Lease {
            id: Id::new(),
            number: Number::new(2024, 1),
            property_id: property::Id::new(),
            owner_id: user::Id::new(),
            tenant_id: user::Id::new(),
            rental_request_id: None,
            status,
            start_date: date("2024-01-10"),
            end_date: date("2024-04-10"),
            terms: Terms {
                rent: Money::from_str("1500000COP").unwrap(),
                administration_fee: Money::from_str("200000COP").unwrap(),
                deposit: Money::from_str("1500000COP").unwrap(),
                due_day: DueDay::new(5).unwrap(),
            },
            owner_signature: None,
            tenant_signature: None,
            conditions: Conditions::standard(),
            special_clauses: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn signature() -> Signature {
        Signature {
            data: signature::Data::new("data:image/png;base64,AAAA").unwrap(),
            signed_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn number_format() {
        assert_eq!(Number::new(2024, 7).to_string(), "CTR-2024-00007");
        assert_eq!(Number::new(2025, 123_456).to_string(), "CTR-2025-123456");
    }

    #[test]
    fn activates_only_with_both_signatures() {
        let mut l = lease(Status::Draft);

        assert_eq!(l.sign(Party::Tenant, signature()), Some(Signing::Signed));
        assert_eq!(l.status, Status::PendingSignature);
        assert!(!l.is_fully_signed());

        assert_eq!(
            l.sign(Party::Tenant, signature()),
            Some(Signing::AlreadySigned),
        );
        assert_eq!(l.status, Status::PendingSignature);

        assert_eq!(l.sign(Party::Owner, signature()), Some(Signing::Activated));
        assert_eq!(l.status, Status::Active);
        assert!(l.is_fully_signed());

        assert_eq!(
            l.sign(Party::Owner, signature()),
            Some(Signing::AlreadySigned),
        );
        assert_eq!(l.status, Status::Active);
    }

    #[test]
    fn rejects_unsigned_party_of_closed_lease() {
        for status in [Status::Active, Status::Expired, Status::Cancelled] {
            let mut l = lease(status);

            assert_eq!(l.sign(Party::Tenant, signature()), None);
            assert!(l.tenant_signature.is_none());
        }
    }

    #[test]
    fn resolves_parties() {
        let l = lease(Status::PendingSignature);

        assert_eq!(l.party_of(l.owner_id), Some(Party::Owner));
        assert_eq!(l.party_of(l.tenant_id), Some(Party::Tenant));
        assert_eq!(l.party_of(user::Id::new()), None);
        assert_eq!(l.user_of(Party::Owner.other()), l.tenant_id);

        assert!(l.requires_signature_of(l.owner_id));
        assert!(!l.requires_signature_of(user::Id::new()));
    }

    #[test]
    fn terminates() {
        let mut draft = lease(Status::Draft);
        assert!(!draft.terminate(Termination::Finalization));
        assert!(draft.terminate(Termination::Cancellation));
        assert_eq!(draft.status, Status::Cancelled);
        assert!(!draft.terminate(Termination::Cancellation));

        let mut active = lease(Status::Active);
        assert!(active.terminate(Termination::Finalization));
        assert_eq!(active.status, Status::Finalized);
        assert!(!active.terminate(Termination::Cancellation));
    }

    #[test]
    fn submits_only_drafts() {
        let mut l = lease(Status::Draft);
        assert!(l.submit());
        assert_eq!(l.status, Status::PendingSignature);
        assert!(!l.submit());
    }

    #[test]
    fn expires_after_end_date() {
        let mut l = lease(Status::Active);
        assert!(!l.expire(date("2024-04-10")));
        assert!(l.expire(date("2024-04-11")));
        assert_eq!(l.status, Status::Expired);

        let mut pending = lease(Status::PendingSignature);
        assert!(!pending.expire(date("2025-01-01")));
    }

    #[test]
    fn helpers() {
        let l = lease(Status::Active);

        assert_eq!(l.monthly_total(), Money::from_str("1700000COP").unwrap());
        assert_eq!(l.duration_months(), 4);
        assert!(l.is_current(date("2024-02-01")));
        assert!(!l.is_current(date("2024-04-11")));
        assert_eq!(l.days_to_expire(date("2024-04-01")), Some(9));
        assert_eq!(lease(Status::Draft).days_to_expire(date("2024-04-01")), None);
        assert!(l.terms.is_consistent());
    }
}
