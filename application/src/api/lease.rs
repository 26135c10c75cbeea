//! [`Lease`]-related definitions.

use std::future;

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{command, domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    define_error, AsError, Context, Error,
};

/// A lease contract of a `Property` between its owner and a tenant.
#[derive(Clone, Debug, From)]
pub struct Lease {
    /// ID of this [`Lease`].
    id: Id,

    /// Underlying [`domain::Lease`].
    lease: OnceCell<domain::Lease>,
}

impl From<domain::Lease> for Lease {
    fn from(lease: domain::Lease) -> Self {
        Self {
            id: lease.id.into(),
            lease: OnceCell::new_with(Some(lease)),
        }
    }
}

impl Lease {
    /// Creates a new [`Lease`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Lease`] with the provided ID exists,
    /// otherwise accessing this [`Lease`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            lease: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Lease`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Lease`] doesn't exist.
    pub(crate) async fn lease(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Lease, Error> {
        let id = self.id.into();
        self.lease
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::lease::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|l| {
                        future::ready(l.ok_or_else(|| {
                            api::query::LeaseError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A lease contract of a `Property` between its owner and a tenant.
#[graphql_object(context = Context)]
impl Lease {
    /// Unique identifier of this `Lease`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Human-readable number of this `Lease`.
    pub async fn number(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.lease(ctx).await?.number.to_string())
    }

    /// Leased `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.property",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn property(
        &self,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let id = self.lease(ctx).await?.property_id;
        #[expect(unsafe_code, reason = "leased `Property` always exists")]
        let property = unsafe { api::Property::new_unchecked(id) };
        Ok(property)
    }

    /// `User` owning the leased `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.owner",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn owner(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.lease(ctx).await?.owner_id;
        #[expect(unsafe_code, reason = "`Lease` owner always exists")]
        let owner = unsafe { api::User::new_unchecked(id) };
        Ok(owner)
    }

    /// `User` renting the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.tenant",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn tenant(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.lease(ctx).await?.tenant_id;
        #[expect(unsafe_code, reason = "`Lease` tenant always exists")]
        let tenant = unsafe { api::User::new_unchecked(id) };
        Ok(tenant)
    }

    /// `RentalRequest` this `Lease` was created from, if any.
    pub async fn rental_request(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::RentalRequest>, Error> {
        let id = self.lease(ctx).await?.rental_request_id;
        #[expect(unsafe_code, reason = "referenced request always exists")]
        let request =
            id.map(|id| unsafe { api::RentalRequest::new_unchecked(id) });
        Ok(request)
    }

    /// Status of this `Lease`.
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.lease(ctx).await?.status.into())
    }

    /// First day of this `Lease`.
    pub async fn start_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.lease(ctx).await?.start_date)
    }

    /// Last day of this `Lease`.
    pub async fn end_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.lease(ctx).await?.end_date)
    }

    /// Number of monthly periods this `Lease` spans.
    pub async fn duration_months(&self, ctx: &Context) -> Result<i32, Error> {
        let months = self.lease(ctx).await?.duration_months();
        Ok(i32::try_from(months).unwrap_or(i32::MAX))
    }

    /// Number of days left until this `Lease` ends, if it's active.
    pub async fn days_to_expire(
        &self,
        ctx: &Context,
    ) -> Result<Option<i32>, Error> {
        Ok(self
            .lease(ctx)
            .await?
            .days_to_expire(Date::today())
            .map(|d| i32::try_from(d).unwrap_or(i32::MAX)))
    }

    /// Monetary terms of this `Lease`.
    pub async fn terms(&self, ctx: &Context) -> Result<Terms, Error> {
        Ok(self.lease(ctx).await?.terms.into())
    }

    /// `DateTime` when the owner signed this `Lease`.
    pub async fn owner_signed_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self
            .lease(ctx)
            .await?
            .owner_signature
            .as_ref()
            .map(|s| s.signed_at.coerce()))
    }

    /// `DateTime` when the tenant signed this `Lease`.
    pub async fn tenant_signed_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self
            .lease(ctx)
            .await?
            .tenant_signature
            .as_ref()
            .map(|s| s.signed_at.coerce()))
    }

    /// Indicator whether both parties signed this `Lease`.
    pub async fn is_fully_signed(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.lease(ctx).await?.is_fully_signed())
    }

    /// General terms and conditions of this `Lease`.
    pub async fn conditions(&self, ctx: &Context) -> Result<Conditions, Error> {
        Ok(self.lease(ctx).await?.conditions.clone().into())
    }

    /// Special clauses of this `Lease`, if any.
    pub async fn special_clauses(
        &self,
        ctx: &Context,
    ) -> Result<Option<Clauses>, Error> {
        Ok(self.lease(ctx).await?.special_clauses.clone().map(Into::into))
    }

    /// Scheduled `Payment`s of this `Lease`, in their sequence order.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.payments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        ctx.service()
            .execute(query::payments::OfLease::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ps| ps.into_iter().map(Into::into).collect())
    }

    /// Signature records of this `Lease`, oldest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Lease.signatures",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn signatures(
        &self,
        ctx: &Context,
    ) -> Result<Vec<SignatureRecord>, Error> {
        ctx.service()
            .execute(query::lease::Signatures::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rs| rs.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Lease` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.lease(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Lease` was last updated.
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.lease(ctx).await?.updated_at.coerce())
    }
}

/// Monetary terms of a `Lease`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "LeaseTerms")]
pub struct Terms {
    /// Monthly rent.
    pub rent: Money,

    /// Monthly administration fee.
    pub administration_fee: Money,

    /// Amount due every month: rent plus administration fee.
    pub monthly_total: Money,

    /// Security deposit.
    pub deposit: Money,

    /// Day of month the monthly payments are due.
    pub due_day: i32,
}

impl From<domain::lease::Terms> for Terms {
    fn from(terms: domain::lease::Terms) -> Self {
        Self {
            rent: terms.rent,
            administration_fee: terms.administration_fee,
            monthly_total: terms.monthly_total(),
            deposit: terms.deposit,
            due_day: terms.due_day.day().into(),
        }
    }
}

/// Monetary terms of a `Lease` to be drafted.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "LeaseTermsInput")]
pub struct TermsInput {
    /// Monthly rent.
    pub rent: Money,

    /// Monthly administration fee.
    pub administration_fee: Money,

    /// Security deposit.
    pub deposit: Money,

    /// Day of month the monthly payments are due, from 1 to 31.
    ///
    /// Defaults to 5.
    pub due_day: Option<i32>,
}

impl TryFrom<TermsInput> for domain::lease::Terms {
    type Error = TermsError;

    fn try_from(input: TermsInput) -> Result<Self, Self::Error> {
        let due_day = input
            .due_day
            .map(|d| {
                i16::try_from(d)
                    .ok()
                    .and_then(domain::lease::DueDay::new)
                    .ok_or(TermsError::DueDay)
            })
            .transpose()?
            .unwrap_or(domain::lease::DueDay::DEFAULT);
        Ok(Self {
            rent: input.rent,
            administration_fee: input.administration_fee,
            deposit: input.deposit,
            due_day,
        })
    }
}

define_error! {
    enum TermsError {
        #[code = "INVALID_DUE_DAY"]
        #[status = BAD_REQUEST]
        #[message = "Due day must be a day of month from 1 to 31"]
        DueDay,
    }
}

/// Append-only record of a `Lease` signing event.
#[derive(Clone, Debug, From)]
pub struct SignatureRecord(domain::lease::signature::Record);

/// Append-only record of a `Lease` signing event.
#[graphql_object(name = "LeaseSignatureRecord", context = Context)]
impl SignatureRecord {
    /// `User` who signed the `Lease`.
    #[must_use]
    pub fn signer(&self) -> api::User {
        #[expect(unsafe_code, reason = "signer always exists")]
        unsafe {
            api::User::new_unchecked(self.0.signer_id)
        }
    }

    /// `LeaseParty` the signer takes.
    #[must_use]
    pub fn party(&self) -> Party {
        self.0.party.into()
    }

    /// IP address the signature was submitted from, if known.
    #[must_use]
    pub fn ip_address(&self) -> Option<String> {
        self.0.ip_address.map(|ip| ip.to_string())
    }

    /// User agent the signature was submitted with, if known.
    #[must_use]
    pub fn user_agent(&self) -> Option<String> {
        self.0.user_agent.as_ref().map(ToString::to_string)
    }

    /// `DateTime` when the `Lease` was signed.
    #[must_use]
    pub fn signed_at(&self) -> DateTime {
        self.0.signed_at.coerce()
    }
}

/// Result of a `Lease` signing.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "SignLeaseResult")]
pub struct SignResult {
    /// Signed `Lease`.
    pub lease: Lease,

    /// Outcome of the signing.
    pub signing: Signing,

    /// `Payment`s scheduled on the `Lease` activation.
    pub payments: Vec<api::Payment>,
}

impl From<command::sign_lease::Output> for SignResult {
    fn from(output: command::sign_lease::Output) -> Self {
        let command::sign_lease::Output {
            lease,
            signing,
            payments,
        } = output;
        Self {
            lease: lease.into(),
            signing: signing.into(),
            payments: payments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Unique identifier of a `Lease`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::lease::Id)]
#[into(domain::lease::Id)]
#[graphql(name = "LeaseId", transparent)]
pub struct Id(Uuid);

/// General terms and conditions of a `Lease`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "LeaseConditions",
    with = scalar::Via::<domain::lease::Conditions>,
)]
pub struct Conditions(domain::lease::Conditions);

/// Special clauses of a `Lease`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "LeaseClauses",
    with = scalar::Via::<domain::lease::Clauses>,
)]
pub struct Clauses(domain::lease::Clauses);

/// Data of a `Lease` signature (for example, an encoded image).
#[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
#[graphql(
    name = "LeaseSignatureData",
    with = scalar::Via::<domain::lease::signature::Data>,
)]
pub struct SignatureData(domain::lease::signature::Data);

/// Status of a `Lease`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "LeaseStatus")]
pub enum Status {
    /// `Lease` is being drafted by its owner.
    Draft,

    /// `Lease` awaits signatures of its parties.
    PendingSignature,

    /// `Lease` is signed by both parties and in force.
    Active,

    /// `Lease` has reached its end date.
    Expired,

    /// `Lease` was finalized by its owner.
    Finalized,

    /// `Lease` was cancelled by its owner.
    Cancelled,
}

impl From<domain::lease::Status> for Status {
    fn from(status: domain::lease::Status) -> Self {
        use domain::lease::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::PendingSignature => Self::PendingSignature,
            S::Active => Self::Active,
            S::Expired => Self::Expired,
            S::Finalized => Self::Finalized,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for domain::lease::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::PendingSignature => Self::PendingSignature,
            Status::Active => Self::Active,
            Status::Expired => Self::Expired,
            Status::Finalized => Self::Finalized,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

/// Party of a `Lease`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "LeaseParty")]
pub enum Party {
    /// Owner of the leased `Property`.
    Owner,

    /// Tenant renting the `Property`.
    Tenant,
}

impl From<domain::lease::Party> for Party {
    fn from(party: domain::lease::Party) -> Self {
        match party {
            domain::lease::Party::Owner => Self::Owner,
            domain::lease::Party::Tenant => Self::Tenant,
        }
    }
}

/// Outcome of signing a `Lease`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "LeaseSigning")]
pub enum Signing {
    /// `Lease` is signed and awaits the signature of the other party.
    Signed,

    /// `Lease` is signed by both parties and became active.
    Activated,

    /// The party has already signed the `Lease` before.
    AlreadySigned,
}

impl From<domain::lease::Signing> for Signing {
    fn from(signing: domain::lease::Signing) -> Self {
        use domain::lease::Signing as S;
        match signing {
            S::Signed => Self::Signed,
            S::Activated => Self::Activated,
            S::AlreadySigned => Self::AlreadySigned,
        }
    }
}

/// Way of terminating a `Lease`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "LeaseTermination")]
pub enum Termination {
    /// `Lease` is cancelled before or during its term.
    Cancellation,

    /// `Lease` is finalized after fulfilling it.
    Finalization,
}

impl From<Termination> for domain::lease::Termination {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Cancellation => Self::Cancellation,
            Termination::Finalization => Self::Finalization,
        }
    }
}

define_list!(
    Lease,
    read = lease,
    total_count = service::query::leases::TotalCount,
    names = (
        "LeaseListCursor",
        "LeaseListEdge",
        "LeaseListConnection",
        "LeaseListPageInfo",
    ),
);
