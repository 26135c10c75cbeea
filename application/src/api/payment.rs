//! [`Payment`]-related definitions.

use std::future;

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{command, domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A payment due under a `Lease` for one billing period.
#[derive(Clone, Debug, From)]
pub struct Payment {
    /// ID of this [`Payment`].
    id: Id,

    /// Underlying [`domain::Payment`].
    payment: OnceCell<domain::Payment>,
}

impl From<domain::Payment> for Payment {
    fn from(payment: domain::Payment) -> Self {
        Self {
            id: payment.id.into(),
            payment: OnceCell::new_with(Some(payment)),
        }
    }
}

impl Payment {
    /// Creates a new [`Payment`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Payment`] with the provided ID exists,
    /// otherwise accessing this [`Payment`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            payment: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Payment`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Payment`] doesn't exist.
    pub(crate) async fn payment(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Payment, Error> {
        let id = self.id.into();
        self.payment
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::payment::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(p.ok_or_else(|| {
                            api::query::PaymentError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A payment due under a `Lease` for one billing period.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Human-readable number of this `Payment`.
    pub async fn number(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.payment(ctx).await?.number.to_string())
    }

    /// `Lease` this `Payment` is due under.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.lease",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn lease(&self, ctx: &Context) -> Result<api::Lease, Error> {
        let id = self.payment(ctx).await?.lease_id;
        #[expect(unsafe_code, reason = "`Payment` always has a `Lease`")]
        let lease = unsafe { api::Lease::new_unchecked(id) };
        Ok(lease)
    }

    /// Sequence number of this `Payment` in its `Lease`.
    pub async fn sequence(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.payment(ctx).await?.sequence)
    }

    /// Concept being charged.
    pub async fn concept(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.payment(ctx).await?.concept.to_string())
    }

    /// Description of this `Payment`, if any.
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Option<String>, Error> {
        Ok(self
            .payment(ctx)
            .await?
            .description
            .as_ref()
            .map(ToString::to_string))
    }

    /// First day of the billing period.
    pub async fn period_start(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.payment(ctx).await?.period_start)
    }

    /// Last day of the billing period.
    pub async fn period_end(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.payment(ctx).await?.period_end)
    }

    /// `Date` this `Payment` is due.
    pub async fn due_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.payment(ctx).await?.due_date)
    }

    /// Amount owed, without the late fee.
    pub async fn amount(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.payment(ctx).await?.amount)
    }

    /// Amount paid so far.
    pub async fn amount_paid(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.payment(ctx).await?.amount_paid)
    }

    /// Late fee accrued.
    pub async fn late_fee(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.payment(ctx).await?.late_fee)
    }

    /// Total amount owed, including the late fee.
    pub async fn total(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.payment(ctx).await?.total())
    }

    /// Amount still to be paid.
    pub async fn balance(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.payment(ctx).await?.balance())
    }

    /// Status of this `Payment` as of today.
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.payment(ctx).await?.status(Date::today()).into())
    }

    /// Number of days this `Payment` is overdue as of today.
    pub async fn overdue_days(&self, ctx: &Context) -> Result<i32, Error> {
        let days = self.payment(ctx).await?.overdue_days(Date::today());
        Ok(i32::try_from(days).unwrap_or(i32::MAX))
    }

    /// `Date` this `Payment` was paid first, if it was.
    pub async fn paid_on(&self, ctx: &Context) -> Result<Option<Date>, Error> {
        Ok(self.payment(ctx).await?.paid_on)
    }

    /// Method of the last registered payment, if any.
    pub async fn method(&self, ctx: &Context) -> Result<Option<Method>, Error> {
        Ok(self.payment(ctx).await?.method.map(Into::into))
    }

    /// Reference of the last registered payment, if any.
    pub async fn reference(
        &self,
        ctx: &Context,
    ) -> Result<Option<Reference>, Error> {
        Ok(self.payment(ctx).await?.reference.clone().map(Into::into))
    }

    /// `DateTime` when an invoice was generated for this `Payment` first.
    pub async fn invoiced_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.payment(ctx).await?.invoiced_at.map(|at| at.coerce()))
    }

    /// Registrations made against this `Payment`, oldest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.registrations",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn registrations(
        &self,
        ctx: &Context,
    ) -> Result<Vec<Registration>, Error> {
        ctx.service()
            .execute(query::payment::Registrations::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rs| rs.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Payment` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.payment(ctx).await?.created_at.coerce())
    }
}

/// Payment registered against a [`Payment`].
#[derive(Clone, Debug, From)]
pub struct Registration(domain::payment::Registration);

/// Payment registered against a `Payment`.
#[graphql_object(name = "PaymentRegistration", context = Context)]
impl Registration {
    /// Amount paid.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Method of paying.
    #[must_use]
    pub fn method(&self) -> Method {
        self.0.method.into()
    }

    /// Reference of the transaction, if any.
    #[must_use]
    pub fn reference(&self) -> Option<Reference> {
        self.0.reference.clone().map(Into::into)
    }

    /// Notes of the registrar, if any.
    #[must_use]
    pub fn notes(&self) -> Option<Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// `User` who registered this `PaymentRegistration`.
    #[must_use]
    pub fn registrar(&self) -> api::User {
        #[expect(unsafe_code, reason = "registrar always exists")]
        unsafe {
            api::User::new_unchecked(self.0.registrar_id)
        }
    }

    /// `DateTime` when this `PaymentRegistration` was made.
    #[must_use]
    pub fn registered_at(&self) -> DateTime {
        self.0.registered_at.coerce()
    }
}

/// Result of a `Payment` registration.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "RegisterPaymentResult")]
pub struct RegisterResult {
    /// Registered `Payment`.
    pub payment: Payment,

    /// Created `PaymentRegistration`, if any.
    pub registration: Option<Registration>,

    /// Indicator whether the `Payment` was already fully paid, so nothing was
    /// registered.
    pub already_paid: bool,
}

impl From<command::register_payment::Output> for RegisterResult {
    fn from(output: command::register_payment::Output) -> Self {
        use command::register_payment::Output as O;
        match output {
            O::Registered {
                payment,
                registration,
            } => Self {
                payment: payment.into(),
                registration: Some(registration.into()),
                already_paid: false,
            },
            O::AlreadyPaid(payment) => Self {
                payment: payment.into(),
                registration: None,
                already_paid: true,
            },
        }
    }
}

/// Result of marking a `Payment` as paid.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "MarkPaymentPaidResult")]
pub struct MarkPaidResult {
    /// Paid `Payment`.
    pub payment: Payment,

    /// Indicator whether the `Payment` was already fully paid.
    pub already_paid: bool,
}

impl From<command::mark_payment_paid::Output> for MarkPaidResult {
    fn from(output: command::mark_payment_paid::Output) -> Self {
        use command::mark_payment_paid::Output as O;
        let (payment, already_paid) = match output {
            O::Paid(p) => (p, false),
            O::AlreadyPaid(p) => (p, true),
        };
        Self {
            payment: payment.into(),
            already_paid,
        }
    }
}

/// Result of marking a `Payment` as overdue.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "MarkPaymentOverdueResult")]
pub struct MarkOverdueResult {
    /// Overdue `Payment`.
    pub payment: Payment,

    /// Indicator whether the late fee of the `Payment` was already up to
    /// date.
    pub already_overdue: bool,
}

impl From<command::mark_payment_overdue::Output> for MarkOverdueResult {
    fn from(output: command::mark_payment_overdue::Output) -> Self {
        use command::mark_payment_overdue::Output as O;
        let (payment, already_overdue) = match output {
            O::Overdue(p) => (p, false),
            O::AlreadyOverdue(p) => (p, true),
        };
        Self {
            payment: payment.into(),
            already_overdue,
        }
    }
}

/// Invoice document of a `Payment`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PaymentInvoice")]
pub struct Invoice {
    /// `Payment` number.
    pub number: String,

    /// `Lease` number.
    pub lease_number: String,

    /// Concept being charged.
    pub concept: String,

    /// First day of the billing period.
    pub period_start: Date,

    /// Last day of the billing period.
    pub period_end: Date,

    /// `Date` the `Payment` is due.
    pub due_date: Date,

    /// Monthly rent.
    pub rent: Money,

    /// Monthly administration fee.
    pub administration_fee: Money,

    /// Accrued late fee.
    pub late_fee: Money,

    /// Total amount owed, including the late fee.
    pub total: Money,

    /// Amount still to be paid.
    pub balance: Money,

    /// Owner receiving the payment.
    pub beneficiary: Beneficiary,

    /// Tenant making the payment.
    pub payer: Payer,

    /// Suggested file name of the rendered invoice.
    pub file_name: String,

    /// `DateTime` when the invoice was generated first.
    pub generated_at: DateTime,
}

impl From<command::generate_invoice::Invoice> for Invoice {
    fn from(invoice: command::generate_invoice::Invoice) -> Self {
        let file_name = invoice.file_name();
        let command::generate_invoice::Invoice {
            number,
            lease_number,
            concept,
            period_start,
            period_end,
            due_date,
            rent,
            administration_fee,
            late_fee,
            total,
            balance,
            beneficiary,
            payer,
            generated_at,
        } = invoice;
        Self {
            number: number.to_string(),
            lease_number: lease_number.to_string(),
            concept: concept.to_string(),
            period_start,
            period_end,
            due_date,
            rent,
            administration_fee,
            late_fee,
            total,
            balance,
            beneficiary: Beneficiary {
                name: beneficiary.name.into(),
                national_id: beneficiary.national_id.map(Into::into),
                phone: beneficiary.phone.map(Into::into),
            },
            payer: Payer {
                name: payer.name.into(),
                national_id: payer.national_id.map(Into::into),
                property_title: payer.property_title.into(),
                property_address: payer.property_address.into(),
            },
            file_name,
            generated_at: generated_at.coerce(),
        }
    }
}

/// Owner receiving an invoiced payment.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PaymentInvoiceBeneficiary")]
pub struct Beneficiary {
    /// Name of the owner.
    pub name: api::user::Name,

    /// National identification number of the owner, if known.
    pub national_id: Option<api::user::NationalId>,

    /// Phone of the owner, if known.
    pub phone: Option<api::user::Phone>,
}

/// Tenant paying an invoice.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PaymentInvoicePayer")]
pub struct Payer {
    /// Name of the tenant.
    pub name: api::user::Name,

    /// National identification number of the tenant, if known.
    pub national_id: Option<api::user::NationalId>,

    /// Title of the leased `Property`.
    pub property_title: api::property::Title,

    /// Address of the leased `Property`.
    pub property_address: api::property::Address,
}

/// Report on the `Payment`s of all the `Lease`s owned by a `User`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "PaymentReport")]
pub struct Report {
    /// Number of fully paid `Payment`s.
    pub paid: i32,

    /// Number of pending `Payment`s.
    pub pending: i32,

    /// Number of overdue `Payment`s.
    pub overdue: i32,

    /// Number of partially paid `Payment`s.
    pub partial: i32,

    /// Total amount received.
    pub received: scalar::Decimal,

    /// Total amount still to be received.
    pub outstanding: scalar::Decimal,

    /// Total late fees accrued.
    pub late_fees: scalar::Decimal,

    /// Most recently created `Payment`s, newest first.
    pub latest: Vec<Payment>,
}

impl From<query::report::payments::Output> for Report {
    fn from(output: query::report::payments::Output) -> Self {
        let query::report::payments::Output { summary, latest } = output;
        Self {
            paid: summary.paid,
            pending: summary.pending,
            overdue: summary.overdue,
            partial: summary.partial,
            received: summary.received.into(),
            outstanding: summary.outstanding.into(),
            late_fees: summary.late_fees.into(),
            latest: latest.into_iter().map(Into::into).collect(),
        }
    }
}

/// Unique identifier of a `Payment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Reference of a payment transaction.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentReference",
    with = scalar::Via::<domain::payment::Reference>,
)]
pub struct Reference(domain::payment::Reference);

/// Notes of a payment registrar.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentNotes",
    with = scalar::Via::<domain::payment::Notes>,
)]
pub struct Notes(domain::payment::Notes);

/// Status of a `Payment`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PaymentStatus")]
pub enum Status {
    /// `Payment` is not due yet and nothing is paid.
    Pending,

    /// `Payment` is fully paid.
    Paid,

    /// `Payment` is past its due date and not fully paid.
    Overdue,

    /// `Payment` is paid partially.
    Partial,
}

impl From<domain::payment::Status> for Status {
    fn from(status: domain::payment::Status) -> Self {
        use domain::payment::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Paid => Self::Paid,
            S::Overdue => Self::Overdue,
            S::Partial => Self::Partial,
        }
    }
}

impl From<Status> for domain::payment::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Paid => Self::Paid,
            Status::Overdue => Self::Overdue,
            Status::Partial => Self::Partial,
        }
    }
}

/// Method of paying a `Payment`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PaymentMethod")]
pub enum Method {
    /// Cash.
    Cash,

    /// Bank transfer.
    Transfer,

    /// Debit or credit card.
    Card,

    /// Check.
    Check,

    /// Any other method.
    Other,
}

impl From<domain::payment::Method> for Method {
    fn from(method: domain::payment::Method) -> Self {
        use domain::payment::Method as M;
        match method {
            M::Cash => Self::Cash,
            M::Transfer => Self::Transfer,
            M::Card => Self::Card,
            M::Check => Self::Check,
            M::Other => Self::Other,
        }
    }
}

impl From<Method> for domain::payment::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Cash => Self::Cash,
            Method::Transfer => Self::Transfer,
            Method::Card => Self::Card,
            Method::Check => Self::Check,
            Method::Other => Self::Other,
        }
    }
}

define_list!(
    Payment,
    read = payment,
    total_count = service::query::payments::TotalCount,
    names = (
        "PaymentListCursor",
        "PaymentListEdge",
        "PaymentListConnection",
        "PaymentListPageInfo",
    ),
);
