//! Maintenance [`Ticket`]-related definitions.

use std::future;

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Maintenance ticket of a `Property`.
#[derive(Clone, Debug, From)]
pub struct Ticket {
    /// ID of this [`Ticket`].
    id: Id,

    /// Underlying [`domain::MaintenanceTicket`].
    ticket: OnceCell<domain::MaintenanceTicket>,
}

impl From<domain::MaintenanceTicket> for Ticket {
    fn from(ticket: domain::MaintenanceTicket) -> Self {
        Self {
            id: ticket.id.into(),
            ticket: OnceCell::new_with(Some(ticket)),
        }
    }
}

impl Ticket {
    /// Creates a new [`Ticket`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Ticket`] with the provided ID exists,
    /// otherwise accessing this [`Ticket`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            ticket: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::MaintenanceTicket`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::MaintenanceTicket`] doesn't exist.
    pub(crate) async fn ticket(
        &self,
        ctx: &Context,
    ) -> Result<&domain::MaintenanceTicket, Error> {
        let id = self.id.into();
        self.ticket
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::maintenance_ticket::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|t| {
                        future::ready(t.ok_or_else(|| {
                            api::query::MaintenanceTicketError::NotExists
                                .into()
                        }))
                    })
            })
            .await
    }
}

/// Maintenance ticket of a `Property`.
#[graphql_object(name = "MaintenanceTicket", context = Context)]
impl Ticket {
    /// Unique identifier of this `MaintenanceTicket`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Human-readable number of this `MaintenanceTicket`.
    pub async fn number(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.ticket(ctx).await?.number.to_string())
    }

    /// `Property` needing maintenance.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MaintenanceTicket.property",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn property(
        &self,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let id = self.ticket(ctx).await?.property_id;
        #[expect(unsafe_code, reason = "ticket `Property` always exists")]
        let property = unsafe { api::Property::new_unchecked(id) };
        Ok(property)
    }

    /// `User` who requested the maintenance.
    pub async fn requester(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.ticket(ctx).await?.requester_id;
        #[expect(unsafe_code, reason = "requester always exists")]
        let requester = unsafe { api::User::new_unchecked(id) };
        Ok(requester)
    }

    /// `User` assigned to carry out the maintenance, if any.
    pub async fn assignee(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::User>, Error> {
        let id = self.ticket(ctx).await?.assignee_id;
        #[expect(unsafe_code, reason = "assignee always exists")]
        let assignee = id.map(|id| unsafe { api::User::new_unchecked(id) });
        Ok(assignee)
    }

    /// Title of this `MaintenanceTicket`.
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.ticket(ctx).await?.title.clone().into())
    }

    /// Description of the issue.
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Description, Error> {
        Ok(self.ticket(ctx).await?.description.clone().into())
    }

    /// Category of the issue.
    pub async fn category(&self, ctx: &Context) -> Result<Category, Error> {
        Ok(self.ticket(ctx).await?.category.into())
    }

    /// Priority of this `MaintenanceTicket`.
    pub async fn priority(&self, ctx: &Context) -> Result<Priority, Error> {
        Ok(self.ticket(ctx).await?.priority.into())
    }

    /// Status of this `MaintenanceTicket`.
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.ticket(ctx).await?.status.into())
    }

    /// Indicator whether this `MaintenanceTicket` is still being worked on.
    pub async fn is_open(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.ticket(ctx).await?.is_open())
    }

    /// Location of the issue inside the `Property`, if any.
    pub async fn location(
        &self,
        ctx: &Context,
    ) -> Result<Option<Location>, Error> {
        Ok(self.ticket(ctx).await?.location.clone().map(Into::into))
    }

    /// Number of days passed since this `MaintenanceTicket` was requested.
    pub async fn days_since_request(
        &self,
        ctx: &Context,
    ) -> Result<i32, Error> {
        let days = self.ticket(ctx).await?.days_since_request(Date::today());
        Ok(i32::try_from(days).unwrap_or(i32::MAX))
    }

    /// `DateTime` when this `MaintenanceTicket` was requested.
    pub async fn requested_at(
        &self,
        ctx: &Context,
    ) -> Result<DateTime, Error> {
        Ok(self.ticket(ctx).await?.requested_at.coerce())
    }

    /// `DateTime` when this `MaintenanceTicket` was reviewed first.
    pub async fn reviewed_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.ticket(ctx).await?.reviewed_at.map(|at| at.coerce()))
    }

    /// `DateTime` when the work on this `MaintenanceTicket` started.
    pub async fn started_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.ticket(ctx).await?.started_at.map(|at| at.coerce()))
    }

    /// `DateTime` when this `MaintenanceTicket` was completed.
    pub async fn completed_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.ticket(ctx).await?.completed_at.map(|at| at.coerce()))
    }

    /// Estimated `Date` of completion, if any.
    pub async fn estimated_on(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.ticket(ctx).await?.estimated_on)
    }

    /// Estimated cost of the work, if known.
    pub async fn estimated_cost(
        &self,
        ctx: &Context,
    ) -> Result<Option<Money>, Error> {
        Ok(self.ticket(ctx).await?.estimated_cost)
    }

    /// Final cost of the work, if known.
    pub async fn final_cost(
        &self,
        ctx: &Context,
    ) -> Result<Option<Money>, Error> {
        Ok(self.ticket(ctx).await?.final_cost)
    }

    /// Party bearing the cost of the work.
    pub async fn cost_bearer(
        &self,
        ctx: &Context,
    ) -> Result<CostBearer, Error> {
        Ok(self.ticket(ctx).await?.cost_bearer.into())
    }

    /// Notes of the `Property` owner, if any.
    pub async fn owner_notes(
        &self,
        ctx: &Context,
    ) -> Result<Option<Notes>, Error> {
        Ok(self.ticket(ctx).await?.owner_notes.clone().map(Into::into))
    }

    /// Applied resolution, if any.
    pub async fn resolution(
        &self,
        ctx: &Context,
    ) -> Result<Option<Resolution>, Error> {
        Ok(self.ticket(ctx).await?.resolution.clone().map(Into::into))
    }

    /// Comments left on this `MaintenanceTicket`, oldest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MaintenanceTicket.comments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn comments(&self, ctx: &Context) -> Result<Vec<Comment>, Error> {
        ctx.service()
            .execute(query::maintenance_ticket::Comments::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|cs| cs.into_iter().map(Into::into).collect())
    }
}

/// Comment left on a [`Ticket`].
#[derive(Clone, Debug, From)]
pub struct Comment(domain::maintenance::Comment);

/// Comment left on a `MaintenanceTicket`.
#[graphql_object(name = "MaintenanceTicketComment", context = Context)]
impl Comment {
    /// Unique identifier of this `MaintenanceTicketComment`.
    #[must_use]
    pub fn id(&self) -> CommentId {
        self.0.id.into()
    }

    /// `User` who left this `MaintenanceTicketComment`.
    #[must_use]
    pub fn author(&self) -> api::User {
        #[expect(unsafe_code, reason = "author always exists")]
        unsafe {
            api::User::new_unchecked(self.0.author_id)
        }
    }

    /// Text of this `MaintenanceTicketComment`.
    #[must_use]
    pub fn text(&self) -> CommentText {
        self.0.text.clone().into()
    }

    /// `DateTime` when this `MaintenanceTicketComment` was left.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `MaintenanceTicket`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::maintenance::Id)]
#[into(domain::maintenance::Id)]
#[graphql(name = "MaintenanceTicketId", transparent)]
pub struct Id(Uuid);

/// Unique identifier of a `MaintenanceTicketComment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::maintenance::CommentId)]
#[into(domain::maintenance::CommentId)]
#[graphql(name = "MaintenanceTicketCommentId", transparent)]
pub struct CommentId(Uuid);

/// Title of a `MaintenanceTicket`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceTicketTitle",
    with = scalar::Via::<domain::maintenance::Title>,
)]
pub struct Title(domain::maintenance::Title);

/// Description of a `MaintenanceTicket` issue.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceTicketDescription",
    with = scalar::Via::<domain::maintenance::Description>,
)]
pub struct Description(domain::maintenance::Description);

/// Location of a `MaintenanceTicket` issue inside a `Property`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceTicketLocation",
    with = scalar::Via::<domain::maintenance::Location>,
)]
pub struct Location(domain::maintenance::Location);

/// Notes of a `Property` owner on a `MaintenanceTicket`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceTicketNotes",
    with = scalar::Via::<domain::maintenance::Notes>,
)]
pub struct Notes(domain::maintenance::Notes);

/// Resolution applied to a `MaintenanceTicket` issue.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceTicketResolution",
    with = scalar::Via::<domain::maintenance::Resolution>,
)]
pub struct Resolution(domain::maintenance::Resolution);

/// Text of a `MaintenanceTicketComment`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "MaintenanceTicketCommentText",
    with = scalar::Via::<domain::maintenance::CommentText>,
)]
pub struct CommentText(domain::maintenance::CommentText);

/// Category of a `MaintenanceTicket` issue.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "MaintenanceTicketCategory")]
pub enum Category {
    /// Plumbing works.
    Plumbing,

    /// Electrical works.
    Electrical,

    /// Painting works.
    Painting,

    /// Locks and keys.
    Locksmith,

    /// Cleaning.
    Cleaning,

    /// Broken appliance.
    Appliance,

    /// Structural damage.
    Structural,

    /// Anything else.
    Other,
}

impl From<domain::maintenance::Category> for Category {
    fn from(category: domain::maintenance::Category) -> Self {
        use domain::maintenance::Category as C;
        match category {
            C::Plumbing => Self::Plumbing,
            C::Electrical => Self::Electrical,
            C::Painting => Self::Painting,
            C::Locksmith => Self::Locksmith,
            C::Cleaning => Self::Cleaning,
            C::Appliance => Self::Appliance,
            C::Structural => Self::Structural,
            C::Other => Self::Other,
        }
    }
}

impl From<Category> for domain::maintenance::Category {
    fn from(category: Category) -> Self {
        match category {
            Category::Plumbing => Self::Plumbing,
            Category::Electrical => Self::Electrical,
            Category::Painting => Self::Painting,
            Category::Locksmith => Self::Locksmith,
            Category::Cleaning => Self::Cleaning,
            Category::Appliance => Self::Appliance,
            Category::Structural => Self::Structural,
            Category::Other => Self::Other,
        }
    }
}

/// Priority of a `MaintenanceTicket`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "MaintenanceTicketPriority")]
pub enum Priority {
    /// Can wait.
    Low,

    /// Should be done soon.
    Medium,

    /// Should be done as soon as possible.
    High,

    /// Must be done immediately.
    Urgent,
}

impl From<domain::maintenance::Priority> for Priority {
    fn from(priority: domain::maintenance::Priority) -> Self {
        use domain::maintenance::Priority as P;
        match priority {
            P::Low => Self::Low,
            P::Medium => Self::Medium,
            P::High => Self::High,
            P::Urgent => Self::Urgent,
        }
    }
}

impl From<Priority> for domain::maintenance::Priority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => Self::Low,
            Priority::Medium => Self::Medium,
            Priority::High => Self::High,
            Priority::Urgent => Self::Urgent,
        }
    }
}

/// Status of a `MaintenanceTicket`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "MaintenanceTicketStatus")]
pub enum Status {
    /// Awaiting review of the owner.
    Pending,

    /// Being reviewed by the owner.
    InReview,

    /// Approved by the owner.
    Approved,

    /// Work is in progress.
    InProgress,

    /// Work is done.
    Completed,

    /// Cancelled.
    Cancelled,

    /// Rejected by the owner.
    Rejected,
}

impl From<domain::maintenance::Status> for Status {
    fn from(status: domain::maintenance::Status) -> Self {
        use domain::maintenance::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::InReview => Self::InReview,
            S::Approved => Self::Approved,
            S::InProgress => Self::InProgress,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
            S::Rejected => Self::Rejected,
        }
    }
}

impl From<Status> for domain::maintenance::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::InReview => Self::InReview,
            Status::Approved => Self::Approved,
            Status::InProgress => Self::InProgress,
            Status::Completed => Self::Completed,
            Status::Cancelled => Self::Cancelled,
            Status::Rejected => Self::Rejected,
        }
    }
}

/// Party bearing the cost of a `MaintenanceTicket` work.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "MaintenanceCostBearer")]
pub enum CostBearer {
    /// `Property` owner.
    Owner,

    /// `Property` tenant.
    Tenant,

    /// Both parties.
    Shared,
}

impl From<domain::maintenance::CostBearer> for CostBearer {
    fn from(bearer: domain::maintenance::CostBearer) -> Self {
        use domain::maintenance::CostBearer as B;
        match bearer {
            B::Owner => Self::Owner,
            B::Tenant => Self::Tenant,
            B::Shared => Self::Shared,
        }
    }
}

impl From<CostBearer> for domain::maintenance::CostBearer {
    fn from(bearer: CostBearer) -> Self {
        match bearer {
            CostBearer::Owner => Self::Owner,
            CostBearer::Tenant => Self::Tenant,
            CostBearer::Shared => Self::Shared,
        }
    }
}

define_list!(
    Ticket,
    read = maintenance,
    total_count = service::query::maintenance_tickets::TotalCount,
    names = (
        "MaintenanceTicketListCursor",
        "MaintenanceTicketListEdge",
        "MaintenanceTicketListConnection",
        "MaintenanceTicketListPageInfo",
    ),
);
