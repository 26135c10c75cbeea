//! [`RentalRequest`]-related definitions.

use std::future;

use common::DateTime;
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

/// A request of a tenant to rent a `Property`.
#[derive(Clone, Debug, From)]
pub struct RentalRequest {
    /// ID of this [`RentalRequest`].
    id: Id,

    /// Underlying [`domain::RentalRequest`].
    request: OnceCell<domain::RentalRequest>,
}

impl From<domain::RentalRequest> for RentalRequest {
    fn from(request: domain::RentalRequest) -> Self {
        Self {
            id: request.id.into(),
            request: OnceCell::new_with(Some(request)),
        }
    }
}

impl RentalRequest {
    /// Creates a new [`RentalRequest`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`RentalRequest`] with the provided ID exists,
    /// otherwise accessing this [`RentalRequest`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            request: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::RentalRequest`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::RentalRequest`] doesn't exist.
    async fn request(
        &self,
        ctx: &Context,
    ) -> Result<&domain::RentalRequest, Error> {
        let id = self.id.into();
        self.request
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::rental_request::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|r| {
                        future::ready(r.ok_or_else(|| {
                            api::query::RentalRequestError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A request of a tenant to rent a `Property`.
#[graphql_object(context = Context)]
impl RentalRequest {
    /// Unique identifier of this `RentalRequest`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Requested `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RentalRequest.property",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn property(
        &self,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let id = self.request(ctx).await?.property_id;
        #[expect(unsafe_code, reason = "requested `Property` always exists")]
        let property = unsafe { api::Property::new_unchecked(id) };
        Ok(property)
    }

    /// `User` requesting the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RentalRequest.tenant",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn tenant(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.request(ctx).await?.tenant_id;
        #[expect(unsafe_code, reason = "requester always exists")]
        let tenant = unsafe { api::User::new_unchecked(id) };
        Ok(tenant)
    }

    /// `User` owning the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RentalRequest.owner",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn owner(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.request(ctx).await?.owner_id;
        #[expect(unsafe_code, reason = "owner always exists")]
        let owner = unsafe { api::User::new_unchecked(id) };
        Ok(owner)
    }

    /// Message from the tenant, if any.
    pub async fn message(
        &self,
        ctx: &Context,
    ) -> Result<Option<Message>, Error> {
        Ok(self.request(ctx).await?.message.clone().map(Into::into))
    }

    /// Status of this `RentalRequest`.
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.request(ctx).await?.status.into())
    }

    /// `Lease` created by accepting this `RentalRequest`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RentalRequest.lease",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn lease(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Lease>, Error> {
        let id = self.request(ctx).await?.lease_id;
        #[expect(unsafe_code, reason = "referenced `Lease` always exists")]
        let lease = id.map(|id| unsafe { api::Lease::new_unchecked(id) });
        Ok(lease)
    }

    /// `DateTime` when this `RentalRequest` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.request(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when the owner responded to this `RentalRequest`.
    pub async fn responded_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.request(ctx).await?.responded_at.map(|at| at.coerce()))
    }
}

/// Result of a `RentalRequest` creation.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "CreateRentalRequestResult")]
pub struct CreateResult {
    /// Created `RentalRequest`, if any.
    pub request: Option<RentalRequest>,

    /// Indicator whether the `User` already has a pending `RentalRequest` of
    /// the same `Property`, so nothing was created.
    pub already_pending: bool,
}

impl From<command::create_rental_request::Output> for CreateResult {
    fn from(output: command::create_rental_request::Output) -> Self {
        use command::create_rental_request::Output as O;
        match output {
            O::Requested(request) => Self {
                request: Some(request.into()),
                already_pending: false,
            },
            O::AlreadyPending => Self {
                request: None,
                already_pending: true,
            },
        }
    }
}

/// Result of a `RentalRequest` acceptance.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "AcceptRentalRequestResult")]
pub struct AcceptResult {
    /// Accepted `RentalRequest`.
    pub request: RentalRequest,

    /// Draft `Lease` created for the accepted `RentalRequest`.
    pub lease: api::Lease,
}

impl From<command::accept_rental_request::Output> for AcceptResult {
    fn from(output: command::accept_rental_request::Output) -> Self {
        let command::accept_rental_request::Output { request, lease } = output;
        Self {
            request: request.into(),
            lease: lease.into(),
        }
    }
}

/// Unique identifier of a `RentalRequest`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::rental_request::Id)]
#[into(domain::rental_request::Id)]
#[graphql(name = "RentalRequestId", transparent)]
pub struct Id(Uuid);

/// Message attached to a `RentalRequest`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RentalRequestMessage",
    with = scalar::Via::<domain::rental_request::Message>,
)]
pub struct Message(domain::rental_request::Message);

/// Status of a `RentalRequest`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentalRequestStatus")]
pub enum Status {
    /// Awaiting the owner response.
    Pending,

    /// Accepted by the owner.
    Accepted,

    /// Rejected by the owner.
    Rejected,

    /// Cancelled by the tenant.
    Cancelled,
}

impl From<domain::rental_request::Status> for Status {
    fn from(status: domain::rental_request::Status) -> Self {
        use domain::rental_request::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Accepted => Self::Accepted,
            S::Rejected => Self::Rejected,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for domain::rental_request::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Accepted => Self::Accepted,
            Status::Rejected => Self::Rejected,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

/// Side of a `RentalRequest` from the point of view of a `User`.
#[derive(Clone, Copy, Debug, Default, GraphQLEnum)]
#[graphql(name = "RentalRequestDirection")]
pub enum Direction {
    /// `RentalRequest`s received by the `User` as an owner.
    #[default]
    Received,

    /// `RentalRequest`s sent by the `User` as a tenant.
    Sent,
}

define_list!(
    RentalRequest,
    read = rental_request,
    total_count = service::query::rental_requests::TotalCount,
    names = (
        "RentalRequestListCursor",
        "RentalRequestListEdge",
        "RentalRequestListConnection",
        "RentalRequestListPageInfo",
    ),
);
