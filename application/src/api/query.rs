//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{domain, query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Default number of items on a page of any list.
    const DEFAULT_PAGE_SIZE: i32 = 10;

    /// Returns the [`domain::User`] of the currently authenticated `User`.
    async fn me(ctx: &Context) -> Result<domain::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
    }

    /// Returns the [`domain::Lease`] with the provided ID, if the currently
    /// authenticated `User` is a party of it.
    async fn visible_lease(
        id: domain::lease::Id,
        ctx: &Context,
    ) -> Result<domain::Lease, Error> {
        let my_id = domain::user::Id::from(ctx.current_session().await?.user_id);
        let lease = ctx
            .service()
            .execute(query::lease::ById::by(id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| LeaseError::NotExists.into())
            .map_err(ctx.error())?;
        if lease.owner_id != my_id && lease.tenant_id != my_id {
            return Err(api::PrivilegeError::LeaseParty.into());
        }
        Ok(lease)
    }
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        Self::me(ctx).await.map(Into::into)
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Property` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` with the specified ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "property",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn property(
        id: api::property::Id,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        ctx.service()
            .execute(query::property::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PropertyError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of the public `Property` catalog.
    ///
    /// Lists only active `Property`s available for rent.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous;
    /// - `INVALID_ROOMS_NUMBER` - the rooms criteria are out of range.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "properties",
            last = ?last,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn properties(
        first: Option<i32>,
        after: Option<api::property::list::Cursor>,
        last: Option<i32>,
        before: Option<api::property::list::Cursor>,
        filter: Option<api::property::CatalogFilter>,
        ctx: &Context,
    ) -> Result<api::property::list::Connection, Error> {
        let arguments = read::property::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = filter
            .unwrap_or_default()
            .into_read(None)
            .map_err(Error::from)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::properties::List::by(
                read::property::list::Selector {
                    arguments,
                    filter: filter.clone(),
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::property::list::Connection::new(page, filter))
    }

    /// Fetches the page of `Property`s owned by the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous;
    /// - `INVALID_ROOMS_NUMBER` - the rooms criteria are out of range.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "myProperties",
            last = ?last,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_properties(
        first: Option<i32>,
        after: Option<api::property::list::Cursor>,
        last: Option<i32>,
        before: Option<api::property::list::Cursor>,
        filter: Option<api::property::CatalogFilter>,
        ctx: &Context,
    ) -> Result<api::property::list::Connection, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let arguments = read::property::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = filter
            .unwrap_or_default()
            .into_read(Some(my_id.into()))
            .map_err(Error::from)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::properties::List::by(
                read::property::list::Selector {
                    arguments,
                    filter: filter.clone(),
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::property::list::Connection::new(page, filter))
    }

    /// Returns the `RentalRequest` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` with the specified
    ///                                 ID does not exist;
    /// - `NOT_PROPERTY_PARTY` - the current `User` neither sent nor received
    ///                          the `RentalRequest`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "rentalRequest",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental_request(
        id: api::rental_request::Id,
        ctx: &Context,
    ) -> Result<api::RentalRequest, Error> {
        let my_id = domain::user::Id::from(ctx.current_session().await?.user_id);
        let request = ctx
            .service()
            .execute(query::rental_request::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| RentalRequestError::NotExists.into())
            .map_err(ctx.error())?;
        if request.owner_id != my_id && request.tenant_id != my_id {
            return Err(api::PrivilegeError::PropertyParty.into());
        }
        Ok(request.into())
    }

    /// Fetches the page of `RentalRequest`s received or sent by the current
    /// `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            direction = ?direction,
            first = ?first,
            gql.name = "rentalRequests",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn rental_requests(
        first: Option<i32>,
        after: Option<api::rental_request::list::Cursor>,
        last: Option<i32>,
        before: Option<api::rental_request::list::Cursor>,
        direction: Option<api::rental_request::Direction>,
        status: Option<api::rental_request::Status>,
        ctx: &Context,
    ) -> Result<api::rental_request::list::Connection, Error> {
        use api::rental_request::Direction as D;

        let my_id = domain::user::Id::from(ctx.current_session().await?.user_id);
        let arguments = read::rental_request::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let (owner_id, tenant_id) = match direction.unwrap_or_default() {
            D::Received => (Some(my_id), None),
            D::Sent => (None, Some(my_id)),
        };
        let filter = read::rental_request::list::Filter {
            owner_id,
            tenant_id,
            status: status.map(Into::into),
        };

        ctx.service()
            .execute(query::rental_requests::List::by(
                read::rental_request::list::Selector { arguments, filter },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| {
                api::rental_request::list::Connection::new(page, filter)
            })
    }

    /// Returns the `Lease` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` with the specified ID does not
    ///                        exist;
    /// - `NOT_LEASE_PARTY` - the current `User` is not a party of the
    ///                       `Lease`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "lease",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn lease(
        id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        Self::visible_lease(id.into(), ctx).await.map(Into::into)
    }

    /// Fetches the page of `Lease`s the current `User` is a party of.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "leases",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            starts_from = ?starts_from,
            starts_until = ?starts_until,
            status = ?status,
        ),
    )]
    pub async fn leases(
        first: Option<i32>,
        after: Option<api::lease::list::Cursor>,
        last: Option<i32>,
        before: Option<api::lease::list::Cursor>,
        status: Option<api::lease::Status>,
        starts_from: Option<Date>,
        starts_until: Option<Date>,
        ctx: &Context,
    ) -> Result<api::lease::list::Connection, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let arguments = read::lease::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = read::lease::list::Filter {
            participant_id: my_id.into(),
            status: status.map(Into::into),
            starts_from,
            starts_until,
        };

        ctx.service()
            .execute(query::leases::List::by(read::lease::list::Selector {
                arguments,
                filter,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::lease::list::Connection::new(page, filter))
    }

    /// Returns the `Payment` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the specified ID does not
    ///                          exist;
    /// - `NOT_LEASE_PARTY` - the current `User` is not a party of the `Lease`
    ///                       the `Payment` is due under.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "payment",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn payment(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        let payment = ctx
            .service()
            .execute(query::payment::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PaymentError::NotExists.into())
            .map_err(ctx.error())?;
        _ = Self::visible_lease(payment.lease_id, ctx).await?;
        Ok(payment.into())
    }

    /// Fetches the page of `Payment`s due under the `Lease`s the current
    /// `User` is a party of.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            due_from = ?due_from,
            due_until = ?due_until,
            first = ?first,
            gql.name = "payments",
            last = ?last,
            lease_id = ?lease_id.map(|id| id.to_string()),
            otel.name = Self::SPAN_NAME,
            owned_only = ?owned_only,
            status = ?status,
        ),
    )]
    pub async fn payments(
        first: Option<i32>,
        after: Option<api::payment::list::Cursor>,
        last: Option<i32>,
        before: Option<api::payment::list::Cursor>,
        lease_id: Option<api::lease::Id>,
        status: Option<api::payment::Status>,
        due_from: Option<Date>,
        due_until: Option<Date>,
        owned_only: Option<bool>,
        ctx: &Context,
    ) -> Result<api::payment::list::Connection, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let arguments = read::payment::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = read::payment::list::Filter {
            participant_id: my_id.into(),
            owned_only: owned_only.unwrap_or_default(),
            lease_id: lease_id.map(Into::into),
            status: status.map(Into::into),
            due_from,
            due_until,
        };

        ctx.service()
            .execute(query::payments::List::by(
                read::payment::list::Selector { arguments, filter },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::payment::list::Connection::new(page, filter))
    }

    /// Calculates the `PaymentReport` over all the `Lease`s owned by the
    /// current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_OWNER` - the current `User` is not an owner.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "paymentReport",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn payment_report(
        ctx: &Context,
    ) -> Result<api::payment::Report, Error> {
        let me = Self::me(ctx).await?;
        if me.kind != domain::user::Kind::Owner {
            return Err(api::PrivilegeError::Owner.into());
        }

        ctx.service()
            .execute(query::report::Payments { owner_id: me.id })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `MaintenanceTicket` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MAINTENANCE_TICKET_NOT_EXISTS` - the `MaintenanceTicket` with the
    ///                                     specified ID does not exist;
    /// - `NOT_PROPERTY_PARTY` - the current `User` neither requested the
    ///                          `MaintenanceTicket` nor owns its `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "maintenanceTicket",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn maintenance_ticket(
        id: api::maintenance::Id,
        ctx: &Context,
    ) -> Result<api::MaintenanceTicket, Error> {
        let my_id = domain::user::Id::from(ctx.current_session().await?.user_id);
        let ticket = ctx
            .service()
            .execute(query::maintenance_ticket::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| MaintenanceTicketError::NotExists.into())
            .map_err(ctx.error())?;
        if ticket.requester_id != my_id {
            let owner_id = ctx
                .service()
                .execute(query::property::ById::by(ticket.property_id))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())?
                .map(|p| p.owner_id);
            if owner_id != Some(my_id) {
                return Err(api::PrivilegeError::PropertyParty.into());
            }
        }
        Ok(ticket.into())
    }

    /// Fetches the page of `MaintenanceTicket`s of the current `User`.
    ///
    /// Owners see the `MaintenanceTicket`s of their `Property`s, while
    /// tenants see the ones they requested.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            category = ?category,
            first = ?first,
            gql.name = "maintenanceTickets",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            priority = ?priority,
            status = ?status,
        ),
    )]
    pub async fn maintenance_tickets(
        first: Option<i32>,
        after: Option<api::maintenance::list::Cursor>,
        last: Option<i32>,
        before: Option<api::maintenance::list::Cursor>,
        property_id: Option<api::property::Id>,
        status: Option<api::maintenance::Status>,
        category: Option<api::maintenance::Category>,
        priority: Option<api::maintenance::Priority>,
        ctx: &Context,
    ) -> Result<api::maintenance::list::Connection, Error> {
        let me = Self::me(ctx).await?;
        let arguments = read::maintenance::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let (owner_id, requester_id) = match me.kind {
            domain::user::Kind::Owner => (Some(me.id), None),
            domain::user::Kind::Tenant => (None, Some(me.id)),
        };
        let filter = read::maintenance::list::Filter {
            owner_id,
            requester_id,
            property_id: property_id.map(Into::into),
            status: status.map(Into::into),
            category: category.map(Into::into),
            priority: priority.map(Into::into),
        };

        ctx.service()
            .execute(query::maintenance_tickets::List::by(
                read::maintenance::list::Selector { arguments, filter },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::maintenance::list::Connection::new(page, filter))
    }

    /// Fetches the page of `Notification`s of the current `User`, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAGINATION_AMBIGUOUS` - the pagination arguments are ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "notifications",
            is_read = ?is_read,
            kind = ?kind,
            last = ?last,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn notifications(
        first: Option<i32>,
        after: Option<api::notification::list::Cursor>,
        last: Option<i32>,
        before: Option<api::notification::list::Cursor>,
        is_read: Option<bool>,
        kind: Option<api::notification::Kind>,
        ctx: &Context,
    ) -> Result<api::notification::list::Connection, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let arguments = read::notification::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = read::notification::list::Filter {
            recipient_id: my_id.into(),
            is_read,
            kind: kind.map(Into::into),
        };

        ctx.service()
            .execute(query::notifications::List::by(
                read::notification::list::Selector { arguments, filter },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| {
                api::notification::list::Connection::new(page, filter)
            })
    }

    /// Returns the summary of the unread `Notification`s of the current
    /// `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "unreadNotifications",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn unread_notifications(
        ctx: &Context,
    ) -> Result<api::notification::Unread, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::notifications::Unread::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum LeaseError {
        #[code = "LEASE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Lease` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum MaintenanceTicketError {
        #[code = "MAINTENANCE_TICKET_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`MaintenanceTicket` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum NotificationError {
        #[code = "NOTIFICATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Notification` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PaymentError {
        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Property` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RentalRequestError {
        #[code = "RENTAL_REQUEST_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`RentalRequest` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
