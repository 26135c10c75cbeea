//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{command, domain, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided credentials and contact info.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `NATIONAL_ID_OCCUPIED` - provided `UserNationalId` is used by another
    ///                            `User`;
    /// - `NO_CONTACT_INFO` - either `UserEmail` or `UserPhone` must be
    ///                       provided.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUser",
            email = ?email,
            kind = ?kind,
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        kind: api::user::Kind,
        national_id: Option<api::user::NationalId>,
        email: Option<api::user::Email>,
        phone: Option<api::user::Phone>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                kind: kind.into(),
                national_id: national_id.map(Into::into),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Lists a new `Property` owned by the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_OWNER` - the current `User` is not an owner;
    /// - `CURRENCY_MISMATCH` - rent, administration fee and deposit have
    ///                         different currencies;
    /// - `INVALID_AREA`, `INVALID_ROOMS_NUMBER`, `INVALID_FLOOR` - provided
    ///   features are out of range.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            gql.name = "createProperty",
            otel.name = Self::SPAN_NAME,
            rent = %rent,
            title = %title,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_property(
        title: api::property::Title,
        description: api::property::Description,
        category: api::property::Category,
        location: api::property::LocationInput,
        features: api::property::FeaturesInput,
        rent: Money,
        administration_fee: Money,
        deposit: Money,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let features = domain::property::Features::try_from(features)
            .map_err(Error::from)?;

        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CreateProperty {
                owner_id: my_id.into(),
                title: title.into(),
                description: description.into(),
                category: category.into(),
                location: location.into(),
                features,
                rent,
                administration_fee,
                deposit,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the listing of the `Property` owned by the current `User`.
    ///
    /// `RENTED` status is managed by `Lease`s only, and is kept on rented
    /// `Property`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` with the provided ID does not
    ///                           exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Property`;
    /// - `RENTED_STATUS_RESERVED` - `RENTED` status cannot be set manually;
    /// - `CURRENCY_MISMATCH` - rent, administration fee and deposit have
    ///                         different currencies.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            gql.name = "updateProperty",
            id = %id,
            is_active = is_active,
            otel.name = Self::SPAN_NAME,
            rent = %rent,
            status = ?status,
            title = %title,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn update_property(
        id: api::property::Id,
        title: api::property::Title,
        description: api::property::Description,
        category: api::property::Category,
        location: api::property::LocationInput,
        features: api::property::FeaturesInput,
        rent: Money,
        administration_fee: Money,
        deposit: Money,
        status: Option<api::property::Status>,
        is_active: bool,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let features = domain::property::Features::try_from(features)
            .map_err(Error::from)?;

        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::UpdateProperty {
                property_id: id.into(),
                initiator_id: my_id.into(),
                title: title.into(),
                description: description.into(),
                category: category.into(),
                location: location.into(),
                features,
                rent,
                administration_fee,
                deposit,
                status: status.map(Into::into),
                is_active,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Requests to rent the `Property` with the provided ID.
    ///
    /// Nothing is created if the current `User` already has a pending
    /// `RentalRequest` of the `Property`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` with the provided ID does not
    ///                           exist;
    /// - `PROPERTY_NOT_AVAILABLE` - the `Property` is not available for rent;
    /// - `NOT_TENANT` - the current `User` is not a tenant.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createRentalRequest",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
        ),
    )]
    pub async fn create_rental_request(
        property_id: api::property::Id,
        message: Option<api::rental_request::Message>,
        ctx: &Context,
    ) -> Result<api::rental_request::CreateResult, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CreateRentalRequest {
                property_id: property_id.into(),
                tenant_id: my_id.into(),
                message: message.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Accepts the `RentalRequest` with the provided ID, drafting a new
    /// `Lease` for it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` with the provided
    ///                                 ID does not exist;
    /// - `RENTAL_REQUEST_NOT_PENDING` - the `RentalRequest` is not pending;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "acceptRentalRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn accept_rental_request(
        id: api::rental_request::Id,
        ctx: &Context,
    ) -> Result<api::rental_request::AcceptResult, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::AcceptRentalRequest {
                request_id: id.into(),
                owner_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Rejects the `RentalRequest` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` with the provided
    ///                                 ID does not exist;
    /// - `RENTAL_REQUEST_NOT_PENDING` - the `RentalRequest` is not pending;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rejectRentalRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reject_rental_request(
        id: api::rental_request::Id,
        ctx: &Context,
    ) -> Result<api::RentalRequest, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::RejectRentalRequest {
                request_id: id.into(),
                owner_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `RentalRequest` with the provided ID sent by the current
    /// `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_REQUEST_NOT_EXISTS` - the `RentalRequest` with the provided
    ///                                 ID does not exist;
    /// - `RENTAL_REQUEST_NOT_PENDING` - the `RentalRequest` is not pending;
    /// - `NOT_REQUESTER` - the current `User` didn't send the
    ///                     `RentalRequest`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelRentalRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_rental_request(
        id: api::rental_request::Id,
        ctx: &Context,
    ) -> Result<api::RentalRequest, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CancelRentalRequest {
                request_id: id.into(),
                tenant_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Drafts a new `Lease` of the `Property` owned by the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` with the provided ID does not
    ///                           exist;
    /// - `USER_NOT_EXISTS` - the tenant with the provided ID does not exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Property`;
    /// - `USER_NOT_TENANT` - the provided `User` is not a tenant;
    /// - `INVALID_LEASE_PERIOD` - `endDate` is not after `startDate`;
    /// - `INVALID_DUE_DAY` - the due day is not a day of month;
    /// - `CURRENCY_MISMATCH` - the terms have different currencies.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "createLease",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            start_date = %start_date,
            tenant_id = %tenant_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_lease(
        property_id: api::property::Id,
        tenant_id: api::user::Id,
        start_date: Date,
        end_date: Date,
        terms: api::lease::TermsInput,
        conditions: Option<api::lease::Conditions>,
        special_clauses: Option<api::lease::Clauses>,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let terms = domain::lease::Terms::try_from(terms)
            .map_err(Error::from)?;

        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CreateLease {
                owner_id: my_id.into(),
                property_id: property_id.into(),
                tenant_id: tenant_id.into(),
                start_date,
                end_date,
                terms,
                conditions: conditions.map(Into::into),
                special_clauses: special_clauses.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the draft `Lease` owned by the current `User` and submits it
    /// for signing.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` with the provided ID does not exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Lease`;
    /// - `LEASE_NOT_EDITABLE` - the `Lease` is not a draft anymore;
    /// - `INVALID_LEASE_PERIOD` - `endDate` is not after `startDate`;
    /// - `INVALID_DUE_DAY` - the due day is not a day of month;
    /// - `CURRENCY_MISMATCH` - the terms have different currencies.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "updateLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
            start_date = %start_date,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn update_lease(
        id: api::lease::Id,
        start_date: Date,
        end_date: Date,
        terms: api::lease::TermsInput,
        conditions: api::lease::Conditions,
        special_clauses: Option<api::lease::Clauses>,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let terms = domain::lease::Terms::try_from(terms)
            .map_err(Error::from)?;

        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::UpdateLease {
                lease_id: id.into(),
                initiator_id: my_id.into(),
                start_date,
                end_date,
                terms,
                conditions: conditions.into(),
                special_clauses: special_clauses.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Signs the `Lease` with the provided ID by the current `User`.
    ///
    /// Signing an already signed `Lease` changes nothing.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` with the provided ID does not exist;
    /// - `NOT_LEASE_PARTY` - the current `User` is not a party of the
    ///                       `Lease`;
    /// - `LEASE_NOT_SIGNABLE` - the `Lease` is not awaiting signatures.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "signLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn sign_lease(
        id: api::lease::Id,
        signature: api::lease::SignatureData,
        ctx: &Context,
    ) -> Result<api::lease::SignResult, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let user_agent = ctx
            .user_agent()
            .and_then(|ua| domain::lease::signature::UserAgent::new(ua));
        ctx.service()
            .execute(command::SignLease {
                lease_id: id.into(),
                signer_id: my_id.into(),
                signature: signature.into(),
                ip_address: ctx.client_ip(),
                user_agent,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels or finalizes the `Lease` owned by the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LEASE_NOT_EXISTS` - the `Lease` with the provided ID does not exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Lease`;
    /// - `LEASE_NOT_TERMINABLE` - the `Lease` cannot be terminated in its
    ///                            current status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "terminateLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
            termination = ?termination,
        ),
    )]
    pub async fn terminate_lease(
        id: api::lease::Id,
        termination: api::lease::Termination,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::TerminateLease {
                lease_id: id.into(),
                initiator_id: my_id.into(),
                termination: termination.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Registers a payment made against the `Payment` with the provided ID.
    ///
    /// Nothing is registered if the `Payment` is fully paid already.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the provided ID does not
    ///                          exist;
    /// - `NOT_LEASE_PARTY` - the current `User` is not a party of the
    ///                       `Lease`;
    /// - `NON_POSITIVE_AMOUNT` - the amount is zero or negative;
    /// - `CURRENCY_MISMATCH` - the amount is not in the `Lease` currency.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "registerPayment",
            id = %id,
            method = ?method,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn register_payment(
        id: api::payment::Id,
        amount: Money,
        method: api::payment::Method,
        reference: Option<api::payment::Reference>,
        notes: Option<api::payment::Notes>,
        ctx: &Context,
    ) -> Result<api::payment::RegisterResult, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::RegisterPayment {
                payment_id: id.into(),
                registrar_id: my_id.into(),
                amount,
                method: method.into(),
                reference: reference.map(Into::into),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the `Payment` with the provided ID as fully paid.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the provided ID does not
    ///                          exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Lease`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "markPaymentPaid",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn mark_payment_paid(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::payment::MarkPaidResult, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::MarkPaymentPaid {
                payment_id: id.into(),
                owner_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the `Payment` with the provided ID as overdue, recalculating its
    /// late fee.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the provided ID does not
    ///                          exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Lease`;
    /// - `PAYMENT_NOT_DUE` - the `Payment` due date is not in the past;
    /// - `PAYMENT_PAID` - the `Payment` is fully paid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "markPaymentOverdue",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn mark_payment_overdue(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::payment::MarkOverdueResult, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::MarkPaymentOverdue {
                payment_id: id.into(),
                owner_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Generates the invoice of the `Payment` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the provided ID does not
    ///                          exist;
    /// - `NOT_LEASE_PARTY` - the current `User` is not a party of the
    ///                       `Lease`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "generateInvoice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn generate_invoice(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::payment::Invoice, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::GenerateInvoice {
                payment_id: id.into(),
                requester_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Requests a maintenance of the `Property` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` with the provided ID does not
    ///                           exist;
    /// - `NOT_PROPERTY_PARTY` - the current `User` neither owns nor rents the
    ///                          `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            gql.name = "createMaintenanceTicket",
            otel.name = Self::SPAN_NAME,
            priority = ?priority,
            property_id = %property_id,
            title = %title,
        ),
    )]
    pub async fn create_maintenance_ticket(
        property_id: api::property::Id,
        title: api::maintenance::Title,
        description: api::maintenance::Description,
        category: api::maintenance::Category,
        priority: api::maintenance::Priority,
        location: Option<api::maintenance::Location>,
        ctx: &Context,
    ) -> Result<api::MaintenanceTicket, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CreateMaintenanceTicket {
                property_id: property_id.into(),
                requester_id: my_id.into(),
                title: title.into(),
                description: description.into(),
                category: category.into(),
                priority: priority.into(),
                location: location.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Manages the `MaintenanceTicket` of the `Property` owned by the current
    /// `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MAINTENANCE_TICKET_NOT_EXISTS` - the `MaintenanceTicket` with the
    ///                                     provided ID does not exist;
    /// - `NOT_OWNER` - the current `User` doesn't own the `Property`;
    /// - `NEGATIVE_COST` - a provided cost is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            assignee_id = ?assignee_id,
            gql.name = "manageMaintenanceTicket",
            id = %id,
            otel.name = Self::SPAN_NAME,
            priority = ?priority,
            status = ?status,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn manage_maintenance_ticket(
        id: api::maintenance::Id,
        status: api::maintenance::Status,
        priority: api::maintenance::Priority,
        assignee_id: Option<api::user::Id>,
        estimated_on: Option<Date>,
        estimated_cost: Option<Money>,
        final_cost: Option<Money>,
        cost_bearer: Option<api::maintenance::CostBearer>,
        owner_notes: Option<api::maintenance::Notes>,
        resolution: Option<api::maintenance::Resolution>,
        ctx: &Context,
    ) -> Result<api::MaintenanceTicket, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::ManageMaintenanceTicket {
                ticket_id: id.into(),
                owner_id: my_id.into(),
                status: status.into(),
                priority: priority.into(),
                assignee_id: assignee_id.map(Into::into),
                estimated_on,
                estimated_cost,
                final_cost,
                cost_bearer: cost_bearer.map(Into::into),
                owner_notes: owner_notes.map(Into::into),
                resolution: resolution.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Comments the `MaintenanceTicket` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MAINTENANCE_TICKET_NOT_EXISTS` - the `MaintenanceTicket` with the
    ///                                     provided ID does not exist;
    /// - `NOT_PROPERTY_PARTY` - the current `User` is not a party of the
    ///                          `MaintenanceTicket`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "commentMaintenanceTicket",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn comment_maintenance_ticket(
        id: api::maintenance::Id,
        text: api::maintenance::CommentText,
        ctx: &Context,
    ) -> Result<api::maintenance::Comment, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CommentMaintenanceTicket {
                ticket_id: id.into(),
                author_id: my_id.into(),
                text: text.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `MaintenanceTicket` with the provided ID.
    ///
    /// Requester may cancel a pending `MaintenanceTicket` only, while the
    /// `Property` owner may cancel any open one.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MAINTENANCE_TICKET_NOT_EXISTS` - the `MaintenanceTicket` with the
    ///                                     provided ID does not exist;
    /// - `NOT_PROPERTY_PARTY` - the current `User` is not a party of the
    ///                          `MaintenanceTicket`;
    /// - `MAINTENANCE_TICKET_NOT_CANCELLABLE` - the `MaintenanceTicket`
    ///   cannot be cancelled by the current `User` in its current status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelMaintenanceTicket",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_maintenance_ticket(
        id: api::maintenance::Id,
        ctx: &Context,
    ) -> Result<api::MaintenanceTicket, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::CancelMaintenanceTicket {
                ticket_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the `Notification` with the provided ID as read.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOTIFICATION_NOT_EXISTS` - the current `User` has no
    ///                               `Notification` with the provided ID.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "markNotificationRead",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn mark_notification_read(
        id: api::notification::Id,
        ctx: &Context,
    ) -> Result<api::Notification, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::MarkNotificationRead {
                notification_id: id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks all the `Notification`s of the current `User` as read.
    ///
    /// Returns the number of `Notification`s marked as read.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "markAllNotificationsRead",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn mark_all_notifications_read(
        ctx: &Context,
    ) -> Result<i32, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let count = ctx
            .service()
            .execute(command::MarkAllNotificationsRead {
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        i32::try_from(count)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Deletes the `Notification` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOTIFICATION_NOT_EXISTS` - the current `User` has no
    ///                               `Notification` with the provided ID.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteNotification",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_notification(
        id: api::notification::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(command::DeleteNotification {
                notification_id: id.into(),
                user_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }
}

define_error! {
    enum CurrencyError {
        #[code = "CURRENCY_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Monetary amounts must share one currency"]
        Mismatch,
    }
}

define_error! {
    enum PeriodError {
        #[code = "INVALID_LEASE_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "`Lease` end date must be after its start date"]
        Invalid,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another \
                             `User`"]
                LoginOccupied,

                #[code = "NATIONAL_ID_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserNationalId` is used by another `User`"]
                NationalIdOccupied,

                #[code = "NO_CONTACT_INFO"]
                #[status = BAD_REQUEST]
                #[message = "Either `UserEmail` or `UserPhone` must be \
                             provided"]
                NoContactInfo,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::NationalIdOccupied(_) => {
                Some(Error::NationalIdOccupied.into())
            }
            Self::NoContactInfo => Some(Error::NoContactInfo.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CurrencyMismatch => Some(CurrencyError::Mismatch.into()),
            Self::Db(e) => e.try_as_error(),
            Self::UserNotOwner(_) => Some(api::PrivilegeError::Owner.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::update_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "RENTED_STATUS_RESERVED"]
                #[status = BAD_REQUEST]
                #[message = "`RENTED` status is managed by `Lease`s only"]
                RentedStatusReserved,
            }
        }

        match self {
            Self::CurrencyMismatch => Some(CurrencyError::Mismatch.into()),
            Self::Db(e) => e.try_as_error(),
            Self::NotPropertyOwner(_) => {
                Some(api::PrivilegeError::Owner.into())
            }
            Self::PropertyNotExists(_) => {
                Some(api::query::PropertyError::NotExists.into())
            }
            Self::RentedStatusReserved => {
                Some(Error::RentedStatusReserved.into())
            }
        }
    }
}

impl AsError for command::create_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROPERTY_NOT_AVAILABLE"]
                #[status = CONFLICT]
                #[message = "`Property` is not available for rent"]
                PropertyNotAvailable,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PropertyNotAvailable(_) => {
                Some(Error::PropertyNotAvailable.into())
            }
            Self::PropertyNotExists(_) => {
                Some(api::query::PropertyError::NotExists.into())
            }
            Self::UserNotTenant(_) => Some(api::PrivilegeError::Tenant.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum RentalRequestStateError {
        #[code = "RENTAL_REQUEST_NOT_PENDING"]
        #[status = CONFLICT]
        #[message = "`RentalRequest` is not pending anymore"]
        NotPending,
    }
}

impl AsError for command::accept_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DateOutOfRange(_) | Self::PropertyNotExists(_) => None,
            Self::NotPropertyOwner(_) => {
                Some(api::PrivilegeError::Owner.into())
            }
            Self::RequestNotExists(_) => {
                Some(api::query::RentalRequestError::NotExists.into())
            }
            Self::RequestNotPending(_) => {
                Some(RentalRequestStateError::NotPending.into())
            }
        }
    }
}

impl AsError for command::reject_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotPropertyOwner(_) => {
                Some(api::PrivilegeError::Owner.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::RequestNotExists(_) => {
                Some(api::query::RentalRequestError::NotExists.into())
            }
            Self::RequestNotPending(_) => {
                Some(RentalRequestStateError::NotPending.into())
            }
        }
    }
}

impl AsError for command::cancel_rental_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_REQUESTER"]
                #[status = FORBIDDEN]
                #[message = "`RentalRequest` can be cancelled by its \
                             requester only"]
                NotRequester,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotRequester(_) => Some(Error::NotRequester.into()),
            Self::PropertyNotExists(_) => None,
            Self::RequestNotExists(_) => {
                Some(api::query::RentalRequestError::NotExists.into())
            }
            Self::RequestNotPending(_) => {
                Some(RentalRequestStateError::NotPending.into())
            }
        }
    }
}

impl AsError for command::create_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USER_NOT_TENANT"]
                #[status = BAD_REQUEST]
                #[message = "`User` with the provided ID is not a tenant"]
                UserNotTenant,
            }
        }

        match self {
            Self::CurrencyMismatch => Some(CurrencyError::Mismatch.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod(..) => Some(PeriodError::Invalid.into()),
            Self::NotPropertyOwner(_) => {
                Some(api::PrivilegeError::Owner.into())
            }
            Self::PropertyNotExists(_) => {
                Some(api::query::PropertyError::NotExists.into())
            }
            Self::UserNotTenant(_) => Some(Error::UserNotTenant.into()),
            Self::UserNotExists(_) => {
                Some(api::query::UserError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LEASE_NOT_EDITABLE"]
                #[status = CONFLICT]
                #[message = "Only a draft `Lease` can be edited"]
                LeaseNotEditable,
            }
        }

        match self {
            Self::CurrencyMismatch => Some(CurrencyError::Mismatch.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod(..) => Some(PeriodError::Invalid.into()),
            Self::LeaseNotEditable(_) => Some(Error::LeaseNotEditable.into()),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::NotLeaseOwner(_) => Some(api::PrivilegeError::Owner.into()),
        }
    }
}

impl AsError for command::sign_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LEASE_NOT_SIGNABLE"]
                #[status = CONFLICT]
                #[message = "`Lease` is not awaiting signatures"]
                LeaseNotSignable,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::LeaseNotSignable(_) => Some(Error::LeaseNotSignable.into()),
            Self::NotLeaseParty(_) => {
                Some(api::PrivilegeError::LeaseParty.into())
            }
            Self::PropertyNotExists(_) => None,
        }
    }
}

impl AsError for command::terminate_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LEASE_NOT_TERMINABLE"]
                #[status = CONFLICT]
                #[message = "`Lease` cannot be terminated in its current \
                             status"]
                LeaseNotTerminable,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                Some(api::query::LeaseError::NotExists.into())
            }
            Self::LeaseNotTerminable(_) => {
                Some(Error::LeaseNotTerminable.into())
            }
            Self::NotLeaseOwner(_) => Some(api::PrivilegeError::Owner.into()),
        }
    }
}

impl AsError for command::register_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NON_POSITIVE_AMOUNT"]
                #[status = BAD_REQUEST]
                #[message = "Paid amount must be positive"]
                NonPositiveAmount,
            }
        }

        match self {
            Self::CurrencyMismatch(_) => Some(CurrencyError::Mismatch.into()),
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => None,
            Self::NonPositiveAmount(_) => Some(Error::NonPositiveAmount.into()),
            Self::NotLeaseParty(_) => {
                Some(api::PrivilegeError::LeaseParty.into())
            }
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
        }
    }
}

impl AsError for command::mark_payment_paid::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => None,
            Self::NotLeaseOwner(_) => Some(api::PrivilegeError::Owner.into()),
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
        }
    }
}

impl AsError for command::mark_payment_overdue::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_NOT_DUE"]
                #[status = CONFLICT]
                #[message = "`Payment` due date is not in the past"]
                PaymentNotDue,

                #[code = "PAYMENT_PAID"]
                #[status = CONFLICT]
                #[message = "`Payment` is fully paid"]
                PaymentPaid,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => None,
            Self::NotLeaseOwner(_) => Some(api::PrivilegeError::Owner.into()),
            Self::PaymentNotDue(_) => Some(Error::PaymentNotDue.into()),
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
            Self::PaymentPaid(_) => Some(Error::PaymentPaid.into()),
        }
    }
}

impl AsError for command::generate_invoice::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_)
            | Self::PropertyNotExists(_)
            | Self::UserNotExists(_) => None,
            Self::NotLeaseParty(_) => {
                Some(api::PrivilegeError::LeaseParty.into())
            }
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
        }
    }
}

impl AsError for command::create_maintenance_ticket::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotPropertyParty(_) => {
                Some(api::PrivilegeError::PropertyParty.into())
            }
            Self::PropertyNotExists(_) => {
                Some(api::query::PropertyError::NotExists.into())
            }
        }
    }
}

impl AsError for command::manage_maintenance_ticket::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NEGATIVE_COST"]
                #[status = BAD_REQUEST]
                #[message = "Maintenance cost cannot be negative"]
                NegativeCost,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativeCost(_) => Some(Error::NegativeCost.into()),
            Self::NotPropertyOwner(_) => {
                Some(api::PrivilegeError::Owner.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::TicketNotExists(_) => {
                Some(api::query::MaintenanceTicketError::NotExists.into())
            }
        }
    }
}

impl AsError for command::comment_maintenance_ticket::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotTicketParty(_) => {
                Some(api::PrivilegeError::PropertyParty.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::TicketNotExists(_) => {
                Some(api::query::MaintenanceTicketError::NotExists.into())
            }
        }
    }
}

impl AsError for command::cancel_maintenance_ticket::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "MAINTENANCE_TICKET_NOT_CANCELLABLE"]
                #[status = CONFLICT]
                #[message = "`MaintenanceTicket` cannot be cancelled in its \
                             current status"]
                TicketNotCancellable,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotTicketParty(_) => {
                Some(api::PrivilegeError::PropertyParty.into())
            }
            Self::PropertyNotExists(_) => None,
            Self::TicketNotCancellable(_) => {
                Some(Error::TicketNotCancellable.into())
            }
            Self::TicketNotExists(_) => {
                Some(api::query::MaintenanceTicketError::NotExists.into())
            }
        }
    }
}

impl AsError for command::mark_notification_read::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotificationNotExists(_) => {
                Some(api::query::NotificationError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_notification::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotificationNotExists(_) => {
                Some(api::query::NotificationError::NotExists.into())
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use service::command;

    use crate::AsError as _;

    #[test]
    fn maps_privilege_errors_to_forbidden() {
        let err = command::mark_payment_paid::ExecutionError::NotLeaseOwner(
            service::domain::user::Id::new(),
        )
        .into_error();

        assert_eq!(err.code, "NOT_OWNER");
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn maps_missing_entities_to_not_found() {
        let err = command::register_payment::ExecutionError::PaymentNotExists(
            service::domain::payment::Id::new(),
        )
        .into_error();

        assert_eq!(err.code, "PAYMENT_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn maps_state_conflicts_to_conflict() {
        let err = command::accept_rental_request::ExecutionError::
            RequestNotPending(service::domain::rental_request::Id::new())
            .into_error();

        assert_eq!(err.code, "RENTAL_REQUEST_NOT_PENDING");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn maps_unexpected_errors_to_internal() {
        let err = command::generate_invoice::ExecutionError::LeaseNotExists(
            service::domain::lease::Id::new(),
        )
        .into_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
