//! [`User`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A [`User`] of the system.
#[derive(Clone, Debug, From)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`domain::User`] representing this [`User`].
    user: OnceCell<domain::User>,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id.into(),
            user: OnceCell::new_with(Some(user)),
        }
    }
}

impl User {
    /// Creates a new [`User`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`User`] with the provided ID exists,
    /// otherwise accessing this [`User`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            user: OnceCell::new(),
        }
    }

    /// Returns the [`domain::User`] representing this [`User`].
    ///
    /// # Errors
    ///
    /// Error if the [`domain::User`] doesn't exist.
    async fn user(&self, ctx: &Context) -> Result<&domain::User, Error> {
        let id = self.id.into();
        self.user
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::user::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|u| {
                        future::ready(u.ok_or_else(|| {
                            api::query::UserError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Returns the [`domain::User`] if it represents the currently
    /// authenticated [`User`].
    async fn myself(
        &self,
        ctx: &Context,
    ) -> Result<Option<&domain::User>, Error> {
        let my_id = ctx.try_current_session().await?.map(|s| s.user_id);
        if my_id == Some(self.id) {
            self.user(ctx).await.map(Some)
        } else {
            Ok(None)
        }
    }
}

/// A `User` of the system.
#[graphql_object(context = Context)]
impl User {
    /// Unique identifier of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.user(ctx).await?.name.clone().into())
    }

    /// Kind of this `User`.
    pub async fn kind(&self, ctx: &Context) -> Result<Kind, Error> {
        Ok(self.user(ctx).await?.kind.into())
    }

    /// Login of this `User`.
    ///
    /// Visible only to this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.login",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn login(&self, ctx: &Context) -> Result<Option<Login>, Error> {
        Ok(self.myself(ctx).await?.map(|u| u.login.clone().into()))
    }

    /// Email of this `User`.
    ///
    /// Visible only to this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.email",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn email(&self, ctx: &Context) -> Result<Option<Email>, Error> {
        Ok(self
            .myself(ctx)
            .await?
            .and_then(|u| u.email.clone())
            .map(Into::into))
    }

    /// Phone of this `User`.
    ///
    /// Visible only to this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Option<Phone>, Error> {
        Ok(self
            .myself(ctx)
            .await?
            .and_then(|u| u.phone.clone())
            .map(Into::into))
    }

    /// National identification number of this `User`.
    ///
    /// Visible only to this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.nationalId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn national_id(
        &self,
        ctx: &Context,
    ) -> Result<Option<NationalId>, Error> {
        Ok(self
            .myself(ctx)
            .await?
            .and_then(|u| u.national_id.clone())
            .map(Into::into))
    }

    /// Public `UserProfile` of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.profile",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn profile(&self, ctx: &Context) -> Result<Profile, Error> {
        ctx.service()
            .execute(query::user::ProfileOf::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::query::UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// `DateTime` when this `User` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.user(ctx).await?.created_at.coerce())
    }
}

/// Public profile of a [`User`].
#[derive(Clone, Debug, From)]
pub struct Profile(domain::user::Profile);

/// Public profile of a `User`.
#[graphql_object(name = "UserProfile", context = Context)]
impl Profile {
    /// Biography of the `User`.
    #[must_use]
    pub fn biography(&self) -> Option<Biography> {
        self.0.biography.clone().map(Into::into)
    }

    /// Average rating given to the `User`, from 0 to 5.
    #[must_use]
    pub fn rating(&self) -> scalar::Decimal {
        self.0.rating.into()
    }

    /// Number of ratings given to the `User`.
    #[must_use]
    pub fn ratings_count(&self) -> i32 {
        self.0.ratings_count
    }

    /// Indicator whether identity of the `User` is verified.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.0.is_verified
    }

    /// `DateTime` when this `UserProfile` was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Name of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserName",
    with = scalar::Via::<domain::user::Name>,
)]
pub struct Name(domain::user::Name);

/// Login of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserLogin",
    with = scalar::Via::<domain::user::Login>,
)]
pub struct Login(domain::user::Login);

/// Password of a `User`.
#[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPassword",
    with = scalar::Via::<domain::user::Password>,
)]
pub struct Password(domain::user::Password);

/// Email of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserEmail",
    with = scalar::Via::<domain::user::Email>,
)]
pub struct Email(domain::user::Email);

/// Phone of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPhone",
    with = scalar::Via::<domain::user::Phone>,
)]
pub struct Phone(domain::user::Phone);

/// National identification number of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserNationalId",
    with = scalar::Via::<domain::user::NationalId>,
)]
pub struct NationalId(domain::user::NationalId);

/// Biography of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserBiography",
    with = scalar::Via::<domain::user::profile::Biography>,
)]
pub struct Biography(domain::user::profile::Biography);

/// Kind of a `User`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "UserKind")]
pub enum Kind {
    /// `User` publishing and leasing out properties.
    Owner,

    /// `User` renting properties.
    Tenant,
}

impl From<domain::user::Kind> for Kind {
    fn from(kind: domain::user::Kind) -> Self {
        use domain::user::Kind as K;
        match kind {
            K::Owner => Self::Owner,
            K::Tenant => Self::Tenant,
        }
    }
}

impl From<Kind> for domain::user::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Owner => Self::Owner,
            Kind::Tenant => Self::Tenant,
        }
    }
}

pub mod session {
    //! [`Session`]-related definitions.
    //!
    //! [`Session`]: crate::Session

    use common::DateTime;
    use derive_more::{AsRef, From, Into};
    use juniper::{GraphQLObject, GraphQLScalar};
    use service::{command, domain};

    use crate::{
        api::{self, scalar},
        Context,
    };

    /// `Session` access token.
    #[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "UserAuthToken",
        with = scalar::Via::<domain::user::session::Token>,
    )]
    pub struct Token(domain::user::session::Token);

    /// Result of a `Session` creation.
    #[derive(Clone, Debug, From, GraphQLObject)]
    #[graphql(context = Context, name = "CreateSessionResult")]
    pub struct CreateResult {
        /// Access token of the created `Session`.
        pub token: Token,

        /// `User` associated with the created `Session`.
        pub user: api::User,

        /// `DateTime` when the created `Session` expires.
        pub expires_at: DateTime,
    }

    impl From<command::create_user_session::Output> for CreateResult {
        fn from(output: command::create_user_session::Output) -> Self {
            let command::create_user_session::Output {
                token,
                user,
                expires_at,
            } = output;
            Self {
                token: token.into(),
                user: user.into(),
                expires_at: expires_at.coerce(),
            }
        }
    }
}
