//! [`Notification`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Message notifying a `User` about something happened.
#[derive(Clone, Debug, From)]
pub struct Notification {
    /// ID of this [`Notification`].
    id: Id,

    /// Underlying [`domain::Notification`].
    notification: OnceCell<domain::Notification>,
}

impl From<domain::Notification> for Notification {
    fn from(notification: domain::Notification) -> Self {
        Self {
            id: notification.id.into(),
            notification: OnceCell::new_with(Some(notification)),
        }
    }
}

impl Notification {
    /// Creates a new [`Notification`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Notification`] with the provided ID exists,
    /// otherwise accessing this [`Notification`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            notification: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Notification`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Notification`] doesn't exist.
    async fn notification(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Notification, Error> {
        let id: domain::notification::Id = self.id.into();
        self.notification
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::notifications::ByIds::by(vec![id]))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|mut ns| {
                        future::ready(ns.remove(&id).ok_or_else(|| {
                            api::query::NotificationError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// Message notifying a `User` about something happened.
#[graphql_object(context = Context)]
impl Notification {
    /// Unique identifier of this `Notification`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Title of this `Notification`.
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.notification(ctx).await?.title.clone().into())
    }

    /// Message of this `Notification`.
    pub async fn message(&self, ctx: &Context) -> Result<Message, Error> {
        Ok(self.notification(ctx).await?.message.clone().into())
    }

    /// Kind of this `Notification`.
    pub async fn kind(&self, ctx: &Context) -> Result<Kind, Error> {
        Ok(self.notification(ctx).await?.kind.into())
    }

    /// Relative link to the subject of this `Notification`, if any.
    pub async fn link(&self, ctx: &Context) -> Result<Option<Link>, Error> {
        Ok(self.notification(ctx).await?.link.clone().map(Into::into))
    }

    /// Priority of this `Notification`.
    pub async fn priority(&self, ctx: &Context) -> Result<Priority, Error> {
        Ok(self.notification(ctx).await?.priority.into())
    }

    /// Indicator whether this `Notification` was read.
    pub async fn is_read(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.notification(ctx).await?.is_read())
    }

    /// `DateTime` when this `Notification` was read.
    pub async fn read_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.notification(ctx).await?.read_at.map(|at| at.coerce()))
    }

    /// `DateTime` when this `Notification` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.notification(ctx).await?.created_at.coerce())
    }
}

/// Summary of the unread `Notification`s of a `User`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "UnreadNotifications")]
pub struct Unread {
    /// Number of unread `Notification`s.
    pub count: i32,

    /// Latest unread `Notification`s, newest first.
    pub latest: Vec<Notification>,
}

impl From<read::notification::Unread> for Unread {
    fn from(unread: read::notification::Unread) -> Self {
        Self {
            count: unread.count,
            latest: unread.latest.into_iter().map(Into::into).collect(),
        }
    }
}

/// Unique identifier of a `Notification`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::notification::Id)]
#[into(domain::notification::Id)]
#[graphql(name = "NotificationId", transparent)]
pub struct Id(Uuid);

/// Title of a `Notification`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "NotificationTitle",
    with = scalar::Via::<domain::notification::Title>,
)]
pub struct Title(domain::notification::Title);

/// Message of a `Notification`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "NotificationMessage",
    with = scalar::Via::<domain::notification::Message>,
)]
pub struct Message(domain::notification::Message);

/// Relative link to the subject of a `Notification`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "NotificationLink",
    with = scalar::Via::<domain::notification::Link>,
)]
pub struct Link(domain::notification::Link);

/// Kind of a `Notification`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "NotificationKind")]
pub enum Kind {
    /// System message.
    System,

    /// `Property`-related message.
    Property,

    /// `Lease`-related message.
    Lease,

    /// `Payment`-related message.
    Payment,

    /// Maintenance-related message.
    Maintenance,

    /// Direct message.
    Message,
}

impl From<domain::notification::Kind> for Kind {
    fn from(kind: domain::notification::Kind) -> Self {
        use domain::notification::Kind as K;
        match kind {
            K::System => Self::System,
            K::Property => Self::Property,
            K::Lease => Self::Lease,
            K::Payment => Self::Payment,
            K::Maintenance => Self::Maintenance,
            K::Message => Self::Message,
        }
    }
}

impl From<Kind> for domain::notification::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::System => Self::System,
            Kind::Property => Self::Property,
            Kind::Lease => Self::Lease,
            Kind::Payment => Self::Payment,
            Kind::Maintenance => Self::Maintenance,
            Kind::Message => Self::Message,
        }
    }
}

/// Priority of a `Notification`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "NotificationPriority")]
pub enum Priority {
    /// Low priority.
    Low,

    /// Normal priority.
    Normal,

    /// High priority.
    High,
}

impl From<domain::notification::Priority> for Priority {
    fn from(priority: domain::notification::Priority) -> Self {
        use domain::notification::Priority as P;
        match priority {
            P::Low => Self::Low,
            P::Normal => Self::Normal,
            P::High => Self::High,
        }
    }
}

define_list!(
    Notification,
    read = notification,
    total_count = service::query::notifications::TotalCount,
    names = (
        "NotificationListCursor",
        "NotificationListEdge",
        "NotificationListConnection",
        "NotificationListPageInfo",
    ),
);
