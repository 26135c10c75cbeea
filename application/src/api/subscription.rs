//! GraphQL [`Subscription`]s definitions.

use std::time::Duration;

use common::DateTime;
use futures::{
    stream::{self, BoxStream},
    FutureExt as _, StreamExt as _,
};
use juniper::graphql_subscription;
use service::{query, Query as _};

use crate::{context, AsError as _, Context, Error};

/// Root of all GraphQL subscription.
#[derive(Clone, Copy, Debug)]
pub struct Subscription;

impl Subscription {
    /// Interval of polling the unread `Notification`s count.
    const UNREAD_POLL_INTERVAL: Duration = Duration::from_secs(5);
}

#[graphql_subscription(context = Context)]
impl Subscription {
    /// Subscription waiting for the current authenticated session to expire.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - if the current session is not
    ///                              authenticated or session expired.
    pub async fn wait_session(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, Result<bool, Error>>, Error> {
        let session = ctx.current_session().await?;
        let timeout = session.expires_at - DateTime::now();
        Ok(stream::once(
            tokio::time::sleep(timeout).map(|()| {
                Err(context::AuthError::AuthorizationRequired.into())
            }),
        )
        .boxed())
    }

    /// Subscription emitting the number of unread `Notification`s of the
    /// current authenticated `User` every time it changes.
    ///
    /// The current number is emitted right away.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - if the current session is not
    ///                              authenticated.
    pub async fn unread_notifications_count(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, Result<i32, Error>>, Error> {
        let user_id = ctx.current_session().await?.user_id.into();
        let service = ctx.service().clone();
        let interval = tokio::time::interval(Self::UNREAD_POLL_INTERVAL);

        Ok(stream::unfold(
            (service, interval, None),
            move |(service, mut interval, last)| async move {
                loop {
                    _ = interval.tick().await;
                    let res = service
                        .execute(query::notifications::Unread::by(user_id))
                        .await;
                    match res {
                        Ok(unread) if Some(unread.count) == last => {}
                        Ok(unread) => {
                            let count = unread.count;
                            return Some((
                                Ok(count),
                                (service, interval, Some(count)),
                            ));
                        }
                        Err(e) => {
                            return Some((
                                Err(e.into_error()),
                                (service, interval, last),
                            ));
                        }
                    }
                }
            },
        )
        .boxed())
    }
}
