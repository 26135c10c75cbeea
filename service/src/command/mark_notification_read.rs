//! [`Command`]s for marking [`Notification`]s as read.

use common::operations::{By, Commit, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{notification, user, Notification},
    infra::{database, Database},
    read::notification::AllUnread,
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Notification`] as read by its recipient.
#[derive(Clone, Copy, Debug)]
pub struct MarkNotificationRead {
    /// ID of the [`Notification`] to be marked.
    pub notification_id: notification::Id,

    /// ID of the [`User`] receiving the [`Notification`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,
}

impl<Db> Command<MarkNotificationRead> for Service<Db>
where
    Db: Database<
            Select<By<Option<Notification>, notification::Id>>,
            Ok = Option<Notification>,
            Err = Traced<database::Error>,
        > + Database<Update<Notification>, Err = Traced<database::Error>>,
{
    type Ok = Notification;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkNotificationRead,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkNotificationRead {
            notification_id,
            user_id,
        } = cmd;

        let mut notification = self
            .database()
            .execute(Select(By::<Option<Notification>, _>::new(
                notification_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            // Others' notifications are invisible.
            .filter(|n| n.recipient_id == user_id)
            .ok_or(E::NotificationNotExists(notification_id))
            .map_err(tracerr::wrap!())?;
        if !notification.mark_read() {
            return Ok(notification);
        }

        self.database()
            .execute(Update(notification.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&notification);

        Ok(notification)
    }
}

/// [`Command`] for marking all the unread [`Notification`]s of a [`User`] as
/// read.
///
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug)]
pub struct MarkAllNotificationsRead {
    /// ID of the [`User`] receiving the [`Notification`]s.
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,
}

impl<Db> Command<MarkAllNotificationsRead> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<Notification>, AllUnread>>,
            Ok = Vec<Notification>,
            Err = Traced<database::Error>,
        > + Database<Update<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// Number of [`Notification`]s marked as read.
    type Ok = usize;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkAllNotificationsRead,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkAllNotificationsRead { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut unread = tx
            .execute(Select(By::<Vec<Notification>, _>::new(AllUnread(
                user_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        unread.retain_mut(Notification::mark_read);
        for n in &unread {
            tx.execute(Update(n.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        for n in &unread {
            self.publish(n);
        }

        Ok(unread.len())
    }
}

/// Error of [`MarkNotificationRead`] and [`MarkAllNotificationsRead`]
/// [`Command`]s execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Notification`] with the provided ID does not exist.
    #[display("`Notification(id: {_0})` does not exist")]
    NotificationNotExists(#[error(not(source))] notification::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{lease, user, Notification},
        infra::Database as _,
        test, Command as _,
    };

    use super::{ExecutionError, MarkAllNotificationsRead, MarkNotificationRead};

    #[tokio::test]
    async fn recipient_marks_own_notifications() {
        let (svc, _inbox) = test::service();
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let other = test::user(&svc, "other", user::Kind::Tenant).await;
        let number = lease::Number::new(2024, 7);
        let mut notifications = vec![];
        for _ in 0..3 {
            let n = Notification::lease_created(tenant.id, &number, lease::Id::new());
            svc.database().execute(Insert(n.clone())).await.unwrap();
            notifications.push(n);
        }

        let err = svc
            .execute(MarkNotificationRead {
                notification_id: notifications[0].id,
                user_id: other.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotificationNotExists(_),
        ));

        let read = svc
            .execute(MarkNotificationRead {
                notification_id: notifications[0].id,
                user_id: tenant.id,
            })
            .await
            .unwrap();
        assert!(read.is_read());
        assert_eq!(test::unread(&svc, tenant.id).await.count, 2);

        let marked = svc
            .execute(MarkAllNotificationsRead { user_id: tenant.id })
            .await
            .unwrap();
        assert_eq!(marked, 2);
        assert_eq!(test::unread(&svc, tenant.id).await.count, 0);
    }
}
