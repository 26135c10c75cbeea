//! [`Command`] for deleting a [`Notification`].

use common::operations::{By, Delete, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{notification, user, Notification},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Notification`] by its recipient.
#[derive(Clone, Copy, Debug)]
pub struct DeleteNotification {
    /// ID of the [`Notification`] to be deleted.
    pub notification_id: notification::Id,

    /// ID of the [`User`] receiving the [`Notification`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,
}

impl<Db> Command<DeleteNotification> for Service<Db>
where
    Db: Database<
            Select<By<Option<Notification>, notification::Id>>,
            Ok = Option<Notification>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Notification, notification::Id>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteNotification,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteNotification {
            notification_id,
            user_id,
        } = cmd;

        _ = self
            .database()
            .execute(Select(By::<Option<Notification>, _>::new(
                notification_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|n| n.recipient_id == user_id)
            .ok_or(E::NotificationNotExists(notification_id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Delete(By::<Notification, _>::new(notification_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteNotification`] [`Command`] execution.
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

    use super::{DeleteNotification, ExecutionError};

    #[tokio::test]
    async fn only_recipient_deletes() {
        let (svc, _inbox) = test::service();
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let other = test::user(&svc, "other", user::Kind::Tenant).await;
        let n = Notification::lease_created(
            tenant.id,
            &lease::Number::new(2024, 3),
            lease::Id::new(),
        );
        svc.database().execute(Insert(n.clone())).await.unwrap();

        let err = svc
            .execute(DeleteNotification {
                notification_id: n.id,
                user_id: other.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotificationNotExists(_),
        ));

        svc.execute(DeleteNotification {
            notification_id: n.id,
            user_id: tenant.id,
        })
        .await
        .unwrap();
        assert_eq!(test::unread(&svc, tenant.id).await.count, 0);
    }
}
