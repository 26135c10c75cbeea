//! [`Command`] for commenting a [`MaintenanceTicket`].

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        maintenance::{self, Comment},
        property, user, MaintenanceTicket, Notification, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for leaving a [`Comment`] on a [`MaintenanceTicket`] by its
/// requester or by the owner of its [`Property`].
#[derive(Clone, Debug)]
pub struct CommentMaintenanceTicket {
    /// ID of the [`MaintenanceTicket`] to be commented.
    pub ticket_id: maintenance::Id,

    /// ID of the [`User`] leaving the [`Comment`].
    ///
    /// [`User`]: crate::domain::User
    pub author_id: user::Id,

    /// [`maintenance::CommentText`] of the [`Comment`].
    pub text: maintenance::CommentText,
}

impl<Db> Command<CommentMaintenanceTicket> for Service<Db>
where
    Db: Database<
            Select<By<Option<MaintenanceTicket>, maintenance::Id>>,
            Ok = Option<MaintenanceTicket>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Comment>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Comment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CommentMaintenanceTicket,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CommentMaintenanceTicket {
            ticket_id,
            author_id,
            text,
        } = cmd;

        let ticket = self
            .database()
            .execute(Select(By::<Option<MaintenanceTicket>, _>::new(
                ticket_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TicketNotExists(ticket_id))
            .map_err(tracerr::wrap!())?;
        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(ticket.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(ticket.property_id))
            .map_err(tracerr::wrap!())?;
        let recipient_id = if property.is_owned_by(author_id) {
            ticket.requester_id
        } else if ticket.requester_id == author_id {
            property.owner_id
        } else {
            return Err(tracerr::new!(E::NotTicketParty(author_id)));
        };

        let comment = Comment {
            id: maintenance::CommentId::new(),
            ticket_id,
            author_id,
            text,
            created_at: maintenance::CommentCreationDateTime::now(),
        };
        let notification = (recipient_id != author_id).then(|| {
            Notification::maintenance_commented(
                recipient_id,
                &ticket.number,
                ticket.id,
            )
        });

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(comment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        if let Some(n) = &notification {
            tx.execute(Insert(n.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(n) = &notification {
            self.publish(n);
        }

        Ok(comment)
    }
}

/// Error of [`CommentMaintenanceTicket`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is neither the requester nor the owner.
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not a party of the `MaintenanceTicket`")]
    NotTicketParty(#[error(not(source))] user::Id),

    /// [`Property`] of the [`MaintenanceTicket`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`MaintenanceTicket`] with the provided ID does not exist.
    #[display("`MaintenanceTicket(id: {_0})` does not exist")]
    TicketNotExists(#[error(not(source))] maintenance::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{CancelMaintenanceTicket, CreateMaintenanceTicket},
        domain::{
            lease,
            maintenance::{self, Comment},
            user, Lease,
        },
        infra::Database as _,
        test, Command as _,
    };

    use super::{CommentMaintenanceTicket, ExecutionError};

    #[tokio::test]
    async fn parties_comment_in_any_state() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let outsider = test::user(&svc, "outsider", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        test::save(
            &svc,
            Lease {
                status: lease::Status::Active,
                ..lease
            },
        )
        .await;
        let ticket = svc
            .execute(CreateMaintenanceTicket {
                property_id: property.id,
                requester_id: tenant.id,
                title: "No hot water".parse().unwrap(),
                description: "Boiler doesn't start".parse().unwrap(),
                category: maintenance::Category::Appliance,
                priority: maintenance::Priority::Low,
                location: None,
            })
            .await
            .unwrap();
        _ = svc
            .execute(CancelMaintenanceTicket {
                ticket_id: ticket.id,
                initiator_id: tenant.id,
            })
            .await
            .unwrap();

        let comment = |author_id, text: &str| CommentMaintenanceTicket {
            ticket_id: ticket.id,
            author_id,
            text: text.parse().unwrap(),
        };
        _ = svc.execute(comment(tenant.id, "Fixed it myself")).await.unwrap();
        _ = svc.execute(comment(owner.id, "Thanks")).await.unwrap();

        let err = svc
            .execute(comment(outsider.id, "Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotTicketParty(_)));

        let comments = svc
            .database()
            .execute(Select(By::<Vec<Comment>, _>::new(ticket.id)))
            .await
            .unwrap();
        assert_eq!(comments.len(), 2);
        // Request, cancellation and a comment.
        assert_eq!(test::unread(&svc, owner.id).await.count, 3);
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }
}
