//! [`Command`] for cancelling a [`MaintenanceTicket`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        maintenance, property, user, MaintenanceTicket, Notification, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`MaintenanceTicket`].
///
/// The requester may cancel only a pending [`MaintenanceTicket`], while the
/// owner of its [`Property`] may cancel any open one.
#[derive(Clone, Copy, Debug)]
pub struct CancelMaintenanceTicket {
    /// ID of the [`MaintenanceTicket`] to be cancelled.
    pub ticket_id: maintenance::Id,

    /// ID of the [`User`] cancelling the [`MaintenanceTicket`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,
}

impl<Db> Command<CancelMaintenanceTicket> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<MaintenanceTicket, maintenance::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<MaintenanceTicket>, maintenance::Id>>,
            Ok = Option<MaintenanceTicket>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<MaintenanceTicket>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = MaintenanceTicket;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelMaintenanceTicket,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelMaintenanceTicket {
            ticket_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with the owner managing the `MaintenanceTicket`.
        tx.execute(Lock(By::new(ticket_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut ticket = tx
            .execute(Select(By::<Option<MaintenanceTicket>, _>::new(
                ticket_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TicketNotExists(ticket_id))
            .map_err(tracerr::wrap!())?;
        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(ticket.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(ticket.property_id))
            .map_err(tracerr::wrap!())?;
        let is_owner = property.is_owned_by(initiator_id);
        if !is_owner && ticket.requester_id != initiator_id {
            return Err(tracerr::new!(E::NotTicketParty(initiator_id)));
        }
        if !ticket.is_cancellable_by(initiator_id, is_owner) {
            return Err(tracerr::new!(E::TicketNotCancellable(ticket.status)));
        }
        ticket.transition(maintenance::Status::Cancelled);

        let recipient_id = if is_owner {
            ticket.requester_id
        } else {
            property.owner_id
        };
        let notification = (recipient_id != initiator_id).then(|| {
            Notification::maintenance_cancelled(
                recipient_id,
                &ticket.number,
                ticket.id,
            )
        });

        tx.execute(Update(ticket.clone()))
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

        self.publish(&ticket);
        if let Some(n) = &notification {
            self.publish(n);
        }

        Ok(ticket)
    }
}

/// Error of [`CancelMaintenanceTicket`] [`Command`] execution.
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

    /// [`MaintenanceTicket`] cannot be cancelled by the [`User`] in its
    /// current status.
    ///
    /// [`User`]: crate::domain::User
    #[display("`MaintenanceTicket` in `{_0}` status cannot be cancelled")]
    TicketNotCancellable(#[error(not(source))] maintenance::Status),

    /// [`MaintenanceTicket`] with the provided ID does not exist.
    #[display("`MaintenanceTicket(id: {_0})` does not exist")]
    TicketNotExists(#[error(not(source))] maintenance::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CreateMaintenanceTicket, ManageMaintenanceTicket},
        domain::{lease, maintenance, user, Lease, MaintenanceTicket, User},
        infra::Memory,
        test, Command as _, Service,
    };

    use super::{CancelMaintenanceTicket, ExecutionError};

    async fn ticket(
        svc: &Service<Memory>,
        owner: &User,
        tenant: &User,
    ) -> MaintenanceTicket {
        let property = test::property(svc, owner).await;
        let lease =
            test::lease(svc, &property, tenant, "2024-01-10", "2024-04-10")
                .await;
        test::save(
            svc,
            Lease {
                status: lease::Status::Active,
                ..lease
            },
        )
        .await;
        svc.execute(CreateMaintenanceTicket {
            property_id: property.id,
            requester_id: tenant.id,
            title: "Cracked window".parse().unwrap(),
            description: "Bedroom window glass is cracked".parse().unwrap(),
            category: maintenance::Category::Structural,
            priority: maintenance::Priority::Medium,
            location: Some("Bedroom".parse().unwrap()),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn requester_cancels_only_pending() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let ticket = ticket(&svc, &owner, &tenant).await;
        _ = svc
            .execute(ManageMaintenanceTicket {
                ticket_id: ticket.id,
                owner_id: owner.id,
                status: maintenance::Status::Approved,
                priority: ticket.priority,
                assignee_id: None,
                estimated_on: None,
                estimated_cost: None,
                final_cost: None,
                cost_bearer: None,
                owner_notes: None,
                resolution: None,
            })
            .await
            .unwrap();
        let cmd = CancelMaintenanceTicket {
            ticket_id: ticket.id,
            initiator_id: tenant.id,
        };

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::TicketNotCancellable(maintenance::Status::Approved),
        ));

        let cancelled = svc
            .execute(CancelMaintenanceTicket {
                initiator_id: owner.id,
                ..cmd
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, maintenance::Status::Cancelled);
        // Approval and cancellation.
        assert_eq!(test::unread(&svc, tenant.id).await.count, 2);

        let err = svc
            .execute(CancelMaintenanceTicket {
                initiator_id: owner.id,
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::TicketNotCancellable(maintenance::Status::Cancelled),
        ));
    }

    #[tokio::test]
    async fn outsider_cannot_cancel() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let outsider = test::user(&svc, "outsider", user::Kind::Tenant).await;
        let ticket = ticket(&svc, &owner, &tenant).await;

        let err = svc
            .execute(CancelMaintenanceTicket {
                ticket_id: ticket.id,
                initiator_id: outsider.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotTicketParty(_)));
    }
}
