//! [`Command`] for managing a [`MaintenanceTicket`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Date, Money,
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

/// [`Command`] for managing a [`MaintenanceTicket`] by the owner of its
/// [`Property`].
#[derive(Clone, Debug)]
pub struct ManageMaintenanceTicket {
    /// ID of the [`MaintenanceTicket`] to be managed.
    pub ticket_id: maintenance::Id,

    /// ID of the [`User`] owning the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,

    /// New [`maintenance::Status`] of the [`MaintenanceTicket`].
    pub status: maintenance::Status,

    /// New [`maintenance::Priority`] of the [`MaintenanceTicket`].
    pub priority: maintenance::Priority,

    /// ID of the [`User`] assigned to carry out the work, if any.
    ///
    /// [`User`]: crate::domain::User
    pub assignee_id: Option<user::Id>,

    /// Estimated [`Date`] of completion, if any.
    pub estimated_on: Option<Date>,

    /// Estimated cost of the work, if known.
    pub estimated_cost: Option<Money>,

    /// Final cost of the work, if known.
    pub final_cost: Option<Money>,

    /// New [`maintenance::CostBearer`], if it changes.
    pub cost_bearer: Option<maintenance::CostBearer>,

    /// [`maintenance::Notes`] of the owner, if any.
    pub owner_notes: Option<maintenance::Notes>,

    /// Applied [`maintenance::Resolution`], if any.
    pub resolution: Option<maintenance::Resolution>,
}

impl<Db> Command<ManageMaintenanceTicket> for Service<Db>
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
        cmd: ManageMaintenanceTicket,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ManageMaintenanceTicket {
            ticket_id,
            owner_id,
            status,
            priority,
            assignee_id,
            estimated_on,
            estimated_cost,
            final_cost,
            cost_bearer,
            owner_notes,
            resolution,
        } = cmd;

        if let Some(cost) = estimated_cost.into_iter().chain(final_cost).find(
            |c| c.amount.is_sign_negative(),
        ) {
            return Err(tracerr::new!(E::NegativeCost(cost)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with a cancellation by the requester.
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
        if !property.is_owned_by(owner_id) {
            return Err(tracerr::new!(E::NotPropertyOwner(owner_id)));
        }

        ticket.transition(status);
        ticket.priority = priority;
        ticket.assignee_id = assignee_id;
        ticket.estimated_on = estimated_on;
        ticket.estimated_cost = estimated_cost;
        ticket.final_cost = final_cost;
        if let Some(bearer) = cost_bearer {
            ticket.cost_bearer = bearer;
        }
        ticket.owner_notes = owner_notes;
        ticket.resolution = resolution;

        let notification = (ticket.requester_id != owner_id).then(|| {
            Notification::maintenance_updated(
                ticket.requester_id,
                &ticket.number,
                ticket.status,
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

/// Error of [`ManageMaintenanceTicket`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Cost of the work is negative.
    #[display("Cost cannot be negative, got {_0}")]
    NegativeCost(#[error(not(source))] Money),

    /// [`User`] doesn't own the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotPropertyOwner(#[error(not(source))] user::Id),

    /// [`Property`] of the [`MaintenanceTicket`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`MaintenanceTicket`] with the provided ID does not exist.
    #[display("`MaintenanceTicket(id: {_0})` does not exist")]
    TicketNotExists(#[error(not(source))] maintenance::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateMaintenanceTicket,
        domain::{lease, maintenance, user, Lease, MaintenanceTicket},
        test, Command as _,
    };

    use super::{ExecutionError, ManageMaintenanceTicket};

    fn cmd(
        ticket: &MaintenanceTicket,
        owner_id: user::Id,
        status: maintenance::Status,
    ) -> ManageMaintenanceTicket {
        ManageMaintenanceTicket {
            ticket_id: ticket.id,
            owner_id,
            status,
            priority: maintenance::Priority::Urgent,
            assignee_id: None,
            estimated_on: Some(test::date("2024-03-01")),
            estimated_cost: Some(test::money("250000COP")),
            final_cost: None,
            cost_bearer: Some(maintenance::CostBearer::Shared),
            owner_notes: None,
            resolution: None,
        }
    }

    #[tokio::test]
    async fn records_first_entry_into_each_stage() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
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
                title: "Broken lock".parse().unwrap(),
                description: "Front door lock is stuck".parse().unwrap(),
                category: maintenance::Category::Locksmith,
                priority: maintenance::Priority::Medium,
                location: None,
            })
            .await
            .unwrap();

        let reviewed = svc
            .execute(cmd(&ticket, owner.id, maintenance::Status::InReview))
            .await
            .unwrap();
        let reviewed_at = reviewed.reviewed_at.expect("reviewed");
        assert_eq!(reviewed.priority, maintenance::Priority::Urgent);
        assert_eq!(reviewed.cost_bearer, maintenance::CostBearer::Shared);

        let started = svc
            .execute(cmd(&ticket, owner.id, maintenance::Status::InProgress))
            .await
            .unwrap();
        assert!(started.started_at.is_some());

        let back = svc
            .execute(cmd(&ticket, owner.id, maintenance::Status::InReview))
            .await
            .unwrap();
        assert_eq!(back.reviewed_at, Some(reviewed_at));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 3);

        let err = svc
            .execute(cmd(&ticket, tenant.id, maintenance::Status::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPropertyOwner(_)));
    }
}
