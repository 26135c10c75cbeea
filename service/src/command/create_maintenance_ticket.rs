//! [`Command`] for requesting a maintenance of a [`Property`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        maintenance, property, user, MaintenanceTicket, Notification, Property,
    },
    infra::{database, Database},
    read::lease::ActiveTenancy,
    Service,
};

use super::Command;

/// [`Command`] for requesting a maintenance of a [`Property`] by its owner or
/// by its current tenant.
#[derive(Clone, Debug)]
pub struct CreateMaintenanceTicket {
    /// ID of the [`Property`] needing maintenance.
    pub property_id: property::Id,

    /// ID of the [`User`] requesting the maintenance.
    ///
    /// [`User`]: crate::domain::User
    pub requester_id: user::Id,

    /// [`maintenance::Title`] of a new [`MaintenanceTicket`].
    pub title: maintenance::Title,

    /// [`maintenance::Description`] of the issue.
    pub description: maintenance::Description,

    /// [`maintenance::Category`] of the issue.
    pub category: maintenance::Category,

    /// [`maintenance::Priority`] of a new [`MaintenanceTicket`].
    pub priority: maintenance::Priority,

    /// [`maintenance::Location`] of the issue in the [`Property`], if any.
    pub location: Option<maintenance::Location>,
}

impl<Db> Command<CreateMaintenanceTicket> for Service<Db>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<ActiveTenancy, (property::Id, user::Id)>>,
            Ok = ActiveTenancy,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<maintenance::Number, i32>>,
            Ok = maintenance::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<MaintenanceTicket>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = MaintenanceTicket;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateMaintenanceTicket,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateMaintenanceTicket {
            property_id,
            requester_id,
            title,
            description,
            category,
            priority,
            location,
        } = cmd;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        let is_owner = property.is_owned_by(requester_id);
        if !is_owner {
            let ActiveTenancy(is_tenant) = self
                .database()
                .execute(Select(By::<ActiveTenancy, _>::new((
                    property_id,
                    requester_id,
                ))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if !is_tenant {
                return Err(tracerr::new!(E::NotPropertyParty(requester_id)));
            }
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let number = tx
            .execute(Select(By::<maintenance::Number, _>::new(
                Date::today().year(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let ticket = MaintenanceTicket {
            id: maintenance::Id::new(),
            number,
            property_id,
            requester_id,
            assignee_id: None,
            title,
            description,
            category,
            priority,
            status: maintenance::Status::Pending,
            location,
            requested_at: maintenance::RequestDateTime::now(),
            reviewed_at: None,
            started_at: None,
            completed_at: None,
            estimated_on: None,
            estimated_cost: None,
            final_cost: None,
            cost_bearer: maintenance::CostBearer::Owner,
            owner_notes: None,
            resolution: None,
        };
        let notification = (!is_owner).then(|| {
            Notification::maintenance_requested(
                property.owner_id,
                &ticket.number,
                ticket.id,
                ticket.priority,
            )
        });

        tx.execute(Insert(ticket.clone()))
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

/// Error of [`CreateMaintenanceTicket`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] neither owns nor currently rents the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` neither owns nor rents the `Property`")]
    NotPropertyParty(#[error(not(source))] user::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{lease, maintenance, property, user, Lease},
        test, Command as _,
    };

    use super::{CreateMaintenanceTicket, ExecutionError};

    fn cmd(property_id: property::Id, requester_id: user::Id) -> CreateMaintenanceTicket {
        CreateMaintenanceTicket {
            property_id,
            requester_id,
            title: "Leaking sink".parse().unwrap(),
            description: "Kitchen sink leaks under the cabinet"
                .parse()
                .unwrap(),
            category: maintenance::Category::Plumbing,
            priority: maintenance::Priority::High,
            location: Some("Kitchen".parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn current_tenant_requests_and_owner_is_notified() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;

        let err = svc.execute(cmd(property.id, tenant.id)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPropertyParty(_)));

        test::save(
            &svc,
            Lease {
                status: lease::Status::Active,
                ..lease
            },
        )
        .await;
        let ticket = svc.execute(cmd(property.id, tenant.id)).await.unwrap();

        assert_eq!(ticket.status, maintenance::Status::Pending);
        assert!(ticket.number.to_string().starts_with("MNT-"));
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);
    }

    #[tokio::test]
    async fn owner_requests_without_notification() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;

        let ticket = svc.execute(cmd(property.id, owner.id)).await.unwrap();

        assert_eq!(ticket.requester_id, owner.id);
        assert_eq!(test::unread(&svc, owner.id).await.count, 0);
        assert_eq!(inbox.drain().len(), 1);
    }
}
