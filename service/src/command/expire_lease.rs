//! [`Command`] for expiring a [`Lease`] past its end date.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{lease, property, Lease, Notification, Property},
    infra::{database, Database},
    read::lease::HasOtherActive,
    Service,
};

use super::{terminate_lease::release_property, Command};

/// [`Command`] for expiring an active [`Lease`] whose end date has passed.
#[derive(Clone, Copy, Debug)]
pub struct ExpireLease {
    /// ID of the [`Lease`] to be expired.
    pub lease_id: lease::Id,

    /// Current [`Date`].
    pub today: Date,
}

impl<Db> Command<ExpireLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HasOtherActive, lease::Id>>,
            Ok = HasOtherActive,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// Expired [`Lease`], or [`None`] if it's not due to expire.
    type Ok = Option<Lease>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ExpireLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ExpireLease { lease_id, today } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid expiring a `Lease` being terminated concurrently.
        tx.execute(Lock(By::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        if !lease.expire(today) {
            return Ok(None);
        }

        let property = release_property(&tx, &lease)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let notifications = [lease.owner_id, lease.tenant_id].map(|user_id| {
            Notification::lease_expired(user_id, &lease.number, lease.id)
        });

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        for n in &notifications {
            tx.execute(Insert(n.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&lease);
        if let Some(p) = &property {
            self.publish(p);
        }
        for n in &notifications {
            self.publish(n);
        }

        Ok(Some(lease))
    }
}

/// Error of [`ExpireLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{lease, property, user},
        test, Command as _,
    };

    use super::ExpireLease;

    #[tokio::test]
    async fn expires_only_past_end_date() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let mut property = test::property(&svc, &owner).await;
        property.status = property::Status::Rented;
        test::save(&svc, property.clone()).await;
        let mut lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        lease.status = lease::Status::Active;
        test::save(&svc, lease.clone()).await;

        let on_end_date = svc
            .execute(ExpireLease {
                lease_id: lease.id,
                today: test::date("2024-04-10"),
            })
            .await
            .unwrap();
        assert!(on_end_date.is_none());

        let expired = svc
            .execute(ExpireLease {
                lease_id: lease.id,
                today: test::date("2024-04-11"),
            })
            .await
            .unwrap()
            .expect("expired");

        assert_eq!(expired.status, lease::Status::Expired);
        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Available,
        );
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);

        let again = svc
            .execute(ExpireLease {
                lease_id: lease.id,
                today: test::date("2024-04-12"),
            })
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn property_under_maintenance_keeps_status() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let mut property = test::property(&svc, &owner).await;
        property.status = property::Status::Maintenance;
        test::save(&svc, property.clone()).await;
        let mut lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        lease.status = lease::Status::Active;
        test::save(&svc, lease.clone()).await;

        _ = svc
            .execute(ExpireLease {
                lease_id: lease.id,
                today: test::date("2024-05-01"),
            })
            .await
            .unwrap();

        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Maintenance,
        );
    }
}
