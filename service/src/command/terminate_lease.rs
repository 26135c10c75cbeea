//! [`Command`] for cancelling or finalizing a [`Lease`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease::{self, Termination},
        property, user, Lease, Notification, Property,
    },
    infra::{database, Database},
    read::lease::HasOtherActive,
    Service,
};

use super::Command;

/// [`Command`] for terminating a [`Lease`] by its owner.
#[derive(Clone, Copy, Debug)]
pub struct TerminateLease {
    /// ID of the [`Lease`] to be terminated.
    pub lease_id: lease::Id,

    /// ID of the [`User`] terminating the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,

    /// Kind of the [`Termination`].
    pub termination: Termination,
}

impl<Db> Command<TerminateLease> for Service<Db>
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
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TerminateLease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TerminateLease {
            lease_id,
            initiator_id,
            termination,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

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
        if lease.owner_id != initiator_id {
            return Err(tracerr::new!(E::NotLeaseOwner(initiator_id)));
        }
        let was_active = lease.is_active();
        if !lease.terminate(termination) {
            return Err(tracerr::new!(E::LeaseNotTerminable(lease.status)));
        }

        let property = if was_active {
            release_property(&tx, &lease)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
        } else {
            None
        };

        let notify = match termination {
            Termination::Cancellation => Notification::lease_cancelled,
            Termination::Finalization => Notification::lease_finalized,
        };
        let notification = notify(lease.tenant_id, &lease.number, lease.id);

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(notification.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&lease);
        if let Some(p) = &property {
            self.publish(p);
        }
        self.publish(&notification);

        Ok(lease)
    }
}

/// Makes the [`Property`] of the provided no longer active [`Lease`]
/// available again, unless another active [`Lease`] still occupies it.
///
/// Returns the updated [`Property`], if its status has changed.
pub(crate) async fn release_property<Tx>(
    tx: &Tx,
    lease: &Lease,
) -> Result<Option<Property>, Traced<database::Error>>
where
    Tx: Database<
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
        > + Database<Update<Property>, Err = Traced<database::Error>>,
{
    // Avoid racing with activation of another `Lease` of the `Property`.
    tx.execute(Lock(By::<Property, _>::new(lease.property_id)))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

    let Some(mut property) = tx
        .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
        .await
        .map_err(tracerr::wrap!())?
    else {
        return Ok(None);
    };
    let HasOtherActive(has_other) = tx
        .execute(Select(By::<HasOtherActive, _>::new(lease.id)))
        .await
        .map_err(tracerr::wrap!())?;

    let status = property.released_status(has_other);
    if status == property.status {
        return Ok(None);
    }
    property.status = status;
    property.updated_at = property::ModificationDateTime::now();
    tx.execute(Update(property.clone()))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

    Ok(Some(property))
}

/// Error of [`TerminateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`Lease`] cannot be terminated in the requested way.
    #[display("`Lease` in `{_0}` status cannot be terminated this way")]
    LeaseNotTerminable(#[error(not(source))] lease::Status),

    /// [`User`] doesn't own the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` doesn't own the `Lease`")]
    NotLeaseOwner(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            lease::{self, Termination},
            property, user, Lease,
        },
        test, Command as _,
    };

    use super::{ExecutionError, TerminateLease};

    #[tokio::test]
    async fn finalizing_active_lease_releases_property() {
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

        let terminated = svc
            .execute(TerminateLease {
                lease_id: lease.id,
                initiator_id: owner.id,
                termination: Termination::Finalization,
            })
            .await
            .unwrap();

        assert_eq!(terminated.status, lease::Status::Finalized);
        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Available,
        );
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }

    #[tokio::test]
    async fn property_stays_rented_while_other_lease_is_active() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let mut property = test::property(&svc, &owner).await;
        property.status = property::Status::Rented;
        test::save(&svc, property.clone()).await;
        let active = |lease: Lease| Lease {
            status: lease::Status::Active,
            ..lease
        };
        let first = active(
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await,
        );
        let second = active(
            test::lease(&svc, &property, &tenant, "2024-02-10", "2024-05-10")
                .await,
        );
        test::save(&svc, first.clone()).await;
        test::save(&svc, second).await;

        _ = svc
            .execute(TerminateLease {
                lease_id: first.id,
                initiator_id: owner.id,
                termination: Termination::Cancellation,
            })
            .await
            .unwrap();

        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Rented,
        );
    }

    #[tokio::test]
    async fn draft_cannot_be_finalized() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let cmd = TerminateLease {
            lease_id: lease.id,
            initiator_id: owner.id,
            termination: Termination::Finalization,
        };

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::LeaseNotTerminable(lease::Status::Draft),
        ));

        let err = svc
            .execute(TerminateLease {
                initiator_id: tenant.id,
                termination: Termination::Cancellation,
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotLeaseOwner(_)));

        let cancelled = svc
            .execute(TerminateLease {
                termination: Termination::Cancellation,
                ..cmd
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, lease::Status::Cancelled);
        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Available,
        );
    }
}
