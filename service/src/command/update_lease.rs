//! [`Command`] for finishing a draft [`Lease`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::lease::{Clauses, Conditions, Terms};
use crate::{
    domain::{lease, user, Lease, Notification},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for editing a draft [`Lease`] by its owner and submitting it
/// for signing.
#[derive(Clone, Debug)]
pub struct UpdateLease {
    /// ID of the [`Lease`] to be updated.
    pub lease_id: lease::Id,

    /// ID of the [`User`] updating the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,

    /// New first day of the [`Lease`].
    pub start_date: Date,

    /// New last day of the [`Lease`].
    pub end_date: Date,

    /// New [`Terms`] of the [`Lease`].
    pub terms: lease::Terms,

    /// New [`Conditions`] of the [`Lease`].
    pub conditions: lease::Conditions,

    /// New special [`Clauses`] of the [`Lease`].
    pub special_clauses: Option<lease::Clauses>,
}

impl<Db> Command<UpdateLease> for Service<Db>
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
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateLease {
            lease_id,
            initiator_id,
            start_date,
            end_date,
            terms,
            conditions,
            special_clauses,
        } = cmd;

        if start_date >= end_date {
            return Err(tracerr::new!(E::InvalidPeriod(start_date, end_date)));
        }
        if !terms.is_consistent() {
            return Err(tracerr::new!(E::CurrencyMismatch));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with signatures.
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
        if !lease.is_editable() {
            return Err(tracerr::new!(E::LeaseNotEditable(lease.status)));
        }

        lease.start_date = start_date;
        lease.end_date = end_date;
        lease.terms = terms;
        lease.conditions = conditions;
        lease.special_clauses = special_clauses;
        _ = lease.submit();

        let notification = Notification::lease_submitted(
            lease.tenant_id,
            &lease.number,
            lease.id,
        );

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
        self.publish(&notification);

        Ok(lease)
    }
}

/// Error of [`UpdateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`lease::Terms`] are given in different currencies.
    #[display("Rent, administration fee and deposit must share one currency")]
    CurrencyMismatch,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] doesn't end after its start.
    #[display("`Lease` from {_0} to {_1} is not a valid period")]
    InvalidPeriod(Date, Date),

    /// [`Lease`] is not a draft anymore.
    #[display("`Lease` in `{_0}` status cannot be edited")]
    LeaseNotEditable(#[error(not(source))] lease::Status),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`User`] doesn't own the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` doesn't own the `Lease`")]
    NotLeaseOwner(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{lease, user, Lease},
        test, Command as _,
    };

    use super::{ExecutionError, UpdateLease};

    fn cmd(lease: &Lease, initiator_id: user::Id) -> UpdateLease {
        UpdateLease {
            lease_id: lease.id,
            initiator_id,
            start_date: test::date("2024-02-01"),
            end_date: test::date("2025-01-31"),
            terms: lease::Terms {
                rent: test::money("1450000COP"),
                ..lease.terms
            },
            conditions: "Tenant pays utilities.".parse().unwrap(),
            special_clauses: None,
        }
    }

    #[tokio::test]
    async fn submits_draft_for_signing() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;

        let updated = svc.execute(cmd(&lease, owner.id)).await.unwrap();

        assert_eq!(updated.status, lease::Status::PendingSignature);
        assert_eq!(updated.terms.rent, test::money("1450000COP"));
        assert_eq!(updated.start_date, test::date("2024-02-01"));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }

    #[tokio::test]
    async fn edits_drafts_only() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        _ = svc.execute(cmd(&lease, owner.id)).await.unwrap();

        let err = svc.execute(cmd(&lease, owner.id)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::LeaseNotEditable(lease::Status::PendingSignature),
        ));
    }

    #[tokio::test]
    async fn rejects_tenant_edits() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;

        let err = svc.execute(cmd(&lease, tenant.id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotLeaseOwner(_)));
    }
}
