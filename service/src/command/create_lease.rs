//! [`Command`] for drafting a new [`Lease`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::lease::{Clauses, Conditions, Terms};
use crate::{
    domain::{lease, property, user, Lease, Notification, Property, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for drafting a new [`Lease`] of a [`Property`] by its owner.
#[derive(Clone, Debug)]
pub struct CreateLease {
    /// ID of the [`User`] owning the [`Property`].
    pub owner_id: user::Id,

    /// ID of the [`Property`] to be leased.
    pub property_id: property::Id,

    /// ID of the [`User`] renting the [`Property`].
    pub tenant_id: user::Id,

    /// First day of a new [`Lease`].
    pub start_date: Date,

    /// Last day of a new [`Lease`].
    pub end_date: Date,

    /// [`Terms`] of a new [`Lease`].
    pub terms: lease::Terms,

    /// [`Conditions`] of a new [`Lease`].
    ///
    /// [`Conditions::standard()`] are applied if [`None`].
    pub conditions: Option<lease::Conditions>,

    /// Special [`Clauses`] of a new [`Lease`], if any.
    pub special_clauses: Option<lease::Clauses>,
}

impl<Db> Command<CreateLease> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<lease::Number, i32>>,
            Ok = lease::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLease {
            owner_id,
            property_id,
            tenant_id,
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

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(owner_id) {
            return Err(tracerr::new!(E::NotPropertyOwner(owner_id)));
        }

        let tenant = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(tenant_id))
            .map_err(tracerr::wrap!())?;
        if !tenant.is_tenant() {
            return Err(tracerr::new!(E::UserNotTenant(tenant_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let number = tx
            .execute(Select(By::<lease::Number, _>::new(Date::today().year())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let mut lease = Lease::draft(
            number,
            &property,
            tenant.id,
            (start_date, end_date),
            terms,
        );
        if let Some(conditions) = conditions {
            lease.conditions = conditions;
        }
        lease.special_clauses = special_clauses;

        let notification =
            Notification::lease_created(tenant.id, &lease.number, lease.id);

        tx.execute(Insert(lease.clone()))
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

/// Error of [`CreateLease`] [`Command`] execution.
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

    /// [`User`] doesn't own the [`Property`].
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotPropertyOwner(#[error(not(source))] user::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`User`] is not a tenant.
    #[display("`User(id: {_0})` is not a tenant")]
    UserNotTenant(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{lease, user},
        test, Command as _,
    };

    use super::{CreateLease, ExecutionError};

    fn terms(rent: &str) -> lease::Terms {
        lease::Terms {
            rent: test::money(rent),
            administration_fee: test::money("200000COP"),
            deposit: test::money("1500000COP"),
            due_day: lease::DueDay::new(10).unwrap(),
        }
    }

    #[tokio::test]
    async fn drafts_lease_for_tenant() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;

        let lease = svc
            .execute(CreateLease {
                owner_id: owner.id,
                property_id: property.id,
                tenant_id: tenant.id,
                start_date: test::date("2024-01-10"),
                end_date: test::date("2024-04-10"),
                terms: terms("1500000COP"),
                conditions: None,
                special_clauses: Some("No smoking".parse().unwrap()),
            })
            .await
            .unwrap();

        assert_eq!(lease.status, lease::Status::Draft);
        assert_eq!(lease.conditions, lease::Conditions::standard());
        assert!(lease.rental_request_id.is_none());
        assert!(lease.number.to_string().starts_with("CTR-"));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
        assert_eq!(inbox.drain().len(), 2);
    }

    #[tokio::test]
    async fn rejects_non_tenant_and_foreign_property() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let other = test::user(&svc, "other", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;
        let cmd = CreateLease {
            owner_id: owner.id,
            property_id: property.id,
            tenant_id: other.id,
            start_date: test::date("2024-01-10"),
            end_date: test::date("2024-04-10"),
            terms: terms("1500000COP"),
            conditions: None,
            special_clauses: None,
        };

        let err = svc.execute(cmd.clone()).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UserNotTenant(_)));

        let err = svc
            .execute(CreateLease {
                owner_id: other.id,
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPropertyOwner(_)));
    }

    #[tokio::test]
    async fn rejects_inverted_period_and_mixed_currencies() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let cmd = CreateLease {
            owner_id: owner.id,
            property_id: property.id,
            tenant_id: tenant.id,
            start_date: test::date("2024-04-10"),
            end_date: test::date("2024-01-10"),
            terms: terms("1500000COP"),
            conditions: None,
            special_clauses: None,
        };

        let err = svc.execute(cmd.clone()).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidPeriod(..)));

        let err = svc
            .execute(CreateLease {
                start_date: test::date("2024-01-10"),
                end_date: test::date("2024-04-10"),
                terms: terms("400USD"),
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::CurrencyMismatch));
    }
}
