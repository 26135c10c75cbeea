//! [`Command`] for accepting a [`RentalRequest`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease, property, rental_request, user, Lease, Notification, Property,
        RentalRequest,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for accepting a [`RentalRequest`] by the owner of the
/// requested [`Property`], drafting a [`Lease`] out of it.
#[derive(Clone, Copy, Debug)]
pub struct AcceptRentalRequest {
    /// ID of the [`RentalRequest`] to be accepted.
    pub request_id: rental_request::Id,

    /// ID of the [`User`] owning the requested [`Property`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl AcceptRentalRequest {
    /// Number of days a [`Lease`] drafted out of a [`RentalRequest`] lasts.
    const LEASE_DAYS: i64 = 365;
}

/// Output of [`AcceptRentalRequest`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Accepted [`RentalRequest`].
    pub request: RentalRequest,

    /// Drafted [`Lease`].
    pub lease: Lease,
}

impl<Db> Command<AcceptRentalRequest> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<RentalRequest, rental_request::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentalRequest>, rental_request::Id>>,
            Ok = Option<RentalRequest>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<lease::Number, i32>>,
            Ok = lease::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Update<RentalRequest>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AcceptRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AcceptRentalRequest {
            request_id,
            owner_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent responses to the same `RentalRequest`.
        tx.execute(Lock(By::new(request_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut request = tx
            .execute(Select(By::<Option<RentalRequest>, _>::new(request_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RequestNotExists(request_id))
            .map_err(tracerr::wrap!())?;
        if request.owner_id != owner_id {
            return Err(tracerr::new!(E::NotPropertyOwner(owner_id)));
        }
        if !request.is_pending() {
            return Err(tracerr::new!(E::RequestNotPending(request_id)));
        }

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(
                request.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(request.property_id))
            .map_err(tracerr::wrap!())?;

        let start = Date::today();
        let end = start
            .checked_add_days(AcceptRentalRequest::LEASE_DAYS)
            .ok_or(E::DateOutOfRange(start))
            .map_err(tracerr::wrap!())?;
        let number = tx
            .execute(Select(By::<lease::Number, _>::new(start.year())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut lease = Lease::draft(
            number,
            &property,
            request.tenant_id,
            (start, end),
            lease::Terms {
                rent: property.rent,
                administration_fee: property.administration_fee,
                deposit: property.deposit,
                due_day: lease::DueDay::DEFAULT,
            },
        );
        lease.rental_request_id = Some(request.id);
        _ = request.accept(lease.id);

        let notification = Notification::rental_request_accepted(
            request.tenant_id,
            &property.title,
            lease.id,
        );

        // The unique constraint guards against accepting the same
        // `RentalRequest` twice concurrently.
        tx.execute(Insert(lease.clone())).await.map_err(|e| {
            if e.as_ref().is_unique_violation(REQUEST_CONSTRAINT) {
                tracerr::new!(E::RequestNotPending(request_id))
            } else {
                (tracerr::map_from_and_wrap!(=> E))(e)
            }
        })?;
        tx.execute(Update(request.clone()))
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
        self.publish(&request);
        self.publish(&notification);

        Ok(Output { request, lease })
    }
}

/// Name of the unique constraint on the [`RentalRequest`] of a [`Lease`].
const REQUEST_CONSTRAINT: &str = "leases_rental_request_id_key";

/// Error of [`AcceptRentalRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Lease`] end date cannot be represented.
    #[display("`Lease` starting on {_0} cannot be drafted")]
    DateOutOfRange(#[error(not(source))] Date),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't own the requested [`Property`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` doesn't own the requested `Property`")]
    NotPropertyOwner(#[error(not(source))] user::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`RentalRequest`] with the provided ID does not exist.
    #[display("`RentalRequest(id: {_0})` does not exist")]
    RequestNotExists(#[error(not(source))] rental_request::Id),

    /// [`RentalRequest`] has been responded to already.
    #[display("`RentalRequest(id: {_0})` is not pending")]
    RequestNotPending(#[error(not(source))] rental_request::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        Date,
    };

    use crate::{
        command::{create_rental_request, CreateRentalRequest},
        domain::{lease, rental_request, user, Lease, Property, User},
        infra::{Database as _, Memory},
        test, Command as _, Service,
    };

    use super::{AcceptRentalRequest, ExecutionError};

    async fn request(
        svc: &Service<Memory>,
        property: &Property,
        tenant: &User,
    ) -> rental_request::Id {
        let out = svc
            .execute(CreateRentalRequest {
                property_id: property.id,
                tenant_id: tenant.id,
                message: None,
            })
            .await
            .unwrap();
        let create_rental_request::Output::Requested(request) = out else {
            panic!("expected a new request");
        };
        request.id
    }

    #[tokio::test]
    async fn drafts_one_lease_with_property_terms() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let request_id = request(&svc, &property, &tenant).await;

        let out = svc
            .execute(AcceptRentalRequest {
                request_id,
                owner_id: owner.id,
            })
            .await
            .unwrap();

        assert_eq!(out.request.status, rental_request::Status::Accepted);
        assert_eq!(out.request.lease_id, Some(out.lease.id));

        let lease = test::lease_of(&svc, out.lease.id).await;
        assert_eq!(lease.status, lease::Status::Draft);
        assert_eq!(lease.tenant_id, tenant.id);
        assert_eq!(lease.owner_id, owner.id);
        assert_eq!(lease.rental_request_id, Some(request_id));
        assert_eq!(lease.terms.rent, property.rent);
        assert_eq!(lease.terms.deposit, property.deposit);
        assert_eq!(lease.terms.due_day, lease::DueDay::DEFAULT);
        assert_eq!(lease.start_date, Date::today());
        assert_eq!(lease.end_date.days_since(lease.start_date), 365);
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }

    #[tokio::test]
    async fn accepting_twice_fails() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let request_id = request(&svc, &property, &tenant).await;
        let cmd = AcceptRentalRequest {
            request_id,
            owner_id: owner.id,
        };
        _ = svc.execute(cmd).await.unwrap();

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::RequestNotPending(id) if *id == request_id,
        ));
    }

    #[tokio::test]
    async fn second_lease_of_request_violates_constraint() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let request_id = request(&svc, &property, &tenant).await;
        let out = svc
            .execute(AcceptRentalRequest {
                request_id,
                owner_id: owner.id,
            })
            .await
            .unwrap();

        let mut duplicate = out.lease.clone();
        duplicate.id = lease::Id::new();
        let err = svc
            .database()
            .execute(Insert(duplicate))
            .await
            .unwrap_err();

        assert!(err
            .as_ref()
            .is_unique_violation("leases_rental_request_id_key"));
        let stored = svc
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(out.lease.id)))
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn rejects_foreign_owner() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let other = test::user(&svc, "other", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let request_id = request(&svc, &property, &tenant).await;

        let err = svc
            .execute(AcceptRentalRequest {
                request_id,
                owner_id: other.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotPropertyOwner(_)));
    }
}
