//! [`Command`] for requesting a [`Property`] for rent.

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        property, rental_request, user, Notification, Property, RentalRequest,
        User,
    },
    infra::{database, Database},
    read::rental_request::HasPending,
    Service,
};

use super::Command;

/// [`Command`] for requesting a [`Property`] for rent by a tenant.
#[derive(Clone, Debug)]
pub struct CreateRentalRequest {
    /// ID of the requested [`Property`].
    pub property_id: property::Id,

    /// ID of the [`User`] requesting the [`Property`].
    pub tenant_id: user::Id,

    /// [`rental_request::Message`] to the owner, if any.
    pub message: Option<rental_request::Message>,
}

/// Output of [`CreateRentalRequest`] [`Command`].
#[derive(Clone, Debug)]
pub enum Output {
    /// New [`RentalRequest`] has been created.
    Requested(RentalRequest),

    /// The tenant has already a pending [`RentalRequest`] for the
    /// [`Property`].
    AlreadyPending,
}

impl<Db> Command<CreateRentalRequest> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HasPending, (property::Id, user::Id)>>,
            Ok = HasPending,
            Err = Traced<database::Error>,
        > + Database<Insert<RentalRequest>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRentalRequest {
            property_id,
            tenant_id,
            message,
        } = cmd;

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

        // Avoid duplicate requests of the same `Property`.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_available() {
            return Err(tracerr::new!(E::PropertyNotAvailable(property_id)));
        }

        let has_pending = tx
            .execute(Select(By::<HasPending, _>::new((property_id, tenant_id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *has_pending {
            return Ok(Output::AlreadyPending);
        }

        let request = RentalRequest {
            id: rental_request::Id::new(),
            property_id,
            tenant_id,
            owner_id: property.owner_id,
            message,
            status: rental_request::Status::Pending,
            lease_id: None,
            created_at: rental_request::CreationDateTime::now(),
            responded_at: None,
        };
        let notification = Notification::rental_requested(
            property.owner_id,
            &property.title,
            property.id,
        );

        tx.execute(Insert(request.clone()))
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

        self.publish(&request);
        self.publish(&notification);

        Ok(Output::Requested(request))
    }
}

/// Error of [`CreateRentalRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] cannot be requested for rent.
    #[display("`Property(id: {_0})` is not available for rent")]
    PropertyNotAvailable(#[error(not(source))] property::Id),

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
        domain::{property, rental_request, user},
        test, Command as _,
    };

    use super::{CreateRentalRequest, ExecutionError, Output};

    #[tokio::test]
    async fn requests_property_and_notifies_owner() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;

        let out = svc
            .execute(CreateRentalRequest {
                property_id: property.id,
                tenant_id: tenant.id,
                message: Some("Is it still available?".parse().unwrap()),
            })
            .await
            .unwrap();

        let Output::Requested(request) = out else {
            panic!("expected a new request");
        };
        assert_eq!(request.owner_id, owner.id);
        assert_eq!(request.status, rental_request::Status::Pending);

        let unread = test::unread(&svc, owner.id).await;
        assert_eq!(unread.count, 1);

        let collections = inbox
            .drain()
            .into_iter()
            .map(|d| d.collection)
            .collect::<Vec<_>>();
        assert_eq!(collections, ["rental_requests", "notifications"]);
    }

    #[tokio::test]
    async fn reports_duplicate_pending_request() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let cmd = CreateRentalRequest {
            property_id: property.id,
            tenant_id: tenant.id,
            message: None,
        };
        _ = svc.execute(cmd.clone()).await.unwrap();

        let out = svc.execute(cmd).await.unwrap();

        assert!(matches!(out, Output::AlreadyPending));
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);
    }

    #[tokio::test]
    async fn rejects_unavailable_property() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let mut property = test::property(&svc, &owner).await;
        property.status = property::Status::Rented;
        test::save(&svc, property.clone()).await;

        let err = svc
            .execute(CreateRentalRequest {
                property_id: property.id,
                tenant_id: tenant.id,
                message: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotAvailable(_),
        ));
    }

    #[tokio::test]
    async fn rejects_owner_as_requester() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;

        let err = svc
            .execute(CreateRentalRequest {
                property_id: property.id,
                tenant_id: owner.id,
                message: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotTenant(_)));
    }
}
