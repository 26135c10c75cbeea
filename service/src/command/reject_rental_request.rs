//! [`Command`] for rejecting a [`RentalRequest`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        property, rental_request, user, Notification, Property, RentalRequest,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for rejecting a [`RentalRequest`] by the owner of the
/// requested [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct RejectRentalRequest {
    /// ID of the [`RentalRequest`] to be rejected.
    pub request_id: rental_request::Id,

    /// ID of the [`User`] owning the requested [`Property`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl<Db> Command<RejectRentalRequest> for Service<Db>
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
        > + Database<Update<RentalRequest>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = RentalRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RejectRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RejectRentalRequest {
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
        if !request.reject() {
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
        let notification = Notification::rental_request_rejected(
            request.tenant_id,
            &property.title,
            property.id,
        );

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

        self.publish(&request);
        self.publish(&notification);

        Ok(request)
    }
}

/// Error of [`RejectRentalRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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
    use crate::{
        command::{create_rental_request, AcceptRentalRequest, CreateRentalRequest},
        domain::{rental_request, user},
        test, Command as _,
    };

    use super::RejectRentalRequest;

    #[tokio::test]
    async fn rejects_without_drafting_lease() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let create_rental_request::Output::Requested(request) = svc
            .execute(CreateRentalRequest {
                property_id: property.id,
                tenant_id: tenant.id,
                message: None,
            })
            .await
            .unwrap()
        else {
            panic!("expected a new request");
        };

        let rejected = svc
            .execute(RejectRentalRequest {
                request_id: request.id,
                owner_id: owner.id,
            })
            .await
            .unwrap();

        assert_eq!(rejected.status, rental_request::Status::Rejected);
        assert_eq!(rejected.lease_id, None);
        assert!(rejected.responded_at.is_some());
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);

        // Once rejected, it cannot be accepted anymore.
        assert!(svc
            .execute(AcceptRentalRequest {
                request_id: request.id,
                owner_id: owner.id,
            })
            .await
            .is_err());
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }
}
