//! [`Command`] for cancelling a [`RentalRequest`].

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

/// [`Command`] for cancelling a pending [`RentalRequest`] by its tenant.
#[derive(Clone, Copy, Debug)]
pub struct CancelRentalRequest {
    /// ID of the [`RentalRequest`] to be cancelled.
    pub request_id: rental_request::Id,

    /// ID of the [`User`] who made the [`RentalRequest`].
    ///
    /// [`User`]: crate::domain::User
    pub tenant_id: user::Id,
}

impl<Db> Command<CancelRentalRequest> for Service<Db>
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
        cmd: CancelRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelRentalRequest {
            request_id,
            tenant_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with the owner response.
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
        if request.tenant_id != tenant_id {
            return Err(tracerr::new!(E::NotRequester(tenant_id)));
        }
        if !request.cancel() {
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
        let notification = Notification::rental_request_cancelled(
            request.owner_id,
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

/// Error of [`CancelRentalRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not the one who made the [`RentalRequest`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` didn't make the `RentalRequest`")]
    NotRequester(#[error(not(source))] user::Id),

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
        command::{
            create_rental_request, AcceptRentalRequest, CreateRentalRequest,
        },
        domain::{rental_request, user},
        test, Command as _,
    };

    use super::{CancelRentalRequest, ExecutionError};

    #[tokio::test]
    async fn only_requester_cancels_pending_request() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let other = test::user(&svc, "other", user::Kind::Tenant).await;
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

        let err = svc
            .execute(CancelRentalRequest {
                request_id: request.id,
                tenant_id: other.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotRequester(_)));

        let cancelled = svc
            .execute(CancelRentalRequest {
                request_id: request.id,
                tenant_id: tenant.id,
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, rental_request::Status::Cancelled);
        // Request notification and the cancellation one.
        assert_eq!(test::unread(&svc, owner.id).await.count, 2);
    }

    #[tokio::test]
    async fn accepted_request_cannot_be_cancelled() {
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
        _ = svc
            .execute(AcceptRentalRequest {
                request_id: request.id,
                owner_id: owner.id,
            })
            .await
            .unwrap();

        let err = svc
            .execute(CancelRentalRequest {
                request_id: request.id,
                tenant_id: tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::RequestNotPending(_)));
    }
}
