//! [`Command`] for confirming a [`Payment`] as fully paid.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease,
        payment::{self, Registration},
        user, Lease, Notification, Payment,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for confirming a [`Payment`] as fully paid by the owner of its
/// [`Lease`].
///
/// The outstanding balance is registered with [`payment::Method::Other`].
#[derive(Clone, Copy, Debug)]
pub struct MarkPaymentPaid {
    /// ID of the [`Payment`] to be marked.
    pub payment_id: payment::Id,

    /// ID of the [`User`] owning the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

/// Output of [`MarkPaymentPaid`] [`Command`].
#[derive(Clone, Debug)]
pub enum Output {
    /// [`Payment`] has been marked as paid.
    Paid(Payment),

    /// [`Payment`] is fully paid already.
    AlreadyPaid(Payment),
}

impl<Db> Command<MarkPaymentPaid> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Insert<Registration>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkPaymentPaid,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkPaymentPaid {
            payment_id,
            owner_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid losing concurrent registrations.
        tx.execute(Lock(By::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        let lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(payment.lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(payment.lease_id))
            .map_err(tracerr::wrap!())?;
        if lease.owner_id != owner_id {
            return Err(tracerr::new!(E::NotLeaseOwner(owner_id)));
        }
        if payment.is_paid() {
            return Ok(Output::AlreadyPaid(payment));
        }

        let registration = Registration {
            id: payment::RegistrationId::new(),
            payment_id,
            amount: payment.balance(),
            method: payment::Method::Other,
            reference: None,
            notes: None,
            registrar_id: owner_id,
            registered_at: payment::RegistrationDateTime::now(),
        };
        payment.register(&registration);

        let notification = Notification::payment_confirmed(
            lease.tenant_id,
            &payment.number,
            payment.id,
        );

        tx.execute(Insert(registration))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(payment.clone()))
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

        self.publish(&payment);
        self.publish(&notification);

        Ok(Output::Paid(payment))
    }
}

/// Error of [`MarkPaymentPaid`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] of the [`Payment`] does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`User`] doesn't own the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` doesn't own the `Lease`")]
    NotLeaseOwner(#[error(not(source))] user::Id),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{payment, user},
        test, Command as _,
    };

    use super::{ExecutionError, MarkPaymentPaid, Output};

    #[tokio::test]
    async fn registers_outstanding_balance() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let mut payment = test::payment(&svc, &lease).await;
        payment.late_fee = test::money("5100COP");
        test::save(&svc, payment.clone()).await;
        let cmd = MarkPaymentPaid {
            payment_id: payment.id,
            owner_id: owner.id,
        };

        let Output::Paid(paid) = svc.execute(cmd).await.unwrap() else {
            panic!("expected payment to be marked");
        };

        assert!(paid.is_paid());
        assert_eq!(paid.amount_paid, test::money("1705100COP"));
        assert_eq!(paid.method, Some(payment::Method::Other));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);

        let out = svc.execute(cmd).await.unwrap();
        assert!(matches!(out, Output::AlreadyPaid(_)));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }

    #[tokio::test]
    async fn tenant_cannot_mark_paid() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let payment = test::payment(&svc, &lease).await;

        let err = svc
            .execute(MarkPaymentPaid {
                payment_id: payment.id,
                owner_id: tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotLeaseOwner(_)));
    }
}
