//! [`Command`] for marking a [`Payment`] as overdue.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{lease, payment, user, Lease, Notification, Payment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Payment`] as overdue by the owner of its
/// [`Lease`], recomputing its late fee.
#[derive(Clone, Copy, Debug)]
pub struct MarkPaymentOverdue {
    /// ID of the [`Payment`] to be marked.
    pub payment_id: payment::Id,

    /// ID of the [`User`] owning the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

/// Output of [`MarkPaymentOverdue`] [`Command`].
#[derive(Clone, Debug)]
pub enum Output {
    /// Late fee of the [`Payment`] has been recomputed.
    Overdue(Payment),

    /// Late fee of the [`Payment`] is up to date already.
    AlreadyOverdue(Payment),
}

impl<Db> Command<MarkPaymentOverdue> for Service<Db>
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
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkPaymentOverdue,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkPaymentOverdue {
            payment_id,
            owner_id,
        } = cmd;
        let today = Date::today();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

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
            return Err(tracerr::new!(E::PaymentPaid(payment_id)));
        }
        if payment.due_date >= today {
            return Err(tracerr::new!(E::PaymentNotDue(payment.due_date)));
        }
        if !payment.accrue_late_fee(today, self.config().late_fee_daily_rate)
        {
            return Ok(Output::AlreadyOverdue(payment));
        }

        let notification = Notification::payment_overdue(
            lease.tenant_id,
            &payment.number,
            payment.late_fee,
            payment.id,
        );

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

        Ok(Output::Overdue(payment))
    }
}

/// Error of [`MarkPaymentOverdue`] [`Command`] execution.
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

    /// [`Payment`] is not past its due date yet.
    #[display("`Payment` is due on {_0}, which hasn't passed yet")]
    PaymentNotDue(#[error(not(source))] Date),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`Payment`] is fully paid.
    #[display("`Payment(id: {_0})` is fully paid")]
    PaymentPaid(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{payment, user},
        test, Command as _,
    };

    use super::{ExecutionError, MarkPaymentOverdue, Output};

    #[tokio::test]
    async fn accrues_late_fee_once_per_day() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let payment = test::payment(&svc, &lease).await;
        let cmd = MarkPaymentOverdue {
            payment_id: payment.id,
            owner_id: owner.id,
        };

        let Output::Overdue(overdue) = svc.execute(cmd).await.unwrap() else {
            panic!("expected late fee to be accrued");
        };

        let today = Date::today();
        assert_eq!(
            overdue.late_fee,
            payment::late_fee(
                overdue.amount,
                svc.config().late_fee_daily_rate,
                today.days_since(overdue.due_date),
            ),
        );
        assert!(overdue.late_fee.is_positive());
        assert_eq!(overdue.status(today), payment::Status::Overdue);
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);

        let out = svc.execute(cmd).await.unwrap();
        assert!(matches!(out, Output::AlreadyOverdue(_)));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);
    }

    #[tokio::test]
    async fn rejects_not_due_payment() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let mut payment = test::payment(&svc, &lease).await;
        payment.due_date = Date::today();
        test::save(&svc, payment.clone()).await;

        let err = svc
            .execute(MarkPaymentOverdue {
                payment_id: payment.id,
                owner_id: owner.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PaymentNotDue(_)));
    }
}
