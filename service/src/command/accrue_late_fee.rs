//! [`Command`] for recomputing the late fee of an overdue [`Payment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{payment, Payment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recomputing the late fee of a [`Payment`] as of the
/// provided [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct AccrueLateFee {
    /// ID of the [`Payment`] to accrue the late fee on.
    pub payment_id: payment::Id,

    /// Current [`Date`].
    pub today: Date,
}

impl<Db> Command<AccrueLateFee> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// Updated [`Payment`], or [`None`] if its late fee hasn't changed.
    type Ok = Option<Payment>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AccrueLateFee) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AccrueLateFee { payment_id, today } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid overwriting a concurrent registration.
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
        if !payment.accrue_late_fee(today, self.config().late_fee_daily_rate)
        {
            return Ok(None);
        }

        tx.execute(Update(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&payment);

        Ok(Some(payment))
    }
}

/// Error of [`AccrueLateFee`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use crate::{domain::user, test, Command as _};

    use super::AccrueLateFee;

    #[tokio::test]
    async fn recomputes_fee_from_owed_amount() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        // Due on 2024-02-05.
        let payment = test::payment(&svc, &lease).await;

        let not_due = svc
            .execute(AccrueLateFee {
                payment_id: payment.id,
                today: test::date("2024-02-05"),
            })
            .await
            .unwrap();
        assert!(not_due.is_none());

        let day_3 = svc
            .execute(AccrueLateFee {
                payment_id: payment.id,
                today: test::date("2024-02-08"),
            })
            .await
            .unwrap()
            .expect("accrued");
        // 1 700 000 x 0.1% x 3 days.
        assert_eq!(day_3.late_fee, test::money("5100COP"));

        let day_10 = svc
            .execute(AccrueLateFee {
                payment_id: payment.id,
                today: test::date("2024-02-15"),
            })
            .await
            .unwrap()
            .expect("accrued");
        assert_eq!(day_10.late_fee, test::money("17000COP"));

        let same_day = svc
            .execute(AccrueLateFee {
                payment_id: payment.id,
                today: test::date("2024-02-15"),
            })
            .await
            .unwrap();
        assert!(same_day.is_none());
    }
}
