//! [`AccrueLateFees`] [`Task`].

use std::{convert::Infallible, error::Error, fmt::Display, time};

use common::{
    operations::{By, Perform, Select, Start},
    Date,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::AccrueLateFee,
    domain::Payment,
    infra::{database, Database},
    read::payment::Overdue,
    Command, Service,
};

use super::Task;

/// Configuration for [`AccrueLateFees`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between late fees recomputations.
    pub interval: time::Duration,
}

/// [`Task`] for recomputing late fees of all the overdue [`Payment`]s.
#[derive(Clone, Copy, Debug)]
pub struct AccrueLateFees<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<AccrueLateFees<Self>, Config>>> for Service<Db>
where
    AccrueLateFees<Service<Db>>:
        Task<Perform<Date>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<AccrueLateFees<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = AccrueLateFees {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(Date::today())).await {
                Ok(0) => {}
                Ok(n) => log::info!("Late fees recomputed on {n} payments"),
                Err(e) => log::error!("`task::AccrueLateFees` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<Date>> for AccrueLateFees<Service<Db>>
where
    Db: Database<
        Select<By<Overdue, Date>>,
        Ok = Overdue,
        Err = Traced<database::Error>,
    >,
    Service<Db>: Command<AccrueLateFee, Ok = Option<Payment>, Err: Display>,
{
    /// Number of [`Payment`]s whose late fee has changed.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(
        &self,
        Perform(today): Perform<Date>,
    ) -> Result<Self::Ok, Self::Err> {
        let Overdue(ids) = self
            .service
            .database()
            .execute(Select(By::new(today)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut accrued = 0;
        for payment_id in ids {
            match self
                .service
                .execute(AccrueLateFee { payment_id, today })
                .await
            {
                Ok(Some(_)) => accrued += 1,
                Ok(None) => {}
                Err(e) => log::warn!(
                    "Failed to accrue late fee on `Payment(id: {payment_id})`: \
                     {e}",
                ),
            }
        }
        Ok(accrued)
    }
}

/// Error of [`AccrueLateFees`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::Perform;

    use crate::{domain::user, test, Task as _};

    use super::{AccrueLateFees, Config};

    #[tokio::test]
    async fn accrues_on_overdue_payments_only() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        // Due on 2024-02-05.
        let payment = test::payment(&svc, &lease).await;
        let task = AccrueLateFees {
            config: Config {
                interval: Duration::from_secs(1),
            },
            service: svc.clone(),
        };
        let accrue = |date| task.execute(Perform(test::date(date)));

        assert_eq!(accrue("2024-02-01").await.unwrap(), 0);
        assert_eq!(accrue("2024-02-07").await.unwrap(), 1);
        assert_eq!(
            test::payment_of(&svc, payment.id).await.late_fee,
            test::money("3400COP"),
        );
        assert_eq!(accrue("2024-02-07").await.unwrap(), 0);
    }
}
