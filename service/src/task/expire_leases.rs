//! [`ExpireLeases`] [`Task`].

use std::{convert::Infallible, error::Error, fmt::Display, time};

use common::{
    operations::{By, Perform, Select, Start},
    Date,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::ExpireLease,
    domain::Lease,
    infra::{database, Database},
    read::lease::Expired,
    Command, Service,
};

use super::Task;

/// Configuration for [`ExpireLeases`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between checks for expired [`Lease`]s.
    pub interval: time::Duration,
}

/// [`Task`] for expiring active [`Lease`]s past their end date.
#[derive(Clone, Copy, Debug)]
pub struct ExpireLeases<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpireLeases<Self>, Config>>> for Service<Db>
where
    ExpireLeases<Service<Db>>:
        Task<Perform<Date>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireLeases<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireLeases {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(Date::today())).await {
                Ok(0) => {}
                Ok(n) => log::info!("{n} leases expired"),
                Err(e) => log::error!("`task::ExpireLeases` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<Date>> for ExpireLeases<Service<Db>>
where
    Db: Database<
        Select<By<Expired, Date>>,
        Ok = Expired,
        Err = Traced<database::Error>,
    >,
    Service<Db>: Command<ExpireLease, Ok = Option<Lease>, Err: Display>,
{
    /// Number of expired [`Lease`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(
        &self,
        Perform(today): Perform<Date>,
    ) -> Result<Self::Ok, Self::Err> {
        let Expired(ids) = self
            .service
            .database()
            .execute(Select(By::new(today)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut expired = 0;
        for lease_id in ids {
            match self.service.execute(ExpireLease { lease_id, today }).await {
                Ok(Some(_)) => expired += 1,
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Failed to expire `Lease(id: {lease_id})`: {e}");
                }
            }
        }
        Ok(expired)
    }
}

/// Error of [`ExpireLeases`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::Perform;

    use crate::{
        domain::{lease, property, user, Lease},
        test, Task as _,
    };

    use super::{Config, ExpireLeases};

    #[tokio::test]
    async fn expires_leases_past_end_date() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        test::save(
            &svc,
            property::Property {
                status: property::Status::Rented,
                ..property.clone()
            },
        )
        .await;
        for (start, end) in
            [("2024-01-10", "2024-04-10"), ("2024-03-01", "2024-06-01")]
        {
            let lease =
                test::lease(&svc, &property, &tenant, start, end).await;
            test::save(
                &svc,
                Lease {
                    status: lease::Status::Active,
                    ..lease
                },
            )
            .await;
        }
        let task = ExpireLeases {
            config: Config {
                interval: Duration::from_secs(1),
            },
            service: svc.clone(),
        };

        let expired = task
            .execute(Perform(test::date("2024-05-01")))
            .await
            .unwrap();
        assert_eq!(expired, 1);
        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Rented,
        );

        let expired = task
            .execute(Perform(test::date("2024-07-01")))
            .await
            .unwrap();
        assert_eq!(expired, 1);
        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Available,
        );
    }
}
