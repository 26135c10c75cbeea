//! [`Payments`] report definition.

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Lease;
use crate::{
    domain::{user, Payment},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] summarizing the [`Payment`]s of all the [`Lease`]s owned by a
/// [`User`].
///
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Payments {
    /// ID of the owner [`User`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl Payments {
    /// Number of the most recent [`Payment`]s included into the report.
    pub const LATEST: usize = 10;
}

/// Output of the [`Payments`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Counters and totals of all the [`Payment`]s.
    pub summary: read::payment::Summary,

    /// [`Payments::LATEST`] most recently created [`Payment`]s, newest first.
    pub latest: Vec<Payment>,
}

impl<Db> Query<Payments> for Service<Db>
where
    Db: Database<
            Select<By<read::payment::Summary, user::Id>>,
            Ok = read::payment::Summary,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, read::payment::Latest>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Payments { owner_id }: Payments,
    ) -> Result<Self::Ok, Self::Err> {
        let summary = self
            .database()
            .execute(Select(By::<read::payment::Summary, _>::new(owner_id)))
            .await
            .map_err(tracerr::wrap!())?;

        let latest = if summary == read::payment::Summary::default() {
            vec![]
        } else {
            self.database()
                .execute(Select(By::<Vec<Payment>, _>::new(
                    read::payment::Latest {
                        owner_id,
                        limit: Payments::LATEST,
                    },
                )))
                .await
                .map_err(tracerr::wrap!())?
        };

        Ok(Output { summary, latest })
    }
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{
            payment::{self, schedule},
            user, Payment,
        },
        infra::Database as _,
        test, Query as _,
    };

    use super::Payments;

    #[tokio::test]
    async fn summarizes_owned_payments_only() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let stranger = test::user(&svc, "stranger", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        // Far enough in future for every payment to be pending.
        let lease =
            test::lease(&svc, &property, &tenant, "2099-01-10", "2099-12-10")
                .await;
        let periods = schedule::periods(
            lease.start_date,
            lease.end_date,
            lease.terms.due_day,
        );
        for (i, period) in periods.iter().copied().enumerate() {
            let serial = i64::try_from(i + 1).unwrap();
            let payment = Payment::scheduled(
                payment::Number::new(2099, serial),
                lease.id,
                lease.monthly_total(),
                period,
            );
            svc.database().execute(Insert(payment)).await.unwrap();
        }

        let report = svc.execute(Payments { owner_id: owner.id }).await.unwrap();
        assert_eq!(report.summary.pending, 12);
        assert_eq!(report.summary.paid, 0);
        assert_eq!(report.latest.len(), Payments::LATEST);

        let report = svc
            .execute(Payments {
                owner_id: stranger.id,
            })
            .await
            .unwrap();
        assert_eq!(report.summary.pending, 0);
        assert!(report.latest.is_empty());
    }
}
