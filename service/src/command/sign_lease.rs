//! [`Command`] for signing a [`Lease`].

use std::net::IpAddr;

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
        lease::{self, signature, Signature},
        payment::{self, schedule},
        property, user, Lease, Notification, Payment, Property,
    },
    infra::{database, Database},
    read::payment::Scheduled,
    Service,
};

use super::Command;

/// [`Command`] for signing a [`Lease`] by one of its parties.
///
/// Once both parties have signed, the [`Lease`] is activated: its
/// [`Property`] becomes rented and its [`Payment`]s are scheduled.
#[derive(Clone, Debug)]
pub struct SignLease {
    /// ID of the [`Lease`] to be signed.
    pub lease_id: lease::Id,

    /// ID of the [`User`] signing the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    pub signer_id: user::Id,

    /// [`signature::Data`] of the signature.
    pub signature: signature::Data,

    /// IP address the signature is submitted from, if known.
    pub ip_address: Option<IpAddr>,

    /// [`signature::UserAgent`] the signature is submitted with, if known.
    pub user_agent: Option<signature::UserAgent>,
}

/// Output of [`SignLease`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Signed [`Lease`].
    pub lease: Lease,

    /// Outcome of signing the [`Lease`].
    pub signing: lease::Signing,

    /// [`Payment`]s scheduled on the [`Lease`] activation.
    pub payments: Vec<Payment>,
}

impl<Db> Command<SignLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Insert<signature::Record>, Err = Traced<database::Error>>
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<
            Select<By<Scheduled, lease::Id>>,
            Ok = Scheduled,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<payment::Number, i32>>,
            Ok = payment::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Insert<Notification>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignLease {
            lease_id,
            signer_id,
            signature,
            ip_address,
            user_agent,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid both parties activating the `Lease` concurrently.
        tx.execute(Lock(By::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let party = lease
            .party_of(signer_id)
            .ok_or(E::NotLeaseParty(signer_id))
            .map_err(tracerr::wrap!())?;

        let signed_at = signature::SigningDateTime::now();
        let signing = lease
            .sign(
                party,
                Signature {
                    data: signature.clone(),
                    signed_at,
                },
            )
            .ok_or(E::LeaseNotSignable(lease.status))
            .map_err(tracerr::wrap!())?;
        if signing == lease::Signing::AlreadySigned {
            return Ok(Output {
                lease,
                signing,
                payments: vec![],
            });
        }

        let record = signature::Record {
            id: signature::Id::new(),
            lease_id,
            signer_id,
            party,
            data: signature,
            ip_address,
            user_agent,
            signed_at,
        };
        tx.execute(Insert(record))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut property = None;
        let mut payments = vec![];
        let mut notifications = vec![];
        match signing {
            lease::Signing::Signed => {
                let other = lease.user_of(party.other());
                notifications.push(Notification::lease_signed(
                    other,
                    &lease.number,
                    lease.id,
                ));
            }
            lease::Signing::Activated => {
                // Avoid racing with other leases of the same `Property`.
                tx.execute(Lock(By::new(lease.property_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                let mut p = tx
                    .execute(Select(By::<Option<Property>, _>::new(
                        lease.property_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::PropertyNotExists(lease.property_id))
                    .map_err(tracerr::wrap!())?;
                p.status = property::Status::Rented;
                p.updated_at = property::ModificationDateTime::now();
                tx.execute(Update(p.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                property = Some(p);

                let scheduled = tx
                    .execute(Select(By::<Scheduled, _>::new(lease.id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if !*scheduled {
                    let year = Date::today().year();
                    for period in schedule::periods(
                        lease.start_date,
                        lease.end_date,
                        lease.terms.due_day,
                    ) {
                        let number = tx
                            .execute(Select(By::<payment::Number, _>::new(
                                year,
                            )))
                            .await
                            .map_err(tracerr::map_from_and_wrap!(=> E))?;
                        let payment = Payment::scheduled(
                            number,
                            lease.id,
                            lease.monthly_total(),
                            period,
                        );
                        // Uniqueness of `(lease_id, sequence)` guards against
                        // a second schedule.
                        tx.execute(Insert(payment.clone()))
                            .await
                            .map_err(tracerr::map_from_and_wrap!(=> E))
                            .map(drop)?;
                        payments.push(payment);
                    }
                }

                for party in [lease::Party::Owner, lease::Party::Tenant] {
                    notifications.push(Notification::lease_activated(
                        lease.user_of(party),
                        &lease.number,
                        lease.id,
                    ));
                }
            }
            lease::Signing::AlreadySigned => {}
        }

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        for n in &notifications {
            tx.execute(Insert(n.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&lease);
        if let Some(p) = &property {
            self.publish(p);
        }
        for p in &payments {
            self.publish(p);
        }
        for n in &notifications {
            self.publish(n);
        }

        Ok(Output {
            lease,
            signing,
            payments,
        })
    }
}

/// Error of [`SignLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`Lease`] cannot be signed anymore.
    #[display("`Lease` in `{_0}` status cannot be signed")]
    LeaseNotSignable(#[error(not(source))] lease::Status),

    /// [`User`] is neither the owner nor the tenant of the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not a party of the `Lease`")]
    NotLeaseParty(#[error(not(source))] user::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{
            lease::{self, signature},
            payment, property, user, Lease, Payment, User,
        },
        infra::{Database as _, Memory},
        test, Command as _, Service,
    };

    use super::{ExecutionError, SignLease};

    fn cmd(lease: &Lease, signer: &User) -> SignLease {
        SignLease {
            lease_id: lease.id,
            signer_id: signer.id,
            signature: "data:image/png;base64,iVBORw0KGgo=".parse().unwrap(),
            ip_address: Some("10.0.0.7".parse().unwrap()),
            user_agent: None,
        }
    }

    async fn payments_of(svc: &Service<Memory>, lease: &Lease) -> Vec<Payment> {
        svc.database()
            .execute(Select(By::<Vec<Payment>, _>::new(lease.id)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_signature_awaits_counter_party() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;

        let out = svc.execute(cmd(&lease, &tenant)).await.unwrap();

        assert_eq!(out.signing, lease::Signing::Signed);
        assert_eq!(out.lease.status, lease::Status::PendingSignature);
        assert!(out.payments.is_empty());
        assert!(out.lease.requires_signature_of(owner.id));
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);

        let records = svc
            .database()
            .execute(Select(By::<Vec<signature::Record>, _>::new(lease.id)))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].party, lease::Party::Tenant);
    }

    #[tokio::test]
    async fn second_signature_activates_lease_once() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        _ = svc.execute(cmd(&lease, &owner)).await.unwrap();

        let out = svc.execute(cmd(&lease, &tenant)).await.unwrap();

        assert_eq!(out.signing, lease::Signing::Activated);
        assert_eq!(
            test::lease_of(&svc, lease.id).await.status,
            lease::Status::Active,
        );
        assert_eq!(
            test::property_of(&svc, property.id).await.status,
            property::Status::Rented,
        );

        let payments = payments_of(&svc, &lease).await;
        assert_eq!(payments.len(), 4);
        let dues = payments.iter().map(|p| p.due_date).collect::<Vec<_>>();
        assert_eq!(
            dues,
            ["2024-02-05", "2024-03-05", "2024-04-05", "2024-05-05"]
                .map(test::date),
        );
        assert!(payments.iter().all(|p| {
            p.amount == test::money("1700000COP")
                && p.status(test::date("2024-01-10")) == payment::Status::Pending
        }));

        // Tenant: "lease signed" and "activated"; owner: "lease activated".
        assert_eq!(test::unread(&svc, tenant.id).await.count, 2);
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);
        assert!(inbox.drain().iter().any(|d| d.collection == "payments"));

        // Signing an active lease again changes nothing.
        let again = svc.execute(cmd(&lease, &tenant)).await.unwrap();
        assert_eq!(again.signing, lease::Signing::AlreadySigned);
        assert_eq!(again.lease.status, lease::Status::Active);
        assert!(again.payments.is_empty());
        assert_eq!(payments_of(&svc, &lease).await.len(), 4);
        assert_eq!(test::unread(&svc, tenant.id).await.count, 2);
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);
    }

    #[tokio::test]
    async fn repeated_signature_is_informational() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        _ = svc.execute(cmd(&lease, &tenant)).await.unwrap();
        _ = inbox.drain();

        let out = svc.execute(cmd(&lease, &tenant)).await.unwrap();

        assert_eq!(out.signing, lease::Signing::AlreadySigned);
        assert!(inbox.drain().is_empty());
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);
        let records = svc
            .database()
            .execute(Select(By::<Vec<signature::Record>, _>::new(lease.id)))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn existing_schedule_is_not_duplicated() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let period = payment::schedule::periods(
            lease.start_date,
            lease.end_date,
            lease.terms.due_day,
        )[0];
        test::save(
            &svc,
            Payment::scheduled(
                payment::Number::new(2024, 1),
                lease.id,
                lease.monthly_total(),
                period,
            ),
        )
        .await;
        _ = svc.execute(cmd(&lease, &owner)).await.unwrap();

        let out = svc.execute(cmd(&lease, &tenant)).await.unwrap();

        assert_eq!(out.signing, lease::Signing::Activated);
        assert!(out.payments.is_empty());
        assert_eq!(payments_of(&svc, &lease).await.len(), 1);
    }

    #[tokio::test]
    async fn rejects_outsider() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let outsider = test::user(&svc, "outsider", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;

        let err = svc.execute(cmd(&lease, &outsider)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotLeaseParty(_)));
    }
}
