//! [`Command`] for registering a payment against a [`Payment`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Money,
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

/// [`Command`] for registering a payment made against a [`Payment`] by a
/// party of its [`Lease`].
#[derive(Clone, Debug)]
pub struct RegisterPayment {
    /// ID of the [`Payment`] being paid.
    pub payment_id: payment::Id,

    /// ID of the [`User`] registering the payment.
    ///
    /// [`User`]: crate::domain::User
    pub registrar_id: user::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`payment::Method`] of paying.
    pub method: payment::Method,

    /// [`payment::Reference`] of the transaction, if any.
    pub reference: Option<payment::Reference>,

    /// [`payment::Notes`] of the registrar, if any.
    pub notes: Option<payment::Notes>,
}

/// Output of [`RegisterPayment`] [`Command`].
#[derive(Clone, Debug)]
pub enum Output {
    /// Payment has been registered.
    Registered {
        /// Updated [`Payment`].
        payment: Payment,

        /// Created [`Registration`].
        registration: Registration,
    },

    /// [`Payment`] is fully paid already, so nothing has been registered.
    AlreadyPaid(Payment),
}

impl<Db> Command<RegisterPayment> for Service<Db>
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
        cmd: RegisterPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterPayment {
            payment_id,
            registrar_id,
            amount,
            method,
            reference,
            notes,
        } = cmd;

        if !amount.is_positive() {
            return Err(tracerr::new!(E::NonPositiveAmount(amount)));
        }

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
        let party = lease
            .party_of(registrar_id)
            .ok_or(E::NotLeaseParty(registrar_id))
            .map_err(tracerr::wrap!())?;
        if payment.is_paid() {
            return Ok(Output::AlreadyPaid(payment));
        }
        if amount.currency != payment.amount.currency {
            return Err(tracerr::new!(E::CurrencyMismatch(amount)));
        }

        let registration = Registration {
            id: payment::RegistrationId::new(),
            payment_id,
            amount,
            method,
            reference,
            notes,
            registrar_id,
            registered_at: payment::RegistrationDateTime::now(),
        };
        payment.register(&registration);

        let notification = Notification::payment_registered(
            lease.user_of(party.other()),
            &payment.number,
            amount,
            payment.id,
        );

        tx.execute(Insert(registration.clone()))
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

        Ok(Output::Registered {
            payment,
            registration,
        })
    }
}

/// Error of [`RegisterPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Paid amount is not in the [`Lease`] currency.
    #[display("{_0} is not in the `Lease` currency")]
    CurrencyMismatch(#[error(not(source))] Money),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] of the [`Payment`] does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// Paid amount is zero or negative.
    #[display("Paid amount must be positive, got {_0}")]
    NonPositiveAmount(#[error(not(source))] Money),

    /// [`User`] is neither the owner nor the tenant of the [`Lease`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not a party of the `Lease`")]
    NotLeaseParty(#[error(not(source))] user::Id),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{
            payment::{self, Registration},
            user, Payment,
        },
        infra::Database as _,
        test, Command as _,
    };

    use super::{ExecutionError, Output, RegisterPayment};

    fn cmd(payment: &Payment, registrar_id: user::Id, amount: &str) -> RegisterPayment {
        RegisterPayment {
            payment_id: payment.id,
            registrar_id,
            amount: test::money(amount),
            method: payment::Method::Transfer,
            reference: Some("TX-1".parse().unwrap()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn accumulates_partial_payments() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let payment = test::payment(&svc, &lease).await;

        let Output::Registered { payment: partial, .. } = svc
            .execute(cmd(&payment, tenant.id, "700000COP"))
            .await
            .unwrap()
        else {
            panic!("expected registration");
        };
        assert_eq!(partial.amount_paid, test::money("700000COP"));
        assert_eq!(
            partial.status(test::date("2024-01-20")),
            payment::Status::Partial,
        );
        let paid_on = partial.paid_on.expect("paid date");
        assert_eq!(test::unread(&svc, owner.id).await.count, 1);

        let Output::Registered { payment: paid, .. } = svc
            .execute(cmd(&payment, owner.id, "1000000COP"))
            .await
            .unwrap()
        else {
            panic!("expected registration");
        };
        assert!(paid.is_paid());
        assert_eq!(paid.paid_on, Some(paid_on));
        assert_eq!(paid.method, Some(payment::Method::Transfer));
        assert_eq!(test::unread(&svc, tenant.id).await.count, 1);

        let registrations = svc
            .database()
            .execute(Select(By::<Vec<Registration>, _>::new(payment.id)))
            .await
            .unwrap();
        assert_eq!(registrations.len(), 2);

        let out = svc
            .execute(cmd(&payment, tenant.id, "1COP"))
            .await
            .unwrap();
        assert!(matches!(out, Output::AlreadyPaid(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_amounts_and_outsiders() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let outsider = test::user(&svc, "outsider", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let payment = test::payment(&svc, &lease).await;

        let err = svc
            .execute(cmd(&payment, tenant.id, "0COP"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NonPositiveAmount(_)));

        let err = svc
            .execute(cmd(&payment, tenant.id, "100USD"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::CurrencyMismatch(_)));

        let err = svc
            .execute(cmd(&payment, outsider.id, "100COP"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotLeaseParty(_)));

        assert_eq!(
            test::payment_of(&svc, payment.id).await.amount_paid,
            test::money("0COP"),
        );
    }
}
