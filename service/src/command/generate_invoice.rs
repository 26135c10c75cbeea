//! [`Command`] for generating an invoice of a [`Payment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease, payment, property, user, Lease, Payment, Property, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for generating an [`Invoice`] of a [`Payment`] for a party of
/// its [`Lease`].
#[derive(Clone, Copy, Debug)]
pub struct GenerateInvoice {
    /// ID of the [`Payment`] to be invoiced.
    pub payment_id: payment::Id,

    /// ID of the [`User`] requesting the [`Invoice`].
    pub requester_id: user::Id,
}

/// Document model of a [`Payment`] invoice.
///
/// Rendering it into a printable document is up to the caller.
#[derive(Clone, Debug)]
pub struct Invoice {
    /// [`Payment`] number.
    pub number: payment::Number,

    /// [`Lease`] number.
    pub lease_number: lease::Number,

    /// [`payment::Concept`] being charged.
    pub concept: payment::Concept,

    /// First day of the billing period.
    pub period_start: Date,

    /// Last day of the billing period.
    pub period_end: Date,

    /// [`Date`] the [`Payment`] is due.
    pub due_date: Date,

    /// Monthly rent.
    pub rent: Money,

    /// Monthly administration fee.
    pub administration_fee: Money,

    /// Accrued late fee.
    pub late_fee: Money,

    /// Total amount owed, including the late fee.
    pub total: Money,

    /// Amount still to be paid.
    pub balance: Money,

    /// Party receiving the payment.
    pub beneficiary: Beneficiary,

    /// Party making the payment.
    pub payer: Payer,

    /// [`DateTime`] when the [`Invoice`] was generated first.
    ///
    /// [`DateTime`]: common::DateTime
    pub generated_at: payment::InvoiceDateTime,
}

impl Invoice {
    /// Suggested file name of the rendered [`Invoice`].
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("invoice_{}.pdf", self.number)
    }
}

/// Owner receiving an [`Invoice`] payment.
#[derive(Clone, Debug)]
pub struct Beneficiary {
    /// [`user::Name`] of the owner.
    pub name: user::Name,

    /// [`user::NationalId`] of the owner, if known.
    pub national_id: Option<user::NationalId>,

    /// [`user::Phone`] of the owner, if known.
    pub phone: Option<user::Phone>,
}

/// Tenant paying an [`Invoice`].
#[derive(Clone, Debug)]
pub struct Payer {
    /// [`user::Name`] of the tenant.
    pub name: user::Name,

    /// [`user::NationalId`] of the tenant, if known.
    pub national_id: Option<user::NationalId>,

    /// [`property::Title`] of the rented [`Property`].
    pub property_title: property::Title,

    /// [`property::Address`] of the rented [`Property`].
    pub property_address: property::Address,
}

impl<Db> Command<GenerateInvoice> for Service<Db>
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
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GenerateInvoice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GenerateInvoice {
            payment_id,
            requester_id,
        } = cmd;

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
        if lease.party_of(requester_id).is_none() {
            return Err(tracerr::new!(E::NotLeaseParty(requester_id)));
        }

        let owner = tx
            .execute(Select(By::<Option<User>, _>::new(lease.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(lease.owner_id))
            .map_err(tracerr::wrap!())?;
        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(lease.tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(lease.tenant_id))
            .map_err(tracerr::wrap!())?;
        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(lease.property_id))
            .map_err(tracerr::wrap!())?;

        let generated_at = if let Some(at) = payment.invoiced_at {
            at
        } else {
            let now = payment::InvoiceDateTime::now();
            payment.invoiced_at = Some(now);
            tx.execute(Update(payment.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            self.publish(&payment);
            now
        };

        Ok(Invoice {
            number: payment.number.clone(),
            lease_number: lease.number,
            concept: payment.concept.clone(),
            period_start: payment.period_start,
            period_end: payment.period_end,
            due_date: payment.due_date,
            rent: lease.terms.rent,
            administration_fee: lease.terms.administration_fee,
            late_fee: payment.late_fee,
            total: payment.total(),
            balance: payment.balance(),
            beneficiary: Beneficiary {
                name: owner.name,
                national_id: owner.national_id,
                phone: owner.phone,
            },
            payer: Payer {
                name: tenant.name,
                national_id: tenant.national_id,
                property_title: property.title,
                property_address: property.location.address,
            },
            generated_at,
        })
    }
}

/// Error of [`GenerateInvoice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] of the [`Payment`] does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`User`] is neither the owner nor the tenant of the [`Lease`].
    #[display("`User(id: {_0})` is not a party of the `Lease`")]
    NotLeaseParty(#[error(not(source))] user::Id),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Party of the [`Lease`] does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{domain::user, test, Command as _};

    use super::{ExecutionError, GenerateInvoice};

    #[tokio::test]
    async fn keeps_first_generation_time() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let payment = test::payment(&svc, &lease).await;
        let cmd = GenerateInvoice {
            payment_id: payment.id,
            requester_id: tenant.id,
        };

        let invoice = svc.execute(cmd).await.unwrap();

        assert_eq!(invoice.number, payment.number);
        assert_eq!(invoice.lease_number, lease.number);
        assert_eq!(invoice.file_name(), "invoice_PAG-2024-000001.pdf");
        assert_eq!(invoice.rent, test::money("1500000COP"));
        assert_eq!(invoice.total, test::money("1700000COP"));
        assert_eq!(invoice.balance, test::money("1700000COP"));
        assert_eq!(invoice.beneficiary.name, owner.name);
        assert_eq!(invoice.payer.name, tenant.name);
        assert_eq!(invoice.payer.property_title, property.title);
        assert_eq!(
            test::payment_of(&svc, payment.id).await.invoiced_at,
            Some(invoice.generated_at),
        );
        assert_eq!(inbox.drain().len(), 1);

        let again = svc
            .execute(GenerateInvoice {
                requester_id: owner.id,
                ..cmd
            })
            .await
            .unwrap();
        assert_eq!(again.generated_at, invoice.generated_at);
        assert!(inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn outsider_cannot_generate() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;
        let outsider = test::user(&svc, "outsider", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;
        let lease =
            test::lease(&svc, &property, &tenant, "2024-01-10", "2024-04-10")
                .await;
        let payment = test::payment(&svc, &lease).await;

        let err = svc
            .execute(GenerateInvoice {
                payment_id: payment.id,
                requester_id: outsider.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotLeaseParty(_)));
    }
}
