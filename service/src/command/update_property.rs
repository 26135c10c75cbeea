//! [`Command`] for updating a [`Property`] listing.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::property::{Category, Description, Features, Location, Title};
use crate::{
    domain::{property, user, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Property`] listing by its owner.
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// ID of the [`Property`] to be updated.
    pub property_id: property::Id,

    /// ID of the [`User`] updating the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,

    /// New [`Title`] of the [`Property`] listing.
    pub title: property::Title,

    /// New [`Description`] of the [`Property`] listing.
    pub description: property::Description,

    /// New [`Category`] of the [`Property`].
    pub category: property::Category,

    /// New [`Location`] of the [`Property`].
    pub location: property::Location,

    /// New [`Features`] of the [`Property`].
    pub features: property::Features,

    /// New monthly rent of the [`Property`].
    pub rent: Money,

    /// New monthly administration fee of the [`Property`].
    pub administration_fee: Money,

    /// New security deposit of the [`Property`].
    pub deposit: Money,

    /// New [`property::Status`] of the [`Property`], if it should change.
    ///
    /// [`property::Status::Rented`] is managed by leases only.
    pub status: Option<property::Status>,

    /// Indicator whether the [`Property`] listing should be published.
    pub is_active: bool,
}

impl<Db> Command<UpdateProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProperty {
            property_id,
            initiator_id,
            title,
            description,
            category,
            location,
            features,
            rent,
            administration_fee,
            deposit,
            status,
            is_active,
        } = cmd;

        if !property::same_currency(rent, &[administration_fee, deposit]) {
            return Err(tracerr::new!(E::CurrencyMismatch));
        }
        if status == Some(property::Status::Rented) {
            return Err(tracerr::new!(E::RentedStatusReserved));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with leases activation.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(initiator_id) {
            return Err(tracerr::new!(E::NotPropertyOwner(initiator_id)));
        }

        property.title = title;
        property.description = description;
        property.category = category;
        property.location = location;
        property.features = features;
        property.rent = rent;
        property.administration_fee = administration_fee;
        property.deposit = deposit;
        property.is_active = is_active;
        if let Some(status) = status {
            if property.status != property::Status::Rented {
                property.status = status;
            }
        }
        property.updated_at = property::ModificationDateTime::now();

        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&property);

        Ok(property)
    }
}

/// Error of [`UpdateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Prices are given in different currencies.
    #[display("Rent, administration fee and deposit must share one currency")]
    CurrencyMismatch,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't own the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotPropertyOwner(#[error(not(source))] user::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`property::Status::Rented`] cannot be set manually.
    #[display("`Rented` status is managed by leases only")]
    RentedStatusReserved,
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{property, user, Property},
        test, Command as _,
    };

    use super::{ExecutionError, UpdateProperty};

    fn cmd(property: &Property, initiator_id: user::Id) -> UpdateProperty {
        UpdateProperty {
            property_id: property.id,
            initiator_id,
            title: "Renovated apartment".parse().unwrap(),
            description: property.description.clone(),
            category: property.category,
            location: property.location.clone(),
            features: property.features,
            rent: test::money("1600000COP"),
            administration_fee: property.administration_fee,
            deposit: property.deposit,
            status: Some(property::Status::Unavailable),
            is_active: false,
        }
    }

    #[tokio::test]
    async fn updates_listing() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;

        let updated = svc.execute(cmd(&property, owner.id)).await.unwrap();

        assert_eq!(updated.rent, test::money("1600000COP"));
        assert_eq!(updated.status, property::Status::Unavailable);
        assert!(!test::property_of(&svc, property.id).await.is_active);
    }

    #[tokio::test]
    async fn keeps_rented_status() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let mut property = test::property(&svc, &owner).await;
        property.status = property::Status::Rented;
        test::save(&svc, property.clone()).await;

        let updated = svc.execute(cmd(&property, owner.id)).await.unwrap();

        assert_eq!(updated.status, property::Status::Rented);
    }

    #[tokio::test]
    async fn rejects_non_owner() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let other = test::user(&svc, "other", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;

        let err = svc.execute(cmd(&property, other.id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotPropertyOwner(_)));
    }
}
