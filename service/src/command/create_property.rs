//! [`Command`] for listing a new [`Property`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::property::{Category, Description, Features, Location, Title};
use crate::{
    domain::{property, user, Property, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for listing a new [`Property`] by its owner.
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// ID of the [`User`] owning a new [`Property`].
    pub owner_id: user::Id,

    /// [`Title`] of a new [`Property`] listing.
    pub title: property::Title,

    /// [`Description`] of a new [`Property`] listing.
    pub description: property::Description,

    /// [`Category`] of a new [`Property`].
    pub category: property::Category,

    /// [`Location`] of a new [`Property`].
    pub location: property::Location,

    /// [`Features`] of a new [`Property`].
    pub features: property::Features,

    /// Monthly rent of a new [`Property`].
    pub rent: Money,

    /// Monthly administration fee of a new [`Property`].
    pub administration_fee: Money,

    /// Security deposit of a new [`Property`].
    pub deposit: Money,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty {
            owner_id,
            title,
            description,
            category,
            location,
            features,
            rent,
            administration_fee,
            deposit,
        } = cmd;

        if !property::same_currency(rent, &[administration_fee, deposit]) {
            return Err(tracerr::new!(E::CurrencyMismatch));
        }

        let owner = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(owner_id))
            .map_err(tracerr::wrap!())?;
        if !owner.is_owner() {
            return Err(tracerr::new!(E::UserNotOwner(owner_id)));
        }

        let property = Property {
            id: property::Id::new(),
            owner_id,
            title,
            description,
            category,
            status: property::Status::Available,
            location,
            features,
            rent,
            administration_fee,
            deposit,
            is_active: true,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(property.clone()))
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

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Prices are given in different currencies.
    #[display("Rent, administration fee and deposit must share one currency")]
    CurrencyMismatch,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not an owner.
    #[display("`User(id: {_0})` is not an owner")]
    UserNotOwner(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{property, user},
        test, Command as _,
    };

    use super::{CreateProperty, ExecutionError};

    fn cmd(owner_id: user::Id) -> CreateProperty {
        CreateProperty {
            owner_id,
            title: "House in Envigado".parse().unwrap(),
            description: "Three bedrooms with a garden".parse().unwrap(),
            category: property::Category::House,
            location: property::Location {
                address: "Carrera 43A #38-10".parse().unwrap(),
                city: "Envigado".parse().unwrap(),
                neighborhood: None,
                zip_code: None,
            },
            features: property::Features {
                area: property::Area::new(120.into()).unwrap(),
                bedrooms: 3,
                bathrooms: 2,
                parking_spots: 1,
                floor: None,
                is_furnished: true,
                allows_pets: true,
                utilities: property::Utilities::default(),
            },
            rent: test::money("2500000COP"),
            administration_fee: test::money("0COP"),
            deposit: test::money("2500000COP"),
        }
    }

    #[tokio::test]
    async fn lists_available_property() {
        let (svc, mut inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;

        let property = svc.execute(cmd(owner.id)).await.unwrap();

        let stored = test::property_of(&svc, property.id).await;
        assert_eq!(stored.status, property::Status::Available);
        assert!(stored.is_available());
        assert_eq!(inbox.drain()[0].collection, "properties");
    }

    #[tokio::test]
    async fn rejects_tenant() {
        let (svc, _inbox) = test::service();
        let tenant = test::user(&svc, "tenant", user::Kind::Tenant).await;

        let err = svc.execute(cmd(tenant.id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotOwner(_)));
    }

    #[tokio::test]
    async fn rejects_mixed_currencies() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let mut cmd = cmd(owner.id);
        cmd.deposit = test::money("1000USD");

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::CurrencyMismatch));
    }
}
