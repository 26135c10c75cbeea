//! [`Property`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Property listed for rent by its owner.
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Property`].
    pub owner_id: user::Id,

    /// [`Title`] of this [`Property`] listing.
    pub title: Title,

    /// [`Description`] of this [`Property`] listing.
    pub description: Description,

    /// [`Category`] of this [`Property`].
    pub category: Category,

    /// [`Status`] of this [`Property`].
    pub status: Status,

    /// [`Location`] of this [`Property`].
    pub location: Location,

    /// [`Features`] of this [`Property`].
    pub features: Features,

    /// Monthly rent of this [`Property`].
    pub rent: Money,

    /// Monthly administration fee of this [`Property`].
    pub administration_fee: Money,

    /// Security deposit required to rent this [`Property`].
    pub deposit: Money,

    /// Indicator whether this [`Property`] is published.
    pub is_active: bool,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was last updated.
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Indicates whether this [`Property`] can be requested for rent.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Status::Available && self.is_active
    }

    /// Returns the total monthly price of this [`Property`]: its rent plus its
    /// administration fee.
    #[must_use]
    pub fn total_price(&self) -> Money {
        Money {
            amount: self.rent.amount + self.administration_fee.amount,
            currency: self.rent.currency,
        }
    }

    /// Indicates whether the provided [`User`] owns this [`Property`].
    #[must_use]
    pub fn is_owned_by(&self, user_id: user::Id) -> bool {
        self.owner_id == user_id
    }

    /// Returns the [`Status`] this [`Property`] should have once its leases
    /// stop being active, given whether any other active lease remains.
    #[must_use]
    pub fn released_status(&self, has_other_active_lease: bool) -> Status {
        match self.status {
            Status::Rented if !has_other_active_lease => Status::Available,
            s @ (Status::Available
            | Status::Rented
            | Status::Maintenance
            | Status::Unavailable) => s,
        }
    }
}

/// Checks that all the provided prices share one currency.
#[must_use]
pub fn same_currency(rent: Money, others: &[Money]) -> bool {
    others.iter().all(|m| m.currency == rent.currency)
}

/// ID of a [`Property`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new time-ordered [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

define_text! {
    #[doc = "Title of a [`Property`] listing."]
    struct Title(..= 200);
}

define_text! {
    #[doc = "Description of a [`Property`] listing."]
    struct Description(..= 5000);
}

define_text! {
    #[doc = "Street address of a [`Property`]."]
    struct Address(..= 300);
}

define_text! {
    #[doc = "City where a [`Property`] is located."]
    struct City(..= 100);
}

define_text! {
    #[doc = "Neighborhood where a [`Property`] is located."]
    struct Neighborhood(..= 100);
}

define_text! {
    #[doc = "Zip code of a [`Property`] location."]
    struct ZipCode(..= 20);
}

/// Location of a [`Property`].
#[derive(Clone, Debug)]
pub struct Location {
    /// [`Address`] of the [`Property`].
    pub address: Address,

    /// [`City`] of the [`Property`].
    pub city: City,

    /// [`Neighborhood`] of the [`Property`], if any.
    pub neighborhood: Option<Neighborhood>,

    /// [`ZipCode`] of the [`Property`], if any.
    pub zip_code: Option<ZipCode>,
}

/// Physical features of a [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct Features {
    /// [`Area`] of the [`Property`].
    pub area: Area,

    /// Number of bedrooms.
    pub bedrooms: Rooms,

    /// Number of bathrooms.
    pub bathrooms: Rooms,

    /// Number of parking spots.
    pub parking_spots: Rooms,

    /// [`Floor`] of the [`Property`], if applicable.
    pub floor: Option<Floor>,

    /// Indicator whether the [`Property`] is furnished.
    pub is_furnished: bool,

    /// Indicator whether pets are allowed in the [`Property`].
    pub allows_pets: bool,

    /// [`Utilities`] included into the rent.
    pub utilities: Utilities,
}

/// Utilities included into the rent of a [`Property`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Utilities {
    /// Water supply.
    pub water: bool,

    /// Electricity.
    pub electricity: bool,

    /// Gas supply.
    pub gas: bool,

    /// Internet connection.
    pub internet: bool,
}

/// Area of a [`Property`] in square meters.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Area(Decimal);

impl Area {
    /// Creates a new [`Area`] if the provided value is positive.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val > Decimal::ZERO).then_some(Self(val))
    }

    /// Returns the value of this [`Area`] in square meters.
    #[must_use]
    pub fn square_meters(self) -> Decimal {
        self.0
    }
}

/// Number of rooms of some kind in a [`Property`].
pub type Rooms = i16;

/// Floor of a [`Property`].
pub type Floor = i16;

define_kind! {
    #[doc = "Category of a [`Property`]."]
    enum Category {
        #[doc = "A house."]
        House = 1,

        #[doc = "An apartment."]
        Apartment = 2,

        #[doc = "Commercial premises."]
        CommercialPremises = 3,

        #[doc = "An office."]
        Office = 4,

        #[doc = "A warehouse."]
        Warehouse = 5,

        #[doc = "Anything else."]
        Other = 6,
    }
}

define_kind! {
    #[doc = "Availability status of a [`Property`]."]
    enum Status {
        #[doc = "[`Property`] may be rented."]
        Available = 1,

        #[doc = "[`Property`] is rented under an active lease."]
        Rented = 2,

        #[doc = "[`Property`] is under maintenance."]
        Maintenance = 3,

        #[doc = "[`Property`] is withdrawn by its owner."]
        Unavailable = 4,
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was last updated.
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::user;

    use super::{
        Address, Area, Category, City, Description, Features, Id, Location,
        Property, Status, Title, Utilities,
    };

    fn property(status: Status, is_active: bool) -> Property {
        Property {
            id: Id::new(),
            owner_id: user::Id::new(),
            title: Title::new("Cozy flat").unwrap(),
            description: Description::new("Near the park").unwrap(),
            category: Category::Apartment,
            status,
            location: Location {
                address: Address::new("Calle 10 # 5-20").unwrap(),
                city: City::new("Bogota").unwrap(),
                neighborhood: None,
                zip_code: None,
            },
            features: Features {
                area: Area::new(Decimal::from(70)).unwrap(),
                bedrooms: 2,
                bathrooms: 1,
                parking_spots: 0,
                floor: Some(3),
                is_furnished: false,
                allows_pets: true,
                utilities: Utilities::default(),
            },
            rent: Money::from_str("1500000COP").unwrap(),
            administration_fee: Money::from_str("200000COP").unwrap(),
            deposit: Money::from_str("1500000COP").unwrap(),
            is_active,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn availability() {
        assert!(property(Status::Available, true).is_available());
        assert!(!property(Status::Available, false).is_available());
        assert!(!property(Status::Rented, true).is_available());
        assert!(!property(Status::Maintenance, true).is_available());
    }

    #[test]
    fn total_price_sums_rent_and_fee() {
        assert_eq!(
            property(Status::Available, true).total_price(),
            Money::from_str("1700000COP").unwrap(),
        );
    }

    #[test]
    fn released_only_without_other_active_lease() {
        let rented = property(Status::Rented, true);
        assert_eq!(rented.released_status(false), Status::Available);
        assert_eq!(rented.released_status(true), Status::Rented);

        let withdrawn = property(Status::Unavailable, true);
        assert_eq!(withdrawn.released_status(false), Status::Unavailable);
    }
}
