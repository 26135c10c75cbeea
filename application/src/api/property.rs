//! [`Property`]-related definitions.

use std::future;

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    define_error, AsError, Context, Error,
};

/// A property listed for rent.
#[derive(Clone, Debug, From)]
pub struct Property {
    /// ID of this [`Property`].
    id: Id,

    /// Underlying [`domain::Property`].
    property: OnceCell<domain::Property>,
}

impl From<domain::Property> for Property {
    fn from(property: domain::Property) -> Self {
        Self {
            id: property.id.into(),
            property: OnceCell::new_with(Some(property)),
        }
    }
}

impl Property {
    /// Creates a new [`Property`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Property`] with the provided ID exists,
    /// otherwise accessing this [`Property`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            property: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Property`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Property`] doesn't exist.
    pub(crate) async fn property(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Property, Error> {
        let id = self.id.into();
        self.property
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::property::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(p.ok_or_else(|| {
                            api::query::PropertyError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A property listed for rent.
#[graphql_object(context = Context)]
impl Property {
    /// Unique identifier of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `User` owning this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.owner",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn owner(&self, ctx: &Context) -> Result<api::User, Error> {
        let owner_id = self.property(ctx).await?.owner_id;
        #[expect(unsafe_code, reason = "`Property` always has an owner")]
        let owner = unsafe { api::User::new_unchecked(owner_id) };
        Ok(owner)
    }

    /// Title of this `Property` listing.
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.property(ctx).await?.title.clone().into())
    }

    /// Description of this `Property` listing.
    pub async fn description(
        &self,
        ctx: &Context,
    ) -> Result<Description, Error> {
        Ok(self.property(ctx).await?.description.clone().into())
    }

    /// Category of this `Property`.
    pub async fn category(&self, ctx: &Context) -> Result<Category, Error> {
        Ok(self.property(ctx).await?.category.into())
    }

    /// Availability status of this `Property`.
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.property(ctx).await?.status.into())
    }

    /// Location of this `Property`.
    pub async fn location(&self, ctx: &Context) -> Result<Location, Error> {
        Ok(self.property(ctx).await?.location.clone().into())
    }

    /// Physical features of this `Property`.
    pub async fn features(&self, ctx: &Context) -> Result<Features, Error> {
        Ok(self.property(ctx).await?.features.into())
    }

    /// Monthly rent of this `Property`.
    pub async fn rent(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.property(ctx).await?.rent)
    }

    /// Monthly administration fee of this `Property`.
    pub async fn administration_fee(
        &self,
        ctx: &Context,
    ) -> Result<Money, Error> {
        Ok(self.property(ctx).await?.administration_fee)
    }

    /// Total monthly price of this `Property`: its rent plus its
    /// administration fee.
    pub async fn total_price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.property(ctx).await?.total_price())
    }

    /// Security deposit required to rent this `Property`.
    pub async fn deposit(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.property(ctx).await?.deposit)
    }

    /// Indicator whether this `Property` is published.
    pub async fn is_active(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.property(ctx).await?.is_active)
    }

    /// Indicator whether this `Property` may be requested for rent.
    pub async fn is_available(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.property(ctx).await?.is_available())
    }

    /// `DateTime` when this `Property` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.property(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Property` was last updated.
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.property(ctx).await?.updated_at.coerce())
    }
}

/// Location of a `Property`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PropertyLocation")]
pub struct Location {
    /// Street address.
    pub address: Address,

    /// City.
    pub city: City,

    /// Neighborhood, if any.
    pub neighborhood: Option<Neighborhood>,

    /// Zip code, if any.
    pub zip_code: Option<ZipCode>,
}

impl From<domain::property::Location> for Location {
    fn from(location: domain::property::Location) -> Self {
        Self {
            address: location.address.into(),
            city: location.city.into(),
            neighborhood: location.neighborhood.map(Into::into),
            zip_code: location.zip_code.map(Into::into),
        }
    }
}

/// Location of a `Property` to be listed.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PropertyLocationInput")]
pub struct LocationInput {
    /// Street address.
    pub address: Address,

    /// City.
    pub city: City,

    /// Neighborhood, if any.
    pub neighborhood: Option<Neighborhood>,

    /// Zip code, if any.
    pub zip_code: Option<ZipCode>,
}

impl From<LocationInput> for domain::property::Location {
    fn from(input: LocationInput) -> Self {
        Self {
            address: input.address.into(),
            city: input.city.into(),
            neighborhood: input.neighborhood.map(Into::into),
            zip_code: input.zip_code.map(Into::into),
        }
    }
}

/// Physical features of a `Property`.
#[derive(Clone, Copy, Debug, From)]
pub struct Features(domain::property::Features);

/// Physical features of a `Property`.
#[graphql_object(name = "PropertyFeatures", context = Context)]
impl Features {
    /// Area in square meters.
    #[must_use]
    pub fn area(&self) -> scalar::Decimal {
        self.0.area.square_meters().into()
    }

    /// Number of bedrooms.
    #[must_use]
    pub fn bedrooms(&self) -> i32 {
        self.0.bedrooms.into()
    }

    /// Number of bathrooms.
    #[must_use]
    pub fn bathrooms(&self) -> i32 {
        self.0.bathrooms.into()
    }

    /// Number of parking spots.
    #[must_use]
    pub fn parking_spots(&self) -> i32 {
        self.0.parking_spots.into()
    }

    /// Floor, if applicable.
    #[must_use]
    pub fn floor(&self) -> Option<i32> {
        self.0.floor.map(Into::into)
    }

    /// Indicator whether the `Property` is furnished.
    #[must_use]
    pub fn is_furnished(&self) -> bool {
        self.0.is_furnished
    }

    /// Indicator whether pets are allowed.
    #[must_use]
    pub fn allows_pets(&self) -> bool {
        self.0.allows_pets
    }

    /// Utilities included into the rent.
    #[must_use]
    pub fn utilities(&self) -> Utilities {
        self.0.utilities.into()
    }
}

/// Physical features of a `Property` to be listed.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "PropertyFeaturesInput")]
pub struct FeaturesInput {
    /// Area in square meters.
    pub area: scalar::Decimal,

    /// Number of bedrooms.
    pub bedrooms: i32,

    /// Number of bathrooms.
    pub bathrooms: i32,

    /// Number of parking spots.
    pub parking_spots: i32,

    /// Floor, if applicable.
    pub floor: Option<i32>,

    /// Indicator whether the `Property` is furnished.
    pub is_furnished: bool,

    /// Indicator whether pets are allowed.
    pub allows_pets: bool,

    /// Utilities included into the rent.
    pub utilities: UtilitiesInput,
}

impl TryFrom<FeaturesInput> for domain::property::Features {
    type Error = FeaturesError;

    fn try_from(input: FeaturesInput) -> Result<Self, Self::Error> {
        let rooms = |n: i32| {
            domain::property::Rooms::try_from(n)
                .ok()
                .filter(|n| *n >= 0)
                .ok_or(FeaturesError::Rooms)
        };
        Ok(Self {
            area: domain::property::Area::new(input.area.into())
                .ok_or(FeaturesError::Area)?,
            bedrooms: rooms(input.bedrooms)?,
            bathrooms: rooms(input.bathrooms)?,
            parking_spots: rooms(input.parking_spots)?,
            floor: input
                .floor
                .map(|f| {
                    domain::property::Floor::try_from(f)
                        .map_err(|_| FeaturesError::Floor)
                })
                .transpose()?,
            is_furnished: input.is_furnished,
            allows_pets: input.allows_pets,
            utilities: input.utilities.into(),
        })
    }
}

define_error! {
    enum FeaturesError {
        #[code = "INVALID_AREA"]
        #[status = BAD_REQUEST]
        #[message = "`Property` area must be positive"]
        Area,

        #[code = "INVALID_ROOMS_NUMBER"]
        #[status = BAD_REQUEST]
        #[message = "Number of rooms must be a small non-negative number"]
        Rooms,

        #[code = "INVALID_FLOOR"]
        #[status = BAD_REQUEST]
        #[message = "`Property` floor is out of range"]
        Floor,
    }
}

/// Criteria to search the `Property` catalog by.
#[derive(Clone, Debug, Default, GraphQLInputObject)]
#[graphql(name = "PropertyCatalogFilter")]
pub struct CatalogFilter {
    /// Category of the `Property`.
    pub category: Option<Category>,

    /// City the `Property` is located in.
    pub city: Option<City>,

    /// Text to fuzzy-match against the title and the address.
    pub text: Option<String>,

    /// Minimal monthly rent.
    pub min_rent: Option<scalar::Decimal>,

    /// Maximal monthly rent.
    pub max_rent: Option<scalar::Decimal>,

    /// Minimal number of bedrooms.
    pub min_bedrooms: Option<i32>,

    /// Minimal number of bathrooms.
    pub min_bathrooms: Option<i32>,

    /// Indicator whether the `Property` must be furnished.
    pub is_furnished: Option<bool>,

    /// Indicator whether the `Property` must allow pets.
    pub allows_pets: Option<bool>,
}

impl CatalogFilter {
    /// Converts this [`CatalogFilter`] into a
    /// [`read::property::list::Filter`] of the provided owner's properties,
    /// or of the public catalog if there is no owner.
    ///
    /// [`read::property::list::Filter`]: service::read::property::list::Filter
    pub(crate) fn into_read(
        self,
        owner_id: Option<domain::user::Id>,
    ) -> Result<service::read::property::list::Filter, FeaturesError> {
        let rooms = |n: Option<i32>| {
            n.map(|n| {
                domain::property::Rooms::try_from(n)
                    .map_err(|_| FeaturesError::Rooms)
            })
            .transpose()
        };
        Ok(service::read::property::list::Filter {
            owner_id,
            category: self.category.map(Into::into),
            city: self.city.map(Into::into),
            text: self.text,
            min_rent: self.min_rent.map(Into::into),
            max_rent: self.max_rent.map(Into::into),
            min_bedrooms: rooms(self.min_bedrooms)?,
            min_bathrooms: rooms(self.min_bathrooms)?,
            is_furnished: self.is_furnished,
            allows_pets: self.allows_pets,
        })
    }
}

/// Utilities included into the rent of a `Property`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "PropertyUtilities")]
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

impl From<domain::property::Utilities> for Utilities {
    fn from(u: domain::property::Utilities) -> Self {
        Self {
            water: u.water,
            electricity: u.electricity,
            gas: u.gas,
            internet: u.internet,
        }
    }
}

/// Utilities to be included into the rent of a `Property`.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "PropertyUtilitiesInput")]
pub struct UtilitiesInput {
    /// Water supply.
    pub water: bool,

    /// Electricity.
    pub electricity: bool,

    /// Gas supply.
    pub gas: bool,

    /// Internet connection.
    pub internet: bool,
}

impl From<UtilitiesInput> for domain::property::Utilities {
    fn from(u: UtilitiesInput) -> Self {
        Self {
            water: u.water,
            electricity: u.electricity,
            gas: u.gas,
            internet: u.internet,
        }
    }
}

/// Unique identifier of a `Property`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::property::Id)]
#[into(domain::property::Id)]
#[graphql(name = "PropertyId", transparent)]
pub struct Id(Uuid);

/// Title of a `Property` listing.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyTitle",
    with = scalar::Via::<domain::property::Title>,
)]
pub struct Title(domain::property::Title);

/// Description of a `Property` listing.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyDescription",
    with = scalar::Via::<domain::property::Description>,
)]
pub struct Description(domain::property::Description);

/// Street address of a `Property`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyAddress",
    with = scalar::Via::<domain::property::Address>,
)]
pub struct Address(domain::property::Address);

/// City where a `Property` is located.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyCity",
    with = scalar::Via::<domain::property::City>,
)]
pub struct City(domain::property::City);

/// Neighborhood where a `Property` is located.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyNeighborhood",
    with = scalar::Via::<domain::property::Neighborhood>,
)]
pub struct Neighborhood(domain::property::Neighborhood);

/// Zip code of a `Property` location.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyZipCode",
    with = scalar::Via::<domain::property::ZipCode>,
)]
pub struct ZipCode(domain::property::ZipCode);

/// Category of a `Property`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PropertyCategory")]
pub enum Category {
    /// A house.
    House,

    /// An apartment.
    Apartment,

    /// Commercial premises.
    CommercialPremises,

    /// An office.
    Office,

    /// A warehouse.
    Warehouse,

    /// Anything else.
    Other,
}

impl From<domain::property::Category> for Category {
    fn from(category: domain::property::Category) -> Self {
        use domain::property::Category as C;
        match category {
            C::House => Self::House,
            C::Apartment => Self::Apartment,
            C::CommercialPremises => Self::CommercialPremises,
            C::Office => Self::Office,
            C::Warehouse => Self::Warehouse,
            C::Other => Self::Other,
        }
    }
}

impl From<Category> for domain::property::Category {
    fn from(category: Category) -> Self {
        match category {
            Category::House => Self::House,
            Category::Apartment => Self::Apartment,
            Category::CommercialPremises => Self::CommercialPremises,
            Category::Office => Self::Office,
            Category::Warehouse => Self::Warehouse,
            Category::Other => Self::Other,
        }
    }
}

/// Availability status of a `Property`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PropertyStatus")]
pub enum Status {
    /// `Property` may be rented.
    Available,

    /// `Property` is rented under an active `Lease`.
    Rented,

    /// `Property` is under maintenance.
    Maintenance,

    /// `Property` is withdrawn by its owner.
    Unavailable,
}

impl From<domain::property::Status> for Status {
    fn from(status: domain::property::Status) -> Self {
        use domain::property::Status as S;
        match status {
            S::Available => Self::Available,
            S::Rented => Self::Rented,
            S::Maintenance => Self::Maintenance,
            S::Unavailable => Self::Unavailable,
        }
    }
}

impl From<Status> for domain::property::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Available => Self::Available,
            Status::Rented => Self::Rented,
            Status::Maintenance => Self::Maintenance,
            Status::Unavailable => Self::Unavailable,
        }
    }
}

define_list!(
    Property,
    read = property,
    total_count = service::query::properties::TotalCount,
    names = (
        "PropertyListCursor",
        "PropertyListEdge",
        "PropertyListConnection",
        "PropertyListPageInfo",
    ),
);
