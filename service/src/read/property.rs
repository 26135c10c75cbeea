//! [`Property`]-related read definitions.

#[cfg(doc)]
use crate::domain::Property;

pub mod list {
    //! [`Property`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};
    use rust_decimal::Decimal;

    use crate::domain::{property, user};
    #[cfg(doc)]
    use crate::domain::{Property, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = property::Id;

    /// Cursor pointing to a specific [`Property`] in a list.
    pub type Cursor = property::Id;

    /// Filter for [`Selector`].
    ///
    /// Without an [`Filter::owner_id`] only available and active
    /// [`Property`]s are listed (the public catalog).
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] whose [`Property`]s should be listed regardless
        /// of their status.
        pub owner_id: Option<user::Id>,

        /// [`property::Category`] to filter by.
        pub category: Option<property::Category>,

        /// [`property::City`] to filter by.
        pub city: Option<property::City>,

        /// Words to search for in titles and addresses.
        pub text: Option<String>,

        /// Minimal monthly rent amount.
        pub min_rent: Option<Decimal>,

        /// Maximal monthly rent amount.
        pub max_rent: Option<Decimal>,

        /// Minimal number of bedrooms.
        pub min_bedrooms: Option<property::Rooms>,

        /// Minimal number of bathrooms.
        pub min_bathrooms: Option<property::Rooms>,

        /// Whether the [`Property`] should be furnished.
        pub is_furnished: Option<bool>,

        /// Whether the [`Property`] should allow pets.
        pub allows_pets: Option<bool>,
    }

    /// Total count of [`Property`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
