//! [`RentalRequest`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Property, RentalRequest};

/// Indicator whether a tenant already has a pending [`RentalRequest`] for a
/// [`Property`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasPending(pub bool);

pub mod list {
    //! [`RentalRequest`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{rental_request, user};
    #[cfg(doc)]
    use crate::domain::{RentalRequest, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = rental_request::Id;

    /// Cursor pointing to a specific [`RentalRequest`] in a list.
    pub type Cursor = rental_request::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the owner [`User`] who received the [`RentalRequest`]s.
        pub owner_id: Option<user::Id>,

        /// ID of the tenant [`User`] who sent the [`RentalRequest`]s.
        pub tenant_id: Option<user::Id>,

        /// [`rental_request::Status`] to filter by.
        pub status: Option<rental_request::Status>,
    }

    /// Total count of [`RentalRequest`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
