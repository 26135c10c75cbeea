//! [`Lease`]-related read definitions.

use derive_more::{Deref, From, Into};

use crate::domain::lease;
#[cfg(doc)]
use crate::domain::{Lease, Property, User};

/// Indicator whether the [`Property`] of a [`Lease`] has any other active
/// [`Lease`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasOtherActive(pub bool);

/// Indicator whether a [`User`] is the tenant of an active [`Lease`] on a
/// [`Property`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct ActiveTenancy(pub bool);

/// IDs of active [`Lease`]s whose end date has passed.
#[derive(Clone, Debug, Default, Deref, From, Into)]
pub struct Expired(pub Vec<lease::Id>);

pub mod list {
    //! [`Lease`] list definitions.

    use common::{define_pagination, Date};
    use derive_more::{From, Into};

    use crate::domain::{lease, user};
    #[cfg(doc)]
    use crate::domain::{Lease, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = lease::Id;

    /// Cursor pointing to a specific [`Lease`] in a list.
    pub type Cursor = lease::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] taking any party in the [`Lease`]s.
        pub participant_id: user::Id,

        /// [`lease::Status`] to filter by.
        pub status: Option<lease::Status>,

        /// Earliest start [`Date`] of the [`Lease`]s.
        pub starts_from: Option<Date>,

        /// Latest start [`Date`] of the [`Lease`]s.
        pub starts_until: Option<Date>,
    }

    /// Total count of [`Lease`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
