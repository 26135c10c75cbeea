//! [`Payment`]-related read definitions.

use derive_more::{Deref, From, Into};
use rust_decimal::Decimal;

use crate::domain::{payment, user};
#[cfg(doc)]
use crate::domain::{Lease, Payment, User};

/// Indicator whether the payment schedule of a [`Lease`] has been generated
/// already.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct Scheduled(pub bool);

/// IDs of [`Payment`]s not fully paid past their due date.
#[derive(Clone, Debug, Default, Deref, From, Into)]
pub struct Overdue(pub Vec<payment::Id>);

/// Selector of the most recently created [`Payment`]s of all the [`Lease`]s
/// owned by a [`User`], newest first.
#[derive(Clone, Copy, Debug)]
pub struct Latest {
    /// ID of the owner [`User`].
    pub owner_id: user::Id,

    /// Maximum number of [`Payment`]s to select.
    pub limit: usize,
}

/// Summary of the [`Payment`]s of all the [`Lease`]s owned by a [`User`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Number of fully paid [`Payment`]s.
    pub paid: i32,

    /// Number of [`Payment`]s not due yet.
    pub pending: i32,

    /// Number of [`Payment`]s past their due date with nothing paid.
    pub overdue: i32,

    /// Number of partially paid [`Payment`]s.
    pub partial: i32,

    /// Total amount received.
    pub received: Decimal,

    /// Total amount left to be paid, late fees included.
    pub outstanding: Decimal,

    /// Total amount of late fees charged.
    pub late_fees: Decimal,
}

pub mod list {
    //! [`Payment`] list definitions.

    use common::{define_pagination, Date};
    use derive_more::{From, Into};

    use crate::domain::{lease, payment, user};
    #[cfg(doc)]
    use crate::domain::{Lease, Payment, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = payment::Id;

    /// Cursor pointing to a specific [`Payment`] in a list.
    pub type Cursor = payment::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] taking any party in the [`Lease`]s of the
        /// [`Payment`]s.
        pub participant_id: user::Id,

        /// Whether only the [`Lease`]s owned by the
        /// [`Filter::participant_id`] should be considered.
        pub owned_only: bool,

        /// ID of the [`Lease`] to filter by.
        pub lease_id: Option<lease::Id>,

        /// [`payment::Status`] to filter by, as of today.
        pub status: Option<payment::Status>,

        /// Earliest due [`Date`] of the [`Payment`]s.
        pub due_from: Option<Date>,

        /// Latest due [`Date`] of the [`Payment`]s.
        pub due_until: Option<Date>,
    }

    /// Total count of [`Payment`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
