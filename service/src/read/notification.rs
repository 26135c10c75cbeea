//! [`Notification`]-related read definitions.

use crate::domain::{user, Notification};
#[cfg(doc)]
use crate::domain::User;

/// Selector of all the unread [`Notification`]s of a [`User`].
#[derive(Clone, Copy, Debug)]
pub struct AllUnread(pub user::Id);

/// Unread [`Notification`]s of a recipient.
#[derive(Clone, Debug)]
pub struct Unread {
    /// Total number of unread [`Notification`]s.
    pub count: i32,

    /// [`Unread::LATEST`] most recent unread [`Notification`]s, newest
    /// first.
    pub latest: Vec<Notification>,
}

impl Unread {
    /// Number of the most recent unread [`Notification`]s to include.
    pub const LATEST: usize = 5;
}

pub mod list {
    //! [`Notification`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{notification, user};
    #[cfg(doc)]
    use crate::domain::{Notification, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = notification::Id;

    /// Cursor pointing to a specific [`Notification`] in a list.
    pub type Cursor = notification::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] receiving the [`Notification`]s.
        pub recipient_id: user::Id,

        /// Whether the [`Notification`]s should be read or unread.
        pub is_read: Option<bool>,

        /// [`notification::Kind`] to filter by.
        pub kind: Option<notification::Kind>,
    }

    /// Total count of [`Notification`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
