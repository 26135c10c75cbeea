//! Maintenance [`Ticket`]-related read definitions.
//!
//! [`Ticket`]: crate::domain::MaintenanceTicket

pub mod list {
    //! Maintenance [`Ticket`] list definitions.
    //!
    //! [`Ticket`]: crate::domain::MaintenanceTicket

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{maintenance, property, user};
    #[cfg(doc)]
    use crate::domain::{MaintenanceTicket as Ticket, Property, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = maintenance::Id;

    /// Cursor pointing to a specific [`Ticket`] in a list.
    pub type Cursor = maintenance::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] owning the [`Property`]s of the [`Ticket`]s.
        pub owner_id: Option<user::Id>,

        /// ID of the [`User`] who requested the [`Ticket`]s.
        pub requester_id: Option<user::Id>,

        /// ID of the [`Property`] to filter by.
        pub property_id: Option<property::Id>,

        /// [`maintenance::Status`] to filter by.
        pub status: Option<maintenance::Status>,

        /// [`maintenance::Category`] to filter by.
        pub category: Option<maintenance::Category>,

        /// [`maintenance::Priority`] to filter by.
        pub priority: Option<maintenance::Priority>,
    }

    /// Total count of [`Ticket`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
