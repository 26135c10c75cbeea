//! [`Query`] collection related to the multiple maintenance [`Ticket`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{maintenance, MaintenanceTicket as Ticket},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries multiple [`Ticket`]s by their [`maintenance::Id`]s.
pub type ByIds =
    DatabaseQuery<By<HashMap<maintenance::Id, Ticket>, Vec<maintenance::Id>>>;

/// Queries a list of [`Ticket`]s.
pub type List = DatabaseQuery<
    By<read::maintenance::list::Page, read::maintenance::list::Selector>,
>;

/// Queries total count of [`Ticket`] list items.
pub type TotalCount = DatabaseQuery<
    By<read::maintenance::list::TotalCount, read::maintenance::list::Filter>,
>;
