//! [`Query`] collection related to the multiple [`Lease`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{lease, Lease},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries multiple [`Lease`]s by their [`lease::Id`]s.
pub type ByIds = DatabaseQuery<By<HashMap<lease::Id, Lease>, Vec<lease::Id>>>;

/// Queries a list of [`Lease`]s.
pub type List =
    DatabaseQuery<By<read::lease::list::Page, read::lease::list::Selector>>;

/// Queries total count of [`Lease`] list items.
pub type TotalCount =
    DatabaseQuery<By<read::lease::list::TotalCount, read::lease::list::Filter>>;
