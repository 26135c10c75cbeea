//! [`Query`] collection related to the multiple [`Property`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{property, Property},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries multiple [`Property`]s by their [`property::Id`]s.
pub type ByIds =
    DatabaseQuery<By<HashMap<property::Id, Property>, Vec<property::Id>>>;

/// Queries a list of [`Property`]s.
pub type List = DatabaseQuery<
    By<read::property::list::Page, read::property::list::Selector>,
>;

/// Queries total count of [`Property`] list items.
pub type TotalCount = DatabaseQuery<
    By<read::property::list::TotalCount, read::property::list::Filter>,
>;
