//! [`Query`] collection related to the multiple [`Payment`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{lease, payment, Payment},
    read,
};
#[cfg(doc)]
use crate::{domain::Lease, Query};

use super::DatabaseQuery;

/// Queries multiple [`Payment`]s by their [`payment::Id`]s.
pub type ByIds =
    DatabaseQuery<By<HashMap<payment::Id, Payment>, Vec<payment::Id>>>;

/// Queries the whole schedule of a [`Lease`] ordered by sequence.
pub type OfLease = DatabaseQuery<By<Vec<Payment>, lease::Id>>;

/// Queries a list of [`Payment`]s.
pub type List = DatabaseQuery<
    By<read::payment::list::Page, read::payment::list::Selector>,
>;

/// Queries total count of [`Payment`] list items.
pub type TotalCount = DatabaseQuery<
    By<read::payment::list::TotalCount, read::payment::list::Filter>,
>;
