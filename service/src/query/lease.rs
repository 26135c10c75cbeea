//! [`Query`] collection related to a single [`Lease`].

use common::operations::By;

use crate::domain::{
    lease::{self, signature},
    Lease,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Lease`] by its [`lease::Id`].
pub type ById = DatabaseQuery<By<Option<Lease>, lease::Id>>;

/// Queries all the [`signature::Record`]s of a [`Lease`], oldest first.
pub type Signatures = DatabaseQuery<By<Vec<signature::Record>, lease::Id>>;
