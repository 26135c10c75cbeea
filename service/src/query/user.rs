//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{
    user::{self, Profile},
    User,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

/// Queries a [`Profile`] of the [`User`] with the provided [`user::Id`].
pub type ProfileOf = DatabaseQuery<By<Option<Profile>, user::Id>>;
