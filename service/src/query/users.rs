//! [`Query`] collection related to the multiple [`User`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries multiple [`User`]s by their [`user::Id`]s.
pub type ByIds = DatabaseQuery<By<HashMap<user::Id, User>, Vec<user::Id>>>;
