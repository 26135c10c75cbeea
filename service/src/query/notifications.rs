//! [`Query`] collection related to the [`Notification`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{notification, user, Notification},
    read,
};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries multiple [`Notification`]s by their [`notification::Id`]s.
pub type ByIds = DatabaseQuery<
    By<HashMap<notification::Id, Notification>, Vec<notification::Id>>,
>;

/// Queries a list of [`Notification`]s.
pub type List = DatabaseQuery<
    By<read::notification::list::Page, read::notification::list::Selector>,
>;

/// Queries total count of [`Notification`] list items.
pub type TotalCount = DatabaseQuery<
    By<read::notification::list::TotalCount, read::notification::list::Filter>,
>;

/// Queries the [`read::notification::Unread`] summary of a [`User`].
pub type Unread = DatabaseQuery<By<read::notification::Unread, user::Id>>;
