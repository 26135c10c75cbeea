//! [`Query`] collection related to the multiple [`RentalRequest`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{rental_request, RentalRequest},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries multiple [`RentalRequest`]s by their [`rental_request::Id`]s.
pub type ByIds = DatabaseQuery<
    By<HashMap<rental_request::Id, RentalRequest>, Vec<rental_request::Id>>,
>;

/// Queries a list of [`RentalRequest`]s.
pub type List = DatabaseQuery<
    By<read::rental_request::list::Page, read::rental_request::list::Selector>,
>;

/// Queries total count of [`RentalRequest`] list items.
pub type TotalCount = DatabaseQuery<
    By<
        read::rental_request::list::TotalCount,
        read::rental_request::list::Filter,
    >,
>;
