//! [`Query`] collection related to a single maintenance [`Ticket`].

use common::operations::By;

use crate::domain::{
    maintenance::{self, Comment},
    MaintenanceTicket as Ticket,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Ticket`] by its [`maintenance::Id`].
pub type ById = DatabaseQuery<By<Option<Ticket>, maintenance::Id>>;

/// Queries all the [`Comment`]s of a [`Ticket`], oldest first.
pub type Comments = DatabaseQuery<By<Vec<Comment>, maintenance::Id>>;
