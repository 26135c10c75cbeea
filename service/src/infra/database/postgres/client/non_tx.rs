//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection as _},
};

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire [`connection::NonTx`]s from.
    pub(crate) pool: connection::Pool,

    /// Lazily acquired [`connection::NonTx`] shared between clones.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client on top of the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`connection::NonTx`] of this client, acquiring it from
    /// the [`connection::Pool`] if there is none yet.
    pub(crate) async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        {
            let existing = self.connection.read().await;
            if existing.is_some() {
                return Ok(RwLockReadGuard::map(existing, |c| {
                    c.as_ref().expect("checked above")
                }));
            }
        }

        let mut slot = self.connection.write().await;
        if slot.is_none() {
            *slot = Some(
                self.pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?,
            );
        }
        Ok(RwLockReadGuard::map(slot.downgrade(), |c| {
            c.as_ref().expect("initialized above")
        }))
    }

    /// Takes the [`connection::NonTx`] out of this client, so it can be
    /// turned into a transaction.
    ///
    /// The next use of this client acquires a new [`connection::NonTx`].
    #[must_use]
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

super::forward_connection!(NonTx);
