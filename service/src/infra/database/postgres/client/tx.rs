//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection as _},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// The transaction is opened on the first query, reusing the connection of
/// the [`NonTx`] client it was created from, if that one has any.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to acquire a [`connection::NonTx`] from, if the
    /// [`NonTx`] client has none.
    pool: connection::Pool,

    /// Shared state of this client.
    inner: Arc<Inner>,
}

/// Shared state of a [`Tx`] client.
#[derive(Debug)]
pub struct Inner {
    /// [`NonTx`] client this [`Tx`] was created from, until its connection
    /// is taken.
    origin: RwLock<Option<NonTx>>,

    /// Lazily opened [`connection::Tx`].
    tx: RwLock<Option<connection::Tx>>,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            inner: Arc::new(Inner {
                origin: RwLock::new(Some(client)),
                tx: RwLock::new(None),
            }),
        }
    }

    /// Returns the [`connection::Tx`] of this client, opening it if there is
    /// none yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        {
            let existing = self.inner.tx.read().await;
            if existing.is_some() {
                return Ok(RwLockReadGuard::map(existing, |c| {
                    c.as_ref().expect("checked above")
                }));
            }
        }

        let mut slot = self.inner.tx.write().await;
        if slot.is_none() {
            let reused = match self.inner.origin.write().await.take() {
                Some(origin) => origin.take_connection().await,
                None => None,
            };
            let conn = match reused {
                Some(conn) => conn,
                None => self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?,
            };
            *slot = Some(
                connection::Tx::from_non_tx(conn)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(RwLockReadGuard::map(slot.downgrade(), |c| {
            c.as_ref().expect("initialized above")
        }))
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// Does nothing if no query has been made, so no transaction is open.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self.inner.tx.write().await.take();
        match tx {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

super::forward_connection!(Tx);
