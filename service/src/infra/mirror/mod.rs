//! Best-effort mirror of the written entities into a secondary document
//! store.
//!
//! Committed mutations [`Outbox::publish()`] a [`Document`] per written
//! entity into an in-process queue, which is drained into a [`Mirror`] in
//! background. Nothing here may fail or block a mutation: a closed queue or a
//! failed delivery is logged and forgotten.

mod document;
mod rest;

use std::convert::Infallible;

use common::operations::Update;
use tokio::sync::mpsc;
use tracing as log;

pub use self::{
    document::{Document, Mirrored},
    rest::{Error, Rest},
};

/// Mirror operation.
pub use common::Handler as Mirror;

/// Sending half of the mirror queue.
#[derive(Clone, Debug)]
pub struct Outbox(mpsc::UnboundedSender<Document>);

/// Receiving half of the mirror queue.
#[derive(Debug)]
pub struct Inbox(mpsc::UnboundedReceiver<Document>);

impl Outbox {
    /// Creates a new mirror queue.
    #[must_use]
    pub fn channel() -> (Self, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), Inbox(rx))
    }

    /// Enqueues the [`Document`] of the provided entity for mirroring.
    pub fn publish(&self, entity: &impl Mirrored) {
        let doc = entity.to_document();
        if let Err(mpsc::error::SendError(doc)) = self.0.send(doc) {
            log::warn!(
                "mirror queue is closed, dropping `{}/{}` document",
                doc.collection,
                doc.id,
            );
        }
    }
}

impl Inbox {
    /// Receives the next [`Document`] from the queue.
    ///
    /// [`None`] is returned once all the [`Outbox`]es are dropped.
    pub async fn recv(&mut self) -> Option<Document> {
        self.0.recv().await
    }

    /// Takes all the [`Document`]s already present in the queue.
    pub fn drain(&mut self) -> Vec<Document> {
        let mut docs = vec![];
        while let Ok(doc) = self.0.try_recv() {
            docs.push(doc);
        }
        docs
    }
}

/// [`Mirror`] discarding every [`Document`].
///
/// Used when no document store is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct Noop;

impl Mirror<Update<Document>> for Noop {
    type Ok = ();
    type Err = Infallible;

    async fn execute(&self, _: Update<Document>) -> Result<(), Infallible> {
        Ok(())
    }
}
