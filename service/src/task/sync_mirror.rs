//! [`SyncMirror`] [`Task`].

use std::{convert::Infallible, fmt::Display};

use common::operations::{Start, Update};
use tracing as log;

use crate::{
    infra::{
        mirror::{Document, Inbox},
        Mirror,
    },
    Service,
};

use super::Task;

/// [`Task`] delivering the published [`Document`]s into a [`Mirror`].
///
/// Runs until all the [`Outbox`]es of the queue are dropped.
///
/// [`Outbox`]: crate::infra::mirror::Outbox
#[derive(Debug)]
pub struct SyncMirror<M> {
    /// Queue of the [`Document`]s to be delivered.
    inbox: Inbox,

    /// [`Mirror`] to deliver the [`Document`]s into.
    mirror: M,
}

impl<M> SyncMirror<M> {
    /// Creates a new [`SyncMirror`] draining the provided [`Inbox`] into the
    /// provided [`Mirror`].
    #[must_use]
    pub fn new(inbox: Inbox, mirror: M) -> Self {
        Self { inbox, mirror }
    }
}

impl<Db, M> Task<Start<SyncMirror<M>>> for Service<Db>
where
    M: Mirror<Update<Document>, Err: Display>,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(task): Start<SyncMirror<M>>,
    ) -> Result<Self::Ok, Self::Err> {
        let SyncMirror { mut inbox, mirror } = task;

        while let Some(doc) = inbox.recv().await {
            let (collection, id) = (doc.collection, doc.id.clone());
            if let Err(e) = mirror.execute(Update(doc)).await {
                log::warn!("failed to mirror `{collection}/{id}` document: {e}");
            }
        }
        log::debug!("mirror queue is closed, stopping `task::SyncMirror`");

        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::{cell::RefCell, convert::Infallible, rc::Rc};

    use common::operations::{Start, Update};

    use crate::{
        domain::user,
        infra::{
            mirror::{Document, Outbox},
            Mirror,
        },
        test, Task as _,
    };

    use super::SyncMirror;

    /// [`Mirror`] remembering the IDs of the delivered [`Document`]s.
    #[derive(Clone, Debug, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Mirror<Update<Document>> for Recorder {
        type Ok = ();
        type Err = Infallible;

        async fn execute(
            &self,
            Update(doc): Update<Document>,
        ) -> Result<(), Infallible> {
            self.0.borrow_mut().push(doc.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_until_queue_is_closed() {
        let (svc, _inbox) = test::service();
        let (outbox, inbox) = Outbox::channel();
        let recorder = Recorder::default();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let property = test::property(&svc, &owner).await;

        outbox.publish(&owner);
        outbox.publish(&property);
        drop(outbox);

        svc.execute(Start(SyncMirror::new(inbox, recorder.clone())))
            .await
            .unwrap();

        assert_eq!(
            *recorder.0.borrow(),
            [owner.id.to_string(), property.id.to_string()],
        );
    }
}
