//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Boxed error of a stopped [`Task`].
type BoxError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s.
///
/// All the [`Task`]s are run on the current thread, so the [`Background`]
/// must be awaited inside a [`task::LocalSet`] or a current-thread runtime.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Names and handles of the spawned tasks.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), BoxError>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `task::{name}`");
        let handle = self
            .set
            .spawn_local(future.map_err(|e| BoxError::from(Box::new(e))));
        self.handles.push((name, handle));
    }

    /// Returns the names of the spawned [`Task`]s.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handles.iter().map(|(name, _)| *name)
    }
}

impl IntoFuture for Background {
    type Output = Result<(), BoxError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(
            handles.into_iter().map(|(name, h)| {
                h.map(move |r| {
                    let res = match r {
                        Ok(res) => res,
                        Err(e) => Err(BoxError::from(Box::new(e))),
                    };
                    if let Err(e) = &res {
                        log::error!("`task::{name}` stopped: {e}");
                    }
                    res
                })
                .boxed_local()
            }),
        ))
        .map_ok(drop)
        .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::{fmt, future::IntoFuture as _};

    use derive_more::Error;

    use super::Background;

    #[derive(Debug, Error)]
    struct Stopped;

    impl fmt::Display for Stopped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "stopped")
        }
    }

    #[tokio::test]
    async fn completes_when_all_tasks_complete() {
        let mut bg = Background::default();
        bg.spawn("First", async { Ok::<_, Stopped>(()) });
        bg.spawn("Second", async { Ok::<_, Stopped>(()) });

        assert_eq!(bg.names().collect::<Vec<_>>(), ["First", "Second"]);
        bg.into_future().await.unwrap();
    }

    #[tokio::test]
    async fn fails_when_any_task_fails() {
        let mut bg = Background::default();
        bg.spawn("Ok", async { Ok::<_, Stopped>(()) });
        bg.spawn("Failing", async { Err(Stopped) });

        let err = bg.into_future().await.unwrap_err();
        assert_eq!(err.to_string(), "stopped");
    }
}
