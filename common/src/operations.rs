//! [`Handler`] abstraction and the operations it is executed with.
//!
//! Commands, queries, background tasks, repositories and the document mirror
//! are all [`Handler`]s of some operation wrapping its arguments, so a single
//! type may handle many operations distinguished by their types only.

use std::{future::Future, marker::PhantomData};

/// Executable handler of `Args`.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

/// Operation to insert a new entity into a storage.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to upsert an entity into a storage.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation to delete an entity from a storage.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Operation to select entities from a storage.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to lock entities in a storage until the end of the current
/// transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Operation to start a background task.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Operation to perform a single iteration of a background task.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Operation to begin a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Transact`]ed [`Handler`].
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation to commit a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by `B`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value to select.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] with the given value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Consumes this [`By`] and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}

#[cfg(test)]
mod spec {
    use super::{By, Transact, Transacted};
    use crate::Handler;

    /// Storage starting transactions of itself.
    struct Storage;

    impl Handler<Transact> for Storage {
        type Ok = Self;
        type Err = ();

        async fn execute(&self, _: Transact) -> Result<Self, ()> {
            Ok(Self)
        }
    }

    #[test]
    fn unwraps_selector() {
        let by = By::<String, _>::new(42_u32);

        assert_eq!(by.into_inner(), 42);
    }

    #[test]
    fn resolves_transacted_type() {
        let _: Option<Transacted<Storage>> = None::<Storage>;
    }
}
