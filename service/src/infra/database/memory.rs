//! In-memory [`Database`] implementation backing unit tests.
//!
//! Transactions operate on a snapshot of the committed [`State`], which
//! replaces the committed one on [`Commit`]. Locks are no-ops, as tests run
//! on a single thread.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    Date,
};
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{
        lease::{self, signature},
        maintenance::{self, Comment},
        notification,
        payment::{self, Registration},
        property, rental_request,
        user::{self, Profile},
        Lease, MaintenanceTicket, Notification, Payment, Property,
        RentalRequest, User,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed [`State`].
    committed: Arc<Mutex<State>>,

    /// [`State`] of the currently open transaction, if any.
    staged: Option<Arc<Mutex<State>>>,
}

/// Contents of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    users: HashMap<user::Id, User>,
    profiles: HashMap<user::Id, Profile>,
    properties: HashMap<property::Id, Property>,
    rental_requests: HashMap<rental_request::Id, RentalRequest>,
    leases: HashMap<lease::Id, Lease>,
    signatures: Vec<signature::Record>,
    payments: HashMap<payment::Id, Payment>,
    registrations: Vec<Registration>,
    tickets: HashMap<maintenance::Id, MaintenanceTicket>,
    comments: Vec<Comment>,
    notifications: HashMap<notification::Id, Notification>,
    serial: i64,
}

impl Memory {
    /// Returns the [`State`] visible to this [`Memory`].
    fn state(&self) -> MutexGuard<'_, State> {
        self.staged
            .as_ref()
            .unwrap_or(&self.committed)
            .lock()
            .expect("poisoned")
    }
}

/// [`Memory`] error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique constraint
    /// with the provided name.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        match self {
            Self::UniqueViolation(c) => *c == constraint,
        }
    }
}

/// Fails with [`Error::UniqueViolation`] of the provided `constraint`.
fn violation(constraint: &'static str) -> Traced<database::Error> {
    tracerr::new!(database::Error::Memory(Error::UniqueViolation(constraint)))
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.staged.is_some() {
            return Ok(self.clone());
        }
        let snapshot = self.state().clone();
        Ok(Self {
            committed: Arc::clone(&self.committed),
            staged: Some(Arc::new(Mutex::new(snapshot))),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(staged) = &self.staged {
            let staged = staged.lock().expect("poisoned").clone();
            *self.committed.lock().expect("poisoned") = staged;
        }
        Ok(())
    }
}

/// Implements the basic [`Database`] operations of an entity stored in the
/// provided [`State`] field.
macro_rules! impl_entity {
    ($entity:ty, $id:ty, $field:ident) => {
        impl<IDs> Database<Select<By<HashMap<$id, $entity>, IDs>>> for Memory
        where
            IDs: AsRef<[$id]>,
        {
            type Ok = HashMap<$id, $entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<HashMap<$id, $entity>, IDs>>,
            ) -> Result<Self::Ok, Self::Err> {
                let ids = by.into_inner();
                let state = self.state();
                Ok(ids
                    .as_ref()
                    .iter()
                    .filter_map(|id| Some((*id, state.$field.get(id)?.clone())))
                    .collect())
            }
        }

        impl Database<Select<By<Option<$entity>, $id>>> for Memory {
            type Ok = Option<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<Option<$entity>, $id>>,
            ) -> Result<Self::Ok, Self::Err> {
                Ok(self.state().$field.get(&by.into_inner()).cloned())
            }
        }

        impl Database<Update<$entity>> for Memory {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Update(entity): Update<$entity>,
            ) -> Result<Self::Ok, Self::Err> {
                _ = self.state().$field.insert(entity.id, entity);
                Ok(())
            }
        }

        impl Database<Lock<By<$entity, $id>>> for Memory {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                _: Lock<By<$entity, $id>>,
            ) -> Result<Self::Ok, Self::Err> {
                Ok(())
            }
        }
    };
}

impl_entity!(User, user::Id, users);
impl_entity!(Property, property::Id, properties);
impl_entity!(RentalRequest, rental_request::Id, rental_requests);
impl_entity!(Lease, lease::Id, leases);
impl_entity!(Payment, payment::Id, payments);
impl_entity!(MaintenanceTicket, maintenance::Id, tickets);
impl_entity!(Notification, notification::Id, notifications);

/// Implements [`Insert`] of an entity delegating to its [`Update`].
macro_rules! impl_insert {
    ($($entity:ty),* $(,)?) => {$(
        impl Database<Insert<$entity>> for Memory {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Insert(entity): Insert<$entity>,
            ) -> Result<Self::Ok, Self::Err> {
                self.execute(Update(entity)).await
            }
        }
    )*};
}

impl_insert!(Property, RentalRequest, MaintenanceTicket, Notification);

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        {
            let state = self.state();
            let others = state.users.values().filter(|u| u.id != user.id);
            for other in others {
                if other.login == user.login {
                    return Err(violation("users_login_key"));
                }
                if other.national_id.is_some()
                    && other.national_id == user.national_id
                {
                    return Err(violation("users_national_id_key"));
                }
            }
        }
        self.execute(Update(user)).await
    }
}

impl Database<Insert<Lease>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        let occupied = lease.rental_request_id.is_some()
            && self.state().leases.values().any(|l| {
                l.id != lease.id && l.rental_request_id == lease.rental_request_id
            });
        if occupied {
            return Err(violation("leases_rental_request_id_key"));
        }
        self.execute(Update(lease)).await
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let occupied = self.state().payments.values().any(|p| {
            p.id != payment.id
                && p.lease_id == payment.lease_id
                && p.sequence == payment.sequence
        });
        if occupied {
            return Err(violation("payments_lease_id_sequence_key"));
        }
        self.execute(Update(payment)).await
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Login>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .state()
            .users
            .values()
            .find(|u| &u.login == login && u.deleted_at.is_none())
            .cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::NationalId>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::NationalId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let national_id = by.into_inner();
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.national_id.as_ref() == Some(national_id))
            .cloned())
    }
}

impl Database<Select<By<Option<Profile>, user::Id>>> for Memory {
    type Ok = Option<Profile>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Profile>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().profiles.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Profile>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(profile): Insert<Profile>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().profiles.insert(profile.user_id, profile);
        Ok(())
    }
}

impl
    Database<
        Select<
            By<read::rental_request::HasPending, (property::Id, user::Id)>,
        >,
    > for Memory
{
    type Ok = read::rental_request::HasPending;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::rental_request::HasPending, (property::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (property_id, tenant_id) = by.into_inner();
        Ok(read::rental_request::HasPending(
            self.state().rental_requests.values().any(|r| {
                r.property_id == property_id
                    && r.tenant_id == tenant_id
                    && r.is_pending()
            }),
        ))
    }
}

impl Database<Select<By<read::lease::HasOtherActive, lease::Id>>> for Memory {
    type Ok = read::lease::HasOtherActive;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::lease::HasOtherActive, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let state = self.state();
        let Some(this) = state.leases.get(&id) else {
            return Ok(read::lease::HasOtherActive(false));
        };
        Ok(read::lease::HasOtherActive(state.leases.values().any(|l| {
            l.id != id && l.property_id == this.property_id && l.is_active()
        })))
    }
}

impl Database<Select<By<read::lease::ActiveTenancy, (property::Id, user::Id)>>>
    for Memory
{
    type Ok = read::lease::ActiveTenancy;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::lease::ActiveTenancy, (property::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (property_id, tenant_id) = by.into_inner();
        Ok(read::lease::ActiveTenancy(self.state().leases.values().any(
            |l| {
                l.property_id == property_id
                    && l.tenant_id == tenant_id
                    && l.is_active()
            },
        )))
    }
}

impl Database<Select<By<read::lease::Expired, Date>>> for Memory {
    type Ok = read::lease::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::lease::Expired, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        Ok(self
            .state()
            .leases
            .values()
            .filter(|l| l.is_active() && l.end_date < today)
            .map(|l| l.id)
            .collect::<Vec<_>>()
            .into())
    }
}

impl Database<Insert<signature::Record>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(record): Insert<signature::Record>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().signatures.push(record);
        Ok(())
    }
}

impl Database<Select<By<Vec<signature::Record>, lease::Id>>> for Memory {
    type Ok = Vec<signature::Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<signature::Record>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        Ok(self
            .state()
            .signatures
            .iter()
            .filter(|r| r.lease_id == lease_id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<read::payment::Scheduled, lease::Id>>> for Memory {
    type Ok = read::payment::Scheduled;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Scheduled, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        Ok(read::payment::Scheduled(
            self.state().payments.values().any(|p| p.lease_id == lease_id),
        ))
    }
}

impl Database<Select<By<read::payment::Overdue, Date>>> for Memory {
    type Ok = read::payment::Overdue;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Overdue, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        Ok(self
            .state()
            .payments
            .values()
            .filter(|p| p.is_overdue(today))
            .map(|p| p.id)
            .collect::<Vec<_>>()
            .into())
    }
}

impl Database<Select<By<Vec<Payment>, lease::Id>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let mut payments = self
            .state()
            .payments
            .values()
            .filter(|p| p.lease_id == lease_id)
            .cloned()
            .collect::<Vec<_>>();
        payments.sort_by_key(|p| p.sequence);
        Ok(payments)
    }
}

impl Database<Select<By<Vec<Payment>, read::payment::Latest>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::Latest>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::Latest { owner_id, limit } = by.into_inner();
        let state = self.state();

        let mut payments = state
            .payments
            .values()
            .filter(|p| {
                state
                    .leases
                    .get(&p.lease_id)
                    .is_some_and(|l| l.owner_id == owner_id)
            })
            .cloned()
            .collect::<Vec<_>>();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments.truncate(limit);
        Ok(payments)
    }
}

impl Database<Select<By<read::payment::Summary, user::Id>>> for Memory {
    type Ok = read::payment::Summary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Summary, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        let today = Date::today();
        let state = self.state();

        let mut summary = read::payment::Summary::default();
        let owned = state.payments.values().filter(|p| {
            state
                .leases
                .get(&p.lease_id)
                .is_some_and(|l| l.owner_id == owner_id)
        });
        for p in owned {
            match p.status(today) {
                payment::Status::Paid => summary.paid += 1,
                payment::Status::Pending => summary.pending += 1,
                payment::Status::Overdue => summary.overdue += 1,
                payment::Status::Partial => summary.partial += 1,
            }
            summary.received += p.amount_paid.amount;
            summary.outstanding += p.balance().amount.max(Decimal::ZERO);
            summary.late_fees += p.late_fee.amount;
        }
        Ok(summary)
    }
}

impl Database<Insert<Registration>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(registration): Insert<Registration>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().registrations.push(registration);
        Ok(())
    }
}

impl Database<Select<By<Vec<Registration>, payment::Id>>> for Memory {
    type Ok = Vec<Registration>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Registration>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let payment_id = by.into_inner();
        Ok(self
            .state()
            .registrations
            .iter()
            .filter(|r| r.payment_id == payment_id)
            .cloned()
            .collect())
    }
}

impl Database<Insert<Comment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(comment): Insert<Comment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().comments.push(comment);
        Ok(())
    }
}

impl Database<Select<By<Vec<Comment>, maintenance::Id>>> for Memory {
    type Ok = Vec<Comment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Comment>, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ticket_id = by.into_inner();
        Ok(self
            .state()
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<Vec<Notification>, read::notification::AllUnread>>>
    for Memory
{
    type Ok = Vec<Notification>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Notification>, read::notification::AllUnread>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::notification::AllUnread(recipient_id) = by.into_inner();
        let mut unread = self
            .state()
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read())
            .cloned()
            .collect::<Vec<_>>();
        unread.sort_by_key(|n| n.created_at);
        Ok(unread)
    }
}

impl Database<Select<By<read::notification::Unread, user::Id>>> for Memory {
    type Ok = read::notification::Unread;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::notification::Unread, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut unread = self
            .execute(Select(By::<Vec<Notification>, _>::new(
                read::notification::AllUnread(by.into_inner()),
            )))
            .await?;
        unread.reverse();
        Ok(read::notification::Unread {
            count: i32::try_from(unread.len()).unwrap_or(i32::MAX),
            latest: unread
                .into_iter()
                .take(read::notification::Unread::LATEST)
                .collect(),
        })
    }
}

impl Database<Delete<By<Notification, notification::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Notification, notification::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().notifications.remove(&by.into_inner());
        Ok(())
    }
}

/// Implements [`Select`]ing a number type out of the shared serial counter.
macro_rules! impl_number {
    ($($number:ty),* $(,)?) => {$(
        impl Database<Select<By<$number, i32>>> for Memory {
            type Ok = $number;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<$number, i32>>,
            ) -> Result<Self::Ok, Self::Err> {
                let year = by.into_inner();
                let serial = {
                    let mut state = self.state();
                    state.serial += 1;
                    state.serial
                };
                Ok(<$number>::new(year, serial))
            }
        }
    )*};
}

impl_number!(lease::Number, payment::Number, maintenance::Number);
