//! [`RentalRequest`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{lease, property, user};
#[cfg(doc)]
use crate::domain::{Lease, Property, User};

/// Request of a tenant to rent a [`Property`].
///
/// Accepting a [`RentalRequest`] creates a draft [`Lease`].
#[derive(Clone, Debug)]
pub struct RentalRequest {
    /// ID of this [`RentalRequest`].
    pub id: Id,

    /// ID of the requested [`Property`].
    pub property_id: property::Id,

    /// ID of the [`User`] requesting the [`Property`].
    pub tenant_id: user::Id,

    /// ID of the [`User`] owning the [`Property`] at the moment of request.
    pub owner_id: user::Id,

    /// [`Message`] from the tenant, if any.
    pub message: Option<Message>,

    /// [`Status`] of this [`RentalRequest`].
    pub status: Status,

    /// ID of the [`Lease`] created by accepting this [`RentalRequest`].
    pub lease_id: Option<lease::Id>,

    /// [`DateTime`] when this [`RentalRequest`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when the owner responded to this [`RentalRequest`].
    pub responded_at: Option<ResponseDateTime>,
}

impl RentalRequest {
    /// Indicates whether this [`RentalRequest`] awaits a response.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    /// Marks this [`RentalRequest`] as accepted with the provided [`Lease`].
    ///
    /// Returns `false` if this [`RentalRequest`] is not pending anymore.
    pub fn accept(&mut self, lease_id: lease::Id) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = Status::Accepted;
        self.lease_id = Some(lease_id);
        self.responded_at = Some(ResponseDateTime::now());
        true
    }

    /// Marks this [`RentalRequest`] as rejected.
    ///
    /// Returns `false` if this [`RentalRequest`] is not pending anymore.
    pub fn reject(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = Status::Rejected;
        self.responded_at = Some(ResponseDateTime::now());
        true
    }

    /// Marks this [`RentalRequest`] as cancelled by its tenant.
    ///
    /// Returns `false` if this [`RentalRequest`] is not pending anymore.
    pub fn cancel(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = Status::Cancelled;
        true
    }
}

/// ID of a [`RentalRequest`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new time-ordered [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

define_text! {
    #[doc = "Message attached to a [`RentalRequest`]."]
    struct Message(..= 2000);
}

define_kind! {
    #[doc = "Status of a [`RentalRequest`]."]
    enum Status {
        #[doc = "Awaiting the owner response."]
        Pending = 1,

        #[doc = "Accepted by the owner."]
        Accepted = 2,

        #[doc = "Rejected by the owner."]
        Rejected = 3,

        #[doc = "Cancelled by the tenant."]
        Cancelled = 4,
    }
}

/// Marker type describing a response to a [`RentalRequest`].
#[derive(Clone, Copy, Debug)]
pub struct Response;

/// [`DateTime`] when a [`RentalRequest`] was created.
pub type CreationDateTime = DateTimeOf<(RentalRequest, unit::Creation)>;

/// [`DateTime`] when a [`RentalRequest`] was responded to.
pub type ResponseDateTime = DateTimeOf<(RentalRequest, Response)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{lease, property, user};

    use super::{Id, RentalRequest, Status};

    fn request() -> RentalRequest {
        RentalRequest {
            id: Id::new(),
            property_id: property::Id::new(),
            tenant_id: user::Id::new(),
            owner_id: user::Id::new(),
            message: None,
            status: Status::Pending,
            lease_id: None,
            created_at: DateTime::now().coerce(),
            responded_at: None,
        }
    }

    #[test]
    fn accepts_only_once() {
        let mut req = request();
        let lease_id = lease::Id::new();

        assert!(req.accept(lease_id));
        assert_eq!(req.status, Status::Accepted);
        assert_eq!(req.lease_id, Some(lease_id));
        assert!(req.responded_at.is_some());

        assert!(!req.accept(lease::Id::new()));
        assert_eq!(req.lease_id, Some(lease_id));
        assert!(!req.reject());
        assert!(!req.cancel());
    }

    #[test]
    fn rejection_leaves_no_lease() {
        let mut req = request();

        assert!(req.reject());
        assert_eq!(req.status, Status::Rejected);
        assert_eq!(req.lease_id, None);
        assert!(!req.accept(lease::Id::new()));
    }

    #[test]
    fn cancels_while_pending() {
        let mut req = request();

        assert!(req.cancel());
        assert_eq!(req.status, Status::Cancelled);
        assert!(req.responded_at.is_none());
    }
}
