//! [`Notification`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{lease, maintenance, payment, property, user};
#[cfg(doc)]
use crate::domain::User;

/// Message notifying a [`User`] about something happened.
#[derive(Clone, Debug)]
pub struct Notification {
    /// ID of this [`Notification`].
    pub id: Id,

    /// ID of the [`User`] receiving this [`Notification`].
    pub recipient_id: user::Id,

    /// [`Title`] of this [`Notification`].
    pub title: Title,

    /// [`Message`] of this [`Notification`].
    pub message: Message,

    /// [`Kind`] of this [`Notification`].
    pub kind: Kind,

    /// [`Link`] to the subject of this [`Notification`], if any.
    pub link: Option<Link>,

    /// [`Priority`] of this [`Notification`].
    pub priority: Priority,

    /// [`DateTime`] when this [`Notification`] was read.
    pub read_at: Option<ReadDateTime>,

    /// [`DateTime`] when this [`Notification`] was created.
    pub created_at: CreationDateTime,
}

impl Notification {
    /// Creates a new unread [`Notification`].
    #[must_use]
    pub fn new(
        recipient_id: user::Id,
        kind: Kind,
        title: &str,
        message: String,
        link: Option<Link>,
    ) -> Self {
        Self {
            id: Id::new(),
            recipient_id,
            title: Title(title.to_owned()),
            message: Message(message),
            kind,
            link,
            priority: Priority::Normal,
            read_at: None,
            created_at: CreationDateTime::now(),
        }
    }

    /// Sets the [`Priority`] of this [`Notification`].
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Indicates whether this [`Notification`] was read.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Marks this [`Notification`] as read.
    ///
    /// Returns `false` if it was read already.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read() {
            return false;
        }
        self.read_at = Some(ReadDateTime::now());
        true
    }

    /// Notifies a [`property`] owner about a new rental request.
    #[must_use]
    pub fn rental_requested(
        owner_id: user::Id,
        property: &property::Title,
        property_id: property::Id,
    ) -> Self {
        Self::new(
            owner_id,
            Kind::Property,
            "New rental request",
            format!("You have a new rental request for \"{property}\"."),
            Some(Link::property(property_id)),
        )
    }

    /// Notifies a [`property`] owner about a cancelled rental request.
    #[must_use]
    pub fn rental_request_cancelled(
        owner_id: user::Id,
        property: &property::Title,
        property_id: property::Id,
    ) -> Self {
        Self::new(
            owner_id,
            Kind::Property,
            "Rental request cancelled",
            format!("A rental request for \"{property}\" was cancelled."),
            Some(Link::property(property_id)),
        )
    }

    /// Notifies a tenant about an accepted rental request.
    #[must_use]
    pub fn rental_request_accepted(
        tenant_id: user::Id,
        property: &property::Title,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Lease,
            "Rental request accepted",
            format!(
                "Your rental request for \"{property}\" was accepted. You can \
                 sign the lease now.",
            ),
            Some(Link::lease(lease_id)),
        )
    }

    /// Notifies a tenant about a rejected rental request.
    #[must_use]
    pub fn rental_request_rejected(
        tenant_id: user::Id,
        property: &property::Title,
        property_id: property::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Lease,
            "Rental request rejected",
            format!("Your rental request for \"{property}\" was rejected."),
            Some(Link::property(property_id)),
        )
    }

    /// Notifies a tenant about a new lease drafted for them.
    #[must_use]
    pub fn lease_created(
        tenant_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Lease,
            "New lease",
            format!("Lease {number} was created for you."),
            Some(Link::lease(lease_id)),
        )
    }

    /// Notifies a tenant about a lease ready to be signed.
    #[must_use]
    pub fn lease_submitted(
        tenant_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Lease,
            "Lease ready for signing",
            format!("Lease {number} is ready to be signed."),
            Some(Link::lease(lease_id)),
        )
        .with_priority(Priority::High)
    }

    /// Notifies a party about a lease signed by its counter-party.
    #[must_use]
    pub fn lease_signed(
        recipient_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            recipient_id,
            Kind::Lease,
            "Lease signed",
            format!(
                "Lease {number} was signed by the other party and awaits \
                 your signature.",
            ),
            Some(Link::lease(lease_id)),
        )
        .with_priority(Priority::High)
    }

    /// Notifies a party about a lease becoming active.
    #[must_use]
    pub fn lease_activated(
        recipient_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            recipient_id,
            Kind::Lease,
            "Lease activated",
            format!("Lease {number} was signed and activated."),
            Some(Link::lease(lease_id)),
        )
    }

    /// Notifies a tenant about a cancelled lease.
    #[must_use]
    pub fn lease_cancelled(
        tenant_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Lease,
            "Lease cancelled",
            format!("Lease {number} was cancelled."),
            Some(Link::lease(lease_id)),
        )
        .with_priority(Priority::High)
    }

    /// Notifies a tenant about a finalized lease.
    #[must_use]
    pub fn lease_finalized(
        tenant_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Lease,
            "Lease finalized",
            format!("Lease {number} was finalized."),
            Some(Link::lease(lease_id)),
        )
    }

    /// Notifies a party about an expired lease.
    #[must_use]
    pub fn lease_expired(
        recipient_id: user::Id,
        number: &lease::Number,
        lease_id: lease::Id,
    ) -> Self {
        Self::new(
            recipient_id,
            Kind::Lease,
            "Lease expired",
            format!("Lease {number} has reached its end date."),
            Some(Link::lease(lease_id)),
        )
    }

    /// Notifies a party about a registered payment.
    #[must_use]
    pub fn payment_registered(
        recipient_id: user::Id,
        number: &payment::Number,
        amount: common::Money,
        payment_id: payment::Id,
    ) -> Self {
        Self::new(
            recipient_id,
            Kind::Payment,
            "Payment registered",
            format!("A payment of {amount} was registered for {number}."),
            Some(Link::payment(payment_id)),
        )
    }

    /// Notifies a tenant about a payment confirmed as paid.
    #[must_use]
    pub fn payment_confirmed(
        tenant_id: user::Id,
        number: &payment::Number,
        payment_id: payment::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Payment,
            "Payment confirmed",
            format!("Payment {number} was confirmed as paid."),
            Some(Link::payment(payment_id)),
        )
    }

    /// Notifies a tenant about an overdue payment.
    #[must_use]
    pub fn payment_overdue(
        tenant_id: user::Id,
        number: &payment::Number,
        late_fee: common::Money,
        payment_id: payment::Id,
    ) -> Self {
        Self::new(
            tenant_id,
            Kind::Payment,
            "Payment overdue",
            format!(
                "Payment {number} is overdue. Accrued late fee: {late_fee}.",
            ),
            Some(Link::payment(payment_id)),
        )
        .with_priority(Priority::High)
    }

    /// Notifies a [`property`] owner about a new maintenance ticket.
    #[must_use]
    pub fn maintenance_requested(
        owner_id: user::Id,
        number: &maintenance::Number,
        ticket_id: maintenance::Id,
        priority: maintenance::Priority,
    ) -> Self {
        let priority = match priority {
            maintenance::Priority::Urgent | maintenance::Priority::High => {
                Priority::High
            }
            maintenance::Priority::Medium => Priority::Normal,
            maintenance::Priority::Low => Priority::Low,
        };
        Self::new(
            owner_id,
            Kind::Maintenance,
            "New maintenance request",
            format!("Maintenance ticket {number} was requested."),
            Some(Link::maintenance(ticket_id)),
        )
        .with_priority(priority)
    }

    /// Notifies a requester about an updated maintenance ticket.
    #[must_use]
    pub fn maintenance_updated(
        requester_id: user::Id,
        number: &maintenance::Number,
        status: maintenance::Status,
        ticket_id: maintenance::Id,
    ) -> Self {
        Self::new(
            requester_id,
            Kind::Maintenance,
            "Maintenance ticket updated",
            format!("Maintenance ticket {number} is now {status}."),
            Some(Link::maintenance(ticket_id)),
        )
    }

    /// Notifies a party about a new comment on a maintenance ticket.
    #[must_use]
    pub fn maintenance_commented(
        recipient_id: user::Id,
        number: &maintenance::Number,
        ticket_id: maintenance::Id,
    ) -> Self {
        Self::new(
            recipient_id,
            Kind::Message,
            "New maintenance comment",
            format!("Maintenance ticket {number} has a new comment."),
            Some(Link::maintenance(ticket_id)),
        )
    }

    /// Notifies a party about a cancelled maintenance ticket.
    #[must_use]
    pub fn maintenance_cancelled(
        recipient_id: user::Id,
        number: &maintenance::Number,
        ticket_id: maintenance::Id,
    ) -> Self {
        Self::new(
            recipient_id,
            Kind::Maintenance,
            "Maintenance ticket cancelled",
            format!("Maintenance ticket {number} was cancelled."),
            Some(Link::maintenance(ticket_id)),
        )
    }
}

/// ID of a [`Notification`].
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
    #[doc = "Title of a [`Notification`]."]
    struct Title(..= 200);
}

define_text! {
    #[doc = "Message of a [`Notification`]."]
    struct Message(..= 2000);
}

define_text! {
    #[doc = "Relative link to the subject of a [`Notification`]."]
    struct Link(..= 500);
}

impl Link {
    /// Creates a [`Link`] to a [`property`].
    #[must_use]
    pub fn property(id: property::Id) -> Self {
        Self(format!("/properties/{id}"))
    }

    /// Creates a [`Link`] to a [`lease`].
    #[must_use]
    pub fn lease(id: lease::Id) -> Self {
        Self(format!("/leases/{id}"))
    }

    /// Creates a [`Link`] to a [`payment`].
    #[must_use]
    pub fn payment(id: payment::Id) -> Self {
        Self(format!("/payments/{id}"))
    }

    /// Creates a [`Link`] to a [`maintenance`] ticket.
    #[must_use]
    pub fn maintenance(id: maintenance::Id) -> Self {
        Self(format!("/maintenance/{id}"))
    }
}

define_kind! {
    #[doc = "Kind of a [`Notification`]."]
    enum Kind {
        #[doc = "System message."]
        System = 1,

        #[doc = "Property-related message."]
        Property = 2,

        #[doc = "Lease-related message."]
        Lease = 3,

        #[doc = "Payment-related message."]
        Payment = 4,

        #[doc = "Maintenance-related message."]
        Maintenance = 5,

        #[doc = "Direct message."]
        Message = 6,
    }
}

define_kind! {
    #[doc = "Priority of a [`Notification`]."]
    enum Priority {
        #[doc = "Low priority."]
        Low = 1,

        #[doc = "Normal priority."]
        Normal = 2,

        #[doc = "High priority."]
        High = 3,
    }
}

/// Marker type describing reading of a [`Notification`].
#[derive(Clone, Copy, Debug)]
pub struct Reading;

/// [`DateTime`] when a [`Notification`] was created.
pub type CreationDateTime = DateTimeOf<(Notification, unit::Creation)>;

/// [`DateTime`] when a [`Notification`] was read.
pub type ReadDateTime = DateTimeOf<(Notification, Reading)>;

#[cfg(test)]
mod spec {
    use crate::domain::{lease, user};

    use super::{Kind, Notification, Priority};

    #[test]
    fn marks_read_once() {
        let mut n = Notification::lease_activated(
            user::Id::new(),
            &lease::Number::new(2024, 1),
            lease::Id::new(),
        );
        assert_eq!(n.kind, Kind::Lease);
        assert_eq!(n.priority, Priority::Normal);
        assert_eq!(
            n.message.as_ref(),
            "Lease CTR-2024-00001 was signed and activated.",
        );

        assert!(n.mark_read());
        assert!(n.is_read());
        assert!(!n.mark_read());
    }
}
