//! Maintenance [`Ticket`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, define_text, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{property, user};
#[cfg(doc)]
use crate::domain::{Property, User};

/// Maintenance ticket of a [`Property`].
#[derive(Clone, Debug)]
pub struct Ticket {
    /// ID of this [`Ticket`].
    pub id: Id,

    /// Human-readable [`Number`] of this [`Ticket`].
    pub number: Number,

    /// ID of the [`Property`] needing maintenance.
    pub property_id: property::Id,

    /// ID of the [`User`] who requested the maintenance.
    pub requester_id: user::Id,

    /// ID of the [`User`] assigned to carry out the maintenance, if any.
    pub assignee_id: Option<user::Id>,

    /// [`Title`] of this [`Ticket`].
    pub title: Title,

    /// [`Description`] of the issue.
    pub description: Description,

    /// [`Category`] of the issue.
    pub category: Category,

    /// [`Priority`] of this [`Ticket`].
    pub priority: Priority,

    /// [`Status`] of this [`Ticket`].
    pub status: Status,

    /// Specific [`Location`] of the issue in the [`Property`], if any.
    pub location: Option<Location>,

    /// [`DateTime`] when this [`Ticket`] was requested.
    pub requested_at: RequestDateTime,

    /// [`DateTime`] when this [`Ticket`] was first reviewed.
    pub reviewed_at: Option<ReviewDateTime>,

    /// [`DateTime`] when the work on this [`Ticket`] started.
    pub started_at: Option<StartDateTime>,

    /// [`DateTime`] when this [`Ticket`] was completed.
    pub completed_at: Option<CompletionDateTime>,

    /// Estimated [`Date`] of completion, if any.
    pub estimated_on: Option<Date>,

    /// Estimated cost of the work, if known.
    pub estimated_cost: Option<Money>,

    /// Final cost of the work, if known.
    pub final_cost: Option<Money>,

    /// [`CostBearer`] of the work.
    pub cost_bearer: CostBearer,

    /// [`Notes`] of the owner, if any.
    pub owner_notes: Option<Notes>,

    /// Applied [`Resolution`], if any.
    pub resolution: Option<Resolution>,
}

impl Ticket {
    /// Indicates whether this [`Ticket`] is still being worked on.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns number of days passed since this [`Ticket`] was requested.
    #[must_use]
    pub fn days_since_request(&self, today: Date) -> i64 {
        today.days_since(self.requested_at.date())
    }

    /// Moves this [`Ticket`] into the provided [`Status`], recording the
    /// moment of the first entry into each tracked stage.
    pub fn transition(&mut self, status: Status) {
        match status {
            Status::InReview => {
                _ = self.reviewed_at.get_or_insert_with(ReviewDateTime::now);
            }
            Status::InProgress => {
                _ = self.started_at.get_or_insert_with(StartDateTime::now);
            }
            Status::Completed => {
                _ = self
                    .completed_at
                    .get_or_insert_with(CompletionDateTime::now);
            }
            Status::Pending
            | Status::Approved
            | Status::Cancelled
            | Status::Rejected => {}
        }
        self.status = status;
    }

    /// Indicates whether the provided [`User`] may cancel this [`Ticket`],
    /// given whether this [`User`] owns its [`Property`].
    ///
    /// Owners may cancel any open [`Ticket`], while requesters may cancel
    /// only pending ones.
    #[must_use]
    pub fn is_cancellable_by(&self, user_id: user::Id, is_owner: bool) -> bool {
        if is_owner {
            self.is_open()
        } else {
            self.requester_id == user_id && self.status == Status::Pending
        }
    }
}

/// Comment left on a [`Ticket`].
#[derive(Clone, Debug)]
pub struct Comment {
    /// ID of this [`Comment`].
    pub id: CommentId,

    /// ID of the commented [`Ticket`].
    pub ticket_id: Id,

    /// ID of the [`User`] who left this [`Comment`].
    pub author_id: user::Id,

    /// [`CommentText`] of this [`Comment`].
    pub text: CommentText,

    /// [`DateTime`] when this [`Comment`] was left.
    pub created_at: CommentCreationDateTime,
}

/// ID of a [`Ticket`].
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
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// ID of a [`Comment`].
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
pub struct CommentId(Uuid);

impl CommentId {
    /// Creates a new random [`CommentId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Human-readable number of a [`Ticket`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Formats a new [`Number`] out of the provided year and serial number.
    #[must_use]
    pub fn new(year: i32, serial: i64) -> Self {
        Self(format!("MNT-{year}-{serial:05}"))
    }
}

define_text! {
    #[doc = "Title of a [`Ticket`]."]
    struct Title(..= 200);
}

define_text! {
    #[doc = "Description of a [`Ticket`] issue."]
    struct Description(..= 5000);
}

define_text! {
    #[doc = "Location of a [`Ticket`] issue inside a [`Property`]."]
    struct Location(..= 200);
}

define_text! {
    #[doc = "Notes of a [`Property`] owner on a [`Ticket`]."]
    struct Notes(..= 5000);
}

define_text! {
    #[doc = "Resolution applied to a [`Ticket`] issue."]
    struct Resolution(..= 5000);
}

define_text! {
    #[doc = "Text of a [`Comment`]."]
    struct CommentText(..= 5000);
}

define_kind! {
    #[doc = "Category of a [`Ticket`] issue."]
    enum Category {
        #[doc = "Plumbing."]
        Plumbing = 1,

        #[doc = "Electrical installation."]
        Electrical = 2,

        #[doc = "Painting."]
        Painting = 3,

        #[doc = "Locks and keys."]
        Locksmith = 4,

        #[doc = "Cleaning."]
        Cleaning = 5,

        #[doc = "Home appliances."]
        Appliance = 6,

        #[doc = "Building structure."]
        Structural = 7,

        #[doc = "Anything else."]
        Other = 8,
    }
}

define_kind! {
    #[doc = "Priority of a [`Ticket`]."]
    enum Priority {
        #[doc = "Low priority."]
        Low = 1,

        #[doc = "Medium priority."]
        Medium = 2,

        #[doc = "High priority."]
        High = 3,

        #[doc = "Must be handled immediately."]
        Urgent = 4,
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

define_kind! {
    #[doc = "Status of a [`Ticket`]."]
    enum Status {
        #[doc = "[`Ticket`] awaits a review."]
        Pending = 1,

        #[doc = "[`Ticket`] is being reviewed by the owner."]
        InReview = 2,

        #[doc = "[`Ticket`] is approved to be worked on."]
        Approved = 3,

        #[doc = "[`Ticket`] is being worked on."]
        InProgress = 4,

        #[doc = "[`Ticket`] work is completed."]
        Completed = 5,

        #[doc = "[`Ticket`] is cancelled."]
        Cancelled = 6,

        #[doc = "[`Ticket`] is rejected by the owner."]
        Rejected = 7,
    }
}

impl Status {
    /// Indicates whether a [`Ticket`] in this [`Status`] is still being
    /// worked on.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::InReview | Self::Approved | Self::InProgress,
        )
    }
}

define_kind! {
    #[doc = "Party bearing the cost of a [`Ticket`] work."]
    enum CostBearer {
        #[doc = "[`Property`] owner."]
        Owner = 1,

        #[doc = "Tenant of the [`Property`]."]
        Tenant = 2,

        #[doc = "Both parties."]
        Shared = 3,
    }
}

/// Marker type describing a review of a [`Ticket`].
#[derive(Clone, Copy, Debug)]
pub struct Review;

/// Marker type describing a start of a [`Ticket`] work.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing a completion of a [`Ticket`] work.
#[derive(Clone, Copy, Debug)]
pub struct Completion;

/// [`DateTime`] when a [`Ticket`] was requested.
pub type RequestDateTime = DateTimeOf<(Ticket, unit::Creation)>;

/// [`DateTime`] when a [`Ticket`] was reviewed.
pub type ReviewDateTime = DateTimeOf<(Ticket, Review)>;

/// [`DateTime`] when a [`Ticket`] work started.
pub type StartDateTime = DateTimeOf<(Ticket, Start)>;

/// [`DateTime`] when a [`Ticket`] work was completed.
pub type CompletionDateTime = DateTimeOf<(Ticket, Completion)>;

/// [`DateTime`] when a [`Comment`] was left.
pub type CommentCreationDateTime = DateTimeOf<(Comment, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{property, user};

    use super::{
        Category, CostBearer, Description, Id, Number, Priority, Status,
        Ticket, Title,
    };

    fn ticket(status: Status) -> Ticket {
        Ticket {
            id: Id::new(),
            number: Number::new(2024, 3),
            property_id: property::Id::new(),
            requester_id: user::Id::new(),
            assignee_id: None,
            title: Title::new("Leaking faucet").unwrap(),
            description: Description::new("Kitchen faucet drips").unwrap(),
            category: Category::Plumbing,
            priority: Priority::default(),
            status,
            location: None,
            requested_at: DateTime::now().coerce(),
            reviewed_at: None,
            started_at: None,
            completed_at: None,
            estimated_on: None,
            estimated_cost: None,
            final_cost: None,
            cost_bearer: CostBearer::Owner,
            owner_notes: None,
            resolution: None,
        }
    }

    #[test]
    fn number_format() {
        assert_eq!(Number::new(2024, 3).to_string(), "MNT-2024-00003");
    }

    #[test]
    fn records_stage_timestamps_once() {
        let mut t = ticket(Status::Pending);

        t.transition(Status::InReview);
        let reviewed_at = t.reviewed_at.unwrap();
        t.transition(Status::Approved);
        t.transition(Status::InReview);
        assert_eq!(t.reviewed_at, Some(reviewed_at));

        t.transition(Status::InProgress);
        assert!(t.started_at.is_some());
        assert!(t.completed_at.is_none());

        t.transition(Status::Completed);
        assert!(t.completed_at.is_some());
        assert!(!t.is_open());
    }

    #[test]
    fn cancellation_rules() {
        let pending = ticket(Status::Pending);
        let requester = pending.requester_id;
        assert!(pending.is_cancellable_by(requester, false));
        assert!(pending.is_cancellable_by(user::Id::new(), true));
        assert!(!pending.is_cancellable_by(user::Id::new(), false));

        let mut in_progress = ticket(Status::InProgress);
        in_progress.requester_id = requester;
        assert!(!in_progress.is_cancellable_by(requester, false));
        assert!(in_progress.is_cancellable_by(user::Id::new(), true));

        let completed = ticket(Status::Completed);
        assert!(!completed.is_cancellable_by(user::Id::new(), true));
    }
}
