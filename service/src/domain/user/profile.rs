//! [`Profile`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_text, unit, DateTimeOf};
use rust_decimal::Decimal;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Public profile of a [`User`].
///
/// Every [`User`] has exactly one [`Profile`], created along with it.
#[derive(Clone, Debug)]
pub struct Profile {
    /// ID of the [`User`] this [`Profile`] belongs to.
    pub user_id: user::Id,

    /// [`Biography`] of the [`User`].
    pub biography: Option<Biography>,

    /// Average rating given to the [`User`], in `0..=5` range.
    pub rating: Decimal,

    /// Number of ratings given to the [`User`].
    pub ratings_count: i32,

    /// Indicator whether identity of the [`User`] is verified.
    pub is_verified: bool,

    /// [`DateTime`] when this [`Profile`] was last updated.
    pub updated_at: ModificationDateTime,
}

impl Profile {
    /// Creates an empty [`Profile`] for the provided [`User`].
    #[must_use]
    pub fn empty(user_id: user::Id) -> Self {
        Self {
            user_id,
            biography: None,
            rating: Decimal::ZERO,
            ratings_count: 0,
            is_verified: false,
            updated_at: ModificationDateTime::now(),
        }
    }
}

define_text! {
    #[doc = "Free-form biography of a [`User`]."]
    struct Biography(..= 2000);
}

/// [`DateTime`] when a [`Profile`] was last updated.
pub type ModificationDateTime = DateTimeOf<(Profile, unit::Modification)>;
