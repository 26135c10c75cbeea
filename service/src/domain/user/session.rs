//! [`Session`] definitions.

use std::time::Duration;

use common::{unit::Expiration, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// User session.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Lifetime of a newly issued [`Session`].
    pub const TTL: Duration = Duration::from_secs(30 * 60);

    /// Issues a new [`Session`] of the provided [`User`], expiring in
    /// [`Session::TTL`] from now.
    #[must_use]
    pub fn issue(user_id: user::Id) -> Self {
        Self {
            user_id,
            expires_at: (DateTime::now() + Self::TTL).coerce(),
        }
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, Expiration)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{user, Session};

    #[test]
    fn expires_after_ttl() {
        let before = DateTime::now();
        let session = Session::issue(user::Id::new());

        assert!(session.expires_at.coerce::<()>() >= before + Session::TTL);
    }

    #[test]
    fn serializes_expiration_as_unix_timestamp() {
        let session = Session::issue(user::Id::new());
        let json = serde_json::to_value(session).unwrap();

        assert_eq!(
            json["exp"].as_i64(),
            Some(session.expires_at.unix_timestamp()),
        );
        assert_eq!(json["user_id"], session.user_id.to_string());
    }
}
