//! [`Signature`] definitions.

use std::net::IpAddr;

#[cfg(doc)]
use common::DateTime;
use common::{define_text, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{lease, user, Lease};
#[cfg(doc)]
use crate::domain::User;

/// Signature put by a [`lease::Party`] onto a [`Lease`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    /// Signature [`Data`].
    pub data: Data,

    /// [`DateTime`] when the [`Lease`] was signed.
    pub signed_at: SigningDateTime,
}

/// Append-only record of a signing event.
#[derive(Clone, Debug)]
pub struct Record {
    /// ID of this [`Record`].
    pub id: Id,

    /// ID of the signed [`Lease`].
    pub lease_id: lease::Id,

    /// ID of the signing [`User`].
    pub signer_id: user::Id,

    /// [`lease::Party`] the signer takes.
    pub party: lease::Party,

    /// Signature [`Data`].
    pub data: Data,

    /// IP address the signature was submitted from, if known.
    pub ip_address: Option<IpAddr>,

    /// [`UserAgent`] the signature was submitted with, if known.
    pub user_agent: Option<UserAgent>,

    /// [`DateTime`] when the [`Lease`] was signed.
    pub signed_at: SigningDateTime,
}

/// ID of a signature [`Record`].
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
    #[doc = "Signature image encoded as a base64 data URL."]
    struct Data(..= 500_000);
}

define_text! {
    #[doc = "User agent of a client submitting a [`Signature`]."]
    struct UserAgent(..= 1000);
}

/// Marker type describing signing of a [`Lease`].
#[derive(Clone, Copy, Debug)]
pub struct Signing;

/// [`DateTime`] when a [`Lease`] was signed.
pub type SigningDateTime = DateTimeOf<(Lease, Signing)>;
