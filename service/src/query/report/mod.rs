//! Report [`Query`]s definitions.
//!
//! [`Query`]: crate::Query

pub mod payments;

pub use self::payments::Payments;
