//! Read entities definitions.

pub mod lease;
pub mod maintenance;
pub mod notification;
pub mod payment;
pub mod property;
pub mod rental_request;
