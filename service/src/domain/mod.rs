//! Domain definitions.

pub mod lease;
pub mod maintenance;
pub mod notification;
pub mod payment;
pub mod property;
pub mod rental_request;
pub mod user;

pub use self::{
    lease::Lease, maintenance::Ticket as MaintenanceTicket,
    notification::Notification, payment::Payment, property::Property,
    rental_request::RentalRequest, user::User,
};
