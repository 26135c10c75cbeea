//! [`Command`] definition.

pub mod accept_rental_request;
pub mod accrue_late_fee;
pub mod authorize_user_session;
pub mod cancel_maintenance_ticket;
pub mod cancel_rental_request;
pub mod comment_maintenance_ticket;
pub mod create_lease;
pub mod create_maintenance_ticket;
pub mod create_property;
pub mod create_rental_request;
pub mod create_user;
pub mod create_user_session;
pub mod delete_notification;
pub mod expire_lease;
pub mod generate_invoice;
pub mod manage_maintenance_ticket;
pub mod mark_notification_read;
pub mod mark_payment_overdue;
pub mod mark_payment_paid;
pub mod register_payment;
pub mod reject_rental_request;
pub mod sign_lease;
pub mod terminate_lease;
pub mod update_lease;
pub mod update_property;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    accept_rental_request::AcceptRentalRequest,
    accrue_late_fee::AccrueLateFee,
    authorize_user_session::AuthorizeUserSession,
    cancel_maintenance_ticket::CancelMaintenanceTicket,
    cancel_rental_request::CancelRentalRequest,
    comment_maintenance_ticket::CommentMaintenanceTicket,
    create_lease::CreateLease,
    create_maintenance_ticket::CreateMaintenanceTicket,
    create_property::CreateProperty,
    create_rental_request::CreateRentalRequest, create_user::CreateUser,
    create_user_session::CreateUserSession,
    delete_notification::DeleteNotification, expire_lease::ExpireLease,
    generate_invoice::GenerateInvoice,
    manage_maintenance_ticket::ManageMaintenanceTicket,
    mark_notification_read::{MarkAllNotificationsRead, MarkNotificationRead},
    mark_payment_overdue::MarkPaymentOverdue,
    mark_payment_paid::MarkPaymentPaid, register_payment::RegisterPayment,
    reject_rental_request::RejectRentalRequest, sign_lease::SignLease,
    terminate_lease::TerminateLease, update_lease::UpdateLease,
    update_property::UpdateProperty,
};
