//! Background [`Task`]s definitions.

mod background;
pub mod accrue_late_fees;
pub mod expire_leases;
pub mod sync_mirror;

pub use common::Handler as Task;

pub use self::{
    accrue_late_fees::AccrueLateFees, background::Background,
    expire_leases::ExpireLeases, sync_mirror::SyncMirror,
};
