//! Infrastructure layer.

pub mod database;
pub mod mirror;

#[cfg(test)]
pub use self::database::Memory;
pub use self::{database::Database, mirror::Mirror};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
