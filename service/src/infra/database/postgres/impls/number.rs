//! Human-readable number [`Database`] implementations.
//!
//! Serial numbers are drawn from Postgres sequences, so they never repeat
//! even across concurrent transactions (gaps are possible on rollbacks).

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{lease, maintenance, payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Implements [`Database`] selecting a number type out of a sequence for the
/// provided year.
macro_rules! impl_number {
    ($number:ty, $seq:literal) => {
        impl<C> Database<Select<By<$number, i32>>> for Postgres<C>
        where
            C: Connection,
        {
            type Ok = $number;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<$number, i32>>,
            ) -> Result<Self::Ok, Self::Err> {
                let year = by.into_inner();

                const SQL: &str = concat!("SELECT nextval('", $seq, "')");
                let serial: i64 = self
                    .query_one(SQL, &[])
                    .await
                    .map_err(tracerr::wrap!())?
                    .get(0);
                Ok(<$number>::new(year, serial))
            }
        }
    };
}

impl_number!(lease::Number, "lease_number_seq");
impl_number!(payment::Number, "payment_number_seq");
impl_number!(maintenance::Number, "maintenance_number_seq");
