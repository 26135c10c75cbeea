//! [`Payment`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Date,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        lease,
        payment::{self, Registration},
        user, Payment,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::money;

/// Columns of the `payments` table selected into a [`Payment`].
const COLUMNS: &str = "\
    id, number, lease_id, sequence, \
    concept, description, \
    period_start, period_end, due_date, \
    amount, amount_paid, late_fee, currency, \
    paid_on, method, reference, \
    invoiced_at, created_at";

/// Renders SQL expression computing [`payment::Status`] of a `payments` row
/// as of the date bound to the `today` parameter index.
///
/// Mirrors [`Payment::status()`].
fn status(today: usize) -> String {
    format!(
        "(CASE WHEN amount_paid >= amount + late_fee THEN 2 \
               WHEN amount_paid > 0 THEN 4 \
               WHEN due_date < ${today}::DATE THEN 3 \
               ELSE 1 \
          END)::INT2",
    )
}

/// Reads a [`Payment`] from the provided `row`.
fn payment_from(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        number: row.get("number"),
        lease_id: row.get("lease_id"),
        sequence: row.get("sequence"),
        concept: row.get("concept"),
        description: row.get("description"),
        period_start: row.get("period_start"),
        period_end: row.get("period_end"),
        due_date: row.get("due_date"),
        amount: money(row, "amount", "currency"),
        amount_paid: money(row, "amount_paid", "currency"),
        late_fee: money(row, "late_fee", "currency"),
        paid_on: row.get("paid_on"),
        method: row.get("method"),
        reference: row.get("reference"),
        invoiced_at: row.get("invoiced_at"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<payment::Id, Payment>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[payment::Id]>,
{
    type Ok = HashMap<payment::Id, Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<payment::Id, Payment>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[payment::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .map(|p| (p.id, p))
            .collect())
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<payment::Id, Payment>, [payment::Id; 1]>>,
        Ok = HashMap<payment::Id, Payment>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Payment>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE lease_id = $1::UUID \
             ORDER BY sequence ASC",
        );
        Ok(self
            .query(&sql, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect())
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(payment))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            number,
            lease_id,
            sequence,
            concept,
            description,
            period_start,
            period_end,
            due_date,
            amount,
            amount_paid,
            late_fee,
            paid_on,
            method,
            reference,
            invoiced_at,
            created_at,
        } = payment;

        const SQL: &str = "\
            INSERT INTO payments (\
                id, number, lease_id, sequence, \
                concept, description, \
                period_start, period_end, due_date, \
                amount, amount_paid, late_fee, currency, \
                paid_on, method, reference, \
                invoiced_at, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::INT4, \
                $5::VARCHAR, $6::TEXT, \
                $7::DATE, $8::DATE, $9::DATE, \
                $10::NUMERIC, $11::NUMERIC, $12::NUMERIC, $13::INT2, \
                $14::DATE, $15::INT2, $16::VARCHAR, \
                $17::TIMESTAMPTZ, $18::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET description = EXCLUDED.description, \
                amount_paid = EXCLUDED.amount_paid, \
                late_fee = EXCLUDED.late_fee, \
                paid_on = EXCLUDED.paid_on, \
                method = EXCLUDED.method, \
                reference = EXCLUDED.reference, \
                invoiced_at = EXCLUDED.invoiced_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &lease_id,
                &sequence,
                &concept,
                &description,
                &period_start,
                &period_end,
                &due_date,
                &amount.amount,
                &amount_paid.amount,
                &late_fee.amount,
                &amount.currency,
                &paid_on,
                &method,
                &reference,
                &invoiced_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: payment::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO payments_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::payment::Scheduled, lease::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::Scheduled;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Scheduled, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM payments \
                WHERE lease_id = $1::UUID\
            )";
        self.query_one(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| read::payment::Scheduled(row.get(0)))
    }
}

impl<C> Database<Select<By<read::payment::Overdue, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::Overdue;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Overdue, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM payments \
            WHERE due_date < $1::DATE \
              AND amount_paid < amount + late_fee \
            ORDER BY due_date ASC";
        Ok(self
            .query(SQL, &[&today])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<_>>()
            .into())
    }
}

impl<C> Database<Select<By<Vec<Payment>, read::payment::Latest>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::Latest>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::Latest { owner_id, limit } = by.into_inner();
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE lease_id IN (SELECT id \
                                FROM leases \
                                WHERE owner_id = $1::UUID) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&owner_id, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect())
    }
}

impl<C> Database<Select<By<read::payment::Summary, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::Summary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::Summary, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        let today = Date::today();

        let sql = format!(
            "SELECT COUNT(*) FILTER (WHERE status = 2)::INT4 AS paid, \
                    COUNT(*) FILTER (WHERE status = 1)::INT4 AS pending, \
                    COUNT(*) FILTER (WHERE status = 3)::INT4 AS overdue, \
                    COUNT(*) FILTER (WHERE status = 4)::INT4 AS partial, \
                    COALESCE(SUM(amount_paid), 0) AS received, \
                    COALESCE(SUM(GREATEST(\
                        amount + late_fee - amount_paid, 0\
                    )), 0) AS outstanding, \
                    COALESCE(SUM(late_fee), 0) AS late_fees \
             FROM (SELECT amount, amount_paid, late_fee, \
                          {status} AS status \
                   FROM payments \
                   WHERE lease_id IN (SELECT id \
                                      FROM leases \
                                      WHERE owner_id = $1::UUID)\
                  ) AS owned",
            status = status(2),
        );
        let row = self
            .query_one(&sql, &[&owner_id, &today])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::payment::Summary {
            paid: row.get("paid"),
            pending: row.get("pending"),
            overdue: row.get("overdue"),
            partial: row.get("partial"),
            received: row.get("received"),
            outstanding: row.get("outstanding"),
            late_fees: row.get("late_fees"),
        })
    }
}

/// Renders `AND` conditions of the provided [`read::payment::list::Filter`],
/// pushing their parameters into `ps`.
///
/// [`payment::Status`] is filtered as of the provided `today`.
fn filtering<'p>(
    filter: &'p read::payment::list::Filter,
    today: &'p Date,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let read::payment::list::Filter {
        participant_id,
        owned_only,
        lease_id,
        status,
        due_from,
        due_until,
    } = filter;

    ps.push(participant_id);
    let idx = ps.len();
    let mut conds = vec![if *owned_only {
        format!(
            "AND lease_id IN (SELECT id \
                              FROM leases \
                              WHERE owner_id = ${idx}::UUID)",
        )
    } else {
        format!(
            "AND lease_id IN (SELECT id \
                              FROM leases \
                              WHERE owner_id = ${idx}::UUID \
                                 OR tenant_id = ${idx}::UUID)",
        )
    }];
    if let Some(lease_id) = lease_id {
        ps.push(lease_id);
        conds.push(format!("AND lease_id = ${}::UUID", ps.len()));
    }
    if let Some(status) = status {
        ps.push(today);
        let today_idx = ps.len();
        ps.push(status);
        conds.push(format!(
            "AND {expr} = ${idx}::INT2",
            expr = self::status(today_idx),
            idx = ps.len(),
        ));
    }
    if let Some(from) = due_from {
        ps.push(from);
        conds.push(format!("AND due_date >= ${}::DATE", ps.len()));
    }
    if let Some(until) = due_until {
        ps.push(until);
        conds.push(format!("AND due_date <= ${}::DATE", ps.len()));
    }
    conds.join(" ")
}

impl<C>
    Database<
        Select<By<read::payment::list::Page, read::payment::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::list::Page, read::payment::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::list::Selector { arguments, filter } =
            by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);

        let today = Date::today();
        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filtering(&filter, &today, &mut ps);

        let sql = format!(
            "SELECT id \
             FROM payments \
             WHERE TRUE \
                   {cursor} \
                   {filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id = row.get("id");
                (id, id)
            })
            .collect::<Vec<_>>();

        Ok(read::payment::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<
            By<read::payment::list::TotalCount, read::payment::list::Filter>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::list::TotalCount, read::payment::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let today = Date::today();
        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, &today, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM payments \
             WHERE TRUE {filtering}",
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}

impl<C> Database<Insert<Registration>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(registration): Insert<Registration>,
    ) -> Result<Self::Ok, Self::Err> {
        let Registration {
            id,
            payment_id,
            amount,
            method,
            reference,
            notes,
            registrar_id,
            registered_at,
        } = registration;

        const SQL: &str = "\
            INSERT INTO payment_registrations (\
                id, payment_id, \
                amount, currency, \
                method, reference, notes, \
                registrar_id, registered_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::NUMERIC, $4::INT2, \
                $5::INT2, $6::VARCHAR, $7::TEXT, \
                $8::UUID, $9::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &payment_id,
                &amount.amount,
                &amount.currency,
                &method,
                &reference,
                &notes,
                &registrar_id,
                &registered_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Registration>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Registration>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Registration>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let payment_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, payment_id, \
                   amount, currency, \
                   method, reference, notes, \
                   registrar_id, registered_at \
            FROM payment_registrations \
            WHERE payment_id = $1::UUID \
            ORDER BY registered_at ASC";
        Ok(self
            .query(SQL, &[&payment_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Registration {
                id: row.get("id"),
                payment_id: row.get("payment_id"),
                amount: money(&row, "amount", "currency"),
                method: row.get("method"),
                reference: row.get("reference"),
                notes: row.get("notes"),
                registrar_id: row.get("registrar_id"),
                registered_at: row.get("registered_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod spec {
    use common::Date;
    use postgres_types::ToSql;

    use crate::{
        domain::{payment, user},
        read,
    };

    use super::{filtering, status};

    #[test]
    fn status_compares_with_bound_date() {
        let sql = status(3);

        assert!(sql.contains("due_date < $3::DATE"));
        assert!(!sql.contains("CURRENT_DATE"));
    }

    #[test]
    fn binds_today_only_when_filtering_by_status() {
        let today = Date::from_ymd(2024, 3, 1).unwrap();
        let mut filter = read::payment::list::Filter {
            participant_id: user::Id::new(),
            ..read::payment::list::Filter::default()
        };

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let sql = filtering(&filter, &today, &mut ps);
        assert_eq!(ps.len(), 1);
        assert!(!sql.contains("::DATE"));

        filter.status = Some(payment::Status::Overdue);
        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let sql = filtering(&filter, &today, &mut ps);
        assert_eq!(ps.len(), 3);
        assert!(sql.contains("due_date < $2::DATE"));
        assert!(sql.contains("= $3::INT2"));
    }
}
