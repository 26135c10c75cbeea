//! [`Lease`]-related [`Database`] implementations.

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
        lease::{self, signature, Signature},
        property, user, Lease,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::money;

/// Columns of the `leases` table selected into a [`Lease`].
const COLUMNS: &str = "\
    id, number, \
    property_id, owner_id, tenant_id, rental_request_id, \
    status, start_date, end_date, \
    rent, administration_fee, deposit, currency, due_day, \
    owner_signature, owner_signed_at, \
    tenant_signature, tenant_signed_at, \
    conditions, special_clauses, \
    created_at, updated_at";

/// Reads a [`Signature`] from the provided `row` columns.
fn signature_from(row: &Row, data: &str, signed_at: &str) -> Option<Signature> {
    Some(Signature {
        data: row.get::<_, Option<_>>(data)?,
        signed_at: row.get::<_, Option<_>>(signed_at)?,
    })
}

/// Reads a [`Lease`] from the provided `row`.
fn lease_from(row: &Row) -> Lease {
    Lease {
        id: row.get("id"),
        number: row.get("number"),
        property_id: row.get("property_id"),
        owner_id: row.get("owner_id"),
        tenant_id: row.get("tenant_id"),
        rental_request_id: row.get("rental_request_id"),
        status: row.get("status"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        terms: lease::Terms {
            rent: money(row, "rent", "currency"),
            administration_fee: money(row, "administration_fee", "currency"),
            deposit: money(row, "deposit", "currency"),
            due_day: row.get("due_day"),
        },
        owner_signature: signature_from(
            row,
            "owner_signature",
            "owner_signed_at",
        ),
        tenant_signature: signature_from(
            row,
            "tenant_signature",
            "tenant_signed_at",
        ),
        conditions: row.get("conditions"),
        special_clauses: row.get("special_clauses"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<lease::Id, Lease>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[lease::Id]>,
{
    type Ok = HashMap<lease::Id, Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<lease::Id, Lease>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[lease::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM leases \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(lease_from)
            .map(|l| (l.id, l))
            .collect())
    }
}

impl<C> Database<Select<By<Option<Lease>, lease::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<lease::Id, Lease>, [lease::Id; 1]>>,
        Ok = HashMap<lease::Id, Lease>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Lease>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Lease>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(lease)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Lease>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lease {
            id,
            number,
            property_id,
            owner_id,
            tenant_id,
            rental_request_id,
            status,
            start_date,
            end_date,
            terms,
            owner_signature,
            tenant_signature,
            conditions,
            special_clauses,
            created_at,
            updated_at,
        } = lease;
        let (owner_signature, owner_signed_at) = owner_signature
            .map(|s| (s.data, s.signed_at))
            .unzip();
        let (tenant_signature, tenant_signed_at) = tenant_signature
            .map(|s| (s.data, s.signed_at))
            .unzip();

        const SQL: &str = "\
            INSERT INTO leases (\
                id, number, \
                property_id, owner_id, tenant_id, rental_request_id, \
                status, start_date, end_date, \
                rent, administration_fee, deposit, currency, due_day, \
                owner_signature, owner_signed_at, \
                tenant_signature, tenant_signed_at, \
                conditions, special_clauses, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::UUID, $4::UUID, $5::UUID, $6::UUID, \
                $7::INT2, $8::DATE, $9::DATE, \
                $10::NUMERIC, $11::NUMERIC, $12::NUMERIC, $13::INT2, \
                $14::INT2, \
                $15::TEXT, $16::TIMESTAMPTZ, \
                $17::TEXT, $18::TIMESTAMPTZ, \
                $19::TEXT, $20::TEXT, \
                $21::TIMESTAMPTZ, $22::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                rent = EXCLUDED.rent, \
                administration_fee = EXCLUDED.administration_fee, \
                deposit = EXCLUDED.deposit, \
                currency = EXCLUDED.currency, \
                due_day = EXCLUDED.due_day, \
                owner_signature = EXCLUDED.owner_signature, \
                owner_signed_at = EXCLUDED.owner_signed_at, \
                tenant_signature = EXCLUDED.tenant_signature, \
                tenant_signed_at = EXCLUDED.tenant_signed_at, \
                conditions = EXCLUDED.conditions, \
                special_clauses = EXCLUDED.special_clauses, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &property_id,
                &owner_id,
                &tenant_id,
                &rental_request_id,
                &status,
                &start_date,
                &end_date,
                &terms.rent.amount,
                &terms.administration_fee.amount,
                &terms.deposit.amount,
                &terms.rent.currency,
                &terms.due_day,
                &owner_signature,
                &owner_signed_at,
                &tenant_signature,
                &tenant_signed_at,
                &conditions,
                &special_clauses,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Lease, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO leases_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::lease::HasOtherActive, lease::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::lease::HasOtherActive;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::lease::HasOtherActive, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM leases AS other \
                INNER JOIN leases AS this \
                        ON this.property_id = other.property_id \
                WHERE this.id = $1::UUID \
                  AND other.id <> $1::UUID \
                  AND other.status = $2::INT2\
            )";
        self.query_one(SQL, &[&id, &lease::Status::Active])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| read::lease::HasOtherActive(row.get(0)))
    }
}

impl<C>
    Database<Select<By<read::lease::ActiveTenancy, (property::Id, user::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::lease::ActiveTenancy;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::lease::ActiveTenancy, (property::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (property_id, tenant_id) = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM leases \
                WHERE property_id = $1::UUID \
                  AND tenant_id = $2::UUID \
                  AND status = $3::INT2\
            )";
        self.query_one(
            SQL,
            &[&property_id, &tenant_id, &lease::Status::Active],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| read::lease::ActiveTenancy(row.get(0)))
    }
}

impl<C> Database<Select<By<read::lease::Expired, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::lease::Expired;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::lease::Expired, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM leases \
            WHERE status = $1::INT2 \
              AND end_date < $2::DATE \
            ORDER BY end_date ASC";
        Ok(self
            .query(SQL, &[&lease::Status::Active, &today])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<_>>()
            .into())
    }
}

/// Renders `AND` conditions of the provided [`read::lease::list::Filter`],
/// pushing their parameters into `ps`.
fn filtering<'p>(
    filter: &'p read::lease::list::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let read::lease::list::Filter {
        participant_id,
        status,
        starts_from,
        starts_until,
    } = filter;

    ps.push(participant_id);
    let mut conds = vec![format!(
        "AND (owner_id = ${idx}::UUID OR tenant_id = ${idx}::UUID)",
        idx = ps.len(),
    )];
    if let Some(status) = status {
        ps.push(status);
        conds.push(format!("AND status = ${}::INT2", ps.len()));
    }
    if let Some(from) = starts_from {
        ps.push(from);
        conds.push(format!("AND start_date >= ${}::DATE", ps.len()));
    }
    if let Some(until) = starts_until {
        ps.push(until);
        conds.push(format!("AND start_date <= ${}::DATE", ps.len()));
    }
    conds.join(" ")
}

impl<C>
    Database<Select<By<read::lease::list::Page, read::lease::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::lease::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::lease::list::Page, read::lease::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::lease::list::Selector { arguments, filter } =
            by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT id \
             FROM leases \
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

        Ok(read::lease::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<By<read::lease::list::TotalCount, read::lease::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::lease::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::lease::list::TotalCount, read::lease::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM leases \
             WHERE TRUE {filtering}",
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}

impl<C> Database<Insert<signature::Record>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(record): Insert<signature::Record>,
    ) -> Result<Self::Ok, Self::Err> {
        let signature::Record {
            id,
            lease_id,
            signer_id,
            party,
            data,
            ip_address,
            user_agent,
            signed_at,
        } = record;

        const SQL: &str = "\
            INSERT INTO lease_signatures (\
                id, lease_id, signer_id, party, \
                data, ip_address, user_agent, signed_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT2, \
                $5::TEXT, $6::INET, $7::TEXT, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &lease_id,
                &signer_id,
                &party,
                &data,
                &ip_address,
                &user_agent,
                &signed_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<signature::Record>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<signature::Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<signature::Record>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, signer_id, party, \
                   data, ip_address, user_agent, signed_at \
            FROM lease_signatures \
            WHERE lease_id = $1::UUID \
            ORDER BY signed_at ASC";
        Ok(self
            .query(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| signature::Record {
                id: row.get("id"),
                lease_id: row.get("lease_id"),
                signer_id: row.get("signer_id"),
                party: row.get("party"),
                data: row.get("data"),
                ip_address: row.get("ip_address"),
                user_agent: row.get("user_agent"),
                signed_at: row.get("signed_at"),
            })
            .collect())
    }
}
