//! [`RentalRequest`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{property, rental_request, user, RentalRequest},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `rental_requests` table selected into a [`RentalRequest`].
const COLUMNS: &str = "\
    id, property_id, tenant_id, owner_id, \
    message, status, lease_id, \
    created_at, responded_at";

/// Reads a [`RentalRequest`] from the provided `row`.
fn rental_request_from(row: &Row) -> RentalRequest {
    RentalRequest {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        owner_id: row.get("owner_id"),
        message: row.get("message"),
        status: row.get("status"),
        lease_id: row.get("lease_id"),
        created_at: row.get("created_at"),
        responded_at: row.get("responded_at"),
    }
}

impl<C, IDs>
    Database<Select<By<HashMap<rental_request::Id, RentalRequest>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[rental_request::Id]>,
{
    type Ok = HashMap<rental_request::Id, RentalRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<HashMap<rental_request::Id, RentalRequest>, IDs>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[rental_request::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rental_requests \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(rental_request_from)
            .map(|r| (r.id, r))
            .collect())
    }
}

impl<C> Database<Select<By<Option<RentalRequest>, rental_request::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<
            By<
                HashMap<rental_request::Id, RentalRequest>,
                [rental_request::Id; 1],
            >,
        >,
        Ok = HashMap<rental_request::Id, RentalRequest>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<RentalRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentalRequest>, rental_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<RentalRequest>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<RentalRequest>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(request): Insert<RentalRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(request))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<RentalRequest>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(request): Update<RentalRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let RentalRequest {
            id,
            property_id,
            tenant_id,
            owner_id,
            message,
            status,
            lease_id,
            created_at,
            responded_at,
        } = request;

        const SQL: &str = "\
            INSERT INTO rental_requests (\
                id, property_id, tenant_id, owner_id, \
                message, status, lease_id, \
                created_at, responded_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::TEXT, $6::INT2, $7::UUID, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET message = EXCLUDED.message, \
                status = EXCLUDED.status, \
                lease_id = EXCLUDED.lease_id, \
                responded_at = EXCLUDED.responded_at";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &tenant_id,
                &owner_id,
                &message,
                &status,
                &lease_id,
                &created_at,
                &responded_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<RentalRequest, rental_request::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<RentalRequest, rental_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rental_request::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO rental_requests_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<
            By<read::rental_request::HasPending, (property::Id, user::Id)>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::rental_request::HasPending;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::rental_request::HasPending, (property::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (property_id, tenant_id) = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM rental_requests \
                WHERE property_id = $1::UUID \
                  AND tenant_id = $2::UUID \
                  AND status = $3::INT2\
            )";
        self.query_one(
            SQL,
            &[&property_id, &tenant_id, &rental_request::Status::Pending],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| read::rental_request::HasPending(row.get(0)))
    }
}

/// Renders `AND` conditions of the provided
/// [`read::rental_request::list::Filter`], pushing their parameters into `ps`.
fn filtering<'p>(
    filter: &'p read::rental_request::list::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let read::rental_request::list::Filter {
        owner_id,
        tenant_id,
        status,
    } = filter;

    let mut conds = vec![];
    if let Some(owner_id) = owner_id {
        ps.push(owner_id);
        conds.push(format!("AND owner_id = ${}::UUID", ps.len()));
    }
    if let Some(tenant_id) = tenant_id {
        ps.push(tenant_id);
        conds.push(format!("AND tenant_id = ${}::UUID", ps.len()));
    }
    if let Some(status) = status {
        ps.push(status);
        conds.push(format!("AND status = ${}::INT2", ps.len()));
    }
    conds.join(" ")
}

impl<C>
    Database<
        Select<
            By<
                read::rental_request::list::Page,
                read::rental_request::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::rental_request::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::rental_request::list::Page,
                read::rental_request::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::rental_request::list::Selector { arguments, filter } =
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
             FROM rental_requests \
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

        Ok(read::rental_request::list::Page::new(
            &arguments, edges, has_more,
        ))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::rental_request::list::TotalCount,
                read::rental_request::list::Filter,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::rental_request::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::rental_request::list::TotalCount,
                read::rental_request::list::Filter,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM rental_requests \
             WHERE TRUE {filtering}",
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}
