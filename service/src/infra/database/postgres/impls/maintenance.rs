//! [`MaintenanceTicket`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        maintenance::{self, Comment},
        MaintenanceTicket,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::money_opt;

/// Columns of the `maintenance_tickets` table selected into a
/// [`MaintenanceTicket`].
const COLUMNS: &str = "\
    id, number, property_id, requester_id, assignee_id, \
    title, description, category, priority, status, location, \
    requested_at, reviewed_at, started_at, completed_at, \
    estimated_on, estimated_cost, final_cost, cost_currency, \
    cost_bearer, owner_notes, resolution";

/// Reads a [`MaintenanceTicket`] from the provided `row`.
fn ticket_from(row: &Row) -> MaintenanceTicket {
    MaintenanceTicket {
        id: row.get("id"),
        number: row.get("number"),
        property_id: row.get("property_id"),
        requester_id: row.get("requester_id"),
        assignee_id: row.get("assignee_id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        priority: row.get("priority"),
        status: row.get("status"),
        location: row.get("location"),
        requested_at: row.get("requested_at"),
        reviewed_at: row.get("reviewed_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        estimated_on: row.get("estimated_on"),
        estimated_cost: money_opt(row, "estimated_cost", "cost_currency"),
        final_cost: money_opt(row, "final_cost", "cost_currency"),
        cost_bearer: row.get("cost_bearer"),
        owner_notes: row.get("owner_notes"),
        resolution: row.get("resolution"),
    }
}

impl<C, IDs>
    Database<Select<By<HashMap<maintenance::Id, MaintenanceTicket>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[maintenance::Id]>,
{
    type Ok = HashMap<maintenance::Id, MaintenanceTicket>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<HashMap<maintenance::Id, MaintenanceTicket>, IDs>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[maintenance::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM maintenance_tickets \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(ticket_from)
            .map(|t| (t.id, t))
            .collect())
    }
}

impl<C> Database<Select<By<Option<MaintenanceTicket>, maintenance::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<
            By<
                HashMap<maintenance::Id, MaintenanceTicket>,
                [maintenance::Id; 1],
            >,
        >,
        Ok = HashMap<maintenance::Id, MaintenanceTicket>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<MaintenanceTicket>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<MaintenanceTicket>, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<MaintenanceTicket>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<MaintenanceTicket>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(ticket): Insert<MaintenanceTicket>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(ticket))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<MaintenanceTicket>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(ticket): Update<MaintenanceTicket>,
    ) -> Result<Self::Ok, Self::Err> {
        let MaintenanceTicket {
            id,
            number,
            property_id,
            requester_id,
            assignee_id,
            title,
            description,
            category,
            priority,
            status,
            location,
            requested_at,
            reviewed_at,
            started_at,
            completed_at,
            estimated_on,
            estimated_cost,
            final_cost,
            cost_bearer,
            owner_notes,
            resolution,
        } = ticket;
        let cost_currency = estimated_cost.or(final_cost).map(|m| m.currency);

        const SQL: &str = "\
            INSERT INTO maintenance_tickets (\
                id, number, property_id, requester_id, assignee_id, \
                title, description, category, priority, status, location, \
                requested_at, reviewed_at, started_at, completed_at, \
                estimated_on, estimated_cost, final_cost, cost_currency, \
                cost_bearer, owner_notes, resolution\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                $6::VARCHAR, $7::TEXT, $8::INT2, $9::INT2, $10::INT2, \
                $11::VARCHAR, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ, \
                $15::TIMESTAMPTZ, \
                $16::DATE, $17::NUMERIC, $18::NUMERIC, $19::INT2, \
                $20::INT2, $21::TEXT, $22::TEXT\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET assignee_id = EXCLUDED.assignee_id, \
                priority = EXCLUDED.priority, \
                status = EXCLUDED.status, \
                reviewed_at = EXCLUDED.reviewed_at, \
                started_at = EXCLUDED.started_at, \
                completed_at = EXCLUDED.completed_at, \
                estimated_on = EXCLUDED.estimated_on, \
                estimated_cost = EXCLUDED.estimated_cost, \
                final_cost = EXCLUDED.final_cost, \
                cost_currency = EXCLUDED.cost_currency, \
                cost_bearer = EXCLUDED.cost_bearer, \
                owner_notes = EXCLUDED.owner_notes, \
                resolution = EXCLUDED.resolution";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &property_id,
                &requester_id,
                &assignee_id,
                &title,
                &description,
                &category,
                &priority,
                &status,
                &location,
                &requested_at,
                &reviewed_at,
                &started_at,
                &completed_at,
                &estimated_on,
                &estimated_cost.map(|m| m.amount),
                &final_cost.map(|m| m.amount),
                &cost_currency,
                &cost_bearer,
                &owner_notes,
                &resolution,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<MaintenanceTicket, maintenance::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<MaintenanceTicket, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: maintenance::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO maintenance_tickets_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Renders `AND` conditions of the provided
/// [`read::maintenance::list::Filter`], pushing their parameters into `ps`.
fn filtering<'p>(
    filter: &'p read::maintenance::list::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let read::maintenance::list::Filter {
        owner_id,
        requester_id,
        property_id,
        status,
        category,
        priority,
    } = filter;

    let mut conds = vec![];
    if let Some(owner_id) = owner_id {
        ps.push(owner_id);
        conds.push(format!(
            "AND property_id IN (SELECT id \
                                 FROM properties \
                                 WHERE owner_id = ${}::UUID)",
            ps.len(),
        ));
    }
    if let Some(requester_id) = requester_id {
        ps.push(requester_id);
        conds.push(format!("AND requester_id = ${}::UUID", ps.len()));
    }
    if let Some(property_id) = property_id {
        ps.push(property_id);
        conds.push(format!("AND property_id = ${}::UUID", ps.len()));
    }
    if let Some(status) = status {
        ps.push(status);
        conds.push(format!("AND status = ${}::INT2", ps.len()));
    }
    if let Some(category) = category {
        ps.push(category);
        conds.push(format!("AND category = ${}::INT2", ps.len()));
    }
    if let Some(priority) = priority {
        ps.push(priority);
        conds.push(format!("AND priority = ${}::INT2", ps.len()));
    }
    conds.join(" ")
}

impl<C>
    Database<
        Select<
            By<
                read::maintenance::list::Page,
                read::maintenance::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::maintenance::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::maintenance::list::Page,
                read::maintenance::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::maintenance::list::Selector { arguments, filter } =
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
             FROM maintenance_tickets \
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

        Ok(read::maintenance::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::maintenance::list::TotalCount,
                read::maintenance::list::Filter,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::maintenance::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::maintenance::list::TotalCount,
                read::maintenance::list::Filter,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM maintenance_tickets \
             WHERE TRUE {filtering}",
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}

impl<C> Database<Insert<Comment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(comment): Insert<Comment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Comment {
            id,
            ticket_id,
            author_id,
            text,
            created_at,
        } = comment;

        const SQL: &str = "\
            INSERT INTO maintenance_comments (\
                id, ticket_id, author_id, text, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::TEXT, $5::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &ticket_id, &author_id, &text, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Comment>, maintenance::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Comment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Comment>, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ticket_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, ticket_id, author_id, text, created_at \
            FROM maintenance_comments \
            WHERE ticket_id = $1::UUID \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[&ticket_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Comment {
                id: row.get("id"),
                ticket_id: row.get("ticket_id"),
                author_id: row.get("author_id"),
                text: row.get("text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
