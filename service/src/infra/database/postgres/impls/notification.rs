//! [`Notification`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{notification, user, Notification},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `notifications` table selected into a [`Notification`].
const COLUMNS: &str = "\
    id, recipient_id, \
    title, message, kind, link, priority, \
    read_at, created_at";

/// Reads a [`Notification`] from the provided `row`.
fn notification_from(row: &Row) -> Notification {
    Notification {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        title: row.get("title"),
        message: row.get("message"),
        kind: row.get("kind"),
        link: row.get("link"),
        priority: row.get("priority"),
        read_at: row.get("read_at"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs>
    Database<Select<By<HashMap<notification::Id, Notification>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[notification::Id]>,
{
    type Ok = HashMap<notification::Id, Notification>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<notification::Id, Notification>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[notification::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM notifications \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(notification_from)
            .map(|n| (n.id, n))
            .collect())
    }
}

impl<C> Database<Select<By<Option<Notification>, notification::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<
            By<HashMap<notification::Id, Notification>, [notification::Id; 1]>,
        >,
        Ok = HashMap<notification::Id, Notification>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Notification>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Notification>, notification::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Notification>, read::notification::AllUnread>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Notification>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Notification>, read::notification::AllUnread>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::notification::AllUnread(recipient_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM notifications \
             WHERE recipient_id = $1::UUID \
               AND read_at IS NULL \
             ORDER BY created_at ASC",
        );
        Ok(self
            .query(&sql, &[&recipient_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(notification_from)
            .collect())
    }
}

impl<C> Database<Select<By<read::notification::Unread, user::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::notification::Unread;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::notification::Unread, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let recipient_id = by.into_inner();
        let limit = i32::try_from(read::notification::Unread::LATEST)
            .unwrap_or(i32::MAX);

        const COUNT_SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM notifications \
            WHERE recipient_id = $1::UUID \
              AND read_at IS NULL";
        let count = self
            .query_one(COUNT_SQL, &[&recipient_id])
            .await
            .map_err(tracerr::wrap!())?
            .get(0);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM notifications \
             WHERE recipient_id = $1::UUID \
               AND read_at IS NULL \
             ORDER BY created_at DESC \
             LIMIT $2::INT4",
        );
        let latest = self
            .query(&sql, &[&recipient_id, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(notification_from)
            .collect();

        Ok(read::notification::Unread { count, latest })
    }
}

impl<C> Database<Insert<Notification>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<Notification>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(notification): Insert<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(notification))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Notification>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(notification): Update<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let Notification {
            id,
            recipient_id,
            title,
            message,
            kind,
            link,
            priority,
            read_at,
            created_at,
        } = notification;

        const SQL: &str = "\
            INSERT INTO notifications (\
                id, recipient_id, \
                title, message, kind, link, priority, \
                read_at, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::TEXT, $5::INT2, $6::VARCHAR, $7::INT2, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET read_at = EXCLUDED.read_at";
        self.exec(
            SQL,
            &[
                &id,
                &recipient_id,
                &title,
                &message,
                &kind,
                &link,
                &priority,
                &read_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Notification, notification::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Notification, notification::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: notification::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM notifications \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Renders `AND` conditions of the provided
/// [`read::notification::list::Filter`], pushing their parameters into `ps`.
fn filtering<'p>(
    filter: &'p read::notification::list::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let read::notification::list::Filter {
        recipient_id,
        is_read,
        kind,
    } = filter;

    ps.push(recipient_id);
    let mut conds = vec![format!("AND recipient_id = ${}::UUID", ps.len())];
    match is_read {
        Some(true) => conds.push("AND read_at IS NOT NULL".to_owned()),
        Some(false) => conds.push("AND read_at IS NULL".to_owned()),
        None => {}
    }
    if let Some(kind) = kind {
        ps.push(kind);
        conds.push(format!("AND kind = ${}::INT2", ps.len()));
    }
    conds.join(" ")
}

impl<C>
    Database<
        Select<
            By<
                read::notification::list::Page,
                read::notification::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::notification::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::notification::list::Page,
                read::notification::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::notification::list::Selector { arguments, filter } =
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
             FROM notifications \
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

        Ok(read::notification::list::Page::new(
            &arguments, edges, has_more,
        ))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::notification::list::TotalCount,
                read::notification::list::Filter,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::notification::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::notification::list::TotalCount,
                read::notification::list::Filter,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM notifications \
             WHERE TRUE {filtering}",
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}
