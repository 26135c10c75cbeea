//! [`User`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, Profile},
        User,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `users` table selected into a [`User`].
const USER_COLUMNS: &str = "\
    id, name, \
    login, password_hash, \
    kind, national_id, \
    email, phone, \
    created_at, deleted_at";

/// Reads a [`User`] from the provided `row`.
fn user_from(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        login: row.get("login"),
        password_hash: row.get("password_hash"),
        kind: row.get("kind"),
        national_id: row.get("national_id"),
        email: row.get("email"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<user::Id, User>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[user::Id]>,
{
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[user::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {USER_COLUMNS} \
             FROM users \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
                   AND deleted_at IS NULL \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(user_from)
            .map(|u| (u.id, u))
            .collect())
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<user::Id, User>, [user::Id; 1]>>,
        Ok = HashMap<user::Id, User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Login>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        let sql = format!(
            "SELECT {USER_COLUMNS} \
             FROM users \
             WHERE login = $1::VARCHAR \
                   AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[login])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(user_from))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::NationalId>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::NationalId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let national_id = by.into_inner();

        let sql = format!(
            "SELECT {USER_COLUMNS} \
             FROM users \
             WHERE national_id = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[national_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(user_from))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            login,
            password_hash,
            kind,
            national_id,
            email,
            phone,
            created_at,
            deleted_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, name, \
                login, password_hash, \
                kind, national_id, \
                email, phone, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, \
                $5::INT2, $6::VARCHAR, \
                $7::VARCHAR, $8::VARCHAR, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                login = EXCLUDED.login, \
                password_hash = EXCLUDED.password_hash, \
                kind = EXCLUDED.kind, \
                national_id = EXCLUDED.national_id, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &login,
                &password_hash,
                &kind,
                &national_id,
                &email,
                &phone,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO users_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Profile>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Profile>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Profile>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        const SQL: &str = "\
            SELECT user_id, biography, \
                   rating, ratings_count, \
                   is_verified, updated_at \
            FROM profiles \
            WHERE user_id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Profile {
                user_id: row.get("user_id"),
                biography: row.get("biography"),
                rating: row.get("rating"),
                ratings_count: row.get("ratings_count"),
                is_verified: row.get("is_verified"),
                updated_at: row.get("updated_at"),
            }))
    }
}

impl<C> Database<Insert<Profile>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(profile): Insert<Profile>,
    ) -> Result<Self::Ok, Self::Err> {
        let Profile {
            user_id,
            biography,
            rating,
            ratings_count,
            is_verified,
            updated_at,
        } = profile;

        const SQL: &str = "\
            INSERT INTO profiles (\
                user_id, biography, \
                rating, ratings_count, \
                is_verified, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::TEXT, \
                $3::NUMERIC, $4::INT4, \
                $5::BOOLEAN, $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (user_id) DO UPDATE \
            SET biography = EXCLUDED.biography, \
                rating = EXCLUDED.rating, \
                ratings_count = EXCLUDED.ratings_count, \
                is_verified = EXCLUDED.is_verified, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &user_id,
                &biography,
                &rating,
                &ratings_count,
                &is_verified,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
