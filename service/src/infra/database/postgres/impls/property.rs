//! [`Property`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{
        database::{
            self,
            postgres::{Connection, SearchPattern},
            Postgres,
        },
        Database,
    },
    read,
};

use super::money;

/// Columns of the `properties` table selected into a [`Property`].
const COLUMNS: &str = "\
    id, owner_id, \
    title, description, \
    category, status, \
    address, city, neighborhood, zip_code, \
    area, bedrooms, bathrooms, parking_spots, floor, \
    is_furnished, allows_pets, \
    has_water, has_electricity, has_gas, has_internet, \
    rent, administration_fee, deposit, currency, \
    is_active, created_at, updated_at";

/// Reads a [`Property`] from the provided `row`.
fn property_from(row: &Row) -> Property {
    Property {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        status: row.get("status"),
        location: property::Location {
            address: row.get("address"),
            city: row.get("city"),
            neighborhood: row.get("neighborhood"),
            zip_code: row.get("zip_code"),
        },
        features: property::Features {
            area: row.get("area"),
            bedrooms: row.get("bedrooms"),
            bathrooms: row.get("bathrooms"),
            parking_spots: row.get("parking_spots"),
            floor: row.get("floor"),
            is_furnished: row.get("is_furnished"),
            allows_pets: row.get("allows_pets"),
            utilities: property::Utilities {
                water: row.get("has_water"),
                electricity: row.get("has_electricity"),
                gas: row.get("has_gas"),
                internet: row.get("has_internet"),
            },
        },
        rent: money(row, "rent", "currency"),
        administration_fee: money(row, "administration_fee", "currency"),
        deposit: money(row, "deposit", "currency"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<property::Id, Property>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[property::Id]>,
{
    type Ok = HashMap<property::Id, Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<property::Id, Property>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[property::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(property_from)
            .map(|p| (p.id, p))
            .collect())
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<property::Id, Property>, [property::Id; 1]>>,
        Ok = HashMap<property::Id, Property>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
            owner_id,
            title,
            description,
            category,
            status,
            location,
            features,
            rent,
            administration_fee,
            deposit,
            is_active,
            created_at,
            updated_at,
        } = property;

        const SQL: &str = "\
            INSERT INTO properties (\
                id, owner_id, \
                title, description, \
                category, status, \
                address, city, neighborhood, zip_code, \
                area, bedrooms, bathrooms, parking_spots, floor, \
                is_furnished, allows_pets, \
                has_water, has_electricity, has_gas, has_internet, \
                rent, administration_fee, deposit, currency, \
                is_active, created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::TEXT, \
                $5::INT2, $6::INT2, \
                $7::VARCHAR, $8::VARCHAR, $9::VARCHAR, $10::VARCHAR, \
                $11::NUMERIC, $12::INT2, $13::INT2, $14::INT2, $15::INT2, \
                $16::BOOLEAN, $17::BOOLEAN, \
                $18::BOOLEAN, $19::BOOLEAN, $20::BOOLEAN, $21::BOOLEAN, \
                $22::NUMERIC, $23::NUMERIC, $24::NUMERIC, $25::INT2, \
                $26::BOOLEAN, $27::TIMESTAMPTZ, $28::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                category = EXCLUDED.category, \
                status = EXCLUDED.status, \
                address = EXCLUDED.address, \
                city = EXCLUDED.city, \
                neighborhood = EXCLUDED.neighborhood, \
                zip_code = EXCLUDED.zip_code, \
                area = EXCLUDED.area, \
                bedrooms = EXCLUDED.bedrooms, \
                bathrooms = EXCLUDED.bathrooms, \
                parking_spots = EXCLUDED.parking_spots, \
                floor = EXCLUDED.floor, \
                is_furnished = EXCLUDED.is_furnished, \
                allows_pets = EXCLUDED.allows_pets, \
                has_water = EXCLUDED.has_water, \
                has_electricity = EXCLUDED.has_electricity, \
                has_gas = EXCLUDED.has_gas, \
                has_internet = EXCLUDED.has_internet, \
                rent = EXCLUDED.rent, \
                administration_fee = EXCLUDED.administration_fee, \
                deposit = EXCLUDED.deposit, \
                currency = EXCLUDED.currency, \
                is_active = EXCLUDED.is_active, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &title,
                &description,
                &category,
                &status,
                &location.address,
                &location.city,
                &location.neighborhood,
                &location.zip_code,
                &features.area,
                &features.bedrooms,
                &features.bathrooms,
                &features.parking_spots,
                &features.floor,
                &features.is_furnished,
                &features.allows_pets,
                &features.utilities.water,
                &features.utilities.electricity,
                &features.utilities.gas,
                &features.utilities.internet,
                &rent.amount,
                &administration_fee.amount,
                &deposit.amount,
                &rent.currency,
                &is_active,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO properties_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Renders `AND` conditions of the provided [`read::property::list::Filter`],
/// pushing their parameters into `ps`.
fn filtering<'p>(
    filter: &'p read::property::list::Filter,
    pattern: Option<&'p SearchPattern>,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let read::property::list::Filter {
        owner_id,
        category,
        city,
        text: _,
        min_rent,
        max_rent,
        min_bedrooms,
        min_bathrooms,
        is_furnished,
        allows_pets,
    } = filter;

    let mut conds = vec![];
    if owner_id.is_none() {
        // Public catalog lists only the properties open for rent.
        conds.push(format!(
            "AND status = {} AND is_active",
            property::Status::Available.u8(),
        ));
    }
    let mut cond = |p: &'p (dyn ToSql + Sync), render: &dyn Fn(usize) -> String| {
        ps.push(p);
        conds.push(render(ps.len()));
    };

    if let Some(owner_id) = owner_id {
        cond(owner_id, &|i| format!("AND owner_id = ${i}::UUID"));
    }
    if let Some(category) = category {
        cond(category, &|i| format!("AND category = ${i}::INT2"));
    }
    if let Some(city) = city {
        cond(city, &|i| format!("AND LOWER(city) = LOWER(${i}::VARCHAR)"));
    }
    if let Some(pattern) = pattern {
        cond(pattern, &|i| {
            format!(
                "AND (title ILIKE ANY(${i}::TEXT[]) \
                      OR address ILIKE ANY(${i}::TEXT[]))",
            )
        });
    }
    if let Some(min) = min_rent {
        cond(min, &|i| format!("AND rent >= ${i}::NUMERIC"));
    }
    if let Some(max) = max_rent {
        cond(max, &|i| format!("AND rent <= ${i}::NUMERIC"));
    }
    if let Some(min) = min_bedrooms {
        cond(min, &|i| format!("AND bedrooms >= ${i}::INT2"));
    }
    if let Some(min) = min_bathrooms {
        cond(min, &|i| format!("AND bathrooms >= ${i}::INT2"));
    }
    if let Some(furnished) = is_furnished {
        cond(furnished, &|i| format!("AND is_furnished = ${i}::BOOLEAN"));
    }
    if let Some(pets) = allows_pets {
        cond(pets, &|i| format!("AND allows_pets = ${i}::BOOLEAN"));
    }

    conds.join(" ")
}

impl<C>
    Database<
        Select<By<read::property::list::Page, read::property::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::property::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::property::list::Page, read::property::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::list::Selector { arguments, filter } =
            by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);
        let pattern = filter.text.as_deref().and_then(SearchPattern::new);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filtering(&filter, pattern.as_ref(), &mut ps);

        let sql = format!(
            "SELECT id \
             FROM properties \
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

        Ok(read::property::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<
            By<read::property::list::TotalCount, read::property::list::Filter>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::property::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::property::list::TotalCount, read::property::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let pattern = filter.text.as_deref().and_then(SearchPattern::new);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, pattern.as_ref(), &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM properties \
             WHERE TRUE {filtering}",
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}
