//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use common::{
    operations::{By, Start},
    Percent,
};
use derive_more::{Debug, Error};

#[cfg(doc)]
use infra::Database;
use infra::mirror;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Daily rate of late fees accrued on overdue payments.
    pub late_fee_daily_rate: Percent,

    /// [`task::AccrueLateFees`] configuration.
    pub accrue_late_fees: task::accrue_late_fees::Config,

    /// [`task::ExpireLeases`] configuration.
    pub expire_leases: task::expire_leases::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`mirror::Outbox`] the written entities are published into.
    outbox: mirror::Outbox,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, mirroring the
    /// written entities into the provided [`mirror::Mirror`].
    pub fn new<M>(
        config: Config,
        database: Db,
        mirror: M,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::AccrueLateFees<Self>,
                        task::accrue_late_fees::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<task::ExpireLeases<Self>, task::expire_leases::Config>,
                >,
                Ok = (),
                Err: Error,
            > + Task<Start<task::SyncMirror<M>>, Ok = (), Err: Error>
            + Clone
            + 'static,
        M: 'static,
    {
        let (outbox, inbox) = mirror::Outbox::channel();
        let this = Service {
            config,
            database,
            outbox,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("SyncMirror", async move {
            svc.execute(Start(task::SyncMirror::new(inbox, mirror)))
                .await
        });
        let svc = this.clone();
        bg.spawn("AccrueLateFees", async move {
            svc.execute(Start(By::new(svc.config().accrue_late_fees)))
                .await
        });
        let svc = this.clone();
        bg.spawn("ExpireLeases", async move {
            svc.execute(Start(By::new(svc.config().expire_leases)))
                .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] without any background [`Task`]s, returning
    /// the [`mirror::Inbox`] of the published entities.
    #[cfg(test)]
    pub(crate) fn detached(
        config: Config,
        database: Db,
    ) -> (Self, mirror::Inbox) {
        let (outbox, inbox) = mirror::Outbox::channel();
        let this = Service {
            config,
            database,
            outbox,
        };
        (this, inbox)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Publishes the provided committed entity to the document mirror.
    pub(crate) fn publish(&self, entity: &impl mirror::Mirrored) {
        self.outbox.publish(entity);
    }
}

#[cfg(test)]
pub(crate) mod test {
    //! Shared fixtures of [`Service`] tests.

    use common::{
        operations::{By, Insert, Select, Update},
        Date, DateTime, Money, Percent,
    };
    use rust_decimal::Decimal;
    use tracerr::Traced;

    use crate::{
        domain::{
            lease, payment, property, user, Lease, Payment, Property, User,
        },
        infra::{database, mirror, Database, Memory},
        read, task, Config, Service,
    };

    /// Creates a new [`Service`] backed by an empty [`Memory`] database.
    pub(crate) fn service() -> (Service<Memory>, mirror::Inbox) {
        Service::detached(config(), Memory::default())
    }

    /// Returns [`Config`] used in tests.
    pub(crate) fn config() -> Config {
        let secret = b"secret";
        Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            late_fee_daily_rate: Percent::new(Decimal::new(1, 1))
                .expect("valid percent"),
            accrue_late_fees: task::accrue_late_fees::Config {
                interval: std::time::Duration::from_secs(3600),
            },
            expire_leases: task::expire_leases::Config {
                interval: std::time::Duration::from_secs(3600),
            },
        }
    }

    /// Parses a [`Money`] out of the provided string.
    pub(crate) fn money(s: &str) -> Money {
        s.parse().expect("valid money")
    }

    /// Parses a [`Date`] out of the provided string.
    pub(crate) fn date(s: &str) -> Date {
        s.parse().expect("valid date")
    }

    /// Inserts a new [`User`] of the provided [`user::Kind`].
    pub(crate) async fn user(
        svc: &Service<Memory>,
        login: &str,
        kind: user::Kind,
    ) -> User {
        let user = User {
            id: user::Id::new(),
            name: login.parse().expect("valid name"),
            login: login.parse().expect("valid login"),
            password_hash: user::PasswordHash::new(
                &"password".parse().expect("valid password"),
            ),
            kind,
            national_id: None,
            email: Some(
                format!("{login}@example.com")
                    .parse()
                    .expect("valid email"),
            ),
            phone: None,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        svc.database()
            .execute(Insert(user.clone()))
            .await
            .expect("inserted");
        user
    }

    /// Inserts a new available [`Property`] owned by the provided [`User`].
    pub(crate) async fn property(
        svc: &Service<Memory>,
        owner: &User,
    ) -> Property {
        let property = Property {
            id: property::Id::new(),
            owner_id: owner.id,
            title: "Apartment in Chapinero".parse().expect("valid title"),
            description: "Bright two-bedroom apartment"
                .parse()
                .expect("valid description"),
            category: property::Category::Apartment,
            status: property::Status::Available,
            location: property::Location {
                address: "Calle 60 #5-20".parse().expect("valid address"),
                city: "Bogota".parse().expect("valid city"),
                neighborhood: None,
                zip_code: None,
            },
            features: property::Features {
                area: property::Area::new(Decimal::new(72, 0))
                    .expect("valid area"),
                bedrooms: 2,
                bathrooms: 1,
                parking_spots: 1,
                floor: Some(4),
                is_furnished: false,
                allows_pets: true,
                utilities: property::Utilities::default(),
            },
            rent: money("1500000COP"),
            administration_fee: money("200000COP"),
            deposit: money("1500000COP"),
            is_active: true,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        };
        svc.database()
            .execute(Insert(property.clone()))
            .await
            .expect("inserted");
        property
    }

    /// Inserts a new draft [`Lease`] of the provided [`Property`] with the
    /// provided tenant, spanning the provided dates.
    pub(crate) async fn lease(
        svc: &Service<Memory>,
        property: &Property,
        tenant: &User,
        start: &str,
        end: &str,
    ) -> Lease {
        let lease = Lease::draft(
            lease::Number::new(2024, 1),
            property,
            tenant.id,
            (date(start), date(end)),
            lease::Terms {
                rent: property.rent,
                administration_fee: property.administration_fee,
                deposit: property.deposit,
                due_day: lease::DueDay::DEFAULT,
            },
        );
        svc.database()
            .execute(Insert(lease.clone()))
            .await
            .expect("inserted");
        lease
    }

    /// Inserts the first scheduled [`Payment`] of the provided [`Lease`].
    pub(crate) async fn payment(svc: &Service<Memory>, lease: &Lease) -> Payment {
        let period = payment::schedule::periods(
            lease.start_date,
            lease.end_date,
            lease.terms.due_day,
        )[0];
        let payment = Payment::scheduled(
            payment::Number::new(2024, 1),
            lease.id,
            lease.monthly_total(),
            period,
        );
        svc.database()
            .execute(Insert(payment.clone()))
            .await
            .expect("inserted");
        payment
    }

    /// Selects the current state of the [`Payment`] with the provided ID.
    pub(crate) async fn payment_of(
        svc: &Service<Memory>,
        id: payment::Id,
    ) -> Payment {
        svc.database()
            .execute(Select(By::<Option<Payment>, _>::new(id)))
            .await
            .expect("selected")
            .expect("exists")
    }

    /// Overwrites the stored state of the provided entity.
    pub(crate) async fn save<T>(svc: &Service<Memory>, entity: T)
    where
        Memory: Database<Update<T>, Ok = (), Err = Traced<database::Error>>,
    {
        svc.database()
            .execute(Update(entity))
            .await
            .expect("saved");
    }

    /// Selects the current state of the [`Property`] with the provided ID.
    pub(crate) async fn property_of(
        svc: &Service<Memory>,
        id: property::Id,
    ) -> Property {
        svc.database()
            .execute(Select(By::<Option<Property>, _>::new(id)))
            .await
            .expect("selected")
            .expect("exists")
    }

    /// Selects the unread notifications of the provided user.
    pub(crate) async fn unread(
        svc: &Service<Memory>,
        user_id: user::Id,
    ) -> read::notification::Unread {
        svc.database()
            .execute(Select(By::<read::notification::Unread, _>::new(user_id)))
            .await
            .expect("selected")
    }

    /// Selects the current state of the [`Lease`] with the provided ID.
    pub(crate) async fn lease_of(svc: &Service<Memory>, id: lease::Id) -> Lease {
        svc.database()
            .execute(Select(By::<Option<Lease>, _>::new(id)))
            .await
            .expect("selected")
            .expect("exists")
    }
}
