//! [`Command`] for registering a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Login, Name, NationalId, Password, Phone};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`] along with its empty
/// [`user::Profile`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`user::Kind`] of a new [`User`].
    pub kind: user::Kind,

    /// [`NationalId`] of a new [`User`].
    pub national_id: Option<user::NationalId>,

    /// [`Email`] of a new [`User`].
    pub email: Option<user::Email>,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::NationalId>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Insert<user::Profile>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            login,
            password,
            kind,
            national_id,
            email,
            phone,
        } = cmd;

        if email.is_none() && phone.is_none() {
            return Err(tracerr::new!(E::NoContactInfo));
        }

        let u = self
            .database()
            .execute(Select(By::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }

        if let Some(national_id) = &national_id {
            let u = self
                .database()
                .execute(Select(By::new(national_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if u.is_some() {
                return Err(tracerr::new!(E::NationalIdOccupied(
                    national_id.clone()
                )));
            }
        }

        let user = User {
            id: user::Id::new(),
            name,
            login,
            password_hash: user::PasswordHash::new(password.expose_secret()),
            kind,
            national_id,
            email,
            phone,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        // Concurrent registrations are caught by the unique constraints.
        tx.execute(Insert(user.clone())).await.map_err(|e| {
            let err = e.as_ref();
            if err.is_unique_violation(LOGIN_CONSTRAINT) {
                return tracerr::new!(E::LoginOccupied(user.login.clone()));
            }
            if let Some(id) = user.national_id.clone().filter(|_| {
                err.is_unique_violation(NATIONAL_ID_CONSTRAINT)
            }) {
                return tracerr::new!(E::NationalIdOccupied(id));
            }
            (tracerr::map_from_and_wrap!(=> E))(e)
        })?;
        tx.execute(Insert(user::Profile::empty(user.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.publish(&user);

        Ok(user)
    }
}

/// Name of the unique constraint on [`User`] logins.
const LOGIN_CONSTRAINT: &str = "users_login_key";

/// Name of the unique constraint on [`User`] national IDs.
const NATIONAL_ID_CONSTRAINT: &str = "users_national_id_key";

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    LoginOccupied(#[error(not(source))] user::Login),

    /// [`user::NationalId`] is already registered.
    #[display("`{_0}` national ID is already registered")]
    NationalIdOccupied(#[error(not(source))] user::NationalId),

    /// No contact information provided.
    #[display("No contact information provided")]
    NoContactInfo,
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use secrecy::SecretBox;

    use crate::{
        domain::{user, User},
        infra::Database as _,
        test, Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(login: &str, national_id: Option<&str>) -> CreateUser {
        CreateUser {
            name: "Ana Torres".parse().unwrap(),
            login: login.parse().unwrap(),
            password: SecretBox::new(Box::new("s3cret-pass".parse().unwrap())),
            kind: user::Kind::Tenant,
            national_id: national_id.map(|n| n.parse().unwrap()),
            email: Some(format!("{login}@example.com").parse().unwrap()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn creates_user_with_profile() {
        let (svc, mut inbox) = test::service();

        let user = svc.execute(cmd("ana", Some("1020304050"))).await.unwrap();

        let stored = svc
            .database()
            .execute(Select(By::<Option<User>, _>::new(user.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.login, user.login);
        assert!(stored.is_tenant());

        let profile = svc
            .database()
            .execute(Select(By::<Option<user::Profile>, _>::new(user.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.user_id, user.id);
        assert!(!profile.is_verified);

        let docs = inbox.drain();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].collection, "users");
    }

    #[tokio::test]
    async fn rejects_occupied_login() {
        let (svc, _inbox) = test::service();
        _ = svc.execute(cmd("ana", None)).await.unwrap();

        let err = svc.execute(cmd("ana", None)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LoginOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_registered_national_id() {
        let (svc, _inbox) = test::service();
        _ = svc.execute(cmd("ana", Some("1020304050"))).await.unwrap();

        let err = svc
            .execute(cmd("maria", Some("1020304050")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NationalIdOccupied(_),
        ));
    }

    #[tokio::test]
    async fn requires_contact_info() {
        let (svc, _inbox) = test::service();
        let mut cmd = cmd("ana", None);
        cmd.email = None;

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoContactInfo));
    }
}
