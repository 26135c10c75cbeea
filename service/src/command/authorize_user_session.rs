//! [`Command`] for authorizing a [`User`] by a [`Session`] token.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        // Deleted users keep their tokens until expiration, so the token
        // alone is not enough.
        self.database()
            .execute(Select(By::<Option<User>, _>::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateUserSession,
        domain::user::{self, session},
        test, Command as _,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn rejects_malformed_token() {
        let (svc, _inbox) = test::service();
        // SAFETY: Only the decoding is exercised.
        #[expect(unsafe_code, reason = "test token")]
        let token = unsafe { session::Token::new_unchecked("garbage".into()) };

        let err = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn accepts_token_of_existing_user() {
        let (svc, _inbox) = test::service();
        let owner = test::user(&svc, "owner", user::Kind::Owner).await;
        let out = svc
            .execute(CreateUserSession::ByUserId(owner.id))
            .await
            .unwrap();

        let session = svc
            .execute(AuthorizeUserSession { token: out.token })
            .await
            .unwrap();

        assert_eq!(session.user_id, owner.id);
    }
}
