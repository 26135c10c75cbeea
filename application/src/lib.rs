//! Application provides API for interacting with the [`Service`].

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

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::WebSocketUpgrade,
    response::{IntoResponse, Response},
    Extension, Json,
};
use derive_more::Debug;
use juniper::{http::GraphQLBatchResponse, DefaultScalarValue, ScalarValue};
use juniper_axum::{extract::JuniperRequest, subscriptions};
use juniper_graphql_ws::ConnectionConfig;
use serde::Serialize;
use service::{domain, query, read, Query as _};
// Used in binary.
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::{Context, Session},
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// [`juniper`] GraphQL response.
#[derive(Debug)]
pub struct JuniperResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// Status code of the response.
    pub status_code: http::StatusCode,

    /// Underlying GraphQL response.
    #[debug(skip)]
    pub response: GraphQLBatchResponse<S>,
}

impl<S> IntoResponse for JuniperResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let Self {
            status_code,
            response,
        } = self;

        if response.is_ok() {
            Json(response).into_response()
        } else {
            (status_code, Json(response)).into_response()
        }
    }
}

/// GraphQL API handler.
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    context: Context,
    JuniperRequest(gql_request): JuniperRequest,
) -> JuniperResponse {
    JuniperResponse {
        status_code: context.error_status_code(),
        response: gql_request.execute(&*schema, &context).await,
    }
}

/// GraphQL subscriptions handler.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn subscriptions(
    Extension(schema): Extension<Arc<api::Schema>>,
    mut context: Context,
    ws: WebSocketUpgrade,
) -> Response {
    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .max_frame_size(1024)
        .max_message_size(1024)
        .write_buffer_size(512)
        .max_write_buffer_size(1024)
        .on_upgrade(move |socket| {
            subscriptions::serve_ws(socket, schema, move |vars| async move {
                context.apply_subscription_variables(&vars).map(|()| {
                    ConnectionConfig::new(context)
                        .with_max_in_flight_operations(10)
                })
            })
        })
}

/// Unread [`Notification`]s handler.
///
/// Responds with the number of unread [`Notification`]s of the authenticated
/// [`User`] along with the latest of them.
///
/// [`Notification`]: domain::Notification
/// [`User`]: domain::User
pub async fn unread_notifications(context: Context) -> Response {
    let unread = async {
        let my_id = context.current_session().await?.user_id;
        context
            .service()
            .execute(query::notifications::Unread::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
    }
    .await;

    match unread {
        Ok(unread) => Json(UnreadNotifications::from(unread)).into_response(),
        Err(e) => {
            tracing::debug!("cannot serve unread notifications: {e}");
            (e.status_code, Json(ErrorBody::from(e))).into_response()
        }
    }
}

/// JSON body of the [`unread_notifications()`] response.
#[derive(Clone, Debug, Serialize)]
pub struct UnreadNotifications {
    /// Total number of the unread [`Notification`]s.
    ///
    /// [`Notification`]: domain::Notification
    pub unread_count: i32,

    /// Latest unread [`Notification`]s, newest first.
    ///
    /// [`Notification`]: domain::Notification
    pub notifications: Vec<UnreadNotification>,
}

impl From<read::notification::Unread> for UnreadNotifications {
    fn from(unread: read::notification::Unread) -> Self {
        Self {
            unread_count: unread.count,
            notifications: unread
                .latest
                .into_iter()
                .map(UnreadNotification::from)
                .collect(),
        }
    }
}

/// Single unread [`Notification`] in the [`UnreadNotifications`].
///
/// [`Notification`]: domain::Notification
#[derive(Clone, Debug, Serialize)]
pub struct UnreadNotification {
    /// ID of the [`Notification`].
    ///
    /// [`Notification`]: domain::Notification
    pub id: String,

    /// Title of the [`Notification`].
    ///
    /// [`Notification`]: domain::Notification
    pub title: String,

    /// Message of the [`Notification`].
    ///
    /// [`Notification`]: domain::Notification
    pub message: String,

    /// Kind of the [`Notification`] in snake case.
    ///
    /// [`Notification`]: domain::Notification
    pub kind: String,

    /// Relative link to the subject of the [`Notification`], if any.
    ///
    /// [`Notification`]: domain::Notification
    pub link: Option<String>,

    /// RFC 3339 timestamp of the [`Notification`] creation.
    ///
    /// [`Notification`]: domain::Notification
    pub created_at: String,
}

impl From<domain::Notification> for UnreadNotification {
    fn from(n: domain::Notification) -> Self {
        Self {
            id: n.id.to_string(),
            title: n.title.to_string(),
            message: n.message.to_string(),
            kind: n.kind.to_string().to_lowercase(),
            link: n.link.map(|l| l.to_string()),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// JSON body of a failed non-GraphQL response.
#[derive(Clone, Debug, Serialize)]
struct ErrorBody {
    /// [`Error`] code.
    code: error::Code,

    /// [`Error`] message.
    message: String,
}

impl From<Error> for ErrorBody {
    fn from(e: Error) -> Self {
        Self {
            code: e.code,
            message: e.message,
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{domain, read};

    use super::UnreadNotifications;

    #[test]
    fn serializes_unread_notifications() {
        let recipient_id = domain::user::Id::new();
        let payment_id = domain::payment::Id::new();
        let latest = vec![domain::Notification::new(
            recipient_id,
            domain::notification::Kind::Payment,
            "Payment registered",
            "A payment of 100 was registered".to_owned(),
            Some(domain::notification::Link::payment(payment_id)),
        )];
        let id = latest[0].id;

        let body = UnreadNotifications::from(read::notification::Unread {
            count: 3,
            latest,
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["unread_count"], 3);
        let items = json["notifications"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], id.to_string());
        assert_eq!(items[0]["title"], "Payment registered");
        assert_eq!(items[0]["kind"], "payment");
        assert_eq!(items[0]["link"], format!("/payments/{payment_id}"));
        assert!(items[0]["created_at"].is_string());
    }

    #[test]
    fn serializes_missing_link_as_null() {
        let body = UnreadNotifications::from(read::notification::Unread {
            count: 1,
            latest: vec![domain::Notification::new(
                domain::user::Id::new(),
                domain::notification::Kind::System,
                "Welcome",
                "Welcome aboard".to_owned(),
                None,
            )],
        });
        let json = serde_json::to_value(&body).unwrap();

        assert!(json["notifications"][0]["link"].is_null());
        assert_eq!(json["notifications"][0]["kind"], "system");
    }
}
