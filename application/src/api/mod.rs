//! GraphQL API definitions.

/// Defines a `list` module with the GraphQL types of a paginated list of
/// entities: its cursor, edge, connection and page info.
///
/// The entity type must provide an `unsafe fn new_unchecked(id)` constructor,
/// and its `Id` type must be declared in the same module.
macro_rules! define_list {
    (
        $entity:ident,
        read = $read:ident,
        total_count = $total_count:ty,
        names = ($cursor:tt, $edge:tt, $connection:tt, $page_info:tt $(,)?)
        $(,)?
    ) => {
        pub mod list {
            //! Definitions related to a paginated list.

            use derive_more::{AsRef, From, Into};
            use juniper::{graphql_object, GraphQLScalar};
            use service::{read, Query as _};

            use $crate::{api::scalar, AsError, Context, Error};

            use super::{$entity, Id};

            /// Cursor pointing to an item in the list.
            #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
            #[from(Id, read::$read::list::Cursor)]
            #[graphql(
                name = $cursor,
                with = scalar::Via::<read::$read::list::Cursor>,
            )]
            pub struct Cursor(pub read::$read::list::Cursor);

            /// Edge in the list.
            #[derive(Clone, Copy, Debug, From, Into)]
            pub struct Edge(read::$read::list::Edge);

            /// Edge in the list.
            #[graphql_object(name = $edge, context = Context)]
            impl Edge {
                /// Cursor of this edge.
                #[must_use]
                pub fn cursor(&self) -> Cursor {
                    self.0.cursor.into()
                }

                /// Node of this edge.
                #[must_use]
                pub fn node(&self) -> $entity {
                    #[expect(
                        unsafe_code,
                        reason = "`Edge` loaded from repository guarantees \
                                  node existence"
                    )]
                    unsafe {
                        $entity::new_unchecked(self.0.node)
                    }
                }
            }

            /// Connection of the list.
            #[derive(Clone, Debug)]
            pub struct Connection {
                /// Underlying page of the list.
                page: read::$read::list::Connection,

                /// Filter the page was selected with.
                filter: read::$read::list::Filter,
            }

            impl Connection {
                /// Wraps the provided page selected with the provided
                /// filter.
                #[must_use]
                pub fn new(
                    page: read::$read::list::Connection,
                    filter: read::$read::list::Filter,
                ) -> Self {
                    Self { page, filter }
                }
            }

            /// Connection of the list.
            #[graphql_object(name = $connection, context = Context)]
            impl Connection {
                /// Edges of this connection.
                #[must_use]
                pub fn edges(&self) -> Vec<Edge> {
                    self.page.edges.iter().copied().map(Into::into).collect()
                }

                /// Information about the page.
                #[must_use]
                pub fn page_info(&self) -> PageInfo {
                    let info = self.page.page_info();
                    PageInfo {
                        start_cursor: info.start_cursor.map(Into::into),
                        end_cursor: info.end_cursor.map(Into::into),
                        info,
                        filter: self.filter.clone(),
                    }
                }
            }

            /// Information about a [`Connection`] page.
            #[derive(Clone, Debug)]
            pub struct PageInfo {
                /// Underlying page information.
                info: read::$read::list::PageInfo,

                /// Start cursor of the page.
                start_cursor: Option<Cursor>,

                /// End cursor of the page.
                end_cursor: Option<Cursor>,

                /// Filter the page was selected with.
                filter: read::$read::list::Filter,
            }

            /// Information about a page of the list.
            #[graphql_object(name = $page_info, context = Context)]
            impl PageInfo {
                /// Indicator whether there is a next page.
                #[must_use]
                pub fn has_next_page(&self) -> bool {
                    self.info.has_next_page
                }

                /// Indicator whether there is a previous page.
                #[must_use]
                pub fn has_previous_page(&self) -> bool {
                    self.info.has_previous_page
                }

                /// Start cursor of the page.
                #[must_use]
                pub fn start_cursor(&self) -> &Option<Cursor> {
                    &self.start_cursor
                }

                /// End cursor of the page.
                #[must_use]
                pub fn end_cursor(&self) -> &Option<Cursor> {
                    &self.end_cursor
                }

                /// Total count of the items matching the filter.
                pub async fn total_count(
                    &self,
                    ctx: &Context,
                ) -> Result<i32, Error> {
                    ctx.service()
                        .execute(<$total_count>::by(self.filter.clone()))
                        .await
                        .map_err(AsError::into_error)
                        .map_err(ctx.error())
                        .map(Into::into)
                }
            }
        }
    };
}

pub mod lease;
pub mod maintenance;
mod mutation;
pub mod notification;
pub mod payment;
pub mod property;
mod query;
pub mod rental_request;
pub mod scalar;
mod subscription;
pub mod user;

use crate::define_error;

pub use self::{
    lease::Lease, maintenance::Ticket as MaintenanceTicket,
    mutation::Mutation, notification::Notification, payment::Payment,
    property::Property, query::Query, rental_request::RentalRequest,
    subscription::Subscription, user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an owner"]
        Owner,

        #[code = "NOT_TENANT"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a tenant"]
        Tenant,

        #[code = "NOT_LEASE_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a party of the `Lease`"]
        LeaseParty,

        #[code = "NOT_PROPERTY_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must own or rent the `Property`"]
        PropertyParty,
    }
}

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}
