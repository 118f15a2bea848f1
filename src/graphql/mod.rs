//! GraphQL schema: one typed resolver per operation, merged into a single
//! query root and mutation root.
//!
//! Each resolver authenticates (where required), validates its arguments,
//! delegates to the repositories or the feed cache, and converts
//! [`ApiError`] into a GraphQL error with an `extensions.code`.

pub mod follows;
pub mod posts;
pub mod users;


use async_graphql::{Context, EmptySubscription, MergedObject, Schema};

use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::models::user::UserDetail;
use crate::services::Services;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(users::UserQuery, posts::PostQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(users::UserMutation, posts::PostMutation, follows::FollowMutation);

/// Raw `Authorization` header of the request being executed.
#[derive(Debug, Clone, Default)]
pub struct BearerHeader(pub Option<String>);

pub fn build_schema(services: Services) -> AppSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(services)
        .finish()
}

pub(crate) fn services<'a>(ctx: &Context<'a>) -> ApiResult<&'a Services> {
    ctx.data::<Services>()
        .map_err(|e| ApiError::Internal(e.message))
}

/// Authenticate the caller of the current operation.
pub(crate) async fn viewer(ctx: &Context<'_>) -> ApiResult<UserDetail> {
    let header = ctx
        .data_opt::<BearerHeader>()
        .and_then(|h| h.0.as_deref());
    let svc = services(ctx)?;
    auth::authenticate(header, &svc.tokens, svc.users.as_ref()).await
}
