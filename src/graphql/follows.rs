use async_graphql::{Context, Object, Result};

use crate::error::ApiResult;
use crate::helpers::{parse_id, MapErrGql};
use crate::models::follow::Follow;

use super::{services, viewer};

#[derive(Default)]
pub struct FollowMutation;

#[Object]
impl FollowMutation {
    /// Follow another user as the caller.
    async fn follow_user(&self, ctx: &Context<'_>, following_id: Option<String>) -> Result<Follow> {
        follow_user(ctx, following_id.as_deref()).await.map_err_gql()
    }
}

#[tracing::instrument(skip(ctx))]
async fn follow_user(ctx: &Context<'_>, following_id: Option<&str>) -> ApiResult<Follow> {
    let me = viewer(ctx).await?;
    let following_id = parse_id(following_id, "Following id")?;
    services(ctx)?
        .follows
        .follow_user(&me.user, following_id)
        .await
}
