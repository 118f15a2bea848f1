use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::error::{db_err, ApiError, ApiResult};
use crate::models::follow::*;
use crate::models::user::User;
use crate::schema::{follows, users};

use super::{DbService, Pool, Svc};

#[async_trait]
pub trait FollowService: Svc {
    /// Create an edge from `follower` to `following_id`, snapshotting the
    /// followed profile.
    async fn follow_user(&self, follower: &User, following_id: Uuid) -> ApiResult<Follow>;
}

#[derive(Clone)]
pub struct FollowServiceDb {
    db: Pool,
}

impl Svc for FollowServiceDb {}

impl DbService for FollowServiceDb {
    fn new(db: Pool) -> Self {
        Self { db }
    }
}

pub fn reject_self_follow(follower: &User, following_id: Uuid) -> ApiResult<()> {
    if follower.id == following_id {
        return Err(ApiError::invalid("Cannot follow yourself"));
    }
    Ok(())
}

#[async_trait]
impl FollowService for FollowServiceDb {
    #[tracing::instrument(skip(self, follower), fields(follower_id = %follower.id))]
    async fn follow_user(&self, follower: &User, following_id: Uuid) -> ApiResult<Follow> {
        reject_self_follow(follower, following_id)?;

        let mut conn = self.db.get().await?;
        let followed = users::table
            .find(following_id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .map_err(db_err("User"))?;

        let row = diesel::insert_into(follows::table)
            .values(&NewFollow::snapshot(follower.id, &followed))
            .returning(FollowRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| match ApiError::from_db("User", e) {
                ApiError::Conflict(_) => ApiError::Conflict("Already following".into()),
                other => other,
            })?;

        tracing::info!(follow_id = %row.id, "created follow edge");
        Ok(row.into())
    }
}
