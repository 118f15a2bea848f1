use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FollowRow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_username: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFollow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_username: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewFollow {
    /// Edge from `follower_id` to `followed`, copying the followed profile.
    pub fn snapshot(follower_id: Uuid, followed: &User) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            follower_id,
            following_id: followed.id,
            user_id: followed.id,
            user_name: followed.name.clone(),
            user_username: followed.username.clone(),
            user_email: followed.email.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A follow edge. `user` is the followed profile as it was when the edge was
/// created; it diverges from the live record after profile updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(name = "Follow")]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    #[graphql(name = "_id")]
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub following_id: Uuid,
    pub follower_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: User,
}

impl From<FollowRow> for Follow {
    fn from(row: FollowRow) -> Self {
        Self {
            id: row.id,
            following_id: row.following_id,
            follower_id: row.follower_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: User {
                id: row.user_id,
                name: row.user_name,
                username: row.user_username,
                email: row.user_email,
            },
        }
    }
}

impl From<NewFollow> for FollowRow {
    fn from(new: NewFollow) -> Self {
        Self {
            id: new.id,
            follower_id: new.follower_id,
            following_id: new.following_id,
            user_id: new.user_id,
            user_name: new.user_name,
            user_username: new.user_username,
            user_email: new.user_email,
            created_at: new.created_at,
            updated_at: new.updated_at,
        }
    }
}
